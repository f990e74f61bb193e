//! Wiegand session lifecycle.
//!
//! A [`WiegandSession`] owns one pair of data lines. Starting it attaches
//! both lines and spawns a single collector task; every edge from either
//! line and the inter-bit timeout are handled on that task, so bit appends,
//! deadline rearms and frame flushes never interleave.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────┐
//! │ D0 watch │──┐
//! └──────────┘  │    ┌──────────────┐    ┌──────────┐    ┌───────────┐
//!               ├───►│ Edge channel │───►│Collector │───►│ EventSink │
//! ┌──────────┐  │    │   (mpsc)     │    │  task    │    └───────────┘
//! │ D1 watch │──┘    └──────────────┘    └──────────┘
//! └──────────┘                                ▲
//!                                  stop ──────┘ (oneshot)
//! ```
//!
//! # Examples
//!
//! ```
//! use wiegand_hardware::mock::MockEdgeSource;
//! use wiegand_hardware::{WiegandConfig, WiegandEvent, WiegandSession};
//!
//! #[tokio::main]
//! async fn main() -> wiegand_hardware::Result<()> {
//!     let (source, handle) = MockEdgeSource::new();
//!     let (sink, mut events) = tokio::sync::mpsc::unbounded_channel::<WiegandEvent>();
//!
//!     let mut session = WiegandSession::new(WiegandConfig::default(), source, sink)?;
//!     session.start()?;
//!     assert_eq!(events.recv().await, Some(WiegandEvent::Ready));
//!
//!     handle.send_bits(&[0, 1, 1, 0]);
//!     assert_eq!(events.recv().await, Some(WiegandEvent::Keypad(6)));
//!
//!     session.stop().await?;
//!     assert_eq!(events.recv().await, Some(WiegandEvent::Stop));
//!     Ok(())
//! }
//! ```

use crate::collector::BitCollector;
use crate::config::WiegandConfig;
use crate::error::{Result, WiegandError};
use crate::events::{EventSink, WiegandEvent};
use crate::traits::{EdgeEvent, EdgeMask, EdgeSender, EdgeSource, LineResource, Subscription};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, error, info, trace};
use wiegand_core::{Line, classify};

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Constructed, nothing attached yet.
    Created,

    /// Attaching the data lines.
    Starting,

    /// Both lines attached; frames are being decoded.
    Ready,

    /// Attach or read failure. Terminal.
    Failed,

    /// Lines released after `stop`. Terminal.
    Stopped,
}

impl SessionState {
    /// Whether the session can no longer change state.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Failed | Self::Stopped)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "Created",
            Self::Starting => "Starting",
            Self::Ready => "Ready",
            Self::Failed => "Failed",
            Self::Stopped => "Stopped",
        };
        f.write_str(name)
    }
}

/// One attached data line.
///
/// Field order matters: the subscription is released before the resource
/// is closed.
struct GpioLine<R> {
    subscription: Subscription,
    resource: R,
}

impl<R: LineResource> GpioLine<R> {
    fn detach(self) {
        let Self {
            subscription,
            resource,
        } = self;

        let line = subscription.line();
        subscription.unsubscribe();
        drop(resource);
        debug!("Released {}", line);
    }
}

/// Running collector task and the signal that stops it.
struct Collector<S> {
    stop_tx: oneshot::Sender<()>,
    task: JoinHandle<S>,
}

/// Decoder for one pair of Wiegand data lines.
///
/// # Lifecycle
///
/// 1. Create the session with a configuration, an edge source and a sink
/// 2. Call [`start`](Self::start) to attach both lines (`Ready` event)
/// 3. Decoded frames arrive at the sink as `Keypad`/`Reader` events
/// 4. Call [`stop`](Self::stop) to release both lines (`Stop` event)
///
/// A session is single-use. Dropping a running session ends its collector
/// task, which releases both lines without publishing `Stop`.
pub struct WiegandSession<E: EdgeSource, S: EventSink> {
    config: WiegandConfig,
    source: E,

    /// Held by the session except while the collector task runs.
    sink: Option<S>,

    state: Arc<watch::Sender<SessionState>>,
    collector: Option<Collector<S>>,
}

impl<E: EdgeSource, S: EventSink> WiegandSession<E, S> {
    /// Create a session in the `Created` state.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `config` does not validate.
    pub fn new(config: WiegandConfig, source: E, sink: S) -> Result<Self> {
        config.validate()?;

        let (state, _) = watch::channel(SessionState::Created);

        Ok(Self {
            config,
            source,
            sink: Some(sink),
            state: Arc::new(state),
            collector: None,
        })
    }

    /// Attach both lines and begin decoding.
    ///
    /// On success the sink receives `Ready` and the session is `Ready`. If
    /// either line cannot be attached the sink receives `Error`, anything
    /// already attached is released and the session is `Failed`.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// - [`WiegandError::InvalidState`] unless the session is `Created`
    /// - [`WiegandError::Attach`] if a line cannot be opened
    /// - [`WiegandError::Configuration`] outside a tokio runtime
    pub fn start(&mut self) -> Result<()> {
        let state = self.state();
        if state != SessionState::Created {
            return Err(WiegandError::invalid_state("start", state));
        }

        let runtime = Handle::try_current().map_err(|e| {
            WiegandError::configuration(format!("Session requires a tokio runtime: {e}"))
        })?;

        let mut sink = self
            .sink
            .take()
            .ok_or_else(|| WiegandError::invalid_state("start", state))?;

        self.set_state(SessionState::Starting);
        info!(
            "Starting Wiegand session d0={} d1={} gap={}ms",
            self.config.d0, self.config.d1, self.config.gap_ms
        );

        let (edge_tx, edge_rx) = mpsc::unbounded_channel();
        let lines = match self.attach_lines(&edge_tx) {
            Ok(lines) => lines,
            Err(e) => {
                error!("Failed to start Wiegand session: {}", e);
                self.set_state(SessionState::Failed);
                sink.publish(WiegandEvent::Error(e.to_string()));
                self.sink = Some(sink);
                return Err(e);
            }
        };
        // Subscriptions hold their own senders
        drop(edge_tx);

        self.set_state(SessionState::Ready);
        sink.publish(WiegandEvent::Ready);
        info!("Wiegand session ready");

        let (stop_tx, stop_rx) = oneshot::channel();
        let task = runtime.spawn(run_collector(
            lines,
            edge_rx,
            stop_rx,
            BitCollector::new(self.config.gap()),
            sink,
            self.state.clone(),
        ));
        self.collector = Some(Collector { stop_tx, task });

        Ok(())
    }

    /// Release both lines and publish `Stop`.
    ///
    /// Allowed from `Created`, `Starting` and `Ready`. Resolves only after
    /// the collector task has released both lines; a frame still waiting
    /// for its timeout is discarded.
    ///
    /// # Errors
    ///
    /// Returns [`WiegandError::InvalidState`] from `Failed` or `Stopped`.
    pub async fn stop(&mut self) -> Result<()> {
        let state = self.state();
        if state.is_terminal() {
            return Err(WiegandError::invalid_state("stop", state));
        }

        if let Some(Collector { stop_tx, task }) = self.collector.take() {
            // The task may already have exited after a read failure
            let _ = stop_tx.send(());

            match task.await {
                Ok(sink) => self.sink = Some(sink),
                Err(e) => {
                    error!("Collector task ended abnormally: {}", e);
                    self.set_state(SessionState::Failed);
                    return Err(WiegandError::Io(std::io::Error::other(e)));
                }
            }

            let state = self.state();
            if state == SessionState::Failed {
                return Err(WiegandError::invalid_state("stop", state));
            }
        }

        self.set_state(SessionState::Stopped);
        if let Some(sink) = self.sink.as_mut() {
            sink.publish(WiegandEvent::Stop);
        }
        info!("Wiegand session stopped");

        Ok(())
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Receiver notified on every state change.
    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn config(&self) -> &WiegandConfig {
        &self.config
    }

    fn set_state(&self, state: SessionState) {
        let previous = self.state.send_replace(state);
        debug!("Session state {} -> {}", previous, state);
    }

    fn attach_lines(&mut self, edges: &EdgeSender) -> Result<[GpioLine<E::Resource>; 2]> {
        let d0 = self.attach(Line::D0, self.config.d0.value_path(), edges)?;
        let d1 = self.attach(Line::D1, self.config.d1.value_path(), edges)?;
        Ok([d0, d1])
    }

    fn attach(
        &mut self,
        line: Line,
        path: PathBuf,
        edges: &EdgeSender,
    ) -> Result<GpioLine<E::Resource>> {
        let resource = self.source.open(line, &path)?;
        let subscription =
            self.source
                .subscribe(line, &resource, EdgeMask::GPIO_EDGE, edges.clone())?;

        // The source reports why a subscription degraded
        debug!(
            "Attached {} at {} (inert={})",
            line,
            path.display(),
            subscription.is_inert()
        );

        Ok(GpioLine {
            subscription,
            resource,
        })
    }
}

impl<E: EdgeSource, S: EventSink> fmt::Debug for WiegandSession<E, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WiegandSession")
            .field("config", &self.config)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// Collector task body. Returns the sink so `stop` can publish through it.
async fn run_collector<R: LineResource, S: EventSink>(
    lines: [GpioLine<R>; 2],
    mut edges: mpsc::UnboundedReceiver<EdgeEvent>,
    mut stop_rx: oneshot::Receiver<()>,
    mut collector: BitCollector,
    mut sink: S,
    state: Arc<watch::Sender<SessionState>>,
) -> S {
    let mut failure = None;

    loop {
        let deadline = collector.deadline();

        tokio::select! {
            biased;

            // A dropped sender also ends the task
            _ = &mut stop_rx => break,

            Some(edge) = edges.recv() => {
                if let Err(e) = handle_edge(&mut collector, &lines, edge) {
                    failure = Some(e);
                    break;
                }
            }

            () = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                flush(&mut collector, &mut sink);
            }
        }
    }

    for line in lines {
        line.detach();
    }

    if let Some(e) = failure {
        error!("Wiegand session failed: {}", e);
        state.send_replace(SessionState::Failed);
        sink.publish(WiegandEvent::Error(e.to_string()));
    }

    sink
}

fn handle_edge<R: LineResource>(
    collector: &mut BitCollector,
    lines: &[GpioLine<R>; 2],
    edge: EdgeEvent,
) -> Result<()> {
    if let Some(message) = edge.error {
        collector.reset();
        return Err(WiegandError::sample(edge.line, message));
    }

    let attached = &lines[usize::from(edge.line.bit())];
    collector.on_edge(attached.subscription.line(), &attached.resource)
}

fn flush<S: EventSink>(collector: &mut BitCollector, sink: &mut S) {
    let frame = collector.on_timeout();
    if frame.is_empty() {
        trace!("Gap elapsed with no bits");
        return;
    }

    match classify(&frame) {
        Some(decoded) => {
            debug!("Decoded {}-bit frame: {}", frame.len(), decoded);
            sink.publish(WiegandEvent::from(decoded));
        }
        None => debug!("Dropped {}-bit frame {}", frame.len(), frame),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockEdgeSource;
    use std::time::Duration;

    type Events = mpsc::UnboundedReceiver<WiegandEvent>;

    fn session() -> (
        WiegandSession<MockEdgeSource, mpsc::UnboundedSender<WiegandEvent>>,
        crate::mock::MockEdgeHandle,
        Events,
    ) {
        let (source, handle) = MockEdgeSource::new();
        let (sink, events) = mpsc::unbounded_channel();
        let session = WiegandSession::new(WiegandConfig::default(), source, sink).unwrap();
        (session, handle, events)
    }

    #[test]
    fn test_state_display() {
        assert_eq!(SessionState::Created.to_string(), "Created");
        assert_eq!(SessionState::Stopped.to_string(), "Stopped");
        assert!(SessionState::Failed.is_terminal());
        assert!(!SessionState::Ready.is_terminal());
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let (source, _handle) = MockEdgeSource::new();
        let (sink, _events) = mpsc::unbounded_channel::<WiegandEvent>();

        let result = WiegandSession::new(WiegandConfig::default().with_gap_ms(0), source, sink);
        assert!(matches!(result, Err(WiegandError::Configuration(_))));
    }

    #[test]
    fn test_start_outside_runtime() {
        let (mut session, handle, mut events) = session();

        let result = session.start();
        assert!(matches!(result, Err(WiegandError::Configuration(_))));
        assert_eq!(session.state(), SessionState::Created);
        assert!(!handle.is_open(Line::D0));
        assert!(events.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_state_transitions() {
        let (mut session, _handle, _events) = session();
        let mut states = session.watch_state();
        assert_eq!(session.state(), SessionState::Created);

        session.start().unwrap();
        assert_eq!(session.state(), SessionState::Ready);
        assert!(states.has_changed().unwrap());
        assert_eq!(*states.borrow_and_update(), SessionState::Ready);

        session.stop().await.unwrap();
        assert_eq!(session.state(), SessionState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watcher_failure_fails_session() {
        let (mut session, handle, mut events) = session();
        session.start().unwrap();
        assert_eq!(events.recv().await, Some(WiegandEvent::Ready));

        assert!(handle.notify_error(Line::D1, "watcher closed"));
        assert_eq!(
            events.recv().await,
            Some(WiegandEvent::Error(
                "Failed to sample D1: watcher closed".to_string()
            ))
        );
        assert_eq!(session.state(), SessionState::Failed);
        assert!(!handle.is_subscribed(Line::D0));
        assert!(!handle.is_open(Line::D1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_releases_lines() {
        let (mut session, handle, _events) = session();
        session.start().unwrap();
        assert!(handle.is_open(Line::D0));

        drop(session);
        tokio::time::sleep(Duration::from_millis(1)).await;

        assert!(!handle.is_subscribed(Line::D0));
        assert!(!handle.is_open(Line::D0));
        assert!(!handle.is_open(Line::D1));
    }
}
