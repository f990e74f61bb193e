//! Mock edge source implementation for testing and development.
//!
//! This module provides simulated Wiegand data lines that can be driven
//! programmatically without requiring physical hardware.

use crate::error::{Result, WiegandError};
use crate::traits::{EdgeEvent, EdgeMask, EdgeSender, EdgeSource, LineResource, Subscription};
use std::collections::{HashMap, VecDeque};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use wiegand_core::Line;

/// Simulated state of one data line.
#[derive(Debug, Default)]
struct MockLineState {
    path: Option<PathBuf>,
    level: u8,
    open: usize,
    subscriber: Option<(u64, EdgeSender)>,
    /// Level captured by each delivered edge and not yet sampled; `None`
    /// marks an edge raised while sampling was failing.
    edges: VecDeque<Option<u8>>,
    fail_open: bool,
    fail_sample: bool,
}

impl MockLineState {
    fn level(&self) -> Option<u8> {
        (!self.fail_sample).then_some(u8::from(self.level != 0))
    }
}

#[derive(Debug, Default)]
struct MockState {
    lines: HashMap<Line, MockLineState>,
    next_subscription: u64,
}

type Shared = Arc<Mutex<MockState>>;

fn lock(state: &Shared) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock edge source for testing and development.
///
/// Lines are simulated in memory and driven through a [`MockEdgeHandle`].
///
/// # Examples
///
/// ```
/// use wiegand_hardware::mock::MockEdgeSource;
/// use wiegand_hardware::traits::{EdgeMask, EdgeSource, LineResource};
/// use wiegand_core::Line;
/// use std::path::Path;
///
/// #[tokio::main]
/// async fn main() -> wiegand_hardware::Result<()> {
///     let (mut source, handle) = MockEdgeSource::new();
///     let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
///
///     let d1 = source.open(Line::D1, Path::new("/mock/d1"))?;
///     let _subscription = source.subscribe(Line::D1, &d1, EdgeMask::GPIO_EDGE, tx)?;
///
///     handle.pulse(Line::D1);
///
///     let edge = rx.recv().await.unwrap();
///     assert_eq!(edge.line, Line::D1);
///     assert_eq!(d1.sample()?, 1);
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockEdgeSource {
    state: Shared,
}

impl MockEdgeSource {
    /// Create a new mock edge source.
    ///
    /// Returns a tuple of (MockEdgeSource, MockEdgeHandle) where the handle
    /// can be used to drive the simulated lines.
    pub fn new() -> (Self, MockEdgeHandle) {
        let state = Shared::default();
        (
            Self {
                state: state.clone(),
            },
            MockEdgeHandle { state },
        )
    }
}

impl Default for MockEdgeSource {
    fn default() -> Self {
        Self::new().0
    }
}

/// A simulated line resource; closes itself when dropped.
#[derive(Debug)]
pub struct MockLine {
    line: Line,
    state: Shared,
}

impl LineResource for MockLine {
    fn sample(&self) -> Result<u8> {
        let mut state = lock(&self.state);
        let Some(line) = state.lines.get_mut(&self.line) else {
            return Ok(0);
        };

        let level = match line.edges.pop_front() {
            Some(captured) => captured,
            None => line.level(),
        };
        level.ok_or_else(|| WiegandError::sample(self.line, "simulated read failure"))
    }
}

impl Drop for MockLine {
    fn drop(&mut self) {
        let mut state = lock(&self.state);
        if let Some(line) = state.lines.get_mut(&self.line) {
            line.open = line.open.saturating_sub(1);
        }
    }
}

impl EdgeSource for MockEdgeSource {
    type Resource = MockLine;

    fn open(&mut self, line: Line, path: &Path) -> Result<MockLine> {
        let mut state = lock(&self.state);
        let entry = state.lines.entry(line).or_default();

        if entry.fail_open {
            return Err(WiegandError::attach(
                line,
                path,
                io::Error::new(io::ErrorKind::NotFound, "simulated open failure"),
            ));
        }

        entry.path = Some(path.to_path_buf());
        entry.open += 1;

        Ok(MockLine {
            line,
            state: self.state.clone(),
        })
    }

    fn subscribe(
        &mut self,
        line: Line,
        _resource: &MockLine,
        _mask: EdgeMask,
        notify: EdgeSender,
    ) -> Result<Subscription> {
        let id = {
            let mut state = lock(&self.state);
            state.next_subscription += 1;
            let id = state.next_subscription;
            state.lines.entry(line).or_default().subscriber = Some((id, notify));
            id
        };

        let state = self.state.clone();
        Ok(Subscription::new(line, move || {
            let mut state = lock(&state);
            if let Some(entry) = state.lines.get_mut(&line)
                && entry.subscriber.as_ref().is_some_and(|(current, _)| *current == id)
            {
                entry.subscriber = None;
                entry.edges.clear();
            }
        }))
    }
}

/// Handle for driving a mock edge source.
///
/// This handle allows programmatic control of the simulated lines: setting
/// levels, raising edges, and injecting failures. It can be cloned and shared
/// across tasks.
///
/// Edges are delivered through a channel, so the subscriber samples the line
/// some time after the edge was raised. Each delivered edge therefore records
/// the line's level (or an injected sample failure) at the moment it is
/// raised, and the next `sample()` of that line reports the oldest recorded
/// edge. Without a pending edge, `sample()` reports the live level. Changing
/// the level after an edge never changes what that edge samples.
///
/// # Examples
///
/// ```
/// use wiegand_hardware::mock::MockEdgeSource;
/// use wiegand_core::Line;
///
/// let (_source, handle) = MockEdgeSource::new();
///
/// // Nothing is subscribed yet, so the edges go nowhere
/// assert!(!handle.pulse(Line::D0));
/// handle.send_bits(&[0, 1, 1, 0]);
/// ```
#[derive(Debug, Clone)]
pub struct MockEdgeHandle {
    state: Shared,
}

impl MockEdgeHandle {
    /// Set the level the line reports when sampled.
    pub fn set_level(&self, line: Line, level: u8) {
        lock(&self.state).lines.entry(line).or_default().level = level;
    }

    /// Raise an edge notification without changing the level.
    ///
    /// The current level is recorded for the subscriber's next sample.
    /// Returns `true` if a subscriber received it.
    pub fn notify(&self, line: Line) -> bool {
        let mut state = lock(&self.state);
        let Some(entry) = state.lines.get_mut(&line) else {
            return false;
        };

        let delivered = entry
            .subscriber
            .as_ref()
            .is_some_and(|(_, tx)| tx.send(EdgeEvent::new(line, EdgeMask::PRI)).is_ok());
        if delivered {
            let level = entry.level();
            entry.edges.push_back(level);
        }
        delivered
    }

    /// Drive the line active and raise an edge.
    ///
    /// Returns `true` if a subscriber received it.
    pub fn pulse(&self, line: Line) -> bool {
        self.set_level(line, 1);
        self.notify(line)
    }

    /// Pulse D0 for every `0` and D1 for every `1`, in order.
    pub fn send_bits(&self, bits: &[u8]) {
        for &bit in bits {
            let line = if bit == 0 { Line::D0 } else { Line::D1 };
            self.pulse(line);
        }
    }

    /// Deliver a watcher failure instead of an edge.
    pub fn notify_error(&self, line: Line, error: impl Into<String>) -> bool {
        let state = lock(&self.state);
        state
            .lines
            .get(&line)
            .and_then(|entry| entry.subscriber.as_ref())
            .is_some_and(|(_, tx)| tx.send(EdgeEvent::failed(line, error)).is_ok())
    }

    /// Make subsequent opens of `line` fail.
    pub fn fail_open(&self, line: Line) {
        lock(&self.state).lines.entry(line).or_default().fail_open = true;
    }

    /// Make subsequent samples of `line` fail.
    pub fn fail_sampling(&self, line: Line) {
        lock(&self.state).lines.entry(line).or_default().fail_sample = true;
    }

    /// Whether an edge subscription is active on `line`.
    pub fn is_subscribed(&self, line: Line) -> bool {
        lock(&self.state)
            .lines
            .get(&line)
            .is_some_and(|entry| entry.subscriber.is_some())
    }

    /// Whether the resource for `line` is currently open.
    pub fn is_open(&self, line: Line) -> bool {
        lock(&self.state)
            .lines
            .get(&line)
            .is_some_and(|entry| entry.open > 0)
    }

    /// Path the line was last opened with.
    pub fn opened_path(&self, line: Line) -> Option<PathBuf> {
        lock(&self.state)
            .lines
            .get(&line)
            .and_then(|entry| entry.path.clone())
    }
}
