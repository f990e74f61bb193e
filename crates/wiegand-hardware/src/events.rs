//! Session events and the sink they are delivered to.
//!
//! The session has no opinion about transport: it publishes every
//! [`WiegandEvent`] to an [`EventSink`] chosen by the host. Channels and
//! closures are sinks out of the box.
//!
//! ```
//! use wiegand_hardware::events::{EventSink, WiegandEvent};
//!
//! let (mut sink, mut events) = tokio::sync::mpsc::unbounded_channel::<WiegandEvent>();
//! sink.publish(WiegandEvent::Keypad(6));
//! assert_eq!(events.try_recv().unwrap(), WiegandEvent::Keypad(6));
//!
//! let mut log = |event: WiegandEvent| println!("{event}");
//! log.publish(WiegandEvent::Reader(0x95_61F3));
//! ```

use serde::Serialize;
use std::fmt;
use tokio::sync::mpsc;
use tracing::warn;
use wiegand_core::Decoded;

/// Event published by a Wiegand session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "event", content = "data")]
#[non_exhaustive]
pub enum WiegandEvent {
    /// Both lines attached; sent once.
    Ready,

    /// Attach or read failure; the session is finished.
    Error(String),

    /// Key pressed (0-15).
    Keypad(u8),

    /// Credential decoded from a reader frame.
    Reader(u64),

    /// Session stopped and lines released; sent once.
    Stop,
}

impl WiegandEvent {
    /// Event name as published.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Error(_) => "error",
            Self::Keypad(_) => "keypad",
            Self::Reader(_) => "reader",
            Self::Stop => "stop",
        }
    }
}

impl From<Decoded> for WiegandEvent {
    fn from(decoded: Decoded) -> Self {
        match decoded {
            Decoded::Keypad(key) => Self::Keypad(key),
            Decoded::Reader(code) => Self::Reader(code),
        }
    }
}

impl fmt::Display for WiegandEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error(error) => write!(f, "error: {error}"),
            Self::Keypad(key) => write!(f, "keypad: {key}"),
            Self::Reader(code) => write!(f, "reader: {code}"),
            other => write!(f, "{}", other.name()),
        }
    }
}

/// Destination for session events.
///
/// Publishing never fails from the session's point of view: a sink whose
/// consumer has gone away drops events.
pub trait EventSink: Send + 'static {
    fn publish(&mut self, event: WiegandEvent);
}

impl EventSink for mpsc::UnboundedSender<WiegandEvent> {
    fn publish(&mut self, event: WiegandEvent) {
        let _ = self.send(event);
    }
}

impl EventSink for mpsc::Sender<WiegandEvent> {
    fn publish(&mut self, event: WiegandEvent) {
        match self.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(event)) => {
                // Collector task must never block on a slow consumer
                warn!("Event channel full, dropping {}", event);
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }
}

impl<F> EventSink for F
where
    F: FnMut(WiegandEvent) + Send + 'static,
{
    fn publish(&mut self, event: WiegandEvent) {
        self(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(WiegandEvent::Ready.name(), "ready");
        assert_eq!(WiegandEvent::Error("x".into()).name(), "error");
        assert_eq!(WiegandEvent::Keypad(1).name(), "keypad");
        assert_eq!(WiegandEvent::Reader(1).name(), "reader");
        assert_eq!(WiegandEvent::Stop.name(), "stop");
    }

    #[test]
    fn test_from_decoded() {
        assert_eq!(
            WiegandEvent::from(Decoded::Keypad(6)),
            WiegandEvent::Keypad(6)
        );
        assert_eq!(
            WiegandEvent::from(Decoded::Reader(0x95_61F3)),
            WiegandEvent::Reader(0x95_61F3)
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(WiegandEvent::Ready.to_string(), "ready");
        assert_eq!(WiegandEvent::Reader(42).to_string(), "reader: 42");
        assert_eq!(
            WiegandEvent::Error("boom".into()).to_string(),
            "error: boom"
        );
    }

    #[test]
    fn test_serialize() {
        let json = serde_json::to_value(WiegandEvent::Keypad(6)).unwrap();
        assert_eq!(json, serde_json::json!({"event": "keypad", "data": 6}));

        let json = serde_json::to_value(WiegandEvent::Ready).unwrap();
        assert_eq!(json, serde_json::json!({"event": "ready"}));
    }

    #[test]
    fn test_unbounded_sink() {
        let (mut tx, mut rx) = mpsc::unbounded_channel::<WiegandEvent>();
        tx.publish(WiegandEvent::Stop);
        assert_eq!(rx.try_recv().unwrap(), WiegandEvent::Stop);

        drop(rx);
        tx.publish(WiegandEvent::Stop);
    }

    #[test]
    fn test_bounded_sink_drops_when_full() {
        let (mut tx, mut rx) = mpsc::channel::<WiegandEvent>(1);
        tx.publish(WiegandEvent::Keypad(1));
        tx.publish(WiegandEvent::Keypad(2));

        assert_eq!(rx.try_recv().unwrap(), WiegandEvent::Keypad(1));
        assert!(rx.try_recv().is_err());
    }
}
