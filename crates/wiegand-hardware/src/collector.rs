//! Bit collection state machine.
//!
//! Wiegand has no frame terminator: a frame ends when neither line has
//! pulsed for the configured gap. [`BitCollector`] appends one bit per active
//! edge and keeps a single flush deadline that every edge pushes back.
//!
//! ```text
//!            on_edge (arm deadline)
//!   ┌──────┐ ─────────────────────► ┌──────────────┐
//!   │ Idle │                        │ Accumulating │ ◄─┐ on_edge (rearm)
//!   └──────┘ ◄───────────────────── └──────────────┘ ──┘
//!            on_timeout (flush Frame)
//! ```
//!
//! The collector does no waiting itself. Its owner sleeps until
//! [`BitCollector::deadline`] and then calls [`BitCollector::on_timeout`],
//! which keeps all mutation on one task.

use crate::error::Result;
use crate::traits::LineResource;
use std::time::Duration;
use tokio::time::Instant;
use tracing::trace;
use wiegand_core::{BitFrame, Frame, Line};

/// Collector state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorState {
    /// No flush pending.
    Idle,

    /// At least one edge seen; a flush deadline is armed.
    Accumulating,
}

/// Accumulates bits from both data lines into one frame.
#[derive(Debug)]
pub struct BitCollector {
    buffer: BitFrame,
    gap: Duration,
    deadline: Option<Instant>,
}

impl BitCollector {
    pub fn new(gap: Duration) -> Self {
        Self {
            buffer: BitFrame::new(),
            gap,
            deadline: None,
        }
    }

    /// Handle an edge on `line`.
    ///
    /// Samples the line; a non-zero level appends the line's bit. The flush
    /// deadline is rearmed whether or not a bit was appended.
    ///
    /// # Errors
    ///
    /// Returns the sample error unchanged. The partial frame is discarded and
    /// the collector returns to idle.
    pub fn on_edge<R: LineResource + ?Sized>(&mut self, line: Line, resource: &R) -> Result<()> {
        let level = match resource.sample() {
            Ok(level) => level,
            Err(e) => {
                self.reset();
                return Err(e);
            }
        };

        if level != 0 {
            self.buffer.push(line);
        }
        self.deadline = Some(Instant::now() + self.gap);

        trace!(
            "Edge on {} level={} pending={}",
            line,
            level,
            self.buffer.len()
        );
        Ok(())
    }

    /// Flush the in-progress frame and return to idle.
    ///
    /// Always produces exactly one frame, empty if no bit was collected.
    pub fn on_timeout(&mut self) -> Frame {
        self.deadline = None;
        self.buffer.take()
    }

    /// When the pending flush is due, if one is armed.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn state(&self) -> CollectorState {
        if self.deadline.is_some() {
            CollectorState::Accumulating
        } else {
            CollectorState::Idle
        }
    }

    /// Number of bits collected since the last flush.
    pub fn pending_bits(&self) -> usize {
        self.buffer.len()
    }

    pub fn gap(&self) -> Duration {
        self.gap
    }

    /// Drop any partial frame and disarm the deadline.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.deadline = None;
    }
}
