//! Edge notification trait definitions.
//!
//! This module defines the contract between the decoder and whatever delivers
//! line transitions to it. An [`EdgeSource`] opens the value resource behind a
//! data line and subscribes it to edge notifications; every qualifying
//! transition is delivered as one [`EdgeEvent`] on the channel handed to
//! [`EdgeSource::subscribe`].
//!
//! Two implementations ship with the crate:
//!
//! - [`SysfsEdgeSource`](crate::sysfs::SysfsEdgeSource) for sysfs GPIO value
//!   files on Linux.
//! - [`MockEdgeSource`](crate::mock::MockEdgeSource) for tests and hosts
//!   without hardware.

use crate::error::Result;
use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};
use std::path::Path;
use tokio::task::JoinHandle;
use wiegand_core::Line;

/// Channel on which edge notifications are delivered.
pub type EdgeSender = tokio::sync::mpsc::UnboundedSender<EdgeEvent>;

/// Set of edge notification flags.
///
/// Uses the Linux epoll bit values so masks read the same as they would in
/// an `epoll_ctl` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct EdgeMask(u32);

impl EdgeMask {
    /// Resource is readable.
    pub const IN: EdgeMask = EdgeMask(0x001);

    /// Exceptional condition; what sysfs GPIO raises on a configured edge.
    pub const PRI: EdgeMask = EdgeMask(0x002);

    /// Error condition on the resource.
    pub const ERR: EdgeMask = EdgeMask(0x008);

    /// Edge-triggered delivery.
    pub const ET: EdgeMask = EdgeMask(1 << 31);

    /// Mask a session subscribes its lines with.
    pub const GPIO_EDGE: EdgeMask = EdgeMask(Self::PRI.0 | Self::ET.0);

    #[must_use]
    pub const fn empty() -> Self {
        EdgeMask(0)
    }

    #[must_use]
    pub const fn contains(self, other: EdgeMask) -> bool {
        self.0 & other.0 == other.0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for EdgeMask {
    type Output = EdgeMask;

    fn bitor(self, rhs: EdgeMask) -> EdgeMask {
        EdgeMask(self.0 | rhs.0)
    }
}

impl BitOrAssign for EdgeMask {
    fn bitor_assign(&mut self, rhs: EdgeMask) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for EdgeMask {
    type Output = EdgeMask;

    fn bitand(self, rhs: EdgeMask) -> EdgeMask {
        EdgeMask(self.0 & rhs.0)
    }
}

impl fmt::Display for EdgeMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// One edge notification from a subscribed line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeEvent {
    /// Line whose resource changed.
    pub line: Line,

    /// Flags reported with the transition.
    pub events: EdgeMask,

    /// Failure reported by the notification mechanism instead of an edge.
    pub error: Option<String>,
}

impl EdgeEvent {
    /// Create an edge notification.
    pub fn new(line: Line, events: EdgeMask) -> Self {
        Self {
            line,
            events,
            error: None,
        }
    }

    /// Create a notification carrying a watcher failure.
    pub fn failed(line: Line, error: impl Into<String>) -> Self {
        Self {
            line,
            events: EdgeMask::ERR,
            error: Some(error.into()),
        }
    }
}

/// The value resource behind one data line.
///
/// Dropping the resource closes it.
pub trait LineResource: Send + 'static {
    /// Read the current logic level of the line (0 or 1).
    ///
    /// # Errors
    ///
    /// Returns [`WiegandError::Sample`](crate::WiegandError::Sample) if the
    /// value cannot be read or is not `"0"`/`"1"`.
    fn sample(&self) -> Result<u8>;
}

/// Capability to open line resources and subscribe them to edge events.
///
/// # Examples
///
/// ```no_run
/// use wiegand_hardware::traits::{EdgeMask, EdgeSource};
/// use wiegand_hardware::sysfs::SysfsEdgeSource;
/// use wiegand_core::{Line, LineId};
///
/// # async fn example() -> wiegand_hardware::Result<()> {
/// let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
/// let mut source = SysfsEdgeSource::new();
///
/// let path = LineId::Gpio(17).value_path();
/// let resource = source.open(Line::D0, &path)?;
/// let subscription = source.subscribe(Line::D0, &resource, EdgeMask::GPIO_EDGE, tx)?;
///
/// while let Some(edge) = rx.recv().await {
///     println!("edge on {}: {}", edge.line, edge.events);
/// }
///
/// subscription.unsubscribe();
/// # Ok(())
/// # }
/// ```
pub trait EdgeSource: Send + 'static {
    /// Resource type produced by [`open`](EdgeSource::open).
    type Resource: LineResource;

    /// Open the value resource for `line` at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`WiegandError::Attach`](crate::WiegandError::Attach) if the
    /// resource cannot be opened.
    fn open(&mut self, line: Line, path: &Path) -> Result<Self::Resource>;

    /// Subscribe an opened resource to edge notifications.
    ///
    /// Every transition matching `mask` is delivered to `notify` as one
    /// [`EdgeEvent`]. When edge notification is unavailable the returned
    /// subscription is inert: it never delivers and is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error only if the subscription request itself is invalid.
    fn subscribe(
        &mut self,
        line: Line,
        resource: &Self::Resource,
        mask: EdgeMask,
        notify: EdgeSender,
    ) -> Result<Subscription>;
}

/// Release action run when a subscription ends.
type Release = Box<dyn FnOnce() + Send>;

/// An active edge subscription.
///
/// Delivery stops when the subscription is unsubscribed or dropped.
pub struct Subscription {
    line: Line,
    release: Option<Release>,
    inert: bool,
}

impl Subscription {
    /// Subscription that runs `release` when it ends.
    pub fn new(line: Line, release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            line,
            release: Some(Box::new(release)),
            inert: false,
        }
    }

    /// Subscription backed by a watcher task; ending it aborts the task.
    pub fn from_task(line: Line, task: JoinHandle<()>) -> Self {
        Self::new(line, move || task.abort())
    }

    /// Subscription that never delivers anything.
    pub fn inert(line: Line) -> Self {
        Self {
            line,
            release: None,
            inert: true,
        }
    }

    pub fn line(&self) -> Line {
        self.line
    }

    /// Whether this subscription was created in degraded no-op mode.
    pub fn is_inert(&self) -> bool {
        self.inert
    }

    /// Stop delivery and release the subscription.
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("line", &self.line)
            .field("active", &self.release.is_some())
            .field("inert", &self.inert)
            .finish()
    }
}
