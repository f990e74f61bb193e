//! Wiegand line handling and session lifecycle.
//!
//! This crate turns edge notifications on the two Wiegand data lines into
//! decoded keypad and reader events. Line access goes through the
//! [`EdgeSource`] trait so the same session runs against sysfs GPIO files on
//! a device or a programmable mock in tests.
//!
//! # Design
//!
//! - **One task per session**: edges from both lines and the inter-bit
//!   timeout are handled by a single collector task, so a frame is never
//!   flushed while a bit is being appended.
//! - **Injected output**: events go to an [`EventSink`] chosen by the host.
//! - **Explicit configuration**: a [`WiegandConfig`] is passed to every
//!   session; the environment is read only through
//!   [`WiegandConfig::from_env`].
//! - **Fail once**: attach and read failures end the session with a single
//!   `Error` event. Nothing is retried.
//!
//! # Example
//!
//! ```no_run
//! use wiegand_hardware::sysfs::SysfsEdgeSource;
//! use wiegand_hardware::{WiegandConfig, WiegandEvent, WiegandSession};
//!
//! #[tokio::main]
//! async fn main() -> wiegand_hardware::Result<()> {
//!     let (sink, mut events) = tokio::sync::mpsc::unbounded_channel::<WiegandEvent>();
//!     let mut session =
//!         WiegandSession::new(WiegandConfig::from_env(), SysfsEdgeSource::new(), sink)?;
//!
//!     session.start()?;
//!
//!     while let Some(event) = events.recv().await {
//!         match event {
//!             WiegandEvent::Keypad(key) => println!("key {key}"),
//!             WiegandEvent::Reader(code) => println!("card {code}"),
//!             WiegandEvent::Error(error) => {
//!                 eprintln!("{error}");
//!                 break;
//!             }
//!             _ => {}
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Error Handling
//!
//! Operations return [`Result<T>`][error::Result] with the [`WiegandError`]
//! type. Frames that fail parity or have an unknown length are not errors;
//! they are logged at debug level and dropped.

pub mod collector;
pub mod config;
pub mod error;
pub mod events;
pub mod mock;
pub mod session;
#[cfg(unix)]
pub mod sysfs;
pub mod traits;

// Re-export commonly used types for convenience
pub use collector::{BitCollector, CollectorState};
pub use config::WiegandConfig;
pub use error::{Result, WiegandError};
pub use events::{EventSink, WiegandEvent};
pub use session::{SessionState, WiegandSession};
pub use traits::{EdgeEvent, EdgeMask, EdgeSender, EdgeSource, LineResource, Subscription};
