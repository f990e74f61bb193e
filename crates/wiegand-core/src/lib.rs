//! Core types for the Wiegand decoder.
//!
//! This crate holds everything about Wiegand frames that does not touch I/O:
//! the two data lines, bit and frame types, split-half parity validation, and
//! classification of completed frames into keypad digits or reader codes.
//!
//! ```
//! use wiegand_core::{Decoded, Frame, classify};
//!
//! let frame = Frame::from_bits([0, 1, 1, 0]).unwrap();
//! assert_eq!(classify(&frame), Some(Decoded::Keypad(6)));
//! ```

pub mod classify;
pub mod constants;
pub mod error;
pub mod parity;
pub mod types;

pub use classify::{Decoded, classify};
pub use error::{Error, Result};
pub use parity::{check_parity, has_valid_parity};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
