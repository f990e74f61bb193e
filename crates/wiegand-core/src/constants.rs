//! Wiegand protocol constants.
//!
//! Frame lengths, default line assignments and timing used across the
//! decoder. The defaults match the wiring most readers ship with on a
//! Raspberry Pi style header (D0 on GPIO 17, D1 on GPIO 18).
//!
//! ```
//! use wiegand_core::constants::*;
//! use std::time::Duration;
//!
//! let gap = Duration::from_millis(DEFAULT_GAP_MS);
//! assert_eq!(gap, Duration::from_millis(20));
//! assert!(READER_FRAME_LENGTHS.contains(&26));
//! ```

// ============================================================================
// Frame Lengths
// ============================================================================

/// Length of a keypad frame (one key press, MSB first).
pub const KEYPAD_FRAME_BITS: usize = 4;

/// Length of a standard 26-bit reader frame (H10301 style).
pub const WIEGAND_26_BITS: usize = 26;

/// Length of a 34-bit reader frame.
pub const WIEGAND_34_BITS: usize = 34;

/// Frame lengths that carry a parity-protected credential.
pub const READER_FRAME_LENGTHS: [usize; 2] = [WIEGAND_26_BITS, WIEGAND_34_BITS];

// ============================================================================
// Timing
// ============================================================================

/// Default inter-bit silence gap in milliseconds.
///
/// A frame is complete once no edge has been seen on either line for this
/// long. Wiegand pulses are spaced 1-2 ms apart, so 20 ms is comfortably
/// above the inter-bit interval and below the gap between key presses.
pub const DEFAULT_GAP_MS: u64 = 20;

// ============================================================================
// Line Assignment
// ============================================================================

/// Default GPIO number for the D0 line.
pub const DEFAULT_D0_GPIO: u32 = 17;

/// Default GPIO number for the D1 line.
pub const DEFAULT_D1_GPIO: u32 = 18;

/// Directory holding exported sysfs GPIO lines.
pub const SYSFS_GPIO_ROOT: &str = "/sys/class/gpio";

// ============================================================================
// Environment
// ============================================================================

/// Environment variable overriding the inter-bit gap (milliseconds).
pub const ENV_GAP_MS: &str = "WIEGAND_TIMEOUT";

/// Environment variable overriding the D0 line (GPIO number or path).
pub const ENV_D0: &str = "WIEGAND_D0";

/// Environment variable overriding the D1 line (GPIO number or path).
pub const ENV_D1: &str = "WIEGAND_D1";
