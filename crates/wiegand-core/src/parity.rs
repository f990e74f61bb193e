//! Split-half parity validation.
//!
//! Wiegand reader frames carry one even-parity bit in front of the payload
//! and one odd-parity bit behind it. Each parity bit covers its own half of
//! the frame, so the check splits the frame in two:
//!
//! ```text
//!  E  p p p ... p p p  O
//! [---- first L/2 ----][---- last L/2 ----]
//!   even number of 1s     odd number of 1s
//! ```

use crate::{Frame, Result, error::Error};

/// Check split-half parity of an even-length, non-empty bit sequence.
///
/// Valid iff the first half holds an even number of set bits and the second
/// half an odd number.
///
/// # Errors
/// Returns `Error::InvalidFrameLength` for empty or odd-length input.
///
/// ```
/// use wiegand_core::check_parity;
///
/// assert_eq!(check_parity(&[0, 1]), Ok(true));
/// assert_eq!(check_parity(&[1, 1]), Ok(false));
/// assert!(check_parity(&[1, 0, 1]).is_err());
/// ```
pub fn check_parity(bits: &[u8]) -> Result<bool> {
    if bits.is_empty() || bits.len() % 2 != 0 {
        return Err(Error::InvalidFrameLength { len: bits.len() });
    }

    let (even_half, odd_half) = bits.split_at(bits.len() / 2);

    Ok(count_ones(even_half) % 2 == 0 && count_ones(odd_half) % 2 == 1)
}

/// Boolean form of [`check_parity`] for a completed frame.
///
/// Frames outside the parity contract (empty or odd-length) never pass.
#[must_use]
pub fn has_valid_parity(frame: &Frame) -> bool {
    check_parity(frame.bits()).unwrap_or(false)
}

fn count_ones(bits: &[u8]) -> usize {
    bits.iter().filter(|&&b| b != 0).count()
}
