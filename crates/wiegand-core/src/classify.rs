//! Classification of completed frames.
//!
//! Only three frame lengths ever produce output:
//!
//! | Length | Result |
//! |--------|--------|
//! | 4 | [`Decoded::Keypad`], the bits read MSB first (0-15) |
//! | 26, 34 | [`Decoded::Reader`] from the interior bits, if parity holds |
//! | anything else | nothing |
//!
//! A reader frame that fails parity is dropped, it is not an error.

use crate::constants::{KEYPAD_FRAME_BITS, READER_FRAME_LENGTHS};
use crate::{Frame, has_valid_parity};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Value carried by a frame that classified successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum Decoded {
    /// Key pressed on a Wiegand keypad (0-15).
    Keypad(u8),

    /// Credential code presented to a reader, parity bits stripped.
    Reader(u64),
}

impl fmt::Display for Decoded {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Decoded::Keypad(key) => write!(f, "keypad {key}"),
            Decoded::Reader(code) => write!(f, "reader {code}"),
        }
    }
}

/// Interpret a completed frame.
///
/// Returns `None` for every frame that should be discarded silently: empty
/// frames, unsupported lengths, and reader frames with bad parity.
///
/// ```
/// use wiegand_core::{Decoded, Frame, classify};
///
/// let good = Frame::from_bits([
///     0, 1, 0, 0, 1, 0, 1, 0, 1, 0, 1, 1, 0, 0, 0, 0, 1, 1, 1, 1, 1, 0, 0, 1, 1, 0,
/// ]).unwrap();
/// assert_eq!(classify(&good), Some(Decoded::Reader(0x95_61F3)));
///
/// let short = Frame::from_bits([1, 0, 1]).unwrap();
/// assert_eq!(classify(&short), None);
/// ```
#[must_use]
pub fn classify(frame: &Frame) -> Option<Decoded> {
    let bits = frame.bits();

    match bits.len() {
        KEYPAD_FRAME_BITS => Some(Decoded::Keypad(msb_first(bits) as u8)),
        len if READER_FRAME_LENGTHS.contains(&len) => {
            if !has_valid_parity(frame) {
                return None;
            }
            Some(Decoded::Reader(msb_first(&bits[1..bits.len() - 1])))
        }
        _ => None,
    }
}

/// Fold bits, most significant first, into an integer.
///
/// Callers never pass more than 32 bits, well inside `u64`.
fn msb_first(bits: &[u8]) -> u64 {
    bits.iter()
        .fold(0u64, |acc, &bit| (acc << 1) | u64::from(bit & 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn frame(bits: &[u8]) -> Frame {
        Frame::from_bits(bits.iter().copied()).unwrap()
    }

    #[rstest]
    #[case(&[0, 0, 0, 0], 0)]
    #[case(&[0, 1, 1, 0], 6)]
    #[case(&[1, 0, 1, 0], 10)]
    #[case(&[1, 1, 1, 1], 15)]
    fn test_keypad(#[case] bits: &[u8], #[case] expected: u8) {
        assert_eq!(classify(&frame(bits)), Some(Decoded::Keypad(expected)));
    }

    #[test]
    fn test_reader_26() {
        let bits = [
            0, 1, 0, 0, 1, 0, 1, 0, 1, 0, 1, 1, 0, 0, 0, 0, 1, 1, 1, 1, 1, 0, 0, 1, 1, 0,
        ];
        assert_eq!(classify(&frame(&bits)), Some(Decoded::Reader(0x95_61F3)));
    }

    #[test]
    fn test_reader_34() {
        let bits = [
            1, 1, 1, 0, 1, 0, 0, 1, 0, 1, 1, 0, 0, 1, 0, 1, 1, 0, 0, 0, 0, 1, 1, 1, 1, 1, 0, 0, 1,
            1, 0, 0, 1, 1,
        ];
        assert_eq!(
            classify(&frame(&bits)),
            Some(Decoded::Reader(0xD2CB_0F99))
        );
    }

    #[test]
    fn test_reader_bad_parity_dropped() {
        let bits = [
            0, 1, 0, 0, 1, 0, 1, 0, 1, 0, 1, 1, 0, 0, 0, 0, 1, 1, 1, 1, 1, 0, 0, 1, 1, 1,
        ];
        assert_eq!(classify(&frame(&bits)), None);
    }

    #[test]
    fn test_every_reader_length_decodes() {
        for len in READER_FRAME_LENGTHS {
            // Zero payload: even leading parity 0, odd trailing parity 1
            let mut bits = vec![0u8; len];
            bits[len - 1] = 1;
            assert_eq!(
                classify(&frame(&bits)),
                Some(Decoded::Reader(0)),
                "{len}-bit frame"
            );
        }
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(2)]
    #[case(8)]
    #[case(25)]
    #[case(27)]
    #[case(32)]
    #[case(35)]
    fn test_other_lengths_dropped(#[case] len: usize) {
        let bits = vec![1u8; len];
        assert_eq!(classify(&frame(&bits)), None);
    }

    #[test]
    fn test_decoded_display() {
        assert_eq!(Decoded::Keypad(6).to_string(), "keypad 6");
        assert_eq!(Decoded::Reader(42).to_string(), "reader 42");
    }
}
