//! Property-based tests for parity validation and frame classification.
//!
//! These tests use proptest to generate random frames and verify that the
//! classification rules hold for every input, not just the fixed vectors.

use proptest::prelude::*;
use wiegand_core::{Decoded, Frame, check_parity, classify};

/// Strategy for generating a bit sequence of exactly `len` bits.
fn bits(len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(0u8..=1, len)
}

/// Strategy for generating a reader frame length.
fn reader_len() -> impl Strategy<Value = usize> {
    prop_oneof![Just(26usize), Just(34usize)]
}

/// Strategy for a reader frame with correct parity.
///
/// The payload is random; the leading and trailing parity bits are chosen so
/// the first half has an even and the second half an odd number of ones.
fn valid_reader_frame() -> impl Strategy<Value = Vec<u8>> {
    reader_len()
        .prop_flat_map(|len| bits(len - 2))
        .prop_map(|payload| {
            let half = (payload.len() + 2) / 2;
            let first_ones = payload[..half - 1].iter().filter(|&&b| b == 1).count();
            let second_ones = payload[half - 1..].iter().filter(|&&b| b == 1).count();

            let mut frame = Vec::with_capacity(payload.len() + 2);
            frame.push((first_ones % 2) as u8);
            frame.extend_from_slice(&payload);
            frame.push(((second_ones + 1) % 2) as u8);
            frame
        })
}

fn msb_first(bits: &[u8]) -> u64 {
    bits.iter().fold(0, |acc, &b| (acc << 1) | u64::from(b))
}

fn ones(bits: &[u8]) -> usize {
    bits.iter().filter(|&&b| b == 1).count()
}

proptest! {
    /// Property: every 4-bit frame is a keypad press with its MSB-first value.
    #[test]
    fn prop_keypad_value(frame_bits in bits(4)) {
        let frame = Frame::from_bits(frame_bits.clone()).unwrap();
        prop_assert_eq!(
            classify(&frame),
            Some(Decoded::Keypad(msb_first(&frame_bits) as u8))
        );
    }

    /// Property: parity holds iff the first half has even and the second half
    /// odd popcount.
    #[test]
    fn prop_parity_definition(frame_bits in reader_len().prop_flat_map(bits)) {
        let (first, second) = frame_bits.split_at(frame_bits.len() / 2);
        let expected = ones(first) % 2 == 0 && ones(second) % 2 == 1;
        prop_assert_eq!(check_parity(&frame_bits), Ok(expected));
    }

    /// Property: a valid reader frame decodes to its interior bits.
    #[test]
    fn prop_valid_reader_decodes(frame_bits in valid_reader_frame()) {
        let frame = Frame::from_bits(frame_bits.clone()).unwrap();
        let interior = &frame_bits[1..frame_bits.len() - 1];
        prop_assert_eq!(classify(&frame), Some(Decoded::Reader(msb_first(interior))));
    }

    /// Property: flipping either parity bit of a valid frame drops it.
    #[test]
    fn prop_flipped_parity_dropped(frame_bits in valid_reader_frame(), last in any::<bool>()) {
        let mut flipped = frame_bits;
        let idx = if last { flipped.len() - 1 } else { 0 };
        flipped[idx] ^= 1;

        let frame = Frame::from_bits(flipped).unwrap();
        prop_assert_eq!(classify(&frame), None);
    }

    /// Property: lengths other than 4, 26 and 34 never classify.
    #[test]
    fn prop_other_lengths_dropped(
        frame_bits in (0usize..64)
            .prop_filter("supported length", |len| ![4, 26, 34].contains(len))
            .prop_flat_map(bits)
    ) {
        let frame = Frame::from_bits(frame_bits).unwrap();
        prop_assert_eq!(classify(&frame), None);
    }
}
