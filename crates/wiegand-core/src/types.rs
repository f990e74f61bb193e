use crate::{Result, constants::SYSFS_GPIO_ROOT, error::Error};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// One of the two Wiegand data lines.
///
/// A pulse on D0 carries a `0` bit, a pulse on D1 carries a `1` bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Line {
    D0,
    D1,
}

impl Line {
    /// Both lines, in bit order.
    pub const ALL: [Line; 2] = [Line::D0, Line::D1];

    /// Bit value carried by a pulse on this line.
    #[must_use]
    pub fn bit(self) -> u8 {
        match self {
            Line::D0 => 0,
            Line::D1 => 1,
        }
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Line::D0 => write!(f, "D0"),
            Line::D1 => write!(f, "D1"),
        }
    }
}

/// Identifier of the resource backing a data line.
///
/// Either a sysfs GPIO number, resolved to `/sys/class/gpio/gpio{N}/value`,
/// or an explicit path to a value file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum LineId {
    Gpio(u32),
    Path(PathBuf),
}

impl LineId {
    /// Path of the value resource sampled for this line.
    ///
    /// ```
    /// use wiegand_core::LineId;
    /// use std::path::Path;
    ///
    /// assert_eq!(LineId::Gpio(17).value_path(), Path::new("/sys/class/gpio/gpio17/value"));
    /// assert_eq!(LineId::from("/dev/fake").value_path(), Path::new("/dev/fake"));
    /// ```
    #[must_use]
    pub fn value_path(&self) -> PathBuf {
        match self {
            LineId::Gpio(n) => Path::new(SYSFS_GPIO_ROOT).join(format!("gpio{n}")).join("value"),
            LineId::Path(path) => path.clone(),
        }
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LineId::Gpio(n) => write!(f, "gpio{n}"),
            LineId::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

impl From<u32> for LineId {
    fn from(gpio: u32) -> Self {
        LineId::Gpio(gpio)
    }
}

impl From<&str> for LineId {
    fn from(s: &str) -> Self {
        match s.trim().parse::<u32>() {
            Ok(gpio) => LineId::Gpio(gpio),
            Err(_) => LineId::Path(PathBuf::from(s)),
        }
    }
}

impl From<String> for LineId {
    fn from(s: String) -> Self {
        LineId::from(s.as_str())
    }
}

impl std::str::FromStr for LineId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().is_empty() {
            return Err(Error::InvalidLineId(s.to_string()));
        }
        Ok(LineId::from(s))
    }
}

/// Wire form accepted when deserializing a [`LineId`]: a number or a string.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawLineId {
    Number(u32),
    Text(String),
}

impl<'de> Deserialize<'de> for LineId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match RawLineId::deserialize(deserializer)? {
            RawLineId::Number(n) => LineId::Gpio(n),
            RawLineId::Text(s) => LineId::from(s),
        })
    }
}

/// A completed frame: the bits captured when the inter-bit gap elapsed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Frame(Vec<u8>);

impl Frame {
    /// Build a frame from explicit bit values.
    ///
    /// # Errors
    /// Returns `Error::InvalidBit` if any value is not 0 or 1.
    pub fn from_bits(bits: impl IntoIterator<Item = u8>) -> Result<Self> {
        let bits: Vec<u8> = bits.into_iter().collect();
        if let Some(&bad) = bits.iter().find(|&&b| b > 1) {
            return Err(Error::InvalidBit(bad));
        }
        Ok(Frame(bits))
    }

    #[must_use]
    pub fn bits(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for bit in &self.0 {
            write!(f, "{bit}")?;
        }
        Ok(())
    }
}

/// In-progress frame being assembled from line pulses.
///
/// Only ever grows by whole line pulses and is emptied in one step by
/// [`BitFrame::take`], so a [`Frame`] never contains a partial flush.
#[derive(Debug, Default)]
pub struct BitFrame {
    bits: Vec<u8>,
}

impl BitFrame {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the bit carried by `line`.
    pub fn push(&mut self, line: Line) {
        self.bits.push(line.bit());
    }

    /// Snapshot the collected bits and reset to empty.
    pub fn take(&mut self) -> Frame {
        Frame(std::mem::take(&mut self.bits))
    }

    /// Drop the collected bits without producing a frame.
    pub fn clear(&mut self) {
        self.bits.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_line_bits() {
        assert_eq!(Line::D0.bit(), 0);
        assert_eq!(Line::D1.bit(), 1);
        assert_eq!(Line::D0.to_string(), "D0");
        assert_eq!(Line::D1.to_string(), "D1");
    }

    #[rstest]
    #[case(5, "/sys/class/gpio/gpio5/value")]
    #[case(17, "/sys/class/gpio/gpio17/value")]
    #[case(18, "/sys/class/gpio/gpio18/value")]
    fn test_gpio_value_path(#[case] gpio: u32, #[case] expected: &str) {
        assert_eq!(LineId::Gpio(gpio).value_path(), PathBuf::from(expected));
    }

    #[rstest]
    #[case("/foo/bar/baz")]
    #[case("nope")]
    #[case("se*3n(2j20ns@nan")]
    fn test_path_passes_through(#[case] input: &str) {
        let id = LineId::from(input);
        assert_eq!(id, LineId::Path(PathBuf::from(input)));
        assert_eq!(id.value_path(), PathBuf::from(input));
    }

    #[rstest]
    #[case("17", LineId::Gpio(17))]
    #[case(" 4 ", LineId::Gpio(4))]
    #[case("gpio17", LineId::Path(PathBuf::from("gpio17")))]
    fn test_line_id_from_str(#[case] input: &str, #[case] expected: LineId) {
        assert_eq!(input.parse::<LineId>().unwrap(), expected);
    }

    #[test]
    fn test_line_id_empty_rejected() {
        assert!(matches!(
            "  ".parse::<LineId>(),
            Err(Error::InvalidLineId(_))
        ));
    }

    #[test]
    fn test_frame_rejects_non_binary() {
        assert_eq!(Frame::from_bits([0, 1, 2]), Err(Error::InvalidBit(2)));
    }

    #[test]
    fn test_frame_display() {
        let frame = Frame::from_bits([0, 1, 1, 0]).unwrap();
        assert_eq!(frame.to_string(), "0110");
        assert_eq!(frame.len(), 4);
        assert!(Frame::default().is_empty());
    }

    #[test]
    fn test_bit_frame_take_resets() {
        let mut buf = BitFrame::new();
        buf.push(Line::D1);
        buf.push(Line::D0);
        buf.push(Line::D1);

        let frame = buf.take();
        assert_eq!(frame.bits(), &[1, 0, 1]);
        assert!(buf.is_empty());
        assert!(buf.take().is_empty());
    }
}
