//! Session configuration.
//!
//! A [`WiegandConfig`] is always passed explicitly to the session. The
//! environment is only consulted when a host asks for it through
//! [`WiegandConfig::from_env`]:
//!
//! | Field | Default | Variable |
//! |-------|---------|----------|
//! | `d0` | GPIO 17 | `WIEGAND_D0` |
//! | `d1` | GPIO 18 | `WIEGAND_D1` |
//! | `gap_ms` | 20 | `WIEGAND_TIMEOUT` |

use crate::error::{Result, WiegandError};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;
use wiegand_core::LineId;
use wiegand_core::constants::{
    DEFAULT_D0_GPIO, DEFAULT_D1_GPIO, DEFAULT_GAP_MS, ENV_D0, ENV_D1, ENV_GAP_MS,
};

/// Configuration for one Wiegand session.
///
/// # Examples
///
/// ```
/// use wiegand_hardware::WiegandConfig;
/// use wiegand_core::LineId;
///
/// let config = WiegandConfig::default()
///     .with_d0(LineId::Gpio(5))
///     .with_d1("/dev/wiegand/d1")
///     .with_gap_ms(30);
///
/// assert_eq!(config.gap().as_millis(), 30);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WiegandConfig {
    /// Line carrying `0` bits.
    pub d0: LineId,

    /// Line carrying `1` bits.
    pub d1: LineId,

    /// Silence after which the collected bits form a frame, in milliseconds.
    pub gap_ms: u64,
}

impl Default for WiegandConfig {
    fn default() -> Self {
        Self {
            d0: LineId::Gpio(DEFAULT_D0_GPIO),
            d1: LineId::Gpio(DEFAULT_D1_GPIO),
            gap_ms: DEFAULT_GAP_MS,
        }
    }
}

impl WiegandConfig {
    /// Defaults overlaid with `WIEGAND_D0`, `WIEGAND_D1` and `WIEGAND_TIMEOUT`.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Overlay values looked up by environment variable name.
    ///
    /// Unset or empty variables keep the current value. The gap is read from
    /// the leading digits of the value, so `35ms` means 35. A gap with no
    /// leading digits or a value of zero is ignored with a warning.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(d0) = get(ENV_D0) {
            self.d0 = LineId::from(d0);
        }
        if let Some(d1) = get(ENV_D1) {
            self.d1 = LineId::from(d1);
        }
        if let Some(gap) = get(ENV_GAP_MS) {
            match leading_millis(&gap) {
                Some(gap_ms) if gap_ms > 0 => self.gap_ms = gap_ms,
                _ => warn!("Ignoring invalid {}={:?}", ENV_GAP_MS, gap),
            }
        }

        self
    }

    pub fn with_d0(mut self, d0: impl Into<LineId>) -> Self {
        self.d0 = d0.into();
        self
    }

    pub fn with_d1(mut self, d1: impl Into<LineId>) -> Self {
        self.d1 = d1.into();
        self
    }

    pub fn with_gap_ms(mut self, gap_ms: u64) -> Self {
        self.gap_ms = gap_ms;
        self
    }

    /// Inter-bit gap as a duration.
    pub fn gap(&self) -> Duration {
        Duration::from_millis(self.gap_ms)
    }

    /// Check that the configuration can drive a session.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the gap is zero or both lines
    /// resolve to the same resource.
    pub fn validate(&self) -> Result<()> {
        if self.gap_ms == 0 {
            return Err(WiegandError::configuration("gap_ms must be greater than 0"));
        }

        if self.d0.value_path() == self.d1.value_path() {
            return Err(WiegandError::configuration(format!(
                "d0 and d1 both resolve to {}",
                self.d0.value_path().display()
            )));
        }

        Ok(())
    }
}

/// Integer formed by the leading digits of `value`, after leading whitespace.
fn leading_millis(value: &str) -> Option<u64> {
    let value = value.trim_start();
    let end = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    value[..end].parse().ok()
}
