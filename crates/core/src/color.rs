//! Input validation: LED color channels and the activation flag.
//!
//! All validation happens before the HID transport is opened, so a bad
//! channel never leads to partial device I/O.
//!
//! ## Channels
//! - **Range**: 0 – 31 per channel (5-bit PWM on the notifier)
//! - **Parsing**: base-10 integers; surrounding whitespace is ignored
//!
//! ## Activation flag
//! - Absent or `0`: send the activation report once for the run
//! - Any other integer, negative included: skip activation

use crate::error::{Error, Result};
use serde::Serialize;
use std::fmt;

/// Lowest channel intensity (LED off).
pub const INTENSITY_MIN: u8 = 0;
/// Highest channel intensity (LED fully on).
pub const INTENSITY_MAX: u8 = 31;

/// A validated RGB intensity triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Color {
    red: u8,
    green: u8,
    blue: u8,
}

impl Color {
    /// Validate and build a color from raw channel values.
    pub fn new(red: i64, green: i64, blue: i64) -> Result<Self> {
        Ok(Self {
            red: validate_channel("red", red)?,
            green: validate_channel("green", green)?,
            blue: validate_channel("blue", blue)?,
        })
    }

    /// Parse a color from three base-10 channel strings.
    pub fn parse(red: &str, green: &str, blue: &str) -> Result<Self> {
        Self::new(
            parse_integer("red", red)?,
            parse_integer("green", green)?,
            parse_integer("blue", blue)?,
        )
    }

    pub fn red(&self) -> u8 {
        self.red
    }

    pub fn green(&self) -> u8 {
        self.green
    }

    pub fn blue(&self) -> u8 {
        self.blue
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R={} G={} B={}", self.red, self.green, self.blue)
    }
}

/// Whether the run sends the activation report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Activation {
    /// Send the activation report to the first matched device.
    #[default]
    Send,
    /// Never send the activation report.
    Skip,
}

impl Activation {
    /// Map the raw flag value: zero activates, anything else skips.
    pub fn from_flag(value: i64) -> Self {
        if value == 0 {
            Self::Send
        } else {
            Self::Skip
        }
    }

    /// Parse the optional fourth argument.
    pub fn parse(flag: Option<&str>) -> Result<Self> {
        match flag {
            None => Ok(Self::Send),
            Some(text) => parse_integer("activation flag", text).map(Self::from_flag),
        }
    }

    pub fn is_requested(&self) -> bool {
        matches!(self, Self::Send)
    }
}

/// Validate a single channel intensity.
pub fn validate_channel(field: &'static str, value: i64) -> Result<u8> {
    let max = i64::from(INTENSITY_MAX);
    let min = i64::from(INTENSITY_MIN);
    if !(min..=max).contains(&value) {
        return Err(Error::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    u8::try_from(value).map_err(|_| Error::OutOfRange {
        field,
        value,
        min,
        max,
    })
}

fn parse_integer(field: &str, text: &str) -> Result<i64> {
    text.trim()
        .parse::<i64>()
        .map_err(|e| Error::Input(format!("{field} must be a base-10 integer, got {text:?}: {e}")))
}
