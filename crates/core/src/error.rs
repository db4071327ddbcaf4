//! Error types for cheeky-led-core.

use thiserror::Error;

/// Core library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed command-line input (non-numeric channel, bad flag).
    #[error("invalid input: {0}")]
    Input(String),

    /// Value out of the accepted range.
    #[error("value out of range: {field} = {value} (allowed {min}..={max})")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    /// The HID transport could not be opened or enumeration failed.
    #[error("device access error: {0}")]
    DeviceAccess(String),

    /// A device did not expose a usable identity property.
    #[error("property lookup failed: {key} on {device}")]
    PropertyLookup { device: String, key: String },

    /// The transport rejected a report write.
    #[error("report write failed on {device}: {reason}")]
    ReportWrite { device: String, reason: String },

    /// Raw HID transport failure.
    #[error("HID error: {0}")]
    Hid(String),
}

impl Error {
    /// Whether this error aborts the whole run.
    ///
    /// Property lookups and report writes only affect a single device.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::PropertyLookup { .. } | Self::ReportWrite { .. })
    }

    /// Whether this error comes from user input rather than the hardware.
    pub fn is_input(&self) -> bool {
        matches!(self, Self::Input(_) | Self::OutOfRange { .. })
    }
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, Error>;
