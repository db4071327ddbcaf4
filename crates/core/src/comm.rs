//! Transport error classification.
//!
//! Writes are best-effort and never retried, but a failing device or a
//! failing transport open is reported with its likely cause.

use crate::error::Error;

/// Classification of communication errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Device went away between enumeration and the write.
    Disconnected,
    /// The OS refused access (hidraw permissions, exclusive access).
    PermissionDenied,
    /// Timeout or busy device.
    Transient,
    /// Anything else the transport rejected.
    Rejected,
}

impl ErrorClass {
    /// Classify an error from its variant and transport message.
    pub fn classify(err: &Error) -> Self {
        match err {
            Error::DeviceAccess(msg) | Error::Hid(msg) => Self::from_message(msg),
            Error::ReportWrite { reason, .. } => Self::from_message(reason),
            Error::Input(_) | Error::OutOfRange { .. } | Error::PropertyLookup { .. } => {
                Self::Rejected
            }
        }
    }

    fn from_message(msg: &str) -> Self {
        let lower = msg.to_lowercase();
        if lower.contains("disconnect")
            || lower.contains("no such device")
            || lower.contains("not found")
        {
            Self::Disconnected
        } else if lower.contains("permission")
            || lower.contains("access denied")
            || lower.contains("access is denied")
        {
            Self::PermissionDenied
        } else if lower.contains("timeout")
            || lower.contains("timed out")
            || lower.contains("busy")
        {
            Self::Transient
        } else {
            Self::Rejected
        }
    }

    /// User-facing hint for this class, if there is one.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Disconnected => Some("the device was unplugged or reset during the run"),
            Self::PermissionDenied => Some(
                "the current user cannot open the HID device; on Linux add a udev rule \
                 granting access to vendor 1d34",
            ),
            Self::Transient => Some("the device is busy; try again"),
            Self::Rejected => None,
        }
    }
}
