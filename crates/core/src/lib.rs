//! cheeky-led-core: notifier discovery and the LED report protocol.
//!
//! This crate finds Dream Cheeky webmail notifiers among the attached USB HID
//! devices and drives their RGB LED with 8-byte reports.

pub mod color;
pub mod comm;
pub mod device;
pub mod error;
pub mod led;
pub mod report;
pub mod run;
pub mod transport;

/// Dream Cheeky USB Vendor ID.
pub const DREAM_CHEEKY_VID: u16 = 0x1D34;

/// Known Dream Cheeky product IDs.
pub mod pids {
    /// Webmail notifier (RGB LED).
    pub const WEBMAIL_NOTIFIER: u16 = 0x0004;
}

/// HID usage codes used as the enumeration hint.
pub mod usages {
    /// Generic desktop controls.
    pub const GENERIC_DESKTOP_PAGE: u16 = 0x01;
    /// Primary usage reported by the notifier's LED interface.
    pub const NOTIFIER_USAGE: u16 = 0x10;
}
