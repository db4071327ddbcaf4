//! Notifier LED report layouts.
//!
//! Every report is 8 bytes, sent with report ID 0. The last two bytes carry
//! the command: `0x1A 0x03` initialises the LED controller, `0x1A 0x05` sets
//! the intensity of the three channels held in bytes 0..3.
//!
//! ```text
//! activation: 1F 02 00 5F 00 00 1A 03
//! color:      RR GG BB 00 00 00 1A 05
//! ```

use crate::color::Color;

/// Length of every notifier report, excluding the report ID.
pub const REPORT_LEN: usize = 8;

/// Report ID used for all notifier reports.
pub const REPORT_ID: u8 = 0x00;

/// Fixed sequence switching the LED controller into an addressable state.
pub const ACTIVATION_REPORT: [u8; REPORT_LEN] = [0x1F, 0x02, 0x00, 0x5F, 0x00, 0x00, 0x1A, 0x03];

/// Trailing command bytes of a color-set report.
const SET_COLOR_COMMAND: [u8; 2] = [0x1A, 0x05];

/// HID report type. The notifier only takes LED commands as input reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportType {
    Input,
}

/// A report understood by the notifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedReport {
    /// One-time controller initialisation.
    Activation,
    /// Set the three channel intensities.
    SetColor(Color),
}

impl LedReport {
    /// Report type the notifier expects for LED commands.
    pub const REPORT_TYPE: ReportType = ReportType::Input;

    /// Encode into the 8-byte wire layout.
    pub fn encode(&self) -> [u8; REPORT_LEN] {
        match self {
            Self::Activation => ACTIVATION_REPORT,
            Self::SetColor(color) => {
                let mut buf = [0u8; REPORT_LEN];
                buf[0] = color.red();
                buf[1] = color.green();
                buf[2] = color.blue();
                buf[6..].copy_from_slice(&SET_COLOR_COMMAND);
                buf
            }
        }
    }

    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Activation => "activation",
            Self::SetColor(_) => "set-color",
        }
    }
}
