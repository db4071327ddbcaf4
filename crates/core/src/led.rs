//! LED report driver.
//!
//! Sends the optional activation report and the color report to every
//! located notifier. Activation goes out at most once per run, to the first
//! device; repeating it makes the LEDs flicker. Write failures are logged and
//! recorded per device, never propagated.

use crate::color::{Activation, Color};
use crate::comm::ErrorClass;
use crate::report::LedReport;
use crate::transport::{send_led_report, DeviceHandle, HidTransport};
use serde::Serialize;
use tracing::{info, warn};

/// Result of a single report write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WriteStatus {
    Ok,
    Failed { reason: String },
}

impl WriteStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// What happened on one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceOutcome {
    pub device: DeviceHandle,
    /// Present only on the device that received the activation report.
    pub activation: Option<WriteStatus>,
    pub color: WriteStatus,
}

/// Outcome of a full run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub color: Color,
    pub activation: Activation,
    pub devices: Vec<DeviceOutcome>,
}

impl RunSummary {
    /// Number of report writes the transport rejected.
    pub fn failed_writes(&self) -> usize {
        self.devices
            .iter()
            .flat_map(|d| d.activation.iter().chain(std::iter::once(&d.color)))
            .filter(|status| !status.is_ok())
            .count()
    }

    /// True when every attempted write succeeded.
    pub fn is_clean(&self) -> bool {
        self.failed_writes() == 0
    }

    /// Whether an activation report was attempted during the run.
    pub fn activation_attempted(&self) -> bool {
        self.devices.iter().any(|d| d.activation.is_some())
    }
}

/// Drive the activation and color reports over `devices`, in order.
pub fn drive_devices(
    transport: &dyn HidTransport,
    devices: &[DeviceHandle],
    color: Color,
    activation: Activation,
) -> RunSummary {
    let color_report = LedReport::SetColor(color);
    let mut activation_pending = activation.is_requested();
    let mut outcomes = Vec::with_capacity(devices.len());

    for device in devices {
        let activation_status = if activation_pending {
            // Marked as sent even when the write fails.
            activation_pending = false;
            Some(write_best_effort(transport, device, &LedReport::Activation))
        } else {
            None
        };
        let color_status = write_best_effort(transport, device, &color_report);

        outcomes.push(DeviceOutcome {
            device: device.clone(),
            activation: activation_status,
            color: color_status,
        });
    }

    RunSummary {
        color,
        activation,
        devices: outcomes,
    }
}

fn write_best_effort(
    transport: &dyn HidTransport,
    device: &DeviceHandle,
    report: &LedReport,
) -> WriteStatus {
    match send_led_report(transport, device, report) {
        Ok(()) => {
            info!(device = %device, report = report.name(), "Report sent");
            WriteStatus::Ok
        }
        Err(e) => {
            let class = ErrorClass::classify(&e);
            warn!(
                device = %device,
                report = report.name(),
                class = ?class,
                hint = class.hint().unwrap_or(""),
                "Report write failed: {e}"
            );
            WriteStatus::Failed {
                reason: e.to_string(),
            }
        }
    }
}
