//! One pass over the attached notifiers: validate, open, locate, drive, release.

use crate::color::{Activation, Color};
use crate::device::{locate_notifiers, LocatorConfig};
use crate::error::Result;
use crate::led::{drive_devices, RunSummary};
use crate::transport::{DeviceHandle, HidTransport};
use tracing::{debug, warn};

/// A fully validated LED request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedRequest {
    pub color: Color,
    pub activation: Activation,
    pub locator: LocatorConfig,
}

/// Validate the raw `R G B [A]` arguments.
///
/// Must succeed before any transport is opened.
pub fn parse_request(
    red: &str,
    green: &str,
    blue: &str,
    activation: Option<&str>,
) -> Result<LedRequest> {
    Ok(LedRequest {
        color: Color::parse(red, green, blue)?,
        activation: Activation::parse(activation)?,
        locator: LocatorConfig::default(),
    })
}

/// Open a transport with `open`, apply `request`, and release the transport.
pub fn execute<T, F>(request: &LedRequest, open: F) -> Result<RunSummary>
where
    T: HidTransport,
    F: FnOnce() -> Result<T>,
{
    let mut transport = open()?;
    execute_with(&mut transport, request)
}

/// Apply `request` over an already opened transport.
pub fn execute_with(transport: &mut dyn HidTransport, request: &LedRequest) -> Result<RunSummary> {
    let devices = locate_notifiers(transport, &request.locator)?;
    if devices.is_empty() {
        warn!(target_identity = %request.locator.target, "No notifier found");
    }

    debug!(
        color = %request.color,
        activation = ?request.activation,
        devices = devices.len(),
        "Driving LED reports"
    );
    Ok(drive_devices(
        transport,
        &devices,
        request.color,
        request.activation,
    ))
}

/// Open a transport and list matching notifiers without writing anything.
pub fn list<T, F>(locator: &LocatorConfig, open: F) -> Result<Vec<DeviceHandle>>
where
    T: HidTransport,
    F: FnOnce() -> Result<T>,
{
    let mut transport = open()?;
    locate_notifiers(&mut transport, locator)
}
