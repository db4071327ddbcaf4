//! Device locator: enumeration and identity filtering.

use crate::error::{Error, Result};
use crate::transport::{DeviceHandle, HidTransport, PropertyKey};
use crate::{pids, usages, DREAM_CHEEKY_VID};
use serde::Serialize;
use std::fmt;
use tracing::{debug, info};

/// Usage page / usage pair handed to the transport as an enumeration hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UsageFilter {
    pub usage_page: u16,
    pub usage: u16,
}

impl UsageFilter {
    /// Generic desktop page, usage the notifier reports for its LED control.
    pub const NOTIFIER: Self = Self {
        usage_page: usages::GENERIC_DESKTOP_PAGE,
        usage: usages::NOTIFIER_USAGE,
    };

    /// Whether a device's primary usage satisfies this filter.
    ///
    /// A zero usage acts as a wildcard for the page.
    pub fn matches(&self, usage_page: u16, usage: u16) -> bool {
        usage_page == self.usage_page && (self.usage == 0 || usage == self.usage)
    }
}

impl Default for UsageFilter {
    fn default() -> Self {
        Self::NOTIFIER
    }
}

/// USB vendor / product pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DeviceIdentity {
    pub vendor_id: u16,
    pub product_id: u16,
}

impl DeviceIdentity {
    /// Dream Cheeky webmail notifier.
    pub const NOTIFIER: Self = Self {
        vendor_id: DREAM_CHEEKY_VID,
        product_id: pids::WEBMAIL_NOTIFIER,
    };

    pub fn new(vendor_id: u16, product_id: u16) -> Self {
        Self {
            vendor_id,
            product_id,
        }
    }
}

impl Default for DeviceIdentity {
    fn default() -> Self {
        Self::NOTIFIER
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VID=0x{:04X} PID=0x{:04X}", self.vendor_id, self.product_id)
    }
}

/// What the locator looks for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocatorConfig {
    pub filter: UsageFilter,
    pub target: DeviceIdentity,
}

/// Read a device's vendor / product identity.
///
/// Fails with [`Error::PropertyLookup`] if either property is missing or does
/// not fit a USB identifier.
pub fn read_identity(
    transport: &dyn HidTransport,
    device: &DeviceHandle,
) -> Result<DeviceIdentity> {
    Ok(DeviceIdentity {
        vendor_id: read_u16_property(transport, device, PropertyKey::VendorId)?,
        product_id: read_u16_property(transport, device, PropertyKey::ProductId)?,
    })
}

fn read_u16_property(
    transport: &dyn HidTransport,
    device: &DeviceHandle,
    key: PropertyKey,
) -> Result<u16> {
    transport
        .integer_property(device, key)
        .and_then(|value| u16::try_from(value).ok())
        .ok_or_else(|| Error::PropertyLookup {
            device: device.to_string(),
            key: key.to_string(),
        })
}

/// Find every attached device matching `config`, in enumeration order.
///
/// Devices whose identity cannot be read or does not match are skipped.
/// Only a failing enumeration is an error.
pub fn locate_notifiers(
    transport: &mut dyn HidTransport,
    config: &LocatorConfig,
) -> Result<Vec<DeviceHandle>> {
    debug!(
        usage_page = format_args!("0x{:04X}", config.filter.usage_page),
        usage = format_args!("0x{:04X}", config.filter.usage),
        "Starting HID device enumeration"
    );
    let candidates = transport.enumerate(&config.filter)?;

    let mut matched = Vec::new();
    for device in candidates {
        match read_identity(transport, &device) {
            Ok(identity) if identity == config.target => {
                info!(device = %device, identity = %identity, "Found notifier");
                matched.push(device);
            }
            Ok(identity) => {
                info!(device = %device, identity = %identity, "Skipping device");
            }
            Err(e) => {
                info!(device = %device, error = %e, "Skipping device");
            }
        }
    }

    debug!(count = matched.len(), "Device enumeration complete");
    Ok(matched)
}
