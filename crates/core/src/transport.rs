//! HID transport abstraction for device communication.
//!
//! The locator and the report driver only talk to a [`HidTransport`], so the
//! hidapi-backed transport and the mock used in tests share one interface.

use crate::device::UsageFilter;
use crate::error::{Error, Result};
use crate::report::{LedReport, ReportType, REPORT_ID};
use serde::Serialize;
use std::cell::RefCell;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;
use tracing::{debug, trace};

/// Non-owning reference to a device returned by enumeration.
///
/// Only valid for the transport that produced it, until the next enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceHandle {
    index: usize,
    path: String,
}

impl DeviceHandle {
    pub fn new(index: usize, path: impl Into<String>) -> Self {
        Self {
            index,
            path: path.into(),
        }
    }

    /// Position in the transport's enumeration.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Platform device path.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for DeviceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "device #{} ({})", self.index, self.path)
    }
}

/// Integer device properties the core reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    VendorId,
    ProductId,
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::VendorId => "VendorID",
            Self::ProductId => "ProductID",
        };
        f.write_str(name)
    }
}

/// Abstraction over the host HID stack.
pub trait HidTransport {
    /// List attached devices. `hint` may narrow the result; callers must not
    /// rely on it being applied.
    fn enumerate(&mut self, hint: &UsageFilter) -> Result<Vec<DeviceHandle>>;

    /// Read an integer property. `None` if the property is missing or not numeric.
    fn integer_property(&self, device: &DeviceHandle, key: PropertyKey) -> Option<i64>;

    /// Write a raw report to the device.
    fn write_report(
        &self,
        device: &DeviceHandle,
        report_type: ReportType,
        report_id: u8,
        data: &[u8],
    ) -> Result<()>;
}

/// Encode and send a notifier report.
pub fn send_led_report(
    transport: &dyn HidTransport,
    device: &DeviceHandle,
    report: &LedReport,
) -> Result<()> {
    let encoded = report.encode();
    trace!(
        device = %device,
        report = report.name(),
        report_hex = format_args!("{:02X?}", encoded),
        "LED report TX"
    );
    transport
        .write_report(device, LedReport::REPORT_TYPE, REPORT_ID, &encoded)
        .map_err(|e| Error::ReportWrite {
            device: device.to_string(),
            reason: e.to_string(),
        })
}

/// Positions of the enumeration entries that survive the usage hint.
///
/// Entries with usage page 0 always pass, since some backends report 0 when
/// the descriptor was not parsed. A device listed once per top-level
/// collection keeps only its first entry that passes the hint.
fn apply_hint<P>(
    entries: impl IntoIterator<Item = (P, u16, u16)>,
    hint: &UsageFilter,
) -> Vec<usize>
where
    P: Eq + Hash,
{
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .enumerate()
        .filter(|(_, (_, usage_page, usage))| *usage_page == 0 || hint.matches(*usage_page, *usage))
        .filter_map(|(pos, (path, _, _))| seen.insert(path).then_some(pos))
        .collect()
}

/// Devices opened during a run, keyed by enumeration index.
///
/// Each device is opened on first use and kept until the cache is cleared.
struct OpenDevices<D> {
    devices: RefCell<HashMap<usize, D>>,
}

impl<D> OpenDevices<D> {
    fn new() -> Self {
        Self {
            devices: RefCell::new(HashMap::new()),
        }
    }

    fn with<R>(
        &self,
        index: usize,
        open: impl FnOnce() -> Result<D>,
        op: impl FnOnce(&D) -> Result<R>,
    ) -> Result<R> {
        let mut devices = self.devices.borrow_mut();
        let device = match devices.entry(index) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(open()?),
        };
        op(device)
    }

    fn clear(&self) {
        self.devices.borrow_mut().clear();
    }
}

/// Transport backed by the system HID stack through hidapi.
///
/// Dropping it closes every opened device, then releases the hidapi context.
pub struct HidapiTransport {
    opened: OpenDevices<hidapi::HidDevice>,
    api: hidapi::HidApi,
    snapshot: Vec<hidapi::DeviceInfo>,
}

impl HidapiTransport {
    /// Initialise hidapi.
    pub fn open() -> Result<Self> {
        debug!("Opening hidapi transport");
        let api = hidapi::HidApi::new()
            .map_err(|e| Error::DeviceAccess(format!("hidapi init: {e}")))?;
        Ok(Self {
            opened: OpenDevices::new(),
            api,
            snapshot: Vec::new(),
        })
    }

    fn info(&self, device: &DeviceHandle) -> Result<&hidapi::DeviceInfo> {
        self.snapshot
            .get(device.index())
            .ok_or_else(|| Error::Hid(format!("{device} is not part of the current enumeration")))
    }
}

impl HidTransport for HidapiTransport {
    fn enumerate(&mut self, hint: &UsageFilter) -> Result<Vec<DeviceHandle>> {
        self.opened.clear();
        self.api
            .refresh_devices()
            .map_err(|e| Error::DeviceAccess(format!("enumerate: {e}")))?;

        let listed: Vec<&hidapi::DeviceInfo> = self.api.device_list().collect();
        let kept = apply_hint(
            listed
                .iter()
                .map(|info| (info.path(), info.usage_page(), info.usage())),
            hint,
        );
        self.snapshot = kept
            .into_iter()
            .filter_map(|pos| listed.get(pos).map(|info| (*info).clone()))
            .collect();

        Ok(self
            .snapshot
            .iter()
            .enumerate()
            .map(|(index, info)| DeviceHandle::new(index, info.path().to_string_lossy()))
            .collect())
    }

    fn integer_property(&self, device: &DeviceHandle, key: PropertyKey) -> Option<i64> {
        let info = self.info(device).ok()?;
        let value = match key {
            PropertyKey::VendorId => info.vendor_id(),
            PropertyKey::ProductId => info.product_id(),
        };
        Some(i64::from(value))
    }

    fn write_report(
        &self,
        device: &DeviceHandle,
        report_type: ReportType,
        report_id: u8,
        data: &[u8],
    ) -> Result<()> {
        let mut buf = Vec::with_capacity(data.len() + 1);
        buf.push(report_id);
        buf.extend_from_slice(data);

        let open = || {
            self.info(device)?
                .open_device(&self.api)
                .map_err(|e| Error::Hid(format!("open {device}: {e}")))
        };
        self.opened.with(device.index(), open, |hid| match report_type {
            // hidapi cannot set input reports; the notifier accepts the same
            // payload through the regular write path.
            ReportType::Input => {
                let written = hid
                    .write(&buf)
                    .map_err(|e| Error::Hid(format!("write: {e}")))?;
                if written == 0 {
                    return Err(Error::Hid("write: no bytes accepted".to_string()));
                }
                Ok(())
            }
        })
    }
}

impl Drop for HidapiTransport {
    fn drop(&mut self) {
        debug!("Releasing hidapi transport");
    }
}

/// A mock HID transport for testing.
///
/// Serves a fixed device list and records every call made against it.
#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    /// A simulated attached device.
    #[derive(Debug, Clone)]
    pub struct MockDevice {
        pub vendor_id: Option<i64>,
        pub product_id: Option<i64>,
        pub fail_writes: bool,
    }

    impl MockDevice {
        pub fn new(vendor_id: u16, product_id: u16) -> Self {
            Self {
                vendor_id: Some(i64::from(vendor_id)),
                product_id: Some(i64::from(product_id)),
                fail_writes: false,
            }
        }

        /// A device whose identity properties cannot be read.
        pub fn anonymous() -> Self {
            Self {
                vendor_id: None,
                product_id: None,
                fail_writes: false,
            }
        }

        /// Make every write to this device fail.
        pub fn failing(mut self) -> Self {
            self.fail_writes = true;
            self
        }
    }

    /// A recorded transport call.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Call {
        Enumerate(UsageFilter),
        Property(usize, PropertyKey),
        Write {
            device: usize,
            report_type: ReportType,
            report_id: u8,
            data: Vec<u8>,
        },
    }

    /// Mock transport over a fixed device list.
    pub struct MockTransport {
        devices: Vec<MockDevice>,
        fail_enumeration: bool,
        calls: Mutex<Vec<Call>>,
    }

    impl MockTransport {
        pub fn new(devices: Vec<MockDevice>) -> Self {
            Self {
                devices,
                fail_enumeration: false,
                calls: Mutex::new(Vec::new()),
            }
        }

        /// A transport whose enumeration call fails.
        pub fn failing_enumeration() -> Self {
            Self {
                fail_enumeration: true,
                ..Self::new(Vec::new())
            }
        }

        /// All calls so far, in order.
        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        /// Report writes so far as `(device index, payload)`.
        pub fn writes(&self) -> Vec<(usize, Vec<u8>)> {
            self.calls()
                .into_iter()
                .filter_map(|call| match call {
                    Call::Write { device, data, .. } => Some((device, data)),
                    _ => None,
                })
                .collect()
        }

        fn record(&self, call: Call) {
            self.calls.lock().unwrap().push(call);
        }
    }

    impl HidTransport for MockTransport {
        fn enumerate(&mut self, hint: &UsageFilter) -> Result<Vec<DeviceHandle>> {
            self.record(Call::Enumerate(*hint));
            if self.fail_enumeration {
                return Err(Error::DeviceAccess("mock: enumeration failed".into()));
            }
            Ok((0..self.devices.len())
                .map(|i| DeviceHandle::new(i, format!("mock:{i}")))
                .collect())
        }

        fn integer_property(&self, device: &DeviceHandle, key: PropertyKey) -> Option<i64> {
            self.record(Call::Property(device.index(), key));
            let dev = self.devices.get(device.index())?;
            match key {
                PropertyKey::VendorId => dev.vendor_id,
                PropertyKey::ProductId => dev.product_id,
            }
        }

        fn write_report(
            &self,
            device: &DeviceHandle,
            report_type: ReportType,
            report_id: u8,
            data: &[u8],
        ) -> Result<()> {
            self.record(Call::Write {
                device: device.index(),
                report_type,
                report_id,
                data: data.to_vec(),
            });
            match self.devices.get(device.index()) {
                Some(dev) if !dev.fail_writes => Ok(()),
                Some(_) => Err(Error::Hid("mock: no such device".into())),
                None => Err(Error::Hid(format!("mock: unknown {device}"))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::{Call, MockDevice, MockTransport};
    use super::*;
    use crate::color::Color;

    #[test]
    fn send_led_report_writes_input_report_id_zero() {
        let mut mock = MockTransport::new(vec![MockDevice::new(0x1D34, 0x0004)]);
        let devices = mock.enumerate(&UsageFilter::NOTIFIER).unwrap();
        let color = Color::new(31, 0, 5).unwrap();

        send_led_report(&mock, &devices[0], &LedReport::SetColor(color)).unwrap();

        assert_eq!(
            mock.calls().last(),
            Some(&Call::Write {
                device: 0,
                report_type: ReportType::Input,
                report_id: 0,
                data: vec![31, 0, 5, 0x00, 0x00, 0x00, 0x1A, 0x05],
            })
        );
    }

    #[test]
    fn send_led_report_wraps_transport_failure() {
        let mut mock = MockTransport::new(vec![MockDevice::new(0x1D34, 0x0004).failing()]);
        let devices = mock.enumerate(&UsageFilter::NOTIFIER).unwrap();

        let err = send_led_report(&mock, &devices[0], &LedReport::Activation).unwrap_err();
        assert!(matches!(err, Error::ReportWrite { .. }));
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("device #0"));
    }

    #[test]
    fn device_handle_display() {
        let handle = DeviceHandle::new(2, "/dev/hidraw3");
        assert_eq!(handle.to_string(), "device #2 (/dev/hidraw3)");
        assert_eq!(handle.path(), "/dev/hidraw3");
    }

    #[test]
    fn property_key_names() {
        assert_eq!(PropertyKey::VendorId.to_string(), "VendorID");
        assert_eq!(PropertyKey::ProductId.to_string(), "ProductID");
    }

    #[test]
    fn apply_hint_passes_unparsed_usage_page() {
        let kept = apply_hint([("/dev/hidraw0", 0, 0)], &UsageFilter::NOTIFIER);
        assert_eq!(kept, vec![0]);
    }

    #[test]
    fn apply_hint_drops_non_matching_page() {
        let entries = [
            ("/dev/hidraw0", 0x0C, 0x01),
            ("/dev/hidraw1", 0x01, 0x10),
            ("/dev/hidraw2", 0x01, 0x06),
        ];
        assert_eq!(apply_hint(entries, &UsageFilter::NOTIFIER), vec![1]);
    }

    #[test]
    fn apply_hint_collapses_duplicate_path() {
        let entries = [
            ("/dev/hidraw0", 0x01, 0x10),
            ("/dev/hidraw0", 0x01, 0x10),
            ("/dev/hidraw0", 0, 0),
        ];
        assert_eq!(apply_hint(entries, &UsageFilter::NOTIFIER), vec![0]);
    }

    #[test]
    fn apply_hint_keeps_later_matching_collection_of_same_path() {
        let entries = [
            ("/dev/hidraw0", 0xFF00, 0x01),
            ("/dev/hidraw0", 0x01, 0x10),
        ];
        assert_eq!(apply_hint(entries, &UsageFilter::NOTIFIER), vec![1]);
    }

    #[test]
    fn apply_hint_preserves_enumeration_order() {
        let entries = [
            ("/dev/hidraw3", 0x01, 0x10),
            ("/dev/hidraw1", 0, 0),
            ("/dev/hidraw2", 0x0C, 0x01),
            ("/dev/hidraw0", 0x01, 0x10),
        ];
        assert_eq!(apply_hint(entries, &UsageFilter::NOTIFIER), vec![0, 1, 3]);
    }

    #[test]
    fn open_devices_opens_each_index_once() {
        let cache = OpenDevices::new();
        let opens = std::cell::Cell::new(0);
        let open = |label: &'static str| -> Result<&'static str> {
            opens.set(opens.get() + 1);
            Ok(label)
        };

        let first = cache.with(0, || open("notifier"), |dev| Ok(*dev)).unwrap();
        let again = cache.with(0, || open("reopened"), |dev| Ok(*dev)).unwrap();
        cache.with(1, || open("second"), |_| Ok(())).unwrap();

        assert_eq!(first, "notifier");
        assert_eq!(again, "notifier");
        assert_eq!(opens.get(), 2);
    }

    #[test]
    fn open_devices_does_not_cache_failed_open() {
        let cache: OpenDevices<u8> = OpenDevices::new();
        let err = cache
            .with(0, || Err(Error::Hid("open: Permission denied".into())), |_| Ok(()))
            .unwrap_err();
        assert!(matches!(err, Error::Hid(_)));

        let value = cache.with(0, || Ok(7), |dev| Ok(*dev)).unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn open_devices_clear_forces_reopen() {
        let cache = OpenDevices::new();
        cache.with(0, || Ok(1u8), |_| Ok(())).unwrap();
        cache.clear();
        let value = cache.with(0, || Ok(2u8), |dev| Ok(*dev)).unwrap();
        assert_eq!(value, 2);
    }
}
