//! Device listing via `adb devices`

use crate::bridge::DeviceBridge;
use pfleet_core::prelude::*;
use pfleet_core::DeviceId;
use serde::Serialize;
use std::time::{Duration, Instant};

/// Header line printed by `adb devices` before the device table
const DEVICES_HEADER: &str = "List of devices attached";

/// Connection state reported by the bridge for one device
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    /// Connected and authorized; the only usable state
    Device,
    Offline,
    Unauthorized,
    NoPermissions,
    Other(String),
}

impl DeviceStatus {
    fn parse(field: &str) -> Self {
        match field {
            "device" => Self::Device,
            "offline" => Self::Offline,
            "unauthorized" => Self::Unauthorized,
            "no" | "no permissions" => Self::NoPermissions,
            other => Self::Other(other.to_string()),
        }
    }
}

/// One row of `adb devices` output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BridgeDevice {
    pub id: DeviceId,
    pub status: DeviceStatus,
}

impl BridgeDevice {
    pub fn is_ready(&self) -> bool {
        self.status == DeviceStatus::Device
    }

    /// Ready and attached over USB rather than TCP/IP
    pub fn is_usb_ready(&self) -> bool {
        self.is_ready() && self.id.is_usb()
    }
}

/// Point-in-time set of devices the bridge reports as usable.
///
/// Never cached: each reconciliation fetches a fresh report.
#[derive(Debug, Clone, Default)]
pub struct LiveReport {
    /// Devices with status `device`, in bridge output order
    pub connected: Vec<DeviceId>,

    /// Set when the bridge could not be queried and the report is empty because of it
    pub warning: Option<String>,

    /// Time taken by the bridge call
    pub elapsed: Duration,
}

impl LiveReport {
    pub fn is_connected(&self, id: &DeviceId) -> bool {
        self.connected.contains(id)
    }

    pub fn is_degraded(&self) -> bool {
        self.warning.is_some()
    }
}

/// List connected devices, failing open.
///
/// A bridge failure yields an empty report carrying a warning instead of an
/// error, so that polling callers treat it as "nothing connected".
pub async fn list_devices<B: DeviceBridge>(bridge: &B) -> LiveReport {
    let start = Instant::now();

    match bridge.devices().await {
        Ok(devices) => {
            let connected: Vec<DeviceId> = devices
                .into_iter()
                .filter(BridgeDevice::is_ready)
                .map(|d| d.id)
                .collect();
            let elapsed = start.elapsed();
            debug!("{} devices connected ({:?})", connected.len(), elapsed);
            LiveReport {
                connected,
                warning: None,
                elapsed,
            }
        }
        Err(e) => {
            warn!("Device listing failed, treating as no connected devices: {}", e);
            LiveReport {
                connected: Vec::new(),
                warning: Some(e.to_string()),
                elapsed: start.elapsed(),
            }
        }
    }
}

/// Parse the output of `adb devices` (optionally `-l`)
///
/// Lines before the header (daemon start-up notices) and blank lines are skipped.
pub fn parse_devices_output(output: &str) -> Vec<BridgeDevice> {
    let body = match output.find(DEVICES_HEADER) {
        Some(pos) => &output[pos + DEVICES_HEADER.len()..],
        None => output,
    };

    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('*'))
        .filter_map(parse_device_line)
        .collect()
}

fn parse_device_line(line: &str) -> Option<BridgeDevice> {
    let mut fields = line.split('\t');
    let (id, status) = match (fields.next(), fields.next()) {
        (Some(id), Some(status)) => (id.trim(), status.trim()),
        // `adb devices -l` pads with spaces instead of a tab
        _ => {
            let mut words = line.split_whitespace();
            (words.next()?, words.next()?)
        }
    };

    if id.is_empty() {
        return None;
    }

    // `-l` appends `product:... model:...` after the status
    let status = status.split_whitespace().next().unwrap_or(status);

    Some(BridgeDevice {
        id: DeviceId::from(id),
        status: DeviceStatus::parse(status),
    })
}

/// USB-attached devices eligible for auto-discovery
pub fn usb_candidates(devices: &[BridgeDevice]) -> Vec<&BridgeDevice> {
    devices.iter().filter(|d| d.is_usb_ready()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FakeBridge;

    #[test]
    fn test_parse_devices_output() {
        let output = "List of devices attached\n\
                      R58M123ABC\tdevice\n\
                      192.168.1.20:5555\toffline\n\
                      emulator-5554\tunauthorized\n\n";

        let devices = parse_devices_output(output);

        assert_eq!(devices.len(), 3);
        assert_eq!(devices[0].id.as_str(), "R58M123ABC");
        assert_eq!(devices[0].status, DeviceStatus::Device);
        assert_eq!(devices[1].status, DeviceStatus::Offline);
        assert_eq!(devices[2].status, DeviceStatus::Unauthorized);
    }

    #[test]
    fn test_parse_devices_skips_daemon_notices() {
        let output = "* daemon not running; starting now at tcp:5037\n\
                      * daemon started successfully\n\
                      List of devices attached\n\
                      ABC123\tdevice\n";

        let devices = parse_devices_output(output);

        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].id.as_str(), "ABC123");
    }

    #[test]
    fn test_parse_devices_long_format() {
        let output = "List of devices attached\n\
                      ABC123                 device usb:1-1 product:beyond1 model:SM_G973F transport_id:2\n\
                      10.0.0.5:5555          device product:beyond1 model:SM_G973F transport_id:3\n";

        let devices = parse_devices_output(output);

        assert_eq!(devices.len(), 2);
        assert!(devices.iter().all(BridgeDevice::is_ready));
        assert_eq!(devices[1].id.as_str(), "10.0.0.5:5555");
    }

    #[test]
    fn test_parse_devices_empty() {
        assert!(parse_devices_output("List of devices attached\n\n").is_empty());
        assert!(parse_devices_output("").is_empty());
    }

    #[test]
    fn test_parse_devices_no_permissions() {
        let output = "List of devices attached\n\
                      ABC123\tno permissions (user in plugdev group; are your udev rules wrong?)\n";

        let devices = parse_devices_output(output);
        assert_eq!(devices[0].status, DeviceStatus::NoPermissions);
        assert!(!devices[0].is_ready());
    }

    #[test]
    fn test_usb_candidates_excludes_network_devices() {
        let output = "List of devices attached\nABC123\tdevice\n10.0.0.5:5555\tdevice\n";
        let devices = parse_devices_output(output);

        let usb = usb_candidates(&devices);

        assert_eq!(usb.len(), 1);
        assert_eq!(usb[0].id.as_str(), "ABC123");
    }

    #[test]
    fn test_usb_candidates_excludes_not_ready() {
        let output = "List of devices attached\nABC123\tunauthorized\nDEF456\toffline\n";
        let devices = parse_devices_output(output);
        assert!(usb_candidates(&devices).is_empty());
    }

    #[tokio::test]
    async fn test_list_devices_keeps_only_ready() {
        let bridge = FakeBridge::new().with_devices_output(
            "List of devices attached\nA\tdevice\nB\toffline\nC\tdevice\n",
        );

        let report = list_devices(&bridge).await;

        assert_eq!(report.connected, vec![DeviceId::from("A"), DeviceId::from("C")]);
        assert!(!report.is_degraded());
        assert!(report.is_connected(&"A".into()));
        assert!(!report.is_connected(&"B".into()));
    }

    #[tokio::test]
    async fn test_list_devices_fails_open() {
        let bridge = FakeBridge::new().with_unavailable("adb not found");

        let report = list_devices(&bridge).await;

        assert!(report.connected.is_empty());
        assert!(report.is_degraded());
        assert!(report.warning.unwrap().contains("adb not found"));
    }
}
