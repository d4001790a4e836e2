//! Fleet reconciliation: roster vs. live bridge state
//!
//! [`FleetReconciler`] owns the device bridge and answers the questions the
//! controller asks of it: which roster devices are connected right now,
//! connect/disconnect them, and derive a network address for a USB device.

use futures_util::future::join_all;
use pfleet_bridge::{
    interface_query_argv, list_devices, parse_inet_address, usb_candidates, DeviceBridge,
    LiveReport, DEFAULT_TCPIP_PORT, DEFAULT_WIFI_INTERFACE,
};
use pfleet_core::prelude::*;
use pfleet_core::{ConnectResult, DeviceFailure, DeviceId, DeviceViewEntry, Roster};

/// Roster joined with one live report
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterView {
    /// One entry per roster device, in roster order
    pub entries: Vec<DeviceViewEntry>,

    /// Present when the bridge could not be queried
    pub warning: Option<String>,
}

impl RosterView {
    /// Join a roster with a live report
    pub fn build(roster: &Roster, report: &LiveReport) -> Self {
        let entries = roster
            .iter()
            .enumerate()
            .map(|(i, id)| DeviceViewEntry::new(i + 1, id.clone(), report.is_connected(id)))
            .collect();

        Self {
            entries,
            warning: report.warning.clone(),
        }
    }

    pub fn connected_count(&self) -> usize {
        self.entries.iter().filter(|e| e.connected).count()
    }
}

/// Reconciles the roster against the device bridge
pub struct FleetReconciler<B> {
    bridge: B,
    port: u16,
    interface: String,
}

impl<B: DeviceBridge> FleetReconciler<B> {
    pub fn new(bridge: B) -> Self {
        Self {
            bridge,
            port: DEFAULT_TCPIP_PORT,
            interface: DEFAULT_WIFI_INTERFACE.to_string(),
        }
    }

    /// Port and interface used by [`auto_detect`](Self::auto_detect)
    pub fn with_discovery(mut self, port: u16, interface: impl Into<String>) -> Self {
        self.port = port;
        self.interface = interface.into();
        self
    }

    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    /// Fresh live report (fail-open)
    pub async fn live_report(&self) -> LiveReport {
        list_devices(&self.bridge).await
    }

    /// Build the view of `roster` from exactly one bridge listing
    pub async fn build_view(&self, roster: &Roster) -> RosterView {
        let report = self.live_report().await;
        RosterView::build(roster, &report)
    }

    /// Connect every roster device concurrently.
    ///
    /// Returns the failures in roster order; empty means every device connected.
    pub async fn connect_all(&self, roster: &Roster) -> Vec<DeviceFailure> {
        let attempts = roster.iter().map(|id| async move {
            let result = self.connect_one(id).await;
            (id, result)
        });

        let results = join_all(attempts).await;

        let failures: Vec<DeviceFailure> = results
            .into_iter()
            .filter(|(_, result)| !result.ok)
            .map(|(id, result)| DeviceFailure::new(id.clone(), result.message))
            .collect();

        info!(
            "Connected {}/{} devices",
            roster.len() - failures.len(),
            roster.len()
        );
        failures
    }

    pub async fn connect_one(&self, id: &DeviceId) -> ConnectResult {
        let result = ConnectResult::from(self.bridge.connect(id).await);
        if result.ok {
            debug!("Connect {}: {}", id, result.message);
        } else {
            warn!("Connect {} failed: {}", id, result.message);
        }
        result
    }

    pub async fn disconnect_all(&self) {
        self.bridge.disconnect(None).await;
    }

    pub async fn disconnect_one(&self, id: &DeviceId) {
        self.bridge.disconnect(Some(id)).await;
    }

    /// Switch the single USB device to TCP/IP and derive its `address:port`.
    ///
    /// Unlike [`live_report`](Self::live_report), a bridge failure here is an error.
    pub async fn auto_detect(&self) -> Result<DeviceId> {
        let devices = self.bridge.devices().await?;
        let candidates = usb_candidates(&devices);

        let serial = match candidates.as_slice() {
            [] => return Err(Error::NoUsbDevice),
            [single] => single.id.clone(),
            many => {
                return Err(Error::AmbiguousUsbDevice {
                    serials: many.iter().map(|d| d.id.to_string()).collect(),
                })
            }
        };
        info!("Auto-detecting address of USB device {}", serial);

        self.bridge
            .set_network_mode(&serial, self.port)
            .await
            .map_err(|e| Error::NetworkModeFailed {
                serial: serial.to_string(),
                reason: e.to_string(),
            })?;

        let output = self
            .bridge
            .shell(&serial, &interface_query_argv(&self.interface))
            .await
            .map_err(|e| Error::InterfaceQueryFailed {
                serial: serial.to_string(),
                reason: e.to_string(),
            })?;

        let address = parse_inet_address(&output).ok_or_else(|| Error::NoIpFound {
            serial: serial.to_string(),
            interface: self.interface.clone(),
        })?;

        let id = DeviceId::network(&address.to_string(), self.port);
        info!("USB device {} reachable at {}", serial, id);
        Ok(id)
    }
}
