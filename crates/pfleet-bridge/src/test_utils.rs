//! Test doubles for the bridge and mirroring seams
//!
//! [`FakeBridge`] answers bridge calls from a script and records every call;
//! [`RecordingSpawner`] records mirroring launches instead of starting scrcpy.

use crate::bridge::DeviceBridge;
use crate::devices::{parse_devices_output, BridgeDevice};
use crate::mirror::{MirrorSpawner, SpawnedMirror};
use pfleet_core::prelude::*;
use pfleet_core::DeviceId;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

/// One recorded bridge invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeCall {
    Devices,
    Connect(DeviceId),
    Disconnect(Option<DeviceId>),
    SetNetworkMode(DeviceId, u16),
    Shell(DeviceId, Vec<String>),
    StartServer,
}

/// Scripted reply to `connect`
#[derive(Debug, Clone)]
pub enum ConnectReply {
    Connected,
    AlreadyConnected,
    Rejected(String),
    TimedOut,
    /// Connect successfully after sleeping
    Delayed(Duration),
}

/// Scripted [`DeviceBridge`] that records every call
#[derive(Debug, Default)]
pub struct FakeBridge {
    devices_output: String,
    unavailable: Option<String>,
    connect_replies: HashMap<DeviceId, ConnectReply>,
    tcpip_failure: Option<String>,
    shell_output: String,
    shell_failure: Option<String>,
    start_server_failure: Option<String>,
    calls: Mutex<Vec<BridgeCall>>,
}

impl FakeBridge {
    /// A bridge reporting no devices and accepting every connection
    pub fn new() -> Self {
        Self {
            devices_output: "List of devices attached\n\n".to_string(),
            ..Default::default()
        }
    }

    /// Raw `adb devices` output to return
    pub fn with_devices_output(mut self, output: &str) -> Self {
        self.devices_output = output.to_string();
        self
    }

    /// Report the given devices, all with status `device`
    pub fn with_connected(self, ids: &[&str]) -> Self {
        let mut output = String::from("List of devices attached\n");
        for id in ids {
            output.push_str(&format!("{}\tdevice\n", id));
        }
        self.with_devices_output(&output)
    }

    /// Make `devices` fail as if adb were missing
    pub fn with_unavailable(mut self, message: &str) -> Self {
        self.unavailable = Some(message.to_string());
        self
    }

    pub fn with_connect_reply(mut self, id: &str, reply: ConnectReply) -> Self {
        self.connect_replies.insert(DeviceId::from(id), reply);
        self
    }

    pub fn with_tcpip_failure(mut self, message: &str) -> Self {
        self.tcpip_failure = Some(message.to_string());
        self
    }

    pub fn with_shell_output(mut self, output: &str) -> Self {
        self.shell_output = output.to_string();
        self
    }

    pub fn with_shell_failure(mut self, message: &str) -> Self {
        self.shell_failure = Some(message.to_string());
        self
    }

    pub fn with_start_server_failure(mut self, message: &str) -> Self {
        self.start_server_failure = Some(message.to_string());
        self
    }

    fn record(&self, call: BridgeCall) {
        self.calls
            .lock()
            .expect("FakeBridge call log poisoned")
            .push(call);
    }

    /// Every call made so far, in order
    pub fn calls(&self) -> Vec<BridgeCall> {
        self.calls
            .lock()
            .expect("FakeBridge call log poisoned")
            .clone()
    }

    /// Number of `devices` listings made so far
    pub fn devices_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, BridgeCall::Devices))
            .count()
    }

    /// Devices `connect` was called for, in call order
    pub fn connect_calls(&self) -> Vec<DeviceId> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                BridgeCall::Connect(id) => Some(id),
                _ => None,
            })
            .collect()
    }
}

impl DeviceBridge for FakeBridge {
    async fn devices(&self) -> Result<Vec<BridgeDevice>> {
        self.record(BridgeCall::Devices);
        if let Some(ref message) = self.unavailable {
            return Err(Error::bridge_unavailable(message.clone()));
        }
        Ok(parse_devices_output(&self.devices_output))
    }

    async fn connect(&self, id: &DeviceId) -> Result<String> {
        self.record(BridgeCall::Connect(id.clone()));
        let reply = self
            .connect_replies
            .get(id)
            .cloned()
            .unwrap_or(ConnectReply::Connected);

        match reply {
            ConnectReply::Connected => Ok(format!("connected to {}", id)),
            ConnectReply::AlreadyConnected => Ok(format!("already connected to {}", id)),
            ConnectReply::Rejected(message) => Err(Error::rejected(message)),
            ConnectReply::TimedOut => Err(Error::timeout(
                format!("adb connect {}", id),
                Duration::from_secs(5),
            )),
            ConnectReply::Delayed(delay) => {
                tokio::time::sleep(delay).await;
                Ok(format!("connected to {}", id))
            }
        }
    }

    async fn disconnect(&self, id: Option<&DeviceId>) {
        self.record(BridgeCall::Disconnect(id.cloned()));
    }

    async fn set_network_mode(&self, id: &DeviceId, port: u16) -> Result<()> {
        self.record(BridgeCall::SetNetworkMode(id.clone(), port));
        match self.tcpip_failure {
            Some(ref message) => Err(Error::rejected(message.clone())),
            None => Ok(()),
        }
    }

    async fn shell(&self, id: &DeviceId, argv: &[&str]) -> Result<String> {
        self.record(BridgeCall::Shell(
            id.clone(),
            argv.iter().map(|a| a.to_string()).collect(),
        ));
        match self.shell_failure {
            Some(ref message) => Err(Error::rejected(message.clone())),
            None => Ok(self.shell_output.clone()),
        }
    }

    async fn start_server(&self) -> Result<()> {
        self.record(BridgeCall::StartServer);
        match self.start_server_failure {
            Some(ref message) => Err(Error::bridge_unavailable(message.clone())),
            None => Ok(()),
        }
    }
}

/// [`MirrorSpawner`] that records launches instead of starting processes
#[derive(Debug, Default)]
pub struct RecordingSpawner {
    failing: HashSet<DeviceId>,
    launches: Mutex<Vec<(DeviceId, String)>>,
}

impl RecordingSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make launches for this device fail as if scrcpy could not start
    pub fn failing_for(mut self, id: &str) -> Self {
        self.failing.insert(DeviceId::from(id));
        self
    }

    /// `(device, window title)` for every successful launch, in order
    pub fn launches(&self) -> Vec<(DeviceId, String)> {
        self.launches
            .lock()
            .expect("RecordingSpawner log poisoned")
            .clone()
    }

    pub fn titles(&self) -> Vec<String> {
        self.launches().into_iter().map(|(_, title)| title).collect()
    }
}

impl MirrorSpawner for RecordingSpawner {
    fn spawn(&self, id: &DeviceId, title: &str) -> Result<SpawnedMirror> {
        if self.failing.contains(id) {
            return Err(Error::launch_failed(id.as_str(), "scrcpy exited immediately"));
        }

        let mut launches = self.launches.lock().expect("RecordingSpawner log poisoned");
        launches.push((id.clone(), title.to_string()));
        Ok(SpawnedMirror {
            pid: Some(40_000 + launches.len() as u32),
        })
    }
}
