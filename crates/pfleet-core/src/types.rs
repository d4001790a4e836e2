//! Domain types for the device roster and its reconciled view

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque device identifier as understood by the device bridge.
///
/// Either `host:port` for devices reachable over TCP/IP, or a USB serial.
/// Compared case-sensitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    /// Parse user input into an identifier, trimming surrounding whitespace
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(Error::invalid_device_id("identifier is empty"));
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(Error::invalid_device_id(format!(
                "'{}' contains whitespace",
                trimmed
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Build an identifier for a device reachable at `address:port`
    pub fn network(address: &str, port: u16) -> Self {
        Self(format!("{}:{}", address, port))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this identifier addresses the device over TCP/IP (`host:port`)
    pub fn is_network(&self) -> bool {
        self.0.contains(':')
    }

    /// Whether this identifier is a USB serial
    pub fn is_usb(&self) -> bool {
        !self.is_network()
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DeviceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DeviceId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for DeviceId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// The user's ordered, duplicate-free list of devices.
///
/// Insertion order drives display indices and mirroring window titles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    devices: Vec<DeviceId>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a roster from persisted entries, dropping later duplicates
    pub fn from_entries(entries: impl IntoIterator<Item = DeviceId>) -> Self {
        let mut roster = Self::new();
        for id in entries {
            roster.add(id);
        }
        roster
    }

    /// Append a device. Returns false if it was already present.
    pub fn add(&mut self, id: DeviceId) -> bool {
        if self.contains(&id) {
            return false;
        }
        self.devices.push(id);
        true
    }

    /// Remove a device. Returns its former 0-based position if it was present.
    pub fn remove(&mut self, id: &DeviceId) -> Option<usize> {
        let position = self.devices.iter().position(|d| d == id)?;
        self.devices.remove(position);
        Some(position)
    }

    /// Put a device back at a given position (used to undo a removal)
    pub fn insert(&mut self, position: usize, id: DeviceId) {
        if !self.contains(&id) {
            let position = position.min(self.devices.len());
            self.devices.insert(position, id);
        }
    }

    pub fn contains(&self, id: &DeviceId) -> bool {
        self.devices.contains(id)
    }

    /// 1-based display index of a device
    pub fn display_index(&self, id: &DeviceId) -> Option<usize> {
        self.devices.iter().position(|d| d == id).map(|i| i + 1)
    }

    pub fn devices(&self) -> &[DeviceId] {
        &self.devices
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeviceId> {
        self.devices.iter()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

impl<'a> IntoIterator for &'a Roster {
    type Item = &'a DeviceId;
    type IntoIter = std::slice::Iter<'a, DeviceId>;

    fn into_iter(self) -> Self::IntoIter {
        self.devices.iter()
    }
}

/// One row of the reconciled roster view. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceViewEntry {
    /// 1-based roster position
    pub index: usize,
    pub id: DeviceId,
    pub connected: bool,
}

impl DeviceViewEntry {
    pub fn new(index: usize, id: DeviceId, connected: bool) -> Self {
        Self {
            index,
            id,
            connected,
        }
    }

    pub fn status_icon(&self) -> &'static str {
        if self.connected {
            "✅"
        } else {
            "❌"
        }
    }
}

/// Outcome of a single `connect` call against the bridge
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectResult {
    pub ok: bool,
    /// Raw bridge output on success or failure, for display
    pub message: String,
}

impl ConnectResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

impl From<Result<String>> for ConnectResult {
    fn from(result: Result<String>) -> Self {
        match result {
            Ok(message) => Self::success(message),
            Err(Error::Timeout { .. }) => Self::failure("Connection timed out"),
            Err(e) => Self::failure(e.to_string()),
        }
    }
}

/// A per-device failure inside a bulk operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceFailure {
    pub id: DeviceId,
    pub message: String,
}

impl DeviceFailure {
    pub fn new(id: DeviceId, message: impl Into<String>) -> Self {
        Self {
            id,
            message: message.into(),
        }
    }
}

impl fmt::Display for DeviceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.id, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn ids(roster: &Roster) -> Vec<&str> {
        roster.iter().map(DeviceId::as_str).collect()
    }

    #[test]
    fn test_device_id_parse_trims() {
        let id = DeviceId::parse("  192.168.1.20:5555 \n").unwrap();
        assert_eq!(id.as_str(), "192.168.1.20:5555");
    }

    #[test]
    fn test_device_id_parse_rejects_empty() {
        assert!(matches!(
            DeviceId::parse("   "),
            Err(Error::InvalidDeviceId { .. })
        ));
    }

    #[test]
    fn test_device_id_parse_rejects_inner_whitespace() {
        assert!(DeviceId::parse("ABC 123").is_err());
    }

    #[test]
    fn test_device_id_transport() {
        assert!(DeviceId::from("10.0.0.5:5555").is_network());
        assert!(DeviceId::from("R58M123ABC").is_usb());
    }

    #[test]
    fn test_device_id_network_constructor() {
        assert_eq!(
            DeviceId::network("192.168.1.42", 5555).as_str(),
            "192.168.1.42:5555"
        );
    }

    #[test]
    fn test_device_id_is_case_sensitive() {
        assert_ne!(DeviceId::from("abc123"), DeviceId::from("ABC123"));
    }

    #[test]
    fn test_roster_add_rejects_duplicates() {
        let mut roster = Roster::new();
        assert!(roster.add("A".into()));
        assert!(roster.add("B".into()));
        assert!(!roster.add("A".into()));
        assert_eq!(ids(&roster), vec!["A", "B"]);
    }

    #[test]
    fn test_roster_from_entries_dedups_in_order() {
        let roster = Roster::from_entries(["B", "A", "B", "C"].map(DeviceId::from));
        assert_eq!(ids(&roster), vec!["B", "A", "C"]);
    }

    #[test]
    fn test_roster_remove_and_reinsert() {
        let mut roster = Roster::from_entries(["A", "B", "C"].map(DeviceId::from));
        let position = roster.remove(&"B".into());
        assert_eq!(position, Some(1));
        assert_eq!(ids(&roster), vec!["A", "C"]);

        roster.insert(1, "B".into());
        assert_eq!(ids(&roster), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_roster_remove_missing() {
        let mut roster = Roster::from_entries(["A"].map(DeviceId::from));
        assert_eq!(roster.remove(&"Z".into()), None);
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn test_roster_display_index_is_one_based() {
        let roster = Roster::from_entries(["A", "B"].map(DeviceId::from));
        assert_eq!(roster.display_index(&"A".into()), Some(1));
        assert_eq!(roster.display_index(&"B".into()), Some(2));
        assert_eq!(roster.display_index(&"C".into()), None);
    }

    #[test]
    fn test_connect_result_from_timeout() {
        let result: ConnectResult =
            Err(Error::timeout("adb connect A", Duration::from_secs(5))).into();
        assert!(!result.ok);
        assert_eq!(result.message, "Connection timed out");
    }

    #[test]
    fn test_connect_result_from_rejection_keeps_message() {
        let result: ConnectResult = Err(Error::rejected("cannot connect to A")).into();
        assert!(!result.ok);
        assert_eq!(result.message, "cannot connect to A");
    }

    #[test]
    fn test_device_failure_display() {
        let failure = DeviceFailure::new("10.0.0.9:5555".into(), "Connection timed out");
        assert_eq!(failure.to_string(), "10.0.0.9:5555: Connection timed out");
    }

    #[test]
    fn test_view_entry_serializes_flat() {
        let entry = DeviceViewEntry::new(1, "A".into(), true);
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(json, r#"{"index":1,"id":"A","connected":true}"#);
    }
}
