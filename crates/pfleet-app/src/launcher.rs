//! Mirroring session launching
//!
//! One detached mirroring process per device. Sessions are recorded for
//! display but never waited on, and relaunching a device simply starts
//! another session.

use chrono::{DateTime, Local};
use pfleet_bridge::{window_title, MirrorSpawner};
use pfleet_core::prelude::*;
use pfleet_core::{DeviceFailure, DeviceId, Roster};
use serde::Serialize;

/// A launched mirroring process
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub id: DeviceId,
    pub title: String,
    pub pid: Option<u32>,
    pub started_at: DateTime<Local>,
}

/// Launches mirroring sessions through a [`MirrorSpawner`]
pub struct SessionLauncher {
    spawner: Box<dyn MirrorSpawner>,
    sessions: Vec<Session>,
}

impl SessionLauncher {
    pub fn new(spawner: Box<dyn MirrorSpawner>) -> Self {
        Self {
            spawner,
            sessions: Vec::new(),
        }
    }

    /// Launch one device.
    ///
    /// `index` defaults to the device's 1-based roster position. The new
    /// session is recorded and returned.
    pub fn launch(
        &mut self,
        roster: &Roster,
        id: &DeviceId,
        index: Option<usize>,
    ) -> Result<Session> {
        let index = index
            .or_else(|| roster.display_index(id))
            .ok_or_else(|| Error::unknown_device(id.as_str()))?;

        let title = window_title(index, id);
        let spawned = self.spawner.spawn(id, &title)?;
        info!("Launched mirroring for {} ({:?})", title, spawned.pid);

        let session = Session {
            id: id.clone(),
            title,
            pid: spawned.pid,
            started_at: Local::now(),
        };
        self.sessions.push(session.clone());
        Ok(session)
    }

    /// Launch every roster device in order.
    ///
    /// A failed spawn is recorded and the remaining devices are still launched.
    pub fn launch_all(&mut self, roster: &Roster) -> Vec<DeviceFailure> {
        let mut failures = Vec::new();

        for (position, id) in roster.iter().enumerate() {
            if let Err(e) = self.launch(roster, id, Some(position + 1)) {
                warn!("{}", e);
                failures.push(DeviceFailure::new(id.clone(), e.to_string()));
            }
        }

        failures
    }

    /// Sessions launched so far, oldest first
    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pfleet_bridge::test_utils::RecordingSpawner;
    use std::sync::Arc;

    fn launcher(spawner: RecordingSpawner) -> (SessionLauncher, Arc<RecordingSpawner>) {
        let spawner = Arc::new(spawner);
        (
            SessionLauncher::new(Box::new(spawner.clone())),
            spawner,
        )
    }

    fn roster(ids: &[&str]) -> Roster {
        Roster::from_entries(ids.iter().map(|id| DeviceId::from(*id)))
    }

    #[test]
    fn test_launch_uses_roster_position() {
        let (mut launcher, spawner) = launcher(RecordingSpawner::new());

        let session = launcher
            .launch(&roster(&["A", "B"]), &"B".into(), None)
            .unwrap();

        assert_eq!(session.title, "Phone 2 - B");
        assert_eq!(spawner.titles(), vec!["Phone 2 - B"]);
        assert_eq!(launcher.sessions(), &[session]);
    }

    #[test]
    fn test_launch_explicit_index_overrides() {
        let (mut launcher, spawner) = launcher(RecordingSpawner::new());

        launcher
            .launch(&roster(&["A"]), &"10.0.0.9:5555".into(), Some(7))
            .unwrap();

        assert_eq!(spawner.titles(), vec!["Phone 7 - 10.0.0.9:5555"]);
    }

    #[test]
    fn test_launch_unknown_device_without_index() {
        let (mut launcher, spawner) = launcher(RecordingSpawner::new());

        let err = launcher
            .launch(&roster(&["A"]), &"Z".into(), None)
            .unwrap_err();

        assert!(matches!(err, Error::UnknownDevice { .. }));
        assert_eq!(err.to_string(), "Device Z not in list.");
        assert!(spawner.launches().is_empty());
        assert!(launcher.sessions().is_empty());
    }

    #[test]
    fn test_launch_all_in_roster_order() {
        let (mut launcher, spawner) = launcher(RecordingSpawner::new());

        let failures = launcher.launch_all(&roster(&["A", "B", "C"]));

        assert!(failures.is_empty());
        assert_eq!(
            spawner.titles(),
            vec!["Phone 1 - A", "Phone 2 - B", "Phone 3 - C"]
        );
        assert_eq!(launcher.sessions().len(), 3);
    }

    #[test]
    fn test_launch_all_continues_past_failure() {
        let (mut launcher, spawner) = launcher(RecordingSpawner::new().failing_for("B"));

        let failures = launcher.launch_all(&roster(&["A", "B", "C"]));

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].id.as_str(), "B");
        assert_eq!(spawner.titles(), vec!["Phone 1 - A", "Phone 3 - C"]);
    }

    #[test]
    fn test_relaunch_adds_another_session() {
        let (mut launcher, _) = launcher(RecordingSpawner::new());
        let roster = roster(&["A"]);

        launcher.launch(&roster, &"A".into(), None).unwrap();
        launcher.launch(&roster, &"A".into(), None).unwrap();

        let sessions = launcher.sessions();
        assert_eq!(sessions.len(), 2);
        assert_ne!(sessions[0].pid, sessions[1].pid);
    }
}
