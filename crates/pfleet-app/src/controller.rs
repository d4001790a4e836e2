//! Controller: the single entry point for fleet operations
//!
//! Owns the in-memory roster, its store, the reconciler and the launcher.
//! Every operation returns an [`Outcome`] carrying a freshly reconciled view
//! of the roster, so callers never render stale connection state.

use crate::config::RosterStore;
use crate::launcher::{Session, SessionLauncher};
use crate::reconciler::{FleetReconciler, RosterView};
use pfleet_bridge::{DeviceBridge, MirrorSpawner};
use pfleet_core::prelude::*;
use pfleet_core::{DeviceFailure, DeviceId, DeviceViewEntry, Roster};
use serde::Serialize;

/// How an operation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Succeeded,
    /// Nothing to do (duplicate add, absent remove)
    Unchanged,
    Failed,
}

/// Result of one controller operation, ready for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub status: OutcomeStatus,
    pub message: String,

    /// Per-device failures of a bulk operation, in roster order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<DeviceFailure>,

    /// Roster view reconciled after the operation
    pub view: Vec<DeviceViewEntry>,

    /// Set when the bridge could not be queried for the view
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bridge_warning: Option<String>,
}

impl Outcome {
    fn new(status: OutcomeStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            failures: Vec::new(),
            view: Vec::new(),
            bridge_warning: None,
        }
    }

    pub fn succeeded(message: impl Into<String>) -> Self {
        Self::new(OutcomeStatus::Succeeded, message)
    }

    pub fn unchanged(message: impl Into<String>) -> Self {
        Self::new(OutcomeStatus::Unchanged, message)
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(OutcomeStatus::Failed, message)
    }

    fn with_failures(mut self, failures: Vec<DeviceFailure>) -> Self {
        self.failures = failures;
        self
    }

    fn with_view(mut self, view: RosterView) -> Self {
        self.view = view.entries;
        self.bridge_warning = view.warning;
        self
    }

    pub fn is_failure(&self) -> bool {
        self.status == OutcomeStatus::Failed
    }
}

/// Fleet facade over a device bridge
pub struct Controller<B> {
    roster: Roster,
    store: Box<dyn RosterStore>,
    reconciler: FleetReconciler<B>,
    launcher: SessionLauncher,
}

impl<B: DeviceBridge> Controller<B> {
    /// Build a controller, loading the roster from `store`
    pub fn new(bridge: B, store: Box<dyn RosterStore>, spawner: Box<dyn MirrorSpawner>) -> Self {
        let roster = store.load();
        info!("Controller started with {} devices", roster.len());

        Self {
            roster,
            store,
            reconciler: FleetReconciler::new(bridge),
            launcher: SessionLauncher::new(spawner),
        }
    }

    /// Port and interface used for auto-detection
    pub fn with_discovery(mut self, port: u16, interface: impl Into<String>) -> Self {
        self.reconciler = self.reconciler.with_discovery(port, interface);
        self
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn sessions(&self) -> &[Session] {
        self.launcher.sessions()
    }

    pub fn bridge(&self) -> &B {
        self.reconciler.bridge()
    }

    async fn finish(&self, outcome: Outcome) -> Outcome {
        let view = self.reconciler.build_view(&self.roster).await;
        outcome.with_view(view)
    }

    /// Start the bridge's background server. Failure is reported, never fatal.
    ///
    /// This is a startup step rather than a roster operation, so the outcome
    /// carries no view.
    pub async fn start_bridge_server(&self) -> Outcome {
        match self.reconciler.bridge().start_server().await {
            Ok(()) => Outcome::succeeded("Bridge server running."),
            Err(e) => {
                warn!("Failed to start bridge server: {}", e);
                Outcome::failed(format!("Failed to start bridge server: {}", e))
            }
        }
    }

    pub async fn list_roster_view(&self) -> Outcome {
        let view = self.reconciler.build_view(&self.roster).await;
        let message = format!(
            "{}/{} devices connected",
            view.connected_count(),
            view.entries.len()
        );
        Outcome::succeeded(message).with_view(view)
    }

    /// Add a device to the roster and persist it
    pub async fn add_device(&mut self, input: &str) -> Outcome {
        let outcome = match DeviceId::parse(input) {
            Ok(id) => self.add_and_persist(id, |id| format!("Added {}", id)),
            Err(e) => Outcome::failed(e.to_string()),
        };
        self.finish(outcome).await
    }

    fn add_and_persist(
        &mut self,
        id: DeviceId,
        success: impl FnOnce(&DeviceId) -> String,
    ) -> Outcome {
        if !self.roster.add(id.clone()) {
            return Outcome::unchanged(format!("Already exists: {}", id));
        }

        match self.store.save(&self.roster) {
            Ok(()) => {
                info!("Added {} to roster", id);
                Outcome::succeeded(success(&id))
            }
            Err(e) => {
                error!("{}", e);
                self.roster.remove(&id);
                Outcome::failed(e.to_string())
            }
        }
    }

    /// Remove a device from the roster and persist the change
    pub async fn remove_device(&mut self, input: &str) -> Outcome {
        let outcome = match DeviceId::parse(input) {
            Ok(id) => self.remove_and_persist(id),
            Err(e) => Outcome::failed(e.to_string()),
        };
        self.finish(outcome).await
    }

    fn remove_and_persist(&mut self, id: DeviceId) -> Outcome {
        let Some(position) = self.roster.remove(&id) else {
            return Outcome::unchanged(Error::unknown_device(id.as_str()).to_string());
        };

        match self.store.save(&self.roster) {
            Ok(()) => {
                info!("Removed {} from roster", id);
                Outcome::succeeded(format!("Removed {}", id))
            }
            Err(e) => {
                error!("{}", e);
                self.roster.insert(position, id);
                Outcome::failed(e.to_string())
            }
        }
    }

    /// Switch the single USB device to TCP/IP and add its network address
    pub async fn auto_detect_and_add(&mut self) -> Outcome {
        let outcome = match self.reconciler.auto_detect().await {
            Ok(id) => self.add_and_persist(id, |id| format!("Auto-detected and saved: {}", id)),
            Err(e) => {
                if e.is_bridge_failure() {
                    warn!("Auto-detection aborted by bridge failure: {}", e);
                } else {
                    info!("Auto-detection failed: {}", e);
                }
                Outcome::failed(e.to_string())
            }
        };
        self.finish(outcome).await
    }

    pub async fn connect_all(&self) -> Outcome {
        let snapshot = self.roster.clone();
        let failures = self.reconciler.connect_all(&snapshot).await;

        let outcome = if failures.is_empty() {
            Outcome::succeeded("All devices connected successfully.")
        } else {
            Outcome::failed("Some connections failed.").with_failures(failures)
        };
        self.finish(outcome).await
    }

    /// Connect one device, whether or not it is in the roster
    pub async fn connect_one(&self, input: &str) -> Outcome {
        let outcome = match DeviceId::parse(input) {
            Ok(id) => {
                let result = self.reconciler.connect_one(&id).await;
                if result.ok {
                    Outcome::succeeded(format!("Connected to {}", id))
                } else {
                    Outcome::failed(format!("Failed to connect to {}: {}", id, result.message))
                }
            }
            Err(e) => Outcome::failed(e.to_string()),
        };
        self.finish(outcome).await
    }

    pub async fn disconnect_all(&self) -> Outcome {
        self.reconciler.disconnect_all().await;
        self.finish(Outcome::succeeded("Disconnected all devices.")).await
    }

    pub async fn disconnect_one(&self, input: &str) -> Outcome {
        let outcome = match DeviceId::parse(input) {
            Ok(id) => {
                self.reconciler.disconnect_one(&id).await;
                Outcome::succeeded(format!("Disconnected {}", id))
            }
            Err(e) => Outcome::failed(e.to_string()),
        };
        self.finish(outcome).await
    }

    pub async fn launch_all(&mut self) -> Outcome {
        let snapshot = self.roster.clone();
        let failures = self.launcher.launch_all(&snapshot);

        let outcome = if failures.is_empty() {
            Outcome::succeeded("Launched screens for all devices.")
        } else {
            Outcome::failed("Some screens failed to launch.").with_failures(failures)
        };
        self.finish(outcome).await
    }

    /// Launch one device; `index` defaults to its roster position
    pub async fn launch_one(&mut self, input: &str, index: Option<usize>) -> Outcome {
        let launched = DeviceId::parse(input)
            .and_then(|id| self.launcher.launch(&self.roster, &id, index));
        let outcome = match launched {
            Ok(session) => Outcome::succeeded(format!("Launched screen for {}", session.id)),
            Err(e) => Outcome::failed(e.to_string()),
        };
        self.finish(outcome).await
    }
}
