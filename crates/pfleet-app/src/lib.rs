//! pfleet-app - Fleet orchestration for Phone Fleet
//!
//! This crate owns the user's device roster and everything done with it:
//! settings and roster persistence, reconciling the roster against the live
//! bridge state, bulk connect/disconnect, auto-detection of a USB device's
//! network address, and launching mirroring sessions. [`Controller`] is the
//! single entry point used by the binary.

pub mod config;
pub mod controller;
pub mod launcher;
pub mod reconciler;

// Re-export primary types
pub use config::{JsonRosterStore, RosterStore, Settings};
pub use controller::{Controller, Outcome, OutcomeStatus};
pub use launcher::{Session, SessionLauncher};
pub use reconciler::{FleetReconciler, RosterView};
