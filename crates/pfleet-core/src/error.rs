//! Application error types with rich context

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Application error types organized by layer/domain
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Common/Infrastructure Errors
    // ─────────────────────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // Device Bridge Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Device bridge unavailable: {message}")]
    BridgeUnavailable { message: String },

    #[error("{operation} timed out after {}s", after.as_secs_f32())]
    Timeout {
        operation: String,
        after: Duration,
    },

    #[error("{message}")]
    Rejected { message: String },

    // ─────────────────────────────────────────────────────────────
    // Auto-discovery Errors
    // ─────────────────────────────────────────────────────────────
    #[error("No USB device detected.")]
    NoUsbDevice,

    #[error("Multiple USB devices ({}). Please connect only one.", serials.join(", "))]
    AmbiguousUsbDevice { serials: Vec<String> },

    #[error("Failed to switch {serial} to TCP/IP mode: {reason}")]
    NetworkModeFailed { serial: String, reason: String },

    #[error("Failed to read network interface of {serial}: {reason}")]
    InterfaceQueryFailed { serial: String, reason: String },

    #[error("Could not determine IP address of {serial} on {interface}.")]
    NoIpFound { serial: String, interface: String },

    // ─────────────────────────────────────────────────────────────
    // Roster/Launch Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Device {id} not in list.")]
    UnknownDevice { id: String },

    #[error("Invalid device identifier: {reason}")]
    InvalidDeviceId { reason: String },

    #[error("Failed to launch mirroring for {id}: {reason}")]
    LaunchFailed { id: String, reason: String },

    #[error("Failed to save roster to {}: {message}", path.display())]
    Persistence { path: PathBuf, message: String },

    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

// ─────────────────────────────────────────────────────────────────
// Convenience Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    pub fn bridge_unavailable(message: impl Into<String>) -> Self {
        Self::BridgeUnavailable {
            message: message.into(),
        }
    }

    pub fn timeout(operation: impl Into<String>, after: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            after,
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    pub fn unknown_device(id: impl Into<String>) -> Self {
        Self::UnknownDevice { id: id.into() }
    }

    pub fn invalid_device_id(reason: impl Into<String>) -> Self {
        Self::InvalidDeviceId {
            reason: reason.into(),
        }
    }

    pub fn launch_failed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::LaunchFailed {
            id: id.into(),
            reason: reason.into(),
        }
    }

    pub fn persistence(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Persistence {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Transport-level failures reported by the device bridge
    pub fn is_bridge_failure(&self) -> bool {
        matches!(
            self,
            Error::BridgeUnavailable { .. } | Error::Timeout { .. } | Error::Rejected { .. }
        )
    }
}

// ─────────────────────────────────────────────────────────────────
// Logged context
// ─────────────────────────────────────────────────────────────────

/// Log a failure with a description of what was being attempted, then
/// propagate it unchanged.
///
/// The error's own message is what reaches the user; the context only
/// lands in the log file.
pub trait ResultExt<T> {
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Like [`ResultExt::context`], building the description only on failure
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.with_context(|| context.into())
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!(error = %err, "{}", f());
            err
        })
    }
}
