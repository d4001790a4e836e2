//! Roster persistence (`roster.json`)
//!
//! The roster file is a single JSON record: `{"devices": ["...", ...]}`.
//! A missing or unreadable file is an empty roster, never an error. Saving
//! is the only fallible operation and always reports failure.

use fs2::FileExt;
use pfleet_core::prelude::*;
use pfleet_core::{DeviceId, Roster};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Roster file name inside the fleet home directory
pub const ROSTER_FILENAME: &str = "roster.json";

/// Lock file guarding concurrent writers
const LOCK_FILENAME: &str = ".roster.lock";

/// Durable storage for the roster
#[cfg_attr(test, mockall::automock)]
pub trait RosterStore: Send + Sync {
    /// Load the persisted roster; missing or corrupt state yields an empty roster
    fn load(&self) -> Roster;

    /// Persist the roster, replacing whatever was stored
    fn save(&self, roster: &Roster) -> Result<()>;
}

/// On-disk layout of the roster file.
///
/// Entries stay raw strings here; hand-edited files are validated the same
/// way as command-line input when loaded.
#[derive(Debug, Default, Deserialize, Serialize)]
struct RosterFile {
    #[serde(default)]
    devices: Vec<String>,
}

/// [`RosterStore`] backed by a JSON file
#[derive(Debug, Clone)]
pub struct JsonRosterStore {
    path: PathBuf,
}

impl JsonRosterStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<home>/roster.json`
    pub fn in_dir(home: &Path) -> Self {
        Self::new(home.join(ROSTER_FILENAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    fn persistence_error(&self, action: &str, e: impl std::fmt::Display) -> Error {
        Error::persistence(&self.path, format!("{}: {}", action, e))
    }

    fn write_atomically(&self, content: &str) -> Result<()> {
        let dir = self.dir();
        std::fs::create_dir_all(dir)
            .map_err(|e| self.persistence_error("Failed to create directory", e))?;

        // Exclusive lock across processes; released when `lock` is dropped
        let lock = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(dir.join(LOCK_FILENAME))
            .map_err(|e| self.persistence_error("Failed to open lock file", e))?;
        lock.lock_exclusive()
            .map_err(|e| self.persistence_error("Failed to lock roster", e))?;

        let temp_path = dir.join(format!(".{}.tmp", ROSTER_FILENAME));
        let mut temp = std::fs::File::create(&temp_path)
            .map_err(|e| self.persistence_error("Failed to create temp file", e))?;
        temp.write_all(content.as_bytes())
            .and_then(|_| temp.sync_all())
            .map_err(|e| self.persistence_error("Failed to write temp file", e))?;

        std::fs::rename(&temp_path, &self.path)
            .map_err(|e| self.persistence_error("Failed to replace roster", e))?;

        Ok(())
    }
}

impl RosterStore for JsonRosterStore {
    fn load(&self) -> Roster {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No roster at {:?}, starting empty", self.path);
                return Roster::new();
            }
            Err(e) => {
                warn!("Failed to read {:?}: {}; starting with an empty roster", self.path, e);
                return Roster::new();
            }
        };

        match serde_json::from_str::<RosterFile>(&content) {
            Ok(file) => {
                let ids = file.devices.iter().filter_map(|raw| match DeviceId::parse(raw) {
                    Ok(id) => Some(id),
                    Err(e) => {
                        warn!("Skipping roster entry {:?} in {:?}: {}", raw, self.path, e);
                        None
                    }
                });
                let roster = Roster::from_entries(ids);
                debug!("Loaded {} devices from {:?}", roster.len(), self.path);
                roster
            }
            Err(e) => {
                warn!("Failed to parse {:?}: {}; starting with an empty roster", self.path, e);
                Roster::new()
            }
        }
    }

    fn save(&self, roster: &Roster) -> Result<()> {
        let file = RosterFile {
            devices: roster.iter().map(|id| id.as_str().to_string()).collect(),
        };

        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        file.serialize(&mut serializer)
            .map_err(|e| self.persistence_error("Failed to serialize roster", e))?;
        let content = String::from_utf8_lossy(&buf);

        self.write_atomically(&content)?;
        debug!("Saved {} devices to {:?}", roster.len(), self.path);
        Ok(())
    }
}
