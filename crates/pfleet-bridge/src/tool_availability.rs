//! Locating the external `adb` and `scrcpy` executables
//!
//! Resolution order for each tool: explicitly configured path, the `scrcpy/`
//! bundle next to the running executable, Android SDK environment variables
//! (adb only), `PATH`, and finally the bare program name.

use std::env::consts::EXE_SUFFIX;
use std::path::{Path, PathBuf};

/// Directory name of the bundled scrcpy distribution (ships its own adb)
const BUNDLE_DIR: &str = "scrcpy";

/// Resolved locations of the external tools
#[derive(Debug, Clone)]
pub struct ToolAvailability {
    pub adb_path: PathBuf,

    /// Whether `adb_path` points at an existing file (or was found in PATH)
    pub adb_found: bool,

    pub scrcpy_path: PathBuf,

    pub scrcpy_found: bool,
}

impl ToolAvailability {
    /// Resolve tool paths (run once at startup)
    pub fn resolve(adb_override: Option<&Path>, scrcpy_override: Option<&Path>) -> Self {
        let (adb_path, adb_found) = Self::resolve_tool("adb", adb_override, Self::adb_sdk_paths());
        let (scrcpy_path, scrcpy_found) = Self::resolve_tool("scrcpy", scrcpy_override, Vec::new());

        tracing::debug!(
            "Resolved tools: adb={} (found: {}), scrcpy={} (found: {})",
            adb_path.display(),
            adb_found,
            scrcpy_path.display(),
            scrcpy_found
        );

        Self {
            adb_path,
            adb_found,
            scrcpy_path,
            scrcpy_found,
        }
    }

    fn resolve_tool(
        name: &str,
        configured: Option<&Path>,
        sdk_paths: Vec<PathBuf>,
    ) -> (PathBuf, bool) {
        if let Some(path) = configured {
            return (path.to_path_buf(), path.is_file());
        }

        let file_name = format!("{}{}", name, EXE_SUFFIX);

        let bundled = Self::bundle_dir().map(|dir| dir.join(&file_name));
        let candidates = bundled.into_iter().chain(sdk_paths);
        for candidate in candidates {
            if candidate.is_file() {
                return (candidate, true);
            }
        }

        match which::which(name) {
            Ok(path) => (path, true),
            Err(e) => {
                tracing::debug!("{} not found in PATH: {}", name, e);
                (PathBuf::from(name), false)
            }
        }
    }

    /// `scrcpy/` directory next to the running executable
    fn bundle_dir() -> Option<PathBuf> {
        let exe = std::env::current_exe().ok()?;
        let exe = dunce::canonicalize(&exe).unwrap_or(exe);
        Some(exe.parent()?.join(BUNDLE_DIR))
    }

    /// adb locations inside an Android SDK
    fn adb_sdk_paths() -> Vec<PathBuf> {
        let file_name = format!("adb{}", EXE_SUFFIX);

        ["ANDROID_HOME", "ANDROID_SDK_ROOT"]
            .iter()
            .filter_map(|var| std::env::var_os(var))
            .map(|root| PathBuf::from(root).join("platform-tools").join(&file_name))
            .collect()
    }

    /// Get user-friendly message for a missing adb
    pub fn adb_unavailable_message(&self) -> Option<&'static str> {
        if self.adb_found {
            None
        } else {
            Some("adb not found. Install Android platform-tools, set ANDROID_HOME, or set bridge.adb_path.")
        }
    }

    /// Get user-friendly message for a missing scrcpy
    pub fn scrcpy_unavailable_message(&self) -> Option<&'static str> {
        if self.scrcpy_found {
            None
        } else {
            Some("scrcpy not found. Install scrcpy or set mirror.scrcpy_path.")
        }
    }
}
