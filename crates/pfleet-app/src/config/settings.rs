//! Settings file (`config.toml`) and fleet home directory resolution

use pfleet_bridge::{
    MirrorOptions, DEFAULT_COMMAND_TIMEOUT, DEFAULT_CONNECT_TIMEOUT, DEFAULT_TCPIP_PORT,
    DEFAULT_WIFI_INTERFACE,
};
use pfleet_core::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings file name inside the fleet home directory
pub const CONFIG_FILENAME: &str = "config.toml";

/// Environment variable overriding the fleet home directory
pub const HOME_ENV_VAR: &str = "PFLEET_HOME";

/// Directory name under the platform config dir
const APP_DIR_NAME: &str = "phone-fleet";

/// Root of the settings file
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub bridge: BridgeSettings,

    #[serde(default)]
    pub mirror: MirrorSettings,

    #[serde(default)]
    pub discovery: DiscoverySettings,

    #[serde(default)]
    pub watch: WatchSettings,
}

/// Device bridge (adb) settings
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct BridgeSettings {
    /// Path to adb; empty means auto-detect
    #[serde(default)]
    pub adb_path: String,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,

    /// Run `adb start-server` when the controller starts
    #[serde(default = "default_true")]
    pub start_server: bool,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            adb_path: String::new(),
            connect_timeout_secs: default_connect_timeout_secs(),
            command_timeout_secs: default_command_timeout_secs(),
            start_server: true,
        }
    }
}

impl BridgeSettings {
    pub fn adb_override(&self) -> Option<&Path> {
        non_empty_path(&self.adb_path)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs.max(1))
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs.max(1))
    }
}

/// Mirroring tool (scrcpy) settings
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct MirrorSettings {
    /// Path to scrcpy; empty means auto-detect
    #[serde(default)]
    pub scrcpy_path: String,

    #[serde(default)]
    pub turn_screen_on: bool,

    #[serde(default)]
    pub stay_awake: bool,

    /// Longest side of the mirrored frame; 0 means unlimited
    #[serde(default)]
    pub max_size: u32,

    #[serde(default)]
    pub borderless: bool,

    #[serde(default)]
    pub extra_args: Vec<String>,
}

impl MirrorSettings {
    pub fn scrcpy_override(&self) -> Option<&Path> {
        non_empty_path(&self.scrcpy_path)
    }

    pub fn options(&self) -> MirrorOptions {
        MirrorOptions {
            turn_screen_on: self.turn_screen_on,
            stay_awake: self.stay_awake,
            max_size: (self.max_size > 0).then_some(self.max_size),
            borderless: self.borderless,
            extra_args: self.extra_args.clone(),
        }
    }
}

/// Auto-discovery settings
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct DiscoverySettings {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_interface")]
    pub interface: String,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            port: default_port(),
            interface: default_interface(),
        }
    }
}

/// Status polling settings
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct WatchSettings {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

impl WatchSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

fn default_true() -> bool {
    true
}

fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT.as_secs()
}

fn default_command_timeout_secs() -> u64 {
    DEFAULT_COMMAND_TIMEOUT.as_secs()
}

fn default_port() -> u16 {
    DEFAULT_TCPIP_PORT
}

fn default_interface() -> String {
    DEFAULT_WIFI_INTERFACE.to_string()
}

fn default_poll_interval_secs() -> u64 {
    3
}

fn non_empty_path(value: &str) -> Option<&Path> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| Path::new(trimmed))
}

// ─────────────────────────────────────────────────────────────────────────────
// Directory Resolution
// ─────────────────────────────────────────────────────────────────────────────

/// Resolve the directory holding `config.toml` and `roster.json`
///
/// Precedence: explicit override, `$PFLEET_HOME`, platform config dir.
pub fn resolve_fleet_home(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }

    if let Some(home) = std::env::var_os(HOME_ENV_VAR).filter(|v| !v.is_empty()) {
        return PathBuf::from(home);
    }

    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

// ─────────────────────────────────────────────────────────────────────────────
// Settings Loading
// ─────────────────────────────────────────────────────────────────────────────

/// Load settings from `config.toml`
///
/// Returns default settings if the file doesn't exist or can't be parsed.
pub fn load_settings(home: &Path) -> Settings {
    let config_path = home.join(CONFIG_FILENAME);

    if !config_path.exists() {
        debug!("No config file at {:?}, using defaults", config_path);
        return Settings::default();
    }

    match std::fs::read_to_string(&config_path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(settings) => {
                debug!("Loaded settings from {:?}", config_path);
                settings
            }
            Err(e) => {
                warn!("Failed to parse {:?}: {}", config_path, e);
                Settings::default()
            }
        },
        Err(e) => {
            warn!("Failed to read {:?}: {}", config_path, e);
            Settings::default()
        }
    }
}

/// Write a commented default `config.toml` unless one already exists
///
/// Returns true if a new file was written.
pub fn init_config_dir(home: &Path) -> Result<bool> {
    if !home.exists() {
        std::fs::create_dir_all(home)
            .map_err(|e| Error::config(format!("Failed to create {:?}: {}", home, e)))?;
    }

    let config_path = home.join(CONFIG_FILENAME);
    if config_path.exists() {
        return Ok(false);
    }

    std::fs::write(&config_path, DEFAULT_CONFIG)
        .map_err(|e| Error::config(format!("Failed to write config.toml: {}", e)))?;
    info!("Created default settings at {:?}", config_path);
    Ok(true)
}

const DEFAULT_CONFIG: &str = r#"# Phone Fleet Configuration

[bridge]
adb_path = ""               # Empty = auto-detect (bundled scrcpy/, ANDROID_HOME, PATH)
connect_timeout_secs = 5    # Bound for each `adb connect`
command_timeout_secs = 30   # Bound for every other adb call
start_server = true         # Run `adb start-server` on startup

[mirror]
scrcpy_path = ""            # Empty = auto-detect
turn_screen_on = false
stay_awake = false
max_size = 0                # 0 = unlimited
borderless = false
extra_args = []             # Passed to scrcpy verbatim

[discovery]
port = 5555                 # Port used by `adb tcpip` during auto-detect
interface = "wlan0"         # Interface whose IPv4 address becomes the identifier

[watch]
poll_interval_secs = 3
"#;
