//! Configuration and persisted state for Phone Fleet
//!
//! Both files live in the fleet home directory:
//! - `config.toml` - Settings (tool paths, timeouts, mirroring options)
//! - `roster.json` - The user's device roster

pub mod roster;
pub mod settings;

#[cfg(test)]
pub use roster::MockRosterStore;
pub use roster::{JsonRosterStore, RosterStore, ROSTER_FILENAME};
pub use settings::{
    init_config_dir, load_settings, resolve_fleet_home, BridgeSettings,
    DiscoverySettings, MirrorSettings, Settings, WatchSettings, CONFIG_FILENAME, HOME_ENV_VAR,
};
