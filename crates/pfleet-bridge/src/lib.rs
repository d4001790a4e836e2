//! # pfleet-bridge - External Process Management
//!
//! Wraps the two external executables Phone Fleet drives: the `adb` device
//! bridge and the `scrcpy` mirroring tool. Everything that spawns a process,
//! bounds it with a timeout, or parses its textual output lives here.
//!
//! Depends on [`pfleet_core`] for domain types and error handling.
//!
//! ## Public API
//!
//! ### Device Bridge
//! - [`DeviceBridge`] - Async, `Send` interface to the bridge (`LocalDeviceBridge` is the non-`Send` form)
//! - [`AdbBridge`] - Implementation that runs `adb` per call
//! - [`classify_connect_output()`] - Decide success of `adb connect` from its text
//!
//! ### Device Listing
//! - [`list_devices()`] - Fail-open listing producing a [`LiveReport`]
//! - [`parse_devices_output()`] - Parse `adb devices` output into [`BridgeDevice`]s
//! - [`usb_candidates()`] - Ready devices attached over USB
//!
//! ### Network Discovery
//! - [`parse_inet_address()`] - First IPv4 address in interface configuration output
//! - [`interface_query_argv()`] - Remote command that prints an interface's configuration
//!
//! ### Mirroring
//! - [`MirrorSpawner`] - Starts one detached mirroring process
//! - [`ScrcpySpawner`] - Implementation that runs `scrcpy`
//! - [`window_title()`] - `"Phone {index} - {id}"` window label
//!
//! ### Tool Discovery
//! - [`ToolAvailability`] - Resolved `adb` / `scrcpy` locations

pub mod bridge;
pub mod devices;
pub mod mirror;
pub mod network;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_utils;
pub mod tool_availability;

// Public API re-exports
pub use bridge::{
    classify_connect_output, AdbBridge, DeviceBridge, LocalDeviceBridge, DEFAULT_COMMAND_TIMEOUT,
    DEFAULT_CONNECT_TIMEOUT,
};
pub use devices::{
    list_devices, parse_devices_output, usb_candidates, BridgeDevice, DeviceStatus, LiveReport,
};
pub use mirror::{
    mirror_args, window_title, MirrorOptions, MirrorSpawner, ScrcpySpawner, SpawnedMirror,
};
pub use network::{
    interface_query_argv, parse_inet_address, DEFAULT_TCPIP_PORT, DEFAULT_WIFI_INTERFACE,
};
pub use tool_availability::ToolAvailability;
