//! # pfleet-core - Core Domain Types
//!
//! Foundation crate for Phone Fleet. Provides domain types, error handling,
//! and logging setup shared by the bridge, app, and binary crates.
//!
//! This crate has **zero internal dependencies** -- it only depends on external
//! crates (serde, thiserror, tracing).
//!
//! ## Public API
//!
//! ### Domain Types (`types`)
//! - [`DeviceId`] - Opaque device identifier (`host:port` or USB serial)
//! - [`Roster`] - Ordered, duplicate-free list of device identifiers
//! - [`DeviceViewEntry`] - One row of the reconciled roster view
//! - [`ConnectResult`], [`DeviceFailure`] - Per-device connection results
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Error taxonomy for bridge, discovery, launch and persistence failures
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//! - [`ResultExt`] - Extension trait for adding error context
//!
//! ## Prelude
//!
//! Import commonly used types with:
//! ```rust
//! use pfleet_core::prelude::*;
//! ```

pub mod error;
pub mod logging;
pub mod types;

/// Prelude for common imports used throughout all Phone Fleet crates
pub mod prelude {
    pub use super::error::{Error, Result, ResultExt};
    pub use tracing::{debug, error, info, instrument, trace, warn};
}

// Re-export commonly used types at crate root for convenience
pub use error::{Error, Result, ResultExt};
pub use types::{ConnectResult, DeviceFailure, DeviceId, DeviceViewEntry, Roster};
