//! Phone Fleet Library
//!
//! Command-line front end for managing a roster of Android devices over adb
//! and launching scrcpy mirroring windows for them.

// Module declarations
pub mod cli;
pub mod render;
pub mod runner;

// Re-export main entry points
pub use cli::{Args, Command};
pub use runner::{dispatch, run, watch};
