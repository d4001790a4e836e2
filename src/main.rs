//! Phone Fleet - roster-driven adb connection manager
//!
//! This is the binary entry point. All logic lives in the library.

use std::process::ExitCode;

use clap::Parser;
use phone_fleet::Args;

#[tokio::main]
async fn main() -> color_eyre::Result<ExitCode> {
    color_eyre::install()?;
    let args = Args::parse();

    // Logging goes to a file; without it the command still runs
    if let Err(e) = pfleet_core::logging::init() {
        eprintln!("⚠️ Logging disabled: {}", e);
    }

    let result = phone_fleet::run(args).await;
    if let Err(ref e) = result {
        tracing::error!("Command failed: {:?}", e);
        eprintln!(
            "Logs: {}",
            pfleet_core::logging::log_file_path().display()
        );
    }

    Ok(result?)
}
