//! Command dispatch
//!
//! Builds the controller from the fleet directory's settings, runs one
//! command against it and reports whether the command failed.

use std::future::Future;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use chrono::Local;
use pfleet_app::config::{init_config_dir, load_settings, resolve_fleet_home, CONFIG_FILENAME};
use pfleet_app::{Controller, JsonRosterStore, Outcome, Settings};
use pfleet_bridge::{AdbBridge, DeviceBridge, ScrcpySpawner, ToolAvailability};
use pfleet_core::prelude::*;
use tokio::time::MissedTickBehavior;

use crate::cli::{Args, Command};
use crate::render::write_outcome;

/// Run the command described by `args`
pub async fn run(args: Args) -> Result<ExitCode> {
    let home = resolve_fleet_home(args.dir.as_deref());
    let command = args.command();
    info!("Fleet directory: {}", home.display());

    if command == Command::Init {
        return init(&home);
    }

    let settings = load_settings(&home);
    let mut controller = build_controller(&home, &settings);

    if settings.bridge.start_server && !args.no_start_server {
        let outcome = controller.start_bridge_server().await;
        if outcome.is_failure() {
            eprintln!("⚠️ {}", outcome.message);
        }
    }

    let mut stdout = std::io::stdout().lock();

    if let Command::Watch { interval } = command {
        let interval = interval
            .map(|secs| Duration::from_secs(secs.max(1)))
            .unwrap_or_else(|| settings.watch.poll_interval());
        let shutdown = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        };
        watch(&controller, interval, args.json, &mut stdout, shutdown).await?;
        return Ok(ExitCode::SUCCESS);
    }

    let outcome = dispatch(&mut controller, command).await;
    write_outcome(&mut stdout, &outcome, args.json, None)?;

    Ok(if outcome.is_failure() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn init(home: &Path) -> Result<ExitCode> {
    let path = home.join(CONFIG_FILENAME);
    if init_config_dir(home).context("Failed to initialize fleet directory")? {
        println!("✅ Created {}", path.display());
    } else {
        println!("ℹ️ Config already exists at {}", path.display());
    }
    Ok(ExitCode::SUCCESS)
}

/// Wire the real bridge, spawner and store from settings
fn build_controller(home: &Path, settings: &Settings) -> Controller<AdbBridge> {
    let tools = ToolAvailability::resolve(
        settings.bridge.adb_override(),
        settings.mirror.scrcpy_override(),
    );
    for message in [tools.adb_unavailable_message(), tools.scrcpy_unavailable_message()]
        .into_iter()
        .flatten()
    {
        warn!("{}", message);
    }

    let bridge = AdbBridge::new(&tools.adb_path).with_timeouts(
        settings.bridge.connect_timeout(),
        settings.bridge.command_timeout(),
    );
    let spawner = ScrcpySpawner::new(&tools.scrcpy_path, settings.mirror.options());
    let store = JsonRosterStore::in_dir(home);

    Controller::new(bridge, Box::new(store), Box::new(spawner))
        .with_discovery(settings.discovery.port, settings.discovery.interface.clone())
}

/// Run one non-interactive command
///
/// `init` and `watch` are handled by [`run`]; here they only show the roster.
/// Bad identifiers come back as a failed outcome, like any other failure.
pub async fn dispatch<B: DeviceBridge>(controller: &mut Controller<B>, command: Command) -> Outcome {
    match command {
        Command::List | Command::Init | Command::Watch { .. } => {
            controller.list_roster_view().await
        }
        Command::Add { id } => controller.add_device(&id).await,
        Command::Remove { id } => controller.remove_device(&id).await,
        Command::AutoDetect => controller.auto_detect_and_add().await,
        Command::Connect { id: Some(id) } => controller.connect_one(&id).await,
        Command::Connect { id: None } => controller.connect_all().await,
        Command::Disconnect { id: Some(id) } => controller.disconnect_one(&id).await,
        Command::Disconnect { id: None } => controller.disconnect_all().await,
        Command::Launch { id: Some(id), index } => controller.launch_one(&id, index).await,
        Command::Launch { id: None, .. } => controller.launch_all().await,
    }
}

/// Print the roster view every `interval` until `shutdown` completes
pub async fn watch<B: DeviceBridge>(
    controller: &Controller<B>,
    interval: Duration,
    json: bool,
    out: &mut impl Write,
    shutdown: impl Future<Output = ()>,
) -> Result<()> {
    info!("Watching roster every {:?}", interval);

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Watch stopped");
                return Ok(());
            }
            _ = ticker.tick() => {
                let outcome = controller.list_roster_view().await;
                write_outcome(out, &outcome, json, Some(Local::now()))?;
            }
        }
    }
}
