//! Screen-mirroring process spawning (`scrcpy`)

use pfleet_core::prelude::*;
use pfleet_core::DeviceId;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Optional scrcpy flags applied to every launched session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirrorOptions {
    pub turn_screen_on: bool,
    pub stay_awake: bool,
    /// Longest side of the mirrored frame in pixels
    pub max_size: Option<u32>,
    pub borderless: bool,
    pub extra_args: Vec<String>,
}

/// Window label for a device's mirroring session
pub fn window_title(index: usize, id: &DeviceId) -> String {
    format!("Phone {} - {}", index, id)
}

/// Build the scrcpy argument list for one device
pub fn mirror_args(id: &DeviceId, title: &str, options: &MirrorOptions) -> Vec<String> {
    let mut args = vec![
        "-s".to_string(),
        id.to_string(),
        "--window-title".to_string(),
        title.to_string(),
    ];

    if options.turn_screen_on {
        args.push("--turn-screen-on".to_string());
    }
    if options.stay_awake {
        args.push("--stay-awake".to_string());
    }
    if let Some(max_size) = options.max_size {
        args.push("--max-size".to_string());
        args.push(max_size.to_string());
    }
    if options.borderless {
        args.push("--window-borderless".to_string());
    }
    args.extend(options.extra_args.iter().cloned());

    args
}

/// A mirroring process that was started and left running
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnedMirror {
    pub pid: Option<u32>,
}

/// Starts one detached mirroring process per call
pub trait MirrorSpawner: Send + Sync {
    fn spawn(&self, id: &DeviceId, title: &str) -> Result<SpawnedMirror>;
}

impl<T: MirrorSpawner + ?Sized> MirrorSpawner for std::sync::Arc<T> {
    fn spawn(&self, id: &DeviceId, title: &str) -> Result<SpawnedMirror> {
        (**self).spawn(id, title)
    }
}

/// [`MirrorSpawner`] backed by the `scrcpy` executable
#[derive(Debug, Clone)]
pub struct ScrcpySpawner {
    program: PathBuf,
    options: MirrorOptions,
}

impl ScrcpySpawner {
    pub fn new(program: impl Into<PathBuf>, options: MirrorOptions) -> Self {
        Self {
            program: program.into(),
            options,
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl MirrorSpawner for ScrcpySpawner {
    /// Start scrcpy in the background and return immediately.
    ///
    /// Must be called from within a tokio runtime: the child is reaped by a
    /// background task so it never lingers as a zombie, but its exit status
    /// is only logged.
    fn spawn(&self, id: &DeviceId, title: &str) -> Result<SpawnedMirror> {
        let args = mirror_args(id, title, &self.options);
        debug!("Starting {} {}", self.program.display(), args.join(" "));

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::launch_failed(
                        id.as_str(),
                        format!(
                            "'{}' not found. Install scrcpy or set mirror.scrcpy_path.",
                            self.program.display()
                        ),
                    )
                } else {
                    Error::launch_failed(id.as_str(), e.to_string())
                }
            })?;

        let pid = child.id();
        let id = id.clone();
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) => debug!("Mirroring session for {} exited: {}", id, status),
                Err(e) => debug!("Mirroring session for {} could not be awaited: {}", id, e),
            }
        });

        Ok(SpawnedMirror { pid })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_title() {
        assert_eq!(
            window_title(2, &"192.168.1.42:5555".into()),
            "Phone 2 - 192.168.1.42:5555"
        );
    }

    #[test]
    fn test_mirror_args_minimal() {
        let args = mirror_args(&"ABC123".into(), "Phone 1 - ABC123", &MirrorOptions::default());
        assert_eq!(args, vec!["-s", "ABC123", "--window-title", "Phone 1 - ABC123"]);
    }

    #[test]
    fn test_mirror_args_with_options() {
        let options = MirrorOptions {
            turn_screen_on: true,
            stay_awake: true,
            max_size: Some(1024),
            borderless: true,
            extra_args: vec!["--no-audio".to_string()],
        };

        let args = mirror_args(&"ABC123".into(), "t", &options);

        assert_eq!(
            args,
            vec![
                "-s",
                "ABC123",
                "--window-title",
                "t",
                "--turn-screen-on",
                "--stay-awake",
                "--max-size",
                "1024",
                "--window-borderless",
                "--no-audio",
            ]
        );
    }

    #[tokio::test]
    async fn test_spawn_missing_program_is_launch_failure() {
        let spawner = ScrcpySpawner::new("/nonexistent/pfleet-test/scrcpy", MirrorOptions::default());

        let err = spawner.spawn(&"ABC123".into(), "Phone 1 - ABC123").unwrap_err();

        assert!(matches!(err, Error::LaunchFailed { .. }));
        assert!(err.to_string().contains("ABC123"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_spawn_returns_without_waiting() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scrcpy");
        std::fs::write(&path, "#!/bin/sh\nsleep 5\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        let spawner = ScrcpySpawner::new(&path, MirrorOptions::default());

        let start = std::time::Instant::now();
        let spawned = spawner.spawn(&"ABC123".into(), "Phone 1 - ABC123").unwrap();

        assert!(spawned.pid.is_some());
        assert!(start.elapsed() < std::time::Duration::from_secs(2));
    }
}
