//! Device bridge client
//!
//! [`DeviceBridge`] is the seam between the fleet logic and the external `adb`
//! executable. [`AdbBridge`] implements it by running `adb` as a child process
//! per call, each call bounded by a timeout.

use crate::devices::{parse_devices_output, BridgeDevice};
use pfleet_core::prelude::*;
use pfleet_core::DeviceId;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

/// Default bound for `adb connect`
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default bound for every other bridge command
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Operations the fleet needs from the device bridge
#[trait_variant::make(DeviceBridge: Send)]
pub trait LocalDeviceBridge {
    /// All devices the bridge knows about, whatever their status
    async fn devices(&self) -> Result<Vec<BridgeDevice>>;

    /// Connect to a network device. `Ok` carries the bridge's success message.
    async fn connect(&self, id: &DeviceId) -> Result<String>;

    /// Disconnect one device, or all of them. Failures are only logged.
    async fn disconnect(&self, id: Option<&DeviceId>);

    /// Restart the device's bridge daemon listening on a TCP port
    async fn set_network_mode(&self, id: &DeviceId, port: u16) -> Result<()>;

    /// Run a shell command on the device and return its stdout
    async fn shell(&self, id: &DeviceId, argv: &[&str]) -> Result<String>;

    /// Make sure the bridge server is running
    async fn start_server(&self) -> Result<()>;
}

/// Captured output of one bridge invocation
#[derive(Debug)]
struct CommandOutput {
    success: bool,
    code: Option<i32>,
    stdout: String,
    stderr: String,
}

impl CommandOutput {
    /// Best message to show the user: stdout if present, else stderr
    fn message(&self) -> &str {
        let stdout = self.stdout.trim();
        if stdout.is_empty() {
            self.stderr.trim()
        } else {
            stdout
        }
    }

    fn failure_message(&self, operation: &str) -> String {
        let message = self.message();
        if message.is_empty() {
            format!("{} exited with code {:?}", operation, self.code)
        } else {
            message.to_string()
        }
    }
}

/// [`DeviceBridge`] backed by the `adb` executable
#[derive(Debug, Clone)]
pub struct AdbBridge {
    program: PathBuf,
    connect_timeout: Duration,
    command_timeout: Duration,
}

impl AdbBridge {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    pub fn with_timeouts(mut self, connect_timeout: Duration, command_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self.command_timeout = command_timeout;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Run adb with the given arguments, killing it if `limit` elapses
    async fn run(&self, args: &[&str], limit: Duration) -> Result<CommandOutput> {
        let operation = format!("adb {}", args.join(" "));
        trace!("Running {} (timeout {:?})", operation, limit);

        let mut command = Command::new(&self.program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = timeout(limit, command.output())
            .await
            .map_err(|_| {
                warn!("{} timed out after {:?}", operation, limit);
                Error::timeout(operation.as_str(), limit)
            })?
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::bridge_unavailable(format!(
                        "'{}' not found. Install Android platform-tools or set bridge.adb_path.",
                        self.program.display()
                    ))
                } else {
                    Error::bridge_unavailable(format!("Failed to run {}: {}", operation, e))
                }
            })?;

        let output = CommandOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };

        debug!("{} exited with {:?}", operation, output.code);
        if !output.stderr.trim().is_empty() {
            trace!("{} stderr: {}", operation, output.stderr.trim());
        }

        Ok(output)
    }

    /// Run a command whose non-zero exit means the device refused the request
    async fn run_checked(&self, args: &[&str]) -> Result<CommandOutput> {
        let output = self.run(args, self.command_timeout).await?;
        if !output.success {
            let operation = format!("adb {}", args.join(" "));
            return Err(Error::rejected(output.failure_message(&operation)));
        }
        Ok(output)
    }
}

impl DeviceBridge for AdbBridge {
    async fn devices(&self) -> Result<Vec<BridgeDevice>> {
        let output = self.run(&["devices"], self.command_timeout).await?;
        if !output.success {
            return Err(Error::bridge_unavailable(
                output.failure_message("adb devices"),
            ));
        }
        Ok(parse_devices_output(&output.stdout))
    }

    async fn connect(&self, id: &DeviceId) -> Result<String> {
        let output = self
            .run(&["connect", id.as_str()], self.connect_timeout)
            .await?;
        classify_connect_output(&output.stdout, &output.stderr)
    }

    async fn disconnect(&self, id: Option<&DeviceId>) {
        let mut args = vec!["disconnect"];
        if let Some(id) = id {
            args.push(id.as_str());
        }

        match self.run(&args, self.command_timeout).await {
            Ok(output) => debug!("adb {}: {}", args.join(" "), output.message()),
            Err(e) => debug!("adb {} failed (ignored): {}", args.join(" "), e),
        }
    }

    async fn set_network_mode(&self, id: &DeviceId, port: u16) -> Result<()> {
        let port = port.to_string();
        let output = self
            .run_checked(&["-s", id.as_str(), "tcpip", port.as_str()])
            .await?;
        info!("{} switched to TCP/IP on port {}: {}", id, port, output.message());
        Ok(())
    }

    async fn shell(&self, id: &DeviceId, argv: &[&str]) -> Result<String> {
        let mut args = vec!["-s", id.as_str(), "shell"];
        args.extend_from_slice(argv);
        let output = self.run_checked(&args).await?;
        Ok(output.stdout)
    }

    async fn start_server(&self) -> Result<()> {
        let output = self.run(&["start-server"], self.command_timeout).await?;
        if !output.success {
            return Err(Error::bridge_unavailable(format!(
                "Failed to start ADB server: {}",
                output.failure_message("adb start-server")
            )));
        }
        Ok(())
    }
}

/// Classify `adb connect` output.
///
/// adb exits 0 even when the connection fails, so success is decided by the
/// text: `connected to` or `already connected`.
pub fn classify_connect_output(stdout: &str, stderr: &str) -> Result<String> {
    let stdout = stdout.trim();
    if stdout.contains("connected to") || stdout.contains("already connected") {
        return Ok(stdout.to_string());
    }

    let message = if stdout.is_empty() {
        stderr.trim()
    } else {
        stdout
    };

    if message.is_empty() {
        Err(Error::rejected("no output from adb connect"))
    } else {
        Err(Error::rejected(message))
    }
}

#[cfg(test)]
mod tests {
    // Named imports: a glob would bring both bridge traits into scope
    use super::{
        classify_connect_output, AdbBridge, CommandOutput, DeviceBridge, DEFAULT_COMMAND_TIMEOUT,
    };
    use pfleet_core::Error;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn test_classify_connected() {
        let result = classify_connect_output("connected to 192.168.1.42:5555\n", "");
        assert_eq!(result.unwrap(), "connected to 192.168.1.42:5555");
    }

    #[test]
    fn test_classify_already_connected() {
        let result = classify_connect_output("already connected to 192.168.1.42:5555", "");
        assert!(result.is_ok());
    }

    #[test]
    fn test_classify_failed_to_connect() {
        let result = classify_connect_output(
            "failed to connect to '192.168.1.99:5555': Connection refused\n",
            "",
        );
        match result {
            Err(Error::Rejected { message }) => {
                assert_eq!(
                    message,
                    "failed to connect to '192.168.1.99:5555': Connection refused"
                )
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_uses_stderr_when_stdout_empty() {
        let result = classify_connect_output("", "error: unknown host service\n");
        match result {
            Err(Error::Rejected { message }) => assert_eq!(message, "error: unknown host service"),
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_empty_output() {
        assert!(matches!(
            classify_connect_output("", ""),
            Err(Error::Rejected { .. })
        ));
    }

    #[test]
    fn test_command_output_message_prefers_stdout() {
        let output = CommandOutput {
            success: false,
            code: Some(1),
            stdout: "  out  ".to_string(),
            stderr: "err".to_string(),
        };
        assert_eq!(output.message(), "out");
    }

    #[test]
    fn test_command_output_failure_message_without_text() {
        let output = CommandOutput {
            success: false,
            code: Some(255),
            stdout: String::new(),
            stderr: String::new(),
        };
        assert_eq!(
            output.failure_message("adb -s A tcpip 5555"),
            "adb -s A tcpip 5555 exited with code Some(255)"
        );
    }

    #[tokio::test]
    async fn test_missing_executable_is_bridge_unavailable() {
        let bridge = AdbBridge::new("/nonexistent/pfleet-test/adb");
        let err = tokio_test::assert_err!(bridge.devices().await);
        assert!(matches!(err, Error::BridgeUnavailable { .. }));
        assert!(err.to_string().contains("not found"));
    }

    /// Process-level tests against a shell script standing in for adb
    #[cfg(unix)]
    mod fake_adb {
        use super::*;
        use std::os::unix::fs::PermissionsExt;
        use tempfile::TempDir;

        fn write_script(body: &str) -> (TempDir, PathBuf) {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("adb");
            std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            (dir, path)
        }

        #[tokio::test]
        async fn test_devices_parses_script_output() {
            let (_dir, path) = write_script(
                r#"printf 'List of devices attached\nABC123\tdevice\n10.0.0.5:5555\toffline\n\n'"#,
            );
            let bridge = AdbBridge::new(path);

            let devices = bridge.devices().await.unwrap();

            assert_eq!(devices.len(), 2);
            assert!(devices[0].is_usb_ready());
            assert!(!devices[1].is_ready());
        }

        #[tokio::test]
        async fn test_devices_nonzero_exit_is_unavailable() {
            let (_dir, path) = write_script("echo 'cannot bind' >&2; exit 1");
            let bridge = AdbBridge::new(path);

            let err = bridge.devices().await.unwrap_err();

            assert!(matches!(err, Error::BridgeUnavailable { .. }));
            assert!(err.to_string().contains("cannot bind"));
        }

        #[tokio::test]
        async fn test_connect_passes_identifier() {
            let (_dir, path) = write_script(r#"echo "connected to $2""#);
            let bridge = AdbBridge::new(path);

            let message = bridge.connect(&"10.0.0.5:5555".into()).await.unwrap();

            assert_eq!(message, "connected to 10.0.0.5:5555");
        }

        #[tokio::test]
        async fn test_connect_times_out() {
            let (_dir, path) = write_script("sleep 5; echo connected to x");
            let bridge = AdbBridge::new(path)
                .with_timeouts(Duration::from_millis(200), DEFAULT_COMMAND_TIMEOUT);

            let start = std::time::Instant::now();
            let err = bridge.connect(&"10.0.0.5:5555".into()).await.unwrap_err();

            assert!(matches!(err, Error::Timeout { .. }));
            assert!(start.elapsed() < Duration::from_secs(3));
        }

        #[tokio::test]
        async fn test_shell_forwards_argv() {
            let (_dir, path) = write_script(r#"shift 3; echo "$@""#);
            let bridge = AdbBridge::new(path);

            let output = bridge
                .shell(&"ABC123".into(), &["ip", "addr", "show", "wlan0"])
                .await
                .unwrap();

            assert_eq!(output.trim(), "ip addr show wlan0");
        }

        #[tokio::test]
        async fn test_tcpip_failure_is_rejected() {
            let (_dir, path) = write_script("echo 'error: device unauthorized.' >&2; exit 1");
            let bridge = AdbBridge::new(path);

            let err = bridge
                .set_network_mode(&"ABC123".into(), 5555)
                .await
                .unwrap_err();

            match err {
                Error::Rejected { message } => assert_eq!(message, "error: device unauthorized."),
                other => panic!("expected rejection, got {:?}", other),
            }
        }

        #[tokio::test]
        async fn test_disconnect_ignores_failure() {
            let (_dir, path) = write_script("exit 1");
            let bridge = AdbBridge::new(path);

            // Must not panic or surface anything
            bridge.disconnect(None).await;
            bridge.disconnect(Some(&"A".into())).await;
        }
    }
}
