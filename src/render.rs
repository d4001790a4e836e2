//! Outcome rendering for the terminal
//!
//! Human output mirrors the roster list: one status line, any per-device
//! failures, then `"{index}. {id}  {icon}"` per roster device. JSON output
//! is one object per outcome (NDJSON when watching).

use chrono::{DateTime, Local};
use pfleet_app::{Outcome, OutcomeStatus};
use pfleet_core::prelude::*;
use serde::Serialize;
use std::io::Write;

/// Icon prefixed to the status line
pub fn status_icon(status: OutcomeStatus) -> &'static str {
    match status {
        OutcomeStatus::Succeeded => "✅",
        OutcomeStatus::Unchanged => "ℹ️",
        OutcomeStatus::Failed => "❌",
    }
}

/// Render an outcome as human-readable lines (no trailing newline)
pub fn render_human(outcome: &Outcome) -> String {
    let mut lines = vec![format!("{} {}", status_icon(outcome.status), outcome.message)];

    for failure in &outcome.failures {
        lines.push(format!("   - {}", failure));
    }

    if let Some(ref warning) = outcome.bridge_warning {
        lines.push(format!("⚠️ {}", warning));
    }

    if outcome.view.is_empty() {
        lines.push("No devices in roster.".to_string());
    }
    for entry in &outcome.view {
        lines.push(format!("{}. {}  {}", entry.index, entry.id, entry.status_icon()));
    }

    lines.join("\n")
}

/// An outcome stamped with the time it was observed
#[derive(Serialize)]
struct Timestamped<'a> {
    /// Milliseconds since the Unix epoch
    timestamp: i64,
    #[serde(flatten)]
    outcome: &'a Outcome,
}

/// Render an outcome as a single JSON line
pub fn render_json(outcome: &Outcome, at: Option<DateTime<Local>>) -> Result<String> {
    let json = match at {
        Some(at) => serde_json::to_string(&Timestamped {
            timestamp: at.timestamp_millis(),
            outcome,
        })?,
        None => serde_json::to_string(outcome)?,
    };
    Ok(json)
}

/// Write an outcome in the requested format.
///
/// `at` adds a timestamp (a header line in human mode).
pub fn write_outcome(
    out: &mut impl Write,
    outcome: &Outcome,
    json: bool,
    at: Option<DateTime<Local>>,
) -> Result<()> {
    if json {
        writeln!(out, "{}", render_json(outcome, at)?)?;
    } else {
        if let Some(at) = at {
            writeln!(out, "── {} ──", at.format("%H:%M:%S"))?;
        }
        writeln!(out, "{}", render_human(outcome))?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use insta::assert_snapshot;
    use pfleet_core::{DeviceFailure, DeviceViewEntry};

    fn view() -> Vec<DeviceViewEntry> {
        vec![
            DeviceViewEntry::new(1, "192.168.1.42:5555".into(), true),
            DeviceViewEntry::new(2, "R58M123ABC".into(), false),
            DeviceViewEntry::new(3, "10.0.0.5:5555".into(), true),
        ]
    }

    #[test]
    fn test_render_list() {
        let mut outcome = Outcome::succeeded("2/3 devices connected");
        outcome.view = view();

        assert_snapshot!(render_human(&outcome), @r"
        ✅ 2/3 devices connected
        1. 192.168.1.42:5555  ✅
        2. R58M123ABC  ❌
        3. 10.0.0.5:5555  ✅
        ");
    }

    #[test]
    fn test_render_failures_and_warning() {
        let mut outcome = Outcome::failed("Some connections failed.");
        outcome.failures = vec![DeviceFailure::new(
            "R58M123ABC".into(),
            "Connection timed out",
        )];
        outcome.bridge_warning = Some("Device bridge unavailable: adb not found".to_string());
        outcome.view = view();

        assert_snapshot!(render_human(&outcome), @r"
        ❌ Some connections failed.
           - R58M123ABC: Connection timed out
        ⚠️ Device bridge unavailable: adb not found
        1. 192.168.1.42:5555  ✅
        2. R58M123ABC  ❌
        3. 10.0.0.5:5555  ✅
        ");
    }

    #[test]
    fn test_render_empty_roster() {
        let outcome = Outcome::unchanged("Device Z not in list.");

        assert_snapshot!(render_human(&outcome), @r"
        ℹ️ Device Z not in list.
        No devices in roster.
        ");
    }

    #[test]
    fn test_render_json() {
        let mut outcome = Outcome::succeeded("Added A");
        outcome.view = vec![DeviceViewEntry::new(1, "A".into(), false)];

        assert_snapshot!(
            render_json(&outcome, None).unwrap(),
            @r#"{"status":"succeeded","message":"Added A","view":[{"index":1,"id":"A","connected":false}]}"#
        );
    }

    #[test]
    fn test_render_json_with_timestamp() {
        let at = Local.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let outcome = Outcome::succeeded("0/0 devices connected");

        let json = render_json(&outcome, Some(at)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["timestamp"], 1_700_000_000_000_i64);
        assert_eq!(value["status"], "succeeded");
    }

    #[test]
    fn test_write_outcome_human_ends_with_newline() {
        let mut buf = Vec::new();
        write_outcome(&mut buf, &Outcome::succeeded("Disconnected all devices."), false, None)
            .unwrap();

        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "✅ Disconnected all devices.\nNo devices in roster.\n");
    }
}
