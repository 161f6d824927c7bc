//! In-process security monitor backed by a JSONL alert log.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;

use palisade_core::models::audit::Severity;
use palisade_core::models::security::{MonitorRecord, SecurityAlert, SecurityEvent};

use crate::error::AuthResult;

#[derive(Default)]
struct MonitorState {
    alerts: Vec<SecurityAlert>,
    events: Vec<SecurityEvent>,
}

/// Collects security alerts and events for process lifetime, appending
/// each one to a shared JSONL log. Its persistence is independent of
/// the audit trail's.
pub struct SecurityMonitor {
    log_path: PathBuf,
    state: Mutex<MonitorState>,
}

impl SecurityMonitor {
    /// Creates the log file's parent directories; the file itself is
    /// created on first append and never truncated.
    pub fn new(log_path: impl Into<PathBuf>) -> AuthResult<Self> {
        let log_path = log_path.into();
        if let Some(parent) = log_path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Self {
            log_path,
            state: Mutex::new(MonitorState::default()),
        })
    }

    /// Raise an alert: retained in memory and appended to the log.
    pub fn emit_alert(
        &self,
        title: impl Into<String>,
        severity: Severity,
        payload: serde_json::Value,
    ) -> AuthResult<SecurityAlert> {
        let alert = SecurityAlert {
            title: title.into(),
            severity,
            payload,
            created_at: Utc::now(),
        };
        let mut state = self.lock();
        self.append(&MonitorRecord::Alert(alert.clone()))?;
        state.alerts.push(alert.clone());
        tracing::warn!(title = %alert.title, severity = ?alert.severity, "security alert");
        Ok(alert)
    }

    /// Record a security event: retained in memory and appended to the
    /// log.
    pub fn record_event(
        &self,
        event_type: impl Into<String>,
        severity: Severity,
        payload: serde_json::Value,
    ) -> AuthResult<SecurityEvent> {
        let event = SecurityEvent {
            event_type: event_type.into(),
            severity,
            payload,
            recorded_at: Utc::now(),
        };
        let mut state = self.lock();
        self.append(&MonitorRecord::Event(event.clone()))?;
        state.events.push(event.clone());
        Ok(event)
    }

    /// Snapshot of collected alerts, not a live reference.
    pub fn load_alerts(&self) -> Vec<SecurityAlert> {
        self.lock().alerts.clone()
    }

    /// Snapshot of collected events, not a live reference.
    pub fn load_events(&self) -> Vec<SecurityEvent> {
        self.lock().events.clone()
    }

    /// Destructive reset of memory and the backing file. Ops/test use
    /// only.
    pub fn clear(&self) -> AuthResult<()> {
        let mut state = self.lock();
        state.alerts.clear();
        state.events.clear();
        match fs::remove_file(&self.log_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.log_path
    }

    // Called with the state lock held, so appends are serialized.
    fn append(&self, record: &MonitorRecord) -> AuthResult<()> {
        let line = serde_json::to_string(record)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, MonitorState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn test_monitor() -> (SecurityMonitor, TempDir) {
        let dir = TempDir::new().unwrap();
        let monitor = SecurityMonitor::new(dir.path().join("alerts.jsonl")).unwrap();
        (monitor, dir)
    }

    #[test]
    fn alerts_and_events_are_retained_and_logged() {
        let (monitor, _dir) = test_monitor();
        monitor
            .emit_alert("intrusion", Severity::High, json!({"ip": "10.0.0.1"}))
            .unwrap();
        monitor
            .record_event("auth.session_revoked", Severity::Medium, json!({}))
            .unwrap();

        assert_eq!(monitor.load_alerts().len(), 1);
        assert_eq!(monitor.load_events().len(), 1);
        assert_eq!(monitor.load_alerts()[0].title, "intrusion");

        let contents = std::fs::read_to_string(monitor.path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: MonitorRecord = serde_json::from_str(lines[0]).unwrap();
        assert!(matches!(first, MonitorRecord::Alert(_)));
        let second: MonitorRecord = serde_json::from_str(lines[1]).unwrap();
        assert!(matches!(second, MonitorRecord::Event(_)));
    }

    #[test]
    fn snapshots_are_not_live() {
        let (monitor, _dir) = test_monitor();
        let before = monitor.load_events();
        monitor
            .record_event("auth.session_revoked", Severity::Medium, json!({}))
            .unwrap();
        assert!(before.is_empty());
        assert_eq!(monitor.load_events().len(), 1);
    }

    #[test]
    fn clear_resets_memory_and_file() {
        let (monitor, _dir) = test_monitor();
        monitor
            .emit_alert("noise", Severity::Critical, json!({}))
            .unwrap();
        monitor.clear().unwrap();

        assert!(monitor.load_alerts().is_empty());
        assert!(!monitor.path().exists());
        // Clearing an already-empty monitor is fine.
        monitor.clear().unwrap();
    }
}
