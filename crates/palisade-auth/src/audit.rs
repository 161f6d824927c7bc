//! Append-only audit trail.

use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use palisade_core::models::audit::{AuditEvent, Severity};

use crate::error::AuthResult;
use crate::monitor::SecurityMonitor;

/// Durable, append-only JSONL audit log. Every line is independently
/// parseable, so a truncated trailing write never poisons the trail.
/// High and critical events are forwarded to the security monitor as
/// alerts.
pub struct AuditTrail {
    log_path: PathBuf,
    monitor: Option<Arc<SecurityMonitor>>,
    /// Serializes concurrent appends (single-writer discipline).
    write_lock: Mutex<()>,
}

impl AuditTrail {
    /// Creates the log file's parent directories; the file itself is
    /// created on first append and never truncated.
    pub fn new(
        log_path: impl Into<PathBuf>,
        monitor: Option<Arc<SecurityMonitor>>,
    ) -> AuthResult<Self> {
        let log_path = log_path.into();
        if let Some(parent) = log_path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Self {
            log_path,
            monitor,
            write_lock: Mutex::new(()),
        })
    }

    /// Append one event to the log, forwarding an alert when severity
    /// is high or critical.
    pub fn record(&self, event: &AuditEvent) -> AuthResult<()> {
        let line = serde_json::to_string(event)?;
        {
            let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.log_path)?;
            writeln!(file, "{line}")?;
        }

        if event.severity >= Severity::High {
            if let Some(monitor) = &self.monitor {
                let actor = event.actor.as_deref().unwrap_or("unknown");
                monitor.emit_alert(
                    format!("{} by {}", event.event_type, actor),
                    event.severity,
                    event.metadata.clone(),
                )?;
            }
        }
        Ok(())
    }

    /// Replay the log. Unparseable lines are skipped, not fatal.
    pub fn load(&self) -> AuthResult<Vec<AuditEvent>> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }
        let reader = BufReader::new(fs::File::open(&self.log_path)?);
        let mut events = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<AuditEvent>(&line) {
                Ok(event) => events.push(event),
                Err(err) => {
                    tracing::warn!(error = %err, "skipping unparseable audit line");
                }
            }
        }
        Ok(events)
    }

    pub fn path(&self) -> &Path {
        &self.log_path
    }
}
