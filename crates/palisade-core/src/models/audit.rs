//! Audit trail domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Event severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

/// Structured audit event, appended to the audit log and forwarded to
/// the security monitor when severe enough.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_type: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub actor: Option<String>,
    pub severity: Severity,
    #[serde(default)]
    pub metadata: serde_json::Value,
    pub occurred_at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(
        event_type: impl Into<String>,
        user_id: Option<String>,
        actor: Option<String>,
        severity: Severity,
        metadata: serde_json::Value,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            user_id,
            actor,
            severity,
            metadata,
            occurred_at: Utc::now(),
        }
    }
}
