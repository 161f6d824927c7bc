//! Security monitor domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::audit::Severity;

/// Alert raised towards the security-alerting channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityAlert {
    pub title: String,
    pub severity: Severity,
    #[serde(default)]
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Security-relevant event recorded by the monitor itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityEvent {
    pub event_type: String,
    pub severity: Severity,
    #[serde(default)]
    pub payload: serde_json::Value,
    pub recorded_at: DateTime<Utc>,
}

/// One line of the shared monitor log. Tagged so alerts and events can
/// interleave in a single JSONL file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MonitorRecord {
    Alert(SecurityAlert),
    Event(SecurityEvent),
}
