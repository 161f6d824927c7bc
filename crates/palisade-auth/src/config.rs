//! Authentication configuration.

use std::path::PathBuf;

/// Configuration for the session-security core.
///
/// Constructed once by the embedding service and injected into
/// [`AuthService`](crate::service::AuthService) — there is no
/// process-wide settings singleton.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Shared secret for JWT signing (HMAC family).
    pub jwt_secret_key: String,
    /// JWT signing algorithm name (`HS256`, `HS384`, or `HS512`).
    pub jwt_algorithm: String,
    /// JWT issuer (`iss` claim). `None` disables issuer stamping and
    /// validation.
    pub jwt_issuer: Option<String>,
    /// Access token lifetime in seconds (default: 900 = 15 minutes).
    pub access_token_ttl_secs: u64,
    /// Refresh token lifetime in seconds (default: 604_800 = 7 days).
    pub refresh_token_ttl_secs: u64,
    /// TOTP code length (6, 7, or 8 digits).
    pub totp_digits: usize,
    /// TOTP step in seconds (default: 30).
    pub totp_interval_secs: u64,
    /// Issuer name shown in authenticator apps.
    pub totp_issuer: String,
    /// Append-only JSONL audit log.
    pub audit_log_path: PathBuf,
    /// Append-only JSONL security alert/event log.
    pub security_alert_log_path: PathBuf,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret_key: "change-me".into(),
            jwt_algorithm: "HS256".into(),
            jwt_issuer: Some("palisade".into()),
            access_token_ttl_secs: 900,
            refresh_token_ttl_secs: 604_800,
            totp_digits: 6,
            totp_interval_secs: 30,
            totp_issuer: "Palisade".into(),
            audit_log_path: "var/security_audit.log".into(),
            security_alert_log_path: "var/security_alerts.jsonl".into(),
        }
    }
}
