//! Refresh token domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata tracked for each live refresh token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenMetadata {
    /// Unique token ID (`jti` claim of the refresh JWT).
    pub jti: String,
    /// Session the token belongs to.
    pub session: String,
    /// Subject — user ID.
    pub user_id: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub scopes: Vec<String>,
    /// Whether MFA was verified for this session.
    pub mfa: bool,
}

/// Ledger entry for a registered refresh token.
///
/// Only the SHA-256 digest of the raw token is retained — the raw
/// value is never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRefreshToken {
    pub digest: String,
    pub metadata: RefreshTokenMetadata,
    pub revoked: bool,
}

impl StoredRefreshToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.metadata.expires_at
    }
}
