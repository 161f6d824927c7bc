//! Bearer token domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Token class carried in the `type` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

/// Decoded JWT payload shared across token types.
///
/// Invariant (enforced by the codec): `iat <= nbf <= exp`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPayload {
    /// Subject — user ID.
    pub sub: String,
    /// Unique token ID.
    pub jti: String,
    /// Expiration.
    pub exp: DateTime<Utc>,
    /// Issued-at.
    pub iat: DateTime<Utc>,
    /// Not-before.
    pub nbf: DateTime<Utc>,
    /// Granted scopes.
    pub scope: Vec<String>,
    /// Session the token belongs to.
    pub session: Option<String>,
    /// Whether MFA was verified when the token was issued.
    pub mfa: bool,
    /// Access or refresh.
    pub kind: TokenKind,
}

/// Pair of access and refresh tokens. Always issued atomically —
/// callers never observe a partially issued pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// Signed JWT access token.
    pub access_token: String,
    /// Signed JWT refresh token (single-use, rotated on refresh).
    pub refresh_token: String,
    /// Token kind label for HTTP `Authorization` headers.
    pub token_type: String,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
}

impl TokenPair {
    pub fn new(access_token: String, refresh_token: String, expires_in: u64) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "bearer".into(),
            expires_in,
        }
    }
}
