//! Authentication error types.

use thiserror::Error;

/// Refresh-token ledger failure kinds. All map to "session invalid"
/// at the service boundary, but the sub-kind is preserved so callers
/// and tests can tell an expired token from a revoked one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RefreshTokenError {
    #[error("refresh token is unknown")]
    Unknown,

    #[error("refresh token revoked")]
    Revoked,

    #[error("refresh token expired")]
    Expired,

    #[error("refresh token session mismatch")]
    SessionMismatch,
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// Token could not be encoded. Fatal, never retried.
    #[error("token encoding failed: {0}")]
    TokenEncoding(String),

    /// Token could not be decoded or validated — bad signature,
    /// malformed input, missing claim, or expiry. One kind for all of
    /// them: callers only learn "unauthenticated".
    #[error("invalid token: {0}")]
    TokenDecoding(String),

    /// Refresh token rejected by the ledger.
    #[error(transparent)]
    Refresh(#[from] RefreshTokenError),

    /// MFA challenge required — missing or invalid code, or missing
    /// MFA context on a secured refresh. Distinct from authentication
    /// failure so an HTTP layer can tell clients to re-prompt instead
    /// of forcing a new login.
    #[error("MFA required: {0}")]
    MfaRequired(String),

    #[error("cryptography error: {0}")]
    Crypto(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type AuthResult<T> = Result<T, AuthError>;
