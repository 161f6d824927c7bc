//! User domain models.

use serde::{Deserialize, Serialize};

/// Lightweight authenticated user handed to the orchestrator by the
/// service layer. The core never loads users itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub mfa_enrolled: bool,
    /// Base32 TOTP secret, if enrolled. Persisted by the caller.
    #[serde(default)]
    pub mfa_secret: Option<String>,
}

impl AuthenticatedUser {
    pub fn primary_role(&self) -> Option<&str> {
        self.roles.first().map(String::as_str)
    }
}

/// Result of MFA enrollment. The secret is returned exactly once;
/// the core does not retain it.
#[derive(Debug, Clone)]
pub struct MfaEnrollment {
    /// Subject — user ID.
    pub user_id: String,
    /// Base32-encoded shared secret.
    pub secret: String,
    /// Issuer name shown in authenticator apps.
    pub issuer: String,
    /// Display label (typically the user's email).
    pub label: String,
}
