//! Authentication orchestration — token issuance, refresh rotation,
//! verification, revocation, and MFA enrollment.
//!
//! This is the sole surface exposed to the service layer. Per-session
//! lifecycle: UNAUTHENTICATED → ISSUING → ACTIVE → REFRESHING →
//! {ACTIVE | REVOKED} → EXPIRED, where expiry is detected lazily at
//! validation time and never actively swept.

use std::sync::Arc;

use chrono::Duration;
use serde_json::json;
use uuid::Uuid;

use palisade_core::models::audit::{AuditEvent, Severity};
use palisade_core::models::token::{TokenKind, TokenPair, TokenPayload};
use palisade_core::models::user::{AuthenticatedUser, MfaEnrollment};

use crate::audit::AuditTrail;
use crate::config::AuthConfig;
use crate::error::{AuthError, AuthResult};
use crate::monitor::SecurityMonitor;
use crate::password;
use crate::refresh::RefreshTokenLedger;
use crate::token::{ClaimsSpec, TokenCodec};
use crate::totp::{TotpVerifier, DEFAULT_SECRET_BYTES};

/// Verification window for MFA codes: +/- one interval.
const MFA_VERIFY_WINDOW: u64 = 1;

/// Input for token pair issuance.
#[derive(Debug, Default)]
pub struct IssueInput {
    pub scopes: Vec<String>,
    pub session_id: Option<String>,
    pub mfa_code: Option<String>,
    pub require_mfa: bool,
}

/// Composes the codec, verifier, ledger, trail, and monitor into the
/// login/refresh/verify/revoke/enroll operations.
pub struct AuthService {
    config: AuthConfig,
    codec: TokenCodec,
    verifier: TotpVerifier,
    ledger: RefreshTokenLedger,
    monitor: Arc<SecurityMonitor>,
    audit: AuditTrail,
}

impl AuthService {
    /// Wire up the orchestrator from an injected configuration.
    /// Fails on an unusable JWT algorithm or TOTP digit count.
    pub fn new(config: AuthConfig) -> AuthResult<Self> {
        let codec = TokenCodec::new(&config)?;
        let verifier = TotpVerifier::new(config.totp_digits, config.totp_interval_secs)?;
        let monitor = Arc::new(SecurityMonitor::new(
            config.security_alert_log_path.clone(),
        )?);
        let audit = AuditTrail::new(config.audit_log_path.clone(), Some(Arc::clone(&monitor)))?;
        Ok(Self {
            config,
            codec,
            verifier,
            ledger: RefreshTokenLedger::new(),
            monitor,
            audit,
        })
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn totp(&self) -> &TotpVerifier {
        &self.verifier
    }

    pub fn refresh_ledger(&self) -> &RefreshTokenLedger {
        &self.ledger
    }

    /// Compliance read access to the audit trail (`load`).
    pub fn audit_trail(&self) -> &AuditTrail {
        &self.audit
    }

    /// Compliance read access to the security monitor
    /// (`load_alerts` / `load_events`).
    pub fn monitor(&self) -> &SecurityMonitor {
        &self.monitor
    }

    pub fn hash_password(&self, password: &str) -> AuthResult<String> {
        password::hash_password(password)
    }

    pub fn verify_password(&self, password: &str, hash: &str) -> AuthResult<bool> {
        password::verify_password(password, hash)
    }

    /// Issue an access/refresh token pair for `user`.
    ///
    /// If MFA is demanded (explicitly or because the user is enrolled),
    /// a valid current TOTP code is mandatory. Both tokens are encoded
    /// before the ledger registration, which is infallible — an encode
    /// failure cannot leave an orphaned ledger entry behind.
    pub fn issue_token_pair(
        &self,
        user: &AuthenticatedUser,
        input: IssueInput,
    ) -> AuthResult<TokenPair> {
        let mut scopes = input.scopes;
        scopes.sort();
        scopes.dedup();

        let session = input.session_id.unwrap_or_else(new_id);
        let mfa_verified = self.ensure_mfa(user, input.mfa_code.as_deref(), input.require_mfa)?;

        let refresh_ttl = Duration::seconds(self.config.refresh_token_ttl_secs as i64);
        let access_ttl = Duration::seconds(self.config.access_token_ttl_secs as i64);

        let metadata = RefreshTokenLedger::new_metadata(
            &user.id,
            Some(&session),
            scopes.clone(),
            refresh_ttl,
            mfa_verified,
        );

        let refresh_token = self.codec.encode(
            &ClaimsSpec {
                sub: user.id.clone(),
                jti: metadata.jti.clone(),
                session: Some(session.clone()),
                scope: scopes.clone(),
                mfa: mfa_verified,
                kind: TokenKind::Refresh,
            },
            refresh_ttl,
        )?;

        let access_token = self.codec.encode(
            &ClaimsSpec {
                sub: user.id.clone(),
                jti: new_id(),
                session: Some(session.clone()),
                scope: scopes.clone(),
                mfa: mfa_verified,
                kind: TokenKind::Access,
            },
            access_ttl,
        )?;

        self.record_audit(
            "auth.session_issued",
            Some(user),
            Severity::Info,
            json!({"session": session, "scopes": scopes}),
        )?;

        self.ledger.register(&refresh_token, metadata);
        tracing::info!(user = %user.id, session = %session, "issued token pair");

        Ok(TokenPair::new(
            access_token,
            refresh_token,
            self.config.access_token_ttl_secs,
        ))
    }

    /// Rotate a refresh token into a new pair inheriting its scopes and
    /// session. The consumed token is unusable the moment rotation
    /// succeeds — there is no grace window.
    pub fn refresh_session(
        &self,
        refresh_token: &str,
        user: Option<&AuthenticatedUser>,
        mfa_code: Option<&str>,
    ) -> AuthResult<TokenPair> {
        let payload = self.codec.decode(refresh_token, None)?;
        if payload.kind != TokenKind::Refresh {
            return Err(AuthError::TokenDecoding("token is not a refresh token".into()));
        }

        // First pass: look up metadata without consuming, so a failed
        // MFA challenge leaves the token usable for a client re-prompt.
        let metadata = self.ledger.validate(refresh_token, None)?;
        if metadata.mfa {
            let user = user.ok_or_else(|| {
                AuthError::MfaRequired(
                    "user context with MFA secret required to refresh secured session".into(),
                )
            })?;
            self.ensure_mfa(user, mfa_code, true)?;
        }

        // Second pass: validate + revoke in one critical section. Of
        // any concurrent rotations on this token, exactly one gets
        // past this point.
        let metadata = self.ledger.consume(refresh_token, None)?;

        let subject = match user {
            Some(user) => user.clone(),
            None => AuthenticatedUser {
                id: payload.sub.clone(),
                email: String::new(),
                roles: Vec::new(),
                mfa_enrolled: metadata.mfa,
                mfa_secret: None,
            },
        };

        let pair = self.issue_token_pair(
            &subject,
            IssueInput {
                scopes: payload.scope,
                session_id: Some(metadata.session.clone()),
                mfa_code: if metadata.mfa {
                    mfa_code.map(str::to_owned)
                } else {
                    None
                },
                require_mfa: metadata.mfa,
            },
        )?;

        self.record_audit(
            "auth.session_refreshed",
            Some(&subject),
            Severity::Info,
            json!({"session": metadata.session, "previous": metadata.jti}),
        )?;
        tracing::info!(
            session = %metadata.session,
            previous = %metadata.jti,
            "rotated refresh token"
        );

        Ok(pair)
    }

    /// Decode and type-check an access token. No ledger lookup: access
    /// tokens are not individually revocable before natural expiry.
    pub fn verify_access_token(&self, token: &str) -> AuthResult<TokenPayload> {
        let payload = self.codec.decode(token, None)?;
        if payload.kind != TokenKind::Access {
            return Err(AuthError::TokenDecoding("token is not an access token".into()));
        }
        Ok(payload)
    }

    /// Revoke every live refresh token in `session`; returns the
    /// count. A non-zero revocation raises a medium-severity security
    /// event.
    pub fn revoke_session(&self, session: &str) -> AuthResult<usize> {
        let revoked = self.ledger.revoke_by_session(session);
        if revoked > 0 {
            self.monitor.record_event(
                "auth.session_revoked",
                Severity::Medium,
                json!({"session": session, "revoked": revoked}),
            )?;
            tracing::info!(session = %session, revoked, "revoked session");
        }
        Ok(revoked)
    }

    /// Generate a fresh TOTP secret for `user`. The caller persists
    /// it; the core keeps nothing beyond this call.
    pub fn enroll_mfa_secret(&self, user: &AuthenticatedUser) -> AuthResult<MfaEnrollment> {
        let secret = self.verifier.generate_secret(DEFAULT_SECRET_BYTES)?;
        self.record_audit(
            "auth.mfa_enrolled",
            Some(user),
            Severity::Low,
            json!({"secret": "generated"}),
        )?;
        Ok(MfaEnrollment {
            user_id: user.id.clone(),
            secret,
            issuer: self.config.totp_issuer.clone(),
            label: user.email.clone(),
        })
    }

    /// Drop expired ledger entries; used by the maintenance loop.
    pub fn prune_refresh_tokens(&self) -> usize {
        self.ledger.prune()
    }

    /// MFA gate. Returns whether MFA was verified for this issuance.
    fn ensure_mfa(
        &self,
        user: &AuthenticatedUser,
        mfa_code: Option<&str>,
        required: bool,
    ) -> AuthResult<bool> {
        if !(required || user.mfa_enrolled) {
            return Ok(false);
        }
        let secret = user.mfa_secret.as_deref().ok_or_else(|| {
            AuthError::MfaRequired("user does not have an MFA secret configured".into())
        })?;
        let valid = match mfa_code {
            Some(code) => self.verifier.verify(secret, code, MFA_VERIFY_WINDOW)?,
            None => false,
        };
        if !valid {
            self.record_audit(
                "auth.mfa_failure",
                Some(user),
                Severity::High,
                json!({"reason": "invalid_code"}),
            )?;
            return Err(AuthError::MfaRequired("missing or invalid MFA code".into()));
        }
        Ok(true)
    }

    fn record_audit(
        &self,
        event_type: &str,
        user: Option<&AuthenticatedUser>,
        severity: Severity,
        metadata: serde_json::Value,
    ) -> AuthResult<()> {
        self.audit.record(&AuditEvent::new(
            event_type,
            user.map(|u| u.id.clone()),
            user.map(|u| u.email.clone()).filter(|email| !email.is_empty()),
            severity,
            metadata,
        ))
    }
}

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}
