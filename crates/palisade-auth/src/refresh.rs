//! Thread-safe refresh token ledger.
//!
//! The ledger owns the lifecycle of [`StoredRefreshToken`] entries:
//! created on issuance, flagged revoked on logout/rotation/session
//! revoke, and removed by [`RefreshTokenLedger::prune`] once expired.
//! Raw tokens are never retained — only their SHA-256 digests.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use palisade_core::models::refresh::{RefreshTokenMetadata, StoredRefreshToken};

use crate::error::RefreshTokenError;

#[derive(Default)]
struct LedgerInner {
    /// Entries keyed by token ID. At most one record per ID.
    entries: HashMap<String, StoredRefreshToken>,
    /// Digest -> token ID index for direct raw-token lookup.
    by_digest: HashMap<String, String>,
}

/// In-memory registry mapping refresh-token digests to metadata.
///
/// Every operation takes one short, I/O-free critical section, so the
/// ledger can be shared across worker threads without further locking.
#[derive(Default)]
pub struct RefreshTokenLedger {
    inner: Mutex<LedgerInner>,
}

impl RefreshTokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// SHA-256 hex digest of a raw token — the only form ever stored.
    pub fn digest(raw_token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(raw_token.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Pure factory for the metadata of a new refresh token. The
    /// session defaults to the fresh token ID.
    pub fn new_metadata(
        user_id: &str,
        session: Option<&str>,
        scopes: Vec<String>,
        ttl: Duration,
        mfa: bool,
    ) -> RefreshTokenMetadata {
        let jti = Uuid::new_v4().simple().to_string();
        let issued_at = Utc::now();
        RefreshTokenMetadata {
            session: session.map(str::to_owned).unwrap_or_else(|| jti.clone()),
            jti,
            user_id: user_id.to_owned(),
            issued_at,
            expires_at: issued_at + ttl,
            scopes,
            mfa,
        }
    }

    /// Register a raw token under its metadata's token ID.
    /// Re-registering an ID replaces the previous record, preserving
    /// the one-record-per-ID invariant.
    pub fn register(&self, raw_token: &str, metadata: RefreshTokenMetadata) {
        let digest = Self::digest(raw_token);
        let mut inner = self.lock();
        if let Some(previous) = inner.entries.remove(&metadata.jti) {
            inner.by_digest.remove(&previous.digest);
        }
        inner.by_digest.insert(digest.clone(), metadata.jti.clone());
        inner.entries.insert(
            metadata.jti.clone(),
            StoredRefreshToken {
                digest,
                metadata,
                revoked: false,
            },
        );
    }

    /// Look up a raw token and check it is live. Never revokes —
    /// rotation-on-use is [`consume`](Self::consume).
    pub fn validate(
        &self,
        raw_token: &str,
        expected_session: Option<&str>,
    ) -> Result<RefreshTokenMetadata, RefreshTokenError> {
        let digest = Self::digest(raw_token);
        let inner = self.lock();
        Self::check(&inner, &digest, expected_session).map(|entry| entry.metadata.clone())
    }

    /// Validate and revoke in a single critical section. Of any number
    /// of concurrent consumers of the same raw token, exactly one
    /// succeeds; the rest observe [`RefreshTokenError::Revoked`].
    pub fn consume(
        &self,
        raw_token: &str,
        expected_session: Option<&str>,
    ) -> Result<RefreshTokenMetadata, RefreshTokenError> {
        let digest = Self::digest(raw_token);
        let mut inner = self.lock();
        let jti = Self::check(&inner, &digest, expected_session)?
            .metadata
            .jti
            .clone();
        let entry = inner
            .entries
            .get_mut(&jti)
            .ok_or(RefreshTokenError::Unknown)?;
        entry.revoked = true;
        Ok(entry.metadata.clone())
    }

    /// Revoke a token by ID. Idempotent — revoking an already-revoked
    /// or unknown ID changes nothing.
    pub fn revoke(&self, jti: &str) {
        let mut inner = self.lock();
        if let Some(entry) = inner.entries.get_mut(jti) {
            entry.revoked = true;
        }
    }

    /// Revoke every non-revoked token in `session`; returns how many
    /// were flipped.
    pub fn revoke_by_session(&self, session: &str) -> usize {
        let mut inner = self.lock();
        let mut revoked = 0;
        for entry in inner.entries.values_mut() {
            if entry.metadata.session == session && !entry.revoked {
                entry.revoked = true;
                revoked += 1;
            }
        }
        revoked
    }

    /// Remove all expired entries regardless of revoked state; returns
    /// how many were dropped.
    pub fn prune(&self) -> usize {
        let now = Utc::now();
        let mut inner = self.lock();
        let expired: Vec<String> = inner
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(jti, _)| jti.clone())
            .collect();
        for jti in &expired {
            if let Some(entry) = inner.entries.remove(jti) {
                inner.by_digest.remove(&entry.digest);
            }
        }
        expired.len()
    }

    /// Number of tracked entries, revoked included.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check<'a>(
        inner: &'a LedgerInner,
        digest: &str,
        expected_session: Option<&str>,
    ) -> Result<&'a StoredRefreshToken, RefreshTokenError> {
        let jti = inner
            .by_digest
            .get(digest)
            .ok_or(RefreshTokenError::Unknown)?;
        let entry = inner.entries.get(jti).ok_or(RefreshTokenError::Unknown)?;
        if entry.revoked {
            return Err(RefreshTokenError::Revoked);
        }
        if entry.is_expired(Utc::now()) {
            return Err(RefreshTokenError::Expired);
        }
        if let Some(expected) = expected_session {
            if entry.metadata.session != expected {
                return Err(RefreshTokenError::SessionMismatch);
            }
        }
        Ok(entry)
    }

    fn lock(&self) -> MutexGuard<'_, LedgerInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn live_metadata(session: &str) -> RefreshTokenMetadata {
        RefreshTokenLedger::new_metadata(
            "u1",
            Some(session),
            vec!["read".into()],
            Duration::hours(1),
            false,
        )
    }

    #[test]
    fn validate_succeeds_after_register() {
        let ledger = RefreshTokenLedger::new();
        ledger.register("raw-1", live_metadata("s1"));

        let metadata = ledger.validate("raw-1", None).unwrap();
        assert_eq!(metadata.user_id, "u1");
        assert_eq!(metadata.session, "s1");
    }

    #[test]
    fn unknown_token_fails() {
        let ledger = RefreshTokenLedger::new();
        assert_eq!(
            ledger.validate("never-seen", None).unwrap_err(),
            RefreshTokenError::Unknown
        );
    }

    #[test]
    fn validate_fails_after_revoke() {
        let ledger = RefreshTokenLedger::new();
        let metadata = live_metadata("s1");
        let jti = metadata.jti.clone();
        ledger.register("raw-1", metadata);

        ledger.revoke(&jti);
        assert_eq!(
            ledger.validate("raw-1", None).unwrap_err(),
            RefreshTokenError::Revoked
        );
    }

    #[test]
    fn revoke_is_idempotent() {
        let ledger = RefreshTokenLedger::new();
        let metadata = live_metadata("s1");
        let jti = metadata.jti.clone();
        ledger.register("raw-1", metadata);

        ledger.revoke(&jti);
        ledger.revoke(&jti);
        ledger.revoke("no-such-id");

        assert_eq!(
            ledger.validate("raw-1", None).unwrap_err(),
            RefreshTokenError::Revoked
        );
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn expired_entry_fails_with_expired_even_if_never_revoked() {
        let ledger = RefreshTokenLedger::new();
        let metadata = RefreshTokenLedger::new_metadata(
            "u1",
            Some("s1"),
            vec![],
            Duration::seconds(-10),
            false,
        );
        ledger.register("stale", metadata);

        assert_eq!(
            ledger.validate("stale", None).unwrap_err(),
            RefreshTokenError::Expired
        );
    }

    #[test]
    fn session_mismatch_fails() {
        let ledger = RefreshTokenLedger::new();
        ledger.register("raw-1", live_metadata("s1"));

        assert_eq!(
            ledger.validate("raw-1", Some("other")).unwrap_err(),
            RefreshTokenError::SessionMismatch
        );
        assert!(ledger.validate("raw-1", Some("s1")).is_ok());
    }

    #[test]
    fn revoke_by_session_counts_and_isolates() {
        let ledger = RefreshTokenLedger::new();
        ledger.register("a", live_metadata("s1"));
        ledger.register("b", live_metadata("s1"));
        ledger.register("c", live_metadata("s2"));

        assert_eq!(ledger.revoke_by_session("s1"), 2);
        assert!(ledger.validate("a", None).is_err());
        assert!(ledger.validate("b", None).is_err());
        assert!(ledger.validate("c", None).is_ok());

        // Already-revoked entries are not recounted.
        assert_eq!(ledger.revoke_by_session("s1"), 0);
    }

    #[test]
    fn prune_drops_expired_regardless_of_revocation() {
        let ledger = RefreshTokenLedger::new();
        let stale = RefreshTokenLedger::new_metadata(
            "u1",
            Some("s1"),
            vec![],
            Duration::seconds(-10),
            false,
        );
        let stale_jti = stale.jti.clone();
        ledger.register("stale", stale);
        ledger.revoke(&stale_jti);
        ledger.register(
            "stale-2",
            RefreshTokenLedger::new_metadata("u1", None, vec![], Duration::seconds(-10), false),
        );
        ledger.register("live", live_metadata("s1"));

        assert_eq!(ledger.prune(), 2);
        assert_eq!(ledger.len(), 1);
        assert!(ledger.validate("live", None).is_ok());
        assert_eq!(
            ledger.validate("stale", None).unwrap_err(),
            RefreshTokenError::Unknown
        );
    }

    #[test]
    fn session_defaults_to_token_id() {
        let metadata =
            RefreshTokenLedger::new_metadata("u1", None, vec![], Duration::hours(1), false);
        assert_eq!(metadata.session, metadata.jti);
    }

    #[test]
    fn exactly_one_concurrent_consume_succeeds() {
        let ledger = Arc::new(RefreshTokenLedger::new());
        ledger.register("contested", live_metadata("s1"));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let ledger = Arc::clone(&ledger);
                std::thread::spawn(move || ledger.consume("contested", None).is_ok())
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }
}
