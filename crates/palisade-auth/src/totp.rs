//! RFC 6238 time-based one-time password generation and verification.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::RngCore;
use subtle::ConstantTimeEq;
use totp_rs::{Algorithm, Secret, TOTP};

use palisade_core::models::user::MfaEnrollment;

use crate::error::{AuthError, AuthResult};

/// Minimum secret length in bytes (RFC 4226 requires at least 128 bits).
const MIN_SECRET_BYTES: usize = 16;

/// Default secret length in bytes (160 bits, the RFC 6238
/// recommendation for SHA-1).
pub const DEFAULT_SECRET_BYTES: usize = 20;

/// Time-windowed one-time code generator and verifier.
pub struct TotpVerifier {
    digits: usize,
    interval: u64,
}

impl TotpVerifier {
    /// Construction fails unless `digits` is 6, 7, or 8.
    pub fn new(digits: usize, interval: u64) -> AuthResult<Self> {
        if !(6..=8).contains(&digits) {
            return Err(AuthError::Config(format!(
                "TOTP digits must be 6, 7 or 8, got {digits}"
            )));
        }
        if interval == 0 {
            return Err(AuthError::Config("TOTP interval must be non-zero".into()));
        }
        Ok(Self { digits, interval })
    }

    pub fn digits(&self) -> usize {
        self.digits
    }

    pub fn interval(&self) -> u64 {
        self.interval
    }

    /// Generate a random Base32-encoded secret of `length` bytes.
    pub fn generate_secret(&self, length: usize) -> AuthResult<String> {
        if length < MIN_SECRET_BYTES {
            return Err(AuthError::Crypto(format!(
                "TOTP secret must be at least {MIN_SECRET_BYTES} bytes"
            )));
        }
        let mut bytes = vec![0u8; length];
        rand::rng().fill_bytes(&mut bytes);
        Ok(Secret::Raw(bytes).to_encoded().to_string())
    }

    fn totp(&self, secret: &str) -> AuthResult<TOTP> {
        let secret_bytes = Secret::Encoded(normalize_secret(secret))
            .to_bytes()
            .map_err(|e| AuthError::Crypto(format!("bad TOTP secret: {e:?}")))?;
        TOTP::new(
            Algorithm::SHA1, // RFC 6238 default
            self.digits,
            1,
            self.interval,
            secret_bytes,
            None,
            String::new(),
        )
        .map_err(|e| AuthError::Crypto(format!("TOTP init: {e:?}")))
    }

    /// Generate the code for `secret` at Unix time `time`.
    pub fn generate_code(&self, secret: &str, time: u64) -> AuthResult<String> {
        Ok(self.totp(secret)?.generate(time))
    }

    /// Generate the code for the current time.
    pub fn generate_current(&self, secret: &str) -> AuthResult<String> {
        self.generate_code(secret, unix_now())
    }

    /// Verify `code` allowing +/- `window` intervals around `time`.
    ///
    /// Codes failing the length/format check are rejected before any
    /// HMAC is computed. Comparison against candidate codes is
    /// constant-time.
    pub fn verify_at(
        &self,
        secret: &str,
        code: &str,
        window: u64,
        time: u64,
    ) -> AuthResult<bool> {
        if code.len() != self.digits || !code.bytes().all(|b| b.is_ascii_digit()) {
            return Ok(false);
        }
        let totp = self.totp(secret)?;
        let counter = time / self.interval;
        let mut matched = false;
        for step in counter.saturating_sub(window)..=counter.saturating_add(window) {
            let expected = totp.generate(step * self.interval);
            matched |= bool::from(expected.as_bytes().ct_eq(code.as_bytes()));
        }
        Ok(matched)
    }

    /// Verify `code` against the current time.
    pub fn verify(&self, secret: &str, code: &str, window: u64) -> AuthResult<bool> {
        self.verify_at(secret, code, window, unix_now())
    }

    /// otpauth URI for QR-code provisioning. Pure formatting — no side
    /// effects, nothing is stored.
    pub fn provisioning_uri(&self, enrollment: &MfaEnrollment) -> String {
        let issuer = enrollment.issuer.replace(' ', "%20");
        let label = enrollment.label.replace(' ', "%20");
        format!(
            "otpauth://totp/{issuer}:{label}?secret={secret}&issuer={issuer}&period={period}&digits={digits}",
            secret = enrollment.secret,
            period = self.interval,
            digits = self.digits,
        )
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn normalize_secret(secret: &str) -> String {
    secret.trim().trim_end_matches('=').to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// RFC 6238 appendix B SHA-1 test secret ("12345678901234567890").
    const RFC_SECRET: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

    #[test]
    fn rejects_bad_digit_counts() {
        assert!(TotpVerifier::new(5, 30).is_err());
        assert!(TotpVerifier::new(9, 30).is_err());
        for digits in 6..=8 {
            assert!(TotpVerifier::new(digits, 30).is_ok());
        }
    }

    #[test]
    fn matches_rfc6238_test_vectors() {
        let verifier = TotpVerifier::new(8, 30).unwrap();
        assert_eq!(verifier.generate_code(RFC_SECRET, 59).unwrap(), "94287082");
        assert_eq!(
            verifier.generate_code(RFC_SECRET, 1_111_111_109).unwrap(),
            "07081804"
        );
        assert_eq!(
            verifier.generate_code(RFC_SECRET, 1_234_567_890).unwrap(),
            "89005924"
        );
    }

    #[test]
    fn generated_code_verifies_at_same_time() {
        let verifier = TotpVerifier::new(6, 30).unwrap();
        let secret = verifier.generate_secret(DEFAULT_SECRET_BYTES).unwrap();
        let t = 1_700_000_000;
        let code = verifier.generate_code(&secret, t).unwrap();
        assert!(verifier.verify_at(&secret, &code, 1, t).unwrap());
    }

    #[test]
    fn window_admits_adjacent_interval_only() {
        let verifier = TotpVerifier::new(6, 30).unwrap();
        let secret = verifier.generate_secret(DEFAULT_SECRET_BYTES).unwrap();
        let t = 1_700_000_000;
        let previous = verifier.generate_code(&secret, t - 30).unwrap();
        assert!(verifier.verify_at(&secret, &previous, 1, t).unwrap());
        assert!(!verifier.verify_at(&secret, &previous, 0, t).unwrap());
    }

    #[test]
    fn malformed_codes_rejected_without_hmac() {
        let verifier = TotpVerifier::new(6, 30).unwrap();
        // Deliberately invalid secret: a format-rejected code must not
        // even reach secret parsing.
        assert!(!verifier.verify_at("%%%", "12345", 1, 0).unwrap());
        assert!(!verifier.verify_at("%%%", "abcdef", 1, 0).unwrap());
        assert!(!verifier.verify_at("%%%", "1234567", 1, 0).unwrap());
    }

    #[test]
    fn wrong_code_fails() {
        let verifier = TotpVerifier::new(6, 30).unwrap();
        let secret = verifier.generate_secret(DEFAULT_SECRET_BYTES).unwrap();
        let t = 1_700_000_000;
        let code = verifier.generate_code(&secret, t).unwrap();
        let wrong = if code == "000000" { "000001" } else { "000000" };
        assert!(!verifier.verify_at(&secret, wrong, 1, t).unwrap());
    }

    #[test]
    fn short_secret_rejected() {
        let verifier = TotpVerifier::new(6, 30).unwrap();
        assert!(verifier.generate_secret(8).is_err());
    }

    #[test]
    fn secrets_are_unique_base32() {
        let verifier = TotpVerifier::new(6, 30).unwrap();
        let a = verifier.generate_secret(DEFAULT_SECRET_BYTES).unwrap();
        let b = verifier.generate_secret(DEFAULT_SECRET_BYTES).unwrap();
        assert_ne!(a, b);
        assert!(a
            .chars()
            .all(|c| c.is_ascii_uppercase() || ('2'..='7').contains(&c)));
    }

    #[test]
    fn provisioning_uri_layout() {
        let verifier = TotpVerifier::new(6, 30).unwrap();
        let enrollment = MfaEnrollment {
            user_id: "u1".into(),
            secret: RFC_SECRET.into(),
            issuer: "Palisade Dev".into(),
            label: "alice@example.com".into(),
        };
        let uri = verifier.provisioning_uri(&enrollment);
        assert!(uri.starts_with("otpauth://totp/Palisade%20Dev:alice@example.com?"));
        assert!(uri.contains(&format!("secret={RFC_SECRET}")));
        assert!(uri.contains("issuer=Palisade%20Dev"));
        assert!(uri.contains("period=30"));
        assert!(uri.contains("digits=6"));
    }
}
