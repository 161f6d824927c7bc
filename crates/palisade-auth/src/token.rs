//! Signed claims-token encoding and decoding.

use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Deserializer, Serialize};

use palisade_core::models::token::{TokenKind, TokenPayload};

use crate::config::AuthConfig;
use crate::error::{AuthError, AuthResult};

/// Claims supplied by the caller. The registered time claims (`iat`,
/// `nbf`, `exp`) and the issuer are stamped by the codec on every
/// encode and cannot be overridden.
#[derive(Debug, Clone)]
pub struct ClaimsSpec {
    pub sub: String,
    pub jti: String,
    pub session: Option<String>,
    pub scope: Vec<String>,
    pub mfa: bool,
    pub kind: TokenKind,
}

/// Wire form of the claims set. `sub`, `jti`, `type` and the numeric
/// time claims are mandatory — a token missing any of them fails to
/// deserialize, which surfaces as a decoding error.
#[derive(Debug, Serialize, Deserialize)]
struct WireClaims {
    sub: String,
    jti: String,
    exp: i64,
    iat: i64,
    nbf: i64,
    #[serde(default, deserialize_with = "scope_string_or_list")]
    scope: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    session: Option<String>,
    #[serde(default)]
    mfa: bool,
    #[serde(rename = "type")]
    kind: TokenKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iss: Option<String>,
}

/// The `scope` claim may arrive as a single string or a list;
/// normalize both into a list.
fn scope_string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ScopeClaim {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<ScopeClaim>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(ScopeClaim::One(scope)) => vec![scope],
        Some(ScopeClaim::Many(scopes)) => scopes,
    })
}

/// JWT encoder/decoder over a shared HMAC secret.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    issuer: Option<String>,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // EncodingKey/DecodingKey hold secret material and do not implement Debug.
        f.debug_struct("TokenCodec")
            .field("algorithm", &self.algorithm)
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// Build a codec from the configured shared secret. Only
    /// HMAC-family algorithms are accepted for a symmetric key.
    pub fn new(config: &AuthConfig) -> AuthResult<Self> {
        let algorithm = Algorithm::from_str(&config.jwt_algorithm).map_err(|_| {
            AuthError::Config(format!("unknown JWT algorithm: {}", config.jwt_algorithm))
        })?;
        if !matches!(
            algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(AuthError::Config(format!(
                "JWT algorithm {} requires an asymmetric key",
                config.jwt_algorithm
            )));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret_key.as_bytes()),
            algorithm,
            issuer: config.jwt_issuer.clone(),
        })
    }

    /// Encode a signed token with `iat = nbf = now` and
    /// `exp = now + ttl`.
    pub fn encode(&self, claims: &ClaimsSpec, ttl: Duration) -> AuthResult<String> {
        let now = Utc::now();
        let wire = WireClaims {
            sub: claims.sub.clone(),
            jti: claims.jti.clone(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            scope: claims.scope.clone(),
            session: claims.session.clone(),
            mfa: claims.mfa,
            kind: claims.kind,
            iss: self.issuer.clone(),
        };

        jsonwebtoken::encode(&Header::new(self.algorithm), &wire, &self.encoding_key)
            .map_err(|e| AuthError::TokenEncoding(e.to_string()))
    }

    /// Decode and verify a token against "now".
    ///
    /// The `Validation` value is rebuilt on every call, so verification
    /// flags cannot be weakened from anywhere else in the process.
    /// Audience is validated only when `audience` is supplied and is
    /// explicitly disabled otherwise; issuer is validated whenever one
    /// is configured.
    pub fn decode(&self, token: &str, audience: Option<&[String]>) -> AuthResult<TokenPayload> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.validate_nbf = true;
        validation.set_required_spec_claims(&["exp", "nbf", "sub"]);
        match audience {
            Some(aud) => validation.set_audience(aud),
            None => validation.validate_aud = false,
        }
        if let Some(issuer) = &self.issuer {
            validation.set_issuer(&[issuer]);
        }

        let wire = jsonwebtoken::decode::<WireClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| AuthError::TokenDecoding(e.to_string()))?
            .claims;

        Ok(TokenPayload {
            sub: wire.sub,
            jti: wire.jti,
            exp: claim_timestamp(wire.exp, "exp")?,
            iat: claim_timestamp(wire.iat, "iat")?,
            nbf: claim_timestamp(wire.nbf, "nbf")?,
            scope: wire.scope,
            session: wire.session,
            mfa: wire.mfa,
            kind: wire.kind,
        })
    }
}

fn claim_timestamp(secs: i64, claim: &str) -> AuthResult<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(secs, 0)
        .ok_or_else(|| AuthError::TokenDecoding(format!("claim {claim} is out of range")))
}
