//! Palisade Auth — bearer credential issuance, rotation, and
//! revocation, TOTP multi-factor enforcement, and a tamper-evident
//! audit trail feeding a security-alerting channel.

pub mod audit;
pub mod config;
pub mod error;
pub mod monitor;
pub mod password;
pub mod refresh;
pub mod roles;
pub mod service;
pub mod token;
pub mod totp;

pub use audit::AuditTrail;
pub use config::AuthConfig;
pub use error::{AuthError, AuthResult, RefreshTokenError};
pub use monitor::SecurityMonitor;
pub use refresh::RefreshTokenLedger;
pub use service::{AuthService, IssueInput};
pub use token::TokenCodec;
pub use totp::TotpVerifier;
