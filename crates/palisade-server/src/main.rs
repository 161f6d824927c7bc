//! Palisade server — application entry point.
//!
//! Boots the authentication service from environment configuration and
//! runs the periodic refresh-token maintenance loop. The embedding
//! transport layers (REST, gRPC) mount on top of this process.

use std::time::Duration;

use tracing_subscriber::EnvFilter;

use palisade_auth::config::AuthConfig;
use palisade_auth::service::AuthService;

/// How often expired refresh tokens are swept from the ledger.
const PRUNE_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("palisade_auth=info".parse().unwrap())
                .add_directive("palisade_server=info".parse().unwrap()),
        )
        .json()
        .init();

    tracing::info!("starting palisade server");

    let config = match config_from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "invalid configuration");
            std::process::exit(1);
        }
    };

    let service = match AuthService::new(config) {
        Ok(service) => service,
        Err(err) => {
            tracing::error!(error = %err, "failed to start authentication service");
            std::process::exit(1);
        }
    };

    let mut interval = tokio::time::interval(PRUNE_INTERVAL);
    loop {
        interval.tick().await;
        let pruned = service.prune_refresh_tokens();
        if pruned > 0 {
            tracing::info!(pruned, "pruned expired refresh tokens");
        }
    }
}

/// Build the service configuration from `PALISADE_*` environment
/// variables, falling back to defaults. `PALISADE_JWT_SECRET` is
/// mandatory.
fn config_from_env() -> Result<AuthConfig, String> {
    let mut config = AuthConfig {
        jwt_secret_key: std::env::var("PALISADE_JWT_SECRET")
            .map_err(|_| "PALISADE_JWT_SECRET must be set".to_string())?,
        ..AuthConfig::default()
    };

    if let Ok(issuer) = std::env::var("PALISADE_JWT_ISSUER") {
        config.jwt_issuer = Some(issuer);
    }
    if let Ok(path) = std::env::var("PALISADE_AUDIT_LOG") {
        config.audit_log_path = path.into();
    }
    if let Ok(path) = std::env::var("PALISADE_ALERT_LOG") {
        config.security_alert_log_path = path.into();
    }
    if let Ok(ttl) = std::env::var("PALISADE_ACCESS_TTL_SECS") {
        config.access_token_ttl_secs = ttl
            .parse()
            .map_err(|_| format!("PALISADE_ACCESS_TTL_SECS is not a number: {ttl}"))?;
    }
    if let Ok(ttl) = std::env::var("PALISADE_REFRESH_TTL_SECS") {
        config.refresh_token_ttl_secs = ttl
            .parse()
            .map_err(|_| format!("PALISADE_REFRESH_TTL_SECS is not a number: {ttl}"))?;
    }

    Ok(config)
}
