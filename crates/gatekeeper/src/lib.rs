//! Gatekeeper: routes bearer-token holders to the app, the waitlist, or login.

use std::sync::Arc;

pub mod allowlist;
pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod services;

use crate::auth::jwt::TokenKeys;
use crate::config::GatekeeperConfig;
use crate::services::DecisionService;

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatekeeperConfig>,
    pub decisions: DecisionService,
}

impl AppState {
    /// Build signing keys and the allowlist backend from configuration.
    ///
    /// Fails if the secret cannot sign and verify a probe token.
    pub fn from_config(config: GatekeeperConfig) -> anyhow::Result<Self> {
        let keys = TokenKeys::new(&config.jwt_secret)?;
        let allowlist = allowlist::from_config(&config)?;

        Ok(Self {
            config: Arc::new(config),
            decisions: DecisionService::new(keys, allowlist),
        })
    }
}
