//! Allowlist membership lookups.
//!
//! The decision engine only ever asks one question of the allowlist: is this
//! identity a member? Backends answer it through [`AllowlistLookup`], and must
//! report infrastructure trouble as a [`LookupError`] rather than as "no".

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{AllowlistConfig, GatekeeperConfig};

#[cfg(test)]
pub(crate) mod memory;
mod supabase;

pub use supabase::SupabaseAllowlist;

/// The allowlist could not give a definite answer.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("allowlist lookup timed out after {0:?}")]
    Timeout(Duration),

    #[error("allowlist service unreachable: {0}")]
    Unavailable(String),

    #[error("allowlist service returned status {0}")]
    Status(u16),

    #[error("allowlist service returned an unexpected body: {0}")]
    Decode(String),
}

#[async_trait]
pub trait AllowlistLookup: Send + Sync {
    /// Check whether `identity` is on the allowlist.
    async fn contains(&self, identity: &str) -> Result<bool, LookupError>;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}

/// Fixed in-process allowlist, compared case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct StaticAllowlist {
    emails: HashSet<String>,
}

impl StaticAllowlist {
    pub fn new<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            emails: emails
                .into_iter()
                .map(|s| s.as_ref().trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.emails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }
}

#[async_trait]
impl AllowlistLookup for StaticAllowlist {
    async fn contains(&self, identity: &str) -> Result<bool, LookupError> {
        Ok(self.emails.contains(&identity.trim().to_lowercase()))
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// Build the configured allowlist backend.
pub fn from_config(config: &GatekeeperConfig) -> anyhow::Result<Arc<dyn AllowlistLookup>> {
    let lookup: Arc<dyn AllowlistLookup> = match &config.allowlist {
        AllowlistConfig::Supabase {
            url,
            api_key,
            table,
        } => Arc::new(SupabaseAllowlist::new(
            url,
            api_key,
            table,
            config.lookup_timeout,
        )?),
        AllowlistConfig::Static { emails } => Arc::new(StaticAllowlist::new(emails)),
    };

    tracing::info!("Allowlist backend: {}", lookup.name());
    Ok(lookup)
}
