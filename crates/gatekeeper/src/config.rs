//! Process configuration, loaded once at startup.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::Url;
use shared_types::Outcome;

const DEFAULT_APP_URL: &str = "https://www.app.com";
const DEFAULT_WAITLIST_URL: &str = "https://www.waitlist.com";
const DEFAULT_LOGIN_URL: &str = "https://www.login.com";
const DEFAULT_PORT: u16 = 7860;
const DEFAULT_TABLE: &str = "email_allowlist";
const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// The three fixed destinations a caller can be routed to.
#[derive(Debug, Clone)]
pub struct Destinations {
    pub app_url: String,
    pub waitlist_url: String,
    pub login_url: String,
}

impl Destinations {
    pub fn url_for(&self, outcome: Outcome) -> &str {
        match outcome {
            Outcome::App => &self.app_url,
            Outcome::Waitlist => &self.waitlist_url,
            Outcome::Login => &self.login_url,
        }
    }
}

impl Default for Destinations {
    fn default() -> Self {
        Self {
            app_url: DEFAULT_APP_URL.to_string(),
            waitlist_url: DEFAULT_WAITLIST_URL.to_string(),
            login_url: DEFAULT_LOGIN_URL.to_string(),
        }
    }
}

/// Which allowlist backend answers membership queries.
#[derive(Clone)]
pub enum AllowlistConfig {
    /// PostgREST table lookup against a Supabase project
    Supabase {
        url: String,
        api_key: String,
        table: String,
    },
    /// Fixed list of emails, compared case-insensitively
    Static { emails: Vec<String> },
}

#[derive(Clone)]
pub struct GatekeeperConfig {
    pub jwt_secret: String,
    pub destinations: Destinations,
    pub allowlist: AllowlistConfig,
    pub lookup_timeout: Duration,
    pub cookie_name: String,
    pub port: u16,
    pub cors_allowed_origins: Option<Vec<String>>,
    pub static_dir: String,
}

impl GatekeeperConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `JWT_SECRET`: Secret key for signing decision tokens
    /// - `SUPABASE_URL` / `SUPABASE_KEY`: when `ALLOWLIST_BACKEND=supabase` (the default)
    /// - `ALLOWED_EMAILS`: when `ALLOWLIST_BACKEND=static`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = get("JWT_SECRET").context("JWT_SECRET must be set")?;

        let backend = get("ALLOWLIST_BACKEND").unwrap_or_else(|| "supabase".to_string());
        let allowlist = match backend.trim().to_lowercase().as_str() {
            "supabase" => AllowlistConfig::Supabase {
                url: get("SUPABASE_URL").context("SUPABASE_URL must be set")?,
                api_key: get("SUPABASE_KEY").context("SUPABASE_KEY must be set")?,
                table: get("ALLOWLIST_TABLE").unwrap_or_else(|| DEFAULT_TABLE.to_string()),
            },
            "static" => AllowlistConfig::Static {
                emails: get("ALLOWED_EMAILS")
                    .context("ALLOWED_EMAILS must be set")?
                    .split(',')
                    .map(|s| s.trim().to_lowercase())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            other => bail!("Unknown ALLOWLIST_BACKEND '{}' (expected supabase or static)", other),
        };

        let lookup_timeout = match get("ALLOWLIST_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(
                raw.trim()
                    .parse()
                    .context("ALLOWLIST_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let defaults = Destinations::default();
        let destinations = Destinations {
            app_url: get("APP_URL").unwrap_or(defaults.app_url),
            waitlist_url: get("WAITLIST_URL").unwrap_or(defaults.waitlist_url),
            login_url: get("LOGIN_URL").unwrap_or(defaults.login_url),
        };

        let port = match get("PORT") {
            Some(raw) => raw.trim().parse().context("PORT must be a valid number")?,
            None => DEFAULT_PORT,
        };

        let cors_allowed_origins = get("CORS_ALLOWED_ORIGINS").map(|origins| {
            origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        });

        let config = Self {
            jwt_secret,
            destinations,
            allowlist,
            lookup_timeout,
            cookie_name: "auth_token".to_string(),
            port,
            cors_allowed_origins,
            static_dir: get("STATIC_DIR").unwrap_or_else(|| "static".to_string()),
        };
        config.validate()?;

        Ok(config)
    }

    /// Reject configurations the service cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.jwt_secret.trim().is_empty() {
            bail!("JWT_SECRET cannot be empty");
        }
        if self.lookup_timeout.is_zero() {
            bail!("ALLOWLIST_TIMEOUT_SECS must be greater than zero");
        }

        for (name, url) in [
            ("APP_URL", &self.destinations.app_url),
            ("WAITLIST_URL", &self.destinations.waitlist_url),
            ("LOGIN_URL", &self.destinations.login_url),
        ] {
            Url::parse(url).with_context(|| format!("{} is not a valid URL: {}", name, url))?;
        }

        match &self.allowlist {
            AllowlistConfig::Supabase { url, api_key, table } => {
                Url::parse(url)
                    .with_context(|| format!("SUPABASE_URL is not a valid URL: {}", url))?;
                if api_key.trim().is_empty() {
                    bail!("SUPABASE_KEY cannot be empty");
                }
                if table.trim().is_empty() {
                    bail!("ALLOWLIST_TABLE cannot be empty");
                }
            }
            AllowlistConfig::Static { emails } => {
                if emails.is_empty() {
                    bail!("ALLOWED_EMAILS cannot be empty");
                }
            }
        }

        Ok(())
    }
}
