//! Allowlist backed by a Supabase (PostgREST) table.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;

use super::{AllowlistLookup, LookupError};

/// Client for querying the allowlist table over the PostgREST API
pub struct SupabaseAllowlist {
    client: Client,
    base_url: String,
    api_key: String,
    table: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct AllowlistRow {
    #[allow(dead_code)]
    email: String,
}

impl SupabaseAllowlist {
    pub fn new(
        base_url: &str,
        api_key: &str,
        table: &str,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        Url::parse(base_url).with_context(|| format!("Invalid Supabase URL: {}", base_url))?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build allowlist HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            table: table.to_string(),
            timeout,
        })
    }

    fn query_url(&self, identity: &str) -> String {
        format!(
            "{}/rest/v1/{}?select=email&email=eq.{}",
            self.base_url,
            urlencoding::encode(&self.table),
            urlencoding::encode(identity)
        )
    }

    fn transport_error(&self, err: reqwest::Error) -> LookupError {
        if err.is_timeout() {
            LookupError::Timeout(self.timeout)
        } else {
            LookupError::Unavailable(err.to_string())
        }
    }
}

#[async_trait]
impl AllowlistLookup for SupabaseAllowlist {
    async fn contains(&self, identity: &str) -> Result<bool, LookupError> {
        let response = self
            .client
            .get(self.query_url(identity))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Allowlist lookup failed: {} - {}", status, body);
            return Err(LookupError::Status(status.as_u16()));
        }

        let rows: Vec<AllowlistRow> = response.json().await.map_err(|e| {
            if e.is_timeout() {
                LookupError::Timeout(self.timeout)
            } else {
                LookupError::Decode(e.to_string())
            }
        })?;

        tracing::debug!("Allowlist returned {} matching rows", rows.len());
        Ok(!rows.is_empty())
    }

    fn name(&self) -> &'static str {
        "supabase"
    }
}
