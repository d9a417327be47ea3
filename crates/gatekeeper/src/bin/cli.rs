use anyhow::Context;
use chrono::{TimeZone, Utc};
use clap::{Parser, Subcommand};
use reqwest::Client;
use shared_types::{CheckStatusRequest, CheckStatusResponse, ErrorResponse};

use gatekeeper::auth::jwt::{recover_identity, TokenKeys};

#[derive(Parser)]
#[command(name = "gatekeeper-cli")]
#[command(about = "CLI for checking and inspecting gatekeeper decision tokens")]
#[command(
    long_about = "A command-line interface for the gatekeeper service.\n\n\
    Can ask a running server where a token would be routed, or verify a token\n\
    locally with the service secret to see the decision it carries."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a running server where a token would be routed
    ///
    /// Sends the token to /check_status and prints the destination URL,
    /// plus the new token if the server minted one.
    Check {
        /// The token to evaluate. Omit to see the no-token destination.
        #[arg(short, long, value_name = "TOKEN")]
        token: Option<String>,

        /// Gatekeeper server URL to connect to.
        #[arg(
            short,
            long,
            default_value = "http://localhost:7860",
            env = "GATEKEEPER_URL"
        )]
        base_url: String,
    },

    /// Verify a token locally and print what it carries
    ///
    /// Trusted tokens show their decision flags and expiry. Untrusted tokens
    /// show why verification failed and which identity, if any, the server
    /// would check against the allowlist.
    Inspect {
        /// The token to inspect.
        #[arg(value_name = "TOKEN")]
        token: String,

        /// Secret the server signs decision tokens with.
        #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
        secret: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { token, base_url } => check(&base_url, token).await?,
        Commands::Inspect { token, secret } => inspect(&token, &secret)?,
    }

    Ok(())
}

async fn check(base_url: &str, token: Option<String>) -> anyhow::Result<()> {
    let url = format!("{}/check_status", base_url.trim_end_matches('/'));
    let response = Client::new()
        .post(&url)
        .json(&CheckStatusRequest { token })
        .send()
        .await
        .with_context(|| format!("Failed to reach {}", url))?;

    let status = response.status();
    if !status.is_success() {
        let err: ErrorResponse = response
            .json()
            .await
            .context("Failed to parse error response")?;
        anyhow::bail!(
            "Server returned {}: {}{}",
            status,
            err.error,
            err.details.map(|d| format!(" ({})", d)).unwrap_or_default()
        );
    }

    let body: CheckStatusResponse = response.json().await.context("Failed to parse response")?;
    println!("Destination: {}", body.url);
    if let Some(token) = body.token {
        println!("New token:   {}", token);
    }

    Ok(())
}

fn inspect(token: &str, secret: &str) -> anyhow::Result<()> {
    let keys = TokenKeys::new(secret)?;

    match keys.verify(token) {
        Ok(claims) => {
            println!("✓ Verified decision token");
            println!("    authenticated: {}", claims.authenticated);
            println!("    valid:         {}", claims.valid);
            println!("    outcome:       {}", claims.outcome());
            if let Some(exp) = Utc.timestamp_opt(claims.exp, 0).single() {
                println!("    expires:       {}", exp.to_rfc3339());
            }
        }
        Err(failure) => {
            println!("✗ Not trusted: {}", failure);
            match recover_identity(token) {
                Some(email) => println!("    identity: {} (would be checked against allowlist)", email),
                None => println!("    no identity recoverable (would route to login)"),
            }
        }
    }

    Ok(())
}
