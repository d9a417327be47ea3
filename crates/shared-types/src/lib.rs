use serde::{Deserialize, Serialize};

/// Where a caller should be sent after its token has been evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    App,
    Waitlist,
    Login,
}

impl Outcome {
    /// Map the decision flags carried by a token to a destination.
    pub fn from_flags(authenticated: bool, valid: bool) -> Self {
        match (authenticated, valid) {
            (true, true) => Outcome::App,
            (true, false) => Outcome::Waitlist,
            (false, _) => Outcome::Login,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::App => "APP",
            Outcome::Waitlist => "WAITLIST",
            Outcome::Login => "LOGIN",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Check Status API Types
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckStatusRequest {
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckStatusResponse {
    /// Destination URL for the caller
    pub url: String,
    /// Freshly minted token, present only when the allowlist was consulted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// API error response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, details: Option<String>) -> Self {
        Self {
            error: error.into(),
            details,
        }
    }
}
