//! Token claim types and verification outcomes.

use serde::{Deserialize, Serialize};
use shared_types::Outcome;
use thiserror::Error;

/// Claims carried by a token this service minted.
///
/// Only trusted after signature verification. Missing flags read as `false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionClaims {
    /// An identity was recovered and checked against the allowlist
    #[serde(default)]
    pub authenticated: bool,
    /// The identity is on the allowlist
    #[serde(default)]
    pub valid: bool,
    /// Issued at timestamp
    #[serde(default)]
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
}

impl DecisionClaims {
    pub fn outcome(&self) -> Outcome {
        Outcome::from_flags(self.authenticated, self.valid)
    }
}

/// The single claim read from an unverified token.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct IdentityClaims {
    #[serde(default)]
    pub email: Option<String>,
}

/// A freshly signed token together with the claims it encodes.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: DecisionClaims,
}

/// Why a presented token could not be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VerifyFailure {
    #[error("signature does not match")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
    #[error("token is malformed")]
    Malformed,
    #[error("token uses an unaccepted algorithm")]
    WrongAlgorithm,
}

impl From<&jsonwebtoken::errors::Error> for VerifyFailure {
    fn from(err: &jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::InvalidSignature => VerifyFailure::InvalidSignature,
            ErrorKind::ExpiredSignature => VerifyFailure::Expired,
            ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidAlgorithmName
            | ErrorKind::MissingAlgorithm => VerifyFailure::WrongAlgorithm,
            _ => VerifyFailure::Malformed,
        }
    }
}
