//! JWT token creation, verification, and identity recovery.

use anyhow::{bail, Context};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use super::types::{DecisionClaims, IdentityClaims, IssuedToken, VerifyFailure};

/// Lifetime of every token minted by the service.
pub const TOKEN_LIFETIME_HOURS: i64 = 24;

/// The only algorithm accepted on the verified path.
const ALGORITHM: Algorithm = Algorithm::HS256;

/// Signing and verification keys derived from the service secret.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenKeys {
    /// Build keys from the secret and prove they can sign and verify.
    pub fn new(secret: &str) -> anyhow::Result<Self> {
        if secret.trim().is_empty() {
            bail!("JWT secret cannot be empty");
        }

        let mut validation = Validation::new(ALGORITHM);
        validation.validate_aud = false;

        let keys = Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        };

        let probe = keys
            .mint(false, false)
            .context("Failed to sign startup probe token")?;
        keys.verify(&probe.token)
            .context("Failed to verify startup probe token")?;

        Ok(keys)
    }

    /// Sign a new decision token valid for 24 hours from now.
    pub fn mint(
        &self,
        authenticated: bool,
        valid: bool,
    ) -> Result<IssuedToken, jsonwebtoken::errors::Error> {
        self.mint_at(authenticated, valid, Utc::now())
    }

    /// Sign a decision token as if issued at `issued_at`.
    pub fn mint_at(
        &self,
        authenticated: bool,
        valid: bool,
        issued_at: DateTime<Utc>,
    ) -> Result<IssuedToken, jsonwebtoken::errors::Error> {
        let exp = issued_at + Duration::hours(TOKEN_LIFETIME_HOURS);
        let claims = DecisionClaims {
            authenticated,
            valid,
            iat: issued_at.timestamp(),
            exp: exp.timestamp(),
        };

        let token = encode(&Header::new(ALGORITHM), &claims, &self.encoding)?;
        Ok(IssuedToken { token, claims })
    }

    /// Verify signature, algorithm and expiry, returning the trusted claims.
    pub fn verify(&self, token: &str) -> Result<DecisionClaims, VerifyFailure> {
        decode::<DecisionClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                let failure = VerifyFailure::from(&e);
                tracing::debug!(reason = %failure, error = %e, "Token failed verification");
                failure
            })
    }
}

/// Read the `email` claim from a structurally valid JWT without checking
/// its signature, algorithm or expiry.
///
/// Returns `None` when the token cannot be parsed or carries no usable email.
/// Nothing else from the unverified payload is exposed.
pub fn recover_identity(token: &str) -> Option<String> {
    let mut validation = Validation::new(ALGORITHM);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = match decode::<IdentityClaims>(token, &DecodingKey::from_secret(&[]), &validation)
    {
        Ok(data) => data,
        Err(e) => {
            tracing::debug!(error = %e, "Failed to decode identity from token");
            return None;
        }
    };

    let email = data.claims.email?.trim().to_string();
    if email.is_empty() {
        tracing::debug!("Token carries an empty email claim");
        return None;
    }

    Some(email)
}
