//! Routing decision service.
//!
//! Turns an optional bearer token into a destination. Tokens this service
//! signed are trusted as-is; anything else is only mined for an `email`
//! claim, which is checked against the allowlist and sealed into a new token.

use std::sync::Arc;

use shared_types::Outcome;
use thiserror::Error;

use crate::allowlist::{AllowlistLookup, LookupError};
use crate::auth::jwt::{self, TokenKeys};
use crate::auth::types::IssuedToken;

/// Result of evaluating a token
#[derive(Debug, Clone)]
pub struct Decision {
    pub outcome: Outcome,
    /// Present only when the allowlist was consulted
    pub issued: Option<IssuedToken>,
}

impl Decision {
    fn without_token(outcome: Outcome) -> Self {
        Self {
            outcome,
            issued: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum DecideError {
    /// The allowlist could not answer; the caller should retry later
    #[error("allowlist lookup failed: {0}")]
    Lookup(#[from] LookupError),

    #[error("failed to sign decision token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// Service for routing decisions
#[derive(Clone)]
pub struct DecisionService {
    keys: TokenKeys,
    allowlist: Arc<dyn AllowlistLookup>,
}

impl DecisionService {
    pub fn new(keys: TokenKeys, allowlist: Arc<dyn AllowlistLookup>) -> Self {
        Self { keys, allowlist }
    }

    pub fn keys(&self) -> &TokenKeys {
        &self.keys
    }

    /// Decide where the holder of `raw_token` should go.
    pub async fn decide(&self, raw_token: Option<&str>) -> Result<Decision, DecideError> {
        let token = match raw_token.map(str::trim).filter(|t| !t.is_empty()) {
            Some(t) => t,
            None => {
                tracing::debug!("No token provided, redirecting to login");
                return Ok(Decision::without_token(Outcome::Login));
            }
        };

        // Fast path: a token we signed already carries the decision.
        let failure = match self.keys.verify(token) {
            Ok(claims) => {
                let outcome = claims.outcome();
                tracing::debug!(
                    authenticated = claims.authenticated,
                    valid = claims.valid,
                    %outcome,
                    "Verified decision token"
                );
                return Ok(Decision::without_token(outcome));
            }
            Err(failure) => failure,
        };

        tracing::debug!(reason = %failure, "Token not verified, recovering identity");

        let email = match jwt::recover_identity(token) {
            Some(email) => email,
            None => {
                tracing::debug!("No identity in token, redirecting to login");
                return Ok(Decision::without_token(Outcome::Login));
            }
        };

        tracing::debug!(email = %email, "Checking identity against allowlist");
        let valid = self.allowlist.contains(&email).await.map_err(|e| {
            tracing::error!(backend = self.allowlist.name(), "Allowlist lookup failed: {}", e);
            e
        })?;

        let authenticated = true;
        let issued = self.keys.mint(authenticated, valid)?;
        let outcome = issued.claims.outcome();

        tracing::info!(%outcome, "Issued new decision token");
        Ok(Decision {
            outcome,
            issued: Some(issued),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allowlist::memory::MemoryAllowlist;
    use crate::auth::jwt::tests::{foreign_token, test_keys, TEST_SECRET};
    use chrono::{Duration, Utc};
    use jsonwebtoken::Algorithm;
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    const MEMBER: &str = "alice@example.com";
    const STRANGER: &str = "mallory@example.com";

    fn service() -> (DecisionService, Arc<MemoryAllowlist>) {
        let allowlist = Arc::new(MemoryAllowlist::new(&[MEMBER]));
        let service = DecisionService::new(test_keys(), allowlist.clone());
        (service, allowlist)
    }

    fn identity_token(email: &str) -> String {
        let exp = (Utc::now() + Duration::hours(1)).timestamp();
        foreign_token(
            json!({ "email": email, "aud": "authenticated", "exp": exp }),
            "identity-provider-secret",
            Algorithm::HS256,
        )
    }

    #[tokio::test]
    async fn test_no_token_goes_to_login() {
        let (service, allowlist) = service();

        for raw in [None, Some(""), Some("   ")] {
            let decision = assert_ok!(service.decide(raw).await);
            assert_eq!(decision.outcome, Outcome::Login);
            assert!(decision.issued.is_none());
        }
        assert_eq!(allowlist.calls(), 0);
    }

    #[tokio::test]
    async fn test_verified_tokens_follow_flags() {
        let (service, allowlist) = service();
        let cases = [
            (true, true, Outcome::App),
            (true, false, Outcome::Waitlist),
            (false, true, Outcome::Login),
            (false, false, Outcome::Login),
        ];

        for (authenticated, valid, expected) in cases {
            let issued = service.keys().mint(authenticated, valid).unwrap();
            let decision = assert_ok!(service.decide(Some(&issued.token)).await);
            assert_eq!(decision.outcome, expected);
            assert!(decision.issued.is_none());
        }
        assert_eq!(allowlist.calls(), 0);
    }

    #[tokio::test]
    async fn test_unverified_member_gets_app_and_new_token() {
        let (service, allowlist) = service();

        let decision = assert_ok!(service.decide(Some(&identity_token(MEMBER))).await);
        assert_eq!(decision.outcome, Outcome::App);
        assert_eq!(allowlist.calls(), 1);

        let issued = decision.issued.expect("should mint a token");
        let claims = service.keys().verify(&issued.token).expect("should verify");
        assert!(claims.authenticated);
        assert!(claims.valid);
    }

    #[tokio::test]
    async fn test_unverified_stranger_gets_waitlist() {
        let (service, allowlist) = service();

        let decision = assert_ok!(service.decide(Some(&identity_token(STRANGER))).await);
        assert_eq!(decision.outcome, Outcome::Waitlist);
        assert_eq!(allowlist.calls(), 1);

        let issued = decision.issued.expect("should mint a token");
        assert!(issued.claims.authenticated);
        assert!(!issued.claims.valid);
    }

    #[tokio::test]
    async fn test_wrong_algorithm_with_our_secret_is_rechecked() {
        let (service, allowlist) = service();
        let exp = (Utc::now() + Duration::hours(1)).timestamp();
        let token = foreign_token(
            json!({ "email": STRANGER, "authenticated": true, "valid": true, "exp": exp }),
            TEST_SECRET,
            Algorithm::HS384,
        );

        let decision = assert_ok!(service.decide(Some(&token)).await);
        assert_eq!(decision.outcome, Outcome::Waitlist);
        assert_eq!(allowlist.calls(), 1);
    }

    #[tokio::test]
    async fn test_forged_flags_without_identity_go_to_login() {
        let (service, allowlist) = service();
        let exp = (Utc::now() + Duration::hours(1)).timestamp();
        let token = foreign_token(
            json!({ "authenticated": true, "valid": true, "exp": exp }),
            "attacker-secret",
            Algorithm::HS256,
        );

        let decision = assert_ok!(service.decide(Some(&token)).await);
        assert_eq!(decision.outcome, Outcome::Login);
        assert!(decision.issued.is_none());
        assert_eq!(allowlist.calls(), 0);
    }

    #[tokio::test]
    async fn test_expired_decision_token_is_not_trusted() {
        let (service, allowlist) = service();
        let stale = service
            .keys()
            .mint_at(true, true, Utc::now() - Duration::hours(25))
            .unwrap();

        // Our own tokens carry no email, so recovery finds nothing.
        let decision = assert_ok!(service.decide(Some(&stale.token)).await);
        assert_eq!(decision.outcome, Outcome::Login);
        assert_eq!(allowlist.calls(), 0);
    }

    #[tokio::test]
    async fn test_expired_identity_token_is_rechecked() {
        let (service, allowlist) = service();
        let exp = (Utc::now() - Duration::hours(3)).timestamp();
        let token = foreign_token(json!({ "email": MEMBER, "exp": exp }), TEST_SECRET, Algorithm::HS256);

        let decision = assert_ok!(service.decide(Some(&token)).await);
        assert_eq!(decision.outcome, Outcome::App);
        assert!(decision.issued.is_some());
        assert_eq!(allowlist.calls(), 1);
    }

    #[tokio::test]
    async fn test_garbage_token_goes_to_login() {
        let (service, allowlist) = service();

        for raw in ["garbage", "a.b.c", "eyJhbGciOiJIUzI1NiJ9.e30"] {
            let decision = assert_ok!(service.decide(Some(raw)).await);
            assert_eq!(decision.outcome, Outcome::Login);
            assert!(decision.issued.is_none());
        }
        assert_eq!(allowlist.calls(), 0);
    }

    #[tokio::test]
    async fn test_minted_token_round_trips_without_lookup() {
        let (service, allowlist) = service();

        let first = assert_ok!(service.decide(Some(&identity_token(MEMBER))).await);
        let token = first.issued.expect("should mint a token").token;
        assert_eq!(allowlist.calls(), 1);

        let second = assert_ok!(service.decide(Some(&token)).await);
        assert_eq!(second.outcome, first.outcome);
        assert!(second.issued.is_none());
        assert_eq!(allowlist.calls(), 1);
    }

    #[tokio::test]
    async fn test_new_token_expires_in_24_hours() {
        let (service, _) = service();
        let now = Utc::now().timestamp();

        let decision = assert_ok!(service.decide(Some(&identity_token(STRANGER))).await);
        let claims = decision.issued.expect("should mint a token").claims;

        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
        assert!((claims.iat - now).abs() <= 5);
    }

    #[tokio::test]
    async fn test_lookup_failure_is_surfaced() {
        let (service, allowlist) = service();
        allowlist.set_failing(true);

        let err = assert_err!(service.decide(Some(&identity_token(MEMBER))).await);
        assert!(matches!(err, DecideError::Lookup(LookupError::Unavailable(_))));
        assert_eq!(allowlist.calls(), 1);
    }
}
