//! Token extraction from requests and the decision cookie.

use axum::http::{header, HeaderMap};
use cookie::{time::Duration, Cookie, SameSite};

use super::jwt::TOKEN_LIFETIME_HOURS;

/// Find a token in the named cookie, falling back to an `Authorization: Bearer` header.
pub fn token_from_headers(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    extract_token_from_cookie(headers, cookie_name).or_else(|| extract_token_from_header(headers))
}

fn extract_token_from_cookie(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    for value in headers.get_all(header::COOKIE) {
        let Ok(cookie_header) = value.to_str() else {
            continue;
        };
        for cookie_str in cookie_header.split(';') {
            if let Ok(cookie) = Cookie::parse(cookie_str.trim()) {
                if cookie.name() == cookie_name && !cookie.value().is_empty() {
                    return Some(cookie.value().to_string());
                }
            }
        }
    }

    None
}

fn extract_token_from_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Build the `Set-Cookie` value carrying a freshly minted token.
///
/// Scripts cannot read it, it is only sent over HTTPS and never cross-site,
/// and it lives exactly as long as the token.
pub fn build_auth_cookie(name: &str, value: &str) -> String {
    Cookie::build((name.to_string(), value.to_string()))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Strict)
        .max_age(Duration::hours(TOKEN_LIFETIME_HOURS))
        .build()
        .to_string()
}
