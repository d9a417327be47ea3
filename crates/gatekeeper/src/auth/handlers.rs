//! Status check HTTP handler.

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use shared_types::{CheckStatusRequest, CheckStatusResponse};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

use super::extract::{build_auth_cookie, token_from_headers};

/// Decide where the caller should go.
///
/// The token is read from the JSON body, then the auth cookie, then the
/// `Authorization` header. When a new token is minted it is returned in the
/// body and set as the auth cookie.
pub async fn check_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Option<Json<CheckStatusRequest>>,
) -> ApiResult<Response> {
    let config = &state.config;

    let token = body
        .and_then(|Json(req)| req.token)
        .filter(|t| !t.trim().is_empty())
        .or_else(|| token_from_headers(&headers, &config.cookie_name));

    let decision = state.decisions.decide(token.as_deref()).await?;
    let url = config.destinations.url_for(decision.outcome).to_string();

    tracing::debug!("Redirecting to: {}", url);

    let Some(issued) = decision.issued else {
        return Ok(Json(CheckStatusResponse { url, token: None }).into_response());
    };

    let cookie = build_auth_cookie(&config.cookie_name, &issued.token);
    let cookie = HeaderValue::from_str(&cookie)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Invalid cookie header: {}", e)))?;

    let mut response = Json(CheckStatusResponse {
        url,
        token: Some(issued.token),
    })
    .into_response();
    response.headers_mut().insert(header::SET_COOKIE, cookie);

    Ok(response)
}
