use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::auth;
use crate::AppState;

/// Build the full application router.
pub fn build_router(state: AppState) -> Router {
    let cors = build_cors_layer(state.config.cors_allowed_origins.as_deref());
    let static_dir = state.config.static_dir.clone();

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/check_status", post(auth::check_status))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    // Serve the landing page if the directory exists
    if std::path::Path::new(&static_dir).exists() {
        tracing::info!("Serving landing page from {}", static_dir);
        let index_path = format!("{}/index.html", static_dir);
        let serve_dir = ServeDir::new(&static_dir).not_found_service(ServeFile::new(&index_path));
        app.fallback_service(serve_dir)
    } else {
        tracing::info!(
            "Static directory not found at {}, serving API only",
            static_dir
        );
        app
    }
}

async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// Build CORS layer from the configured origin list.
///
/// If no origins are configured, defaults to permissive CORS.
fn build_cors_layer(allowed_origins: Option<&[String]>) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .unwrap_or_default()
        .iter()
        .filter_map(|s| s.parse().ok())
        .collect();

    if origins.is_empty() {
        tracing::warn!(
            "CORS_ALLOWED_ORIGINS not set or empty, using permissive CORS (not recommended for production)"
        );
        return CorsLayer::permissive();
    }

    tracing::info!("CORS configured for origins: {:?}", origins);
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}
