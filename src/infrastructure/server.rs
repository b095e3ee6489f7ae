//! HTTP server assembly

use axum::extract::Request;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::infrastructure::AppState;

/// Build the full router: `/api` routes plus tracing, timeout and CORS layers
pub fn build_router(state: AppState) -> Router {
    let request_timeout = state.config.request_timeout;
    let cors = cors_layer(&state.config.cors_allowed_origins);
    let api_router = api::api_router(state);

    Router::new()
        .nest("/api", api_router)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(middleware::from_fn(timeout_envelope))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// `TimeoutLayer` answers with an empty 408; give it the usual error body.
async fn timeout_envelope(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    if response.status() != StatusCode::REQUEST_TIMEOUT {
        return response;
    }

    tracing::warn!("Request timed out");
    (
        StatusCode::REQUEST_TIMEOUT,
        Json(json!({ "success": false, "message": "Request timed out" })),
    )
        .into_response()
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers(Any);

    if origins.is_empty() {
        return base.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", o);
                None
            }
        })
        .collect();
    base.allow_origin(allowed)
}
