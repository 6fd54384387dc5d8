//! # V1 API Key Authentication Middleware
//!
//! Protects the claim routes with Bearer token authentication against the
//! `NUTRICHECK_API_KEYS` list. Errors use the v1 `ApiResponse` envelope.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::api::state::AppState;

use super::response::{ApiResponse, ErrorCode};

/// Axum middleware that enforces Bearer token authentication for v1 routes.
///
/// - No keys configured → the request passes (open deployment).
/// - Missing or malformed `Authorization: Bearer <token>` header → 401.
/// - Token not in the configured list → 401.
pub async fn v1_auth_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let keys = &state.config.server.api_keys;
    if keys.is_empty() {
        return next.run(request).await;
    }

    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(h) => match h.strip_prefix("Bearer ") {
            Some(token) => token.trim(),
            None => {
                return ApiResponse::<()>::error(
                    ErrorCode::Unauthorized,
                    "Invalid authorization header format. Expected: Bearer <token>",
                )
                .into_response();
            }
        },
        None => {
            return ApiResponse::<()>::error(
                ErrorCode::Unauthorized,
                "Missing authorization header",
            )
            .into_response();
        }
    };

    if keys.iter().any(|k| k == token) {
        next.run(request).await
    } else {
        ApiResponse::<()>::error(ErrorCode::Unauthorized, "Invalid API key").into_response()
    }
}
