use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use super::frontend;
use super::v1;
use super::AppState;

/// Claims are at most 2000 characters; anything near this is not a claim.
const MAX_BODY_BYTES: usize = 64 * 1024;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let v1 = v1::router::v1_router(state.clone());
    let mut router = Router::new().nest("/api/v1", v1);

    // The browser form cannot send a bearer token, so it only exists on open
    // deployments.
    if state.config.server.api_keys.is_empty() {
        router = router.route(
            "/",
            get(frontend::claim_page).post(frontend::submit_claim),
        );
    }

    router
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
