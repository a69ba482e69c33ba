pub mod middleware;
pub mod protocol;
pub mod rest;
pub mod state;

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

pub use middleware::require_user;
pub use rest::ApiDoc;
pub use state::AppState;

/// Builds the API router. CORS and Swagger UI are layered on by the binary.
pub fn router(app_state: Arc<AppState>) -> Router {
    // Public routes (no user required)
    let public_routes = Router::new()
        .route("/health", get(rest::health_handler))
        .route("/weather/score", post(rest::score_handler));

    // Routes scoped to one user's journal
    let user_routes = Router::new()
        .route(
            "/entries",
            get(rest::list_entries_handler).post(rest::create_entry_handler),
        )
        .route("/entries/{date}", put(rest::put_entry_handler))
        .route("/patterns", get(rest::list_patterns_handler))
        .route(
            "/patterns/observations",
            post(rest::record_observation_handler),
        )
        .route("/weather/prediction", get(rest::prediction_handler))
        .route("/insights", get(rest::insights_handler))
        .layer(axum_middleware::from_fn(require_user));

    Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .with_state(app_state)
}
