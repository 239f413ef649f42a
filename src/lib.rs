pub mod auth;
pub mod config;
pub mod database;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod storage;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use handlers::AppState;

pub fn create_app(state: AppState) -> Router {
    let usage_routes = Router::new()
        .route(
            "/usage",
            get(handlers::usage::get_usage)
                .post(handlers::usage::provision_usage)
                .delete(handlers::usage::delete_usage),
        )
        .route("/usage/check", post(handlers::usage::check_request))
        .route("/usage/requests", post(handlers::usage::record_request))
        .route("/usage/purchase", post(handlers::usage::apply_purchase));

    Router::new()
        .route("/health/live", get(handlers::health::liveness))
        .route("/health/ready", get(handlers::health::readiness))
        .route("/metrics", get(handlers::metrics::metrics_handler))
        .nest("/api/v1", usage_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum_middleware::from_fn_with_state(
                    state.clone(),
                    middleware::metrics::metrics_middleware,
                )),
        )
        .with_state(state)
}
