pub mod health;

use axum::{routing::get, Router};

use crate::analysis::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/analyze",
            get(handlers::handle_analyze_probe).post(handlers::handle_analyze),
        )
        .with_state(state)
}
