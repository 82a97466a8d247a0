use std::sync::Arc;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use brief_core::config::ReclaimPolicy;
use tower_http::trace::TraceLayer;

pub mod handlers;
pub mod middleware;
pub mod state;
pub mod views;

pub use state::AppState;
pub use views::{TemplateError, Views};

pub fn create_app(state: AppState) -> Router {
    let state = Arc::new(state);

    let mut router = Router::new()
        .route("/", get(handlers::index))
        .route("/analyze", post(handlers::analyze))
        .route("/generate", post(handlers::generate))
        .route("/health", get(handlers::health));

    if state.pipeline.reclaim_policy() == ReclaimPolicy::AfterEveryResponse {
        router = router.layer(from_fn_with_state(
            state.clone(),
            middleware::reclaim_after_response,
        ));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

pub mod prelude {
    pub use crate::{create_app, AppState};
    pub use brief_core::{Error, Result};
}
