use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::AppState;

/// Releases every capability's inference memory once the handler has produced its response.
pub async fn reclaim_after_response(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;
    state.pipeline.reclaim_all().await;
    response
}
