use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Form, Json,
};
use brief_core::{CapabilityKind, FailureKind};
use brief_scraper::Failure;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::error;

use crate::views::TemplateError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AnalyzeForm {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateForm {
    #[serde(default)]
    pub topic: String,
}

pub fn status_for(kind: FailureKind) -> StatusCode {
    match kind {
        FailureKind::InvalidUrl | FailureKind::EmptyTopic => StatusCode::BAD_REQUEST,
        FailureKind::NoContent => StatusCode::UNPROCESSABLE_ENTITY,
        FailureKind::FetchFailed => StatusCode::BAD_GATEWAY,
        FailureKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        FailureKind::InferenceError | FailureKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn html(status: StatusCode, rendered: Result<String, TemplateError>) -> Response {
    match rendered {
        Ok(body) => (status, Html(body)).into_response(),
        Err(e) => {
            error!("Failed to render view: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    }
}

fn failure_page(state: &AppState, failure: &Failure) -> Response {
    html(status_for(failure.kind), state.views.error(&failure.message))
}

pub async fn index(State(state): State<Arc<AppState>>) -> Response {
    html(StatusCode::OK, state.views.index())
}

pub async fn analyze(
    State(state): State<Arc<AppState>>,
    Form(form): Form<AnalyzeForm>,
) -> Response {
    match state.pipeline.summarize(&form.url).await {
        Ok(summary) => html(StatusCode::OK, state.views.analysis(&summary)),
        Err(failure) => failure_page(&state, &failure),
    }
}

pub async fn generate(
    State(state): State<Arc<AppState>>,
    Form(form): Form<GenerateForm>,
) -> Response {
    match state.pipeline.generate(&form.topic).await {
        Ok(post) => html(StatusCode::OK, state.views.post(&post)),
        Err(failure) => failure_page(&state, &failure),
    }
}

/// `{ "summarize": "loaded" | "unavailable", "generate": ... }`
pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let registry = state.pipeline.registry();
    let statuses: Map<String, Value> = CapabilityKind::ALL
        .into_iter()
        .map(|kind| {
            let status = if registry.status(kind).is_loaded() {
                "loaded"
            } else {
                "unavailable"
            };
            (kind.to_string(), Value::from(status))
        })
        .collect();

    Json(Value::Object(statuses))
}
