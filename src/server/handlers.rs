use axum::Json;
use axum::extract::State;
use bytes::Bytes;
use serde_json::{Value, json};

use super::AppState;
use super::auth::Authorized;
use super::error::{ApiError, ApiResult};
use crate::error::DeckError;
use crate::render::normalize::{normalize_multi, normalize_single};
use crate::render::{GenerateResponse, MultiSlideRequest, RenderJob, RenderOutcome, SlideRequest};

pub const SERVICE_NAME: &str = "slidegen";

/// Routes listed by the health document.
const ROUTES: [&str; 5] = [
    "GET /",
    "GET /health",
    "GET /templates",
    "POST /generate",
    "POST /generate_multi",
];

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "routes": ROUTES,
    }))
}

pub async fn templates(_auth: Authorized) -> Json<Value> {
    Json(json!({
        "templates": [
            {
                "name": "single slide",
                "route": "POST /generate",
                "fields": {
                    "title": "string, required",
                    "customer_name": "string, optional",
                    "logo_gcs_url": "gs:// or storage.googleapis.com URL, optional",
                    "logo_path": "local file path, optional",
                    "text_content": "string with one bullet per line, or array of lines",
                    "image_data": "array of {gcs_url, title?}",
                    "include_eqi": "boolean, default true; needs a logo",
                    "filename": "artifact file name, optional",
                },
            },
            {
                "name": "multi-slide",
                "route": "POST /generate_multi",
                "fields": {
                    "projects": "non-empty array of single slide bodies, sorted by customer_name",
                    "filename": "artifact file name, optional",
                },
            },
        ],
    }))
}

pub async fn generate(
    State(state): State<AppState>,
    _auth: Authorized,
    body: Bytes,
) -> ApiResult<Json<GenerateResponse>> {
    let request = SlideRequest::from_value(parse_json(&body)?)?;
    let job = normalize_single(&request)?;
    tracing::info!(
        title = %job.deck.projects()[0].title,
        images = job.deck.projects()[0].images.len(),
        "single-slide render requested"
    );

    let outcome = render_detached(&state, job).await?;
    Ok(Json(GenerateResponse {
        status: "success".to_string(),
        message: "Presentation generated successfully".to_string(),
        presentation_url: outcome.location.url,
        filename: outcome.filename,
        project_count: None,
    }))
}

pub async fn generate_multi(
    State(state): State<AppState>,
    _auth: Authorized,
    body: Bytes,
) -> ApiResult<Json<GenerateResponse>> {
    let request = MultiSlideRequest::from_value(parse_json(&body)?)?;
    let job = normalize_multi(&request)?;
    tracing::info!(projects = job.deck.projects().len(), "multi-slide render requested");

    let outcome = render_detached(&state, job).await?;
    Ok(Json(GenerateResponse {
        status: "success".to_string(),
        message: format!(
            "Multi-slide presentation with {} projects generated successfully",
            outcome.slide_count
        ),
        presentation_url: outcome.location.url,
        filename: outcome.filename,
        project_count: Some(outcome.slide_count),
    }))
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

fn parse_json(body: &[u8]) -> ApiResult<Value> {
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(format!("Invalid JSON: {e}")))
}

/// Run the render on its own task so a client hanging up does not cancel
/// an upload halfway.
async fn render_detached(state: &AppState, job: RenderJob) -> Result<RenderOutcome, DeckError> {
    let service = state.service.clone();
    tokio::spawn(async move { service.render(job).await }).await?
}
