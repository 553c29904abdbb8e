//! HTTP facade.
//!
//! [`build_app_router`] is shared by the binary and the integration tests
//! so both run the same middleware stack.

use std::any::Any;
use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderName, Response, StatusCode, header};
use axum::routing::{get, post};
use bytes::Bytes;
use http_body_util::Full;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::render::DeckService;

pub mod auth;
pub mod error;
pub mod handlers;

pub use error::{ApiError, ApiResult};

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Shared handler state. Cheap to clone.
#[derive(Debug, Clone)]
pub struct AppState {
    pub service: DeckService,
    /// Required on rendering routes when set.
    pub secret: Option<Arc<str>>,
}

impl AppState {
    pub fn new(service: DeckService, secret: Option<String>) -> Self {
        Self {
            service,
            secret: secret.filter(|s| !s.is_empty()).map(Arc::from),
        }
    }
}

/// Build the application router with its middleware.
///
/// Layers, outermost first: request id assignment, tracing, request id
/// propagation, panic recovery.
pub fn build_app_router(state: AppState) -> Router {
    let request_id_header = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .route("/", get(handlers::health))
        .route("/health", get(handlers::health))
        .route("/templates", get(handlers::templates))
        .route("/generate", post(handlers::generate))
        .route("/generate_multi", post(handlers::generate_multi))
        .method_not_allowed_fallback(handlers::method_not_allowed)
        .fallback(handlers::not_found)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .with_state(state)
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response<Full<Bytes>> {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = detail, "handler panicked");

    let body = serde_json::json!({ "error": error::RENDER_FAILURE }).to_string();
    let mut response = Response::new(Full::from(body));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("application/json"),
    );
    response
}
