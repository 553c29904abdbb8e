#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use slidegen::ooxml::pptx::DeckSummary;
use slidegen::render::{DeckService, SlideAssets};
use slidegen::server::{AppState, build_app_router};
use slidegen::storage::{ArtifactPublisher, ImageFetcher, MemoryStore};

pub const CATALOG_BUCKET: &str = "anderson_images";
pub const PRESENTATIONS_BUCKET: &str = "presentations";
pub const PUBLIC_BASE_URL: &str = "https://storage.googleapis.com";

pub const LOGO_KEY: &str = "customer_logos/walmart-logo.png";
pub const BEFORE_KEY: &str = "project_images/before.png";
pub const AFTER_KEY: &str = "project_images/after.png";

/// Router plus the store it publishes into.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    // Header and badge images live here for the app's lifetime.
    _assets: TempDir,
}

impl TestApp {
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Read back the deck a success body points at.
    pub fn published_deck(&self, body: &Value) -> DeckSummary {
        let filename = body["filename"].as_str().expect("filename in body");
        let bytes = self
            .store
            .object(PRESENTATIONS_BUCKET, &format!("presentations/{filename}"))
            .expect("deck was published");
        DeckSummary::from_bytes(&bytes).expect("deck parses")
    }
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    image::RgbImage::from_pixel(width, height, image::Rgb([30, 90, 160]))
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

pub fn build_test_app() -> TestApp {
    build_test_app_with_secret(None)
}

/// An app over a seeded in-memory store, with header and badge assets.
pub fn build_test_app_with_secret(secret: Option<&str>) -> TestApp {
    let store = Arc::new(MemoryStore::new());
    store.insert(CATALOG_BUCKET, LOGO_KEY, png(200, 100));
    store.insert(CATALOG_BUCKET, BEFORE_KEY, png(300, 600));
    store.insert(CATALOG_BUCKET, AFTER_KEY, png(640, 480));

    let assets_dir = TempDir::new().unwrap();
    let header = assets_dir.path().join("header.png");
    let badge = assets_dir.path().join("badge.png");
    std::fs::write(&header, png(1333, 150)).unwrap();
    std::fs::write(&badge, png(400, 100)).unwrap();

    let service = DeckService::new(
        ImageFetcher::new(store.clone(), None),
        ArtifactPublisher::new(store.clone(), PRESENTATIONS_BUCKET, PUBLIC_BASE_URL),
        SlideAssets {
            header_image: Some(header),
            badge_image: Some(badge),
            ..Default::default()
        },
    );

    TestApp {
        router: build_app_router(AppState::new(service, secret.map(String::from))),
        store,
        _assets: assets_dir,
    }
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: &Value) -> Response<Body> {
    post_raw(app, uri, &body.to_string()).await
}

pub async fn post_raw(app: Router, uri: &str, body: &str) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
