//! `DeckClient` against a real listener.

mod common;

use assert_matches::assert_matches;
use tokio::net::TcpListener;

use common::{build_test_app_with_secret, LOGO_KEY, PRESENTATIONS_BUCKET, CATALOG_BUCKET};
use slidegen::catalog::{CatalogImage, CatalogProject};
use slidegen::client::{ClientError, DeckClient};
use slidegen::{MultiSlideRequest, SlideRequest};

async fn serve(app: axum::Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn generate_round_trip() {
    let app = build_test_app_with_secret(Some("k"));
    let base = serve(app.router()).await;
    let client = DeckClient::new(&base).unwrap().with_secret("k");

    let response = client
        .generate(&SlideRequest {
            title: Some("Q3 Review".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(response.status, "success");
    assert_eq!(response.project_count, None);
    let key = format!("presentations/{}", response.filename);
    assert!(app.store.object(PRESENTATIONS_BUCKET, &key).is_some());
    assert!(response.presentation_url.ends_with(&key));
}

#[tokio::test]
async fn catalog_projects_render_as_one_deck() {
    let app = build_test_app_with_secret(None);
    let base = serve(app.router()).await;
    let client = DeckClient::new(&base).unwrap();

    let logo = format!("https://storage.googleapis.com/{CATALOG_BUCKET}/{LOGO_KEY}");
    let projects = [
        CatalogProject {
            title: "Reset".into(),
            customer: Some("Walmart".into()),
            logo_url: Some(logo.clone()),
            overview: "Reset 40 stores\nOSA up 3 pts".into(),
            images: vec![CatalogImage {
                url: format!("gs://{CATALOG_BUCKET}/project_images/before.png"),
                description: "Before".into(),
            }],
            eqi: "Yes".into(),
        },
        CatalogProject {
            title: "Endcaps".into(),
            customer: Some("Costco".into()),
            eqi: "No".into(),
            ..Default::default()
        },
    ];
    let request = MultiSlideRequest {
        projects: projects
            .iter()
            .map(|p| p.to_slide_request().unwrap())
            .collect(),
        filename: None,
    };

    let response = client.generate_multi(&request).await.unwrap();
    assert_eq!(response.project_count, Some(2));

    let deck = app.published_deck(&serde_json::to_value(&response).unwrap());
    let names: Vec<_> = deck.slides.iter().map(|s| s.name.as_deref()).collect();
    assert_eq!(names, vec![Some("Costco"), Some("Walmart")]);
    assert!(deck.slides[1].shape("EQI Badge").is_some());
    assert!(deck.slides[0].shape("EQI Badge").is_none());
}

#[tokio::test]
async fn api_errors_carry_the_message() {
    let app = build_test_app_with_secret(Some("k"));
    let base = serve(app.router()).await;

    let err = DeckClient::new(&base)
        .unwrap()
        .generate(&SlideRequest::default())
        .await
        .unwrap_err();
    assert_matches!(err, ClientError::Api { status: 401, ref message } if message == "Unauthorized");

    let err = DeckClient::new(&base)
        .unwrap()
        .with_secret("k")
        .generate_multi(&MultiSlideRequest::default())
        .await
        .unwrap_err();
    assert_matches!(
        err,
        ClientError::Api { status: 400, ref message } if message == "Projects array is required"
    );
}
