//! HTTP client for the rendering routes, used by the chatbot tool path.

use std::time::Duration;

use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::render::{GenerateResponse, MultiSlideRequest, SlideRequest};

// Covers the server's multi-slide budget plus upload slack.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(150);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with an error body.
    #[error("service returned {status}: {message}")]
    Api { status: u16, message: String },
}

#[derive(Debug, Clone)]
pub struct DeckClient {
    http: reqwest::Client,
    base_url: String,
    secret: Option<String>,
}

impl DeckClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(DEFAULT_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            secret: None,
        })
    }

    /// Send `secret` as a bearer token.
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    pub async fn generate(&self, request: &SlideRequest) -> Result<GenerateResponse, ClientError> {
        self.post("/generate", request).await
    }

    pub async fn generate_multi(
        &self,
        request: &MultiSlideRequest,
    ) -> Result<GenerateResponse, ClientError> {
        self.post("/generate_multi", request).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let mut request = self.http.post(format!("{}{path}", self.base_url)).json(body);
        if let Some(secret) = &self.secret {
            request = request.bearer_auth(secret);
        }
        let response = request.send().await?;

        let status = response.status();
        if status == StatusCode::OK {
            return Ok(response.json().await?);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("error")?.as_str().map(String::from))
            .unwrap_or(body);
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }
}
