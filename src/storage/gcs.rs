//! Cloud Storage backend over the JSON API.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::debug;

use super::{ObjectStore, StoreError};

/// Default endpoint of the JSON API.
pub const DEFAULT_API_BASE: &str = "https://storage.googleapis.com";

const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
// Refresh metadata tokens this long before they expire.
const TOKEN_SLACK: Duration = Duration::from_secs(60);

/// Where bearer tokens come from.
#[derive(Debug, Default)]
pub enum TokenSource {
    /// Anonymous access to public buckets.
    #[default]
    None,
    /// Fixed token, e.g. from `gcloud auth print-access-token`.
    Static(String),
    /// GCE/Cloud Run metadata server, cached until shortly before expiry.
    Metadata(Mutex<Option<CachedToken>>),
}

impl TokenSource {
    pub fn metadata() -> Self {
        Self::Metadata(Mutex::new(None))
    }
}

#[derive(Debug, Clone)]
pub struct CachedToken {
    token: String,
    refresh_at: Instant,
}

#[derive(Deserialize)]
struct MetadataToken {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug)]
pub struct GcsStore {
    http: Client,
    api_base: String,
    tokens: TokenSource,
}

impl GcsStore {
    pub fn new(tokens: TokenSource) -> Result<Self, StoreError> {
        Self::with_api_base(DEFAULT_API_BASE, tokens)
    }

    /// Point the store at another endpoint, such as a local emulator.
    pub fn with_api_base(api_base: &str, tokens: TokenSource) -> Result<Self, StoreError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            tokens,
        })
    }

    fn object_url(&self, bucket: &str, key: &str) -> String {
        format!(
            "{}/storage/v1/b/{}/o/{}?alt=media",
            self.api_base,
            urlencoding::encode(bucket),
            urlencoding::encode(key)
        )
    }

    fn upload_url(&self, bucket: &str, key: &str) -> String {
        format!(
            "{}/upload/storage/v1/b/{}/o?uploadType=media&name={}",
            self.api_base,
            urlencoding::encode(bucket),
            urlencoding::encode(key)
        )
    }

    async fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, StoreError> {
        Ok(match self.token().await? {
            Some(token) => request.bearer_auth(token),
            None => request,
        })
    }

    async fn token(&self) -> Result<Option<String>, StoreError> {
        match &self.tokens {
            TokenSource::None => Ok(None),
            TokenSource::Static(token) => Ok(Some(token.clone())),
            TokenSource::Metadata(cache) => {
                let cached = cache
                    .lock()
                    .as_ref()
                    .filter(|cached| cached.refresh_at > Instant::now())
                    .map(|cached| cached.token.clone());
                if cached.is_some() {
                    return Ok(cached);
                }

                let response = self
                    .http
                    .get(METADATA_TOKEN_URL)
                    .header("Metadata-Flavor", "Google")
                    .send()
                    .await?;
                let fresh: MetadataToken = check(response, "", "").await?.json().await?;
                debug!(expires_in = fresh.expires_in, "refreshed metadata token");

                let lifetime = Duration::from_secs(fresh.expires_in).saturating_sub(TOKEN_SLACK);
                *cache.lock() = Some(CachedToken {
                    token: fresh.access_token.clone(),
                    refresh_at: Instant::now() + lifetime,
                });
                Ok(Some(fresh.access_token))
            },
        }
    }
}

/// Map non-success statuses onto [`StoreError`].
async fn check(response: Response, bucket: &str, key: &str) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::NOT_FOUND && !key.is_empty() {
        return Err(StoreError::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        });
    }
    let message = response.text().await.unwrap_or_default();
    Err(StoreError::Rejected {
        status: status.as_u16(),
        message: message.trim().chars().take(512).collect(),
    })
}

#[async_trait]
impl ObjectStore for GcsStore {
    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, StoreError> {
        let request = self.authorize(self.http.get(self.object_url(bucket, key))).await?;
        let response = check(request.send().await?, bucket, key).await?;
        Ok(response.bytes().await?)
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<(), StoreError> {
        let request = self
            .authorize(
                self.http
                    .post(self.upload_url(bucket, key))
                    .header(reqwest::header::CONTENT_TYPE, content_type)
                    .body(data),
            )
            .await?;
        check(request.send().await?, bucket, key).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_encode_object_names() {
        let store = GcsStore::with_api_base("http://localhost:4443/", TokenSource::None).unwrap();
        assert_eq!(
            store.object_url("anderson_images", "customer_logos/walmart logo.png"),
            "http://localhost:4443/storage/v1/b/anderson_images/o/customer_logos%2Fwalmart%20logo.png?alt=media"
        );
        assert_eq!(
            store.upload_url("presentations", "presentations/deck.pptx"),
            "http://localhost:4443/upload/storage/v1/b/presentations/o?uploadType=media&name=presentations%2Fdeck.pptx"
        );
    }

    #[tokio::test]
    async fn test_static_token() {
        let store = GcsStore::new(TokenSource::Static("abc".into())).unwrap();
        assert_eq!(store.token().await.unwrap().as_deref(), Some("abc"));
        let anonymous = GcsStore::new(TokenSource::None).unwrap();
        assert_eq!(anonymous.token().await.unwrap(), None);
    }
}
