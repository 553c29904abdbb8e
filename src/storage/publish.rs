//! Artifact upload.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use super::{ObjectStore, PPTX_CONTENT_TYPE, StoreError};
use crate::render::{Artifact, ArtifactLocation};

#[derive(Debug, Error)]
#[error("failed to upload {key} to {bucket}: {source}")]
pub struct PublishError {
    pub bucket: String,
    pub key: String,
    #[source]
    pub source: StoreError,
}

/// Uploads rendered decks and builds their public URLs.
#[derive(Debug, Clone)]
pub struct ArtifactPublisher {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    public_base_url: String,
}

impl ArtifactPublisher {
    pub fn new(store: Arc<dyn ObjectStore>, bucket: impl Into<String>, public_base_url: &str) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// `<base>/<bucket>/<key>`, with every path segment percent-encoded.
    pub fn public_url(&self, key: &str) -> String {
        let mut url = format!("{}/{}", self.public_base_url, urlencoding::encode(&self.bucket));
        for segment in key.split('/') {
            url.push('/');
            url.push_str(&urlencoding::encode(segment));
        }
        url
    }

    pub async fn publish(&self, artifact: &Artifact) -> Result<ArtifactLocation, PublishError> {
        let key = artifact.key();
        self.store
            .put(&self.bucket, &key, artifact.bytes.clone(), PPTX_CONTENT_TYPE)
            .await
            .map_err(|source| PublishError {
                bucket: self.bucket.clone(),
                key: key.clone(),
                source,
            })?;

        info!(
            bucket = %self.bucket,
            key = %key,
            bytes = artifact.bytes.len(),
            "published presentation"
        );
        Ok(ArtifactLocation {
            url: self.public_url(&key),
            bucket: self.bucket.clone(),
            key,
        })
    }
}
