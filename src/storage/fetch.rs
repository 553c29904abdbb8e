//! Image fetching with staging-bucket fallback.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, info};

use super::{ObjectStore, StoreError};
use crate::ooxml::pptx::ImageFormat;
use crate::render::ImageRef;

/// An image that could not be retrieved. Always recovered by the caller.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to fetch {image}: {source}")]
    Store {
        image: String,
        #[source]
        source: StoreError,
    },
    #[error("{0} is empty")]
    Empty(String),
    #[error("failed to write local copy: {0}")]
    Io(#[from] std::io::Error),
}

/// Reads catalog images.
///
/// When the primary bucket refuses a read and a staging bucket is
/// configured, the same key is retried there. Missing objects are not
/// retried.
#[derive(Debug, Clone)]
pub struct ImageFetcher {
    store: Arc<dyn ObjectStore>,
    staging_bucket: Option<String>,
}

impl ImageFetcher {
    pub fn new(store: Arc<dyn ObjectStore>, staging_bucket: Option<String>) -> Self {
        Self {
            store,
            staging_bucket: staging_bucket.filter(|b| !b.is_empty()),
        }
    }

    pub async fn fetch(&self, image: &ImageRef) -> Result<Bytes, FetchError> {
        let result = match self.store.get(image.bucket(), image.key()).await {
            Err(StoreError::Rejected { status, message }) => match &self.staging_bucket {
                Some(staging) if staging != image.bucket() => {
                    info!(
                        url = %image,
                        status,
                        staging = %staging,
                        "primary bucket refused read, trying staging"
                    );
                    self.store.get(staging, image.key()).await
                },
                _ => Err(StoreError::Rejected { status, message }),
            },
            other => other,
        };

        let data = result.map_err(|source| FetchError::Store {
            image: image.to_string(),
            source,
        })?;
        if data.is_empty() {
            return Err(FetchError::Empty(image.to_string()));
        }
        Ok(data)
    }

    /// Fetch `image` into `dir/<stem>.<ext>`.
    ///
    /// The extension comes from the object key, then from the content, and
    /// defaults to `png`.
    pub async fn fetch_to(
        &self,
        image: &ImageRef,
        dir: &Path,
        stem: &str,
    ) -> Result<PathBuf, FetchError> {
        let data = self.fetch(image).await?;
        let extension = image
            .extension()
            .or_else(|| ImageFormat::detect_from_bytes(&data).map(|f| f.extension().to_string()))
            .unwrap_or_else(|| "png".to_string());

        let path = dir.join(format!("{stem}.{extension}"));
        tokio::fs::write(&path, &data).await?;
        debug!(url = %image, path = %path.display(), bytes = data.len(), "fetched image");
        Ok(path)
    }
}
