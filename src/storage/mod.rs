//! Object storage: image catalog reads and artifact uploads.
//!
//! [`ObjectStore`] is the seam between the renderer and the bucket service.
//! [`GcsStore`] talks to Cloud Storage over its JSON API, [`LocalStore`]
//! maps buckets onto directories, and [`MemoryStore`] backs tests.

use std::fmt::Debug;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

pub mod fetch;
pub mod gcs;
pub mod local;
pub mod memory;
pub mod publish;

pub use fetch::{FetchError, ImageFetcher};
pub use gcs::{GcsStore, TokenSource};
pub use local::LocalStore;
pub use memory::MemoryStore;
pub use publish::{ArtifactPublisher, PublishError};

/// MIME type of published decks.
pub const PPTX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";

/// Failure talking to an object store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object gs://{bucket}/{key} not found")]
    NotFound { bucket: String, key: String },

    /// The store answered but refused the operation (permissions, bad
    /// bucket, quota).
    #[error("request rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Bucket/key object storage.
#[async_trait]
pub trait ObjectStore: Debug + Send + Sync {
    /// Read a whole object.
    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, StoreError>;

    /// Create or replace an object.
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<(), StoreError>;
}
