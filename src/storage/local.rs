//! Directory-backed store: `root/<bucket>/<key>`.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;

use super::{ObjectStore, StoreError};

#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, bucket: &str, key: &str) -> Result<PathBuf, StoreError> {
        let relative = Path::new(bucket).join(key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if bucket.is_empty() || key.is_empty() || escapes {
            return Err(StoreError::Rejected {
                status: 400,
                message: format!("invalid object name {bucket}/{key}"),
            });
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStore for LocalStore {
    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, StoreError> {
        let path = self.path_for(bucket, key)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StoreError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        _content_type: &str,
    ) -> Result<(), StoreError> {
        let path = self.path_for(bucket, key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &data).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_put_then_get() {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::new(dir.path());
        store
            .put("presentations", "presentations/a.pptx", Bytes::from_static(b"deck"), "x")
            .await
            .unwrap();
        assert!(dir.path().join("presentations/presentations/a.pptx").is_file());
        assert_eq!(
            store.get("presentations", "presentations/a.pptx").await.unwrap(),
            Bytes::from_static(b"deck")
        );
    }

    #[tokio::test]
    async fn test_missing_and_escaping_keys() {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::new(dir.path());
        assert_matches!(
            store.get("b", "nope.png").await,
            Err(StoreError::NotFound { .. })
        );
        assert_matches!(
            store.get("b", "../../etc/passwd").await,
            Err(StoreError::Rejected { status: 400, .. })
        );
        assert_matches!(
            store.get("b", "/etc/passwd").await,
            Err(StoreError::Rejected { .. })
        );
    }
}
