//! Filesystem-backed object storage
//!
//! Objects live at `{upload_dir}/{path}` and are served from
//! `{public_base_url}/{path}` by the API's static file route.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

use sims_core::error::DomainError;
use sims_core::traits::{ObjectStorage, RepoResult};

/// Stores uploads on the local disk
#[derive(Debug, Clone)]
pub struct LocalObjectStorage {
    dir: PathBuf,
    public_base_url: String,
}

impl LocalObjectStorage {
    /// Create the storage, making sure the root directory exists
    pub async fn new(dir: impl Into<PathBuf>, public_base_url: &str) -> RepoResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| DomainError::StorageError(e.to_string()))?;

        Ok(Self {
            dir,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Root directory objects are written under
    pub fn root(&self) -> &Path {
        &self.dir
    }

    /// Resolve an object path, refusing anything that escapes the root
    fn object_path(&self, path: &str) -> RepoResult<PathBuf> {
        let relative = Path::new(path);
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));

        if path.is_empty() || !safe {
            return Err(DomainError::StorageError(format!(
                "invalid object path: {path}"
            )));
        }

        Ok(self.dir.join(relative))
    }
}

#[async_trait]
impl ObjectStorage for LocalObjectStorage {
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> RepoResult<()> {
        let target = self.object_path(path)?;

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| DomainError::StorageError(e.to_string()))?;
        }

        let mut options = fs::OpenOptions::new();
        options.write(true);
        if upsert {
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }

        let mut file = options.open(&target).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::AlreadyExists {
                DomainError::StorageError(format!("object already exists: {path}"))
            } else {
                DomainError::StorageError(e.to_string())
            }
        })?;
        file.write_all(&bytes)
            .await
            .map_err(|e| DomainError::StorageError(e.to_string()))?;
        file.flush()
            .await
            .map_err(|e| DomainError::StorageError(e.to_string()))?;

        debug!(path = %target.display(), "Object stored");
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.public_base_url, path.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("sims-storage-{}", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_upload_and_overwrite() {
        let dir = scratch_dir();
        let storage = LocalObjectStorage::new(&dir, "http://localhost/files/")
            .await
            .unwrap();

        storage
            .upload("avatars/u.png", b"one".to_vec(), "image/png", true)
            .await
            .unwrap();
        storage
            .upload("avatars/u.png", b"two".to_vec(), "image/png", true)
            .await
            .unwrap();

        let stored = fs::read(dir.join("avatars/u.png")).await.unwrap();
        assert_eq!(stored, b"two");

        let _ = fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn test_no_upsert_refuses_existing() {
        let dir = scratch_dir();
        let storage = LocalObjectStorage::new(&dir, "http://localhost/files")
            .await
            .unwrap();

        storage
            .upload("a.txt", b"x".to_vec(), "text/plain", false)
            .await
            .unwrap();
        let err = storage
            .upload("a.txt", b"y".to_vec(), "text/plain", false)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::StorageError(_)));

        let _ = fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn test_rejects_traversal() {
        let dir = scratch_dir();
        let storage = LocalObjectStorage::new(&dir, "http://localhost/files")
            .await
            .unwrap();

        assert!(storage
            .upload("../escape.txt", vec![], "text/plain", true)
            .await
            .is_err());

        let _ = fs::remove_dir_all(&dir).await;
    }

    #[test]
    fn test_public_url() {
        let storage = LocalObjectStorage {
            dir: PathBuf::from("/tmp"),
            public_base_url: "http://localhost:8080/files".to_string(),
        };
        assert_eq!(
            storage.public_url("avatars/u.png"),
            "http://localhost:8080/files/avatars/u.png"
        );
    }
}
