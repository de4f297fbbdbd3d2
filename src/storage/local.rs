//! Local-disk upload storage.
//!
//! Files are written flat under the configured directory and served by the
//! static file mount, so the URL is just the mount prefix plus the key.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;

use super::{is_safe_key, BlobBackend, BlobError, Result};

#[derive(Debug, Clone)]
pub struct LocalBackend {
    root: PathBuf,
    url_prefix: String,
}

impl LocalBackend {
    pub fn new(root: PathBuf, url_prefix: &str) -> Self {
        Self {
            root,
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for_key(&self, key: &str) -> Result<PathBuf> {
        if !is_safe_key(key) {
            return Err(BlobError::InvalidName(key.to_string()));
        }
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl BlobBackend for LocalBackend {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn put(&self, key: &str, bytes: Bytes, _content_type: &str) -> Result<String> {
        let path = self.path_for_key(key)?;
        fs::create_dir_all(&self.root).await?;

        // Write to a temp file first so readers never see a partial image.
        let temp_path = path.with_extension("part");
        fs::write(&temp_path, &bytes).await?;
        fs::rename(&temp_path, &path).await?;

        tracing::debug!(path = %path.display(), size = bytes.len(), "wrote upload to disk");
        Ok(format!("{}/{}", self.url_prefix, key))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.path_for_key(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(BlobError::NotFound(key.to_string())),
            Err(e) => Err(BlobError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_creates_directory_and_returns_prefixed_url() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested/uploads");
        let backend = LocalBackend::new(root.clone(), "/static/uploads/");

        let url = backend
            .put("abc.png", Bytes::from_static(b"png"), "image/png")
            .await
            .unwrap();

        assert_eq!(url, "/static/uploads/abc.png");
        assert_eq!(std::fs::read(root.join("abc.png")).unwrap(), b"png");
        assert!(!root.join("abc.part").exists());
    }

    #[tokio::test]
    async fn test_delete_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new(dir.path().to_path_buf(), "/static/uploads");
        assert!(matches!(
            backend.delete("nope.png").await,
            Err(BlobError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_unsafe_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new(dir.path().to_path_buf(), "/static/uploads");
        assert!(matches!(
            backend.put("../x.png", Bytes::from_static(b"x"), "image/png").await,
            Err(BlobError::InvalidName(_))
        ));
    }
}
