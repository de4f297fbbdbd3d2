//! Upload storage.
//!
//! Uploaded images go to remote blob storage when it is configured and
//! reachable, otherwise to a directory on local disk that is served under
//! [`LOCAL_URL_PREFIX`]. Callers only ever see the retrieval URL.
//!
//! ## Backends
//!
//! - `AzureBlobBackend` - Azure Blob Storage through `azure_storage_blobs`
//! - `LocalBackend` - plain files under `STATIC_DIR`

pub mod azure;
pub mod local;

pub use azure::{AzureBlobBackend, AzureConnection, BlobEndpoint};
pub use local::LocalBackend;

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use uuid::Uuid;

use crate::config::Settings;

/// Public URL prefix of the local fallback directory.
pub const LOCAL_URL_PREFIX: &str = "/static/uploads";

pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("File type not allowed: '{0}'. Allowed types: .jpg, .jpeg, .png, .gif, .webp")]
    InvalidFileType(String),

    #[error("Invalid file name: {0}")]
    InvalidName(String),

    #[error("Uploaded file is empty")]
    Empty,

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Remote storage error: {0}")]
    Remote(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, BlobError>;

/// A place uploaded objects can be written to and removed from.
#[async_trait]
pub trait BlobBackend: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Store `bytes` under `key` and return the public retrieval URL.
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<String>;

    /// Remove the object stored under `key`. A missing object is `NotFound`.
    async fn delete(&self, key: &str) -> Result<()>;
}

/// Lower-cased extension of `filename` if it is on the allow-list.
pub fn validated_extension(filename: &str) -> Result<String> {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.trim().to_ascii_lowercase())
        .unwrap_or_default();

    if ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        Ok(extension)
    } else {
        Err(BlobError::InvalidFileType(filename.to_string()))
    }
}

pub fn content_type_for_extension(extension: &str) -> &'static str {
    match extension {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Fresh storage key; the caller's file name never reaches storage.
pub fn new_blob_key(extension: &str) -> String {
    format!("{}.{}", Uuid::new_v4(), extension)
}

/// Object key from either a bare key or a full URL: the last path segment,
/// without query string or fragment.
pub fn key_from_reference(reference: &str) -> &str {
    let without_query = reference
        .split(['?', '#'])
        .next()
        .unwrap_or(reference);
    without_query
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(without_query)
}

/// A key that is safe to join onto a storage directory.
pub fn is_safe_key(key: &str) -> bool {
    !key.is_empty()
        && key != "."
        && key != ".."
        && !key.contains('/')
        && !key.contains('\\')
        && !key.contains('\0')
}

/// Remote-first upload storage with a local-disk fallback.
pub struct BlobGateway {
    remote: Option<Arc<dyn BlobBackend>>,
    local: LocalBackend,
}

impl BlobGateway {
    pub fn new(remote: Option<Arc<dyn BlobBackend>>, local: LocalBackend) -> Self {
        Self { remote, local }
    }

    /// Remote storage is enabled only when a usable connection string is set.
    pub fn from_settings(settings: &Settings) -> Self {
        let local = LocalBackend::new(settings.static_dir.clone(), LOCAL_URL_PREFIX);

        let remote = settings
            .azure_connection_string
            .as_deref()
            .and_then(|conn| {
                match AzureBlobBackend::from_connection_string(conn, &settings.azure_container) {
                    Ok(backend) => {
                        tracing::info!(
                            container = %settings.azure_container,
                            endpoint = ?backend.endpoint(),
                            "Azure blob storage enabled"
                        );
                        Some(Arc::new(backend) as Arc<dyn BlobBackend>)
                    }
                    Err(e) => {
                        tracing::warn!(
                            error = %e,
                            "Azure blob storage misconfigured, uploads will use local disk"
                        );
                        None
                    }
                }
            });

        if remote.is_none() {
            tracing::info!(dir = %settings.static_dir.display(), "Storing uploads on local disk");
        }

        Self::new(remote, local)
    }

    pub fn remote_configured(&self) -> bool {
        self.remote.is_some()
    }

    pub fn local(&self) -> &LocalBackend {
        &self.local
    }

    /// Validate and store an upload, returning its URL.
    ///
    /// Remote failures are logged and absorbed; only validation errors and
    /// local disk failures reach the caller.
    pub async fn store(
        &self,
        bytes: Bytes,
        filename: &str,
        content_type: Option<&str>,
    ) -> Result<String> {
        let extension = validated_extension(filename)?;
        if bytes.is_empty() {
            return Err(BlobError::Empty);
        }

        let key = new_blob_key(&extension);
        let content_type = content_type
            .map(str::trim)
            .filter(|ct| !ct.is_empty() && *ct != "application/octet-stream")
            .unwrap_or_else(|| content_type_for_extension(&extension));
        let size = bytes.len();

        if let Some(remote) = &self.remote {
            match remote.put(&key, bytes.clone(), content_type).await {
                Ok(url) => {
                    tracing::info!(backend = remote.name(), key = %key, size, "upload stored");
                    return Ok(url);
                }
                Err(e) => {
                    tracing::warn!(
                        backend = remote.name(),
                        error = %e,
                        "remote upload failed, falling back to local disk"
                    );
                }
            }
        }

        let url = self.local.put(&key, bytes, content_type).await?;
        tracing::info!(backend = self.local.name(), key = %key, size, "upload stored");
        Ok(url)
    }

    /// Delete a previously stored upload given its URL or bare name.
    pub async fn remove(&self, reference: &str) -> Result<()> {
        let key = key_from_reference(reference);
        if !is_safe_key(key) {
            return Err(BlobError::InvalidName(reference.to_string()));
        }

        if let Some(remote) = &self.remote {
            match remote.delete(key).await {
                Ok(()) => {
                    tracing::info!(backend = remote.name(), key = %key, "upload deleted");
                    return Ok(());
                }
                Err(e) => {
                    tracing::debug!(backend = remote.name(), error = %e, "remote delete missed");
                }
            }
        }

        self.local.delete(key).await?;
        tracing::info!(backend = self.local.name(), key = %key, "upload deleted");
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Remote backend that fails every call.
    #[derive(Default)]
    pub struct FailingBackend {
        pub calls: AtomicUsize,
    }

    #[async_trait]
    impl BlobBackend for FailingBackend {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn put(&self, _key: &str, _bytes: Bytes, _content_type: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(BlobError::Remote("connection refused".to_string()))
        }

        async fn delete(&self, key: &str) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(BlobError::NotFound(key.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::FailingBackend;
    use super::*;
    use std::sync::atomic::Ordering;

    fn local_gateway(dir: &std::path::Path, remote: Option<Arc<dyn BlobBackend>>) -> BlobGateway {
        BlobGateway::new(remote, LocalBackend::new(dir.to_path_buf(), LOCAL_URL_PREFIX))
    }

    #[test]
    fn test_validated_extension() {
        assert_eq!(validated_extension("photo.JPG").unwrap(), "jpg");
        assert_eq!(validated_extension("a.b.webp").unwrap(), "webp");
        assert!(matches!(
            validated_extension("malware.exe"),
            Err(BlobError::InvalidFileType(_))
        ));
        assert!(validated_extension("no-extension").is_err());
        assert!(validated_extension("trailing.").is_err());
    }

    #[test]
    fn test_new_blob_keys_are_unique() {
        let a = new_blob_key("png");
        let b = new_blob_key("png");
        assert_ne!(a, b);
        assert!(a.ends_with(".png"));
    }

    #[test]
    fn test_key_from_reference() {
        assert_eq!(key_from_reference("abc.png"), "abc.png");
        assert_eq!(
            key_from_reference("https://acct.blob.core.windows.net/uploads/abc.png"),
            "abc.png"
        );
        assert_eq!(key_from_reference("/static/uploads/abc.png?v=2"), "abc.png");
    }

    #[test]
    fn test_is_safe_key() {
        assert!(is_safe_key("abc.png"));
        assert!(!is_safe_key(".."));
        assert!(!is_safe_key(""));
        assert!(!is_safe_key("a\\b.png"));
    }

    #[tokio::test]
    async fn test_store_rejects_disallowed_extension_without_side_effect() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = local_gateway(dir.path(), None);

        let result = gateway
            .store(Bytes::from_static(b"MZ"), "setup.exe", None)
            .await;
        assert!(matches!(result, Err(BlobError::InvalidFileType(_))));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_store_rejects_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = local_gateway(dir.path(), None);
        let result = gateway.store(Bytes::new(), "photo.png", None).await;
        assert!(matches!(result, Err(BlobError::Empty)));
    }

    #[tokio::test]
    async fn test_store_falls_back_to_local_when_remote_fails() {
        let dir = tempfile::tempdir().unwrap();
        let remote = Arc::new(FailingBackend::default());
        let gateway = local_gateway(dir.path(), Some(remote.clone()));

        let url = gateway
            .store(Bytes::from_static(b"\x89PNG data"), "../../etc/passwd.png", None)
            .await
            .unwrap();

        assert_eq!(remote.calls.load(Ordering::SeqCst), 1);
        assert!(url.starts_with("/static/uploads/"));
        assert!(!url.contains("passwd"));

        let key = key_from_reference(&url);
        let stored = std::fs::read(dir.path().join(key)).unwrap();
        assert_eq!(stored, b"\x89PNG data");
    }

    #[tokio::test]
    async fn test_remove_tries_remote_then_local() {
        let dir = tempfile::tempdir().unwrap();
        let remote = Arc::new(FailingBackend::default());
        let gateway = local_gateway(dir.path(), Some(remote.clone()));

        let url = gateway
            .store(Bytes::from_static(b"gif89a"), "x.gif", Some("image/gif"))
            .await
            .unwrap();
        gateway.remove(&url).await.unwrap();

        // one failed put, one missed delete
        assert_eq!(remote.calls.load(Ordering::SeqCst), 2);
        assert!(!dir.path().join(key_from_reference(&url)).exists());
    }

    #[tokio::test]
    async fn test_remove_missing_everywhere_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = local_gateway(dir.path(), Some(Arc::new(FailingBackend::default())));
        assert!(matches!(
            gateway.remove("missing.png").await,
            Err(BlobError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_remove_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = local_gateway(dir.path(), None);
        assert!(matches!(
            gateway.remove("..").await,
            Err(BlobError::InvalidName(_))
        ));
    }
}
