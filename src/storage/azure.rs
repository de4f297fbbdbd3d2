//! Azure Blob Storage backend.
//!
//! Built on the `azure_storage_blobs` client. The connection string decides
//! where requests go (public cloud, a custom blob endpoint or the local
//! storage emulator) and how they are authorized (account key or SAS).
//!
//! The container is provisioned lazily before the first write: created if
//! missing, then opened for anonymous blob reads on a best-effort basis.

use std::fmt;

use async_trait::async_trait;
use azure_core::error::ErrorKind;
use azure_core::{RetryOptions, StatusCode};
use azure_storage::{CloudLocation, ConnectionString, StorageCredentials};
use azure_storage_blobs::prelude::{ClientBuilder, ContainerClient, PublicAccess};
use bytes::Bytes;
use tokio::sync::OnceCell;

use super::{BlobBackend, BlobError, Result};

const DEV_ACCOUNT: &str = "devstoreaccount1";

/// Where the Blob service lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlobEndpoint {
    /// `https://{account}.blob.core.windows.net`
    Public,
    /// Azurite / storage emulator on its default address.
    Emulator,
    /// Explicit `BlobEndpoint=` or a non-default endpoint suffix.
    Custom(String),
}

/// Parsed `AZURE_STORAGE_CONNECTION_STRING`.
#[derive(Clone)]
pub struct AzureConnection {
    pub account: String,
    pub endpoint: BlobEndpoint,
    credentials: StorageCredentials,
}

impl fmt::Debug for AzureConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureConnection")
            .field("account", &self.account)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl AzureConnection {
    pub fn parse(connection_string: &str) -> Result<Self> {
        // Never echo the parser's error, it may quote the account key.
        let parsed = ConnectionString::new(connection_string)
            .map_err(|_| BlobError::Config("malformed connection string".to_string()))?;

        if parsed.use_development_storage == Some(true) {
            return Ok(Self {
                account: DEV_ACCOUNT.to_string(),
                endpoint: BlobEndpoint::Emulator,
                credentials: StorageCredentials::emulator(),
            });
        }

        let account = parsed.account_name.map(str::to_string);
        let endpoint = match (parsed.blob_endpoint, parsed.endpoint_suffix, &account) {
            (Some(endpoint), _, _) => {
                BlobEndpoint::Custom(endpoint.trim_end_matches('/').to_string())
            }
            (None, Some(suffix), Some(account)) if suffix != "core.windows.net" => {
                BlobEndpoint::Custom(format!("https://{}.blob.{}", account, suffix))
            }
            (None, _, Some(_)) => BlobEndpoint::Public,
            (None, _, None) => {
                return Err(BlobError::Config(
                    "connection string needs AccountName or BlobEndpoint".to_string(),
                ))
            }
        };

        let credentials = parsed.storage_credentials().map_err(|_| {
            BlobError::Config(
                "connection string has neither AccountKey nor SharedAccessSignature".to_string(),
            )
        })?;

        Ok(Self {
            account: account.unwrap_or_default(),
            endpoint,
            credentials,
        })
    }

    fn client_builder(&self) -> ClientBuilder {
        match &self.endpoint {
            BlobEndpoint::Emulator => ClientBuilder::emulator(),
            BlobEndpoint::Public => ClientBuilder::new(self.account.clone(), self.credentials.clone()),
            BlobEndpoint::Custom(uri) => ClientBuilder::with_location(
                CloudLocation::Custom {
                    account: self.account.clone(),
                    uri: uri.clone(),
                },
                self.credentials.clone(),
            ),
        }
    }
}

fn http_status(error: &azure_core::Error) -> Option<StatusCode> {
    match error.kind() {
        ErrorKind::HttpResponse { status, .. } => Some(*status),
        _ => None,
    }
}

fn error_code(error: &azure_core::Error) -> Option<&str> {
    match error.kind() {
        ErrorKind::HttpResponse { error_code, .. } => error_code.as_deref(),
        _ => None,
    }
}

fn already_exists(error: &azure_core::Error) -> bool {
    error_code(error) == Some("ContainerAlreadyExists")
}

fn remote(error: azure_core::Error) -> BlobError {
    BlobError::Remote(error.to_string())
}

pub struct AzureBlobBackend {
    container: ContainerClient,
    container_name: String,
    endpoint: BlobEndpoint,
    provisioned: OnceCell<()>,
}

impl AzureBlobBackend {
    pub fn new(connection: AzureConnection, container: &str) -> Result<Self> {
        Self::with_builder(connection.client_builder(), &connection, container)
    }

    fn with_builder(
        builder: ClientBuilder,
        connection: &AzureConnection,
        container: &str,
    ) -> Result<Self> {
        let container = container.trim();
        if container.is_empty() {
            return Err(BlobError::Config("container name is empty".to_string()));
        }

        Ok(Self {
            container: builder.container_client(container),
            container_name: container.to_string(),
            endpoint: connection.endpoint.clone(),
            provisioned: OnceCell::new(),
        })
    }

    pub fn from_connection_string(connection_string: &str, container: &str) -> Result<Self> {
        Self::new(AzureConnection::parse(connection_string)?, container)
    }

    pub fn endpoint(&self) -> &BlobEndpoint {
        &self.endpoint
    }

    pub fn blob_url(&self, key: &str) -> Result<String> {
        self.container
            .blob_client(key)
            .url()
            .map(|url| url.to_string())
            .map_err(|e| BlobError::Config(format!("invalid blob url: {}", e)))
    }

    /// Create the container if it does not exist yet, then try to allow
    /// anonymous reads of its blobs. Safe to call any number of times.
    pub async fn ensure_container(&self) -> Result<()> {
        match self.container.create().public_access(PublicAccess::Blob).await {
            Ok(_) => tracing::info!(container = %self.container_name, "created blob container"),
            Err(e) if already_exists(&e) => {
                tracing::debug!(container = %self.container_name, "blob container already exists");
                self.allow_public_read().await;
            }
            // Accounts with public access disabled refuse a public container.
            Err(e) if matches!(http_status(&e), Some(StatusCode::Conflict | StatusCode::Forbidden)) => {
                tracing::warn!(
                    container = %self.container_name,
                    error = %e,
                    "public container refused, creating a private one"
                );
                match self.container.create().await {
                    Ok(_) => {}
                    Err(e) if already_exists(&e) => {}
                    Err(e) => return Err(remote(e)),
                }
            }
            Err(e) => return Err(remote(e)),
        }
        Ok(())
    }

    /// Best effort: accounts with public access disabled refuse this.
    async fn allow_public_read(&self) {
        match self.container.set_acl(PublicAccess::Blob).await {
            Ok(_) => tracing::debug!(container = %self.container_name, "public blob access enabled"),
            Err(e) => tracing::warn!(
                container = %self.container_name,
                error = %e,
                "could not enable public blob access, continuing"
            ),
        }
    }

    async fn provision(&self) -> Result<()> {
        self.provisioned
            .get_or_try_init(|| self.ensure_container())
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl BlobBackend for AzureBlobBackend {
    fn name(&self) -> &'static str {
        "azure"
    }

    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<String> {
        self.provision().await?;

        let blob = self.container.blob_client(key);
        blob.put_block_blob(bytes)
            .content_type(content_type.to_string())
            .await
            .map_err(remote)?;

        self.blob_url(key)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        match self.container.blob_client(key).delete().await {
            Ok(_) => Ok(()),
            Err(e) if http_status(&e) == Some(StatusCode::NotFound) => {
                Err(BlobError::NotFound(key.to_string()))
            }
            Err(e) => Err(remote(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";

    fn backend_without_retries(connection_string: &str) -> AzureBlobBackend {
        let connection = AzureConnection::parse(connection_string).unwrap();
        let builder = connection.client_builder().retry(RetryOptions::none());
        AzureBlobBackend::with_builder(builder, &connection, "uploads").unwrap()
    }

    #[test]
    fn test_parse_standard_connection_string() {
        let connection = AzureConnection::parse(&format!(
            "DefaultEndpointsProtocol=https;AccountName=wedding;AccountKey={};EndpointSuffix=core.windows.net",
            KEY
        ))
        .unwrap();
        assert_eq!(connection.account, "wedding");
        assert_eq!(connection.endpoint, BlobEndpoint::Public);
    }

    #[test]
    fn test_parse_sovereign_cloud_suffix() {
        let connection = AzureConnection::parse(&format!(
            "AccountName=wedding;AccountKey={};EndpointSuffix=core.chinacloudapi.cn",
            KEY
        ))
        .unwrap();
        assert_eq!(
            connection.endpoint,
            BlobEndpoint::Custom("https://wedding.blob.core.chinacloudapi.cn".to_string())
        );
    }

    #[test]
    fn test_parse_development_storage() {
        let connection = AzureConnection::parse("UseDevelopmentStorage=true").unwrap();
        assert_eq!(connection.account, DEV_ACCOUNT);
        assert_eq!(connection.endpoint, BlobEndpoint::Emulator);
    }

    #[test]
    fn test_parse_sas_connection_string() {
        let connection = AzureConnection::parse(
            "BlobEndpoint=https://wedding.blob.core.windows.net/;SharedAccessSignature=sv=2021-08-06&sig=abc",
        )
        .unwrap();
        assert_eq!(
            connection.endpoint,
            BlobEndpoint::Custom("https://wedding.blob.core.windows.net".to_string())
        );
    }

    #[test]
    fn test_parse_rejects_incomplete_strings() {
        assert!(matches!(
            AzureConnection::parse("AccountKey=abc"),
            Err(BlobError::Config(_))
        ));
        assert!(matches!(
            AzureConnection::parse("AccountName=wedding"),
            Err(BlobError::Config(_))
        ));
    }

    #[test]
    fn test_debug_does_not_leak_key() {
        let connection =
            AzureConnection::parse(&format!("AccountName=wedding;AccountKey={}", KEY)).unwrap();
        let debug = format!("{:?}", connection);
        assert!(debug.contains("wedding"));
        assert!(!debug.contains(KEY));
    }

    fn http_error(status: StatusCode, code: &str) -> azure_core::Error {
        azure_core::Error::message(
            ErrorKind::HttpResponse {
                status,
                error_code: Some(code.to_string()),
            },
            "request failed",
        )
    }

    #[test]
    fn test_conflicts_are_told_apart_by_error_code() {
        let exists = http_error(StatusCode::Conflict, "ContainerAlreadyExists");
        assert!(already_exists(&exists));

        let public_denied = http_error(StatusCode::Conflict, "PublicAccessNotPermitted");
        assert!(!already_exists(&public_denied));
        assert_eq!(http_status(&public_denied), Some(StatusCode::Conflict));

        let missing = http_error(StatusCode::NotFound, "BlobNotFound");
        assert_eq!(error_code(&missing), Some("BlobNotFound"));
    }

    #[test]
    fn test_empty_container_name_is_rejected() {
        let result = AzureBlobBackend::from_connection_string("UseDevelopmentStorage=true", "  ");
        assert!(matches!(result, Err(BlobError::Config(_))));
    }

    #[test]
    fn test_blob_url_points_into_the_container() {
        let backend = backend_without_retries(&format!(
            "BlobEndpoint=https://cdn.example.com/wedding;AccountName=wedding;AccountKey={}",
            KEY
        ));
        let url = backend.blob_url("photo.png").unwrap();
        assert!(url.starts_with("https://cdn.example.com/wedding"), "{}", url);
        assert!(url.ends_with("/uploads/photo.png"), "{}", url);
    }

    #[tokio::test]
    async fn test_unreachable_service_is_remote_error() {
        let backend = backend_without_retries(&format!(
            "BlobEndpoint=http://127.0.0.1:9/wedding;AccountName=wedding;AccountKey={}",
            KEY
        ));
        let result = backend
            .put("x.png", Bytes::from_static(b"png"), "image/png")
            .await;
        assert!(matches!(result, Err(BlobError::Remote(_))));
    }

    /// Full round trip against a local Azurite
    /// (`docker run -p 10000:10000 mcr.microsoft.com/azure-storage/azurite azurite-blob`).
    #[tokio::test]
    #[ignore = "requires Azurite on 127.0.0.1:10000"]
    async fn test_azurite_put_and_delete() {
        let backend =
            AzureBlobBackend::from_connection_string("UseDevelopmentStorage=true", "wedding-test")
                .unwrap();
        let key = crate::storage::new_blob_key("png");

        let url = backend
            .put(&key, Bytes::from_static(b"\x89PNG"), "image/png")
            .await
            .unwrap();
        assert!(url.ends_with(&format!("/wedding-test/{}", key)));

        // provisioning is idempotent across backends
        backend.ensure_container().await.unwrap();

        backend.delete(&key).await.unwrap();
        assert!(matches!(
            backend.delete(&key).await,
            Err(BlobError::NotFound(_))
        ));
    }
}
