//! Azure Blob Storage backend
//!
//! Talks to the Blob service REST API directly: one `Put Blob` request per
//! archived object, authorized with a SharedKey signature.

use crate::config::{Secret, StorageConfig};
use crate::storage::traits::{ObjectStore, StorageError, StorageResult};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::{Client, StatusCode};
use sha2::Sha256;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

type HmacSha256 = Hmac<Sha256>;

/// Blob service REST API version sent with every request
const API_VERSION: &str = "2021-08-06";

/// Endpoint suffix of the public Azure cloud
const DEFAULT_ENDPOINT_SUFFIX: &str = "core.windows.net";

/// Credentials and endpoint of a storage account
#[derive(Clone)]
pub struct StorageAccount {
    name: String,
    key: Secret,
    blob_endpoint: Url,
}

impl StorageAccount {
    /// Parses an Azure connection string
    ///
    /// Supports `DefaultEndpointsProtocol`, `AccountName`, `AccountKey`,
    /// `EndpointSuffix` and `BlobEndpoint`. Error messages never include the
    /// key.
    pub fn from_connection_string(connection: &str) -> StorageResult<Self> {
        let mut fields = BTreeMap::new();
        for part in connection.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let (name, value) = part.split_once('=').ok_or_else(|| {
                StorageError::InvalidConnectionString("expected Name=Value pairs".to_string())
            })?;
            fields.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
        }

        let name = fields
            .remove("accountname")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| StorageError::InvalidConnectionString("missing AccountName".to_string()))?;
        let key = fields
            .remove("accountkey")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| StorageError::InvalidConnectionString("missing AccountKey".to_string()))?;

        let blob_endpoint = match fields.remove("blobendpoint") {
            Some(endpoint) => endpoint,
            None => {
                let protocol = fields
                    .remove("defaultendpointsprotocol")
                    .unwrap_or_else(|| "https".to_string());
                let suffix = fields
                    .remove("endpointsuffix")
                    .unwrap_or_else(|| DEFAULT_ENDPOINT_SUFFIX.to_string());
                format!("{}://{}.blob.{}", protocol, name, suffix)
            }
        };

        let blob_endpoint = Url::parse(&blob_endpoint).map_err(|e| {
            StorageError::InvalidConnectionString(format!("invalid blob endpoint: {}", e))
        })?;

        Ok(Self {
            name,
            key: Secret::new(key),
            blob_endpoint,
        })
    }

    /// Builds an account from the configured secret
    ///
    /// The secret is either a full connection string or a bare account key,
    /// in which case `account_name` and the public endpoint are used.
    pub fn from_secret(secret: &Secret, account_name: &str) -> StorageResult<Self> {
        let raw = secret.expose();
        if raw.contains('=') && raw.to_ascii_lowercase().contains("accountkey=") {
            return Self::from_connection_string(raw);
        }

        Self::from_connection_string(&format!(
            "DefaultEndpointsProtocol=https;AccountName={};AccountKey={};EndpointSuffix={}",
            account_name, raw, DEFAULT_ENDPOINT_SUFFIX
        ))
    }

    /// Replaces the blob endpoint (e.g. to target a local emulator)
    pub fn with_endpoint(mut self, endpoint: Url) -> Self {
        self.blob_endpoint = endpoint;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn blob_endpoint(&self) -> &Url {
        &self.blob_endpoint
    }

    /// Signs `string_to_sign` with the account key
    fn sign(&self, string_to_sign: &str) -> StorageResult<String> {
        let key = STANDARD
            .decode(self.key.expose())
            .map_err(|_| StorageError::Signing("account key is not valid base64".to_string()))?;
        let mut mac = HmacSha256::new_from_slice(&key)
            .map_err(|e| StorageError::Signing(e.to_string()))?;
        mac.update(string_to_sign.as_bytes());
        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }
}

impl fmt::Debug for StorageAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageAccount")
            .field("name", &self.name)
            .field("key", &self.key)
            .field("blob_endpoint", &self.blob_endpoint.as_str())
            .finish()
    }
}

/// A blob container reached over the Blob service REST API
#[derive(Debug, Clone)]
pub struct AzureBlobStore {
    client: Client,
    account: StorageAccount,
    container: String,
    container_url: Url,
}

impl AzureBlobStore {
    /// Creates a store bound to `container`
    pub fn new(client: Client, account: StorageAccount, container: &str) -> StorageResult<Self> {
        let mut container_url = account.blob_endpoint().clone();
        container_url
            .path_segments_mut()
            .map_err(|_| StorageError::InvalidAddress(account.blob_endpoint().to_string()))?
            .pop_if_empty()
            .push(container);

        Ok(Self {
            client,
            account,
            container: container.to_string(),
            container_url,
        })
    }

    /// Creates a store from the storage section of the configuration
    pub fn from_config(client: Client, config: &StorageConfig, secret: &Secret) -> StorageResult<Self> {
        let mut account = StorageAccount::from_secret(secret, &config.account_name)?;

        if let Some(endpoint) = &config.endpoint {
            let endpoint = Url::parse(endpoint)
                .map_err(|e| StorageError::InvalidAddress(format!("{}: {}", endpoint, e)))?;
            account = account.with_endpoint(endpoint);
        }

        Self::new(client, account, &config.container_name)
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    /// Address of the blob stored under `key`
    pub fn blob_url(&self, key: &str) -> StorageResult<Url> {
        let mut url = self.container_url.clone();
        url.path_segments_mut()
            .map_err(|_| StorageError::InvalidAddress(self.container_url.to_string()))?
            .extend(key.split('/'));
        Ok(url)
    }
}

#[async_trait]
impl ObjectStore for AzureBlobStore {
    async fn upload(&self, key: &str, local_path: &Path, overwrite: bool) -> StorageResult<String> {
        let body = tokio::fs::read(local_path)
            .await
            .map_err(|source| StorageError::Staging {
                path: PathBuf::from(local_path),
                source,
            })?;

        let url = self.blob_url(key)?;
        let date = Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string();
        let content_type = content_type_for(key);
        let if_none_match = if overwrite { "" } else { "*" };

        let mut ms_headers = BTreeMap::new();
        ms_headers.insert("x-ms-blob-type", "BlockBlob");
        ms_headers.insert("x-ms-date", date.as_str());
        ms_headers.insert("x-ms-version", API_VERSION);

        let canonical_resource = format!("/{}{}", self.account.name(), url.path());
        let string_to_sign = put_string_to_sign(
            body.len(),
            content_type,
            if_none_match,
            &ms_headers,
            &canonical_resource,
        );
        let signature = self.account.sign(&string_to_sign)?;

        let mut request = self
            .client
            .put(url.clone())
            .header("Content-Type", content_type)
            .header(
                "Authorization",
                format!("SharedKey {}:{}", self.account.name(), signature),
            );
        for (name, value) in &ms_headers {
            request = request.header(*name, *value);
        }
        if !overwrite {
            request = request.header("If-None-Match", "*");
        }

        tracing::debug!("PUT {} ({} bytes)", url, body.len());

        let response = request
            .body(body)
            .send()
            .await
            .map_err(|source| StorageError::Http {
                key: key.to_string(),
                source,
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(url.to_string());
        }

        if !overwrite && status == StatusCode::CONFLICT {
            return Err(StorageError::AlreadyExists {
                key: key.to_string(),
            });
        }

        let message = response.text().await.unwrap_or_default();
        Err(StorageError::Upload {
            key: key.to_string(),
            status: status.as_u16(),
            message,
        })
    }
}

/// Content-Type sent for a blob, by key extension
fn content_type_for(key: &str) -> &'static str {
    let extension = key
        .rsplit('/')
        .next()
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "text/javascript; charset=utf-8",
        Some("json") => "application/json",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

/// Builds the SharedKey string-to-sign for a `PUT` request
///
/// Field order is fixed by the service: verb, the eleven standard headers,
/// then canonicalized `x-ms-*` headers and the canonicalized resource.
fn put_string_to_sign(
    content_length: usize,
    content_type: &str,
    if_none_match: &str,
    ms_headers: &BTreeMap<&str, &str>,
    canonical_resource: &str,
) -> String {
    let content_length = if content_length == 0 {
        String::new()
    } else {
        content_length.to_string()
    };

    let canonical_headers: String = ms_headers
        .iter()
        .map(|(name, value)| format!("{}:{}\n", name, value.trim()))
        .collect();

    [
        "PUT",
        "",                      // Content-Encoding
        "",                      // Content-Language
        content_length.as_str(), // Content-Length
        "",                      // Content-MD5
        content_type,
        "", // Date
        "", // If-Modified-Since
        "", // If-Match
        if_none_match,
        "", // If-Unmodified-Since
        "", // Range
    ]
    .join("\n")
        + "\n"
        + &canonical_headers
        + canonical_resource
}
