//! Instance metadata lookups.
//!
//! Only the two documents the service needs: the instance id (reported
//! in `/health`) and the identity document (read once at startup to
//! learn the region).

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use greeter_core::GreeterConfig;

use crate::client::{self, FetchError};

const INSTANCE_ID_PATH: &str = "/latest/meta-data/instance-id";
const IDENTITY_DOCUMENT_PATH: &str = "/latest/dynamic/instance-identity/document";

pub type MetadataResult<T> = Result<T, MetadataError>;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("metadata request failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("metadata response is not valid UTF-8")]
    NotUtf8,

    #[error("metadata returned an empty {0}")]
    Empty(&'static str),

    #[error("failed to decode identity document: {0}")]
    Decode(String),
}

/// The fields of the identity document the service reads.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityDocument {
    pub region: String,
    #[serde(default)]
    pub instance_id: Option<String>,
    #[serde(default)]
    pub availability_zone: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MetadataClient {
    endpoint: String,
    timeout: Duration,
}

impl MetadataClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout,
        }
    }

    pub fn from_config(config: &GreeterConfig) -> Self {
        Self::new(config.metadata.endpoint.clone(), config.metadata_timeout())
    }

    /// The id of the instance this process runs on.
    pub async fn instance_id(&self) -> MetadataResult<String> {
        let body = client::get(&self.endpoint, INSTANCE_ID_PATH, self.timeout).await?;
        let id = std::str::from_utf8(&body)
            .map_err(|_| MetadataError::NotUtf8)?
            .trim()
            .to_string();
        if id.is_empty() {
            return Err(MetadataError::Empty("instance id"));
        }
        Ok(id)
    }

    pub async fn identity_document(&self) -> MetadataResult<IdentityDocument> {
        let body = client::get(&self.endpoint, IDENTITY_DOCUMENT_PATH, self.timeout).await?;
        let doc: IdentityDocument =
            serde_json::from_slice(&body).map_err(|e| MetadataError::Decode(e.to_string()))?;
        debug!(region = %doc.region, instance_id = ?doc.instance_id, "identity document read");
        Ok(doc)
    }

    /// The region this instance runs in.
    pub async fn region(&self) -> MetadataResult<String> {
        let doc = self.identity_document().await?;
        if doc.region.is_empty() {
            return Err(MetadataError::Empty("region"));
        }
        Ok(doc.region)
    }
}
