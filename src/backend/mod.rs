//! Client for the audience-segmentation backend.
//!
//! Speaks the three-call HTTP contract: upload an identifiers file, run the
//! selection, download the resulting groups archive. The partitioning logic
//! itself lives entirely behind these endpoints.

mod types;

pub use types::{
    SelectionOutcome, SelectionRequest, SelectionStats, UploadContract, UploadReceipt,
};

use std::path::Path;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, warn};

/// Path of the download endpoint, shared by both upload contracts.
const DOWNLOAD_PATH: &str = "/download_user_groups";

/// Errors that can occur talking to the segmentation backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Failed to reach the backend or to complete the request.
    #[error("connection error: {0}")]
    Connection(String),
    /// Backend answered with a non-success status.
    #[error("backend error: HTTP {status}: {body}")]
    Api { status: u16, body: String },
    /// Response body did not match the contract.
    #[error("unexpected response: {0}")]
    Parse(String),
    /// Upload response carried no usable file identifier.
    #[error("upload response carried an empty file identifier")]
    EmptyFileId,
    /// Local file could not be read for upload.
    #[error("failed to read {path}: {message}")]
    FileRead { path: String, message: String },
}

/// HTTP client for the segmentation service.
pub struct BackendClient {
    client: Client,
    endpoint: String,
    contract: UploadContract,
}

impl BackendClient {
    /// Create a client for the given backend base URL.
    ///
    /// The endpoint is stored without a trailing slash so request paths can
    /// be appended directly.
    pub fn new(
        endpoint: &str,
        contract: UploadContract,
        user_agent: &str,
        timeout: Duration,
    ) -> Self {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            contract,
        }
    }

    /// The upload contract this client speaks.
    pub fn contract(&self) -> UploadContract {
        self.contract
    }

    /// Upload an identifiers file as multipart form data.
    ///
    /// The multipart field name is fixed by the contract; sending the wrong
    /// one is a backend rejection, not a negotiation.
    pub async fn upload_identifiers(&self, path: &Path) -> Result<UploadReceipt, BackendError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| BackendError::FileRead {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "identifiers".to_string());
        let mime = mime_guess::from_path(path).first_or_octet_stream();

        let part = Part::bytes(bytes)
            .file_name(file_name.clone())
            .mime_str(mime.essence_str())
            .map_err(|e| BackendError::Connection(e.to_string()))?;
        let form = Form::new().part(self.contract.field_name(), part);

        let url = format!("{}{}", self.endpoint, self.contract.endpoint_path());
        debug!("Uploading {} to {}", file_name, url);

        let resp = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| BackendError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(BackendError::Api { status, body });
        }

        let receipt: UploadReceipt = resp
            .json()
            .await
            .map_err(|e| BackendError::Parse(e.to_string()))?;

        if receipt.file_id.is_empty() {
            return Err(BackendError::EmptyFileId);
        }

        debug!("Upload accepted, file_id={}", receipt.file_id);
        Ok(receipt)
    }

    /// Run the selection for the given request and return the statistics
    /// plus the archive filename.
    pub async fn select_users(
        &self,
        request: &SelectionRequest,
    ) -> Result<SelectionOutcome, BackendError> {
        let url = format!("{}/select_users", self.endpoint);
        debug!(
            "Selecting users: category={:?} open_rate={} file_id={}",
            request.category, request.open_rate, request.file_id
        );

        let resp = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| BackendError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(BackendError::Api { status, body });
        }

        let outcome: SelectionOutcome = resp
            .json()
            .await
            .map_err(|e| BackendError::Parse(e.to_string()))?;

        if !outcome.stats.is_balanced() {
            warn!(
                "Group sizes sum to {} but total_users is {}",
                outcome.stats.groups_total(),
                outcome.stats.total_users
            );
        }

        Ok(outcome)
    }

    /// Fetch the groups archive as raw bytes.
    ///
    /// The archive filename is passed explicitly as a query parameter so the
    /// call does not depend on server-side "last result" state.
    pub async fn download_groups(&self, zip_filename: &str) -> Result<Vec<u8>, BackendError> {
        let url = format!("{}{}", self.endpoint, DOWNLOAD_PATH);
        debug!("Downloading archive {}", zip_filename);

        let resp = self
            .client
            .get(&url)
            .query(&[("filename", zip_filename)])
            .send()
            .await
            .map_err(|e| BackendError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(BackendError::Api { status, body });
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| BackendError::Connection(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}
