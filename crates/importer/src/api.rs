//! REST client for the contact import service.
//!
//! Wraps the three import endpoints (file upload, mapping confirmation,
//! field-option discovery) using [`reqwest`].

use std::path::Path;

use contacthub_core::fields::FieldOptions;
use contacthub_core::import::{ConfirmMappingRequest, ConfirmMappingResponse, UploadResponse};

use crate::config::{ConfigError, ImportConfig};

pub const UPLOAD_PATH: &str = "/api/contacts/upload-contacts-file";
pub const CONFIRM_MAPPING_PATH: &str = "/api/contacts/confirm-mapping";
pub const FIELD_OPTIONS_PATH: &str = "/api/contacts/field-options";

/// HTTP client for one import service deployment.
#[derive(Debug, Clone)]
pub struct ImportApi {
    client: reqwest::Client,
    base_url: String,
}

/// A contact spreadsheet ready to be sent as a multipart part.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Errors from the import service REST layer.
#[derive(Debug, thiserror::Error)]
pub enum ImportApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a non-2xx status code.
    #[error("Import service error ({status}): {}", .message.as_deref().unwrap_or("<no message>"))]
    Api {
        status: u16,
        /// The `error` field of the JSON body, when there was one.
        message: Option<String>,
    },

    /// A 2xx response whose body did not have the expected shape.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl ImportApiError {
    /// Message to surface for a failed `operation`: the server's own
    /// message when it sent one, otherwise one built from the status.
    pub fn user_message(&self, operation: &str) -> String {
        match self {
            Self::Api {
                message: Some(message),
                ..
            } => message.clone(),
            Self::Api {
                status,
                message: None,
            } => {
                let reason = reqwest::StatusCode::from_u16(*status)
                    .ok()
                    .and_then(|s| s.canonical_reason())
                    .map(|r| format!(" {r}"))
                    .unwrap_or_default();
                format!("{operation} failed with status {status}{reason}")
            }
            Self::Request(e) => format!("{operation} failed: {e}"),
            Self::MalformedResponse(detail) => {
                format!("{operation} failed: unexpected response from server ({detail})")
            }
        }
    }
}

impl UploadFile {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, keeping only its final path component as
    /// the upload name.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "contacts.csv".to_string());
        Ok(Self { filename, bytes })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// MIME type inferred from the extension, for the spreadsheet formats
    /// the service parses.
    pub fn mime_type(&self) -> Option<&'static str> {
        let extension = Path::new(&self.filename)
            .extension()?
            .to_str()?
            .to_ascii_lowercase();
        match extension.as_str() {
            "csv" => Some("text/csv"),
            "xlsx" => Some("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
            "xls" => Some("application/vnd.ms-excel"),
            _ => None,
        }
    }
}

impl ImportApi {
    /// Create an API client for an import service.
    ///
    /// * `base_url` - e.g. `https://api.example.com`; a trailing `/` is
    ///   ignored.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// Build a client from configuration, applying the request timeout
    /// when one is set.
    pub fn from_config(config: &ImportConfig) -> Result<Self, ConfigError> {
        let base_url = config.base_url()?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self::with_client(builder.build()?, base_url))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Upload a contact file for parsing and column inference.
    ///
    /// Sends `POST /api/contacts/upload-contacts-file` as multipart with
    /// the file under `file` and the owner identity under `email`.
    pub async fn upload_contacts_file(
        &self,
        file: &UploadFile,
        owner: &str,
    ) -> Result<UploadResponse, ImportApiError> {
        let mut part =
            reqwest::multipart::Part::bytes(file.bytes.clone()).file_name(file.filename.clone());
        if let Some(mime) = file.mime_type() {
            part = part.mime_str(mime)?;
        }

        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("email", owner.to_string());

        tracing::debug!(
            filename = %file.filename,
            bytes = file.len(),
            "Sending contacts file to import service",
        );

        let response = self
            .client
            .post(self.url(UPLOAD_PATH))
            .multipart(form)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Submit the final column mapping for validation and import.
    ///
    /// Sends `POST /api/contacts/confirm-mapping` with a JSON body.
    pub async fn confirm_mapping(
        &self,
        request: &ConfirmMappingRequest,
    ) -> Result<ConfirmMappingResponse, ImportApiError> {
        tracing::debug!(
            upload_id = %request.upload_id,
            mapped_columns = request.field_mappings.len(),
            "Confirming field mapping",
        );

        let response = self
            .client
            .post(self.url(CONFIRM_MAPPING_PATH))
            .json(request)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Fetch the selectable target fields.
    ///
    /// Sends `GET /api/contacts/field-options`.
    pub async fn field_options(&self) -> Result<FieldOptions, ImportApiError> {
        let response = self.client.get(self.url(FIELD_OPTIONS_PATH)).send().await?;
        Self::parse_response(response).await
    }

    // ---- private helpers ----

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Ensure the response has a success status code. On failure the body
    /// is read and its JSON `error` field, if any, becomes the message.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ImportApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ImportApiError::Api {
                status: status.as_u16(),
                message: server_error_message(&body),
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ImportApiError> {
        let response = Self::ensure_success(response).await?;
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| ImportApiError::MalformedResponse(e.to_string()))
    }
}

/// Extract a non-blank string `error` field from a JSON error body.
fn server_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let message = value.get("error")?.as_str()?.trim();
    (!message.is_empty()).then(|| message.to_string())
}
