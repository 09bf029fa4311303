//! HTTP client for the bidding backend.
//!
//! Two endpoints: form submission (`/napi/bidding/submit`, JSON) and file
//! upload (`/napi/bidding/upload`, multipart). Both answer with an
//! [`ApiResponse`] envelope.

use std::path::Path;
use std::time::Duration;

use biddoc_shared::{BidDocError, BiddingFormData, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use url::Url;

pub const SUBMIT_PATH: &str = "/napi/bidding/submit";
pub const UPLOAD_PATH: &str = "/napi/bidding/upload";

/// Response envelope used by every endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// Identifier of a submitted form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitData {
    pub id: String,
    pub bid_number: String,
}

/// A file stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadData {
    pub id: String,
    pub name: String,
    pub url: String,
}

pub type SubmitResponse = ApiResponse<SubmitData>;
pub type UploadResponse = ApiResponse<UploadData>;

/// Client bound to one backend.
#[derive(Debug, Clone)]
pub struct SubmissionClient {
    http: reqwest::Client,
    base_url: Url,
}

impl SubmissionClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| BidDocError::config(format!("invalid API base URL {base_url}: {e}")))?;
        let http = reqwest::Client::builder()
            .user_agent(concat!("biddoc/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| BidDocError::Network(format!("client build: {e}")))?;
        Ok(Self { http, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| BidDocError::config(format!("invalid endpoint {path}: {e}")))
    }

    /// POST the form as JSON.
    #[instrument(skip_all, fields(bid_number = %form.basic_info.bid_number))]
    pub async fn submit(&self, form: &BiddingFormData) -> Result<SubmitResponse> {
        let url = self.endpoint(SUBMIT_PATH)?;
        let response = self
            .http
            .post(url.clone())
            .json(form)
            .send()
            .await
            .map_err(|e| BidDocError::Network(format!("{url}: {e}")))?;
        let result: SubmitResponse = read_envelope(response).await?;
        info!(code = result.code, message = %result.message, "form submitted");
        Ok(result)
    }

    /// POST a local file as the `file` part of a multipart form.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub async fn upload_file(&self, path: &Path) -> Result<UploadResponse> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| BidDocError::io(path, e))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".into());

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.clone())
            .mime_str(mime_for(path))
            .map_err(|e| BidDocError::Network(format!("multipart: {e}")))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let url = self.endpoint(UPLOAD_PATH)?;
        let response = self
            .http
            .post(url.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|e| BidDocError::Network(format!("{url}: {e}")))?;
        let result: UploadResponse = read_envelope(response).await?;
        info!(file = %file_name, code = result.code, "file uploaded");
        Ok(result)
    }
}

fn mime_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("docx") => biddoc_docx::DOCX_MIME,
        Some(ext) if ext.eq_ignore_ascii_case("pdf") => "application/pdf",
        Some(ext) if ext.eq_ignore_ascii_case("json") => "application/json",
        _ => "application/octet-stream",
    }
}

async fn read_envelope<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        return Err(BidDocError::Network(format!(
            "HTTP error! status: {}",
            status.as_u16()
        )));
    }
    response
        .json::<T>()
        .await
        .map_err(|e| BidDocError::Network(format!("invalid response body: {e}")))
}
