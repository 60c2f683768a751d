use std::path::Path;
use std::time::Duration;

use bytes::Bytes;
use reqwest::multipart;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use seedscan_schema::{AnalysisInput, AnalysisResult, GlobalStats};

use crate::{AnalysisBackend, ClientError};

/// Client for the remote prediction service. One request per submission, no
/// retries, no batching beyond what the endpoints themselves accept.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Same as [`ApiClient::new`] with a per-request timeout applied to
    /// every call, including the health probe.
    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `POST /predict/url` with `{url}`.
    pub async fn analyze_url(&self, url: &str) -> Result<AnalysisResult, ClientError> {
        self.post_json("/predict/url", &UrlRequest { url }).await
    }

    /// `POST /predict/urls` with `{urls}`.
    pub async fn analyze_urls(&self, urls: &[String]) -> Result<AnalysisResult, ClientError> {
        self.post_json("/predict/urls", &UrlBatchRequest { urls }).await
    }

    /// `POST /predict/file`, multipart field `file`.
    ///
    /// The content-type header of the request is left to the transport so
    /// the multipart boundary survives; only the part carries a guessed
    /// media type.
    pub async fn analyze_file(&self, path: &Path) -> Result<AnalysisResult, ClientError> {
        let data = tokio::fs::read(path).await.map_err(|source| ClientError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let mime = mime_guess::from_path(path).first_or_octet_stream();
        let part = multipart::Part::bytes(data)
            .file_name(file_name)
            .mime_str(mime.as_ref())?;
        let form = multipart::Form::new().part("file", part);

        let resp = self
            .http
            .post(format!("{}/predict/file", self.base_url))
            .multipart(form)
            .send()
            .await?;
        Self::parse_body(resp).await
    }

    /// `GET /stats`, service-wide aggregates.
    pub async fn get_stats(&self) -> Result<GlobalStats, ClientError> {
        let resp = self
            .http
            .get(format!("{}/stats", self.base_url))
            .send()
            .await?;
        Self::parse_body(resp).await
    }

    /// Connectivity probe. Any failure, transport-level or non-2xx, reads
    /// as "offline" to the caller.
    pub async fn get_health(&self) -> Result<(), ClientError> {
        let resp = self
            .http
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(Self::error_from_response(resp).await)
        }
    }

    /// `GET /download/{analysis_id}`, the server-rendered CSV.
    pub async fn download_results(&self, analysis_id: &str) -> Result<Bytes, ClientError> {
        let resp = self
            .http
            .get(format!("{}/download/{analysis_id}", self.base_url))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ClientError::Download(status));
        }
        Ok(resp.bytes().await?)
    }

    async fn post_json<T, B>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let resp = self
            .http
            .post(format!("{}{path}", self.base_url))
            .json(body)
            .send()
            .await?;
        Self::parse_body(resp).await
    }

    async fn parse_body<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ClientError> {
        if !resp.status().is_success() {
            return Err(Self::error_from_response(resp).await);
        }
        Ok(resp.json().await?)
    }

    async fn error_from_response(resp: reqwest::Response) -> ClientError {
        let status = resp.status();
        let fallback = format!(
            "HTTP {}: {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown Status")
        );
        let detail = match resp.json::<ErrorBody>().await {
            Ok(body) => {
                tracing::debug!(error = %body.error, timestamp = %body.timestamp, "server error body");
                if body.detail.is_empty() {
                    fallback
                } else {
                    body.detail
                }
            }
            Err(_) => fallback,
        };
        ClientError::Api { status, detail }
    }
}

#[async_trait::async_trait]
impl AnalysisBackend for ApiClient {
    async fn analyze(&self, input: &AnalysisInput) -> Result<AnalysisResult, ClientError> {
        match input {
            AnalysisInput::Url(url) => self.analyze_url(url).await,
            AnalysisInput::Urls(urls) => self.analyze_urls(urls).await,
            AnalysisInput::File(path) => self.analyze_file(path).await,
        }
    }
}

#[derive(Debug, Serialize)]
struct UrlRequest<'a> {
    url: &'a str,
}

#[derive(Debug, Serialize)]
struct UrlBatchRequest<'a> {
    urls: &'a [String],
}

/// Error body every endpoint uses on non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub detail: String,
    #[serde(default)]
    pub timestamp: String,
}
