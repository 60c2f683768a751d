use std::path::PathBuf;

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

use seedscan_schema::{AnalysisInput, AnalysisResult};

mod api;
mod csv;
mod mock;

pub use api::ApiClient;
pub use csv::generate_csv;
pub use mock::MockBackend;

/// Failures surfaced by a backend. Every variant is terminal for the
/// current submission only; the caller recovers by retry or reset.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with a non-success status. `detail` is the
    /// server's own message when the error body parsed, otherwise the
    /// generic `HTTP <status>: <reason>` fallback.
    #[error("{detail}")]
    Api { status: StatusCode, detail: String },

    /// No usable response reached us at all.
    #[error("could not reach the analysis server; check the network connection")]
    Transport(#[from] reqwest::Error),

    /// The per-analysis download endpoint refused the request.
    #[error("could not download the result file (HTTP {0})")]
    Download(StatusCode),

    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Seam the session controller routes through: the real API client when the
/// connectivity probe succeeded, the mock otherwise.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    async fn analyze(&self, input: &AnalysisInput) -> Result<AnalysisResult, ClientError>;
}
