use std::time::Duration;

use bytes::Bytes;

use seedscan_client::{generate_csv, AnalysisBackend, ApiClient, ClientError, MockBackend};
use seedscan_schema::{AnalysisInput, AnalysisResult, Comment};

use crate::config::AppConfig;
use crate::validate::{validate, ValidationError};

/// Observable state of one analysis session. Exactly one variant is active
/// at a time; only an explicit reset leaves `Result`.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Idle,
    Loading,
    Result(AnalysisResult),
    Error(String),
}

#[derive(Debug, Clone)]
pub enum SessionEvent {
    SubmitStarted,
    Completed(AnalysisResult),
    Failed(String),
    Reset,
}

/// Pure transition function for the session state machine.
///
/// Permitted transitions: `Idle`/`Error` enter `Loading` on submit,
/// `Loading` settles to `Result` or `Error`, and `Reset` returns to `Idle`
/// from anywhere. Every other (state, event) pair leaves the state
/// untouched.
pub fn reduce(state: SessionState, event: SessionEvent) -> SessionState {
    match (state, event) {
        (SessionState::Idle, SessionEvent::SubmitStarted)
        | (SessionState::Error(_), SessionEvent::SubmitStarted) => SessionState::Loading,
        (SessionState::Loading, SessionEvent::Completed(result)) => SessionState::Result(result),
        (SessionState::Loading, SessionEvent::Failed(message)) => SessionState::Error(message),
        (_, SessionEvent::Reset) => SessionState::Idle,
        (state, _) => state,
    }
}

/// How a `submit` call was handled.
///
/// `Settled` means the request ran and the session is now in `Result` or
/// `Error`. `Rejected` is a synchronous validation failure: no backend was
/// contacted and the state never entered `Loading`. `Busy` means the
/// session was not accepting submissions (one already in flight, or a
/// result that has not been reset yet); the call was dropped.
#[derive(Debug)]
pub enum SubmitOutcome {
    Settled,
    Rejected(ValidationError),
    Busy,
}

/// What an export produced: the server-rendered CSV when the download
/// endpoint cooperated, a locally generated one otherwise.
#[derive(Debug)]
pub enum CsvExport {
    Server(Bytes),
    Local(String),
}

impl CsvExport {
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            CsvExport::Server(bytes) => bytes.to_vec(),
            CsvExport::Local(text) => text.into_bytes(),
        }
    }
}

/// Owns the session state machine, the connectivity flag, and both
/// backends. At most one analysis is in flight; the `online` flag is read
/// during submission and written only by the probe (or an explicit
/// offline override).
pub struct AnalysisSession {
    state: SessionState,
    online: bool,
    api: ApiClient,
    mock: MockBackend,
}

impl AnalysisSession {
    pub fn new(api: ApiClient, mock: MockBackend) -> Self {
        Self {
            state: SessionState::Idle,
            online: true,
            api,
            mock,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ClientError> {
        let api = ApiClient::with_timeout(
            &config.api_base,
            Duration::from_secs(config.request_timeout_secs),
        )?;
        let mock = match config.mock_seed {
            Some(seed) => MockBackend::with_seed(seed),
            None => MockBackend::new(),
        }
        .with_latency(Duration::from_millis(config.mock_latency_ms));
        Ok(Self::new(api, mock))
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn mock(&self) -> &MockBackend {
        &self.mock
    }

    /// Explicit override, used when the operator forces demo mode.
    pub fn set_online(&mut self, online: bool) {
        self.online = online;
    }

    /// One-shot health probe; routing for every later submission follows
    /// the recorded flag until the probe is run again.
    pub async fn probe_connectivity(&mut self) -> bool {
        self.online = self.api.get_health().await.is_ok();
        if !self.online {
            tracing::warn!("prediction API unreachable, analyses will use demo data");
        }
        self.online
    }

    /// Runs one analysis to completion. Suspends only on the backend call;
    /// the state machine is advanced through [`reduce`] before and after.
    pub async fn submit(&mut self, input: AnalysisInput) -> SubmitOutcome {
        match self.state {
            SessionState::Loading => {
                tracing::warn!("submission ignored, an analysis is already in flight");
                return SubmitOutcome::Busy;
            }
            SessionState::Result(_) => {
                tracing::warn!("submission ignored, reset the current result first");
                return SubmitOutcome::Busy;
            }
            SessionState::Idle | SessionState::Error(_) => {}
        }

        if let Err(err) = validate(&input) {
            return SubmitOutcome::Rejected(err);
        }

        self.apply(SessionEvent::SubmitStarted);
        let source = input.source_label();
        let backend: &dyn AnalysisBackend = if self.online { &self.api } else { &self.mock };
        let outcome = backend.analyze(&input).await;

        match outcome {
            Ok(mut result) => {
                result.source = Some(source);
                self.apply(SessionEvent::Completed(result));
            }
            Err(err) => {
                tracing::error!(%err, "analysis failed");
                self.apply(SessionEvent::Failed(err.to_string()));
            }
        }
        SubmitOutcome::Settled
    }

    /// Discards any result or error. Independent of connectivity.
    pub fn reset(&mut self) {
        self.apply(SessionEvent::Reset);
    }

    /// Export preferring the server-rendered CSV; degrades to local
    /// generation over the passed (already filtered) comments on any
    /// failure, including a missing analysis id. Never fails.
    pub async fn export_csv<'a>(
        &self,
        comments: impl IntoIterator<Item = &'a Comment>,
        analysis_id: Option<&str>,
    ) -> CsvExport {
        if let Some(id) = analysis_id {
            match self.api.download_results(id).await {
                Ok(bytes) => return CsvExport::Server(bytes),
                Err(err) => {
                    tracing::warn!(%err, "server-side export failed, generating CSV locally");
                }
            }
        }
        CsvExport::Local(generate_csv(comments))
    }

    fn apply(&mut self, event: SessionEvent) {
        let state = std::mem::replace(&mut self.state, SessionState::Idle);
        self.state = reduce(state, event);
    }
}
