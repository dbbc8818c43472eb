//! Backend client for the tube-sort puzzle server.
//!
//! # Architecture
//!
//! - [`GameBackend`] - one method per server endpoint, returning domain values
//! - [`HttpBackend`] - the reqwest implementation used by the binary
//! - [`wire`] - typed JSON bodies
//! - [`transport`] - single-attempt sending and error-body handling
//!
//! # Error Handling
//!
//! Every method returns `Err(BackendError)` only when no usable answer came
//! back (connection failure, undecodable body, or an HTTP error on an
//! endpoint whose failures are not part of its contract). Refusals that the
//! contract names - a rejected move, a failed solve, a refused commit, a
//! failed analysis - are `Ok` values of the reply enums, so callers can tell
//! "the server said no" apart from "the server could not be reached".

pub mod transport;
pub mod wire;

use std::future::Future;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use thiserror::Error;

use transport::{SendOutcome, extract_error_message, read_capped_error_body, send_once};
use tubesort_types::{Move, RankedMove, Solution, Tube};

pub use tubesort_types;

/// Where the bundled development server listens.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

const CONNECT_TIMEOUT_SECS: u64 = 10;
// Solving runs a depth-first search server-side and can take a while.
const REQUEST_TIMEOUT_SECS: u64 = 120;
const POOL_IDLE_TIMEOUT_SECS: u64 = 90;

/// The server endpoints this client speaks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    InitialState,
    TopMoves,
    ApplyMove,
    UndoMove,
    SolvePuzzle,
    UpdateTubes,
    AnalyzeTubes,
    AddDeadEnd,
}

impl Endpoint {
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Endpoint::InitialState => "/api/initial_state",
            Endpoint::TopMoves => "/api/top_moves",
            Endpoint::ApplyMove => "/api/apply_move",
            Endpoint::UndoMove => "/api/undo_move",
            Endpoint::SolvePuzzle => "/api/solve_puzzle",
            Endpoint::UpdateTubes => "/api/update_tubes",
            Endpoint::AnalyzeTubes => "/api/analyze_tubes",
            Endpoint::AddDeadEnd => "/api/add_dead_end",
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: Endpoint,
        source: reqwest::Error,
    },
    #[error("{endpoint} returned HTTP {status}: {message}")]
    Status {
        endpoint: Endpoint,
        status: u16,
        message: String,
    },
    #[error("{endpoint} returned an unreadable body: {source}")]
    Decode {
        endpoint: Endpoint,
        source: serde_json::Error,
    },
    #[error("{endpoint} reported success without {missing}")]
    Incomplete {
        endpoint: Endpoint,
        missing: &'static str,
    },
}

impl BackendError {
    #[must_use]
    pub const fn endpoint(&self) -> Endpoint {
        match self {
            BackendError::Transport { endpoint, .. }
            | BackendError::Status { endpoint, .. }
            | BackendError::Decode { endpoint, .. }
            | BackendError::Incomplete { endpoint, .. } => *endpoint,
        }
    }
}

// ============================================================================
// Replies
// ============================================================================

/// Result of `apply_move` when the server answered.
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyMoveReply {
    Applied { tubes: Vec<Tube> },
    /// The move solved the puzzle.
    Completed {
        tubes: Vec<Tube>,
        final_moves: Vec<Move>,
    },
    Rejected { reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SolveReply {
    /// An empty solution means "already solved".
    Solved(Solution),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum UpdateTubesReply {
    /// Committed. The server may echo a normalized layout.
    Accepted(Option<Vec<Tube>>),
    Refused(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisReply {
    Tubes {
        tubes: Vec<Tube>,
        warning: Option<String>,
    },
    Failed(String),
}

/// An uploaded photograph of the board.
#[derive(Debug, Clone)]
pub struct BoardImage {
    pub bytes: Vec<u8>,
    /// MIME type, e.g. `image/png`.
    pub image_type: String,
}

/// The request/response surface of the puzzle server.
///
/// Only one call is ever outstanding per workflow; implementations need not
/// support pipelining.
pub trait GameBackend {
    fn initial_state(&self) -> impl Future<Output = Result<Vec<Tube>, BackendError>> + Send;

    /// Ranked candidate moves for the server's current state. Empty means dead end.
    fn top_moves(&self) -> impl Future<Output = Result<Vec<RankedMove>, BackendError>> + Send;

    fn apply_move(
        &self,
        movement: &Move,
    ) -> impl Future<Output = Result<ApplyMoveReply, BackendError>> + Send;

    fn undo_move(&self) -> impl Future<Output = Result<Vec<Tube>, BackendError>> + Send;

    /// `current_state` set means "solve from here" instead of the original puzzle.
    fn solve_puzzle(
        &self,
        current_state: Option<&[Tube]>,
    ) -> impl Future<Output = Result<SolveReply, BackendError>> + Send;

    fn update_tubes(
        &self,
        tubes: &[Tube],
    ) -> impl Future<Output = Result<UpdateTubesReply, BackendError>> + Send;

    fn analyze_tubes(
        &self,
        image: BoardImage,
    ) -> impl Future<Output = Result<AnalysisReply, BackendError>> + Send;

    /// Best-effort telemetry.
    fn add_dead_end(&self, state: &[Tube]) -> impl Future<Output = Result<(), BackendError>> + Send;
}

// ============================================================================
// HTTP implementation
// ============================================================================

#[derive(Debug, Clone)]
pub struct HttpBackendConfig {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for HttpBackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
        }
    }
}

fn base_client_builder(config: &HttpBackendConfig) -> reqwest::ClientBuilder {
    use reqwest::header::{HeaderMap, HeaderValue};

    let mut default_headers = HeaderMap::new();
    default_headers.insert("X-Tubesort-Lang", HeaderValue::from_static("rust"));
    default_headers.insert(
        "X-Tubesort-OS",
        HeaderValue::from_static(std::env::consts::OS),
    );

    reqwest::Client::builder()
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout)
        .redirect(reqwest::redirect::Policy::none())
        .pool_idle_timeout(Some(Duration::from_secs(POOL_IDLE_TIMEOUT_SECS)))
        .default_headers(default_headers)
}

/// [`GameBackend`] over the server's JSON HTTP API.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(config: &HttpBackendConfig) -> Result<Self, reqwest::Error> {
        let client = base_client_builder(config).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }

    /// Send and decode a 2xx body; any other status is `BackendError::Status`.
    async fn fetch<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        request: reqwest::RequestBuilder,
    ) -> Result<T, BackendError> {
        match self.fetch_or_refusal(endpoint, request).await? {
            Ok(body) => Ok(body),
            Err((status, message)) => Err(BackendError::Status {
                endpoint,
                status,
                message,
            }),
        }
    }

    /// Like [`Self::fetch`], but hands non-2xx answers back as `(status, message)`
    /// for endpoints where the server reports refusals through the status code.
    async fn fetch_or_refusal<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        request: reqwest::RequestBuilder,
    ) -> Result<Result<T, (u16, String)>, BackendError> {
        match send_once(request, endpoint).await {
            SendOutcome::Success(response) => {
                let bytes = response
                    .bytes()
                    .await
                    .map_err(|source| BackendError::Transport { endpoint, source })?;
                serde_json::from_slice(&bytes)
                    .map(Ok)
                    .map_err(|source| BackendError::Decode { endpoint, source })
            }
            SendOutcome::HttpError(response) => {
                let status = response.status().as_u16();
                let body = read_capped_error_body(response).await;
                let message = extract_error_message(&body).unwrap_or(body);
                tracing::warn!(%endpoint, status, %message, "Backend returned error status");
                Ok(Err((status, message)))
            }
            SendOutcome::ConnectionError(source) => {
                Err(BackendError::Transport { endpoint, source })
            }
        }
    }
}

fn refusal_message(message: Option<String>, fallback: &str) -> String {
    message
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

impl GameBackend for HttpBackend {
    async fn initial_state(&self) -> Result<Vec<Tube>, BackendError> {
        let endpoint = Endpoint::InitialState;
        let body: wire::TubesResponse = self
            .fetch(endpoint, self.client.get(self.url(endpoint)))
            .await?;
        Ok(body.tubes)
    }

    async fn top_moves(&self) -> Result<Vec<RankedMove>, BackendError> {
        let endpoint = Endpoint::TopMoves;
        let body: wire::TopMovesResponse = self
            .fetch(endpoint, self.client.get(self.url(endpoint)))
            .await?;
        Ok(body.top_moves.into_iter().map(Into::into).collect())
    }

    async fn apply_move(&self, movement: &Move) -> Result<ApplyMoveReply, BackendError> {
        let endpoint = Endpoint::ApplyMove;
        let request = self
            .client
            .post(self.url(endpoint))
            .json(&wire::ApplyMoveRequest {
                from_tube: &movement.from,
                to_tube: &movement.to,
            });

        let body: wire::ApplyMoveResponse = match self.fetch_or_refusal(endpoint, request).await? {
            Ok(body) => body,
            Err((_, reason)) => return Ok(ApplyMoveReply::Rejected { reason }),
        };

        if !body.status.is_success() {
            return Ok(ApplyMoveReply::Rejected {
                reason: refusal_message(body.message, "move rejected"),
            });
        }
        let tubes = body.tubes.ok_or(BackendError::Incomplete {
            endpoint,
            missing: "tubes",
        })?;
        if body.game_completed {
            return Ok(ApplyMoveReply::Completed {
                tubes,
                final_moves: body.final_move_list,
            });
        }
        Ok(ApplyMoveReply::Applied { tubes })
    }

    async fn undo_move(&self) -> Result<Vec<Tube>, BackendError> {
        let endpoint = Endpoint::UndoMove;
        let request = self
            .client
            .post(self.url(endpoint))
            .json(&serde_json::json!({}));
        let body: wire::TubesResponse = self.fetch(endpoint, request).await?;
        Ok(body.tubes)
    }

    async fn solve_puzzle(&self, current_state: Option<&[Tube]>) -> Result<SolveReply, BackendError> {
        let endpoint = Endpoint::SolvePuzzle;
        let request = self
            .client
            .post(self.url(endpoint))
            .json(&wire::SolveRequest { current_state });

        let body: wire::SolveResponse = match self.fetch_or_refusal(endpoint, request).await? {
            Ok(body) => body,
            Err((_, message)) => return Ok(SolveReply::Failed(message)),
        };

        if !body.status.is_success() {
            return Ok(SolveReply::Failed(refusal_message(
                body.message,
                "no solution found",
            )));
        }
        Ok(SolveReply::Solved(body.solution.unwrap_or_default()))
    }

    async fn update_tubes(&self, tubes: &[Tube]) -> Result<UpdateTubesReply, BackendError> {
        let endpoint = Endpoint::UpdateTubes;
        let request = self
            .client
            .post(self.url(endpoint))
            .json(&wire::UpdateTubesRequest { tubes });

        let body: wire::UpdateTubesResponse = match self.fetch_or_refusal(endpoint, request).await?
        {
            Ok(body) => body,
            Err((_, message)) => return Ok(UpdateTubesReply::Refused(message)),
        };

        if !body.status.is_success() {
            return Ok(UpdateTubesReply::Refused(refusal_message(
                body.message,
                "tube update refused",
            )));
        }
        Ok(UpdateTubesReply::Accepted(body.tubes))
    }

    async fn analyze_tubes(&self, image: BoardImage) -> Result<AnalysisReply, BackendError> {
        let endpoint = Endpoint::AnalyzeTubes;
        let image_type = image.image_type.clone();
        let part = Part::bytes(image.bytes)
            .file_name("board")
            .mime_str(&image.image_type)
            .map_err(|source| BackendError::Transport { endpoint, source })?;
        let form = Form::new()
            .part("image", part)
            .text("image_type", image_type);
        let request = self.client.post(self.url(endpoint)).multipart(form);

        let body: wire::AnalyzeResponse = match self.fetch_or_refusal(endpoint, request).await? {
            Ok(body) => body,
            Err((_, message)) => return Ok(AnalysisReply::Failed(message)),
        };

        match (body.status.is_success(), body.tubes) {
            (true, Some(tubes)) => Ok(AnalysisReply::Tubes {
                tubes,
                warning: body.warning,
            }),
            (true, None) => Err(BackendError::Incomplete {
                endpoint,
                missing: "tubes",
            }),
            (false, _) => Ok(AnalysisReply::Failed(refusal_message(
                body.error,
                "image analysis failed",
            ))),
        }
    }

    async fn add_dead_end(&self, state: &[Tube]) -> Result<(), BackendError> {
        let endpoint = Endpoint::AddDeadEnd;
        let request = self
            .client
            .post(self.url(endpoint))
            .json(&wire::DeadEndRequest { state });
        match send_once(request, endpoint).await {
            SendOutcome::Success(_) => Ok(()),
            SendOutcome::HttpError(response) => Err(BackendError::Status {
                endpoint,
                status: response.status().as_u16(),
                message: read_capped_error_body(response).await,
            }),
            SendOutcome::ConnectionError(source) => {
                Err(BackendError::Transport { endpoint, source })
            }
        }
    }
}
