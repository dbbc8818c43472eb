//! Typed request and response bodies for the backend's JSON API.
//!
//! Parse errors happen at the serde boundary, not scattered through the
//! client. Optional fields default so that the older server revisions, which
//! omit `status` on some endpoints, still decode.

use serde::{Deserialize, Serialize};

use tubesort_types::{Move, RankedMove, Solution, Tube};

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ApplyMoveRequest<'a> {
    pub from_tube: &'a str,
    pub to_tube: &'a str,
}

/// Body of `solve_puzzle`. Presence of `current_state` selects resume mode.
#[derive(Debug, Default, Serialize)]
pub struct SolveRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_state: Option<&'a [Tube]>,
}

#[derive(Debug, Serialize)]
pub struct UpdateTubesRequest<'a> {
    pub tubes: &'a [Tube],
}

#[derive(Debug, Serialize)]
pub struct DeadEndRequest<'a> {
    pub state: &'a [Tube],
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Success,
    Failure,
    Error,
    /// Unknown status - treated as a failure by callers
    #[serde(other)]
    Unknown,
}

impl Status {
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Status::Success)
    }
}

#[derive(Debug, Deserialize)]
pub struct TubesResponse {
    pub tubes: Vec<Tube>,
}

#[derive(Debug, Deserialize)]
pub struct TopMovesResponse {
    #[serde(default)]
    pub top_moves: Vec<RankedMoveEntry>,
}

/// One side of a `movement` pair: the server has sent both bare tube names and
/// whole tube objects here.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TubeRef {
    Name(String),
    Tube { name: String },
}

impl TubeRef {
    #[must_use]
    pub fn into_name(self) -> String {
        match self {
            TubeRef::Name(name) | TubeRef::Tube { name } => name,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RankedMoveEntry {
    pub movement: (TubeRef, TubeRef),
    #[serde(default)]
    pub score: f64,
}

impl From<RankedMoveEntry> for RankedMove {
    fn from(entry: RankedMoveEntry) -> Self {
        let (from, to) = entry.movement;
        RankedMove::new(Move::new(from.into_name(), to.into_name()), entry.score)
    }
}

#[derive(Debug, Deserialize)]
pub struct ApplyMoveResponse {
    #[serde(default)]
    pub status: Status,
    pub tubes: Option<Vec<Tube>>,
    pub message: Option<String>,
    #[serde(default)]
    pub game_completed: bool,
    #[serde(default)]
    pub final_move_list: Vec<Move>,
}

#[derive(Debug, Deserialize)]
pub struct SolveResponse {
    #[serde(default)]
    pub status: Status,
    pub solution: Option<Solution>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTubesResponse {
    #[serde(default)]
    pub status: Status,
    pub tubes: Option<Vec<Tube>>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeResponse {
    #[serde(default)]
    pub status: Status,
    pub tubes: Option<Vec<Tube>>,
    pub error: Option<String>,
    pub warning: Option<String>,
}
