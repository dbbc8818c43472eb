use thiserror::Error;

use tubesort_types::SlotCoord;

use crate::solve::SolvePhase;

/// Precondition violations at the engine's entry points.
///
/// Backend failures are not represented here; they reach the view as
/// [`crate::ViewEvent`]s.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Solve execution and color reconciliation both claim the board.
    #[error("{0} is in progress")]
    ConcurrentEdit(&'static str),
    #[error("cannot {action} while the solver is {phase}")]
    InvalidTransition {
        action: &'static str,
        phase: SolvePhase,
    },
    #[error("no color reconciliation is active")]
    NoReconciliation,
    #[error("slot {0} is outside the board")]
    InvalidSlot(SlotCoord),
    #[error("analyzed layout does not match the board's tubes")]
    ShapeMismatch,
    #[error("no move numbered {0}")]
    UnknownMove(usize),
    #[error("no board loaded yet")]
    NotLoaded,
}

pub(crate) const EXECUTION: &str = "solution execution";
pub(crate) const RECONCILIATION: &str = "color reconciliation";
