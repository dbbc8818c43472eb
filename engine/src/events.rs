//! Events for the view collaborator.
//!
//! The engine never renders. It queues what happened, and the front end
//! drains the queue after each call and draws whatever it needs from the
//! [`crate::App`] accessors.

use tubesort_types::{Move, SlotCoord};

#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    /// The displayed board changed (authoritative or tentative).
    BoardChanged,
    MovesUpdated { count: usize },
    /// No moves from here. `recovering` means an undo is scheduled.
    DeadEnd { recovering: bool },
    DeadEndRecoveryExhausted { attempts: u32 },
    MoveRejected { movement: Move, reason: String },
    GameCompleted { final_moves: Vec<Move> },
    SolutionReady { moves: Vec<Move> },
    AlreadySolved,
    SolveFailed { reason: String },
    ExecutionStarted { steps: usize },
    /// The user stopped execution. The next solve starts from the current board.
    ExecutionStopped { executed: usize, discarded: usize },
    /// Every step ran but the backend never confirmed completion.
    ExecutionExhausted { executed: usize },
    ExecutionAborted { executed: usize, reason: String },
    ReconciliationStarted { warning: Option<String> },
    SlotSelected { coord: SlotCoord, selected: bool },
    ColorsSwapped { first: SlotCoord, second: SlotCoord },
    ReconciliationAccepted,
    ReconciliationRejected,
    /// The tentative layout is kept so the user can retry or reject.
    AcceptFailed { reason: String },
    AnalysisFailed { reason: String },
    Notice(String),
    TransportFailure { context: &'static str, error: String },
}

impl ViewEvent {
    /// One-line description for text front ends.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::BoardChanged => "Board updated".to_string(),
            Self::MovesUpdated { count } => format!("{count} candidate move(s)"),
            Self::DeadEnd { recovering: true } => "Dead end reached; undoing last move".to_string(),
            Self::DeadEnd { recovering: false } => "Dead end reached".to_string(),
            Self::DeadEndRecoveryExhausted { attempts } => {
                format!("Still trapped after {attempts} undo(s); stopped undoing")
            }
            Self::MoveRejected { movement, reason } => {
                format!("Move {movement} rejected: {reason}")
            }
            Self::GameCompleted { final_moves } => {
                format!("Puzzle solved in {} move(s)!", final_moves.len())
            }
            Self::SolutionReady { moves } => {
                format!("Solution found: {} move(s). Type 'run' to execute", moves.len())
            }
            Self::AlreadySolved => "Puzzle is already solved".to_string(),
            Self::SolveFailed { reason } => format!("No solution: {reason}"),
            Self::ExecutionStarted { steps } => format!("Executing {steps} move(s)"),
            Self::ExecutionStopped {
                executed,
                discarded,
            } => format!(
                "Stopped after {executed} move(s); {discarded} skipped. Solve again to resume from here"
            ),
            Self::ExecutionExhausted { executed } => {
                format!("Ran all {executed} move(s) but the puzzle is not marked solved")
            }
            Self::ExecutionAborted { executed, reason } => {
                format!("Execution stopped after {executed} move(s): {reason}")
            }
            Self::ReconciliationStarted { warning: None } => {
                "Review detected colors: 'pick' two slots to swap, then 'accept' or 'reject'"
                    .to_string()
            }
            Self::ReconciliationStarted {
                warning: Some(warning),
            } => format!(
                "Review detected colors ({warning}): 'pick' two slots to swap, then 'accept' or 'reject'"
            ),
            Self::SlotSelected {
                coord,
                selected: true,
            } => format!("Selected slot {coord}"),
            Self::SlotSelected {
                coord,
                selected: false,
            } => format!("Deselected slot {coord}"),
            Self::ColorsSwapped { first, second } => format!("Swapped {first} and {second}"),
            Self::ReconciliationAccepted => "Colors committed".to_string(),
            Self::ReconciliationRejected => "Detected colors discarded".to_string(),
            Self::AcceptFailed { reason } => format!("Could not commit colors: {reason}"),
            Self::AnalysisFailed { reason } => format!("Image analysis failed: {reason}"),
            Self::Notice(text) => text.clone(),
            Self::TransportFailure { context, error } => {
                format!("Could not {context}: {error}")
            }
        }
    }
}

/// Pending events in the order they were raised.
#[derive(Debug, Default)]
pub struct EventQueue {
    pending: Vec<ViewEvent>,
}

impl EventQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consecutive `BoardChanged` events collapse into one.
    pub fn push(&mut self, event: ViewEvent) {
        let collapsible = matches!(event, ViewEvent::BoardChanged);
        if collapsible && self.pending.last() == Some(&event) {
            return;
        }
        self.pending.push(event);
    }

    /// Take all pending events, clearing the queue.
    pub fn take(&mut self) -> Vec<ViewEvent> {
        std::mem::take(&mut self.pending)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }
}
