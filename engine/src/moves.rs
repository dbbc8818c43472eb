//! The single path by which moves and undos reach the backend.
//!
//! Every call here sends exactly one request and folds the answer into the
//! [`GameStateStore`]. Refreshing the catalog afterwards is left to the caller,
//! which knows whether a solution is being executed.

use tubesort_client::{ApplyMoveReply, BackendError, GameBackend};
use tubesort_types::{MalformedStateError, Move};

use crate::store::GameStateStore;

#[derive(Debug)]
pub enum MoveOutcome {
    /// The store now holds the post-move state.
    Applied,
    /// The move solved the puzzle. The store holds the final state.
    Completed { final_moves: Vec<Move> },
    /// The backend refused the move; the store is untouched.
    Rejected { reason: String },
    /// No answer; the store is untouched.
    TransportFailure(BackendError),
    /// The backend answered with a layout of the wrong shape; it was dropped.
    Malformed(MalformedStateError),
}

#[derive(Debug)]
pub enum UndoOutcome {
    Applied,
    TransportFailure(BackendError),
    Malformed(MalformedStateError),
}

pub async fn apply_move<B: GameBackend>(
    backend: &B,
    store: &mut GameStateStore,
    movement: &Move,
) -> MoveOutcome {
    tracing::debug!(%movement, "Applying move");
    match backend.apply_move(movement).await {
        Ok(ApplyMoveReply::Applied { tubes }) => match store.replace(tubes) {
            Ok(_) => MoveOutcome::Applied,
            Err(err) => MoveOutcome::Malformed(err),
        },
        Ok(ApplyMoveReply::Completed { tubes, final_moves }) => {
            // Completion is terminal even if the final layout is unusable.
            if let Err(err) = store.replace(tubes) {
                tracing::error!(error = %err, "Final board after completion was malformed");
            }
            MoveOutcome::Completed { final_moves }
        }
        Ok(ApplyMoveReply::Rejected { reason }) => {
            tracing::info!(%movement, %reason, "Move rejected");
            MoveOutcome::Rejected { reason }
        }
        Err(err) => {
            tracing::warn!(%movement, error = %err, "Move request failed");
            MoveOutcome::TransportFailure(err)
        }
    }
}

/// Revert the backend's most recent move. One level only.
pub async fn undo<B: GameBackend>(backend: &B, store: &mut GameStateStore) -> UndoOutcome {
    match backend.undo_move().await {
        Ok(tubes) => match store.replace(tubes) {
            Ok(_) => UndoOutcome::Applied,
            Err(err) => UndoOutcome::Malformed(err),
        },
        Err(err) => {
            tracing::warn!(error = %err, "Undo request failed");
            UndoOutcome::TransportFailure(err)
        }
    }
}
