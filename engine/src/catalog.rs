//! Ranked candidate moves for the current board.

use tubesort_client::{BackendError, GameBackend};
use tubesort_types::RankedMove;

#[derive(Debug, Clone, Default, PartialEq)]
enum Held {
    /// Nothing fetched yet, or the last fetch failed.
    #[default]
    Unloaded,
    Ready(Vec<RankedMove>),
    DeadEnd,
}

/// What a refresh found.
#[derive(Debug)]
pub enum Refresh {
    Moves(usize),
    /// The backend returned no moves. Recovery belongs to the caller.
    DeadEnd,
    Failed(BackendError),
}

/// The backend's ranked moves, in the order received.
///
/// Recomputed from scratch on every [`MoveCatalog::refresh`]; an empty answer
/// is recorded as a dead end, never as an empty list.
#[derive(Debug, Default)]
pub struct MoveCatalog {
    held: Held,
}

impl MoveCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch moves for the backend's current state.
    pub async fn refresh<B: GameBackend>(&mut self, backend: &B) -> Refresh {
        match backend.top_moves().await {
            Ok(moves) if moves.is_empty() => {
                self.held = Held::DeadEnd;
                Refresh::DeadEnd
            }
            Ok(moves) => {
                let count = moves.len();
                self.held = Held::Ready(moves);
                Refresh::Moves(count)
            }
            Err(err) => {
                self.held = Held::Unloaded;
                Refresh::Failed(err)
            }
        }
    }

    #[must_use]
    pub fn moves(&self) -> &[RankedMove] {
        match &self.held {
            Held::Ready(moves) => moves,
            Held::Unloaded | Held::DeadEnd => &[],
        }
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&RankedMove> {
        self.moves().get(index)
    }

    #[must_use]
    pub fn is_dead_end(&self) -> bool {
        self.held == Held::DeadEnd
    }
}
