//! Color reconciliation between an analyzed photo and the live board.
//!
//! A [`Reconciliation`] exists only while the user is editing; dropping it is
//! how both accept and reject end the workflow.

use tubesort_types::{GameState, SlotCoord};

use crate::errors::{EXECUTION, EngineError};
use crate::solve::SolveSession;

/// What a slot selection did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Selected(SlotCoord),
    /// The same slot was picked twice.
    Deselected(SlotCoord),
    /// The second slot completed a pair and the two colors were exchanged.
    Swapped(SlotCoord, SlotCoord),
}

#[derive(Debug, Clone)]
pub struct Reconciliation {
    snapshot: GameState,
    tentative: GameState,
    // A pair completes and clears in the same call, so at most one is pending.
    pending: Option<SlotCoord>,
}

impl Reconciliation {
    /// Start editing `tentative` against `snapshot`, the board as it is now.
    ///
    /// Fails while a solution is executing, and when the two layouts differ
    /// in tube names, order or capacity.
    pub fn begin(
        session: &SolveSession,
        snapshot: GameState,
        tentative: GameState,
    ) -> Result<Self, EngineError> {
        if session.is_executing() {
            return Err(EngineError::ConcurrentEdit(EXECUTION));
        }
        if !snapshot.same_shape(&tentative) {
            return Err(EngineError::ShapeMismatch);
        }
        Ok(Self {
            snapshot,
            tentative,
            pending: None,
        })
    }

    #[must_use]
    pub fn snapshot(&self) -> &GameState {
        &self.snapshot
    }

    #[must_use]
    pub fn tentative(&self) -> &GameState {
        &self.tentative
    }

    /// Slots picked so far toward the next swap.
    #[must_use]
    pub fn selected(&self) -> &[SlotCoord] {
        self.pending.as_slice()
    }

    /// Toggle `coord`. Completing a pair swaps the two colors and clears the selection.
    pub fn select_slot(&mut self, coord: SlotCoord) -> Result<Selection, EngineError> {
        if !self.tentative.contains(coord) {
            return Err(EngineError::InvalidSlot(coord));
        }
        match self.pending.take() {
            None => {
                self.pending = Some(coord);
                Ok(Selection::Selected(coord))
            }
            Some(first) if first == coord => Ok(Selection::Deselected(coord)),
            Some(first) => {
                self.tentative
                    .swap_slots(first, coord)
                    .map_err(|err| EngineError::InvalidSlot(err.0))?;
                Ok(Selection::Swapped(first, coord))
            }
        }
    }

    /// End the workflow, yielding the board to restore.
    #[must_use]
    pub fn into_snapshot(self) -> GameState {
        self.snapshot
    }
}
