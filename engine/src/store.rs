//! The authoritative board and what is currently shown in its place.

use tubesort_types::{GameState, MalformedStateError, Tube};

/// Holds the backend-confirmed [`GameState`].
///
/// Updates replace the whole state or nothing: a layout that fails shape
/// validation is dropped and the prior state stays. A display overlay lets
/// a tentative layout be shown without touching the authoritative one.
#[derive(Debug, Clone)]
pub struct GameStateStore {
    capacity: usize,
    current: Option<GameState>,
    overlay: Option<GameState>,
}

impl GameStateStore {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            current: None,
            overlay: None,
        }
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Validate and install a backend layout.
    pub fn replace(&mut self, tubes: Vec<Tube>) -> Result<&GameState, MalformedStateError> {
        let state = match GameState::new(tubes, self.capacity) {
            Ok(state) => state,
            Err(err) => {
                tracing::warn!(error = %err, "Dropping malformed board update");
                return Err(err);
            }
        };
        Ok(self.current.insert(state))
    }

    /// Install a state that was validated against this store's capacity.
    pub fn install(&mut self, state: GameState) {
        debug_assert_eq!(state.capacity(), self.capacity);
        self.current = Some(state);
    }

    #[must_use]
    pub fn current(&self) -> Option<&GameState> {
        self.current.as_ref()
    }

    /// What the view should draw: the overlay if one is set, else the current state.
    #[must_use]
    pub fn displayed(&self) -> Option<&GameState> {
        self.overlay.as_ref().or(self.current.as_ref())
    }

    pub fn show(&mut self, state: GameState) {
        self.overlay = Some(state);
    }

    pub fn clear_overlay(&mut self) {
        self.overlay = None;
    }

    #[must_use]
    pub fn is_overlaid(&self) -> bool {
        self.overlay.is_some()
    }
}
