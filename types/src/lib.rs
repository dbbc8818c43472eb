//! Core domain types for tubesort.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory
#![allow(clippy::missing_panics_doc)] // Panics are documented in assertions

mod board;
mod color;

pub use board::{
    DEFAULT_TUBE_CAPACITY, GameState, MalformedStateError, SlotCoord, SlotOutOfRange, Tube,
};
pub use color::{Color, UnknownColorError};

use serde::{Deserialize, Serialize};

// ============================================================================
// Moves
// ============================================================================

/// A proposed transfer between two named tubes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub from: String,
    pub to: String,
}

impl Move {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// A move annotated with the backend's desirability score.
///
/// Only the backend produces these; the client keeps them in received order.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedMove {
    pub movement: Move,
    pub score: f64,
}

impl RankedMove {
    #[must_use]
    pub fn new(movement: Move, score: f64) -> Self {
        Self { movement, score }
    }
}

// ============================================================================
// Solutions
// ============================================================================

/// An ordered, finite move sequence returned by the solver.
///
/// An empty solution means the puzzle is already solved. "No solution" is not
/// a `Solution` at all; it is the absence of one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Solution(Vec<Move>);

impl Solution {
    #[must_use]
    pub fn new(moves: Vec<Move>) -> Self {
        Self(moves)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Move> {
        self.0.get(index)
    }

    #[must_use]
    pub fn moves(&self) -> &[Move] {
        &self.0
    }
}

impl From<Vec<Move>> for Solution {
    fn from(moves: Vec<Move>) -> Self {
        Self(moves)
    }
}
