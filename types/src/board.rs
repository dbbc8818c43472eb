//! Tubes and whole-board game states.
//!
//! Slot 0 of a tube is the bottom of the physical tube; the last slot is the
//! top. The convention only matters for rendering: moves name tubes, never
//! slots.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Color;

/// Capacity used by the puzzle the backend serves.
pub const DEFAULT_TUBE_CAPACITY: usize = 4;

/// A named fixed-capacity container of colors.
///
/// Empty slots are stored as [`Color::Empty`], never omitted, so
/// `colors.len()` is the tube's capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tube {
    pub name: String,
    pub colors: Vec<Color>,
}

impl Tube {
    pub fn new(name: impl Into<String>, colors: Vec<Color>) -> Self {
        Self {
            name: name.into(),
            colors,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    #[must_use]
    pub fn filled(&self) -> usize {
        self.colors.iter().filter(|c| !c.is_empty()).count()
    }

    /// Full and single-colored.
    #[must_use]
    pub fn is_sorted(&self) -> bool {
        let Some(first) = self.colors.first().copied() else {
            return false;
        };
        !first.is_empty() && self.colors.iter().all(|c| *c == first)
    }
}

/// Position of a single slot: tube index within the state, slot index within the tube.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotCoord {
    pub tube: usize,
    pub slot: usize,
}

impl SlotCoord {
    #[must_use]
    pub const fn new(tube: usize, slot: usize) -> Self {
        Self { tube, slot }
    }
}

impl std::fmt::Display for SlotCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.tube, self.slot)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedStateError {
    #[error("state has no tubes")]
    NoTubes,
    #[error("tube '{tube}' has {found} slots; expected {expected}")]
    WrongCapacity {
        tube: String,
        expected: usize,
        found: usize,
    },
    #[error("tube name '{0}' appears more than once")]
    DuplicateName(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("slot {0} is outside the board")]
pub struct SlotOutOfRange(pub SlotCoord);

/// An ordered, shape-checked set of tubes.
///
/// Construction validates that every tube holds exactly `capacity` slots and
/// that tube names are unique. The only in-place mutation offered is
/// [`GameState::swap_slots`], which cannot change the shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    tubes: Vec<Tube>,
    capacity: usize,
}

impl GameState {
    pub fn new(tubes: Vec<Tube>, capacity: usize) -> Result<Self, MalformedStateError> {
        if tubes.is_empty() {
            return Err(MalformedStateError::NoTubes);
        }
        let mut seen = HashSet::with_capacity(tubes.len());
        for tube in &tubes {
            if tube.colors.len() != capacity {
                return Err(MalformedStateError::WrongCapacity {
                    tube: tube.name.clone(),
                    expected: capacity,
                    found: tube.colors.len(),
                });
            }
            if !seen.insert(tube.name.as_str()) {
                return Err(MalformedStateError::DuplicateName(tube.name.clone()));
            }
        }
        Ok(Self { tubes, capacity })
    }

    #[must_use]
    pub fn tubes(&self) -> &[Tube] {
        &self.tubes
    }

    #[must_use]
    pub fn into_tubes(self) -> Vec<Tube> {
        self.tubes
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn color_at(&self, coord: SlotCoord) -> Option<Color> {
        self.tubes
            .get(coord.tube)
            .and_then(|t| t.colors.get(coord.slot))
            .copied()
    }

    #[must_use]
    pub fn contains(&self, coord: SlotCoord) -> bool {
        self.color_at(coord).is_some()
    }

    /// Same tube names in the same order, same capacity. Colors may differ.
    #[must_use]
    pub fn same_shape(&self, other: &GameState) -> bool {
        self.capacity == other.capacity
            && self.tubes.len() == other.tubes.len()
            && self
                .tubes
                .iter()
                .zip(&other.tubes)
                .all(|(a, b)| a.name == b.name)
    }

    /// Exchange the colors at two slots in one step.
    pub fn swap_slots(&mut self, a: SlotCoord, b: SlotCoord) -> Result<(), SlotOutOfRange> {
        let first = self.color_at(a).ok_or(SlotOutOfRange(a))?;
        let second = self.color_at(b).ok_or(SlotOutOfRange(b))?;
        self.tubes[a.tube].colors[a.slot] = second;
        self.tubes[b.tube].colors[b.slot] = first;
        Ok(())
    }

    #[must_use]
    pub fn is_solved(&self) -> bool {
        self.tubes
            .iter()
            .all(|t| t.filled() == 0 || t.is_sorted())
    }
}
