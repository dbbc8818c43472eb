//! The fixed color palette shared with the backend.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A slot color, including the explicit empty value.
///
/// On the wire a color is an upper-snake name (`"LIGHT_GREEN"`) and the empty
/// slot is `null`. Parsing is lenient: names match case-insensitively and the
/// strings `"None"` and `""` are read as empty, which is what the image
/// analyzer emits.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(try_from = "Option<String>", into = "Option<String>")]
pub enum Color {
    #[default]
    Empty,
    Red,
    LightGreen,
    Blue,
    LightBlue,
    Grey,
    Orange,
    Brown,
    Mehendi,
    Pink,
    Purple,
    Yellow,
    Green,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown color '{0}'")]
pub struct UnknownColorError(pub String);

impl Color {
    /// Every non-empty color in the palette.
    pub const PALETTE: [Color; 12] = [
        Color::Red,
        Color::LightGreen,
        Color::Blue,
        Color::LightBlue,
        Color::Grey,
        Color::Orange,
        Color::Brown,
        Color::Mehendi,
        Color::Pink,
        Color::Purple,
        Color::Yellow,
        Color::Green,
    ];

    /// Wire name, or `None` for the empty slot.
    #[must_use]
    pub const fn name(self) -> Option<&'static str> {
        match self {
            Color::Empty => None,
            Color::Red => Some("RED"),
            Color::LightGreen => Some("LIGHT_GREEN"),
            Color::Blue => Some("BLUE"),
            Color::LightBlue => Some("LIGHT_BLUE"),
            Color::Grey => Some("GREY"),
            Color::Orange => Some("ORANGE"),
            Color::Brown => Some("BROWN"),
            Color::Mehendi => Some("MEHENDI"),
            Color::Pink => Some("PINK"),
            Color::Purple => Some("PURPLE"),
            Color::Yellow => Some("YELLOW"),
            Color::Green => Some("GREEN"),
        }
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        matches!(self, Color::Empty)
    }

    pub fn parse(raw: &str) -> Result<Self, UnknownColorError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
            return Ok(Color::Empty);
        }
        Color::PALETTE
            .iter()
            .copied()
            .find(|color| {
                color
                    .name()
                    .is_some_and(|name| name.eq_ignore_ascii_case(trimmed))
            })
            .ok_or_else(|| UnknownColorError(trimmed.to_string()))
    }
}

impl TryFrom<Option<String>> for Color {
    type Error = UnknownColorError;

    fn try_from(value: Option<String>) -> Result<Self, Self::Error> {
        match value {
            None => Ok(Color::Empty),
            Some(raw) => Color::parse(&raw),
        }
    }
}

impl From<Color> for Option<String> {
    fn from(value: Color) -> Self {
        value.name().map(ToString::to_string)
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name().unwrap_or("EMPTY"))
    }
}
