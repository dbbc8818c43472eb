//! Plain-text rendering. Tubes are drawn as columns, top slot first.

use std::fmt::Write as _;

use tubesort_engine::{Color, GameState, Move, RankedMove, SlotCoord};

const EMPTY_CELL: &str = ".";

pub fn board(state: &GameState, selected: &[SlotCoord]) -> String {
    let width = state
        .tubes()
        .iter()
        .map(|t| t.name.len())
        .chain(Color::PALETTE.iter().filter_map(|c| c.name()).map(str::len))
        .max()
        .unwrap_or(0)
        + 1;

    let mut out = String::new();
    let _ = write!(out, "    ");
    for (i, tube) in state.tubes().iter().enumerate() {
        let label = format!("{}:{}", i + 1, tube.name);
        let _ = write!(out, " {label:<w$}", w = width + 2);
    }
    out.push('\n');

    for slot in (0..state.capacity()).rev() {
        let _ = write!(out, "{:>3} ", slot + 1);
        for tube in 0..state.tubes().len() {
            let coord = SlotCoord::new(tube, slot);
            let color = state.color_at(coord).unwrap_or_default();
            let name = color.name().unwrap_or(EMPTY_CELL);
            let mark = if selected.contains(&coord) { '*' } else { ' ' };
            let _ = write!(out, "|{mark}{name:<width$} ");
        }
        out.push_str("|\n");
    }
    out
}

pub fn moves(moves: &[RankedMove]) -> String {
    if moves.is_empty() {
        return "No moves available".to_string();
    }
    let mut out = String::new();
    for (i, ranked) in moves.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>3}. {}  (score {})",
            i + 1,
            ranked.movement,
            ranked.score
        );
    }
    out
}

/// `cursor` marks the next step while executing.
pub fn solution(moves: &[Move], cursor: Option<usize>) -> String {
    let mut out = String::new();
    for (i, movement) in moves.iter().enumerate() {
        let marker = match cursor {
            Some(c) if i < c => "done",
            Some(c) if i == c => "next",
            _ => "",
        };
        let _ = writeln!(out, "{:>3}. {movement} {marker}", i + 1);
    }
    out
}
