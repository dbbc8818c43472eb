//! Line command parsing.

use std::path::PathBuf;

use thiserror::Error;

/// A tube as typed by the user: 1-based position or name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TubeArg {
    Position(usize),
    Name(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Show,
    Moves,
    /// Apply the n-th listed move (1-based).
    MoveRanked(usize),
    MoveBetween { from: String, to: String },
    Undo,
    Solve,
    Run,
    Stop,
    Analyze(PathBuf),
    /// `slot` is 1-based from the bottom of the tube.
    Pick { tube: TubeArg, slot: usize },
    Accept,
    Reject,
    Reload,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown command '{0}' (try 'help')")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("'{0}' is not a positive number")]
    NotANumber(String),
}

pub const HELP: &str = "\
Commands:
  show                 print the board
  moves                list ranked moves
  move <n>             apply the n-th listed move
  move <from> <to>     apply a move between two named tubes
  undo                 revert the last move
  solve                request a solution (shown, not executed)
  run                  execute the shown solution
  stop                 stop executing; the next solve resumes from here
  analyze <image>      detect tube colors from a photo (png or jpeg)
  pick <tube> <slot>   select a slot to swap while reviewing colors
  accept | reject      commit or discard the reviewed colors
  reload               fetch the puzzle from the server again
  help | quit";

fn positive(raw: &str) -> Result<usize, ParseError> {
    match raw.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ParseError::NotANumber(raw.to_string())),
    }
}

fn tube_arg(raw: &str) -> TubeArg {
    match raw.parse::<usize>() {
        Ok(n) => TubeArg::Position(n),
        Err(_) => TubeArg::Name(raw.to_string()),
    }
}

/// Parse one input line. Blank lines parse to `None`.
pub fn parse(line: &str) -> Result<Option<Command>, ParseError> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let command = match (head.to_ascii_lowercase().as_str(), args.as_slice()) {
        ("show" | "board", []) => Command::Show,
        ("moves", []) => Command::Moves,
        ("move" | "m", [n]) => Command::MoveRanked(positive(n)?),
        ("move" | "m", [from, to]) => Command::MoveBetween {
            from: (*from).to_string(),
            to: (*to).to_string(),
        },
        ("move" | "m", _) => return Err(ParseError::Usage("move <n> | move <from> <to>")),
        ("undo" | "u", []) => Command::Undo,
        ("solve", []) => Command::Solve,
        ("run", []) => Command::Run,
        ("stop", []) => Command::Stop,
        ("analyze", [path]) => Command::Analyze(PathBuf::from(path)),
        ("analyze", _) => return Err(ParseError::Usage("analyze <image>")),
        ("pick", [tube, slot]) => Command::Pick {
            tube: tube_arg(tube),
            slot: positive(slot)?,
        },
        ("pick", _) => return Err(ParseError::Usage("pick <tube> <slot>")),
        ("accept", []) => Command::Accept,
        ("reject", []) => Command::Reject,
        ("reload", []) => Command::Reload,
        ("help" | "?", _) => Command::Help,
        ("quit" | "exit" | "q", []) => Command::Quit,
        (other, _) => return Err(ParseError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_are_ignored() {
        assert_eq!(parse("   "), Ok(None));
    }

    #[test]
    fn move_forms() {
        assert_eq!(parse("move 2"), Ok(Some(Command::MoveRanked(2))));
        assert_eq!(
            parse("m Tube1 Tube4"),
            Ok(Some(Command::MoveBetween {
                from: "Tube1".to_string(),
                to: "Tube4".to_string()
            }))
        );
        assert_eq!(parse("move 0"), Err(ParseError::NotANumber("0".to_string())));
        assert!(matches!(parse("move"), Err(ParseError::Usage(_))));
    }

    #[test]
    fn pick_accepts_position_or_name() {
        assert_eq!(
            parse("pick 3 1"),
            Ok(Some(Command::Pick {
                tube: TubeArg::Position(3),
                slot: 1
            }))
        );
        assert_eq!(
            parse("PICK Tube2 4"),
            Ok(Some(Command::Pick {
                tube: TubeArg::Name("Tube2".to_string()),
                slot: 4
            }))
        );
        assert!(matches!(parse("pick 3"), Err(ParseError::Usage(_))));
    }

    #[test]
    fn analyze_takes_a_path() {
        assert_eq!(
            parse("analyze shots/board.png"),
            Ok(Some(Command::Analyze(PathBuf::from("shots/board.png"))))
        );
    }

    #[test]
    fn unknown_command() {
        assert_eq!(
            parse("dance now"),
            Err(ParseError::Unknown("dance".to_string()))
        );
        assert_eq!(
            parse("solve please"),
            Err(ParseError::Unknown("solve".to_string()))
        );
    }
}
