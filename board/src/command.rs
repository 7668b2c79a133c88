//! Textual move commands: `a2a3`, `b1^a3c3`, `a3c3^b1`

use core::fmt;

use crate::{Board, Point};

/// The move a player asked for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveCommand {
    /// A classical move from one square to another
    Standard { source: Point, target: Point },
    /// Move a piece into a superposition of two squares
    Split {
        source: Point,
        target1: Point,
        target2: Point,
    },
    /// Recombine two branches of the same piece into one square
    Merge {
        source1: Point,
        source2: Point,
        target: Point,
    },
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseMoveCommandError {
    #[error("move command must be 4 or 7 characters long")]
    WrongLength,
    #[error("7 character move command needs a '^' at index 2 (split) or 4 (merge)")]
    MissingMarker,
    #[error("invalid square {0:?}")]
    InvalidSquare(String),
}

impl MoveCommand {
    /// Parse a move command against the dimensions of `board`
    ///
    /// The grammar is `<src><tgt>` for a standard move, `<src>^<tgt1><tgt2>` for a split, and
    /// `<src1><src2>^<tgt>` for a merge.
    pub fn parse(board: &Board, command: &str) -> Result<Self, ParseMoveCommandError> {
        let square = |s: Option<&str>| {
            s.and_then(|s| board.parse_square(s))
                .ok_or_else(|| ParseMoveCommandError::InvalidSquare(s.unwrap_or_default().into()))
        };
        if !command.is_ascii() {
            return Err(ParseMoveCommandError::InvalidSquare(command.into()));
        }
        match command.len() {
            4 => Ok(Self::Standard {
                source: square(command.get(0..2))?,
                target: square(command.get(2..4))?,
            }),
            7 if &command[2..3] == "^" => Ok(Self::Split {
                source: square(command.get(0..2))?,
                target1: square(command.get(3..5))?,
                target2: square(command.get(5..7))?,
            }),
            7 if &command[4..5] == "^" => Ok(Self::Merge {
                source1: square(command.get(0..2))?,
                source2: square(command.get(2..4))?,
                target: square(command.get(5..7))?,
            }),
            7 => Err(ParseMoveCommandError::MissingMarker),
            _ => Err(ParseMoveCommandError::WrongLength),
        }
    }

    /// The squares a piece leaves from
    pub fn sources(&self) -> Vec<Point> {
        match *self {
            Self::Standard { source, .. } | Self::Split { source, .. } => vec![source],
            Self::Merge {
                source1, source2, ..
            } => vec![source1, source2],
        }
    }

    /// Format this command in the notation of `board`, or `None` if a square can't be named
    pub fn notation(&self, board: &Board) -> Option<String> {
        let name = |point| board.square_name(point);
        Some(match *self {
            Self::Standard { source, target } => format!("{}{}", name(source)?, name(target)?),
            Self::Split {
                source,
                target1,
                target2,
            } => format!("{}^{}{}", name(source)?, name(target1)?, name(target2)?),
            Self::Merge {
                source1,
                source2,
                target,
            } => format!("{}{}^{}", name(source1)?, name(source2)?, name(target)?),
        })
    }
}

impl fmt::Display for MoveCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard { source, target } => write!(f, "standard {source} -> {target}"),
            Self::Split {
                source,
                target1,
                target2,
            } => write!(f, "split {source} -> {target1} + {target2}"),
            Self::Merge {
                source1,
                source2,
                target,
            } => write!(f, "merge {source1} + {source2} -> {target}"),
        }
    }
}
