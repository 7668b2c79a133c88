//! Rules engine for quantum chess
//!
//! Pieces may be split across two squares, merged back together, or moved classically. The
//! [`QChess`] game validates every move against the chess rules extended with superposition, and
//! hands accepted moves to a [`QuantumBackend`] which keeps track of the branches of the board.

use board::ParseMoveCommandError;

mod backend;
mod branching;
mod game;
mod mode;
mod pawn;

pub use crate::backend::QuantumBackend;
pub use crate::branching::BranchingBackend;
pub use crate::game::QChess;
pub use crate::mode::{CastlingEntry, GameMode};
pub use crate::pawn::PawnMove;

pub use board::{Board, CastlingType, Color, MoveCommand, Piece, PieceKind, Point, Square};

pub type Result<T, E = MoveError> = core::result::Result<T, E>;

/// Why a move was rejected
///
/// A rejected move never changes the state of the game.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum MoveError {
    #[error("invalid move command: {0}")]
    Unparsable(#[from] ParseMoveCommandError),
    #[error("it's {0}'s turn to move")]
    WrongTurn(Color),
    #[error("source square not in bounds")]
    SourceOutOfBounds,
    #[error("target square not in bounds")]
    TargetOutOfBounds,
    #[error("source square is empty")]
    SourceEmpty,
    #[error("source and target are the same square")]
    SameSquare,
    #[error("incorrect move for piece type {0}")]
    IncorrectMove(PieceKind),
    #[error("rook must be in its initial position to castle")]
    RookNotInPlace,
    #[error("rook has already moved")]
    RookAlreadyMoved,
    #[error("rook target square is blocked by a collapsed piece")]
    RookTargetBlocked,
    #[error("castling path is blocked by a collapsed piece")]
    CastlingPathBlocked,
    #[error("target square is blocked by a collapsed piece")]
    TargetBlocked,
    #[error("path is blocked by a collapsed piece")]
    PathBlocked,
    #[error("pawns can't perform split moves")]
    PawnSplit,
    #[error("pawns can't perform merge moves")]
    PawnMerge,
    #[error("both split targets are the same square")]
    SameSplitTargets,
    #[error("target square is not empty")]
    TargetNotEmpty,
    #[error("different type of merge source pieces")]
    DifferentMergePieces,
    #[error("both merge sources are the same square")]
    SameMergeSources,
    #[error("both paths are blocked by a collapsed piece")]
    BothPathsBlocked,
}

/// A game mode could not be turned into a game
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("game mode is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("game mode board has no squares")]
    EmptyBoard,
    #[error("board row {row} has {found} squares, expected {expected}")]
    RaggedRow {
        row: usize,
        found: usize,
        expected: usize,
    },
    #[error("board row {row} has an invalid piece: {source}")]
    InvalidPiece {
        row: usize,
        source: board::ParsePieceError,
    },
    #[error("invalid starting color {0:?}")]
    InvalidStartingColor(String),
    #[error("castling type is missing {0:?}")]
    MissingCastlingKey(&'static str),
    #[error("invalid castling_types point {{'{key}': '{value}'}}")]
    InvalidCastlingSquare { key: &'static str, value: String },
    #[error("could not place piece: {0}")]
    Setup(#[from] SetupError),
}

/// A piece could not be placed during setup
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum SetupError {
    #[error("{0} is not on the board")]
    OutOfBounds(Point),
    #[error("there is already a piece at {0}")]
    Occupied(Point),
}

/// What an accepted move actually did
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MoveReport {
    Standard {
        source: Point,
        target: Point,
        /// The piece the pawn promoted into, if it reached the far rank
        promotion: Option<Piece>,
    },
    Castle {
        source: Point,
        target: Point,
        rook_source: Point,
        rook_target: Point,
    },
    EnPassant {
        source: Point,
        target: Point,
        captured: Point,
    },
    Split {
        source: Point,
        target1: Point,
        target2: Point,
    },
    Merge {
        source1: Point,
        source2: Point,
        target: Point,
    },
    /// A split or merge had exactly one of its paths blocked by a collapsed piece, so a standard
    /// move along the open path was made instead.
    Degraded {
        requested: MoveCommand,
        realized: Box<MoveReport>,
    },
}
impl MoveReport {
    pub const fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }
}

/// The possible outcomes of a game
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameOutcome {
    /// Black has no kings left on the board
    WhiteWins,
    /// White has no kings left on the board
    BlackWins,
    /// No kings are left at all
    Draw,
}
impl GameOutcome {
    pub const fn message(self) -> &'static str {
        match self {
            Self::WhiteWins => "White wins!",
            Self::BlackWins => "Black wins!",
            Self::Draw => "Draw!",
        }
    }
}
