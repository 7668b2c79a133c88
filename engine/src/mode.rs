//! Game modes: the starting board and rule switches a game is set up from

use std::collections::BTreeMap;

use board::{Board, CastlingType, Color, Piece, Point, Square};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// One castling entry as written in a game mode, keyed by the square names below
pub type CastlingEntry = BTreeMap<String, String>;

/// The keys every castling entry must have
const CASTLING_KEYS: [&str; 4] = [
    "rook_start_square",
    "rook_end_square",
    "king_start_square",
    "king_end_square",
];

/// The description of a game, usually read from JSON
///
/// ```
/// let mode = qchess::GameMode::from_json(r#"{"board": [["k", "0"], ["0", "K"]]}"#).unwrap();
/// assert_eq!(mode.dimensions().unwrap(), (2, 2));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct GameMode {
    /// Rows of piece notation, top row first, `"0"` for an empty square
    pub board: Vec<Vec<String>>,
    /// `"White"` or `"Black"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starting_color: Option<String>,
    /// Smaller boards may not want the pawn double step
    #[serde(default = "enabled")]
    pub pawn_double_step_allowed: bool,
    /// Some modes disable promotion for balance reasons
    #[serde(default = "enabled")]
    pub pawn_promotion_allowed: bool,
    /// Every castle the mode allows, empty if castling is not allowed
    #[serde(default)]
    pub castling_types: Vec<CastlingEntry>,
}

fn enabled() -> bool {
    true
}

impl GameMode {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Standard chess
    pub fn classic() -> Self {
        const ROWS: [&str; 8] = [
            "rnbqkbnr", "pppppppp", "00000000", "00000000", "00000000", "00000000", "PPPPPPPP",
            "RNBQKBNR",
        ];
        let castle = |rook_start: &str, rook_end: &str, king_start: &str, king_end: &str| -> CastlingEntry {
            CASTLING_KEYS
                .into_iter()
                .zip([rook_start, rook_end, king_start, king_end])
                .map(|(key, square)| (key.to_string(), square.to_string()))
                .collect()
        };
        Self {
            board: ROWS
                .iter()
                .map(|row| row.chars().map(String::from).collect())
                .collect(),
            starting_color: None,
            pawn_double_step_allowed: true,
            pawn_promotion_allowed: true,
            castling_types: vec![
                castle("h1", "f1", "e1", "g1"),
                castle("a1", "d1", "e1", "c1"),
                castle("h8", "f8", "e8", "g8"),
                castle("a8", "d8", "e8", "c8"),
            ],
        }
    }

    /// The `(width, height)` of the board
    ///
    /// The width is taken from the first row, and every other row must match it.
    pub fn dimensions(&self) -> Result<(usize, usize), ConfigError> {
        let height = self.board.len();
        let width = self.board.first().map_or(0, Vec::len);
        if width == 0 || height == 0 {
            return Err(ConfigError::EmptyBoard);
        }
        for (row, squares) in self.board.iter().enumerate() {
            if squares.len() != width {
                return Err(ConfigError::RaggedRow {
                    row,
                    found: squares.len(),
                    expected: width,
                });
            }
        }
        Ok((width, height))
    }

    pub fn starting_color(&self) -> Result<Color, ConfigError> {
        match self.starting_color.as_deref() {
            None | Some("White") => Ok(Color::White),
            Some("Black") => Ok(Color::Black),
            Some(other) => Err(ConfigError::InvalidStartingColor(other.to_string())),
        }
    }

    /// Every piece in the starting position
    pub fn pieces(&self) -> Result<Vec<(Point, Piece)>, ConfigError> {
        let mut pieces = Vec::new();
        for (y, row) in self.board.iter().enumerate() {
            for (x, notation) in row.iter().enumerate() {
                let square = notation
                    .parse::<Square>()
                    .map_err(|source| ConfigError::InvalidPiece { row: y, source })?;
                if let Square::Occupied(piece) = square {
                    pieces.push((Point::new(x as i32, y as i32), piece));
                }
            }
        }
        Ok(pieces)
    }

    /// The castles of this mode, with squares read in the notation of `board`
    pub fn castling_types(&self, board: &Board) -> Result<Vec<CastlingType>, ConfigError> {
        self.castling_types
            .iter()
            .map(|entry| {
                let [rook_start, rook_end, king_start, king_end] = CASTLING_KEYS.map(|key| {
                    let value = entry
                        .get(key)
                        .ok_or(ConfigError::MissingCastlingKey(key))?;
                    board
                        .parse_square(value)
                        .ok_or_else(|| ConfigError::InvalidCastlingSquare {
                            key,
                            value: value.clone(),
                        })
                });
                Ok(CastlingType {
                    rook_start: rook_start?,
                    rook_end: rook_end?,
                    king_start: king_start?,
                    king_end: king_end?,
                })
            })
            .collect()
    }
}
