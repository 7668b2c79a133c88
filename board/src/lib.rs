use core::{
    fmt,
    ops::{Add, Sub},
    str::FromStr,
};

mod castling;
mod command;
mod grid;

pub use castling::CastlingType;
pub use command::{MoveCommand, ParseMoveCommandError};
pub use grid::Board;

/// The types of pieces there are
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Pawn,
    Rook,
    Knight,
    Bishop,
    Queen,
    King,
}
impl PieceKind {
    /// All the kinds of pieces there are
    pub const KINDS: [PieceKind; 6] = [
        Self::Pawn,
        Self::Rook,
        Self::Knight,
        Self::Bishop,
        Self::Queen,
        Self::King,
    ];

    /// The capitalized version of the letter used for this piece in board notation
    pub const fn letter(self) -> char {
        match self {
            Self::Pawn => 'P',
            Self::Rook => 'R',
            Self::Knight => 'N',
            Self::Bishop => 'B',
            Self::Queen => 'Q',
            Self::King => 'K',
        }
    }

    /// Whether this piece moves by sliding along a line, and can therefore be blocked by whatever
    /// stands in between.
    pub const fn is_slider(self) -> bool {
        match self {
            PieceKind::Rook | PieceKind::Bishop | PieceKind::Queen => true,
            PieceKind::Pawn | PieceKind::Knight | PieceKind::King => false,
        }
    }

    /// Whether the offset is geometrically a move for this kind of piece, ignoring everything
    /// else on the board.
    ///
    /// Pawns depend on the board state (captures, en passant, double steps), so they are never
    /// considered here and always return `false`.
    pub fn reaches(self, offset: Point) -> bool {
        let dx = offset.x.unsigned_abs();
        let dy = offset.y.unsigned_abs();
        if dx == 0 && dy == 0 {
            return false;
        }
        match self {
            PieceKind::Pawn => false,
            PieceKind::Rook => dx == 0 || dy == 0,
            PieceKind::Bishop => dx == dy,
            PieceKind::Queen => dx == 0 || dy == 0 || dx == dy,
            PieceKind::Knight => (dx == 1 && dy == 2) || (dx == 2 && dy == 1),
            PieceKind::King => dx <= 1 && dy <= 1,
        }
    }

    /// The lowercase name, as used in messages
    pub const fn name(self) -> &'static str {
        match self {
            Self::Pawn => "pawn",
            Self::Rook => "rook",
            Self::Knight => "knight",
            Self::Bishop => "bishop",
            Self::Queen => "queen",
            Self::King => "king",
        }
    }
}
impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The colors a piece can have
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Color {
    White,
    Black,
}
impl Color {
    pub const fn other(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// The direction along `y` this color's pawns advance in.
    ///
    /// Row 0 is the highest rank, so white moves towards smaller `y`.
    pub const fn forward(self) -> i32 {
        match self {
            Color::White => -1,
            Color::Black => 1,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Color::White => "white",
            Color::Black => "black",
        }
    }
}
impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A coordinate on the board, or an offset between two coordinates
///
/// `x` is the file (column, `a` is 0) and `y` is the row counted from the top of the board, so the
/// highest rank has `y == 0`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}
impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The unit step along each axis
    pub const fn signum(self) -> Self {
        Self::new(self.x.signum(), self.y.signum())
    }

    /// Gets the Chebyshev distance for this offset
    ///
    /// This is the number of squares moved in one direction, for whichever direction is larger.
    pub const fn chebyshev_distance(self) -> u32 {
        let x = self.x.unsigned_abs();
        let y = self.y.unsigned_abs();
        if x > y {
            x
        } else {
            y
        }
    }
}
impl Add for Point {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}
impl Sub for Point {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}
impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A piece
///
/// Two pieces are equal when they share kind, color, and collapse state; this is the "same piece"
/// identity the move rules compare with. `has_moved` is bookkeeping and is ignored by equality.
#[derive(Clone, Copy, Debug)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
    /// Set permanently on the first move of this piece
    pub has_moved: bool,
    /// Whether this occupancy is classically certain rather than part of a superposition
    pub collapsed: bool,
}
impl Piece {
    /// A new unmoved, collapsed piece
    pub const fn new(kind: PieceKind, color: Color) -> Self {
        Self {
            kind,
            color,
            has_moved: false,
            collapsed: true,
        }
    }

    /// The letter used for this piece in board notation, uppercase for white
    pub const fn letter(self) -> char {
        match self.color {
            Color::White => self.kind.letter().to_ascii_uppercase(),
            Color::Black => self.kind.letter().to_ascii_lowercase(),
        }
    }

    /// Whether moving from `source` to `target` is geometrically legal for this piece.
    ///
    /// See [`PieceKind::reaches`].
    pub fn is_move_valid(self, source: Point, target: Point) -> bool {
        self.kind.reaches(target - source)
    }

    /// Returns an iterator of all pieces that exist
    pub fn all_pieces() -> impl Iterator<Item = Self> {
        [Color::White, Color::Black]
            .into_iter()
            .flat_map(|color| PieceKind::KINDS.map(|kind| Self::new(kind, color)))
    }
}
impl PartialEq for Piece {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.color == other.color && self.collapsed == other.collapsed
    }
}
impl Eq for Piece {}

#[derive(Debug, thiserror::Error)]
#[error("unknown piece notation {0:?}")]
pub struct ParsePieceError(pub char);

impl TryFrom<char> for Piece {
    type Error = ParsePieceError;

    fn try_from(letter: char) -> Result<Self, Self::Error> {
        let color = if letter.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        let kind = match letter.to_ascii_uppercase() {
            'P' => PieceKind::Pawn,
            'R' => PieceKind::Rook,
            'N' => PieceKind::Knight,
            'B' => PieceKind::Bishop,
            'Q' => PieceKind::Queen,
            'K' => PieceKind::King,
            _ => return Err(ParsePieceError(letter)),
        };
        Ok(Self::new(kind, color))
    }
}

/// The contents of one square of the classical board
///
/// [`Square::Empty`] is the "no piece" sentinel: it is equal only to itself.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Square {
    #[default]
    Empty,
    Occupied(Piece),
}
impl Square {
    /// The notation character for an empty square
    pub const EMPTY_LETTER: char = '0';

    pub const fn piece(self) -> Option<Piece> {
        match self {
            Square::Empty => None,
            Square::Occupied(piece) => Some(piece),
        }
    }

    pub const fn is_empty(self) -> bool {
        matches!(self, Square::Empty)
    }

    pub const fn is_occupied(self) -> bool {
        !self.is_empty()
    }

    /// Whether a piece which is classically certain stands here
    pub fn is_collapsed(self) -> bool {
        matches!(self, Square::Occupied(piece) if piece.collapsed)
    }

    pub const fn color(self) -> Option<Color> {
        match self {
            Square::Empty => None,
            Square::Occupied(piece) => Some(piece.color),
        }
    }

    pub const fn kind(self) -> Option<PieceKind> {
        match self {
            Square::Empty => None,
            Square::Occupied(piece) => Some(piece.kind),
        }
    }

    /// The board notation letter, `'0'` when empty
    pub const fn letter(self) -> char {
        match self {
            Square::Empty => Self::EMPTY_LETTER,
            Square::Occupied(piece) => piece.letter(),
        }
    }
}
impl From<Piece> for Square {
    fn from(piece: Piece) -> Self {
        Square::Occupied(piece)
    }
}
impl TryFrom<char> for Square {
    type Error = ParsePieceError;

    fn try_from(letter: char) -> Result<Self, Self::Error> {
        if letter == Self::EMPTY_LETTER {
            Ok(Square::Empty)
        } else {
            Piece::try_from(letter).map(Square::Occupied)
        }
    }
}
impl FromStr for Square {
    type Err = ParsePieceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(letter), None) => Square::try_from(letter),
            (Some(letter), Some(_)) => Err(ParsePieceError(letter)),
            (None, _) => Err(ParsePieceError(' ')),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_piece_letter_round_trip() {
        for piece in Piece::all_pieces() {
            assert_eq!(piece, Piece::try_from(piece.letter()).unwrap());
        }
        assert_eq!(Square::try_from('0').unwrap(), Square::Empty);
        assert!(Square::try_from('x').is_err());
        assert!("QQ".parse::<Square>().is_err());
    }

    #[test]
    fn test_piece_equality_ignores_has_moved() {
        let rook = Piece::new(PieceKind::Rook, Color::White);
        let moved = Piece {
            has_moved: true,
            ..rook
        };
        let superposed = Piece {
            collapsed: false,
            ..rook
        };
        assert_eq!(rook, moved);
        assert_ne!(rook, superposed);
        assert_ne!(Square::Occupied(rook), Square::Empty);
        assert_eq!(Square::Empty, Square::Empty);
    }

    #[test]
    fn test_piece_geometry() {
        let origin = Point::new(3, 3);
        let rook = Piece::new(PieceKind::Rook, Color::White);
        let bishop = Piece::new(PieceKind::Bishop, Color::White);
        let knight = Piece::new(PieceKind::Knight, Color::Black);
        let king = Piece::new(PieceKind::King, Color::Black);
        let queen = Piece::new(PieceKind::Queen, Color::White);

        assert!(rook.is_move_valid(origin, Point::new(3, 0)));
        assert!(!rook.is_move_valid(origin, Point::new(4, 4)));
        assert!(bishop.is_move_valid(origin, Point::new(0, 0)));
        assert!(!bishop.is_move_valid(origin, Point::new(3, 0)));
        assert!(queen.is_move_valid(origin, Point::new(6, 6)));
        assert!(!queen.is_move_valid(origin, Point::new(4, 5)));
        assert!(knight.is_move_valid(origin, Point::new(4, 5)));
        assert!(!knight.is_move_valid(origin, Point::new(5, 5)));
        assert!(king.is_move_valid(origin, Point::new(2, 2)));
        assert!(!king.is_move_valid(origin, Point::new(1, 3)));
        assert!(!king.is_move_valid(origin, origin));
    }
}
