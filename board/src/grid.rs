//! The classical board: a fixed-size grid of squares, and the notation and path queries on it

use core::fmt;

use crate::{Point, Square};

/// A `width × height` grid of [`Square`]s
///
/// Row 0 is drawn at the top and holds the highest rank, so the square `a1` of an 8×8 board is
/// `Point { x: 0, y: 7 }`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    width: usize,
    height: usize,
    /// Stored row by row, `width * y + x`
    squares: Vec<Square>,
}

impl Board {
    /// An empty board of the given size
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            squares: vec![Square::Empty; width * height],
        }
    }

    pub const fn width(&self) -> usize {
        self.width
    }

    pub const fn height(&self) -> usize {
        self.height
    }

    pub fn in_bounds(&self, point: Point) -> bool {
        0 <= point.x
            && (point.x as usize) < self.width
            && 0 <= point.y
            && (point.y as usize) < self.height
    }

    fn index(&self, point: Point) -> Option<usize> {
        self.in_bounds(point)
            .then(|| self.width * point.y as usize + point.x as usize)
    }

    /// The contents of the square, [`Square::Empty`] if out of bounds
    pub fn get(&self, point: Point) -> Square {
        self.index(point)
            .map_or(Square::Empty, |index| self.squares[index])
    }

    pub fn get_mut(&mut self, point: Point) -> Option<&mut Square> {
        let index = self.index(point)?;
        self.squares.get_mut(index)
    }

    /// Overwrite a square, returning what was there before
    ///
    /// Writes outside the board are dropped and return `None`.
    pub fn set(&mut self, point: Point, square: impl Into<Square>) -> Option<Square> {
        let slot = self.get_mut(point)?;
        Some(core::mem::replace(slot, square.into()))
    }

    /// Empty the square, returning what was there
    pub fn take(&mut self, point: Point) -> Square {
        self.set(point, Square::Empty).unwrap_or(Square::Empty)
    }

    pub fn is_occupied(&self, point: Point) -> bool {
        self.get(point).is_occupied()
    }

    /// An iterator over all the points on the board, row by row
    pub fn points(&self) -> impl Iterator<Item = Point> {
        let (width, height) = (self.width as i32, self.height as i32);
        (0..height).flat_map(move |y| (0..width).map(move |x| Point::new(x, y)))
    }

    /// An iterator over all the occupied squares
    pub fn pieces(&self) -> impl Iterator<Item = (Point, crate::Piece)> + '_ {
        self.points()
            .filter_map(|point| self.get(point).piece().map(|piece| (point, piece)))
    }

    /// The squares strictly between `source` and `target`, in order from `source`
    ///
    /// Empty unless both ends are on the board, distinct, and share a rank, file, or diagonal.
    pub fn path_points(&self, source: Point, target: Point) -> Vec<Point> {
        if !self.in_bounds(source) || !self.in_bounds(target) || source == target {
            return Vec::new();
        }
        let offset = target - source;
        if offset.x != 0 && offset.y != 0 && offset.x.abs() != offset.y.abs() {
            return Vec::new();
        }
        let step = offset.signum();
        (1..offset.chebyshev_distance() as i32)
            .map(|i| source + Point::new(step.x * i, step.y * i))
            .collect()
    }

    /// The squares on the path between `source` and `target` which hold a piece
    pub fn path_pieces(&self, source: Point, target: Point) -> Vec<Square> {
        self.path_points(source, target)
            .into_iter()
            .map(|point| self.get(point))
            .filter(|square| square.is_occupied())
            .collect()
    }

    /// Whether a classically certain piece stands between the squares
    ///
    /// Superposed pieces do not block.
    pub fn is_path_collapsed_blocked(&self, source: Point, target: Point) -> bool {
        self.path_pieces(source, target)
            .into_iter()
            .any(Square::is_collapsed)
    }

    pub fn is_path_empty(&self, source: Point, target: Point) -> bool {
        self.path_pieces(source, target).is_empty()
    }

    /// Parse a square like `a1`, where the letter is the file and the digit is the rank
    ///
    /// Returns `None` if the string is malformed or lands off the board.
    pub fn parse_square(&self, s: &str) -> Option<Point> {
        let &[file, rank] = s.as_bytes() else {
            return None;
        };
        if !file.is_ascii_lowercase() || !(b'1'..=b'9').contains(&rank) {
            return None;
        }
        let point = Point::new(
            i32::from(file - b'a'),
            self.height as i32 - i32::from(rank - b'0'),
        );
        self.in_bounds(point).then_some(point)
    }

    /// Name the square in the notation [`Self::parse_square`] reads
    ///
    /// Returns `None` for points off the board, or which the notation cannot express.
    pub fn square_name(&self, point: Point) -> Option<String> {
        if !self.in_bounds(point) {
            return None;
        }
        let rank = self.height as i32 - point.y;
        let file = u8::try_from(point.x).ok().filter(|file| *file < 26)?;
        if !(1..=9).contains(&rank) {
            return None;
        }
        Some(format!("{}{}", char::from(b'a' + file), rank))
    }

    /// The notation letters of the board, one row per inner vector, top row first
    pub fn simplified_matrix(&self) -> Vec<Vec<char>> {
        self.squares
            .chunks(self.width.max(1))
            .map(|row| row.iter().map(|square| square.letter()).collect())
            .collect()
    }
}

/// Draws the board as rows of notation letters, separated by spaces
impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.simplified_matrix() {
            for letter in row {
                write!(f, "{letter} ")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Color, Piece, PieceKind};

    use quickcheck::{quickcheck, TestResult};

    #[test]
    fn test_parse_square() {
        let board = Board::new(8, 8);
        assert_eq!(board.parse_square("a1"), Some(Point::new(0, 7)));
        assert_eq!(board.parse_square("h8"), Some(Point::new(7, 0)));
        assert_eq!(board.parse_square("e4"), Some(Point::new(4, 4)));
        assert_eq!(board.parse_square("i1"), None);
        assert_eq!(board.parse_square("a9"), None);
        assert_eq!(board.parse_square("a0"), None);
        assert_eq!(board.parse_square("A1"), None);
        assert_eq!(board.parse_square("a"), None);
        assert_eq!(board.parse_square("a10"), None);
        assert_eq!(board.parse_square("é1"), None);

        let small = Board::new(3, 3);
        assert_eq!(small.parse_square("a1"), Some(Point::new(0, 2)));
        assert_eq!(small.parse_square("c3"), Some(Point::new(2, 0)));
        assert_eq!(small.parse_square("a4"), None);
    }

    quickcheck! {
        fn test_square_name_round_trip(width: u8, height: u8) -> TestResult {
            let (width, height) = (usize::from(width % 26) + 1, usize::from(height % 9) + 1);
            let board = Board::new(width, height);
            TestResult::from_bool(board.points().all(|point| {
                board
                    .square_name(point)
                    .and_then(|name| board.parse_square(&name))
                    == Some(point)
            }))
        }

        fn test_path_points_lie_between(x1: u8, y1: u8, x2: u8, y2: u8) -> bool {
            let board = Board::new(8, 8);
            let source = Point::new(i32::from(x1 % 8), i32::from(y1 % 8));
            let target = Point::new(i32::from(x2 % 8), i32::from(y2 % 8));
            let path = board.path_points(source, target);
            let distance = (target - source).chebyshev_distance() as usize;
            let aligned = source != target
                && ((target - source).x == 0
                    || (target - source).y == 0
                    || (target - source).x.abs() == (target - source).y.abs());
            if !aligned {
                return path.is_empty();
            }
            path.len() == distance - 1
                && path.iter().all(|point| {
                    let before = (*point - source).chebyshev_distance();
                    let after = (target - *point).chebyshev_distance();
                    *point != source
                        && *point != target
                        && before + after == distance as u32
                        && (*point - source).signum() == (target - source).signum()
                })
        }
    }

    #[test]
    fn test_path_points() {
        let board = Board::new(8, 8);
        assert_eq!(
            board.path_points(Point::new(0, 0), Point::new(3, 3)),
            vec![Point::new(1, 1), Point::new(2, 2)]
        );
        assert_eq!(
            board.path_points(Point::new(4, 0), Point::new(4, 3)),
            vec![Point::new(4, 1), Point::new(4, 2)]
        );
        assert!(board
            .path_points(Point::new(0, 0), Point::new(1, 2))
            .is_empty());
        assert!(board
            .path_points(Point::new(0, 0), Point::new(0, 1))
            .is_empty());
        assert!(board
            .path_points(Point::new(0, 0), Point::new(0, 8))
            .is_empty());
    }

    #[test]
    fn test_superposed_pieces_do_not_block() {
        let mut board = Board::new(3, 3);
        let rook = Piece::new(PieceKind::Rook, Color::White);
        board.set(Point::new(0, 1), rook);
        assert!(board.is_path_collapsed_blocked(Point::new(0, 0), Point::new(0, 2)));
        assert!(!board.is_path_empty(Point::new(0, 0), Point::new(0, 2)));

        board.set(
            Point::new(0, 1),
            Piece {
                collapsed: false,
                ..rook
            },
        );
        assert!(!board.is_path_collapsed_blocked(Point::new(0, 0), Point::new(0, 2)));
        assert!(!board.is_path_empty(Point::new(0, 0), Point::new(0, 2)));
        assert_eq!(board.path_pieces(Point::new(0, 0), Point::new(0, 2)).len(), 1);
    }

    #[test]
    fn test_display() {
        let mut board = Board::new(3, 2);
        board.set(Point::new(0, 0), Piece::new(PieceKind::King, Color::Black));
        board.set(Point::new(2, 1), Piece::new(PieceKind::Queen, Color::White));
        assert_eq!(board.to_string(), "k 0 0 \n0 0 Q \n");
        assert_eq!(
            board.simplified_matrix(),
            vec![vec!['k', '0', '0'], vec!['0', '0', 'Q']]
        );
        assert_eq!(board.set(Point::new(5, 5), Square::Empty), None);
    }
}
