//! Castling configuration
//!
//! Game modes aren't limited to the two castles of standard chess: any number of king and rook
//! pairings can be configured, each described by where both pieces start and end.

use crate::Point;

/// One way of castling
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CastlingType {
    pub rook_start: Point,
    pub rook_end: Point,
    pub king_start: Point,
    pub king_end: Point,
}

impl CastlingType {
    /// Whether moving the king from `source` to `target` asks for this castle
    pub fn is_requested_by(&self, source: Point, target: Point) -> bool {
        self.king_start == source && self.king_end == target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_requested_by() {
        let kingside = CastlingType {
            rook_start: Point::new(7, 0),
            rook_end: Point::new(5, 0),
            king_start: Point::new(4, 0),
            king_end: Point::new(6, 0),
        };
        assert!(kingside.is_requested_by(Point::new(4, 0), Point::new(6, 0)));
        assert!(!kingside.is_requested_by(Point::new(4, 0), Point::new(2, 0)));
        assert!(!kingside.is_requested_by(Point::new(4, 1), Point::new(6, 0)));
    }
}
