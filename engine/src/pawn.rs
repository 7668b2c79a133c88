//! Pawn moves, which unlike every other piece depend on what is on the board

use board::{Board, Piece, PieceKind, Point};

/// The kinds of move a pawn can make
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PawnMove {
    /// One square forward
    SingleStep,
    /// Two squares forward, only for a pawn which has never moved
    DoubleStep,
    /// One square diagonally forward onto an enemy piece
    Capture,
    /// One square diagonally forward behind an enemy pawn which just double stepped
    EnPassant {
        /// Where the captured pawn stands
        captured: Point,
    },
}

impl PawnMove {
    /// Work out which move `pawn` would be making, if any
    ///
    /// `ep_pawn` is the position of the pawn which double stepped on the previous move, if there
    /// is one. Whether the target or path is blocked by a collapsed piece is not checked here.
    pub fn classify(
        board: &Board,
        pawn: Piece,
        source: Point,
        target: Point,
        ep_pawn: Option<Point>,
        double_step_allowed: bool,
    ) -> Option<Self> {
        debug_assert_eq!(pawn.kind, PieceKind::Pawn);
        let offset = target - source;
        let forward = pawn.color.forward();
        match (offset.x.abs(), offset.y * forward) {
            (0, 1) => Some(Self::SingleStep),
            (0, 2) if double_step_allowed && !pawn.has_moved => Some(Self::DoubleStep),
            (1, 1) => {
                if board.get(target).color() == Some(pawn.color.other()) {
                    return Some(Self::Capture);
                }
                let captured = Point::new(target.x, source.y);
                let victim = board.get(captured).piece()?;
                (ep_pawn == Some(captured)
                    && victim.kind == PieceKind::Pawn
                    && victim.color != pawn.color)
                    .then_some(Self::EnPassant { captured })
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use board::Color;

    fn board_with(pieces: &[(Point, Piece)]) -> Board {
        let mut board = Board::new(8, 8);
        for &(at, piece) in pieces {
            board.set(at, piece);
        }
        board
    }

    #[test]
    fn test_forward_steps() {
        let pawn = Piece::new(PieceKind::Pawn, Color::White);
        let board = board_with(&[(Point::new(4, 6), pawn)]);
        let classify = |target, allowed| {
            PawnMove::classify(&board, pawn, Point::new(4, 6), target, None, allowed)
        };
        assert_eq!(classify(Point::new(4, 5), true), Some(PawnMove::SingleStep));
        assert_eq!(classify(Point::new(4, 4), true), Some(PawnMove::DoubleStep));
        assert_eq!(classify(Point::new(4, 4), false), None);
        assert_eq!(classify(Point::new(4, 7), true), None);
        assert_eq!(classify(Point::new(4, 3), true), None);

        let moved = Piece {
            has_moved: true,
            ..pawn
        };
        assert_eq!(
            PawnMove::classify(&board, moved, Point::new(4, 6), Point::new(4, 4), None, true),
            None
        );
    }

    #[test]
    fn test_black_moves_down() {
        let pawn = Piece::new(PieceKind::Pawn, Color::Black);
        let board = board_with(&[(Point::new(3, 1), pawn)]);
        assert_eq!(
            PawnMove::classify(&board, pawn, Point::new(3, 1), Point::new(3, 2), None, true),
            Some(PawnMove::SingleStep)
        );
        assert_eq!(
            PawnMove::classify(&board, pawn, Point::new(3, 1), Point::new(3, 0), None, true),
            None
        );
    }

    #[test]
    fn test_captures() {
        let pawn = Piece::new(PieceKind::Pawn, Color::White);
        let enemy = Piece::new(PieceKind::Knight, Color::Black);
        let friend = Piece::new(PieceKind::Knight, Color::White);
        let board = board_with(&[
            (Point::new(4, 6), pawn),
            (Point::new(3, 5), enemy),
            (Point::new(5, 5), friend),
        ]);
        let classify = |target| PawnMove::classify(&board, pawn, Point::new(4, 6), target, None, true);
        assert_eq!(classify(Point::new(3, 5)), Some(PawnMove::Capture));
        assert_eq!(classify(Point::new(5, 5)), None);

        let empty = board_with(&[(Point::new(4, 6), pawn)]);
        assert_eq!(
            PawnMove::classify(&empty, pawn, Point::new(4, 6), Point::new(3, 5), None, true),
            None
        );
    }

    #[test]
    fn test_en_passant() {
        let pawn = Piece {
            has_moved: true,
            ..Piece::new(PieceKind::Pawn, Color::White)
        };
        let victim = Piece::new(PieceKind::Pawn, Color::Black);
        let board = board_with(&[(Point::new(4, 3), pawn), (Point::new(5, 3), victim)]);
        let classify = |ep| {
            PawnMove::classify(&board, pawn, Point::new(4, 3), Point::new(5, 2), ep, true)
        };
        assert_eq!(
            classify(Some(Point::new(5, 3))),
            Some(PawnMove::EnPassant {
                captured: Point::new(5, 3)
            })
        );
        assert_eq!(classify(None), None);
        assert_eq!(classify(Some(Point::new(3, 3))), None);
    }
}
