//! The contract between the rules engine and whatever represents the superposed board

use board::{Board, Piece, Point};

/// Represents the branches of a quantum chess board and performs measurement
///
/// The rules engine only calls the move methods after it has accepted a move. Every method given
/// a `board` must leave it holding the classical view of the backend's state: each square shows
/// the piece that may be there, with [`Piece::collapsed`] set only if it is there with certainty.
///
/// Probability is the backend's responsibility. For any piece, the probabilities of it being on
/// each of its possible squares must keep summing to 1 after every call.
pub trait QuantumBackend {
    /// A new empty board of the given size is being set up
    fn on_new_board(&mut self, width: usize, height: usize);

    /// A piece was placed during setup
    fn on_add_piece(&mut self, at: Point, piece: Piece);

    /// Move the piece at `source` to `target`
    ///
    /// Unless `force` is set, the move only happens in the branches where it is possible.
    fn standard_move(&mut self, board: &mut Board, source: Point, target: Point, force: bool);

    /// Move the king from `source` to `target` and the rook from `rook_source` to `rook_target`
    fn castling_move(
        &mut self,
        board: &mut Board,
        source: Point,
        rook_source: Point,
        target: Point,
        rook_target: Point,
    );

    /// Move the pawn from `source` to `target`, capturing the pawn at `captured`
    fn en_passant_move(&mut self, board: &mut Board, source: Point, target: Point, captured: Point);

    /// Move the piece at `source` into two equally likely branches, one on each target
    fn split_move(&mut self, board: &mut Board, source: Point, target1: Point, target2: Point);

    /// Recombine the branches of the piece on `source1` and `source2` onto `target`
    fn merge_move(&mut self, board: &mut Board, source1: Point, source2: Point, target: Point);

    /// The pawn `old_piece` on `at` has been promoted into `new_piece`
    fn on_pawn_promotion(&mut self, board: &mut Board, at: Point, new_piece: Piece, old_piece: Piece);

    /// Measure the board, leaving a single classical outcome in which every piece is collapsed
    fn collapse_all(&mut self, board: &mut Board);

    /// The squares whose occupancy is correlated with the piece on `at`
    fn get_all_entangled_points(&self, at: Point) -> Vec<Point>;

    /// The probability that some piece occupies `at`
    fn occupancy_probability(&self, at: Point) -> f64;
}
