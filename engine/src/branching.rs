//! A backend which tracks every classical board the game could be in, with its probability

use core::mem;

use board::{Board, Piece, PieceKind, Point, Square};
use rand::{rngs::SmallRng, Rng, SeedableRng};

use crate::QuantumBackend;

/// Tolerance for comparing probabilities
const EPSILON: f64 = 1e-9;

/// One classical board the game could be in
#[derive(Clone, Debug)]
struct Branch {
    board: Board,
    weight: f64,
}

/// A backend which keeps a weighted list of classical boards
///
/// Every move is played out separately on each branch, and only happens on the branches where it
/// is possible there: a rook sliding through a square which is occupied in one branch and empty in
/// another will only move in the second. A split doubles every branch holding the piece, and a
/// merge moves whichever half it finds. Identical branches are folded together afterwards, so a
/// split followed by the matching merge leaves a single branch again.
///
/// Pieces in the branches are always collapsed; collapse is only meaningful on the classical view.
#[derive(Debug)]
pub struct BranchingBackend {
    branches: Vec<Branch>,
    /// How we decide which branch a measurement lands on
    rng: SmallRng,
}

impl BranchingBackend {
    /// A backend measuring with entropy from the OS
    pub fn new() -> Self {
        Self::with_rng(SmallRng::from_entropy())
    }

    /// A backend whose measurements are reproducible
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(SmallRng::seed_from_u64(seed))
    }

    fn with_rng(rng: SmallRng) -> Self {
        Self {
            branches: Vec::new(),
            rng,
        }
    }

    /// Every branch and its probability
    pub fn branches(&self) -> impl Iterator<Item = (&Board, f64)> + '_ {
        self.branches
            .iter()
            .map(|branch| (&branch.board, branch.weight))
    }

    /// The total probability of the branches matching `predicate`
    pub fn probability(&self, predicate: impl Fn(&Board) -> bool) -> f64 {
        self.branches
            .iter()
            .filter(|branch| predicate(&branch.board))
            .map(|branch| branch.weight)
            .sum()
    }

    /// Replace every branch with what `apply` makes of it, then tidy up and refresh `board`
    fn rebranch(&mut self, board: &mut Board, mut apply: impl FnMut(Branch, &mut Vec<Branch>)) {
        let mut next = Vec::with_capacity(self.branches.len() * 2);
        for branch in mem::take(&mut self.branches) {
            apply(branch, &mut next);
        }
        self.branches = next;
        self.fold();
        self.project(board);
    }

    /// Merge identical branches, summing their weights
    fn fold(&mut self) {
        let mut folded: Vec<Branch> = Vec::with_capacity(self.branches.len());
        for branch in mem::take(&mut self.branches) {
            if branch.weight <= 0.0 {
                continue;
            }
            match folded.iter_mut().find(|other| other.board == branch.board) {
                Some(existing) => {
                    existing.weight += branch.weight;
                    for (point, piece) in branch.board.pieces() {
                        if let Some(Square::Occupied(kept)) = existing.board.get_mut(point) {
                            kept.has_moved |= piece.has_moved;
                        }
                    }
                }
                None => folded.push(branch),
            }
        }
        log::trace!("{} branches after folding", folded.len());
        self.branches = folded;
    }

    /// Write the classical view of the branches onto `board`
    ///
    /// Each square shows its most likely piece, collapsed only if that piece is certainly there.
    fn project(&self, board: &mut Board) {
        let points: Vec<Point> = board.points().collect();
        for point in points {
            let mut candidates: Vec<(Piece, f64)> = Vec::new();
            for branch in &self.branches {
                let Some(piece) = branch.board.get(point).piece() else {
                    continue;
                };
                match candidates
                    .iter_mut()
                    .find(|(candidate, _)| same_identity(*candidate, piece))
                {
                    Some((candidate, weight)) => {
                        *weight += branch.weight;
                        candidate.has_moved |= piece.has_moved;
                    }
                    None => candidates.push((piece, branch.weight)),
                }
            }
            let square = candidates
                .into_iter()
                .max_by(|(_, a), (_, b)| a.total_cmp(b))
                .map_or(Square::Empty, |(piece, weight)| {
                    Square::Occupied(Piece {
                        collapsed: weight >= 1.0 - EPSILON,
                        ..piece
                    })
                });
            board.set(point, square);
        }
    }
}

impl Default for BranchingBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Kind and color match, whatever the collapse state
fn same_identity(a: Piece, b: Piece) -> bool {
    a.kind == b.kind && a.color == b.color
}

/// Whether the square holds a piece of the same kind and color as `mover`
fn holds(board: &Board, at: Point, mover: Piece) -> bool {
    board
        .get(at)
        .piece()
        .is_some_and(|piece| same_identity(piece, mover))
}

/// Move whatever is on `source` to `target`, marking it as moved
fn relocate(board: &mut Board, source: Point, target: Point) {
    if let Square::Occupied(piece) = board.take(source) {
        board.set(
            target,
            Piece {
                has_moved: true,
                ..piece
            },
        );
    }
}

/// Whether `piece` can make this move on a single classical board
fn can_move(board: &Board, piece: Piece, source: Point, target: Point) -> bool {
    let occupant = board.get(target);
    if occupant.color() == Some(piece.color) {
        return false;
    }
    let slides = piece.kind.is_slider() || piece.kind == PieceKind::Pawn;
    if slides && !board.is_path_empty(source, target) {
        return false;
    }
    match piece.kind {
        PieceKind::Pawn if source.x == target.x => occupant.is_empty(),
        PieceKind::Pawn => occupant.is_occupied(),
        _ => true,
    }
}

/// Whether `piece` could arrive on the empty `target` on a single classical board
fn is_open(board: &Board, piece: Piece, source: Point, target: Point) -> bool {
    board.get(target).is_empty()
        && (!piece.kind.is_slider() || board.is_path_empty(source, target))
}

impl QuantumBackend for BranchingBackend {
    fn on_new_board(&mut self, width: usize, height: usize) {
        self.branches = vec![Branch {
            board: Board::new(width, height),
            weight: 1.0,
        }];
    }

    fn on_add_piece(&mut self, at: Point, piece: Piece) {
        for branch in &mut self.branches {
            branch.board.set(
                at,
                Piece {
                    collapsed: true,
                    ..piece
                },
            );
        }
    }

    fn standard_move(&mut self, board: &mut Board, source: Point, target: Point, force: bool) {
        let Some(mover) = board.get(source).piece() else {
            return;
        };
        self.rebranch(board, |mut branch, next| {
            if let Some(piece) = branch.board.get(source).piece() {
                if same_identity(piece, mover)
                    && (force || can_move(&branch.board, piece, source, target))
                {
                    relocate(&mut branch.board, source, target);
                }
            }
            next.push(branch);
        });
    }

    fn castling_move(
        &mut self,
        board: &mut Board,
        source: Point,
        rook_source: Point,
        target: Point,
        rook_target: Point,
    ) {
        self.rebranch(board, |mut branch, next| {
            let allowed = {
                let b = &branch.board;
                let free = |at: Point| at == source || at == rook_source || b.get(at).is_empty();
                b.get(source).kind() == Some(PieceKind::King)
                    && b.get(rook_source).kind() == Some(PieceKind::Rook)
                    && free(target)
                    && free(rook_target)
                    && b.is_path_empty(rook_source, source)
            };
            if allowed {
                let king = branch.board.take(source);
                let rook = branch.board.take(rook_source);
                for (at, square) in [(target, king), (rook_target, rook)] {
                    if let Square::Occupied(piece) = square {
                        branch.board.set(
                            at,
                            Piece {
                                has_moved: true,
                                ..piece
                            },
                        );
                    }
                }
            }
            next.push(branch);
        });
    }

    fn en_passant_move(&mut self, board: &mut Board, source: Point, target: Point, captured: Point) {
        self.rebranch(board, |mut branch, next| {
            let allowed = {
                let b = &branch.board;
                match (b.get(source).piece(), b.get(captured).piece()) {
                    (Some(pawn), Some(victim)) => {
                        pawn.kind == PieceKind::Pawn
                            && victim.kind == PieceKind::Pawn
                            && pawn.color != victim.color
                            && b.get(target).is_empty()
                    }
                    _ => false,
                }
            };
            if allowed {
                branch.board.take(captured);
                relocate(&mut branch.board, source, target);
            }
            next.push(branch);
        });
    }

    fn split_move(&mut self, board: &mut Board, source: Point, target1: Point, target2: Point) {
        let Some(mover) = board.get(source).piece() else {
            return;
        };
        self.rebranch(board, |mut branch, next| {
            let Some(piece) = branch
                .board
                .get(source)
                .piece()
                .filter(|piece| same_identity(*piece, mover))
            else {
                next.push(branch);
                return;
            };
            let open1 = is_open(&branch.board, piece, source, target1);
            let open2 = is_open(&branch.board, piece, source, target2);
            match (open1, open2) {
                (true, true) => {
                    branch.weight /= 2.0;
                    let mut other = branch.clone();
                    relocate(&mut branch.board, source, target1);
                    relocate(&mut other.board, source, target2);
                    next.push(branch);
                    next.push(other);
                }
                (true, false) => {
                    relocate(&mut branch.board, source, target1);
                    next.push(branch);
                }
                (false, true) => {
                    relocate(&mut branch.board, source, target2);
                    next.push(branch);
                }
                (false, false) => next.push(branch),
            }
        });
    }

    fn merge_move(&mut self, board: &mut Board, source1: Point, source2: Point, target: Point) {
        let Some(mover) = board.get(source1).piece() else {
            return;
        };
        self.rebranch(board, |mut branch, next| {
            let from = [source1, source2].into_iter().find(|&source| {
                holds(&branch.board, source, mover)
                    && is_open(&branch.board, mover, source, target)
            });
            if let Some(source) = from {
                relocate(&mut branch.board, source, target);
            }
            next.push(branch);
        });
    }

    fn on_pawn_promotion(&mut self, board: &mut Board, at: Point, new_piece: Piece, old_piece: Piece) {
        self.rebranch(board, |mut branch, next| {
            if holds(&branch.board, at, old_piece) {
                branch.board.set(
                    at,
                    Piece {
                        collapsed: true,
                        ..new_piece
                    },
                );
            }
            next.push(branch);
        });
    }

    fn collapse_all(&mut self, board: &mut Board) {
        let total: f64 = self.branches.iter().map(|branch| branch.weight).sum();
        let mut remaining = self.rng.gen::<f64>() * total;
        let chosen = self
            .branches
            .iter()
            .position(|branch| {
                remaining -= branch.weight;
                remaining < 0.0
            })
            .or_else(|| self.branches.len().checked_sub(1));
        if let Some(chosen) = chosen {
            let mut branch = self.branches.swap_remove(chosen);
            log::debug!("measured a branch of probability {}", branch.weight / total);
            branch.weight = 1.0;
            self.branches = vec![branch];
        }
        self.project(board);
    }

    fn get_all_entangled_points(&self, at: Point) -> Vec<Point> {
        let Some(first) = self.branches.first() else {
            return Vec::new();
        };
        let here = self.occupancy_probability(at);
        if here <= EPSILON {
            return Vec::new();
        }
        first
            .board
            .points()
            .filter(|&point| point != at)
            .filter(|&point| {
                let there = self.occupancy_probability(point);
                let both = self.probability(|board| board.is_occupied(at) && board.is_occupied(point));
                (both - here * there).abs() > EPSILON
            })
            .collect()
    }

    fn occupancy_probability(&self, at: Point) -> f64 {
        self.probability(|board| board.is_occupied(at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::QChess;
    use board::Color;

    use quickcheck::quickcheck;

    fn rook() -> Piece {
        Piece::new(PieceKind::Rook, Color::White)
    }

    fn setup(width: usize, height: usize, pieces: &[(Point, Piece)]) -> (BranchingBackend, Board) {
        let mut backend = BranchingBackend::seeded(7);
        let mut board = Board::new(width, height);
        backend.on_new_board(width, height);
        for &(at, piece) in pieces {
            board.set(at, piece);
            backend.on_add_piece(at, piece);
        }
        (backend, board)
    }

    #[test]
    fn test_split_halves_branches() {
        let (mut backend, mut board) = setup(3, 3, &[(Point::new(0, 2), rook())]);
        backend.split_move(&mut board, Point::new(0, 2), Point::new(0, 0), Point::new(2, 2));

        assert_eq!(backend.branches().count(), 2);
        assert!((backend.occupancy_probability(Point::new(0, 0)) - 0.5).abs() < EPSILON);
        assert!((backend.occupancy_probability(Point::new(2, 2)) - 0.5).abs() < EPSILON);
        assert_eq!(backend.occupancy_probability(Point::new(0, 2)), 0.0);

        let split = board.get(Point::new(0, 0)).piece().unwrap();
        assert!(!split.collapsed);
        assert!(split.has_moved);
        assert_eq!(board.get(Point::new(0, 2)), Square::Empty);
    }

    #[test]
    fn test_merge_undoes_split() {
        let (mut backend, mut board) = setup(3, 3, &[(Point::new(0, 2), rook())]);
        backend.split_move(&mut board, Point::new(0, 2), Point::new(0, 0), Point::new(2, 2));
        backend.merge_move(&mut board, Point::new(0, 0), Point::new(2, 2), Point::new(0, 2));

        assert_eq!(backend.branches().count(), 1);
        assert!(board.get(Point::new(0, 2)).is_collapsed());
        assert!(backend.get_all_entangled_points(Point::new(0, 2)).is_empty());
    }

    #[test]
    fn test_entangled_points() {
        let (mut backend, mut board) = setup(3, 3, &[(Point::new(0, 2), rook())]);
        backend.split_move(&mut board, Point::new(0, 2), Point::new(0, 0), Point::new(2, 2));

        assert_eq!(
            backend.get_all_entangled_points(Point::new(0, 0)),
            vec![Point::new(2, 2)]
        );
        assert!(backend
            .get_all_entangled_points(Point::new(1, 1))
            .is_empty());
    }

    #[test]
    fn test_collapse_picks_one_branch() {
        let (mut backend, mut board) = setup(3, 3, &[(Point::new(0, 2), rook())]);
        backend.split_move(&mut board, Point::new(0, 2), Point::new(0, 0), Point::new(2, 2));
        backend.collapse_all(&mut board);

        assert_eq!(backend.branches().count(), 1);
        let occupied: Vec<_> = board.pieces().collect();
        assert_eq!(occupied.len(), 1);
        assert!(occupied[0].1.collapsed);
        assert!([Point::new(0, 0), Point::new(2, 2)].contains(&occupied[0].0));
    }

    #[test]
    fn test_slide_only_moves_where_path_is_clear() {
        let king = Piece::new(PieceKind::King, Color::White);
        let (mut backend, mut board) =
            setup(3, 3, &[(Point::new(0, 2), rook()), (Point::new(1, 1), king)]);
        backend.split_move(&mut board, Point::new(1, 1), Point::new(0, 1), Point::new(1, 0));
        backend.standard_move(&mut board, Point::new(0, 2), Point::new(0, 0), false);

        assert!((backend.occupancy_probability(Point::new(0, 0)) - 0.5).abs() < EPSILON);
        assert!((backend.occupancy_probability(Point::new(0, 2)) - 0.5).abs() < EPSILON);
        let total: f64 = backend.branches().map(|(_, weight)| weight).sum();
        assert!((total - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_forced_move_ignores_blockers() {
        let blocker = Piece::new(PieceKind::Knight, Color::Black);
        let (mut backend, mut board) =
            setup(3, 3, &[(Point::new(0, 2), rook()), (Point::new(0, 1), blocker)]);
        backend.standard_move(&mut board, Point::new(0, 2), Point::new(0, 0), true);
        assert_eq!(board.get(Point::new(0, 0)).kind(), Some(PieceKind::Rook));
    }

    #[test]
    fn test_promotion_replaces_in_every_branch() {
        let pawn = Piece::new(PieceKind::Pawn, Color::White);
        let queen = Piece::new(PieceKind::Queen, Color::White);
        let (mut backend, mut board) = setup(3, 3, &[(Point::new(1, 0), pawn)]);
        backend.on_pawn_promotion(&mut board, Point::new(1, 0), queen, pawn);
        assert_eq!(board.get(Point::new(1, 0)), Square::Occupied(queen));
        assert!(backend.probability(|b| b.get(Point::new(1, 0)).kind() == Some(PieceKind::Queen)) > 1.0 - EPSILON);
    }

    quickcheck! {
        fn test_probability_conserved(moves: Vec<(u8, u8, u8, u8)>) -> bool {
            let mut game = QChess::new(4, 4, BranchingBackend::seeded(0));
            let square = |n: u8| Point::new(i32::from(n % 4), i32::from(n / 4 % 4));
            let pieces = [
                (Point::new(0, 0), Piece::new(PieceKind::Queen, Color::White)),
                (Point::new(3, 3), Piece::new(PieceKind::Knight, Color::White)),
            ];
            for (at, piece) in pieces {
                if game.add_piece(at, piece).is_err() {
                    return false;
                }
            }
            for (kind, a, b, c) in moves {
                // Most of these are illegal, which is fine
                let _ = match kind % 3 {
                    0 => game.standard_move(square(a), square(b), false),
                    1 => game.split_move(square(a), square(b), square(c), false),
                    _ => game.merge_move(square(a), square(b), square(c), false),
                };
            }
            let backend = game.backend();
            let total: f64 = backend.branches().map(|(_, weight)| weight).sum();
            let occupancy: f64 = game
                .board()
                .points()
                .map(|point| backend.occupancy_probability(point))
                .sum();
            (total - 1.0).abs() < 1e-6 && (occupancy - 2.0).abs() < 1e-6
        }
    }
}
