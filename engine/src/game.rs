use core::fmt::{self, Display, Formatter};

use board::{Board, CastlingType, Color, MoveCommand, Piece, PieceKind, Point, Square};

use crate::{
    pawn::PawnMove, ConfigError, GameMode, GameOutcome, MoveError, MoveReport, QuantumBackend,
    Result, SetupError,
};

/// Log why a move was rejected, and reject it
fn reject<T>(error: MoveError) -> Result<T> {
    log::debug!("Invalid move - {error}");
    Err(error)
}

/// A game of quantum chess
///
/// Holds the classical view of the board and validates every move against it, handing accepted
/// moves to the backend `B`, which owns the superposition.
#[derive(Debug)]
pub struct QChess<B> {
    board: Board,
    backend: B,
    current_turn: Color,
    pawn_double_step_allowed: bool,
    pawn_promotion_allowed: bool,
    /// The pawn which double stepped on the previous move, if any
    ep_pawn_point: Option<Point>,
    castling_types: Vec<CastlingType>,
}

impl<B: QuantumBackend> QChess<B> {
    /// An empty board with white to move and no castling
    pub fn new(width: usize, height: usize, mut backend: B) -> Self {
        backend.on_new_board(width, height);
        Self {
            board: Board::new(width, height),
            backend,
            current_turn: Color::White,
            pawn_double_step_allowed: true,
            pawn_promotion_allowed: true,
            ep_pawn_point: None,
            castling_types: Vec::new(),
        }
    }

    /// Set up a game as described by `mode`
    pub fn from_game_mode(mode: &GameMode, backend: B) -> Result<Self, ConfigError> {
        let (width, height) = mode.dimensions()?;
        let mut game = Self::new(width, height, backend);
        game.current_turn = mode.starting_color()?;
        game.pawn_double_step_allowed = mode.pawn_double_step_allowed;
        game.pawn_promotion_allowed = mode.pawn_promotion_allowed;
        for (at, piece) in mode.pieces()? {
            game.add_piece(at, piece)?;
        }
        game.castling_types = mode.castling_types(&game.board)?;
        Ok(game)
    }

    /// Place a piece during setup
    pub fn add_piece(&mut self, at: Point, piece: Piece) -> Result<(), SetupError> {
        let error = if !self.board.in_bounds(at) {
            SetupError::OutOfBounds(at)
        } else if self.board.is_occupied(at) {
            SetupError::Occupied(at)
        } else {
            self.board.set(at, piece);
            self.backend.on_add_piece(at, piece);
            return Ok(());
        };
        log::warn!("Could not add {} {}: {error}", piece.color, piece.kind);
        Err(error)
    }

    pub fn add_castling_type(&mut self, castling: CastlingType) {
        self.castling_types.push(castling);
    }

    pub fn set_current_turn(&mut self, color: Color) {
        self.current_turn = color;
    }

    pub fn set_pawn_double_step_allowed(&mut self, allowed: bool) {
        self.pawn_double_step_allowed = allowed;
    }

    pub fn set_pawn_promotion_allowed(&mut self, allowed: bool) {
        self.pawn_promotion_allowed = allowed;
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn current_turn(&self) -> Color {
        self.current_turn
    }

    /// Where an en passant capture can currently take the pawn, if anywhere
    pub fn ep_pawn_point(&self) -> Option<Point> {
        self.ep_pawn_point
    }

    pub fn castling_types(&self) -> &[CastlingType] {
        &self.castling_types
    }

    pub fn string_to_point(&self, s: &str) -> Option<Point> {
        self.board.parse_square(s)
    }

    pub fn point_to_string(&self, point: Point) -> Option<String> {
        self.board.square_name(point)
    }

    /// Parse and play a move command such as `"e2e4"`, `"b1^a3c3"` or `"a3c3^b1"`
    ///
    /// With `check_current_turn`, every source square must hold a piece of the color to move,
    /// and the turn passes to the other side once the move is accepted.
    pub fn perform_command(&mut self, command: &str, check_current_turn: bool) -> Result<MoveReport> {
        match MoveCommand::parse(&self.board, command) {
            Ok(command) => self.play(command, check_current_turn),
            Err(e) => reject(e.into()),
        }
    }

    /// Play an already parsed move command
    pub fn play(&mut self, command: MoveCommand, check_current_turn: bool) -> Result<MoveReport> {
        if check_current_turn
            && command
                .sources()
                .into_iter()
                .any(|source| self.board.get(source).color() != Some(self.current_turn))
        {
            return reject(MoveError::WrongTurn(self.current_turn));
        }
        let report = match command {
            MoveCommand::Standard { source, target } => self.standard_move(source, target, false),
            MoveCommand::Split {
                source,
                target1,
                target2,
            } => self.split_move(source, target1, target2, false),
            MoveCommand::Merge {
                source1,
                source2,
                target,
            } => self.merge_move(source1, source2, target, false),
        }?;
        if check_current_turn {
            self.current_turn = self.current_turn.other();
        }
        Ok(report)
    }

    fn check_source(&self, source: Point) -> Result<Piece> {
        if !self.board.in_bounds(source) {
            return reject(MoveError::SourceOutOfBounds);
        }
        match self.board.get(source) {
            Square::Occupied(piece) => Ok(piece),
            Square::Empty => reject(MoveError::SourceEmpty),
        }
    }

    fn check_target(&self, target: Point) -> Result<()> {
        if self.board.in_bounds(target) {
            Ok(())
        } else {
            reject(MoveError::TargetOutOfBounds)
        }
    }

    /// Check that the castle `castling` is possible for `king`
    fn check_castle(&self, castling: CastlingType) -> Result<()> {
        let king = castling.king_start;
        match self.board.get(castling.rook_start).piece() {
            Some(rook)
                if rook.kind == PieceKind::Rook
                    && Some(rook.color) == self.board.get(king).color() =>
            {
                if rook.has_moved {
                    return reject(MoveError::RookAlreadyMoved);
                }
            }
            _ => return reject(MoveError::RookNotInPlace),
        }
        if self.board.get(castling.rook_end).is_collapsed() {
            return reject(MoveError::RookTargetBlocked);
        }
        if self
            .board
            .is_path_collapsed_blocked(castling.rook_start, king)
        {
            return reject(MoveError::CastlingPathBlocked);
        }
        Ok(())
    }

    /// The rank a pawn of `color` promotes on
    fn promotion_rank(&self, color: Color) -> i32 {
        match color {
            Color::White => 0,
            Color::Black => self.board.height() as i32 - 1,
        }
    }

    /// Move a piece from `source` to `target`
    ///
    /// With `force`, the rules of how pieces move are not checked, though the move still can't
    /// go through collapsed pieces or onto a collapsed piece of the same color.
    pub fn standard_move(&mut self, source: Point, target: Point, force: bool) -> Result<MoveReport> {
        let piece = self.check_source(source)?;
        self.check_target(target)?;
        if source == target {
            return reject(MoveError::SameSquare);
        }
        let occupant = self.board.get(target);

        let mut castle = None;
        let mut pawn_move = None;
        if !force {
            if piece.kind == PieceKind::King && !piece.has_moved {
                castle = self
                    .castling_types
                    .iter()
                    .find(|castling| castling.is_requested_by(source, target))
                    .copied();
                if let Some(castling) = castle {
                    self.check_castle(castling)?;
                }
            }
            if castle.is_none() {
                if piece.kind == PieceKind::Pawn {
                    let Some(kind) = PawnMove::classify(
                        &self.board,
                        piece,
                        source,
                        target,
                        self.ep_pawn_point,
                        self.pawn_double_step_allowed,
                    ) else {
                        return reject(MoveError::IncorrectMove(piece.kind));
                    };
                    if matches!(kind, PawnMove::SingleStep | PawnMove::DoubleStep) {
                        if occupant.is_collapsed() {
                            return reject(MoveError::TargetBlocked);
                        }
                        if self.board.is_path_collapsed_blocked(source, target) {
                            return reject(MoveError::PathBlocked);
                        }
                    }
                    pawn_move = Some(kind);
                } else if !piece.is_move_valid(source, target) {
                    return reject(MoveError::IncorrectMove(piece.kind));
                }
            }
        }

        if occupant.color() == Some(piece.color) && occupant.is_collapsed() {
            return reject(MoveError::TargetBlocked);
        }
        if piece.kind.is_slider() && self.board.is_path_collapsed_blocked(source, target) {
            return reject(MoveError::PathBlocked);
        }

        self.ep_pawn_point = None;
        let mut report = match (castle, pawn_move) {
            (Some(castling), _) => {
                self.backend.castling_move(
                    &mut self.board,
                    source,
                    castling.rook_start,
                    target,
                    castling.rook_end,
                );
                MoveReport::Castle {
                    source,
                    target,
                    rook_source: castling.rook_start,
                    rook_target: castling.rook_end,
                }
            }
            (None, Some(PawnMove::EnPassant { captured })) => {
                self.backend
                    .en_passant_move(&mut self.board, source, target, captured);
                MoveReport::EnPassant {
                    source,
                    target,
                    captured,
                }
            }
            _ => {
                self.backend
                    .standard_move(&mut self.board, source, target, force);
                MoveReport::Standard {
                    source,
                    target,
                    promotion: None,
                }
            }
        };

        // The backend may have left the piece behind in some branches
        let Some(arrived) = self
            .board
            .get(target)
            .piece()
            .filter(|arrived| arrived.kind == piece.kind && arrived.color == piece.color)
        else {
            return Ok(report);
        };
        if pawn_move == Some(PawnMove::DoubleStep) {
            self.ep_pawn_point = Some(target);
        }
        if let Some(Square::Occupied(moved)) = self.board.get_mut(target) {
            moved.has_moved = true;
        }
        if let Some(castling) = castle {
            if let Some(Square::Occupied(rook)) = self.board.get_mut(castling.rook_end) {
                if rook.kind == PieceKind::Rook {
                    rook.has_moved = true;
                }
            }
        }
        if piece.kind == PieceKind::Pawn
            && self.pawn_promotion_allowed
            && target.y == self.promotion_rank(piece.color)
        {
            let queen = Piece {
                collapsed: arrived.collapsed,
                has_moved: true,
                ..Piece::new(PieceKind::Queen, piece.color)
            };
            self.backend
                .on_pawn_promotion(&mut self.board, target, queen, arrived);
            self.board.set(target, queen);
            if let MoveReport::Standard { promotion, .. } = &mut report {
                *promotion = Some(queen);
            }
        }
        Ok(report)
    }

    /// Replace a split or merge with one path blocked by the standard move along the other
    fn degrade(&mut self, requested: MoveCommand, source: Point, target: Point) -> Result<MoveReport> {
        log::warn!(
            "One of the paths is blocked by a collapsed piece, performing standard move in the other direction"
        );
        let realized = self.standard_move(source, target, false)?;
        Ok(MoveReport::Degraded {
            requested,
            realized: Box::new(realized),
        })
    }

    /// Split the piece on `source` between `target1` and `target2`
    pub fn split_move(
        &mut self,
        source: Point,
        target1: Point,
        target2: Point,
        force: bool,
    ) -> Result<MoveReport> {
        let piece = self.check_source(source)?;
        self.check_target(target1)?;
        self.check_target(target2)?;
        if source == target1 || source == target2 {
            return reject(MoveError::SameSquare);
        }
        if piece.kind == PieceKind::Pawn {
            return reject(MoveError::PawnSplit);
        }
        if !force && !(piece.is_move_valid(source, target1) && piece.is_move_valid(source, target2)) {
            return reject(MoveError::IncorrectMove(piece.kind));
        }
        if target1 == target2 {
            return reject(MoveError::SameSplitTargets);
        }
        for target in [target1, target2] {
            let occupant = self.board.get(target);
            if occupant.is_occupied() && occupant != Square::Occupied(piece) {
                return reject(MoveError::TargetNotEmpty);
            }
        }

        let requested = MoveCommand::Split {
            source,
            target1,
            target2,
        };
        if piece.kind.is_slider() {
            let blocked1 = self.board.is_path_collapsed_blocked(source, target1);
            let blocked2 = self.board.is_path_collapsed_blocked(source, target2);
            match (blocked1, blocked2) {
                (true, true) => return reject(MoveError::BothPathsBlocked),
                (true, false) => return self.degrade(requested, source, target2),
                (false, true) => return self.degrade(requested, source, target1),
                (false, false) => {}
            }
        }

        self.ep_pawn_point = None;
        self.backend
            .split_move(&mut self.board, source, target1, target2);
        Ok(MoveReport::Split {
            source,
            target1,
            target2,
        })
    }

    /// Merge the piece on `source1` and `source2` onto `target`
    pub fn merge_move(
        &mut self,
        source1: Point,
        source2: Point,
        target: Point,
        force: bool,
    ) -> Result<MoveReport> {
        let piece = self.check_source(source1)?;
        let other = self.check_source(source2)?;
        self.check_target(target)?;
        if source1 == target || source2 == target {
            return reject(MoveError::SameSquare);
        }
        if piece != other {
            return reject(MoveError::DifferentMergePieces);
        }
        if piece.kind == PieceKind::Pawn {
            return reject(MoveError::PawnMerge);
        }
        if !force && !(piece.is_move_valid(source1, target) && piece.is_move_valid(source2, target)) {
            return reject(MoveError::IncorrectMove(piece.kind));
        }
        if source1 == source2 {
            return reject(MoveError::SameMergeSources);
        }
        let occupant = self.board.get(target);
        if occupant.is_occupied() && occupant != Square::Occupied(piece) {
            return reject(MoveError::TargetNotEmpty);
        }

        let requested = MoveCommand::Merge {
            source1,
            source2,
            target,
        };
        if piece.kind.is_slider() {
            let blocked1 = self.board.is_path_collapsed_blocked(source1, target);
            let blocked2 = self.board.is_path_collapsed_blocked(source2, target);
            match (blocked1, blocked2) {
                (true, true) => return reject(MoveError::BothPathsBlocked),
                (true, false) => return self.degrade(requested, source2, target),
                (false, true) => return self.degrade(requested, source1, target),
                (false, false) => {}
            }
        }

        self.ep_pawn_point = None;
        self.backend
            .merge_move(&mut self.board, source1, source2, target);
        Ok(MoveReport::Merge {
            source1,
            source2,
            target,
        })
    }

    /// Whether either side has run out of kings on the classical board
    ///
    /// Superposed kings count wherever the board currently shows them; nothing is measured.
    pub fn is_game_over(&self) -> Option<GameOutcome> {
        let (white, black) = self
            .board
            .pieces()
            .filter(|(_, piece)| piece.kind == PieceKind::King)
            .fold((0, 0), |(white, black), (_, king)| match king.color {
                Color::White => (white + 1, black),
                Color::Black => (white, black + 1),
            });
        let outcome = match (white, black) {
            (0, 0) => GameOutcome::Draw,
            (_, 0) => GameOutcome::WhiteWins,
            (0, _) => GameOutcome::BlackWins,
            _ => return None,
        };
        log::info!("{}", outcome.message());
        Some(outcome)
    }

    /// Measure the whole board, leaving every piece collapsed
    pub fn collapse_board(&mut self) {
        log::info!("Collapsing the board");
        self.backend.collapse_all(&mut self.board);
    }

    /// The squares entangled with the piece on `at`
    pub fn get_all_entangled_points(&self, at: Point) -> Vec<Point> {
        self.backend.get_all_entangled_points(at)
    }

    /// The board as rows of piece letters, `'0'` for an empty square
    pub fn get_simplified_matrix(&self) -> Vec<Vec<char>> {
        self.board.simplified_matrix()
    }

    pub fn ascii_render(&self) -> String {
        self.to_string()
    }
}

impl<B> Display for QChess<B> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.board)
    }
}
