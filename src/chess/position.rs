use super::attacks::{bishop_attacks, king_attacks, knight_attacks, pawn_attacks, rook_attacks};
use super::bitboard::Bitboard;
use super::movegen;
use super::moves::{Move, MoveList};
use super::types::{CastlingRights, Color, Piece, Role, Square};
use super::zobrist::{self, HashKey};
use crate::error::{FenError, MoveError};
use std::fmt;
use std::str::FromStr;

pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Everything `make_move` overwrites that cannot be recomputed from the move
#[derive(Debug, Clone, Copy)]
struct Undo {
    mv: Move,
    captured: Option<Piece>,
    castling: CastlingRights,
    ep_square: Option<Square>,
    halfmove_clock: u32,
    fullmove_number: u32,
    key: HashKey,
}

/// A chess position with make/unmake support.
///
/// One instance is reused for a whole search: `make_move` pushes an undo
/// record and `unmake_move` pops it, restoring every incidental field.
#[derive(Clone)]
pub struct Position {
    board: [Option<Piece>; 64],
    by_color: [Bitboard; 2],
    by_role: [Bitboard; 6],
    turn: Color,
    castling: CastlingRights,
    ep_square: Option<Square>,
    halfmove_clock: u32,
    fullmove_number: u32,
    key: HashKey,
    history: Vec<Undo>,
}

impl Default for Position {
    fn default() -> Self {
        Position::startpos()
    }
}

impl Position {
    fn empty() -> Position {
        Position {
            board: [None; 64],
            by_color: [Bitboard::EMPTY; 2],
            by_role: [Bitboard::EMPTY; 6],
            turn: Color::White,
            castling: CastlingRights::NONE,
            ep_square: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            key: 0,
            history: Vec::with_capacity(256),
        }
    }

    pub fn startpos() -> Position {
        Position::from_fen(STARTING_FEN).expect("starting position is valid")
    }

    /// Parses a FEN string, rejecting anything that is not a legal position.
    /// The two move counters may be omitted.
    pub fn from_fen(fen: &str) -> Result<Position, FenError> {
        let mut fields = fen.split_whitespace();
        let mut pos = Position::empty();

        let board = fields.next().ok_or(FenError::MissingField("board"))?;
        pos.parse_board(board)?;

        pos.turn = match fields.next().ok_or(FenError::MissingField("side to move"))? {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(FenError::InvalidTurn(other.to_string())),
        };

        let castling = fields.next().ok_or(FenError::MissingField("castling"))?;
        pos.castling = pos.parse_castling(castling)?;

        let ep = fields.next().ok_or(FenError::MissingField("en passant"))?;
        pos.ep_square = pos.parse_en_passant(ep)?;

        if let Some(half) = fields.next() {
            pos.halfmove_clock = half
                .parse()
                .map_err(|_| FenError::InvalidClock(half.to_string()))?;
        }
        if let Some(full) = fields.next() {
            let n: u32 = full
                .parse()
                .map_err(|_| FenError::InvalidClock(full.to_string()))?;
            pos.fullmove_number = n.max(1);
        }

        pos.validate()?;
        pos.key = pos.compute_key();
        Ok(pos)
    }

    fn parse_board(&mut self, board: &str) -> Result<(), FenError> {
        let rows: Vec<&str> = board.split('/').collect();
        if rows.len() != 8 {
            return Err(FenError::InvalidBoard(board.to_string()));
        }
        for (i, row) in rows.iter().enumerate() {
            let rank = 7 - i as u8;
            let mut file = 0u8;
            for c in row.chars() {
                if let Some(skip) = c.to_digit(10) {
                    if !(1..=8).contains(&skip) {
                        return Err(FenError::InvalidBoard(board.to_string()));
                    }
                    file += skip as u8;
                } else {
                    let piece = Piece::from_char(c).ok_or(FenError::InvalidPiece(c))?;
                    if file >= 8 {
                        return Err(FenError::InvalidBoard(board.to_string()));
                    }
                    self.put(piece, Square::new(file, rank));
                    file += 1;
                }
                if file > 8 {
                    return Err(FenError::InvalidBoard(board.to_string()));
                }
            }
            if file != 8 {
                return Err(FenError::InvalidBoard(board.to_string()));
            }
        }
        Ok(())
    }

    fn parse_castling(&self, field: &str) -> Result<CastlingRights, FenError> {
        let mut rights = CastlingRights::NONE;
        if field == "-" {
            return Ok(rights);
        }
        for c in field.chars() {
            let (flag, color, king, rook) = match c {
                'K' => (CastlingRights::WHITE_KING, Color::White, Square::E1, Square::H1),
                'Q' => (CastlingRights::WHITE_QUEEN, Color::White, Square::E1, Square::A1),
                'k' => (CastlingRights::BLACK_KING, Color::Black, Square::E8, Square::H8),
                'q' => (CastlingRights::BLACK_QUEEN, Color::Black, Square::E8, Square::A8),
                _ => return Err(FenError::InvalidCastling(field.to_string())),
            };
            if rights.has(flag) {
                return Err(FenError::InvalidCastling(field.to_string()));
            }
            if self.board[king.index()] != Some(Piece::new(color, Role::King))
                || self.board[rook.index()] != Some(Piece::new(color, Role::Rook))
            {
                return Err(FenError::InconsistentCastling(c));
            }
            rights.set(flag);
        }
        Ok(rights)
    }

    /// The target is only kept when a pawn could actually capture there, so
    /// transpositions hash identically.
    fn parse_en_passant(&self, field: &str) -> Result<Option<Square>, FenError> {
        if field == "-" {
            return Ok(None);
        }
        let invalid = || FenError::InvalidEnPassant(field.to_string());
        let sq: Square = field.parse().map_err(|_| invalid())?;
        let us = self.turn;
        if sq.relative_rank(us) != 5 {
            return Err(invalid());
        }
        let pushed = sq.offset(-us.forward()).ok_or_else(invalid)?;
        let origin = sq.offset(us.forward()).ok_or_else(invalid)?;
        if self.board[pushed.index()] != Some(Piece::new(!us, Role::Pawn))
            || self.board[sq.index()].is_some()
            || self.board[origin.index()].is_some()
        {
            return Err(invalid());
        }
        let capturers = pawn_attacks(!us, sq) & self.pieces(us, Role::Pawn);
        Ok(capturers.any().then_some(sq))
    }

    fn validate(&self) -> Result<(), FenError> {
        for color in Color::ALL {
            let kings = self.pieces(color, Role::King).count();
            if kings != 1 {
                return Err(FenError::KingCount(color, kings));
            }
            if self.by_color[color.index()].count() > 16
                || self.pieces(color, Role::Pawn).count() > 8
            {
                return Err(FenError::TooManyPieces(color));
            }
        }
        let back_ranks = Bitboard::rank(0) | Bitboard::rank(7);
        if (self.by_role[Role::Pawn.index()] & back_ranks).any() {
            return Err(FenError::PawnOnBackRank);
        }
        let them = !self.turn;
        if self.is_attacked(self.king_square(them), self.turn, self.occupied()) {
            return Err(FenError::OppositeCheck);
        }
        Ok(())
    }

    pub fn to_fen(&self) -> String {
        let mut fen = String::with_capacity(90);
        for rank in (0..8).rev() {
            let mut empty = 0;
            for file in 0..8 {
                match self.board[Square::new(file, rank).index()] {
                    Some(piece) => {
                        if empty > 0 {
                            fen.push_str(&empty.to_string());
                            empty = 0;
                        }
                        fen.push(piece.char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                fen.push_str(&empty.to_string());
            }
            if rank > 0 {
                fen.push('/');
            }
        }
        let ep = self
            .ep_square
            .map(|sq| sq.to_string())
            .unwrap_or_else(|| "-".to_string());
        format!(
            "{} {} {} {} {} {}",
            fen,
            self.turn.fold('w', 'b'),
            self.castling,
            ep,
            self.halfmove_clock,
            self.fullmove_number
        )
    }

    #[inline]
    pub fn turn(&self) -> Color {
        self.turn
    }

    #[inline]
    pub fn castling(&self) -> CastlingRights {
        self.castling
    }

    #[inline]
    pub fn ep_square(&self) -> Option<Square> {
        self.ep_square
    }

    #[inline]
    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    #[inline]
    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    /// Incrementally maintained Zobrist key
    #[inline]
    pub fn key(&self) -> HashKey {
        self.key
    }

    #[inline]
    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.board[sq.index()]
    }

    #[inline]
    pub fn pieces(&self, color: Color, role: Role) -> Bitboard {
        self.by_color[color.index()] & self.by_role[role.index()]
    }

    #[inline]
    pub fn role_bb(&self, role: Role) -> Bitboard {
        self.by_role[role.index()]
    }

    #[inline]
    pub fn color_bb(&self, color: Color) -> Bitboard {
        self.by_color[color.index()]
    }

    #[inline]
    pub fn occupied(&self) -> Bitboard {
        self.by_color[0] | self.by_color[1]
    }

    #[inline]
    pub fn king_square(&self, color: Color) -> Square {
        self.pieces(color, Role::King)
            .first()
            .expect("every position has a king per side")
    }

    /// Whether `sq` is attacked by `by`, given the `occupied` squares
    pub fn is_attacked(&self, sq: Square, by: Color, occupied: Bitboard) -> bool {
        self.attackers(sq, by, occupied).any()
    }

    /// Pieces of `by` attacking `sq`, sliders are blocked by `occupied`
    pub fn attackers(&self, sq: Square, by: Color, occupied: Bitboard) -> Bitboard {
        self.attackers_without(sq, by, occupied, Bitboard::EMPTY)
    }

    /// Like `attackers`, ignoring pieces on `removed` (e.g. one about to be captured)
    pub fn attackers_without(
        &self,
        sq: Square,
        by: Color,
        occupied: Bitboard,
        removed: Bitboard,
    ) -> Bitboard {
        let them = self.by_color[by.index()] & !removed;
        let diagonal = self.by_role[Role::Bishop.index()] | self.by_role[Role::Queen.index()];
        let straight = self.by_role[Role::Rook.index()] | self.by_role[Role::Queen.index()];
        them & ((pawn_attacks(!by, sq) & self.by_role[Role::Pawn.index()])
            | (knight_attacks(sq) & self.by_role[Role::Knight.index()])
            | (king_attacks(sq) & self.by_role[Role::King.index()])
            | (bishop_attacks(sq, occupied) & diagonal)
            | (rook_attacks(sq, occupied) & straight))
    }

    /// Whether the side to move is in check
    pub fn in_check(&self) -> bool {
        self.is_attacked(self.king_square(self.turn), !self.turn, self.occupied())
    }

    pub fn legal_moves(&self) -> MoveList {
        movegen::legal_moves(self)
    }

    #[inline]
    fn put(&mut self, piece: Piece, sq: Square) {
        debug_assert!(self.board[sq.index()].is_none());
        let bb = Bitboard::from_square(sq);
        self.board[sq.index()] = Some(piece);
        self.by_color[piece.color.index()] |= bb;
        self.by_role[piece.role.index()] |= bb;
        self.key ^= zobrist::piece(piece, sq);
    }

    #[inline]
    fn remove(&mut self, sq: Square) -> Piece {
        let piece = self.board[sq.index()]
            .take()
            .unwrap_or_else(|| panic!("no piece to remove on {sq}"));
        let bb = Bitboard::from_square(sq);
        self.by_color[piece.color.index()] ^= bb;
        self.by_role[piece.role.index()] ^= bb;
        self.key ^= zobrist::piece(piece, sq);
        piece
    }

    /// Rook origin and destination for a castling king step
    #[inline]
    fn castling_rook(king_to: Square) -> (Square, Square) {
        let rank = king_to.rank();
        if king_to.file() == 6 {
            (Square::new(7, rank), Square::new(5, rank))
        } else {
            (Square::new(0, rank), Square::new(3, rank))
        }
    }

    /// Applies a move produced by the move generator for this position.
    /// Passing anything else is a programming error.
    pub fn make_move(&mut self, mv: Move) {
        let us = self.turn;
        self.history.push(Undo {
            mv,
            captured: None,
            castling: self.castling,
            ep_square: self.ep_square,
            halfmove_clock: self.halfmove_clock,
            fullmove_number: self.fullmove_number,
            key: self.key,
        });

        if let Some(ep) = self.ep_square.take() {
            self.key ^= zobrist::en_passant(ep);
        }
        self.halfmove_clock += 1;

        let mut captured = None;
        if mv.is_en_passant() {
            let victim_sq = mv
                .to
                .offset(-us.forward())
                .expect("en passant victim is on the board");
            captured = Some(self.remove(victim_sq));
        } else if mv.is_capture() {
            captured = Some(self.remove(mv.to));
        }

        let piece = self.remove(mv.from);
        assert_eq!(piece.color, us, "moving a piece of the wrong color: {mv}");
        if piece.role == Role::Pawn || captured.is_some() {
            self.halfmove_clock = 0;
        }

        match mv.promotion {
            Some(role) => {
                assert_eq!(piece.role, Role::Pawn, "only pawns promote: {mv}");
                self.put(Piece::new(us, role), mv.to);
            }
            None => {
                assert!(
                    piece.role != Role::Pawn || mv.to.relative_rank(us) != 7,
                    "pawn reached the last rank without a promotion: {mv}"
                );
                self.put(piece, mv.to);
            }
        }

        if mv.is_castle() {
            let (rook_from, rook_to) = Self::castling_rook(mv.to);
            let rook = self.remove(rook_from);
            self.put(rook, rook_to);
        }

        if mv.is_double_push() {
            let target = mv
                .from
                .offset(us.forward())
                .expect("double push passes over an on-board square");
            if (pawn_attacks(us, target) & self.pieces(!us, Role::Pawn)).any() {
                self.ep_square = Some(target);
                self.key ^= zobrist::en_passant(target);
            }
        }

        let old_rights = self.castling;
        self.castling.revoke_touching(mv.from);
        self.castling.revoke_touching(mv.to);
        if old_rights != self.castling {
            self.key ^= zobrist::castling(old_rights) ^ zobrist::castling(self.castling);
        }

        if us == Color::Black {
            self.fullmove_number += 1;
        }
        self.turn = !us;
        self.key ^= zobrist::black_to_move();

        if let Some(last) = self.history.last_mut() {
            last.captured = captured;
        }
    }

    /// Takes back the last move made with `make_move`
    pub fn unmake_move(&mut self) {
        let undo = self
            .history
            .pop()
            .expect("unmake_move called without a move to undo");
        let mv = undo.mv;
        let us = !self.turn;
        self.turn = us;

        if mv.is_castle() {
            let (rook_from, rook_to) = Self::castling_rook(mv.to);
            let rook = self.remove(rook_to);
            self.put(rook, rook_from);
        }

        let moved = self.remove(mv.to);
        let original = if mv.is_promotion() {
            Piece::new(us, Role::Pawn)
        } else {
            moved
        };
        self.put(original, mv.from);

        if let Some(captured) = undo.captured {
            let sq = if mv.is_en_passant() {
                mv.to
                    .offset(-us.forward())
                    .expect("en passant victim is on the board")
            } else {
                mv.to
            };
            self.put(captured, sq);
        }

        self.castling = undo.castling;
        self.ep_square = undo.ep_square;
        self.halfmove_clock = undo.halfmove_clock;
        self.fullmove_number = undo.fullmove_number;
        self.key = undo.key;
    }

    /// Key computed from scratch
    pub fn compute_key(&self) -> HashKey {
        let mut key = 0;
        for sq in self.occupied() {
            if let Some(piece) = self.board[sq.index()] {
                key ^= zobrist::piece(piece, sq);
            }
        }
        key ^= zobrist::castling(self.castling);
        if let Some(ep) = self.ep_square {
            key ^= zobrist::en_passant(ep);
        }
        if self.turn == Color::Black {
            key ^= zobrist::black_to_move();
        }
        key
    }

    /// Finds the legal move matching a UCI string such as `e2e4` or `e7e8q`
    pub fn parse_uci_move(&self, uci: &str) -> Result<Move, MoveError> {
        self.legal_moves()
            .into_iter()
            .find(|mv| mv.to_uci() == uci)
            .ok_or_else(|| MoveError::Illegal {
                mv: uci.to_string(),
                fen: self.to_fen(),
            })
    }

    /// Plays a move given in UCI notation, leaving the position untouched on error
    pub fn play_uci(&mut self, uci: &str) -> Result<Move, MoveError> {
        let mv = self.parse_uci_move(uci)?;
        self.make_move(mv);
        Ok(mv)
    }

    /// Neither side can possibly mate: no pawns, rooks or queens and at
    /// most one minor piece each
    pub fn is_insufficient_material(&self) -> bool {
        let heavy = self.by_role[Role::Pawn.index()]
            | self.by_role[Role::Rook.index()]
            | self.by_role[Role::Queen.index()];
        if heavy.any() {
            return false;
        }
        let minors = self.by_role[Role::Knight.index()] | self.by_role[Role::Bishop.index()];
        Color::ALL
            .iter()
            .all(|&c| (minors & self.by_color[c.index()]).count() <= 1)
    }

    /// Whether the current position already occurred since the last
    /// irreversible move
    pub fn is_repetition(&self) -> bool {
        let reversible = (self.halfmove_clock as usize).min(self.history.len());
        self.history
            .iter()
            .rev()
            .take(reversible)
            .skip(1)
            .step_by(2)
            .any(|undo| undo.key == self.key)
    }

    /// Fifty-move rule, insufficient material or repetition
    pub fn is_draw(&self) -> bool {
        self.halfmove_clock >= 100 || self.is_insufficient_material() || self.is_repetition()
    }
}

impl FromStr for Position {
    type Err = FenError;

    fn from_str(s: &str) -> Result<Position, FenError> {
        Position::from_fen(s)
    }
}

impl PartialEq for Position {
    /// Positions compare by state, not by how they were reached
    fn eq(&self, other: &Position) -> bool {
        self.board == other.board
            && self.turn == other.turn
            && self.castling == other.castling
            && self.ep_square == other.ep_square
            && self.halfmove_clock == other.halfmove_clock
            && self.fullmove_number == other.fullmove_number
            && self.key == other.key
    }
}

impl Eq for Position {}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Position({})", self.to_fen())
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0..8).rev() {
            for file in 0..8 {
                let c = self.board[Square::new(file, rank).index()]
                    .map(Piece::char)
                    .unwrap_or('.');
                write!(f, "{c} ")?;
            }
            writeln!(f)?;
        }
        write!(f, "{}", self.to_fen())
    }
}
