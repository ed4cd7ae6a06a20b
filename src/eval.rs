//! Static evaluation.
//!
//! The score is a weighted sum of four terms, each computed from white's
//! point of view and flipped for black to move:
//!
//! - material (plus a bishop pair bonus)
//! - mobility, squares attacked by minor and major pieces
//! - piece-square tables, the king table tapered by game phase
//! - king safety, pawn shield and open files, scaled by game phase
//!
//! Evaluation is a pure function of the position and the weights.

use crate::chess::{
    bishop_attacks, knight_attacks, rook_attacks, Bitboard, Color, Position, Role, Square,
};
use crate::defs::{Value, MATE_BOUND};

/// Material value of each role, indexed by `Role::index`
pub const PIECE_VALUES: [Value; 6] = [100, 320, 330, 500, 900, 0];

const BISHOP_PAIR: Value = 30;

/// Centipawns per attacked square
const MOBILITY_UNIT: Value = 2;

const SHIELD_NEAR: Value = 12;
const SHIELD_FAR: Value = 6;
const OPEN_FILE: Value = 20;
const HALF_OPEN_FILE: Value = 10;

/// Knight 1, bishop 1, rook 2, queen 4
const PHASE_WEIGHTS: [i32; 6] = [0, 1, 1, 2, 4, 0];
pub const PHASE_MAX: i32 = 24;

/// Largest static score, heavy weights must not read as a mate
pub const MAX_EVAL: Value = MATE_BOUND - 1;

// Tables are laid out as seen from white, rank 8 on the first row.
#[rustfmt::skip]
const PAWN_PST: [Value; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,
    50, 50, 50, 50, 50, 50, 50, 50,
    10, 10, 20, 30, 30, 20, 10, 10,
     5,  5, 10, 25, 25, 10,  5,  5,
     0,  0,  0, 20, 20,  0,  0,  0,
     5, -5,-10,  0,  0,-10, -5,  5,
     5, 10, 10,-20,-20, 10, 10,  5,
     0,  0,  0,  0,  0,  0,  0,  0,
];

#[rustfmt::skip]
const KNIGHT_PST: [Value; 64] = [
    -50,-40,-30,-30,-30,-30,-40,-50,
    -40,-20,  0,  0,  0,  0,-20,-40,
    -30,  0, 10, 15, 15, 10,  0,-30,
    -30,  5, 15, 20, 20, 15,  5,-30,
    -30,  0, 15, 20, 20, 15,  0,-30,
    -30,  5, 10, 15, 15, 10,  5,-30,
    -40,-20,  0,  5,  5,  0,-20,-40,
    -50,-40,-30,-30,-30,-30,-40,-50,
];

#[rustfmt::skip]
const BISHOP_PST: [Value; 64] = [
    -20,-10,-10,-10,-10,-10,-10,-20,
    -10,  0,  0,  0,  0,  0,  0,-10,
    -10,  0,  5, 10, 10,  5,  0,-10,
    -10,  5,  5, 10, 10,  5,  5,-10,
    -10,  0, 10, 10, 10, 10,  0,-10,
    -10, 10, 10, 10, 10, 10, 10,-10,
    -10,  5,  0,  0,  0,  0,  5,-10,
    -20,-10,-10,-10,-10,-10,-10,-20,
];

#[rustfmt::skip]
const ROOK_PST: [Value; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,
     5, 10, 10, 10, 10, 10, 10,  5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
     0,  0,  0,  5,  5,  0,  0,  0,
];

#[rustfmt::skip]
const QUEEN_PST: [Value; 64] = [
    -20,-10,-10, -5, -5,-10,-10,-20,
    -10,  0,  0,  0,  0,  0,  0,-10,
    -10,  0,  5,  5,  5,  5,  0,-10,
     -5,  0,  5,  5,  5,  5,  0, -5,
      0,  0,  5,  5,  5,  5,  0, -5,
    -10,  5,  5,  5,  5,  5,  0,-10,
    -10,  0,  5,  0,  0,  0,  0,-10,
    -20,-10,-10, -5, -5,-10,-10,-20,
];

#[rustfmt::skip]
const KING_MG_PST: [Value; 64] = [
    -30,-40,-40,-50,-50,-40,-40,-30,
    -30,-40,-40,-50,-50,-40,-40,-30,
    -30,-40,-40,-50,-50,-40,-40,-30,
    -30,-40,-40,-50,-50,-40,-40,-30,
    -20,-30,-30,-40,-40,-30,-30,-20,
    -10,-20,-20,-20,-20,-20,-20,-10,
     20, 20,  0,  0,  0,  0, 20, 20,
     20, 30, 10,  0,  0, 10, 30, 20,
];

#[rustfmt::skip]
const KING_EG_PST: [Value; 64] = [
    -50,-40,-30,-20,-20,-30,-40,-50,
    -30,-20,-10,  0,  0,-10,-20,-30,
    -30,-10, 20, 30, 30, 20,-10,-30,
    -30,-10, 30, 40, 40, 30,-10,-30,
    -30,-10, 30, 40, 40, 30,-10,-30,
    -30,-10, 20, 30, 30, 20,-10,-30,
    -30,-30,  0,  0,  0,  0,-30,-30,
    -50,-30,-30,-30,-30,-30,-30,-50,
];

/// Per-term coefficients, in percent (100 = nominal)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalWeights {
    pub material: i32,
    pub mobility: i32,
    pub pst: i32,
    pub king_safety: i32,
}

impl Default for EvalWeights {
    fn default() -> Self {
        EvalWeights {
            material: 100,
            mobility: 100,
            pst: 100,
            king_safety: 100,
        }
    }
}

/// Unweighted evaluation terms, white's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EvalTerms {
    pub material: Value,
    pub mobility: Value,
    pub pst: Value,
    pub king_safety: Value,
}

#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    weights: EvalWeights,
}

impl Evaluator {
    pub fn new(weights: EvalWeights) -> Self {
        Evaluator { weights }
    }

    pub fn weights(&self) -> EvalWeights {
        self.weights
    }

    pub fn set_weights(&mut self, weights: EvalWeights) {
        self.weights = weights;
    }

    /// Score from the side to move's perspective, always below the mate band
    pub fn evaluate(&self, pos: &Position) -> Value {
        let terms = Self::terms(pos);
        let w = &self.weights;
        let white = (terms.material * w.material
            + terms.mobility * w.mobility
            + terms.pst * w.pst
            + terms.king_safety * w.king_safety)
            / 100;
        let white = white.clamp(-MAX_EVAL, MAX_EVAL);
        pos.turn().fold(white, -white)
    }

    pub fn terms(pos: &Position) -> EvalTerms {
        let phase = game_phase(pos);
        let mut terms = EvalTerms::default();
        for color in Color::ALL {
            let sign = color.fold(1, -1);
            terms.material += sign * material(pos, color);
            terms.mobility += sign * mobility(pos, color);
            terms.pst += sign * placement(pos, color, phase);
            terms.king_safety += sign * king_safety(pos, color) * phase / PHASE_MAX;
        }
        terms
    }
}

/// 24 with all minor and major pieces on the board, 0 with none
pub fn game_phase(pos: &Position) -> i32 {
    let phase: i32 = Role::ALL
        .iter()
        .map(|&role| PHASE_WEIGHTS[role.index()] * pos.role_bb(role).count() as i32)
        .sum();
    phase.min(PHASE_MAX)
}

fn material(pos: &Position, color: Color) -> Value {
    let mut score: Value = Role::ALL
        .iter()
        .map(|&role| PIECE_VALUES[role.index()] * pos.pieces(color, role).count() as Value)
        .sum();
    if pos.pieces(color, Role::Bishop).count() >= 2 {
        score += BISHOP_PAIR;
    }
    score
}

fn mobility(pos: &Position, color: Color) -> Value {
    let occupied = pos.occupied();
    let targets = !pos.color_bb(color);
    let mut squares = 0;
    for sq in pos.pieces(color, Role::Knight) {
        squares += (knight_attacks(sq) & targets).count();
    }
    for sq in pos.pieces(color, Role::Bishop) {
        squares += (bishop_attacks(sq, occupied) & targets).count();
    }
    for sq in pos.pieces(color, Role::Rook) {
        squares += (rook_attacks(sq, occupied) & targets).count();
    }
    for sq in pos.pieces(color, Role::Queen) {
        let attacks = bishop_attacks(sq, occupied) | rook_attacks(sq, occupied);
        squares += (attacks & targets).count();
    }
    squares as Value * MOBILITY_UNIT
}

/// Index into a rank-8-first table for a piece of `color` on `sq`
#[inline]
fn pst_index(color: Color, sq: Square) -> usize {
    match color {
        Color::White => sq.flip_vertical().index(),
        Color::Black => sq.index(),
    }
}

fn placement(pos: &Position, color: Color, phase: i32) -> Value {
    let mut score = 0;
    for (role, table) in [
        (Role::Pawn, &PAWN_PST),
        (Role::Knight, &KNIGHT_PST),
        (Role::Bishop, &BISHOP_PST),
        (Role::Rook, &ROOK_PST),
        (Role::Queen, &QUEEN_PST),
    ] {
        for sq in pos.pieces(color, role) {
            score += table[pst_index(color, sq)];
        }
    }
    let king = pst_index(color, pos.king_square(color));
    score += (KING_MG_PST[king] * phase + KING_EG_PST[king] * (PHASE_MAX - phase)) / PHASE_MAX;
    score
}

fn king_safety(pos: &Position, color: Color) -> Value {
    let king = pos.king_square(color);
    let own_pawns = pos.pieces(color, Role::Pawn);
    let their_pawns = pos.pieces(!color, Role::Pawn);
    let rank = king.relative_rank(color);

    let mut score = 0;
    let lo = king.file().saturating_sub(1);
    let hi = (king.file() + 1).min(7);
    for file in lo..=hi {
        let file_bb = Bitboard::file(file);
        let mine = own_pawns & file_bb;
        if mine.is_empty() {
            score -= if (their_pawns & file_bb).is_empty() {
                OPEN_FILE
            } else {
                HALF_OPEN_FILE
            };
            continue;
        }
        for pawn in mine {
            match pawn.relative_rank(color).checked_sub(rank) {
                Some(1) => score += SHIELD_NEAR,
                Some(2) => score += SHIELD_FAR,
                _ => {}
            }
        }
    }
    score
}
