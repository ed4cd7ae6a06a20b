//! Zobrist keys.
//!
//! The key of a position is the XOR of one random value per (piece, square),
//! one per castling-rights set, one per en-passant file and one for black to
//! move. Keys are generated once from a fixed seed so hashes are reproducible
//! across runs.

use super::types::{CastlingRights, Piece, Square};
use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Hash key type
pub type HashKey = u64;

const SEED: u64 = 0x5eed_c0de_2024_0001;

struct Keys {
    pieces: [[[u64; 64]; 6]; 2],
    castling: [u64; 16],
    en_passant: [u64; 8],
    black_to_move: u64,
}

static KEYS: Lazy<Keys> = Lazy::new(|| {
    let mut rng = StdRng::seed_from_u64(SEED);
    let mut keys = Keys {
        pieces: [[[0; 64]; 6]; 2],
        castling: [0; 16],
        en_passant: [0; 8],
        black_to_move: 0,
    };
    for color in keys.pieces.iter_mut() {
        for role in color.iter_mut() {
            for sq in role.iter_mut() {
                *sq = rng.gen();
            }
        }
    }
    // no rights hashes to zero, so a bare board has a zero key
    for rights in keys.castling.iter_mut().skip(1) {
        *rights = rng.gen();
    }
    for file in keys.en_passant.iter_mut() {
        *file = rng.gen();
    }
    keys.black_to_move = rng.gen();
    keys
});

pub fn init() {
    Lazy::force(&KEYS);
}

#[inline]
pub fn piece(piece: Piece, sq: Square) -> HashKey {
    KEYS.pieces[piece.color.index()][piece.role.index()][sq.index()]
}

#[inline]
pub fn castling(rights: CastlingRights) -> HashKey {
    KEYS.castling[rights.bits() as usize]
}

#[inline]
pub fn en_passant(sq: Square) -> HashKey {
    KEYS.en_passant[sq.file() as usize]
}

#[inline]
pub fn black_to_move() -> HashKey {
    KEYS.black_to_move
}
