//! Precomputed attack tables.
//!
//! Leapers (knight, king, pawn) use a plain lookup; sliders scan the
//! precomputed ray in each direction and cut it at the nearest blocker.

use super::bitboard::Bitboard;
use super::types::{Color, Role, Square};
use once_cell::sync::Lazy;

/// (file delta, rank delta) for each ray, the first four run towards higher
/// square indices
const DIRECTIONS: [(i8, i8); 8] = [
    (0, 1),   // north
    (1, 0),   // east
    (1, 1),   // north east
    (-1, 1),  // north west
    (0, -1),  // south
    (-1, 0),  // west
    (1, -1),  // south east
    (-1, -1), // south west
];

const ROOK_DIRECTIONS: [usize; 4] = [0, 1, 4, 5];
const BISHOP_DIRECTIONS: [usize; 4] = [2, 3, 6, 7];

struct Tables {
    knight: [Bitboard; 64],
    king: [Bitboard; 64],
    pawn: [[Bitboard; 64]; 2],
    rays: [[Bitboard; 64]; 8],
}

fn step(sq: Square, df: i8, dr: i8) -> Option<Square> {
    let file = sq.file() as i8 + df;
    let rank = sq.rank() as i8 + dr;
    ((0..8).contains(&file) && (0..8).contains(&rank)).then(|| Square::new(file as u8, rank as u8))
}

fn leaper(sq: Square, deltas: &[(i8, i8)]) -> Bitboard {
    deltas
        .iter()
        .filter_map(|&(df, dr)| step(sq, df, dr))
        .fold(Bitboard::EMPTY, |bb, to| bb | Bitboard::from_square(to))
}

static TABLES: Lazy<Tables> = Lazy::new(|| {
    const KNIGHT: [(i8, i8); 8] = [
        (1, 2),
        (2, 1),
        (2, -1),
        (1, -2),
        (-1, -2),
        (-2, -1),
        (-2, 1),
        (-1, 2),
    ];
    const KING: [(i8, i8); 8] = [
        (0, 1),
        (1, 1),
        (1, 0),
        (1, -1),
        (0, -1),
        (-1, -1),
        (-1, 0),
        (-1, 1),
    ];

    let mut tables = Tables {
        knight: [Bitboard::EMPTY; 64],
        king: [Bitboard::EMPTY; 64],
        pawn: [[Bitboard::EMPTY; 64]; 2],
        rays: [[Bitboard::EMPTY; 64]; 8],
    };

    for sq in Square::all() {
        let i = sq.index();
        tables.knight[i] = leaper(sq, &KNIGHT);
        tables.king[i] = leaper(sq, &KING);
        tables.pawn[Color::White.index()][i] = leaper(sq, &[(-1, 1), (1, 1)]);
        tables.pawn[Color::Black.index()][i] = leaper(sq, &[(-1, -1), (1, -1)]);

        for (dir, &(df, dr)) in DIRECTIONS.iter().enumerate() {
            let mut ray = Bitboard::EMPTY;
            let mut cur = sq;
            while let Some(next) = step(cur, df, dr) {
                ray |= Bitboard::from_square(next);
                cur = next;
            }
            tables.rays[dir][i] = ray;
        }
    }

    tables
});

/// Forces table construction, so the first search does not pay for it
pub fn init() {
    Lazy::force(&TABLES);
}

#[inline]
pub fn knight_attacks(sq: Square) -> Bitboard {
    TABLES.knight[sq.index()]
}

#[inline]
pub fn king_attacks(sq: Square) -> Bitboard {
    TABLES.king[sq.index()]
}

/// Squares a pawn of `color` standing on `sq` attacks
#[inline]
pub fn pawn_attacks(color: Color, sq: Square) -> Bitboard {
    TABLES.pawn[color.index()][sq.index()]
}

#[inline]
fn ray_attacks(dir: usize, sq: Square, occupied: Bitboard) -> Bitboard {
    let ray = TABLES.rays[dir][sq.index()];
    let blockers = ray & occupied;
    let nearest = if dir < 4 { blockers.first() } else { blockers.last() };
    match nearest {
        Some(blocker) => ray ^ TABLES.rays[dir][blocker.index()],
        None => ray,
    }
}

#[inline]
pub fn rook_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    ROOK_DIRECTIONS
        .iter()
        .fold(Bitboard::EMPTY, |bb, &dir| bb | ray_attacks(dir, sq, occupied))
}

#[inline]
pub fn bishop_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    BISHOP_DIRECTIONS
        .iter()
        .fold(Bitboard::EMPTY, |bb, &dir| bb | ray_attacks(dir, sq, occupied))
}

#[inline]
pub fn queen_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    rook_attacks(sq, occupied) | bishop_attacks(sq, occupied)
}

/// Attacks of a non-pawn piece
pub fn piece_attacks(role: Role, sq: Square, occupied: Bitboard) -> Bitboard {
    match role {
        Role::Knight => knight_attacks(sq),
        Role::Bishop => bishop_attacks(sq, occupied),
        Role::Rook => rook_attacks(sq, occupied),
        Role::Queen => queen_attacks(sq, occupied),
        Role::King => king_attacks(sq),
        Role::Pawn => unreachable!("pawn attacks depend on color"),
    }
}
