//! Board representation and move generation.

mod attacks;
mod bitboard;
pub mod movegen;
mod moves;
mod position;
mod types;
pub mod zobrist;

pub use attacks::{bishop_attacks, king_attacks, knight_attacks, pawn_attacks, rook_attacks};
pub use bitboard::Bitboard;
pub use movegen::{legal_moves, perft};
pub use moves::{Move, MoveFlags, MoveList};
pub use position::{Position, STARTING_FEN};
pub use types::{CastlingRights, Color, Piece, Role, Square};
pub use zobrist::HashKey;

/// Builds the lookup tables up front instead of on first use
pub fn init() {
    attacks::init();
    zobrist::init();
}
