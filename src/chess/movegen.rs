//! Legal move generation.
//!
//! Pseudo-legal moves are generated per piece type, then filtered by
//! checking whether the mover's king would be attacked on the resulting
//! occupancy. The filter works on a shared reference, so callers holding a
//! `&Position` can generate without make/unmake.

use super::attacks::{pawn_attacks, piece_attacks};
use super::bitboard::Bitboard;
use super::moves::{Move, MoveFlags, MoveList};
use super::position::Position;
use super::types::{CastlingRights, Color, Role, Square};

/// All legal moves, in generation order
pub fn legal_moves(pos: &Position) -> MoveList {
    let mut moves = MoveList::new();
    generate_pseudo_legal(pos, &mut moves);
    moves.retain(|mv| is_legal(pos, mv));
    moves
}

fn generate_pseudo_legal(pos: &Position, moves: &mut MoveList) {
    let us = pos.turn();
    let own = pos.color_bb(us);
    let enemy = pos.color_bb(!us);
    let occupied = own | enemy;

    generate_pawn_moves(pos, moves, us, enemy, occupied);

    for role in [Role::Knight, Role::Bishop, Role::Rook, Role::Queen, Role::King] {
        for from in pos.pieces(us, role) {
            for to in piece_attacks(role, from, occupied) & !own {
                let flags = if enemy.contains(to) {
                    MoveFlags::CAPTURE
                } else {
                    MoveFlags::QUIET
                };
                moves.push(Move::new(from, to, flags));
            }
        }
    }

    generate_castling(pos, moves, us, occupied);
}

fn push_pawn_move(moves: &mut MoveList, us: Color, from: Square, to: Square, capture: bool) {
    if to.relative_rank(us) == 7 {
        for role in Role::PROMOTIONS {
            moves.push(Move::promotion(from, to, role, capture));
        }
    } else {
        let flags = if capture {
            MoveFlags::CAPTURE
        } else {
            MoveFlags::QUIET
        };
        moves.push(Move::new(from, to, flags));
    }
}

fn generate_pawn_moves(
    pos: &Position,
    moves: &mut MoveList,
    us: Color,
    enemy: Bitboard,
    occupied: Bitboard,
) {
    let forward = us.forward();
    for from in pos.pieces(us, Role::Pawn) {
        if let Some(one) = from.offset(forward) {
            if !occupied.contains(one) {
                push_pawn_move(moves, us, from, one, false);
                if from.relative_rank(us) == 1 {
                    if let Some(two) = one.offset(forward) {
                        if !occupied.contains(two) {
                            moves.push(Move::new(from, two, MoveFlags::DOUBLE_PUSH));
                        }
                    }
                }
            }
        }

        let targets = pawn_attacks(us, from);
        for to in targets & enemy {
            push_pawn_move(moves, us, from, to, true);
        }

        if let Some(ep) = pos.ep_square() {
            if targets.contains(ep) {
                moves.push(Move::new(
                    from,
                    ep,
                    MoveFlags::CAPTURE.with(MoveFlags::EN_PASSANT),
                ));
            }
        }
    }
}

/// King and rook unmoved (tracked by the rights), the squares between them
/// empty, and none of the squares the king stands on, passes or lands on
/// attacked.
fn generate_castling(pos: &Position, moves: &mut MoveList, us: Color, occupied: Bitboard) {
    let rights = pos.castling();
    let rank = us.fold(0, 7);
    let king_from = Square::new(4, rank);
    let them = !us;

    let sides = [
        (CastlingRights::king_side(us), [5u8, 6].as_slice(), [4u8, 5, 6].as_slice(), 6u8),
        (CastlingRights::queen_side(us), [1u8, 2, 3].as_slice(), [4u8, 3, 2].as_slice(), 2u8),
    ];

    for (flag, between, transit, king_to_file) in sides {
        if !rights.has(flag) {
            continue;
        }
        if between
            .iter()
            .any(|&file| occupied.contains(Square::new(file, rank)))
        {
            continue;
        }
        if transit
            .iter()
            .any(|&file| pos.is_attacked(Square::new(file, rank), them, occupied))
        {
            continue;
        }
        moves.push(Move::new(
            king_from,
            Square::new(king_to_file, rank),
            MoveFlags::CASTLE,
        ));
    }
}

/// Whether a pseudo-legal move keeps the mover's king safe
pub fn is_legal(pos: &Position, mv: &Move) -> bool {
    let us = pos.turn();
    let them = !us;
    let king = pos.king_square(us);
    let from_bb = Bitboard::from_square(mv.from);
    let to_bb = Bitboard::from_square(mv.to);

    if mv.from == king {
        if mv.is_castle() {
            // transit squares were checked during generation
            return true;
        }
        let occupied = (pos.occupied() ^ from_bb) | to_bb;
        return pos
            .attackers_without(mv.to, them, occupied, to_bb)
            .is_empty();
    }

    let mut captured = Bitboard::EMPTY;
    if mv.is_en_passant() {
        if let Some(victim) = mv.to.offset(-us.forward()) {
            captured = Bitboard::from_square(victim);
        }
    } else if mv.is_capture() {
        captured = to_bb;
    }

    let occupied = ((pos.occupied() ^ from_bb) & !captured) | to_bb;
    pos.attackers_without(king, them, occupied, captured)
        .is_empty()
}

/// Counts leaf nodes of the legal move tree, exercising make/unmake
pub fn perft(pos: &mut Position, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    let moves = legal_moves(pos);
    if depth == 1 {
        return moves.len() as u64;
    }
    let mut nodes = 0;
    for mv in moves {
        pos.make_move(mv);
        nodes += perft(pos, depth - 1);
        pos.unmake_move();
    }
    nodes
}
