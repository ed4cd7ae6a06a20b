use crate::chess::Move;

/// Engine's score units (centipawns)
pub type Value = i32;

/// Infinity for a Value
pub const INFINITY: Value = 50_000;

/// Score of delivering mate on the current move
pub const MATE: Value = 30_000;

/// Maximum number of plies the engine supports
pub const MAX_PLY: usize = 64;

/// Scores beyond this are mate scores
pub const MATE_BOUND: Value = MATE - MAX_PLY as Value;

/// Score for the side to move being checkmated `ply` plies from the root
#[inline]
pub fn mated_in(ply: usize) -> Value {
    -MATE + ply as Value
}

#[inline]
pub fn is_mate_score(score: Value) -> bool {
    score.abs() >= MATE_BOUND
}

/// Full moves to mate, negative when the side to move is getting mated
pub fn mate_in(score: Value) -> Option<i32> {
    if !is_mate_score(score) {
        return None;
    }
    if score > 0 {
        Some((MATE - score + 1) / 2)
    } else {
        Some(-(MATE + score) / 2)
    }
}

/// Mate scores are stored relative to the node, not the root
#[inline]
pub fn score_to_tt(score: Value, ply: usize) -> Value {
    if score >= MATE_BOUND {
        score + ply as Value
    } else if score <= -MATE_BOUND {
        score - ply as Value
    } else {
        score
    }
}

#[inline]
pub fn score_from_tt(score: Value, ply: usize) -> Value {
    if score >= MATE_BOUND {
        score - ply as Value
    } else if score <= -MATE_BOUND {
        score + ply as Value
    } else {
        score
    }
}

/// Principal variation, root move first
pub type Line = Vec<Move>;
