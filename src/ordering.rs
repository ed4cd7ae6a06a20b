use crate::chess::{legal_moves, Color, Move, MoveList, Position, Role};
use crate::defs::{Value, MAX_PLY};
use crate::eval::PIECE_VALUES;

const TT_MOVE_SCORE: i32 = 1_000_000;
const NOISY_SCORE: i32 = 100_000;
const KILLER_SCORES: [i32; 2] = [90_000, 80_000];
/// History scores saturate below the killer band
const HISTORY_MAX: i32 = 70_000;

/// Most valuable victim, least valuable aggressor
pub fn mvv_lva(pos: &Position, mv: &Move) -> i32 {
    let victim = if mv.is_en_passant() {
        Role::Pawn
    } else {
        match pos.piece_at(mv.to) {
            Some(piece) => piece.role,
            None => return 0,
        }
    };
    let attacker = pos.piece_at(mv.from).map_or(Role::Pawn, |p| p.role);
    10_000 + PIECE_VALUES[victim.index()] * 10 - PIECE_VALUES[attacker.index()]
}

/// Up to two quiet moves per ply that caused a beta cutoff
pub struct KillerTable {
    slots: [[Option<Move>; 2]; MAX_PLY],
}

impl KillerTable {
    pub fn new() -> Self {
        KillerTable {
            slots: [[None; 2]; MAX_PLY],
        }
    }

    pub fn clear(&mut self) {
        self.slots = [[None; 2]; MAX_PLY];
    }

    /// Newest killer goes first, the older one shifts down
    pub fn store(&mut self, ply: usize, mv: Move) {
        let slot = &mut self.slots[ply];
        if slot[0] != Some(mv) {
            slot[1] = slot[0];
            slot[0] = Some(mv);
        }
    }

    pub fn get(&self, ply: usize) -> [Option<Move>; 2] {
        self.slots[ply]
    }
}

impl Default for KillerTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Cutoff counts per side and from/to pair
pub struct HistoryTable {
    scores: Box<[[[Value; 64]; 64]; 2]>,
}

impl HistoryTable {
    pub fn new() -> Self {
        HistoryTable {
            scores: Box::new([[[0; 64]; 64]; 2]),
        }
    }

    pub fn clear(&mut self) {
        *self.scores = [[[0; 64]; 64]; 2];
    }

    /// Halve every score so old searches fade out
    pub fn age(&mut self) {
        self.scores
            .iter_mut()
            .flat_map(|side| side.iter_mut())
            .flat_map(|from| from.iter_mut())
            .for_each(|score| *score /= 2);
    }

    pub fn reward(&mut self, color: Color, mv: &Move, depth: i32) {
        let score = &mut self.scores[color.index()][mv.from.index()][mv.to.index()];
        *score = (*score + depth * depth).min(HISTORY_MAX);
    }

    pub fn get(&self, color: Color, mv: &Move) -> Value {
        self.scores[color.index()][mv.from.index()][mv.to.index()]
    }
}

impl Default for HistoryTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Ranks moves at a node: table move, then captures and promotions by
/// MVV-LVA, then killers, then quiet moves by history score
#[derive(Default)]
pub struct MoveOrderer {
    pub killers: KillerTable,
    pub history: HistoryTable,
}

impl MoveOrderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets everything, for a new game
    pub fn clear(&mut self) {
        self.killers.clear();
        self.history.clear();
    }

    /// Killers are position specific, history carries over at half weight
    pub fn new_search(&mut self) {
        self.killers.clear();
        self.history.age();
    }

    pub fn score(&self, pos: &Position, mv: &Move, tt_move: Option<Move>, ply: usize) -> i32 {
        if tt_move == Some(*mv) {
            return TT_MOVE_SCORE;
        }
        if !mv.is_quiet() {
            let promotion = mv.promotion.map_or(0, |role| PIECE_VALUES[role.index()]);
            return NOISY_SCORE + mvv_lva(pos, mv) + promotion;
        }
        let killers = self.killers.get(ply);
        if let Some(slot) = killers.iter().position(|k| *k == Some(*mv)) {
            return KILLER_SCORES[slot];
        }
        self.history.get(pos.turn(), mv)
    }

    /// Sorts `moves` best first
    pub fn order(&self, pos: &Position, moves: &mut MoveList, tt_move: Option<Move>, ply: usize) {
        // sorts are from low to high, so flip
        moves.sort_by_cached_key(|mv| -self.score(pos, mv, tt_move, ply));
    }

    /// Top ranked legal move at the root, `None` when there is none
    pub fn best_guess(&self, pos: &Position, tt_move: Option<Move>) -> Option<Move> {
        let mut moves = legal_moves(pos);
        self.order(pos, &mut moves, tt_move, 0);
        moves.first().copied()
    }

    /// A quiet move failed high at `ply`
    pub fn record_cutoff(&mut self, color: Color, mv: Move, ply: usize, depth: i32) {
        if mv.is_quiet() {
            self.killers.store(ply, mv);
            self.history.reward(color, &mv, depth);
        }
    }
}
