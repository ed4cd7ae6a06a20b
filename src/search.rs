use crate::{
    chess::{legal_moves, Move, MoveList, Position},
    defs::{
        is_mate_score, mated_in, score_from_tt, score_to_tt, Line, Value, INFINITY, MATE, MAX_PLY,
    },
    eval::{EvalWeights, Evaluator},
    limits::SearchLimits,
    ordering::MoveOrderer,
    pv_table::PVTable,
    transposition_table::{Bound, TEntry, TranspositionTable},
};
use log::{debug, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Stop flag and clock are polled once every this many nodes
const NODE_QUANTUM: u64 = 1024;

/// Where a search job is in its life
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    Idle,
    Searching,
    /// Ran until its depth limit or a proven mate
    Completed,
    /// Cancelled or out of budget, the result comes from the last full depth
    Stopped,
}

/// Switches used to run the same search with parts of the machinery off
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    pub use_tt: bool,
    pub use_ordering: bool,
    /// Plies of capture search below the horizon
    pub quiescence_depth: i32,
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions {
            use_tt: true,
            use_ordering: true,
            quiescence_depth: 8,
        }
    }
}

/// Progress after a completed iteration
#[derive(Debug, Clone)]
pub struct SearchInfo {
    pub depth: i32,
    pub score: Value,
    pub nodes: u64,
    pub elapsed: Duration,
    pub pv: Line,
    /// Table usage in permille
    pub hashfull: u32,
}

impl SearchInfo {
    pub fn nps(&self) -> u64 {
        let ms = self.elapsed.as_millis().max(1) as u64;
        self.nodes * 1000 / ms
    }
}

/// Final answer of a search job
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// `None` only when the root has no legal move
    pub best_move: Option<Move>,
    pub ponder: Option<Move>,
    /// Score of the last completed depth, or the game result at the root
    pub score: Option<Value>,
    /// Last fully searched depth, 0 if none
    pub depth: i32,
    pub nodes: u64,
    pub pv: Line,
    pub state: SearchState,
}

impl SearchOutcome {
    pub fn is_game_over(&self) -> bool {
        self.best_move.is_none()
    }
}

/// Chess search engine
pub struct Search {
    /// Position searched from, mutated in place during the walk
    pos: Position,
    /// Current ply
    ply: usize,
    /// Depth reached in current search
    depth_reached: i32,
    /// Number of nodes searched
    nodes: u64,

    /// Principal variation table
    pv: PVTable,
    /// Transposition table
    tt: TranspositionTable,
    /// Killer and history heuristics
    orderer: MoveOrderer,
    evaluator: Evaluator,
    options: SearchOptions,

    /// Start search time
    start_time: Instant,
    /// Set from outside to cancel the search
    stop: Arc<AtomicBool>,
    /// Whether the current iteration was abandoned
    aborted: bool,
    /// Limits
    limits: SearchLimits,
    state: SearchState,
}

impl Search {
    pub fn new(hash_mb: usize, options: SearchOptions) -> Self {
        Search {
            pos: Position::startpos(),
            ply: 0,
            depth_reached: 0,
            nodes: 0,
            pv: PVTable::new(),
            tt: TranspositionTable::new(hash_mb),
            orderer: MoveOrderer::new(),
            evaluator: Evaluator::default(),
            options,
            start_time: Instant::now(),
            stop: Arc::new(AtomicBool::new(false)),
            aborted: false,
            limits: SearchLimits::none(),
            state: SearchState::Idle,
        }
    }

    pub fn position(&self) -> &Position {
        &self.pos
    }

    /// Set the position to search from, keeping tables and heuristics
    pub fn set_position(&mut self, position: Position) {
        self.pos = position;
    }

    pub fn options(&self) -> SearchOptions {
        self.options
    }

    pub fn set_options(&mut self, options: SearchOptions) {
        self.options = options;
    }

    pub fn weights(&self) -> EvalWeights {
        self.evaluator.weights()
    }

    /// Stored scores depend on the weights, so the table is cleared when they change
    pub fn set_weights(&mut self, weights: EvalWeights) {
        if weights != self.evaluator.weights() {
            self.evaluator.set_weights(weights);
            self.tt.clear();
        }
    }

    pub fn resize_tt(&mut self, hash_mb: usize) {
        self.tt = TranspositionTable::new(hash_mb);
    }

    pub fn tt(&self) -> &TranspositionTable {
        &self.tt
    }

    /// Forget everything learned from previous searches
    pub fn new_game(&mut self) {
        self.tt.clear();
        self.orderer.clear();
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    /// Flag that cancels the current or next search when set
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    /// Replaces the stop flag with a fresh, unset one
    pub fn reset_stop(&mut self) -> Arc<AtomicBool> {
        self.stop = Arc::new(AtomicBool::new(false));
        self.stop.clone()
    }

    /// Runs the search with the given limits
    pub fn go(&mut self, limits: SearchLimits) -> SearchOutcome {
        self.go_with(limits, |_| {})
    }

    /// Runs the search, calling `report` after every completed depth
    pub fn go_with<F>(&mut self, limits: SearchLimits, mut report: F) -> SearchOutcome
    where
        F: FnMut(&SearchInfo),
    {
        // reset
        self.ply = 0;
        self.depth_reached = 0;
        self.nodes = 0;
        self.limits = limits;
        self.start_time = Instant::now();
        self.aborted = false;
        self.state = SearchState::Searching;
        self.orderer.new_search();
        self.tt.new_search();

        let root_moves = legal_moves(&self.pos);
        if root_moves.is_empty() {
            let score = if self.pos.in_check() { mated_in(0) } else { 0 };
            info!("no legal moves in {}", self.pos.to_fen());
            self.state = SearchState::Idle;
            return SearchOutcome {
                best_move: None,
                ponder: None,
                score: Some(score),
                depth: 0,
                nodes: 0,
                pv: Vec::new(),
                state: SearchState::Completed,
            };
        }

        // answer if the search is cut short before depth 1 completes
        let fallback = self.fallback_move(&root_moves);

        let mut best_line: Line = Vec::new();
        let mut best_score = None;
        let max_depth = self.limits.max_depth();

        for depth in 1..=max_depth {
            if self.out_of_budget() {
                self.aborted = true;
                break;
            }

            let score = self.negamax(-INFINITY, INFINITY, depth);

            if self.aborted {
                // limit reached
                // do not replace best line since the search is incomplete
                break;
            }

            self.depth_reached = depth;
            best_score = Some(score);
            best_line = self.pv.mainline();
            if best_line.is_empty() {
                panic!("depth {depth} completed without a principal variation");
            }

            let info = SearchInfo {
                depth,
                score,
                nodes: self.nodes,
                elapsed: self.start_time.elapsed(),
                pv: best_line.clone(),
                hashfull: self.tt.hashfull(),
            };
            debug!(
                "depth {} score {} nodes {} nps {} pv {}",
                depth,
                score,
                info.nodes,
                info.nps(),
                format_line(&best_line)
            );
            report(&info);

            if is_mate_score(score) && MATE - score.abs() <= depth {
                // forced mate fully inside the searched tree, deeper
                // iterations cannot change it
                break;
            }
        }

        let state = if self.aborted {
            SearchState::Stopped
        } else {
            SearchState::Completed
        };
        let best_move = best_line.first().copied().unwrap_or(fallback);
        info!(
            "search finished: {:?} at depth {} after {} nodes, best {}",
            state, self.depth_reached, self.nodes, best_move
        );
        self.state = SearchState::Idle;

        SearchOutcome {
            best_move: Some(best_move),
            ponder: best_line.get(1).copied(),
            score: best_score,
            depth: self.depth_reached,
            nodes: self.nodes,
            pv: best_line,
            state,
        }
    }

    /// Top candidate of the orderer at the root, or the first legal move
    fn fallback_move(&self, moves: &MoveList) -> Move {
        if self.options.use_ordering {
            let tt_move = self.tt.probe(self.pos.key()).and_then(|e| e.best_move);
            if let Some(mv) = self.orderer.best_guess(&self.pos, tt_move) {
                return mv;
            }
        }
        moves[0]
    }

    fn quiescence(&mut self, mut alpha: Value, beta: Value, qdepth: i32) -> Value {
        // increment the number of nodes searched
        self.nodes += 1;

        // time control
        self.checkup();

        if self.aborted {
            return 0;
        }

        self.pv.reset(self.ply);

        if self.pos.is_draw() {
            return 0;
        }

        if self.ply >= MAX_PLY - 1 {
            return self.evaluator.evaluate(&self.pos);
        }

        let in_check = self.pos.in_check();
        let mut moves = legal_moves(&self.pos);
        if moves.is_empty() {
            return if in_check { mated_in(self.ply) } else { 0 };
        }

        // in check every evasion is searched, there is no standing pat
        if !(in_check && qdepth > 0) {
            let score = self.evaluator.evaluate(&self.pos);

            // fail-hard beta cutoff
            if score >= beta {
                return beta;
            }
            if score > alpha {
                alpha = score;
            }
            if qdepth <= 0 {
                // safety cap reached
                return alpha;
            }
            moves.retain(|mv| !mv.is_quiet());
        }

        if self.options.use_ordering {
            self.orderer.order(&self.pos, &mut moves, None, self.ply);
        }

        for mv in moves {
            self.pos.make_move(mv);
            self.ply += 1;
            let score = -self.quiescence(-beta, -alpha, qdepth - 1);
            self.ply -= 1;
            self.pos.unmake_move();

            if self.aborted {
                return 0;
            }

            // fail-hard beta cutoff
            if score >= beta {
                return beta;
            }

            // found a better move
            if score > alpha {
                alpha = score;
            }
        }

        // node (move) fails low
        alpha
    }

    fn negamax(&mut self, mut alpha: Value, beta: Value, depth: i32) -> Value {
        assert!(-INFINITY <= alpha && alpha < beta && beta <= INFINITY);

        if depth <= 0 {
            // escape from recursion
            // run quiescence search
            return self.quiescence(alpha, beta, self.options.quiescence_depth);
        }

        // increment the number of nodes searched
        self.nodes += 1;

        // time control
        self.checkup();

        if self.aborted {
            return 0;
        }

        self.pv.reset(self.ply);

        let root = self.ply == 0;

        // fifty-move rule, insufficient material and repetitions
        if !root && self.pos.is_draw() {
            return 0;
        }

        if self.ply >= MAX_PLY - 1 {
            return self.evaluator.evaluate(&self.pos);
        }

        let key = self.pos.key();
        let mut tt_move = None;

        if self.options.use_tt {
            if let Some(mut entry) = self.tt.probe(key) {
                tt_move = entry.best_move;
                entry.score = score_from_tt(entry.score, self.ply);
                // the root must always produce a move
                if !root {
                    if let Some(score) = entry.cutoff(depth, alpha, beta) {
                        // hit!
                        return score.clamp(alpha, beta);
                    }
                }
            }
        }

        // generate legal moves
        let mut moves = legal_moves(&self.pos);

        if moves.is_empty() {
            return if self.pos.in_check() {
                // checkmate, shorter mates score higher
                mated_in(self.ply)
            } else {
                // stalemate
                0
            };
        }

        if self.options.use_ordering {
            self.orderer.order(&self.pos, &mut moves, tt_move, self.ply);
        }

        let turn = self.pos.turn();
        let mut best_move = None;

        for mv in moves {
            // make move
            self.pos.make_move(mv);
            self.ply += 1;

            let score = -self.negamax(-beta, -alpha, depth - 1);

            // undo move
            self.ply -= 1;
            self.pos.unmake_move();

            if self.aborted {
                // nothing computed below is trustworthy, do not store it
                return 0;
            }

            // fail-hard beta cutoff
            if score >= beta {
                self.orderer.record_cutoff(turn, mv, self.ply, depth);
                self.store(key, depth, beta, Bound::Lower, Some(mv));

                // fails high
                return beta;
            }

            // found a better move!
            if score > alpha {
                // PV node
                alpha = score;
                best_move = Some(mv);

                // write the move into the PV table
                self.pv.write(self.ply, mv);
            }
        }

        let bound = if best_move.is_some() {
            Bound::Exact
        } else {
            Bound::Upper
        };
        self.store(key, depth, alpha, bound, best_move.or(tt_move));

        // node fails low (or is exact)
        alpha
    }

    fn store(&mut self, key: u64, depth: i32, score: Value, bound: Bound, mv: Option<Move>) {
        if self.options.use_tt {
            let score = score_to_tt(score, self.ply);
            self.tt.store(key, TEntry::new(key, depth, score, bound, mv));
        }
    }

    /// Stop request, clock or node budget, checked between iterations
    fn out_of_budget(&self) -> bool {
        if self.stop.load(Ordering::Relaxed) {
            return true;
        }
        if let Some(time_limit) = self.limits.time {
            if self.start_time.elapsed() >= time_limit {
                return true;
            }
        }
        matches!(self.limits.nodes, Some(limit) if self.nodes >= limit)
    }

    fn checkup(&mut self) {
        if let Some(nodes_limit) = self.limits.nodes {
            if self.nodes >= nodes_limit {
                self.aborted = true;
                return;
            }
        }

        if self.nodes % NODE_QUANTUM == 0 {
            if self.stop.load(Ordering::Relaxed) {
                self.aborted = true;
            }
            // make sure we are not exceeding the time limit
            if let Some(time_limit) = self.limits.time {
                if self.start_time.elapsed() >= time_limit {
                    self.aborted = true;
                }
            }
        }
    }
}

/// Moves in UCI notation separated by spaces
pub fn format_line(line: &[Move]) -> String {
    line.iter()
        .map(Move::to_uci)
        .collect::<Vec<_>>()
        .join(" ")
}
