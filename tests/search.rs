use abengine::chess::Position;
use abengine::defs::{mate_in, MATE};
use abengine::search::{Search, SearchOptions, SearchOutcome, SearchState};
use abengine::eval::MAX_EVAL;
use abengine::{EvalWeights, SearchLimits};
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

fn pos(fen: &str) -> Position {
    fen.parse().unwrap()
}

fn search_with(fen: &str, options: SearchOptions, limits: SearchLimits) -> SearchOutcome {
    let mut search = Search::new(4, options);
    search.set_position(pos(fen));
    search.go(limits)
}

fn search(fen: &str, limits: SearchLimits) -> SearchOutcome {
    search_with(fen, SearchOptions::default(), limits)
}

fn assert_legal_line(fen: &str, line: &[abengine::Move]) {
    let mut p = pos(fen);
    for mv in line {
        assert!(p.legal_moves().contains(mv), "{mv} is not legal in {}", p.to_fen());
        p.make_move(*mv);
    }
}

#[test]
fn finds_mate_in_one() {
    let fen = "6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1";
    let outcome = search(fen, SearchLimits::depth(4));
    assert_eq!(outcome.best_move.unwrap().to_uci(), "a1a8");
    assert_eq!(outcome.score, Some(MATE - 1));
    assert_eq!(outcome.score.and_then(mate_in), Some(1));
    assert_eq!(outcome.state, SearchState::Completed);
    // a mate inside the searched tree ends the iterations early
    assert_eq!(outcome.depth, 1);
}

#[test]
fn finds_mate_in_one_for_black() {
    let outcome = search("r5k1/8/8/8/8/8/5PPP/6K1 b - - 0 1", SearchLimits::depth(3));
    assert_eq!(outcome.best_move.unwrap().to_uci(), "a8a1");
    assert_eq!(outcome.score.and_then(mate_in), Some(1));
}

#[test]
fn sees_getting_mated() {
    // the only move allows Qg7 mate
    let fen = "7k/8/5QK1/8/8/8/8/8 b - - 0 1";
    let outcome = search(fen, SearchLimits::depth(3));
    assert_eq!(outcome.score.and_then(mate_in), Some(-1));
}

#[test]
fn checkmate_at_root() {
    let outcome = search("R5k1/5ppp/8/8/8/8/8/6K1 b - - 0 1", SearchLimits::depth(3));
    assert!(outcome.is_game_over());
    assert_eq!(outcome.best_move, None);
    assert_eq!(outcome.score, Some(-MATE));
}

#[test]
fn stalemate_at_root() {
    let outcome = search("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1", SearchLimits::depth(3));
    assert!(outcome.is_game_over());
    assert_eq!(outcome.score, Some(0));
}

#[test]
fn avoids_stalemating_when_winning() {
    let fen = "7k/8/6K1/8/8/8/8/5Q2 w - - 0 1";
    let outcome = search(fen, SearchLimits::depth(3));
    let mut p = pos(fen);
    p.make_move(outcome.best_move.unwrap());
    assert!(!p.legal_moves().is_empty() || p.in_check());
}

#[test]
fn table_does_not_change_the_result() {
    let no_tt = SearchOptions {
        use_tt: false,
        ..SearchOptions::default()
    };
    for fen in [
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        KIWIPETE,
        "r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R b KQkq - 3 3",
        "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
        "6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1",
    ] {
        for depth in 1..=3 {
            let with = search(fen, SearchLimits::depth(depth));
            let without = search_with(fen, no_tt, SearchLimits::depth(depth));
            assert_eq!(with.score, without.score, "{fen} depth {depth}");
        }
    }
}

#[test]
fn ordering_does_not_change_the_score() {
    let unordered = SearchOptions {
        use_ordering: false,
        use_tt: false,
        ..SearchOptions::default()
    };
    let plain = SearchOptions {
        use_tt: false,
        ..SearchOptions::default()
    };
    for fen in [
        KIWIPETE,
        "r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R b KQkq - 3 3",
    ] {
        let ordered = search_with(fen, plain, SearchLimits::depth(3));
        let degenerate = search_with(fen, unordered, SearchLimits::depth(3));
        assert_eq!(ordered.score, degenerate.score, "{fen}");
        assert!(ordered.nodes < degenerate.nodes, "{fen}");
    }
}

#[test]
fn opening_move_from_startpos() {
    let start = Position::startpos();
    let outcome = search(&start.to_fen(), SearchLimits::depth(4));
    let best = outcome.best_move.unwrap();
    assert!(start.legal_moves().contains(&best));
    assert!(!outcome.pv.is_empty() && outcome.pv.len() <= 4);
    assert_eq!(outcome.pv[0], best);
    assert_eq!(outcome.ponder, outcome.pv.get(1).copied());
    assert_eq!(outcome.depth, 4);
    assert_legal_line(&start.to_fen(), &outcome.pv);
}

#[test]
fn quiescence_sees_the_recapture() {
    // Qxd5 drops the queen to exd5
    let outcome = search("4k3/8/4p3/3p4/8/8/8/3QK3 w - - 0 1", SearchLimits::depth(1));
    assert_ne!(outcome.best_move.unwrap().to_uci(), "d1d5");
}

#[test]
fn wins_hanging_queen() {
    let outcome = search("4k3/8/8/3q4/8/8/8/3RK3 w - - 0 1", SearchLimits::depth(2));
    assert_eq!(outcome.best_move.unwrap().to_uci(), "d1d5");
}

#[test]
fn reports_every_completed_depth() {
    let mut search = Search::new(4, SearchOptions::default());
    search.set_position(pos(KIWIPETE));
    let mut depths = Vec::new();
    let outcome = search.go_with(SearchLimits::depth(3), |info| {
        assert!(!info.pv.is_empty());
        depths.push(info.depth);
    });
    assert_eq!(depths, vec![1, 2, 3]);
    assert_eq!(outcome.depth, 3);
    assert_eq!(search.state(), SearchState::Idle);
    assert_legal_line(KIWIPETE, &outcome.pv);
}

#[test]
fn stop_before_first_depth_still_moves() {
    let mut search = Search::new(4, SearchOptions::default());
    search.set_position(pos(KIWIPETE));
    search.stop_handle().store(true, Ordering::Relaxed);
    let outcome = search.go(SearchLimits::depth(20));
    assert_eq!(outcome.state, SearchState::Stopped);
    assert_eq!(outcome.depth, 0);
    assert_eq!(outcome.score, None);
    let best = outcome.best_move.unwrap();
    assert!(pos(KIWIPETE).legal_moves().contains(&best));

    // a fresh flag lets the next search run
    search.reset_stop();
    let outcome = search.go(SearchLimits::depth(2));
    assert_eq!(outcome.state, SearchState::Completed);
}

#[test]
fn tiny_node_budget_still_moves() {
    let outcome = search(KIWIPETE, SearchLimits::nodes(1));
    assert_eq!(outcome.state, SearchState::Stopped);
    assert!(pos(KIWIPETE).legal_moves().contains(&outcome.best_move.unwrap()));
}

#[test]
fn node_budget_is_respected() {
    let outcome = search(KIWIPETE, SearchLimits::nodes(50_000));
    assert!(outcome.nodes <= 50_000);
    assert!(outcome.depth >= 1);
}

#[test]
fn movetime_is_respected() {
    let budget = Duration::from_millis(200);
    let start = Instant::now();
    let outcome = search(KIWIPETE, SearchLimits::movetime(budget));
    let elapsed = start.elapsed();
    assert!(elapsed < budget + Duration::from_millis(500), "took {elapsed:?}");
    assert_eq!(outcome.state, SearchState::Stopped);
    assert!(outcome.best_move.is_some());
}

#[test]
fn stop_from_another_thread() {
    let mut search = Search::new(4, SearchOptions::default());
    search.set_position(pos(KIWIPETE));
    let stop = search.reset_stop();
    let handle = std::thread::spawn(move || search.go(SearchLimits::none()));
    std::thread::sleep(Duration::from_millis(100));
    stop.store(true, Ordering::Relaxed);
    let outcome = handle.join().unwrap();
    assert_eq!(outcome.state, SearchState::Stopped);
    assert!(outcome.best_move.is_some());
}

#[test]
fn dead_draw_scores_zero() {
    // a lone knight can never mate
    let outcome = search("8/8/8/4k3/8/8/8/4K1N1 w - - 0 1", SearchLimits::depth(3));
    assert_eq!(outcome.score, Some(0));
    assert!(outcome.best_move.is_some());
}

#[test]
fn heavy_material_weight_is_not_a_mate() {
    // queens stuck behind their own pawns, no mate within reach
    let mut search = Search::new(4, SearchOptions::default());
    search.set_weights(EvalWeights {
        material: 1000,
        ..EvalWeights::default()
    });
    search.set_position(pos("4k3/pppppppp/8/8/8/8/PPPPPPPP/QQQQKQQQ w - - 0 1"));
    let outcome = search.go(SearchLimits::depth(3));
    assert_eq!(outcome.depth, 3);
    assert_eq!(outcome.state, SearchState::Completed);
    assert_eq!(outcome.score.and_then(mate_in), None);
    assert!(outcome.score.unwrap() <= MAX_EVAL);
}
