use abengine::chess::Position;
use abengine::defs::is_mate_score;
use abengine::eval::{game_phase, EvalWeights, Evaluator, MAX_EVAL};

fn pos(fen: &str) -> Position {
    fen.parse().unwrap()
}

/// Same position with colors swapped and the board flipped
fn mirror(fen: &str) -> String {
    let fields: Vec<&str> = fen.split_whitespace().collect();
    let swap = |s: &str| -> String {
        s.chars()
            .map(|c| {
                if c.is_ascii_uppercase() {
                    c.to_ascii_lowercase()
                } else {
                    c.to_ascii_uppercase()
                }
            })
            .collect()
    };
    let board = fields[0].split('/').rev().map(swap).collect::<Vec<_>>().join("/");
    let turn = if fields[1] == "w" { "b" } else { "w" };
    let mut castling: Vec<char> = if fields[2] == "-" {
        vec!['-']
    } else {
        swap(fields[2]).chars().collect()
    };
    castling.sort_by_key(|c| (c.is_ascii_lowercase(), *c != 'K' && *c != 'k'));
    let castling: String = castling.into_iter().collect();
    let ep = if fields[3] == "-" {
        "-".to_string()
    } else {
        let mut chars = fields[3].chars();
        let file = chars.next().unwrap();
        let rank = chars.next().unwrap();
        format!("{}{}", file, if rank == '3' { '6' } else { '3' })
    };
    format!("{board} {turn} {castling} {ep} {} {}", fields[4], fields[5])
}

const POSITIONS: [&str; 5] = [
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    "r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R b KQkq - 3 3",
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    "6k1/5ppp/8/8/8/8/5PPP/3Q2K1 w - - 0 1",
    "r5k1/5ppp/8/8/8/8/8/R5K1 b - - 0 1",
];

#[test]
fn startpos_is_balanced() {
    assert_eq!(Evaluator::default().evaluate(&Position::startpos()), 0);
}

#[test]
fn mirrored_positions_score_the_same() {
    let eval = Evaluator::default();
    for fen in POSITIONS {
        let mirrored = mirror(fen);
        assert_eq!(
            eval.evaluate(&pos(fen)),
            eval.evaluate(&pos(&mirrored)),
            "{fen} vs {mirrored}"
        );
    }
}

#[test]
fn score_is_from_the_movers_side() {
    let eval = Evaluator::default();
    let white = eval.evaluate(&pos("4k3/8/8/8/8/8/8/3QK3 w - - 0 1"));
    let black = eval.evaluate(&pos("4k3/8/8/8/8/8/8/3QK3 b - - 0 1"));
    assert!(white > 500);
    assert_eq!(black, -white);
}

#[test]
fn evaluation_is_deterministic() {
    let eval = Evaluator::default();
    for fen in POSITIONS {
        let mut p = pos(fen);
        let score = eval.evaluate(&p);
        assert_eq!(eval.evaluate(&p), score);
        for mv in p.legal_moves() {
            p.make_move(mv);
            p.unmake_move();
        }
        assert_eq!(eval.evaluate(&p), score);
    }
}

#[test]
fn weights_scale_terms() {
    let p = pos("4k3/8/8/8/8/8/8/3QK3 w - - 0 1");
    let material_only = Evaluator::new(EvalWeights {
        material: 100,
        mobility: 0,
        pst: 0,
        king_safety: 0,
    });
    assert_eq!(material_only.evaluate(&p), 900);

    let doubled = Evaluator::new(EvalWeights {
        material: 200,
        mobility: 0,
        pst: 0,
        king_safety: 0,
    });
    assert_eq!(doubled.evaluate(&p), 1800);

    let terms = Evaluator::terms(&p);
    let full = Evaluator::default().evaluate(&p);
    assert_eq!(
        full,
        terms.material + terms.mobility + terms.pst + terms.king_safety
    );
}

#[test]
fn missing_pawn_shield_costs() {
    let sheltered = Evaluator::terms(&pos("r5k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1"));
    let exposed = Evaluator::terms(&pos("r5k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1"));
    assert_eq!(sheltered.king_safety, 0);
    assert!(exposed.king_safety < 0);
}

#[test]
fn mobility_rewards_active_pieces() {
    // same material, white knight in the corner vs the center
    let corner = Evaluator::terms(&pos("4k3/8/8/8/8/8/8/N3K3 w - - 0 1"));
    let center = Evaluator::terms(&pos("4k3/8/8/8/3N4/8/8/4K3 w - - 0 1"));
    assert!(center.mobility > corner.mobility);
    assert!(center.pst > corner.pst);
}

#[test]
fn phase_drops_with_material() {
    assert_eq!(game_phase(&Position::startpos()), 24);
    assert_eq!(game_phase(&pos("r5k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1")), 4);
}

#[test]
fn heavy_weights_stay_below_mate_scores() {
    let eval = Evaluator::new(EvalWeights {
        material: 1000,
        mobility: 1000,
        pst: 1000,
        king_safety: 1000,
    });
    let white = pos("4k3/pppppppp/8/8/8/8/PPPPPPPP/QQQQKQQQ w - - 0 1");
    let black = pos("4k3/pppppppp/8/8/8/8/PPPPPPPP/QQQQKQQQ b - - 0 1");
    assert_eq!(eval.evaluate(&white), MAX_EVAL);
    assert_eq!(eval.evaluate(&black), -MAX_EVAL);
    assert!(!is_mate_score(eval.evaluate(&white)));
}
