use abengine::chess::{perft, Position};
use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess};

const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

fn pos(fen: &str) -> Position {
    fen.parse().unwrap()
}

fn moves(fen: &str) -> Vec<String> {
    let mut moves: Vec<String> = pos(fen).legal_moves().iter().map(|m| m.to_uci()).collect();
    moves.sort();
    moves
}

fn shakmaty_perft(fen: &str, depth: u32) -> u64 {
    let fen: Fen = fen.parse().unwrap();
    let chess: Chess = fen.into_position(CastlingMode::Standard).unwrap();
    shakmaty::perft(&chess, depth)
}

#[test]
fn perft_startpos() {
    let mut p = Position::startpos();
    assert_eq!(perft(&mut p, 1), 20);
    assert_eq!(perft(&mut p, 2), 400);
    assert_eq!(perft(&mut p, 3), 8902);
    assert_eq!(p, Position::startpos());
}

#[test]
fn perft_kiwipete() {
    let mut p = pos(KIWIPETE);
    assert_eq!(perft(&mut p, 1), 48);
    assert_eq!(perft(&mut p, 2), 2039);
    assert_eq!(perft(&mut p, 3), 97862);
}

#[test]
fn perft_endgame_with_en_passant_pins() {
    let mut p = pos("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1");
    assert_eq!(perft(&mut p, 1), 14);
    assert_eq!(perft(&mut p, 2), 191);
    assert_eq!(perft(&mut p, 3), 2812);
}

#[test]
fn perft_promotions_and_castling() {
    let mut p = pos("r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1");
    assert_eq!(perft(&mut p, 1), 6);
    assert_eq!(perft(&mut p, 2), 264);
    assert_eq!(perft(&mut p, 3), 9467);

    let mut p = pos("rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8");
    assert_eq!(perft(&mut p, 1), 44);
    assert_eq!(perft(&mut p, 2), 1486);
    assert_eq!(perft(&mut p, 3), 62379);
}

#[test]
fn perft_matches_shakmaty() {
    for fen in [
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        KIWIPETE,
        "r3k2r/8/8/8/3pPp2/8/8/R3K1RR b KQkq e3 0 1",
        "8/P1k5/K7/8/8/8/8/8 w - - 0 1",
        "r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R b KQkq - 3 3",
        "4k3/8/8/8/8/8/8/4K2R w K - 0 1",
    ] {
        for depth in 1..=3 {
            let mut p = pos(fen);
            assert_eq!(perft(&mut p, depth), shakmaty_perft(fen, depth), "{fen} depth {depth}");
        }
    }
}

#[test]
fn castling_blocked_by_piece() {
    let m = moves("r3k2r/8/8/8/8/8/8/R3K1NR w KQkq - 0 1");
    assert!(!m.contains(&"e1g1".to_string()));
    assert!(m.contains(&"e1c1".to_string()));
}

#[test]
fn castling_through_attacked_square() {
    // f1 is covered by the rook on f2
    let m = moves("4k3/8/8/8/8/8/5r2/R3K2R w KQ - 0 1");
    assert!(!m.contains(&"e1g1".to_string()));
    assert!(m.contains(&"e1c1".to_string()));

    // b1 only has to be empty, not safe
    let m = moves("4k3/8/8/8/8/8/1r6/R3K2R w KQ - 0 1");
    assert!(m.contains(&"e1c1".to_string()));
    assert!(m.contains(&"e1g1".to_string()));
}

#[test]
fn no_castling_out_of_check() {
    let m = moves("4k3/8/8/8/8/8/4r3/R3K2R w KQ - 0 1");
    assert!(!m.contains(&"e1g1".to_string()));
    assert!(!m.contains(&"e1c1".to_string()));
}

#[test]
fn en_passant_available() {
    let m = moves("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1");
    assert!(m.contains(&"e5d6".to_string()));
    assert!(m.contains(&"e5e6".to_string()));
}

#[test]
fn en_passant_exposing_king_on_rank() {
    let m = moves("8/8/8/K2pP2r/8/8/8/4k3 w - d6 0 1");
    assert!(!m.contains(&"e5d6".to_string()));
    assert!(m.contains(&"e5e6".to_string()));
}

#[test]
fn pinned_knight_cannot_move() {
    let m = moves("4k3/4r3/8/8/8/8/4N3/4K3 w - - 0 1");
    assert_eq!(m, vec!["e1d1", "e1d2", "e1f1", "e1f2"]);
}

#[test]
fn pinned_bishop_moves_along_the_pin() {
    let m = moves("4k3/8/8/8/7q/8/5B2/4K3 w - - 0 1");
    let bishop: Vec<_> = m.iter().filter(|m| m.starts_with("f2")).collect();
    assert_eq!(bishop, vec!["f2g3", "f2h4"]);
}

#[test]
fn promotions_need_a_piece() {
    let m = moves("4k3/1P6/8/8/8/8/8/4K3 w - - 0 1");
    for piece in ["q", "r", "b", "n"] {
        assert!(m.contains(&format!("b7b8{piece}")));
    }
    assert!(!m.contains(&"b7b8".to_string()));
    assert_eq!(m.len(), 9);
}

#[test]
fn legal_moves_never_leave_king_in_check() {
    for fen in [
        KIWIPETE,
        "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
        "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
    ] {
        let mut p = pos(fen);
        let mover = p.turn();
        for mv in p.legal_moves() {
            p.make_move(mv);
            let king = p.king_square(mover);
            assert!(!p.is_attacked(king, p.turn(), p.occupied()), "{mv} in {fen}");
            p.unmake_move();
        }
    }
}

#[test]
fn move_flags_mark_captures() {
    let p = pos(KIWIPETE);
    let moves = p.legal_moves();
    let noisy: Vec<_> = moves.iter().filter(|m| !m.is_quiet()).collect();
    assert_eq!(noisy.len(), 8);
    assert!(noisy.iter().all(|m| m.is_capture() || m.is_promotion()));
    assert!(moves.iter().filter(|m| m.is_castle()).all(|m| m.is_quiet()));
}
