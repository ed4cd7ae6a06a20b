use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use abengine::chess::{perft, Position};
use abengine::search::{Search, SearchOptions};
use abengine::SearchLimits;

#[derive(Debug, Clone, Copy)]
struct TestPosition {
    name: &'static str,
    fen: &'static str,
    depth: i32,
}

const POSITIONS: &[TestPosition] = &[
    TestPosition {
        name: "Initial position",
        fen: "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        depth: 5,
    },
    TestPosition {
        name: "Kiwipete",
        fen: "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        depth: 4,
    },
    TestPosition {
        name: "Rook endgame",
        fen: "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
        depth: 6,
    },
];

fn bench_perft(c: &mut Criterion) {
    let mut group = c.benchmark_group("perft");
    group.sample_size(10);

    for p in POSITIONS {
        let id = BenchmarkId::new(p.name, 3);
        group.bench_function(id, |b| {
            let mut pos: Position = p.fen.parse().expect("valid fen");
            b.iter(|| std::hint::black_box(perft(&mut pos, 3)))
        });
    }

    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("fixed_depth_search");
    group.sample_size(10);

    for p in POSITIONS {
        let id = BenchmarkId::new(p.name, p.depth);
        group.bench_function(id, |b| {
            b.iter(|| {
                let mut search = Search::new(16, SearchOptions::default());
                search.set_position(p.fen.parse().expect("valid fen"));
                let outcome = search.go(SearchLimits::depth(p.depth));
                // return nodes so the optimizer can't eliminate work
                std::hint::black_box(outcome.nodes)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_perft, bench_search);
criterion_main!(benches);
