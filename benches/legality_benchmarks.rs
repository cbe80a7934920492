//! Benchmarks for move legality and notation.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use referee::board::{
    apply_move, evaluate_end, generate_legal, parse_move, to_algebraic, Position, Variant,
};

fn perft(pos: &Position, depth: usize) -> u64 {
    if depth == 0 {
        return 1;
    }
    let (moves, _) = generate_legal(pos, pos.flags(), pos.ep_file());
    if depth == 1 {
        return moves.len() as u64;
    }
    moves
        .iter()
        .map(|mv| perft(&apply_move(pos, mv), depth - 1))
        .sum()
}

fn bench_perft(c: &mut Criterion) {
    let mut group = c.benchmark_group("perft");

    let startpos = Position::start(Variant::Normal);
    for depth in 1..=3 {
        group.bench_with_input(BenchmarkId::new("startpos", depth), &depth, |b, &depth| {
            b.iter(|| perft(black_box(&startpos), depth))
        });
    }

    // Kiwipete
    let kiwipete = Position::try_from_fen(
        Variant::Normal,
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    )
    .unwrap();
    for depth in 1..=2 {
        group.bench_with_input(BenchmarkId::new("kiwipete", depth), &depth, |b, &depth| {
            b.iter(|| perft(black_box(&kiwipete), depth))
        });
    }

    group.finish();
}

fn bench_movegen(c: &mut Criterion) {
    let mut group = c.benchmark_group("movegen");

    for variant in [
        Variant::Normal,
        Variant::Capablanca,
        Variant::Xiangqi,
        Variant::Crazyhouse,
    ] {
        let pos = Position::start(variant);
        group.bench_function(variant.name(), |b| {
            b.iter(|| black_box(generate_legal(&pos, pos.flags(), pos.ep_file())))
        });
    }

    group.finish();
}

fn bench_notation(c: &mut Criterion) {
    let mut group = c.benchmark_group("notation");

    let pos = Position::try_from_fen(
        Variant::Normal,
        "r1bqkb1r/pppp1ppp/2n2n2/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4",
    )
    .unwrap();
    group.bench_function("parse_san", |b| {
        b.iter(|| parse_move(&pos, pos.flags(), pos.ep_file(), black_box("Ng5")))
    });
    group.bench_function("parse_coordinate", |b| {
        b.iter(|| parse_move(&pos, pos.flags(), pos.ep_file(), black_box("e1g1")))
    });

    let (moves, _) = generate_legal(&pos, pos.flags(), pos.ep_file());
    group.bench_function("to_algebraic_all", |b| {
        b.iter(|| {
            for mv in moves.iter() {
                black_box(to_algebraic(&pos, pos.flags(), pos.ep_file(), mv));
            }
        })
    });

    group.finish();
}

fn bench_game_end(c: &mut Criterion) {
    let pos = Position::try_from_fen(
        Variant::Normal,
        "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3",
    )
    .unwrap();
    c.bench_function("evaluate_end_mate", |b| {
        b.iter(|| black_box(evaluate_end(&pos, pos.flags(), pos.ep_file())))
    });
}

criterion_group!(benches, bench_perft, bench_movegen, bench_notation, bench_game_end);
criterion_main!(benches);
