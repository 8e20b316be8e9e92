use merge_2048::engine::{Grid, GridEngine, Move};
use merge_2048::save;
use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use rand::{rngs::StdRng, SeedableRng};
use std::hint::black_box;

fn corpus() -> Vec<Grid> {
    let mut engine = GridEngine::with_rng(StdRng::seed_from_u64(42));
    let mut grids = vec![Grid::EMPTY, *engine.grid()];
    // Derive a variety of densities deterministically
    let seq = [Move::Left, Move::Up, Move::Right, Move::Down];
    for i in 0..40 {
        let _ = engine.make_move(seq[i % seq.len()]);
        grids.push(*engine.grid());
    }
    grids
}

fn bench_shift(c: &mut Criterion) {
    let grids = corpus();
    for dir in Move::ALL {
        c.bench_function(&format!("shift/{dir:?}").to_lowercase(), |bch| {
            bch.iter(|| {
                let mut acc = 0u64;
                for g in &grids {
                    if let Ok(s) = g.shift(dir) {
                        acc = acc.wrapping_add(s.score_delta);
                    }
                }
                black_box(acc)
            })
        });
    }
}

fn bench_turns(c: &mut Criterion) {
    c.bench_function("engine/make_move_cycle", |bch| {
        bch.iter_batched(
            || GridEngine::with_rng(StdRng::seed_from_u64(9)),
            |mut engine| {
                for dir in Move::ALL.iter().cycle().take(64) {
                    let _ = engine.make_move(*dir);
                }
                black_box(engine.score())
            },
            BatchSize::SmallInput,
        )
    });
    c.bench_function("query/is_game_over", |bch| {
        let grids = corpus();
        bch.iter(|| grids.iter().filter(|g| g.is_game_over()).count())
    });
}

fn bench_save_text(c: &mut Criterion) {
    let mut engine = GridEngine::with_rng(StdRng::seed_from_u64(3));
    for dir in Move::ALL.iter().cycle().take(30) {
        let _ = engine.make_move(*dir);
    }
    let text = engine.serialize();
    c.bench_function("save/serialize", |bch| bch.iter(|| black_box(engine.serialize())));
    c.bench_function("save/deserialize", |bch| {
        bch.iter(|| black_box(save::deserialize(&text).is_ok()))
    });
}

criterion_group!(engine_ops, bench_shift, bench_turns, bench_save_text);
criterion_main!(engine_ops);
