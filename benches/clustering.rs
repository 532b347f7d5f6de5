use criterion::{black_box, criterion_group, criterion_main, Criterion};
use edmoal::algebra::RealSpace;
use edmoal::cluster::{
    seeding, BallTreeFuzzyCMeans, FuzzyCMeans, PrototypeClustering, VoronoiFuzzyCMeans,
};
use edmoal::data::IndexedDataSet;
use rand::prelude::*;

fn bench_fuzzy(c: &mut Criterion) {
    let mut group = c.benchmark_group("fuzzy_c_means");

    // Generate synthetic data
    let mut rng = StdRng::seed_from_u64(42);
    let n = 1000;
    let d = 16;
    let k = 10;

    let data: IndexedDataSet<Vec<f64>> = (0..n)
        .map(|_| (0..d).map(|_| rng.random::<f64>()).collect())
        .collect();
    let space = RealSpace::new(d);
    let seeds = seeding::kmeanspp_positions(&data, &space, k, Some(42)).unwrap();

    group.bench_function("fcm_n1000_d16_k10", |b| {
        b.iter(|| {
            let mut fcm = FuzzyCMeans::new(black_box(&data), space).unwrap();
            fcm.initialize_with_positions(&seeds).unwrap();
            fcm.apply(10).unwrap();
        })
    });

    group.bench_function("voronoi_n1000_d16_k10", |b| {
        b.iter(|| {
            let mut vfcm = VoronoiFuzzyCMeans::new(black_box(&data), space).unwrap();
            vfcm.initialize_with_positions(&seeds).unwrap();
            vfcm.apply(10).unwrap();
        })
    });

    // Tree construction is part of `new`, so it is kept out of the timed loop.
    let bt = BallTreeFuzzyCMeans::new(&data, space).unwrap();
    group.bench_function("ball_tree_n1000_d16_k10", |b| {
        b.iter(|| {
            let mut bt = bt.clone();
            bt.initialize_with_positions(&seeds).unwrap();
            bt.apply(10).unwrap();
        })
    });

    group.finish();
}

criterion_group!(benches, bench_fuzzy);
criterion_main!(benches);
