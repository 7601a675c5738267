use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mvlearn::traits::Fit;
use mvlearn_datasets::generate::low_rank_sparse;
use mvlearn_rpca::{Godec, Orpca, OrpcaMethod};
use ndarray_rand::rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;

fn godec_bench(c: &mut Criterion) {
    let mut rng = Xoshiro256Plus::seed_from_u64(42);
    let mut group = c.benchmark_group("GoDec");
    for nsamples in [100, 250, 1_000].iter() {
        let problem = low_rank_sparse((256, *nsamples), 3, 0.01, 10., 0.01, &mut rng).unwrap();
        group.bench_with_input(BenchmarkId::new("rank_3", nsamples), nsamples, |b, _| {
            b.iter(|| {
                Godec::params(3)
                    .random_state(1)
                    .fit(black_box(&problem.observed))
                    .unwrap()
            });
        });
    }
    group.finish();
}

fn orpca_bench(c: &mut Criterion) {
    let mut rng = Xoshiro256Plus::seed_from_u64(42);
    let problem = low_rank_sparse((256, 1_000), 3, 0.01, 10., 0.01, &mut rng).unwrap();

    let mut group = c.benchmark_group("ORPCA");
    for method in &[
        OrpcaMethod::ClosedForm,
        OrpcaMethod::BlockCoordinateDescent,
        OrpcaMethod::Sgd,
        OrpcaMethod::MomentumSgd,
    ] {
        group.bench_with_input(
            BenchmarkId::new("method", method.to_string()),
            method,
            |b, &method| {
                b.iter(|| {
                    Orpca::params(3)
                        .method(method)
                        .fit(black_box(&problem.observed))
                        .unwrap()
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, godec_bench, orpca_bench);
criterion_main!(benches);
