use bayesglm::{Family, FitConfig, ModelInput, bayesglm};
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use statrs::distribution::Normal;

fn design(n: usize, p: usize, seed: u64) -> Array2<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    Array2::from_shape_fn((n, p), |(_, j)| {
        if j == 0 { 1.0 } else { rng.sample(Normal::standard()) }
    })
}

fn bench_gaussian(c: &mut Criterion) {
    let x = design(2_000, 3, 42);
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let y: Array1<f64> = x
        .dot(&ndarray::array![1.0, 15.0, 5.0])
        .mapv(|m| m + rng.sample(Normal::standard()));
    let config = FitConfig::new(200, 0);
    c.bench_function("gaussian_2000x3_4chains", |bencher| {
        bencher.iter(|| {
            let fit = bayesglm(
                ModelInput::matrix(x.clone(), y.clone()),
                Family::Gaussian,
                &config,
            )
            .unwrap();
            black_box(fit);
        });
    });
}

fn bench_logit(c: &mut Criterion) {
    let x = design(2_000, 3, 43);
    let mut rng = ChaCha8Rng::seed_from_u64(8);
    let y: Array1<f64> = x
        .dot(&ndarray::array![0.5, -1.0, 2.0])
        .mapv(|eta| if rng.gen_bool(1.0 / (1.0 + (-eta).exp())) { 1.0 } else { 0.0 });
    let config = FitConfig::new(200, 0);
    c.bench_function("logit_2000x3_4chains", |bencher| {
        bencher.iter(|| {
            let fit = bayesglm(
                ModelInput::matrix(x.clone(), y.clone()),
                Family::Bernoulli,
                &config,
            )
            .unwrap();
            black_box(fit);
        });
    });
}

fn bench_single_chain(c: &mut Criterion) {
    let x = design(2_000, 3, 44);
    let y: Array1<f64> = x.column(1).mapv(|v| 2.0 * v + 0.5 * (v * 9.0).sin());
    let config = FitConfig::new(200, 0).with_chains(1);
    c.bench_function("gaussian_2000x3_1chain", |bencher| {
        bencher.iter(|| {
            let fit = bayesglm(
                ModelInput::matrix(x.clone(), y.clone()),
                Family::Gaussian,
                &config,
            )
            .unwrap();
            black_box(fit);
        });
    });
}

criterion_group!(benches, bench_gaussian, bench_logit, bench_single_chain);
criterion_main!(benches);
