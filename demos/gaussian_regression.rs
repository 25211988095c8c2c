//! Bayesian linear regression from a formula and a data frame.

use bayesglm::{DataFrame, Family, FitConfig, ModelInput, bayesglm};
use rand::{Rng, SeedableRng};
use statrs::distribution::Normal;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let n = 2_000;
    let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(0);
    let normal = Normal::standard();
    let x1: Vec<f64> = (0..n).map(|_| rng.sample(normal)).collect();
    let x2: Vec<f64> = (0..n).map(|_| rng.sample(normal)).collect();
    let y: Vec<f64> = x1
        .iter()
        .zip(&x2)
        .map(|(a, b)| 3.0 + 15.0 * a + 5.0 * b + rng.sample(normal))
        .collect();
    let data = DataFrame::new()
        .with_column("x1", x1)?
        .with_column("x2", x2)?
        .with_column("y", y)?;

    let fit = bayesglm(
        ModelInput::formula("y ~ x1 + x2", &data),
        Family::Gaussian,
        &FitConfig::new(1_000, 0),
    )?;
    print!("{fit}");

    let draws = fit.extract(true);
    let beta = &draws["beta"];
    println!("pooled beta draws: {:?}", beta.shape());
    Ok(())
}
