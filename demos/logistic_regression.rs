//! Bayesian logistic regression on simulated data.
//!
//! The example:
//! 1. Generates synthetic data from a logistic regression model
//! 2. Fits the model with four random-walk Metropolis chains
//! 3. Prints the posterior summary with R-hat and bulk ESS per coefficient
//! 4. Compares the posterior means to the true parameter values

use bayesglm::{Family, FitConfig, ModelInput, PriorSpec, bayesglm};
use ndarray::Array2;
use rand::{Rng, SeedableRng};
use statrs::distribution::Normal;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let n = 10_000;
    let p = 3;
    let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(42);
    let x = Array2::from_shape_fn((n, p), |_| rng.sample(Normal::standard()));
    let true_beta = ndarray::array![0.5, -1.0, 2.0];
    let probs = x.dot(&true_beta).mapv(|z| 1.0 / (1.0 + (-z).exp()));
    let y = probs.mapv(|p| if rng.gen_bool(p) { 1.0 } else { 0.0 });

    let config = FitConfig::new(2_000, 42)
        .with_chains(4)
        .with_prior(PriorSpec::Normal { mean: 0.0, scale: 10.0 });
    let fit = bayesglm(ModelInput::matrix(x, y), Family::Bernoulli, &config)?;

    println!("{}", fit.summary());
    println!("true vs posterior mean:");
    for ((name, truth), mean) in fit
        .param_names()
        .iter()
        .zip(true_beta.iter())
        .zip(fit.posterior_means())
    {
        println!("  {name:<8} {truth:>8.3} {mean:>8.3}");
    }
    Ok(())
}
