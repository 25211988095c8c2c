//! Multi-chain random-walk Metropolis sampler for GLM posteriors.
//!
//! Each chain starts near the posterior mode, proposes coefficient moves shaped by the
//! Laplace covariance, and (for families with a noise scale) refreshes σ² from its
//! inverse-gamma full conditional after every coefficient update. Chains share only
//! read-only data, so they run as independent rayon tasks when the `rayon` feature is
//! enabled and sequentially otherwise, with identical results either way.

pub use adapt::DualAveraging;
pub use chain::{ChainOutput, ChainState, ChainStats};
pub use init::{ModeEstimate, find_mode};

use crate::config::FitConfig;
use crate::error::{Error, Result};
use crate::prior::{NoisePrior, PriorSpec};
use crate::regression::Likelihood;
use log::info;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

mod adapt;
mod chain;
mod init;

/// Unnormalized log-posterior: likelihood plus coefficient prior plus noise prior.
#[derive(Clone, Copy)]
pub struct Target<'a> {
    pub likelihood: &'a dyn Likelihood,
    pub prior: &'a PriorSpec,
    pub noise_prior: &'a NoisePrior,
}

impl<'a> Target<'a> {
    pub fn new(
        likelihood: &'a dyn Likelihood,
        prior: &'a PriorSpec,
        noise_prior: &'a NoisePrior,
    ) -> Self {
        Self {
            likelihood,
            prior,
            noise_prior,
        }
    }

    /// Log-posterior at `(beta, scale)` up to a constant.
    pub fn log_posterior(&self, beta: &[f64], scale: Option<f64>) -> Result<f64> {
        let mut lp = self.likelihood.log_likelihood(beta, scale)? + self.prior.log_prior(beta);
        if let Some(sigma) = scale {
            lp += self.noise_prior.log_density(sigma * sigma);
        }
        Ok(lp)
    }
}

/// Cooperative cancellation flag shared between a caller and a running fit.
///
/// Chains check the flag before they start and between iterations; a chain that sees
/// it set stops and its partial state is dropped.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Output of a complete multi-chain run.
#[derive(Debug, Clone)]
pub struct SamplerRun {
    /// Per-chain output in chain index order.
    pub chains: Vec<ChainOutput>,
    /// The mode and proposal geometry every chain started from.
    pub mode: ModeEstimate,
}

/// Run `config.chains` chains against `target`.
pub fn run(
    target: &Target<'_>,
    config: &FitConfig,
    cancel: Option<&CancelToken>,
) -> Result<SamplerRun> {
    let mode = find_mode(target, config.newton_max_iterations)?;
    info!(
        "sampling {} chain(s) x {} iterations ({} warm-up), {} coefficient(s)",
        config.chains,
        config.iterations,
        config.warmup_iterations(),
        mode.beta.len()
    );

    let run_one = |chain_id: usize| -> Result<ChainOutput> {
        if cancel.is_some_and(|c| c.is_cancelled()) {
            return Err(Error::Cancelled { completed: 0 });
        }
        chain::run_chain(chain_id, target, &mode, config, cancel)
    };

    #[cfg(feature = "rayon")]
    let results: Vec<Result<ChainOutput>> =
        (0..config.chains).into_par_iter().map(run_one).collect();

    #[cfg(not(feature = "rayon"))]
    let results: Vec<Result<ChainOutput>> = (0..config.chains).map(run_one).collect();

    let completed = results.iter().filter(|r| r.is_ok()).count();
    let mut chains = Vec::with_capacity(results.len());
    for result in results {
        match result {
            Ok(output) => chains.push(output),
            Err(Error::Cancelled { .. }) => return Err(Error::Cancelled { completed }),
            Err(e) => return Err(e),
        }
    }
    Ok(SamplerRun { chains, mode })
}
