use super::{CancelToken, DualAveraging, ModeEstimate, Target};
use crate::config::FitConfig;
use crate::error::{Error, Result};
use crate::linalg;
use crate::rng::{RngDraw, Variates, chain_rng};
use log::{debug, warn};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

/// Mutable state of one Markov chain.
#[derive(Debug, Clone)]
pub struct ChainState {
    chain: usize,
    beta: Vec<f64>,
    scale: Option<f64>,
    log_post: f64,
    step_size: f64,
    adapter: DualAveraging,
    rng: ChaCha8Rng,
    variates: Variates,
    iteration: usize,
    warmup_accepted: usize,
    accepted: usize,
    nonfinite_retries: usize,
}

/// Per-chain sampler statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainStats {
    pub chain: usize,
    /// Step size frozen at the end of warm-up.
    pub step_size: f64,
    pub warmup_acceptance_rate: f64,
    /// Fraction of accepted proposals after warm-up.
    pub acceptance_rate: f64,
    /// Proposals discarded for a non-finite log-posterior.
    pub nonfinite_retries: usize,
}

/// Everything a finished chain hands back.
#[derive(Debug, Clone)]
pub struct ChainOutput {
    /// Post-warm-up draws; each row holds β followed by σ when the family has one.
    pub draws: Vec<Vec<f64>>,
    pub warmup_draws: Vec<Vec<f64>>,
    pub log_posterior: Vec<f64>,
    pub warmup_log_posterior: Vec<f64>,
    pub stats: ChainStats,
}

impl ChainState {
    /// Start chain `chain` at the mode, displaced by `init_jitter` along the proposal factor.
    pub fn new(
        chain: usize,
        target: &Target<'_>,
        mode: &ModeEstimate,
        config: &FitConfig,
    ) -> Result<Self> {
        let mut rng = chain_rng(config.seed, chain);
        let variates = Variates::new();
        let p = mode.beta.len();

        let z = variates.sample_norm_vec(&mut rng, p);
        let offset = linalg::lower_mul(&mode.proposal_factor, &z);
        let beta: Vec<f64> = mode
            .beta
            .iter()
            .zip(offset.iter())
            .map(|(b, o)| b + config.init_jitter * o)
            .collect();
        let scale = mode.scale;
        let log_post = target.log_posterior(&beta, scale)?;
        if !log_post.is_finite() {
            return Err(Error::NonFiniteLogPosterior {
                chain,
                iteration: 0,
                retries: 0,
            });
        }

        let step_size = 2.38 / (p.max(1) as f64).sqrt();
        Ok(Self {
            chain,
            beta,
            scale,
            log_post,
            step_size,
            adapter: DualAveraging::new(config.target_accept, step_size),
            rng,
            variates,
            iteration: 0,
            warmup_accepted: 0,
            accepted: 0,
            nonfinite_retries: 0,
        })
    }

    pub fn chain(&self) -> usize {
        self.chain
    }

    pub fn beta(&self) -> &[f64] {
        &self.beta
    }

    pub fn scale(&self) -> Option<f64> {
        self.scale
    }

    pub fn log_posterior(&self) -> f64 {
        self.log_post
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Current draw: β followed by σ when present.
    pub fn draw(&self) -> Vec<f64> {
        let mut row = self.beta.clone();
        row.extend(self.scale);
        row
    }

    /// One full iteration: a Metropolis move on β, then a Gibbs refresh of σ.
    ///
    /// Returns whether the β proposal was accepted.
    pub fn transition(
        &mut self,
        target: &Target<'_>,
        mode: &ModeEstimate,
        config: &FitConfig,
        warmup: bool,
    ) -> Result<bool> {
        self.iteration += 1;
        let eps = if warmup {
            self.adapter.current_step_size()
        } else {
            self.step_size
        };

        let mut retries = 0;
        let (proposal, proposal_lp) = loop {
            let z = self.variates.sample_norm_vec(&mut self.rng, self.beta.len());
            let delta = linalg::lower_mul(&mode.proposal_factor, &z);
            let proposal: Vec<f64> = self
                .beta
                .iter()
                .zip(delta.iter())
                .map(|(b, d)| b + eps * d)
                .collect();
            let lp = target.log_posterior(&proposal, self.scale)?;
            if lp.is_finite() {
                break (proposal, lp);
            }
            retries += 1;
            self.nonfinite_retries += 1;
            if retries > config.max_nonfinite_retries {
                return Err(Error::NonFiniteLogPosterior {
                    chain: self.chain,
                    iteration: self.iteration,
                    retries: config.max_nonfinite_retries,
                });
            }
            warn!(
                "chain {} iteration {}: non-finite log-posterior, redraw {retries}/{}",
                self.chain, self.iteration, config.max_nonfinite_retries
            );
        };

        let log_alpha = proposal_lp - self.log_post;
        let u = self.variates.sample_unif(&mut self.rng);
        let accept = log_alpha >= 0.0 || u.ln() < log_alpha;
        if accept {
            self.beta = proposal;
            self.log_post = proposal_lp;
            if warmup {
                self.warmup_accepted += 1;
            } else {
                self.accepted += 1;
            }
        }
        if warmup {
            self.adapter.update(log_alpha.min(0.0).exp());
        }

        self.update_scale(target)?;
        Ok(accept)
    }

    /// Draw σ² from its inverse-gamma full conditional and refresh the cached log-posterior.
    fn update_scale(&mut self, target: &Target<'_>) -> Result<()> {
        let Some((shape, rate)) = target
            .likelihood
            .noise_conditional(&self.beta, target.noise_prior)?
        else {
            return Ok(());
        };
        let g = self.variates.sample_gamma(&mut self.rng, shape)?;
        let sigma = (rate / g).sqrt();
        let lp = target.log_posterior(&self.beta, Some(sigma))?;
        if !lp.is_finite() {
            return Err(Error::NonFiniteLogPosterior {
                chain: self.chain,
                iteration: self.iteration,
                retries: 0,
            });
        }
        self.scale = Some(sigma);
        self.log_post = lp;
        Ok(())
    }

    /// Freeze the adapted step size for the sampling phase.
    pub fn end_warmup(&mut self) {
        if self.adapter.steps() > 0 {
            self.step_size = self.adapter.adapted_step_size();
        }
    }
}

/// Run one chain to completion.
pub(crate) fn run_chain(
    chain: usize,
    target: &Target<'_>,
    mode: &ModeEstimate,
    config: &FitConfig,
    cancel: Option<&CancelToken>,
) -> Result<ChainOutput> {
    let n_warmup = config.warmup_iterations();
    let n_sampling = config.sampling_iterations();
    let mut state = ChainState::new(chain, target, mode, config)?;
    let cancelled = || cancel.is_some_and(|c| c.is_cancelled());

    let mut warmup_draws = Vec::with_capacity(n_warmup);
    let mut warmup_log_posterior = Vec::with_capacity(n_warmup);
    for _ in 0..n_warmup {
        if cancelled() {
            return Err(Error::Cancelled { completed: 0 });
        }
        state.transition(target, mode, config, true)?;
        warmup_draws.push(state.draw());
        warmup_log_posterior.push(state.log_post);
    }
    state.end_warmup();
    debug!(
        "chain {chain}: warm-up done, step size {:.4}, acceptance {}/{n_warmup}",
        state.step_size, state.warmup_accepted
    );

    let mut draws = Vec::with_capacity(n_sampling);
    let mut log_posterior = Vec::with_capacity(n_sampling);
    for _ in 0..n_sampling {
        if cancelled() {
            return Err(Error::Cancelled { completed: 0 });
        }
        state.transition(target, mode, config, false)?;
        draws.push(state.draw());
        log_posterior.push(state.log_post);
    }

    let rate = |accepted: usize, total: usize| {
        if total == 0 { 0.0 } else { accepted as f64 / total as f64 }
    };
    let stats = ChainStats {
        chain,
        step_size: state.step_size,
        warmup_acceptance_rate: rate(state.warmup_accepted, n_warmup),
        acceptance_rate: rate(state.accepted, n_sampling),
        nonfinite_retries: state.nonfinite_retries,
    };
    debug!(
        "chain {chain}: finished, acceptance {:.3}",
        stats.acceptance_rate
    );

    Ok(ChainOutput {
        draws,
        warmup_draws,
        log_posterior,
        warmup_log_posterior,
        stats,
    })
}
