//! Posterior draws and their summaries.

use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use crate::regression::Family;
use crate::rng::chain_rng;
use crate::sampler::{ChainOutput, ChainStats, ModeEstimate};
use crate::template::render_model;
use ndarray::{Array1, Array2, Array3, ArrayD, Axis};
use rand::seq::SliceRandom;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Index;

/// Key of the coefficient block in [`PooledDraws`].
pub const BETA: &str = "beta";
/// Key of the noise scale in [`PooledDraws`] (Gaussian family only).
pub const SIGMA: &str = "sigma";
/// Key of the log-posterior trace in [`PooledDraws`].
pub const LOG_POSTERIOR: &str = "lp__";

/// Draws of every chain merged into one table keyed by parameter group.
///
/// Rows are aligned across keys: row `r` of `"beta"`, `"sigma"` and `"lp__"` belong
/// to the same draw.
#[derive(Debug, Clone, PartialEq)]
pub struct PooledDraws {
    groups: BTreeMap<String, ArrayD<f64>>,
}

impl PooledDraws {
    pub fn get(&self, key: &str) -> Option<&ArrayD<f64>> {
        self.groups.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Number of pooled draws.
    pub fn len(&self) -> usize {
        self.groups
            .get(LOG_POSTERIOR)
            .map_or(0, |lp| lp.len_of(Axis(0)))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Index<&str> for PooledDraws {
    type Output = ArrayD<f64>;

    fn index(&self, key: &str) -> &Self::Output {
        match self.groups.get(key) {
            Some(a) => a,
            None => panic!("no parameter group named '{key}'"),
        }
    }
}

/// Output of [`PosteriorResult::extract`].
#[derive(Debug, Clone, PartialEq)]
pub enum Extracted {
    /// Chains pooled and shuffled.
    Pooled(PooledDraws),
    /// `(chain, iteration, parameter)` array of post-warm-up draws.
    Raw(Array3<f64>),
}

impl Extracted {
    pub fn pooled(self) -> Option<PooledDraws> {
        match self {
            Extracted::Pooled(p) => Some(p),
            Extracted::Raw(_) => None,
        }
    }

    pub fn raw(self) -> Option<Array3<f64>> {
        match self {
            Extracted::Raw(a) => Some(a),
            Extracted::Pooled(_) => None,
        }
    }
}

impl Index<&str> for Extracted {
    type Output = ArrayD<f64>;

    fn index(&self, key: &str) -> &Self::Output {
        match self {
            Extracted::Pooled(p) => &p[key],
            Extracted::Raw(_) => panic!("raw draws are not keyed; extract with permuted = true"),
        }
    }
}

/// Posterior draws of a fitted model.
#[derive(Debug, Clone)]
pub struct PosteriorResult {
    family: Family,
    param_names: Vec<String>,
    n_coefficients: usize,
    samples: Array3<f64>,
    warmup: Array3<f64>,
    log_posterior: Array2<f64>,
    warmup_log_posterior: Array2<f64>,
    chain_stats: Vec<ChainStats>,
    mode: ModeEstimate,
    seed: u64,
}

fn stack_draws(rows: Vec<&Vec<Vec<f64>>>, n_params: usize) -> Result<Array3<f64>> {
    let n_chains = rows.len();
    let n_iter = rows.first().map_or(0, |r| r.len());
    let flat: Vec<f64> = rows
        .iter()
        .flat_map(|chain| chain.iter().flatten().copied())
        .collect();
    let found = flat.len();
    Array3::from_shape_vec((n_chains, n_iter, n_params), flat).map_err(|_| {
        Error::DimensionMismatch {
            what: "draws per chain",
            expected: n_chains * n_iter * n_params,
            found,
        }
    })
}

fn stack_traces(rows: Vec<&Vec<f64>>) -> Result<Array2<f64>> {
    let n_chains = rows.len();
    let n_iter = rows.first().map_or(0, |r| r.len());
    let flat: Vec<f64> = rows.iter().flat_map(|r| r.iter().copied()).collect();
    let found = flat.len();
    Array2::from_shape_vec((n_chains, n_iter), flat).map_err(|_| Error::DimensionMismatch {
        what: "log-posterior trace length",
        expected: n_chains * n_iter,
        found,
    })
}

impl PosteriorResult {
    /// Assemble from finished chains, given in chain order.
    pub(crate) fn from_chains(
        family: Family,
        coefficient_names: Vec<String>,
        chains: Vec<ChainOutput>,
        mode: ModeEstimate,
        seed: u64,
    ) -> Result<Self> {
        let n_coefficients = coefficient_names.len();
        let mut param_names = coefficient_names;
        if family.has_noise_scale() {
            param_names.push(SIGMA.to_string());
        }
        let n_params = param_names.len();

        let samples = stack_draws(chains.iter().map(|c| &c.draws).collect(), n_params)?;
        let warmup = stack_draws(chains.iter().map(|c| &c.warmup_draws).collect(), n_params)?;
        let log_posterior = stack_traces(chains.iter().map(|c| &c.log_posterior).collect())?;
        let warmup_log_posterior =
            stack_traces(chains.iter().map(|c| &c.warmup_log_posterior).collect())?;
        let chain_stats = chains.into_iter().map(|c| c.stats).collect();

        Ok(Self {
            family,
            param_names,
            n_coefficients,
            samples,
            warmup,
            log_posterior,
            warmup_log_posterior,
            chain_stats,
            mode,
            seed,
        })
    }

    pub fn family(&self) -> Family {
        self.family
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Coefficient names, followed by `sigma` for the Gaussian family.
    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    pub fn n_coefficients(&self) -> usize {
        self.n_coefficients
    }

    pub fn n_chains(&self) -> usize {
        self.samples.len_of(Axis(0))
    }

    /// Post-warm-up draws per chain.
    pub fn n_draws(&self) -> usize {
        self.samples.len_of(Axis(1))
    }

    /// Warm-up iterations per chain.
    pub fn n_warmup(&self) -> usize {
        self.warmup.len_of(Axis(1))
    }

    /// Extract the draws.
    ///
    /// With `permuted`, every post-warm-up draw of every chain is pooled and shuffled
    /// with a permutation seeded from the fit seed, and returned keyed by parameter
    /// group ([`BETA`], [`SIGMA`], [`LOG_POSTERIOR`]). Otherwise the raw
    /// `(chain, iteration, parameter)` array is returned.
    pub fn extract(&self, permuted: bool) -> Extracted {
        if !permuted {
            return Extracted::Raw(self.samples.clone());
        }
        let (n_chains, n_draws, _) = self.samples.dim();
        let total = n_chains * n_draws;
        let mut order: Vec<usize> = (0..total).collect();
        order.shuffle(&mut chain_rng(self.seed, n_chains));

        let source = |row: usize| (row / n_draws.max(1), row % n_draws.max(1));
        let beta = Array2::from_shape_fn((total, self.n_coefficients), |(r, k)| {
            let (c, i) = source(order[r]);
            self.samples[(c, i, k)]
        });
        let lp = Array1::from_shape_fn(total, |r| {
            let (c, i) = source(order[r]);
            self.log_posterior[(c, i)]
        });

        let mut groups = BTreeMap::new();
        groups.insert(BETA.to_string(), beta.into_dyn());
        if self.family.has_noise_scale() {
            let k = self.n_coefficients;
            let sigma = Array1::from_shape_fn(total, |r| {
                let (c, i) = source(order[r]);
                self.samples[(c, i, k)]
            });
            groups.insert(SIGMA.to_string(), sigma.into_dyn());
        }
        groups.insert(LOG_POSTERIOR.to_string(), lp.into_dyn());
        Extracted::Pooled(PooledDraws { groups })
    }

    /// Per-chain draws, optionally with the warm-up iterations prepended.
    pub fn raw(&self, include_warmup: bool) -> Array3<f64> {
        if !include_warmup {
            return self.samples.clone();
        }
        let (n_chains, n_draws, n_params) = self.samples.dim();
        let n_warmup = self.n_warmup();
        Array3::from_shape_fn((n_chains, n_warmup + n_draws, n_params), |(c, i, k)| {
            if i < n_warmup {
                self.warmup[(c, i, k)]
            } else {
                self.samples[(c, i - n_warmup, k)]
            }
        })
    }

    /// Warm-up draws, `(chain, iteration, parameter)`.
    pub fn warmup_draws(&self) -> &Array3<f64> {
        &self.warmup
    }

    /// Post-warm-up log-posterior, `(chain, iteration)`.
    pub fn log_posterior(&self) -> &Array2<f64> {
        &self.log_posterior
    }

    pub fn warmup_log_posterior(&self) -> &Array2<f64> {
        &self.warmup_log_posterior
    }

    /// Post-warm-up draws of parameter `idx`, chain-major.
    pub fn param_draws(&self, idx: usize) -> Option<Vec<f64>> {
        (idx < self.param_names.len())
            .then(|| self.samples.index_axis(Axis(2), idx).iter().copied().collect())
    }

    /// Pooled posterior mean of every parameter.
    pub fn posterior_means(&self) -> Vec<f64> {
        (0..self.param_names.len())
            .map(|k| {
                let draws = self.samples.index_axis(Axis(2), k);
                draws.sum() / draws.len().max(1) as f64
            })
            .collect()
    }

    /// Pooled posterior standard deviation of every parameter.
    pub fn posterior_sds(&self) -> Vec<f64> {
        self.posterior_means()
            .into_iter()
            .enumerate()
            .map(|(k, mean)| {
                let draws = self.samples.index_axis(Axis(2), k);
                let n = draws.len();
                if n < 2 {
                    return 0.0;
                }
                let ss: f64 = draws.iter().map(|d| (d - mean).powi(2)).sum();
                (ss / (n - 1) as f64).sqrt()
            })
            .collect()
    }

    /// Monte Carlo standard error of each posterior mean, `sd / sqrt(ess_bulk)`.
    pub fn mcse(&self) -> Vec<f64> {
        let ess = self.diagnostics().ess_bulk;
        self.posterior_sds()
            .into_iter()
            .zip(ess)
            .map(|(sd, ess)| if ess > 0.0 { sd / ess.sqrt() } else { f64::NAN })
            .collect()
    }

    /// Posterior mode the chains started from, with its Laplace covariance.
    pub fn mode(&self) -> &ModeEstimate {
        &self.mode
    }

    /// Post-warm-up acceptance rate pooled over chains.
    pub fn acceptance_rate(&self) -> f64 {
        if self.chain_stats.is_empty() {
            return 0.0;
        }
        self.chain_stats.iter().map(|s| s.acceptance_rate).sum::<f64>()
            / self.chain_stats.len() as f64
    }

    pub fn chain_stats(&self) -> &[ChainStats] {
        &self.chain_stats
    }

    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics::from_draws(&self.samples)
    }

    /// Model description followed by a per-parameter summary table.
    pub fn summary(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PosteriorResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", render_model(self.family, self.n_coefficients))?;
        writeln!(
            f,
            "{} family ({} link): {} chain(s), {} warm-up + {} draws each, acceptance {:.3}",
            self.family,
            self.family.link(),
            self.n_chains(),
            self.n_warmup(),
            self.n_draws(),
            self.acceptance_rate()
        )?;
        writeln!(
            f,
            "{:<16} {:>12} {:>12} {:>8} {:>10}",
            "parameter", "mean", "sd", "r_hat", "ess_bulk"
        )?;
        let diag = self.diagnostics();
        let means = self.posterior_means();
        let sds = self.posterior_sds();
        for (k, name) in self.param_names.iter().enumerate() {
            writeln!(
                f,
                "{:<16} {:>12.4} {:>12.4} {:>8.3} {:>10.1}",
                name, means[k], sds[k], diag.r_hat[k], diag.ess_bulk[k]
            )?;
        }
        Ok(())
    }
}
