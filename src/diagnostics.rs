//! Convergence diagnostics: split R-hat and bulk effective sample size.

use ndarray::{Array3, Axis};
use serde::Serialize;

/// Per-parameter convergence diagnostics of a multi-chain run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostics {
    /// Split R-hat per parameter (`NaN` when chains are too short).
    pub r_hat: Vec<f64>,
    /// Bulk ESS per parameter.
    pub ess_bulk: Vec<f64>,
}

impl Diagnostics {
    /// Diagnostics for every parameter of a `(chain, iteration, parameter)` array.
    pub fn from_draws(draws: &Array3<f64>) -> Self {
        let n_params = draws.len_of(Axis(2));
        let mut r_hat_out = Vec::with_capacity(n_params);
        let mut ess_out = Vec::with_capacity(n_params);
        for k in 0..n_params {
            let traces: Vec<Vec<f64>> = draws
                .index_axis(Axis(2), k)
                .outer_iter()
                .map(|chain| chain.to_vec())
                .collect();
            let refs: Vec<&[f64]> = traces.iter().map(Vec::as_slice).collect();
            r_hat_out.push(r_hat(&refs));
            ess_out.push(ess_bulk(&refs));
        }
        Self {
            r_hat: r_hat_out,
            ess_bulk: ess_out,
        }
    }

    /// Largest finite R-hat, if any.
    pub fn max_r_hat(&self) -> Option<f64> {
        self.r_hat
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .reduce(f64::max)
    }
}

fn split_halves<'a>(chains: &[&'a [f64]], min_len: usize) -> Option<Vec<&'a [f64]>> {
    if chains.is_empty() {
        return None;
    }
    let mut halves = Vec::with_capacity(chains.len() * 2);
    for c in chains {
        if c.len() < 4 {
            return None;
        }
        let mid = c.len() / 2;
        halves.push(&c[..mid]);
        halves.push(&c[mid..]);
    }
    let len = halves.iter().map(|c| c.len()).min().unwrap_or(0);
    if len < min_len {
        return None;
    }
    Some(halves.into_iter().map(|c| &c[..len]).collect())
}

fn mean_and_var(chain: &[f64]) -> (f64, f64) {
    let n = chain.len() as f64;
    let mean = chain.iter().sum::<f64>() / n;
    let var = chain.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / (n.max(2.0) - 1.0);
    (mean, var)
}

/// Between-chain variance `B` and mean within-chain variance `W` over equal-length chains.
fn between_within(chains: &[&[f64]]) -> (f64, f64) {
    let m = chains.len() as f64;
    let n = chains[0].len() as f64;
    let stats: Vec<(f64, f64)> = chains.iter().map(|c| mean_and_var(c)).collect();
    let grand = stats.iter().map(|(mu, _)| mu).sum::<f64>() / m;
    let b = stats.iter().map(|(mu, _)| (mu - grand).powi(2)).sum::<f64>() * n / (m - 1.0);
    let w = stats.iter().map(|(_, v)| v).sum::<f64>() / m;
    (b, w)
}

/// Split R-hat for one parameter across chains.
///
/// Each chain is split in half, giving `2M` half-chains of equal length `N`, and
/// `R̂ = sqrt(var⁺ / W)` with `var⁺ = (N-1)/N · W + B/N`.
pub fn r_hat(chains: &[&[f64]]) -> f64 {
    let Some(halves) = split_halves(chains, 2) else {
        return f64::NAN;
    };
    let n = halves[0].len() as f64;
    let (b, w) = between_within(&halves);
    if w < 1e-30 {
        return f64::NAN;
    }
    let var_hat_plus = (n - 1.0) / n * w + b / n;
    (var_hat_plus / w).sqrt()
}

/// Bulk ESS from variogram autocorrelations and Geyer's initial monotone sequence.
pub fn ess_bulk(chains: &[&[f64]]) -> f64 {
    let Some(split) = split_halves(chains, 4) else {
        return 0.0;
    };
    let m = split.len();
    let n = split[0].len();
    let total_draws = (m * n) as f64;

    let (b, w) = between_within(&split);
    let n_f = n as f64;
    let var_hat_plus = (n_f - 1.0) / n_f * w + b / n_f;
    if !var_hat_plus.is_finite() || var_hat_plus < 1e-30 {
        return total_draws;
    }

    // rho_t = 1 - V_t / (2 var⁺), V_t the mean squared lag-t difference.
    let mut rho: Vec<f64> = Vec::new();
    for lag in 1..n {
        let mut sum = 0.0;
        let mut count = 0usize;
        for c in &split {
            for i in 0..(n - lag) {
                let d = c[i] - c[i + lag];
                sum += d * d;
                count += 1;
            }
        }
        rho.push((1.0 - sum / count as f64 / (2.0 * var_hat_plus)).clamp(-1.0, 1.0));
        let k = rho.len();
        if k % 2 == 0 && rho[k - 2] + rho[k - 1] < 0.0 {
            break;
        }
    }

    let mut gammas: Vec<f64> = rho
        .chunks_exact(2)
        .map(|pair| pair[0] + pair[1])
        .take_while(|&g| g >= 0.0)
        .collect();
    for k in 1..gammas.len() {
        if gammas[k] > gammas[k - 1] {
            gammas[k] = gammas[k - 1];
        }
    }

    let tau = 1.0 + 2.0 * gammas.iter().sum::<f64>();
    if !tau.is_finite() || tau <= 0.0 {
        return total_draws;
    }
    (total_draws / tau).clamp(1.0, total_draws)
}
