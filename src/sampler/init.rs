//! Posterior mode search and proposal preconditioning.
//!
//! Chains start near the posterior mode and propose along the Laplace covariance
//! `(I(β̂) + Λ)⁻¹`, where `I` is the likelihood information at the mode and `Λ` the prior
//! precision. The mode is found with damped Newton–Raphson; for the Gaussian family the
//! noise scale is re-estimated from the residuals after every step.

use super::Target;
use crate::error::{Error, Result};
use crate::linalg;
use log::{debug, warn};
use ndarray::{Array1, Array2};

const MAX_HALVINGS: usize = 30;
const TOLERANCE: f64 = 1e-8;

/// Posterior mode and the proposal geometry derived from it.
#[derive(Debug, Clone)]
pub struct ModeEstimate {
    /// Coefficients at the mode.
    pub beta: Vec<f64>,
    /// Noise scale at the mode, for families that have one.
    pub scale: Option<f64>,
    /// Laplace approximation of the posterior covariance of β.
    pub covariance: Array2<f64>,
    /// Lower Cholesky factor of `covariance`, used to shape proposals.
    pub proposal_factor: Array2<f64>,
    /// Newton iterations used.
    pub iterations: usize,
    /// Whether the step size fell below tolerance within the iteration budget.
    pub converged: bool,
}

fn posterior_precision(
    target: &Target<'_>,
    beta: &[f64],
    scale: Option<f64>,
) -> Result<Array2<f64>> {
    let mut h = target.likelihood.information(beta, scale)?;
    for (j, (_, prec)) in target.prior.mean_precision(beta.len()).into_iter().enumerate() {
        h[(j, j)] += prec;
    }
    Ok(h)
}

fn posterior_gradient(
    target: &Target<'_>,
    beta: &[f64],
    scale: Option<f64>,
) -> Result<Array1<f64>> {
    let lik = target.likelihood.gradient(beta, scale)?;
    let prior = target.prior.gradient(beta);
    Ok(prior.iter().zip(lik.iter()).map(|(p, l)| p + l).collect())
}

/// Locate the posterior mode and build the proposal factor.
pub fn find_mode(target: &Target<'_>, max_iterations: usize) -> Result<ModeEstimate> {
    let p = target.likelihood.n_coefficients();
    let mut beta = vec![0.0; p];
    let mut scale = target.likelihood.family().has_noise_scale().then_some(1.0);
    let mut converged = false;
    let mut iterations = 0;

    while iterations < max_iterations {
        iterations += 1;
        let current = target.log_posterior(&beta, scale)?;
        let grad = posterior_gradient(target, &beta, scale)?;
        let precision = posterior_precision(target, &beta, scale)?;
        let direction = linalg::solve_spd(&precision, grad.view())?;

        // Step halving keeps the iteration monotone when the quadratic model overshoots.
        let mut t = 1.0;
        let mut next = beta.clone();
        for _ in 0..MAX_HALVINGS {
            next = beta
                .iter()
                .zip(direction.iter())
                .map(|(b, d)| b + t * d)
                .collect();
            let lp = target.log_posterior(&next, scale)?;
            if lp.is_finite() && lp >= current - 1e-10 * current.abs().max(1.0) {
                break;
            }
            t *= 0.5;
        }

        let step = beta
            .iter()
            .zip(next.iter())
            .map(|(a, b)| (a - b).abs() / (1.0 + a.abs()))
            .fold(0.0, f64::max);
        beta = next;
        scale = target.likelihood.scale_estimate(&beta)?.or(scale);
        if step < TOLERANCE {
            converged = true;
            break;
        }
    }

    if !converged {
        warn!(
            "posterior mode search stopped after {iterations} Newton iterations without converging"
        );
    }
    if beta.iter().any(|b| !b.is_finite()) {
        return Err(Error::Linalg(
            "posterior mode search produced non-finite coefficients".to_string(),
        ));
    }

    let precision = posterior_precision(target, &beta, scale)?;
    let covariance = linalg::inverse_spd(&precision)?;
    let proposal_factor = linalg::cholesky_lower(&covariance)?;
    debug!("posterior mode {beta:?} (scale {scale:?}) after {iterations} iterations");

    Ok(ModeEstimate {
        beta,
        scale,
        covariance,
        proposal_factor,
        iterations,
        converged,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prior::{NoisePrior, PriorSpec};
    use crate::regression::Family;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn gaussian_mode_is_least_squares() {
        let x = array![[1.0, 0.0], [1.0, 1.0], [1.0, 2.0], [1.0, 3.0]];
        let y = array![1.1, 2.9, 5.2, 6.8];
        let lik = Family::Gaussian.bind(x.view(), y.view()).unwrap();
        let prior = PriorSpec::Flat;
        let noise = NoisePrior::default();
        let target = Target::new(lik.as_ref(), &prior, &noise);
        let mode = find_mode(&target, 50).unwrap();
        assert!(mode.converged);
        // Ordinary least squares: slope 1.94, intercept 1.09
        assert_abs_diff_eq!(mode.beta[0], 1.09, epsilon = 1e-8);
        assert_abs_diff_eq!(mode.beta[1], 1.94, epsilon = 1e-8);
        let ssr: f64 = [1.09 - 1.1, 3.03 - 2.9, 4.97 - 5.2, 6.91 - 6.8]
            .iter()
            .map(|r: &f64| r * r)
            .sum();
        assert_abs_diff_eq!(mode.scale.unwrap(), (ssr / 4.0).sqrt(), epsilon = 1e-8);
    }

    #[test]
    fn logit_mode_zeroes_the_score() {
        let x = array![[1.0, -2.0], [1.0, -1.0], [1.0, 0.0], [1.0, 1.0], [1.0, 2.0], [1.0, 0.5]];
        let y = array![0.0, 1.0, 0.0, 1.0, 1.0, 0.0];
        let lik = Family::Bernoulli.bind(x.view(), y.view()).unwrap();
        let prior = PriorSpec::default();
        let noise = NoisePrior::default();
        let target = Target::new(lik.as_ref(), &prior, &noise);
        let mode = find_mode(&target, 50).unwrap();
        assert!(mode.converged);
        assert!(mode.scale.is_none());
        let grad = posterior_gradient(&target, &mode.beta, None).unwrap();
        for g in grad.iter() {
            assert_abs_diff_eq!(*g, 0.0, epsilon = 1e-6);
        }
        let l = &mode.proposal_factor;
        let rebuilt = l.dot(&l.t());
        for (a, b) in rebuilt.iter().zip(mode.covariance.iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-10);
        }
    }
}
