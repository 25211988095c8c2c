//! Bayesian logistic regression likelihood.
//!
//! # Model
//! The model is specified as:
//! - Likelihood: \( y_i \mid \beta \sim \mathrm{Bernoulli}(\sigma(x_i^\top \beta)) \),
//!   where \( \sigma \) is the logistic function
//! - Prior: supplied separately by [`crate::prior::PriorSpec`]
//!
//! The log-likelihood is evaluated as \( \sum_i y_i \eta_i - \log(1 + e^{\eta_i}) \) with a
//! softplus that stays finite for any finite \( \eta \), so strongly separated data never
//! produce `-inf` from rounding `p` to 0 or 1.

use super::{Family, Likelihood};
use crate::error::Result;
use crate::linalg;
use crate::prior::NoisePrior;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

/// Bernoulli likelihood with logit link, borrowing its data.
///
/// # Example
/// ```rust
/// # use ndarray::array;
/// use bayesglm::regression::{Family, Likelihood, LogitLikelihood};
///
/// let x = array![[1.0, 1.0], [1.0, 2.0], [1.0, 3.0]];  // Include intercept
/// let y = array![0.0, 0.0, 1.0];                       // Binary responses
/// let lik = LogitLikelihood::new(x.view(), y.view());
/// assert_eq!(lik.family(), Family::Bernoulli);
/// let ll = lik.log_likelihood(&[0.0, 0.0], None).unwrap();
/// assert!((ll - 3.0 * 0.5f64.ln()).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct LogitLikelihood<'a> {
    /// Design matrix (n_observations × n_predictors)
    x: ArrayView2<'a, f64>,
    /// Binary response vector (n_observations,)
    y: ArrayView1<'a, f64>,
}

impl<'a> LogitLikelihood<'a> {
    /// Bind to `x` and `y`. Shapes and the 0/1 support are checked by [`Family::bind`].
    pub fn new(x: ArrayView2<'a, f64>, y: ArrayView1<'a, f64>) -> Self {
        Self { x, y }
    }

    /// Success probabilities `sigmoid(Xβ)`.
    pub fn probabilities(&self, beta: &[f64]) -> Result<Array1<f64>> {
        Ok(linalg::linear_predictor(self.x, beta)?.mapv(sigmoid))
    }
}

/// Logistic function, split on sign so `exp` never overflows.
pub(crate) fn sigmoid(eta: f64) -> f64 {
    if eta >= 0.0 {
        1.0 / (1.0 + (-eta).exp())
    } else {
        let e = eta.exp();
        e / (1.0 + e)
    }
}

/// `log(1 + exp(eta))`
fn softplus(eta: f64) -> f64 {
    eta.max(0.0) + (-eta.abs()).exp().ln_1p()
}

impl Likelihood for LogitLikelihood<'_> {
    fn family(&self) -> Family {
        Family::Bernoulli
    }

    fn design(&self) -> ArrayView2<'_, f64> {
        self.x.view()
    }

    fn log_likelihood(&self, beta: &[f64], _scale: Option<f64>) -> Result<f64> {
        let eta = linalg::linear_predictor(self.x, beta)?;
        Ok(self
            .y
            .iter()
            .zip(eta.iter())
            .map(|(&yi, &ei)| yi * ei - softplus(ei))
            .sum())
    }

    fn gradient(&self, beta: &[f64], _scale: Option<f64>) -> Result<Vec<f64>> {
        let p = self.probabilities(beta)?;
        let resid = &self.y - &p;
        Ok(linalg::transpose_mul(self.x, resid.view()).to_vec())
    }

    fn information(&self, beta: &[f64], _scale: Option<f64>) -> Result<Array2<f64>> {
        let w = self.probabilities(beta)?.mapv(|p| p * (1.0 - p));
        Ok(linalg::weighted_cross_product(self.x, w.view()))
    }

    fn scale_estimate(&self, beta: &[f64]) -> Result<Option<f64>> {
        linalg::linear_predictor(self.x, beta)?;
        Ok(None)
    }

    fn noise_conditional(&self, _beta: &[f64], _prior: &NoisePrior) -> Result<Option<(f64, f64)>> {
        Ok(None)
    }
}
