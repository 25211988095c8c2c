//! Likelihood families for Bayesian generalized linear models.
//!
//! A [`Family`] selects the link function and observation model. Binding a family to a
//! design matrix and response produces a [`Likelihood`], which the sampler evaluates at
//! every proposal. Bound likelihoods borrow the data, so one binding is shared read-only
//! by every chain.
//!
//! # Available Families
//! - [`Family::Gaussian`]: identity link, normal errors with unknown scale σ
//!   ([`GaussianLikelihood`])
//! - [`Family::Bernoulli`]: logit link, binary 0/1 response ([`LogitLikelihood`])

pub use gaussian::GaussianLikelihood;
pub use logit::LogitLikelihood;

use crate::error::{Error, Result};
use crate::prior::NoisePrior;
use ndarray::{Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

mod gaussian;
mod logit;

/// Observation model and link function of a GLM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    /// Identity link, `y ~ N(Xβ, σ²)` with σ sampled alongside β.
    Gaussian,
    /// Logit link, `y ~ Bernoulli(sigmoid(Xβ))`.
    Bernoulli,
}

impl Family {
    /// Gaussian family (identity link, unknown noise scale).
    pub fn gaussian() -> Self {
        Family::Gaussian
    }

    /// Bernoulli family (logit link).
    pub fn bernoulli() -> Self {
        Family::Bernoulli
    }

    /// Whether the family carries a noise scale that is sampled with the coefficients.
    pub fn has_noise_scale(&self) -> bool {
        matches!(self, Family::Gaussian)
    }

    /// Name of the link function.
    pub fn link(&self) -> &'static str {
        match self {
            Family::Gaussian => "identity",
            Family::Bernoulli => "logit",
        }
    }

    /// Check that `y` lies in the family's support.
    pub fn validate_response(&self, y: ArrayView1<'_, f64>) -> Result<()> {
        if let Some(i) = y.iter().position(|v| !v.is_finite()) {
            return Err(Error::InvalidFamilyInput {
                family: self.to_string(),
                reason: format!("response value at row {i} is not finite"),
            });
        }
        if let Family::Bernoulli = self {
            if let Some((i, v)) = y
                .iter()
                .enumerate()
                .find(|&(_, &v)| v != 0.0 && v != 1.0)
            {
                return Err(Error::InvalidFamilyInput {
                    family: self.to_string(),
                    reason: format!("response must be 0 or 1, found {v} at row {i}"),
                });
            }
        }
        Ok(())
    }

    /// Bind the family to a design matrix and response.
    ///
    /// Fails with [`Error::DimensionMismatch`] when the row count of `x` differs from the
    /// length of `y`, and with [`Error::InvalidFamilyInput`] when `y` is outside the
    /// family's support.
    pub fn bind<'a>(
        &self,
        x: ArrayView2<'a, f64>,
        y: ArrayView1<'a, f64>,
    ) -> Result<Box<dyn Likelihood + 'a>> {
        if x.nrows() != y.len() {
            return Err(Error::DimensionMismatch {
                what: "response length vs design matrix rows",
                expected: x.nrows(),
                found: y.len(),
            });
        }
        self.validate_response(y)?;
        Ok(match self {
            Family::Gaussian => Box::new(GaussianLikelihood::new(x, y)),
            Family::Bernoulli => Box::new(LogitLikelihood::new(x, y)),
        })
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Family::Gaussian => write!(f, "gaussian"),
            Family::Bernoulli => write!(f, "bernoulli"),
        }
    }
}

impl FromStr for Family {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gaussian" | "normal" => Ok(Family::Gaussian),
            "bernoulli" | "binomial" | "logit" | "logistic" => Ok(Family::Bernoulli),
            other => Err(Error::ConfigurationError(format!("unknown family '{other}'"))),
        }
    }
}

/// A likelihood bound to its data.
///
/// `scale` is the noise scale σ for families that have one ([`Family::has_noise_scale`])
/// and is ignored otherwise.
pub trait Likelihood: Send + Sync {
    /// The family this likelihood was bound from.
    fn family(&self) -> Family;

    /// Design matrix the likelihood is bound to.
    fn design(&self) -> ArrayView2<'_, f64>;

    /// Number of observations.
    fn n_obs(&self) -> usize {
        self.design().nrows()
    }

    /// Number of regression coefficients.
    fn n_coefficients(&self) -> usize {
        self.design().ncols()
    }

    /// Total log-likelihood at `beta`.
    fn log_likelihood(&self, beta: &[f64], scale: Option<f64>) -> Result<f64>;

    /// Gradient of the log-likelihood. The first `n_coefficients` entries are with
    /// respect to β; families with a noise scale append the derivative with respect to σ.
    fn gradient(&self, beta: &[f64], scale: Option<f64>) -> Result<Vec<f64>>;

    /// Negative Hessian of the log-likelihood with respect to β (`XᵀWX`).
    fn information(&self, beta: &[f64], scale: Option<f64>) -> Result<Array2<f64>>;

    /// Maximum-likelihood noise scale given `beta`, or `None` without a noise scale.
    fn scale_estimate(&self, beta: &[f64]) -> Result<Option<f64>>;

    /// Parameters `(shape, scale)` of the inverse-gamma full conditional of σ² given β,
    /// or `None` when the family has no noise scale.
    fn noise_conditional(&self, beta: &[f64], prior: &NoisePrior) -> Result<Option<(f64, f64)>>;
}

pub(crate) fn require_scale(family: Family, scale: Option<f64>) -> Result<f64> {
    scale.ok_or_else(|| {
        Error::ConfigurationError(format!("{family} likelihood needs a noise scale"))
    })
}
