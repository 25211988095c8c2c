//! Prior distributions on the regression coefficients and the Gaussian noise variance.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use statrs::distribution::{Continuous, InverseGamma, Normal};

/// Independent normal prior `N(mean, scale²)` on one coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalPrior {
    pub mean: f64,
    pub scale: f64,
}

impl NormalPrior {
    pub fn new(mean: f64, scale: f64) -> Self {
        Self { mean, scale }
    }

    /// The prior as a `statrs` distribution.
    pub fn distribution(&self) -> Result<Normal> {
        check_scale(self.scale)?;
        Normal::new(self.mean, self.scale).map_err(|e| {
            Error::ConfigurationError(format!(
                "invalid normal prior ({}, {}): {e}",
                self.mean, self.scale
            ))
        })
    }

    /// Log density at `b`; NaN when the prior is invalid.
    fn log_density(&self, b: f64) -> f64 {
        self.distribution().map_or(f64::NAN, |d| d.ln_pdf(b))
    }

    fn precision(&self) -> f64 {
        1.0 / (self.scale * self.scale)
    }
}

/// Prior on the coefficient vector β.
///
/// The default is a wide `N(0, 100²)` on every coefficient, which is effectively flat
/// for standardized predictors but keeps the posterior proper when the data separate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PriorSpec {
    /// Improper uniform prior; log-prior is identically zero.
    Flat,
    /// The same normal prior on every coefficient.
    Normal { mean: f64, scale: f64 },
    /// One normal prior per coefficient, in design-matrix column order.
    PerCoefficient { priors: Vec<NormalPrior> },
}

impl Default for PriorSpec {
    fn default() -> Self {
        PriorSpec::Normal {
            mean: 0.0,
            scale: 100.0,
        }
    }
}

impl PriorSpec {
    /// Check the prior against the number of coefficients it will be applied to.
    pub fn validate(&self, n_coefficients: usize) -> Result<()> {
        match self {
            PriorSpec::Flat => Ok(()),
            PriorSpec::Normal { mean, scale } => {
                NormalPrior::new(*mean, *scale).distribution().map(drop)
            }
            PriorSpec::PerCoefficient { priors } => {
                if priors.len() != n_coefficients {
                    return Err(Error::DimensionMismatch {
                        what: "per-coefficient prior count vs coefficients",
                        expected: n_coefficients,
                        found: priors.len(),
                    });
                }
                priors.iter().try_for_each(|p| p.distribution().map(drop))
            }
        }
    }

    fn component(&self, j: usize) -> Option<NormalPrior> {
        match self {
            PriorSpec::Flat => None,
            PriorSpec::Normal { mean, scale } => Some(NormalPrior::new(*mean, *scale)),
            PriorSpec::PerCoefficient { priors } => priors.get(j).copied(),
        }
    }

    /// Log prior density of `beta`.
    pub fn log_prior(&self, beta: &[f64]) -> f64 {
        beta.iter()
            .enumerate()
            .filter_map(|(j, &b)| self.component(j).map(|p| p.log_density(b)))
            .sum()
    }

    /// Gradient of [`PriorSpec::log_prior`] with respect to `beta`.
    pub fn gradient(&self, beta: &[f64]) -> Vec<f64> {
        beta.iter()
            .enumerate()
            .map(|(j, &b)| {
                self.component(j)
                    .map_or(0.0, |p| -(b - p.mean) * p.precision())
            })
            .collect()
    }

    /// Prior mean and precision per coefficient (precision 0 for flat components).
    pub fn mean_precision(&self, n_coefficients: usize) -> Vec<(f64, f64)> {
        (0..n_coefficients)
            .map(|j| {
                self.component(j)
                    .map_or((0.0, 0.0), |p| (p.mean, p.precision()))
            })
            .collect()
    }
}

fn check_scale(scale: f64) -> Result<()> {
    if scale > 0.0 && scale.is_finite() {
        Ok(())
    } else {
        Err(Error::ConfigurationError(format!(
            "prior scale must be positive and finite, got {scale}"
        )))
    }
}

/// Inverse-gamma prior `σ² ~ InvGamma(shape, scale)` on the Gaussian noise variance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoisePrior {
    pub shape: f64,
    pub scale: f64,
}

impl Default for NoisePrior {
    fn default() -> Self {
        Self {
            shape: 0.001,
            scale: 0.001,
        }
    }
}

impl NoisePrior {
    pub fn validate(&self) -> Result<()> {
        self.distribution().map(drop)
    }

    /// The prior as a `statrs` distribution; its `rate` is the inverse-gamma scale.
    pub fn distribution(&self) -> Result<InverseGamma> {
        InverseGamma::new(self.shape, self.scale).map_err(|e| {
            Error::ConfigurationError(format!(
                "noise prior needs positive finite shape and scale, got ({}, {}): {e}",
                self.shape, self.scale
            ))
        })
    }

    /// Log density of the variance `sigma2`; `-inf` outside `(0, inf)`.
    pub fn log_density(&self, sigma2: f64) -> f64 {
        if sigma2 <= 0.0 || !sigma2.is_finite() {
            return f64::NEG_INFINITY;
        }
        self.distribution().map_or(f64::NAN, |d| d.ln_pdf(sigma2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn normal_prior_matches_statrs_density() {
        let prior = PriorSpec::Normal {
            mean: 1.0,
            scale: 2.0,
        };
        let beta = [0.5, -3.0];
        let dist = Normal::new(1.0, 2.0).unwrap();
        let expected = dist.ln_pdf(0.5) + dist.ln_pdf(-3.0);
        assert_abs_diff_eq!(prior.log_prior(&beta), expected, epsilon = 1e-12);

        let grad = prior.gradient(&beta);
        assert_abs_diff_eq!(grad[0], 0.125, epsilon = 1e-12);
        assert_abs_diff_eq!(grad[1], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn flat_prior_is_zero() {
        assert_eq!(PriorSpec::Flat.log_prior(&[1e6, -1e6]), 0.0);
        assert_eq!(PriorSpec::Flat.gradient(&[3.0]), vec![0.0]);
        assert_eq!(PriorSpec::Flat.mean_precision(2), vec![(0.0, 0.0); 2]);
    }

    #[test]
    fn per_coefficient_length_is_checked() {
        let prior = PriorSpec::PerCoefficient {
            priors: vec![NormalPrior::new(0.0, 1.0)],
        };
        assert!(prior.validate(1).is_ok());
        assert!(matches!(
            prior.validate(2),
            Err(Error::DimensionMismatch { expected: 2, found: 1, .. })
        ));
        let bad = PriorSpec::Normal {
            mean: 0.0,
            scale: 0.0,
        };
        assert!(matches!(bad.validate(3), Err(Error::ConfigurationError(_))));
    }

    #[test]
    fn noise_prior_density() {
        let prior = NoisePrior {
            shape: 2.0,
            scale: 3.0,
        };
        // InvGamma(2, 3) at 1: 2 ln 3 - ln Γ(2) - 3
        assert_abs_diff_eq!(prior.log_density(1.0), 2.0 * 3f64.ln() - 3.0, epsilon = 1e-12);
        assert_eq!(prior.log_density(0.0), f64::NEG_INFINITY);
        assert!(NoisePrior { shape: -1.0, scale: 1.0 }.validate().is_err());
        assert!(NoisePrior { shape: 1.0, scale: f64::INFINITY }.validate().is_err());
    }

    #[test]
    fn invalid_normal_prior_never_yields_a_density() {
        let prior = NormalPrior::new(0.0, -2.0);
        assert!(matches!(prior.distribution(), Err(Error::ConfigurationError(_))));
        assert!(prior.log_density(0.0).is_nan());
        assert!(NormalPrior::new(0.0, f64::INFINITY).distribution().is_err());
    }
}
