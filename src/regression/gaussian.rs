//! Gaussian linear regression likelihood.
//!
//! # Model
//! - Likelihood: \( y_i \mid \beta, \sigma \sim \mathcal{N}(x_i^\top \beta, \sigma^2) \)
//! - Noise: \( \sigma^2 \sim \mathrm{InvGamma}(a_0, b_0) \), which is conjugate given β:
//!   \( \sigma^2 \mid \beta, y \sim \mathrm{InvGamma}(a_0 + n/2,\; b_0 + \mathrm{SSR}(\beta)/2) \)

use super::{Family, Likelihood, require_scale};
use crate::error::Result;
use crate::linalg;
use crate::prior::NoisePrior;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use statrs::consts::LN_SQRT_2PI;

/// Normal likelihood with identity link, borrowing its data.
#[derive(Debug, Clone)]
pub struct GaussianLikelihood<'a> {
    x: ArrayView2<'a, f64>,
    y: ArrayView1<'a, f64>,
}

impl<'a> GaussianLikelihood<'a> {
    /// Bind to `x` and `y`. Shapes are checked by [`Family::bind`].
    pub fn new(x: ArrayView2<'a, f64>, y: ArrayView1<'a, f64>) -> Self {
        Self { x, y }
    }

    fn residuals(&self, beta: &[f64]) -> Result<Array1<f64>> {
        let eta = linalg::linear_predictor(self.x, beta)?;
        Ok(&self.y - &eta)
    }

    /// Residual sum of squares at `beta`.
    pub fn sum_squared_residuals(&self, beta: &[f64]) -> Result<f64> {
        Ok(self.residuals(beta)?.mapv(|r| r * r).sum())
    }
}

impl Likelihood for GaussianLikelihood<'_> {
    fn family(&self) -> Family {
        Family::Gaussian
    }

    fn design(&self) -> ArrayView2<'_, f64> {
        self.x.view()
    }

    fn log_likelihood(&self, beta: &[f64], scale: Option<f64>) -> Result<f64> {
        let sigma = require_scale(Family::Gaussian, scale)?;
        let ssr = self.sum_squared_residuals(beta)?;
        if sigma <= 0.0 {
            return Ok(f64::NEG_INFINITY);
        }
        let n = self.y.len() as f64;
        Ok(-n * LN_SQRT_2PI - n * sigma.ln() - ssr / (2.0 * sigma * sigma))
    }

    fn gradient(&self, beta: &[f64], scale: Option<f64>) -> Result<Vec<f64>> {
        let sigma = require_scale(Family::Gaussian, scale)?;
        let resid = self.residuals(beta)?;
        let sigma2 = sigma * sigma;
        let mut grad: Vec<f64> = linalg::transpose_mul(self.x, resid.view())
            .iter()
            .map(|g| g / sigma2)
            .collect();
        let ssr = resid.mapv(|r| r * r).sum();
        let n = self.y.len() as f64;
        grad.push(-n / sigma + ssr / (sigma2 * sigma));
        Ok(grad)
    }

    fn information(&self, beta: &[f64], scale: Option<f64>) -> Result<Array2<f64>> {
        let sigma = require_scale(Family::Gaussian, scale)?;
        // Curvature does not depend on β, but the length still has to line up.
        linalg::linear_predictor(self.x, beta)?;
        let w = Array1::from_elem(self.x.nrows(), 1.0 / (sigma * sigma));
        Ok(linalg::weighted_cross_product(self.x, w.view()))
    }

    fn scale_estimate(&self, beta: &[f64]) -> Result<Option<f64>> {
        let n = self.y.len().max(1) as f64;
        let ssr = self.sum_squared_residuals(beta)?;
        Ok(Some((ssr / n).max(1e-12).sqrt()))
    }

    fn noise_conditional(&self, beta: &[f64], prior: &NoisePrior) -> Result<Option<(f64, f64)>> {
        let ssr = self.sum_squared_residuals(beta)?;
        let n = self.y.len() as f64;
        Ok(Some((prior.shape + 0.5 * n, prior.scale + 0.5 * ssr)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use statrs::distribution::{Continuous, Normal};

    fn data() -> (Array2<f64>, Array1<f64>) {
        (
            array![[1.0, 0.5], [1.0, -1.0], [1.0, 2.0]],
            array![1.2, -0.3, 2.9],
        )
    }

    #[test]
    fn log_likelihood_is_sum_of_normal_densities() {
        let (x, y) = data();
        let lik = GaussianLikelihood::new(x.view(), y.view());
        let beta = [0.2, 1.1];
        let eta = x.dot(&array![0.2, 1.1]);
        let expected: f64 = y
            .iter()
            .zip(eta.iter())
            .map(|(&yi, &mi)| Normal::new(mi, 0.7).unwrap().ln_pdf(yi))
            .sum();
        assert_abs_diff_eq!(
            lik.log_likelihood(&beta, Some(0.7)).unwrap(),
            expected,
            epsilon = 1e-10
        );
    }

    #[test]
    fn gradient_matches_finite_differences() {
        let (x, y) = data();
        let lik = GaussianLikelihood::new(x.view(), y.view());
        let beta = [0.2, 1.1];
        let sigma = 0.7;
        let grad = lik.gradient(&beta, Some(sigma)).unwrap();
        assert_eq!(grad.len(), 3);
        let h = 1e-6;
        for j in 0..2 {
            let mut up = beta;
            let mut down = beta;
            up[j] += h;
            down[j] -= h;
            let fd = (lik.log_likelihood(&up, Some(sigma)).unwrap()
                - lik.log_likelihood(&down, Some(sigma)).unwrap())
                / (2.0 * h);
            assert_abs_diff_eq!(grad[j], fd, epsilon = 1e-5);
        }
        let fd_sigma = (lik.log_likelihood(&beta, Some(sigma + h)).unwrap()
            - lik.log_likelihood(&beta, Some(sigma - h)).unwrap())
            / (2.0 * h);
        assert_abs_diff_eq!(grad[2], fd_sigma, epsilon = 1e-5);
    }

    #[test]
    fn wrong_coefficient_count_and_missing_scale() {
        let (x, y) = data();
        let lik = GaussianLikelihood::new(x.view(), y.view());
        assert!(matches!(
            lik.log_likelihood(&[1.0], Some(1.0)),
            Err(Error::DimensionMismatch { .. })
        ));
        assert!(matches!(
            lik.log_likelihood(&[1.0, 1.0], None),
            Err(Error::ConfigurationError(_))
        ));
    }

    #[test]
    fn noise_conditional_adds_half_ssr() {
        let (x, y) = data();
        let lik = GaussianLikelihood::new(x.view(), y.view());
        let prior = NoisePrior {
            shape: 1.0,
            scale: 2.0,
        };
        let ssr = lik.sum_squared_residuals(&[0.0, 1.0]).unwrap();
        let (a, b) = lik.noise_conditional(&[0.0, 1.0], &prior).unwrap().unwrap();
        assert_abs_diff_eq!(a, 2.5, epsilon = 1e-12);
        assert_abs_diff_eq!(b, 2.0 + 0.5 * ssr, epsilon = 1e-12);
    }
}
