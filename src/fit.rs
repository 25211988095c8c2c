//! The `bayesglm` entry point.

use crate::config::FitConfig;
use crate::error::{Error, Result};
use crate::formula::build_design;
use crate::frame::DataFrame;
use crate::posterior::PosteriorResult;
use crate::regression::Family;
use crate::sampler::{self, CancelToken, Target};
use log::info;
use ndarray::{Array1, Array2};

/// Data handed to [`bayesglm`].
#[derive(Debug, Clone)]
pub enum ModelInput<'a> {
    /// A design matrix (rows × coefficients) and a response of matching length.
    Matrix { x: Array2<f64>, y: Array1<f64> },
    /// An R-style formula evaluated against named columns.
    Formula { formula: &'a str, data: &'a DataFrame },
}

impl<'a> ModelInput<'a> {
    pub fn matrix(x: Array2<f64>, y: Array1<f64>) -> Self {
        ModelInput::Matrix { x, y }
    }

    pub fn formula(formula: &'a str, data: &'a DataFrame) -> Self {
        ModelInput::Formula { formula, data }
    }

    /// Resolve into a design matrix, response and coefficient names.
    fn into_design(self) -> Result<(Array2<f64>, Array1<f64>, Vec<String>)> {
        match self {
            ModelInput::Matrix { x, y } => {
                let names = (0..x.ncols()).map(|j| format!("beta[{j}]")).collect();
                Ok((x, y, names))
            }
            ModelInput::Formula { formula, data } => {
                let design = build_design(formula, data)?;
                Ok((design.x, design.y, design.names))
            }
        }
    }
}

/// Fit a Bayesian GLM and return its posterior draws.
///
/// Inputs and configuration are validated before any sampling starts.
///
/// # Example
/// ```
/// use bayesglm::{bayesglm, DataFrame, Family, FitConfig, ModelInput};
///
/// let x: Vec<f64> = (0..50).map(|i| i as f64 / 10.0).collect();
/// let y: Vec<f64> = x.iter().map(|v| 1.0 + 2.0 * v + 0.05 * (v * 13.0).sin()).collect();
/// let data = DataFrame::new().with_column("x", x)?.with_column("y", y)?;
///
/// let fit = bayesglm(
///     ModelInput::formula("y ~ x", &data),
///     Family::Gaussian,
///     &FitConfig::new(200, 1).with_chains(2),
/// )?;
/// assert_eq!(fit.param_names(), &["Intercept", "x", "sigma"]);
/// assert_eq!(fit.n_draws(), 100);
/// # Ok::<(), bayesglm::Error>(())
/// ```
pub fn bayesglm(
    input: ModelInput<'_>,
    family: Family,
    config: &FitConfig,
) -> Result<PosteriorResult> {
    fit(input, family, config, None)
}

/// [`bayesglm`] with a token that can cancel the fit from another thread.
pub fn bayesglm_with_cancel(
    input: ModelInput<'_>,
    family: Family,
    config: &FitConfig,
    cancel: &CancelToken,
) -> Result<PosteriorResult> {
    fit(input, family, config, Some(cancel))
}

fn fit(
    input: ModelInput<'_>,
    family: Family,
    config: &FitConfig,
    cancel: Option<&CancelToken>,
) -> Result<PosteriorResult> {
    config.validate()?;
    let (x, y, names) = input.into_design()?;
    if x.nrows() == 0 || x.ncols() == 0 {
        return Err(Error::ConfigurationError(format!(
            "design matrix is empty ({} x {})",
            x.nrows(),
            x.ncols()
        )));
    }
    if let Some(pos) = x.iter().position(|v| !v.is_finite()) {
        return Err(Error::ConfigurationError(format!(
            "design matrix has a non-finite value at row {}, column {}",
            pos / x.ncols(),
            pos % x.ncols()
        )));
    }
    config.prior.validate(x.ncols())?;

    let likelihood = family.bind(x.view(), y.view())?;
    info!(
        "fitting {family} GLM: {} observations, {} coefficient(s)",
        x.nrows(),
        x.ncols()
    );
    let target = Target::new(likelihood.as_ref(), &config.prior, &config.noise_prior);
    let run = sampler::run(&target, config, cancel)?;
    let result = PosteriorResult::from_chains(family, names, run.chains, run.mode, config.seed)?;
    info!(
        "fit finished: {} chain(s) x {} draws, acceptance {:.3}",
        result.n_chains(),
        result.n_draws(),
        result.acceptance_rate()
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn configuration_is_checked_before_data() {
        let x = array![[1.0], [2.0]];
        let y = array![1.0, 2.0, 3.0];
        let err = bayesglm(ModelInput::matrix(x, y), Family::Gaussian, &FitConfig::new(0, 1))
            .unwrap_err();
        assert!(matches!(err, Error::ConfigurationError(_)));
    }

    #[test]
    fn empty_and_non_finite_designs_are_rejected() {
        let empty = bayesglm(
            ModelInput::matrix(Array2::zeros((0, 2)), Array1::zeros(0)),
            Family::Gaussian,
            &FitConfig::new(10, 1),
        );
        assert!(matches!(empty, Err(Error::ConfigurationError(_))));

        let x = array![[1.0, f64::NAN], [1.0, 2.0]];
        let err = bayesglm(
            ModelInput::matrix(x, array![0.0, 1.0]),
            Family::Bernoulli,
            &FitConfig::new(10, 1),
        )
        .unwrap_err();
        assert!(matches!(err, Error::ConfigurationError(msg) if msg.contains("row 0, column 1")));
    }

    #[test]
    fn matrix_input_names_coefficients_by_position() {
        let (x, y, names) = ModelInput::matrix(array![[1.0, 2.0, 3.0]], array![1.0])
            .into_design()
            .unwrap();
        assert_eq!(names, vec!["beta[0]", "beta[1]", "beta[2]"]);
        assert_eq!(x.ncols(), 3);
        assert_eq!(y.len(), 1);
    }
}
