//! Fit configuration.

use crate::error::{Error, Result};
use crate::prior::{NoisePrior, PriorSpec};
use serde::{Deserialize, Serialize};

/// Configuration options for [`crate::bayesglm`].
///
/// The defaults are sensible for standardized predictors. Missing fields fall back to
/// their defaults when deserializing, so a config file only needs the options it
/// changes.
///
/// # Example
/// ```
/// use bayesglm::{FitConfig, PriorSpec};
///
/// let config = FitConfig::new(1000, 42)
///     .with_chains(2)
///     .with_prior(PriorSpec::Normal { mean: 0.0, scale: 10.0 });
/// assert_eq!(config.warmup_iterations(), 500);
/// assert_eq!(config.sampling_iterations(), 500);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    /// Total iterations per chain, warm-up included.
    pub iterations: usize,
    /// Seed for every random stream of the fit.
    pub seed: u64,
    /// Number of independent chains (≥ 1).
    pub chains: usize,
    /// Fraction of `iterations` used for warm-up, in `[0, 1)`.
    pub warmup_fraction: f64,
    /// Prior on the coefficients.
    pub prior: PriorSpec,
    /// Prior on the noise variance (Gaussian family only).
    pub noise_prior: NoisePrior,
    /// Acceptance rate the warm-up step size adaptation aims for.
    pub target_accept: f64,
    /// Initial jitter around the posterior mode, in posterior standard deviations.
    pub init_jitter: f64,
    /// Consecutive non-finite proposals tolerated before a chain fails.
    pub max_nonfinite_retries: usize,
    /// Newton iterations allowed when locating the posterior mode.
    pub newton_max_iterations: usize,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            iterations: 2000,
            seed: 0,
            chains: 4,
            warmup_fraction: 0.5,
            prior: PriorSpec::default(),
            noise_prior: NoisePrior::default(),
            target_accept: 0.3,
            init_jitter: 0.1,
            max_nonfinite_retries: 16,
            newton_max_iterations: 50,
        }
    }
}

impl FitConfig {
    /// Defaults with the given iteration count and seed.
    pub fn new(iterations: usize, seed: u64) -> Self {
        Self {
            iterations,
            seed,
            ..Self::default()
        }
    }

    pub fn with_chains(mut self, chains: usize) -> Self {
        self.chains = chains;
        self
    }

    pub fn with_warmup_fraction(mut self, warmup_fraction: f64) -> Self {
        self.warmup_fraction = warmup_fraction;
        self
    }

    pub fn with_prior(mut self, prior: PriorSpec) -> Self {
        self.prior = prior;
        self
    }

    pub fn with_noise_prior(mut self, noise_prior: NoisePrior) -> Self {
        self.noise_prior = noise_prior;
        self
    }

    pub fn with_target_accept(mut self, target_accept: f64) -> Self {
        self.target_accept = target_accept;
        self
    }

    pub fn with_init_jitter(mut self, init_jitter: f64) -> Self {
        self.init_jitter = init_jitter;
        self
    }

    pub fn with_max_nonfinite_retries(mut self, retries: usize) -> Self {
        self.max_nonfinite_retries = retries;
        self
    }

    /// Warm-up iterations per chain, `floor(iterations * warmup_fraction)`.
    pub fn warmup_iterations(&self) -> usize {
        (self.iterations as f64 * self.warmup_fraction).floor() as usize
    }

    /// Post-warm-up iterations kept per chain.
    pub fn sampling_iterations(&self) -> usize {
        self.iterations - self.warmup_iterations()
    }

    /// Reject configurations that cannot produce a posterior sample.
    ///
    /// Coefficient-count checks of the prior happen once the design matrix is known.
    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(Error::ConfigurationError(
                "iterations must be positive".to_string(),
            ));
        }
        if self.chains == 0 {
            return Err(Error::ConfigurationError(
                "at least one chain is required".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.warmup_fraction) {
            return Err(Error::ConfigurationError(format!(
                "warmup_fraction must be in [0, 1), got {}",
                self.warmup_fraction
            )));
        }
        if self.sampling_iterations() == 0 {
            return Err(Error::ConfigurationError(
                "no iterations left after warm-up".to_string(),
            ));
        }
        if !(self.target_accept > 0.0 && self.target_accept < 1.0) {
            return Err(Error::ConfigurationError(format!(
                "target_accept must be in (0, 1), got {}",
                self.target_accept
            )));
        }
        if !(self.init_jitter >= 0.0 && self.init_jitter.is_finite()) {
            return Err(Error::ConfigurationError(format!(
                "init_jitter must be finite and non-negative, got {}",
                self.init_jitter
            )));
        }
        if self.newton_max_iterations == 0 {
            return Err(Error::ConfigurationError(
                "newton_max_iterations must be positive".to_string(),
            ));
        }
        self.noise_prior.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = FitConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chains, 4);
        assert_eq!(config.warmup_iterations(), 1000);
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let bad = [
            FitConfig::new(0, 0),
            FitConfig::new(10, 0).with_chains(0),
            FitConfig::new(10, 0).with_warmup_fraction(1.0),
            FitConfig::new(10, 0).with_warmup_fraction(-0.1),
            FitConfig::new(10, 0).with_target_accept(1.5),
            FitConfig::new(10, 0).with_init_jitter(f64::NAN),
            FitConfig::new(10, 0).with_noise_prior(NoisePrior {
                shape: 0.0,
                scale: 1.0,
            }),
        ];
        for config in bad {
            assert!(
                matches!(config.validate(), Err(Error::ConfigurationError(_))),
                "{config:?} should be rejected"
            );
        }
    }

    #[test]
    fn single_iteration_without_warmup_is_allowed() {
        let config = FitConfig::new(1, 0).with_warmup_fraction(0.0);
        assert!(config.validate().is_ok());
        assert_eq!(config.sampling_iterations(), 1);
        // floor(1 * 0.5) = 0 warm-up iterations, one kept draw
        assert_eq!(FitConfig::new(1, 0).sampling_iterations(), 1);
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: FitConfig =
            serde_json::from_str(r#"{"iterations": 200, "prior": {"kind": "flat"}}"#).unwrap();
        assert_eq!(config.iterations, 200);
        assert_eq!(config.seed, 0);
        assert_eq!(config.prior, PriorSpec::Flat);
        let json = serde_json::to_string(&config).unwrap();
        let back: FitConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.iterations, config.iterations);
        assert_eq!(back.chains, config.chains);
        assert_eq!(back.prior, config.prior);
    }
}
