//! # Bayesian Generalized Linear Models
//!
//! This crate fits Bayesian GLMs with a self-contained Markov chain Monte Carlo sampler.
//! Models are given either as a design matrix plus response, or as an R-style formula
//! evaluated against a [`DataFrame`].
//!
//! ## Features
//!
//! - **Families:**
//!   - [`Family::Gaussian`]: identity link, noise scale σ sampled alongside the coefficients.
//!   - [`Family::Bernoulli`]: logit link for binary 0/1 responses.
//!
//! - **Sampler:**
//!   - Random-walk Metropolis on the coefficients, preconditioned by the Laplace
//!     covariance at the posterior mode, with dual-averaging step size adaptation
//!     during warm-up.
//!   - Conjugate inverse-gamma Gibbs update of σ² for the Gaussian family.
//!   - Chains run in parallel through rayon (the default `rayon` feature); every chain
//!     owns a ChaCha8 stream derived from `(seed, chain)`, so results are reproducible
//!     regardless of scheduling.
//!
//! - **Posterior:**
//!   - Pooled, shuffled draws keyed by parameter group or the raw
//!     `(chain, iteration, parameter)` array, see [`PosteriorResult::extract`].
//!   - Split R-hat and bulk ESS via [`PosteriorResult::diagnostics`].
//!
//! ## Usage Example
//!
//! ```rust
//! use bayesglm::{bayesglm, Family, FitConfig, ModelInput};
//! use ndarray::Array2;
//!
//! let x = Array2::from_shape_fn((40, 2), |(i, j)| if j == 0 { 1.0 } else { i as f64 / 8.0 });
//! let mut y = x.column(1).mapv(|v| if v > 2.5 { 1.0 } else { 0.0 });
//! // Overlap the classes so the logit MLE exists.
//! y[10] = 1.0;
//! y[30] = 0.0;
//!
//! let fit = bayesglm(ModelInput::matrix(x, y), Family::Bernoulli, &FitConfig::new(400, 7))?;
//! let draws = fit.extract(true);
//! assert_eq!(draws["beta"].shape(), &[4 * 200, 2]);
//! # Ok::<(), bayesglm::Error>(())
//! ```

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod fit;
pub mod formula;
pub mod frame;
pub mod linalg;
pub mod posterior;
pub mod prior;
pub mod regression;
mod rng;
pub mod sampler;
pub mod template;

pub use config::FitConfig;
pub use diagnostics::Diagnostics;
pub use error::{Error, Result};
pub use fit::{ModelInput, bayesglm, bayesglm_with_cancel};
pub use frame::DataFrame;
pub use posterior::{Extracted, PooledDraws, PosteriorResult};
pub use prior::{NoisePrior, NormalPrior, PriorSpec};
pub use regression::{Family, Likelihood};
pub use sampler::CancelToken;
pub use template::{model_template, render_model};
