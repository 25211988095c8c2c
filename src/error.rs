//! Error types for model fitting.

use thiserror::Error;

/// Errors surfaced by [`crate::bayesglm`] and the components it drives.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Input shapes are inconsistent (rows of `x` vs length of `y`, coefficient count, ...).
    #[error("dimension mismatch: {what} (expected {expected}, got {found})")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    /// The response is not valid for the chosen family.
    #[error("invalid input for {family} family: {reason}")]
    InvalidFamilyInput { family: String, reason: String },

    /// Sampling hit numerical trouble it could not step around.
    #[error(
        "non-finite log-posterior in chain {chain} at iteration {iteration} after {retries} retries"
    )]
    NonFiniteLogPosterior {
        chain: usize,
        iteration: usize,
        retries: usize,
    },

    /// Invalid configuration, rejected before sampling starts.
    #[error("configuration error: {0}")]
    ConfigurationError(String),

    /// The formula could not be parsed or evaluated against the data frame.
    #[error("formula error: {0}")]
    Formula(String),

    /// A factorization failed (typically a curvature matrix that is not positive definite).
    #[error("linear algebra error: {0}")]
    Linalg(String),

    /// The fit was cancelled between chains or iterations.
    #[error("fit cancelled after {completed} completed chain(s)")]
    Cancelled { completed: usize },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
