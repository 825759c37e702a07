//! Error types for fadkrylov-solver.

use thiserror::Error;

/// Errors raised by the linear-algebra layer and the GMRES driver.
///
/// Numerical outcomes (breakdown, non-convergence) are not errors; they are
/// reported through [`crate::GmresStatus`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// Shape error from a core data structure.
    #[error(transparent)]
    Core(#[from] fadkrylov_core::Error),

    /// Triangular solve hit a zero pivot.
    #[error("singular triangular matrix")]
    SingularMatrix,

    /// Solver configuration is out of range.
    #[error("invalid solver configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Shorthand for a length mismatch between operands.
    pub(crate) fn dimension(expected: usize, actual: usize) -> Self {
        Error::Core(fadkrylov_core::Error::DimensionMismatch { expected, actual })
    }
}

/// Result type for solver operations.
pub type Result<T> = std::result::Result<T, Error>;
