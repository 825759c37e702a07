//! Error types for fadkrylov-core.

use thiserror::Error;

/// Shape and parameter errors raised by core data structures.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// Operand extents do not agree.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A square matrix was required.
    #[error("matrix is not square: {rows}x{cols}")]
    NotSquare { rows: usize, cols: usize },

    /// A constructor parameter is out of range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;
