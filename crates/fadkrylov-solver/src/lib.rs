//! Scalar-generic linear algebra and matrix-free GMRES for fadkrylov.
//!
//! This crate provides:
//! - BLAS-1 kernels (`nrm2`, `dot`, `scal`, `axpy`) over real and dual scalars
//! - Triangular solve (`trsm`) with value-only semantics for dual operands
//! - A restartable GMRES driver for residual/JVP callbacks
//! - Newton-Krylov JVPs by forward-mode differentiation of a residual
//! - Batched solves, one team per system, across the rayon pool

pub mod batched;
pub mod error;
pub mod gmres;
pub mod linalg;
pub mod problem;

pub use batched::solve_batched;
pub use error::{Error, Result};
pub use gmres::{BREAKDOWN_EPS, Gmres, GmresConfig, GmresOutcome, GmresStatus};
pub use linalg::{Diag, Side, Trans, Uplo, axpy, dot, dot_tangent, nrm2, scal, trsm, trsm_vec};
pub use problem::{DenseOperator, ForwardJvp, LinearOperator, LinearSystem, Problem, Residual};
