//! Linear-algebra kernels over real and dual scalars.
//!
//! - [`blas1`]: norms, inner products, scaling and updates on vectors
//! - [`blas3`]: triangular solve with value-only semantics for dual operands

pub mod blas1;
pub mod blas3;

pub use blas1::{
    axpy, axpy_columns, axpy_columns_in, axpy_in, dot, dot_in, dot_tangent, nrm2, nrm2_in, scal,
    scal_columns, scal_columns_in, scal_in, scal_in_place, scal_in_place_in,
};
pub use blas3::{Diag, Side, Trans, Uplo, trsm, trsm_vec};
