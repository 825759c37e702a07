//! Core types for fadkrylov.
//!
//! This crate provides the building blocks the solver crate is generic over:
//!
//! - [`Scalar`] with its three kinds: `f64`, [`Dual<N>`] and [`DynDual`]
//! - [`Matrix`], the rank-2 array view (rank-1 views are slices)
//! - [`ExecSpace`] with [`Device`] and [`Team`] execution
//! - [`CoordinateMapping`] and [`LinearMapping`] for problem setup

pub mod error;
pub mod exec;
pub mod mapping;
pub mod matrix;
pub mod scalar;

pub use error::{Error, Result};
pub use exec::{Device, ExecSpace, PAR_THRESHOLD, Team};
pub use mapping::{CoordinateMapping, LinearMapping};
pub use matrix::Matrix;
pub use scalar::{Dual, DynDual, Scalar, values_of};
