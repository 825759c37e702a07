//! Matrix-free GMRES over real and dual scalars.
//!
//! One call to [`Gmres::solve`] runs a single Krylov cycle of at most
//! `max_iter` Arnoldi steps from the caller's initial guess and updates the
//! guess in place. [`Gmres::solve_restarted`] chains cycles.
//!
//! # Usage
//!
//! ```ignore
//! use fadkrylov_solver::{Gmres, GmresConfig};
//!
//! let mut gmres = Gmres::<f64>::new(GmresConfig::for_size(n))?;
//! let outcome = gmres.solve(&problem, &mut x)?;
//! assert!(outcome.is_converged());
//! ```
//!
//! # Module Structure
//!
//! - [`driver`] - Krylov state and the Arnoldi/Givens iteration
//! - [`helpers`] - Givens rotation utilities

pub mod driver;
pub mod helpers;

pub use driver::Gmres;

use crate::error::{Error, Result};

/// Subdiagonal norm at or below which Arnoldi reports breakdown.
pub const BREAKDOWN_EPS: f64 = 1e-12;

/// GMRES solver configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct GmresConfig {
    /// System dimension `N`.
    pub problem_size: usize,
    /// Maximum number of Arnoldi steps per cycle (Krylov subspace dimension).
    pub max_iter: usize,
    /// Convergence tolerance on the residual relative to the initial residual.
    pub tol: f64,
}

impl GmresConfig {
    /// Validated configuration.
    pub fn new(problem_size: usize, max_iter: usize, tol: f64) -> Result<Self> {
        let config = Self {
            problem_size,
            max_iter,
            tol,
        };
        config.validate()?;
        Ok(config)
    }

    /// Preset for a system of size `problem_size`: 30 steps, `tol = 1e-8`.
    pub fn for_size(problem_size: usize) -> Self {
        Self {
            problem_size,
            max_iter: 30,
            tol: 1e-8,
        }
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Check `problem_size > 0`, `max_iter > 0` and a finite positive `tol`.
    pub fn validate(&self) -> Result<()> {
        if self.problem_size == 0 {
            return Err(Error::InvalidConfig("problem_size must be positive".into()));
        }
        if self.max_iter == 0 {
            return Err(Error::InvalidConfig("max_iter must be positive".into()));
        }
        if !(self.tol.is_finite() && self.tol > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "tol must be finite and positive, got {}",
                self.tol
            )));
        }
        Ok(())
    }
}

/// How a Krylov cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GmresStatus {
    /// Relative residual fell below `tol`.
    Converged,
    /// Arnoldi could not extend the basis.
    Breakdown,
    /// `max_iter` steps without convergence.
    MaxIterReached,
}

/// Result of a GMRES solve. The iterate itself is updated in place.
#[derive(Debug, Clone, PartialEq)]
pub struct GmresOutcome {
    pub status: GmresStatus,
    /// Arnoldi steps performed, summed over cycles.
    pub iterations: usize,
    /// Final residual estimate relative to `initial_residual`.
    pub error: f64,
    /// Norm of the residual at the initial guess.
    pub initial_residual: f64,
    /// Krylov cycles run.
    pub cycles: usize,
    pub(crate) tol: f64,
}

impl GmresOutcome {
    /// Converged, or broke down with the residual already below `tol`.
    pub fn is_converged(&self) -> bool {
        match self.status {
            GmresStatus::Converged => true,
            GmresStatus::Breakdown => self.error < self.tol,
            GmresStatus::MaxIterReached => false,
        }
    }

    /// Breakdown because the Krylov space already contains the solution.
    pub fn is_lucky_breakdown(&self) -> bool {
        self.status == GmresStatus::Breakdown && self.error < self.tol
    }
}
