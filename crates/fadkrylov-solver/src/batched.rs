//! Many independent GMRES solves spread across the thread pool.
//!
//! Each problem gets its own driver confined to a [`Team`], so the solves
//! share the rayon pool without sharing Krylov state or vectors. Without the
//! `parallel` feature the batch runs sequentially in input order.

use fadkrylov_core::{Scalar, Team};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::gmres::{Gmres, GmresConfig, GmresOutcome};
use crate::problem::Problem;

/// Solve `problems[i]` starting from `guesses[i]` for every `i`.
///
/// Guesses are updated in place. Outcomes are returned in input order.
/// All problems share one configuration and therefore one dimension.
///
/// # Errors
/// Returns an error if the slices differ in length, the configuration is
/// invalid, or any single solve fails its shape checks.
pub fn solve_batched<S, P>(
    problems: &[P],
    guesses: &mut [Vec<S>],
    config: &GmresConfig,
) -> Result<Vec<GmresOutcome>>
where
    S: Scalar,
    P: Problem<S>,
{
    if problems.len() != guesses.len() {
        return Err(Error::dimension(problems.len(), guesses.len()));
    }
    config.validate()?;

    let league_size = problems.len();
    log::debug!(
        "Batched GMRES: {} systems (size={}, max_iter={})",
        league_size,
        config.problem_size,
        config.max_iter
    );

    #[cfg(feature = "parallel")]
    let outcomes = problems
        .par_iter()
        .zip(guesses.par_iter_mut())
        .enumerate()
        .map(|(rank, (problem, x))| solve_one(rank, league_size, problem, x, config))
        .collect::<Result<Vec<_>>>();

    #[cfg(not(feature = "parallel"))]
    let outcomes = problems
        .iter()
        .zip(guesses.iter_mut())
        .enumerate()
        .map(|(rank, (problem, x))| solve_one(rank, league_size, problem, x, config))
        .collect::<Result<Vec<_>>>();

    let outcomes = outcomes?;
    let converged = outcomes.iter().filter(|o| o.is_converged()).count();
    log::debug!(
        "Batched GMRES finished: {}/{} converged",
        converged,
        league_size
    );
    Ok(outcomes)
}

fn solve_one<S, P>(
    rank: usize,
    league_size: usize,
    problem: &P,
    x: &mut [S],
    config: &GmresConfig,
) -> Result<GmresOutcome>
where
    S: Scalar,
    P: Problem<S>,
{
    let mut gmres = Gmres::with_space(config.clone(), Team::new(rank, league_size))?;
    gmres.solve(problem, x)
}
