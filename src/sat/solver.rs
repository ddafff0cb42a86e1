//! The solver interface, its statistics and its configuration.

use crate::sat::assignment::Assignment;
use crate::sat::dpll::Dpll;
use crate::sat::error::Result;
use crate::sat::formula::Cnf;
use crate::sat::variable_selection::{VariableSelectionImpls, VariableSelectionType};
use std::time::Duration;

/// Counters collected during one search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct SolutionStats {
    /// Branching attempts, counting both polarities of a split.
    pub decisions: usize,
    /// Literals assigned because they formed a unit clause.
    pub propagations: usize,
    /// Search nodes that found an empty clause.
    pub conflicts: usize,
    /// Failed branches undone on the trail.
    pub backtracks: usize,
    /// Deepest branching level reached.
    pub max_depth: usize,
}

pub trait Solver {
    /// Searches for a model of `cnf`.
    ///
    /// Returns `Ok(Some(assignment))` with every registered variable set if
    /// the formula is satisfiable and `Ok(None)` if it is not.
    ///
    /// # Errors
    ///
    /// `Error::Timeout` if the configured budget runs out first, and
    /// `Error::NoCandidate` if the branching policy gives up.
    fn solve(&mut self, cnf: &Cnf) -> Result<Option<Assignment>>;

    /// Counters from the most recent call to [`solve`](Self::solve).
    fn stats(&self) -> SolutionStats;
}

/// Everything needed to build a solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SolverConfig {
    pub selection: VariableSelectionType,
    /// Wall-clock budget per call to `solve`. `None` means unbounded.
    pub timeout: Option<Duration>,
    /// Seed for the randomised branching policies.
    pub seed: Option<u64>,
}

impl SolverConfig {
    #[must_use]
    pub const fn new(selection: VariableSelectionType) -> Self {
        Self {
            selection,
            timeout: None,
            seed: None,
        }
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn build(&self) -> Dpll<VariableSelectionImpls> {
        Dpll::new(self.selection.to_impl(self.seed), self.timeout)
    }
}
