//! Defines the DPLL (Davis-Putnam-Logemann-Loveland) SAT solver.
//!
//! This module provides the `Dpll` struct, a classical chronological DPLL
//! search over a [`Cnf`] formula. If the formula is satisfiable the solver
//! returns a total assignment; if not it returns `None`.
//!
//! Each search node does the following, in order:
//! 1.  **Deadline:** If a timeout was configured and has passed, the whole
//!     search is abandoned with `Error::Timeout`. This is never confused
//!     with an unsatisfiable result.
//! 2.  **Success:** If no clauses remain, the current assignment is a model.
//! 3.  **Conflict:** If some clause has lost all its literals, this node
//!     fails and control returns to the nearest open branch.
//! 4.  **Unit Propagation:** If a unit clause remains, the first one in
//!     clause order is made true and the search continues below it. This is
//!     not a branch and there is no alternative to try.
//! 5.  **Decision:** Otherwise the branching policy proposes a variable and a
//!     polarity. The solver tries that polarity and, if the subtree fails,
//!     the opposite one. Both attempts count as decisions.
//!
//! Backtracking is chronological and uses the trail kept by
//! [`SearchState`]: a failed subtree is undone in place rather than
//! discarded with a copy of the formula. Variables the search never has to
//! decide keep the value `true`.

use crate::sat::assignment::Assignment;
use crate::sat::error::{Error, Result};
use crate::sat::formula::{ClauseSet, Cnf};
use crate::sat::literal::Literal;
use crate::sat::solver::{SolutionStats, Solver};
use crate::sat::state::SearchState;
use crate::sat::variable_selection::{Naive, VariableSelection, VariableSelectionImpls};
use log::{debug, info, trace};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// A DPLL solver parameterised by its branching policy.
///
/// A solver can be reused for several formulas, one at a time. Statistics
/// are reset at the start of each call to [`Solver::solve`].
#[derive(Debug, Clone)]
pub struct Dpll<S: VariableSelection = VariableSelectionImpls> {
    /// The branching policy consulted at every decision.
    pub selector: S,
    /// Wall-clock budget for one call to `solve`.
    pub timeout: Option<Duration>,
    deadline: Option<Instant>,
    stats: SolutionStats,
}

impl<S: VariableSelection + Default> Default for Dpll<S> {
    fn default() -> Self {
        Self::new(S::default(), None)
    }
}

impl<S: VariableSelection> Dpll<S> {
    #[must_use]
    pub const fn new(selector: S, timeout: Option<Duration>) -> Self {
        Self {
            selector,
            timeout,
            deadline: None,
            stats: SolutionStats {
                decisions: 0,
                propagations: 0,
                conflicts: 0,
                backtracks: 0,
                max_depth: 0,
            },
        }
    }

    /// Number of branching attempts made by the last search.
    #[must_use]
    pub const fn calls(&self) -> usize {
        self.stats.decisions
    }

    fn check_deadline(&self) -> Result<()> {
        match (self.deadline, self.timeout) {
            (Some(deadline), Some(timeout)) if Instant::now() >= deadline => {
                Err(Error::Timeout(timeout))
            }
            _ => Ok(()),
        }
    }

    /// Explores the subtree below the current state.
    ///
    /// On `Ok(true)` the state holds a model and has not been rolled back.
    /// On `Ok(false)` every change made below this node has been undone.
    fn search(&mut self, state: &mut SearchState, depth: usize) -> Result<bool> {
        self.check_deadline()?;

        if state.is_solved() {
            return Ok(true);
        }

        if state.has_empty_clause() {
            self.stats.conflicts += 1;
            trace!("conflict at depth {depth}");
            return Ok(false);
        }

        if let Some(unit) = state.first_unit() {
            let mark = state.checkpoint();
            let (satisfied, struck) = state.assign(unit);
            self.stats.propagations += 1;
            trace!(
                "propagate {} at depth {depth}: {satisfied} satisfied, {struck} struck",
                unit.to_i32()
            );

            if self.search(state, depth)? {
                return Ok(true);
            }
            state.backtrack(mark);
            return Ok(false);
        }

        let (var, polarity) = self
            .selector
            .select(&*state)
            .ok_or(Error::NoCandidate)?;

        let depth = depth + 1;
        self.stats.max_depth = self.stats.max_depth.max(depth);

        for value in [polarity, !polarity] {
            self.stats.decisions += 1;
            debug!(
                "decide {var} = {value} at depth {depth} ({} clauses left)",
                state.num_clauses()
            );

            let mark = state.checkpoint();
            state.assign(Literal::new(var, value));
            if self.search(state, depth)? {
                return Ok(true);
            }
            state.backtrack(mark);
            self.stats.backtracks += 1;
            debug!("backtrack {var} = {value} at depth {depth}");
        }

        Ok(false)
    }
}

impl<S: VariableSelection> Solver for Dpll<S> {
    /// Runs the search on `cnf`.
    ///
    /// Every registered variable starts out `true`; on success the returned
    /// assignment is total over the registry, with decided and propagated
    /// variables holding the values the search gave them.
    fn solve(&mut self, cnf: &Cnf) -> Result<Option<Assignment>> {
        self.stats = SolutionStats::default();
        let started = Instant::now();
        self.deadline = self.timeout.map(|timeout| started + timeout);

        info!(
            "solving {} clauses over {} variables",
            cnf.len(),
            cnf.num_vars()
        );

        let mut state = SearchState::new(cnf);
        let outcome = self.search(&mut state, 0);
        self.deadline = None;

        match outcome {
            Ok(true) => {
                info!(
                    "satisfiable after {} decisions in {:?}",
                    self.stats.decisions,
                    started.elapsed()
                );
                Ok(Some(state.into_assignment()))
            }
            Ok(false) => {
                info!(
                    "unsatisfiable after {} decisions in {:?}",
                    self.stats.decisions,
                    started.elapsed()
                );
                Ok(None)
            }
            Err(e) => {
                info!("gave up after {} decisions: {e}", self.stats.decisions);
                Err(e)
            }
        }
    }

    fn stats(&self) -> SolutionStats {
        self.stats
    }
}

/// Solves `cnf` with the naive policy and returns the model by variable name.
///
/// # Errors
///
/// `Error::Timeout` if `timeout` elapses before the search finishes. An
/// unsatisfiable formula is `Ok(None)`, not an error.
pub fn solve(cnf: &Cnf, timeout: Option<Duration>) -> Result<Option<BTreeMap<String, bool>>> {
    let mut solver = Dpll::new(Naive, timeout);
    solver
        .solve(cnf)?
        .map(|assignment| assignment.to_named(cnf.registry()))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::variable_selection::{Modal, RandomChoice, TwoClause};

    fn model(pairs: &[(&str, bool)]) -> BTreeMap<String, bool> {
        pairs.iter().map(|&(k, v)| (k.to_owned(), v)).collect()
    }

    fn cnf(text: &str) -> Cnf {
        text.parse().unwrap()
    }

    #[test]
    fn test_units_only() {
        let result = solve(&cnf("p0 ∧ ¬p1"), None).unwrap();
        assert_eq!(result, Some(model(&[("p0", true), ("p1", false)])));
    }

    #[test]
    fn test_contradiction() {
        assert_eq!(solve(&cnf("p0 ∧ ¬p0"), None).unwrap(), None);
    }

    #[test]
    fn test_undecided_variables_default_true() {
        let result = solve(&cnf("(p0 v ¬p1) ∧ (¬p2 v ¬p3)"), None).unwrap();
        assert_eq!(
            result,
            Some(model(&[("p0", true), ("p1", true), ("p2", false), ("p3", true)]))
        );
    }

    #[test]
    fn test_backtrack_restores_values() {
        let formula = cnf("(p2 v ¬p1 v p0) ∧ (¬p2 v p3) ∧ (¬p2 v ¬p3)");
        let mut solver = Dpll::new(Naive, None);
        let assignment = solver.solve(&formula).unwrap().unwrap();

        assert_eq!(
            assignment.to_named(formula.registry()).unwrap(),
            model(&[("p0", true), ("p1", false), ("p2", false), ("p3", true)])
        );

        let stats = solver.stats();
        // p2 = true, p2 = false, then p1 = false
        assert_eq!(stats.decisions, 3);
        assert_eq!(stats.conflicts, 1);
        assert_eq!(stats.backtracks, 1);
        assert_eq!(stats.propagations, 1);
        assert_eq!(solver.calls(), 3);
    }

    #[test]
    fn test_empty_formula_and_empty_clause() {
        assert_eq!(solve(&Cnf::new(), None).unwrap(), Some(BTreeMap::new()));
        assert_eq!(solve(&cnf("(a v b) ∧ ()"), None).unwrap(), None);
    }

    #[test]
    fn test_empty_formula_with_registered_variables() {
        let mut formula = cnf("a ∧ b");
        formula.clauses_mut().clear();
        assert_eq!(
            solve(&formula, None).unwrap(),
            Some(model(&[("a", true), ("b", true)]))
        );
    }

    #[test]
    fn test_every_policy_is_sound() {
        let mut rng = fastrand::Rng::with_seed(2024);
        for round in 0..20_u64 {
            let formula = Cnf::generate_with(&mut rng, 12, 40, 3).unwrap();
            let expected = solve(&formula, None).unwrap().is_some();

            let selectors = [
                VariableSelectionImpls::Naive(Naive),
                VariableSelectionImpls::Random(RandomChoice::with_seed(round)),
                VariableSelectionImpls::TwoClause(TwoClause::with_seed(round)),
                VariableSelectionImpls::Modal(Modal),
            ];

            for selector in selectors {
                let result = Dpll::new(selector, None).solve(&formula).unwrap();
                assert_eq!(result.is_some(), expected, "round {round}: {formula}");
                if let Some(assignment) = result {
                    assert!(formula.evaluate(&assignment), "round {round}: {formula}");
                    assert_eq!(assignment.num_assigned(), formula.num_vars());
                }
            }
        }
    }

    #[test]
    fn test_timeout_is_an_error() {
        let formula = Cnf::generate_with(&mut fastrand::Rng::with_seed(5), 150, 640, 3).unwrap();
        let mut solver = Dpll::new(Naive, Some(Duration::ZERO));

        let err = solver.solve(&formula).unwrap_err();
        assert!(err.is_timeout());
        assert!(matches!(err, Error::Timeout(d) if d == Duration::ZERO));
    }

    #[test]
    fn test_solver_is_reusable() {
        let mut solver: Dpll = Dpll::default();
        assert!(solver.solve(&cnf("p0 ∧ ¬p0")).unwrap().is_none());
        let conflicts = solver.stats().conflicts;
        assert_eq!(conflicts, 1);

        assert!(solver.solve(&cnf("(a v b)")).unwrap().is_some());
        assert_eq!(solver.stats().conflicts, 0);
        assert_eq!(solver.stats().max_depth, 1);
    }
}
