#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Branching policies for the DPLL search.
//!
//! A policy looks at the clauses still in play and proposes a variable to
//! branch on together with the polarity to try first. The proposed variable
//! always occurs in at least one remaining clause. Every policy except
//! [`RandomChoice`] is a pure function of the clause set.

use crate::sat::formula::ClauseSet;
use crate::sat::literal::{Literal, Variable};
use clap::ValueEnum;
use std::fmt::Display;

pub trait VariableSelection {
    /// Proposes `(variable, polarity)`, or `None` if no clause has a literal
    /// left to branch on.
    fn select<C: ClauseSet>(&mut self, clauses: &C) -> Option<(Variable, bool)>;
}

fn decision(literal: Literal) -> (Variable, bool) {
    (literal.variable(), literal.polarity())
}

/// First literal of the first remaining clause, with its own polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Naive;

impl VariableSelection for Naive {
    fn select<C: ClauseSet>(&mut self, clauses: &C) -> Option<(Variable, bool)> {
        clauses
            .clauses()
            .find_map(|c| c.first().copied())
            .map(decision)
    }
}

/// A uniformly chosen clause, then a uniformly chosen literal within it.
#[derive(Debug, Clone)]
pub struct RandomChoice {
    rng: fastrand::Rng,
}

impl Default for RandomChoice {
    fn default() -> Self {
        Self {
            rng: fastrand::Rng::new(),
        }
    }
}

impl RandomChoice {
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
        }
    }
}

impl VariableSelection for RandomChoice {
    fn select<C: ClauseSet>(&mut self, clauses: &C) -> Option<(Variable, bool)> {
        let candidates: Vec<&[Literal]> = clauses.clauses().filter(|c| !c.is_empty()).collect();
        if candidates.is_empty() {
            return None;
        }

        let clause = candidates[self.rng.usize(..candidates.len())];
        let literal = clause[self.rng.usize(..clause.len())];
        Some(decision(literal))
    }
}

/// The first variable, in registry order, whose longest containing clause
/// has exactly two literals. Tries `true` first. Falls back to
/// [`RandomChoice`] when no such variable exists.
#[derive(Debug, Clone, Default)]
pub struct TwoClause {
    fallback: RandomChoice,
}

impl TwoClause {
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            fallback: RandomChoice::with_seed(seed),
        }
    }
}

impl VariableSelection for TwoClause {
    fn select<C: ClauseSet>(&mut self, clauses: &C) -> Option<(Variable, bool)> {
        let mut longest = vec![0usize; clauses.num_vars() + 1];
        for clause in clauses.clauses() {
            for literal in clause {
                let slot = &mut longest[literal.variable() as usize];
                *slot = (*slot).max(clause.len());
            }
        }

        clauses
            .variables()
            .find(|&var| longest[var as usize] == 2)
            .map(|var| (var, true))
            .or_else(|| self.fallback.select(clauses))
    }
}

/// The variable with the most occurrences across the remaining clauses.
///
/// Ties go to the variable that reached the winning count first in clause
/// order. Tries `true` first if the variable occurs positively more often
/// than negatively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modal;

impl VariableSelection for Modal {
    fn select<C: ClauseSet>(&mut self, clauses: &C) -> Option<(Variable, bool)> {
        let mut positive = vec![0usize; clauses.num_vars() + 1];
        let mut negative = vec![0usize; clauses.num_vars() + 1];
        let mut best: Option<Variable> = None;
        let mut best_count = 0;

        for literal in clauses.clauses().flatten() {
            let var = literal.variable();
            let index = var as usize;
            if literal.polarity() {
                positive[index] += 1;
            } else {
                negative[index] += 1;
            }

            let count = positive[index] + negative[index];
            if count > best_count {
                best_count = count;
                best = Some(var);
            }
        }

        best.map(|var| (var, positive[var as usize] > negative[var as usize]))
    }
}

/// Runtime choice of branching policy.
#[derive(Debug, Clone)]
pub enum VariableSelectionImpls {
    Naive(Naive),
    Random(RandomChoice),
    TwoClause(TwoClause),
    Modal(Modal),
}

impl Default for VariableSelectionImpls {
    fn default() -> Self {
        Self::Naive(Naive)
    }
}

impl VariableSelection for VariableSelectionImpls {
    fn select<C: ClauseSet>(&mut self, clauses: &C) -> Option<(Variable, bool)> {
        match self {
            Self::Naive(s) => s.select(clauses),
            Self::Random(s) => s.select(clauses),
            Self::TwoClause(s) => s.select(clauses),
            Self::Modal(s) => s.select(clauses),
        }
    }
}

/// Branching policies selectable from configuration and the command line.
#[derive(Debug, Clone, PartialEq, Eq, Copy, Hash, Default, ValueEnum)]
pub enum VariableSelectionType {
    /// First literal of the first clause
    #[default]
    Naive,
    /// Uniform clause, then uniform literal
    Random,
    /// First variable confined to two-literal clauses
    TwoClause,
    /// Most frequently occurring variable
    Modal,
}

impl Display for VariableSelectionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Naive => write!(f, "naive"),
            Self::Random => write!(f, "random"),
            Self::TwoClause => write!(f, "two-clause"),
            Self::Modal => write!(f, "modal"),
        }
    }
}

impl VariableSelectionType {
    /// Builds the policy. `seed` only affects the policies that draw random
    /// numbers; without one they seed from the environment.
    #[must_use]
    pub fn to_impl(self, seed: Option<u64>) -> VariableSelectionImpls {
        match self {
            Self::Naive => VariableSelectionImpls::Naive(Naive),
            Self::Random => VariableSelectionImpls::Random(
                seed.map_or_else(RandomChoice::default, RandomChoice::with_seed),
            ),
            Self::TwoClause => VariableSelectionImpls::TwoClause(
                seed.map_or_else(TwoClause::default, TwoClause::with_seed),
            ),
            Self::Modal => VariableSelectionImpls::Modal(Modal),
        }
    }
}
