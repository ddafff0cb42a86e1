#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Working state of a DPLL search.
//!
//! The formula is copied once into a clause arena indexed by clause id.
//! Assigning a literal marks the clauses it satisfies and strikes its
//! complement from the others, recording each change on a [`Trail`].
//! [`SearchState::backtrack`] reverses those changes, so every search node
//! sees the same clauses, in the same order, as if the formula had been
//! reduced into a fresh copy at that node.

use crate::sat::assignment::Assignment;
use crate::sat::clause::LiteralStorage;
use crate::sat::formula::{ClauseSet, Cnf};
use crate::sat::literal::Literal;
use crate::sat::trail::{Checkpoint, Step, Trail};
use bit_vec::BitVec;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchState {
    clauses: Vec<LiteralStorage>,
    satisfied: BitVec,
    assignment: Assignment,
    trail: Trail,
    num_vars: usize,
    live: usize,
    empty: usize,
}

impl SearchState {
    /// Loads `cnf` into the arena with every registered variable set to
    /// `true`. Variables the search never decides keep that value.
    #[must_use]
    pub fn new(cnf: &Cnf) -> Self {
        let clauses: Vec<LiteralStorage> = cnf
            .iter()
            .map(|c| c.literals().iter().copied().collect())
            .collect();
        let empty = clauses.iter().filter(|c| c.is_empty()).count();

        Self {
            satisfied: BitVec::from_elem(clauses.len(), false),
            live: clauses.len(),
            empty,
            clauses,
            assignment: Assignment::uniform(cnf.num_vars(), true),
            trail: Trail::with_capacity(cnf.num_vars() * 4),
            num_vars: cnf.num_vars(),
        }
    }

    #[must_use]
    pub const fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    pub fn into_assignment(self) -> Assignment {
        self.assignment
    }

    #[must_use]
    pub const fn trail(&self) -> &Trail {
        &self.trail
    }

    /// No clauses left: the formula is satisfied.
    #[must_use]
    pub const fn is_solved(&self) -> bool {
        self.live == 0
    }

    /// Some remaining clause has had every literal struck.
    #[must_use]
    pub const fn has_empty_clause(&self) -> bool {
        self.empty > 0
    }

    /// The literal of the first remaining unit clause, in clause order.
    #[must_use]
    pub fn first_unit(&self) -> Option<Literal> {
        self.live_clauses()
            .find(|(_, c)| c.len() == 1)
            .map(|(_, c)| c[0])
    }

    #[must_use]
    pub fn checkpoint(&self) -> Checkpoint {
        self.trail.checkpoint()
    }

    /// Makes `literal` true and reduces the remaining clauses by it.
    ///
    /// Returns the number of clauses satisfied and the number of literal
    /// occurrences struck.
    pub fn assign(&mut self, literal: Literal) -> (usize, usize) {
        let var = literal.variable();
        let previous = self.assignment.assign(var, literal.polarity());
        self.trail.push(Step::Assigned { var, previous });

        let falsified = literal.negated();
        let mut satisfied = 0;
        let mut struck = 0;

        for index in 0..self.clauses.len() {
            if self.satisfied[index] {
                continue;
            }

            if self.clauses[index].contains(&literal) {
                self.satisfied.set(index, true);
                self.live -= 1;
                self.trail.push(Step::Satisfied { clause: index });
                satisfied += 1;
                continue;
            }

            let clause = &mut self.clauses[index];
            let mut removed = 0;
            let mut position = 0;
            while position < clause.len() {
                if clause[position] == falsified {
                    clause.remove(position);
                    self.trail.push(Step::Struck {
                        clause: index,
                        position,
                        literal: falsified,
                    });
                    removed += 1;
                } else {
                    position += 1;
                }
            }

            if removed > 0 && clause.is_empty() {
                self.empty += 1;
            }
            struck += removed;
        }

        (satisfied, struck)
    }

    /// Reverses every change made since `mark`.
    pub fn backtrack(&mut self, mark: Checkpoint) {
        while let Some(step) = self.trail.pop_to(mark) {
            match step {
                Step::Assigned { var, previous } => {
                    self.assignment.set_state(var, previous);
                }
                Step::Satisfied { clause } => {
                    self.satisfied.set(clause, false);
                    self.live += 1;
                }
                Step::Struck {
                    clause,
                    position,
                    literal,
                } => {
                    let literals = &mut self.clauses[clause];
                    if literals.is_empty() {
                        self.empty -= 1;
                    }
                    literals.insert(position, literal);
                }
            }
        }
    }

    fn live_clauses(&self) -> impl Iterator<Item = (usize, &[Literal])> {
        self.clauses
            .iter()
            .enumerate()
            .filter(|&(i, _)| !self.satisfied[i])
            .map(|(i, c)| (i, c.as_slice()))
    }
}

impl ClauseSet for SearchState {
    fn clauses(&self) -> impl Iterator<Item = &[Literal]> {
        self.live_clauses().map(|(_, c)| c)
    }

    fn num_clauses(&self) -> usize {
        self.live
    }

    fn num_vars(&self) -> usize {
        self.num_vars
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::assignment::VarState;

    fn state(text: &str) -> (Cnf, SearchState) {
        let cnf: Cnf = text.parse().unwrap();
        let state = SearchState::new(&cnf);
        (cnf, state)
    }

    fn render(cnf: &Cnf, state: &SearchState) -> Vec<Vec<String>> {
        state
            .clauses()
            .map(|c| c.iter().map(|&l| cnf.registry().render(l).unwrap()).collect())
            .collect()
    }

    #[test]
    fn test_new_seeds_true() {
        let (_, state) = state("(a v ¬b) ∧ c");
        assert_eq!(state.num_clauses(), 2);
        assert_eq!(state.num_vars(), 3);
        assert_eq!(state.assignment().num_assigned(), 3);
        assert_eq!(state.assignment().var_value(2), Some(true));
        assert!(!state.is_solved());
        assert!(!state.has_empty_clause());
    }

    #[test]
    fn test_assign_matches_reduce() {
        let (cnf, mut state) = state("(p2 v ¬p1 v p0) ∧ (¬p2 v p3) ∧ (¬p2 v ¬p3)");
        let p2 = cnf.registry().literal("p2").unwrap();

        assert_eq!(state.assign(p2), (1, 2));
        assert_eq!(
            render(&cnf, &state),
            vec![vec!["p3".to_owned()], vec!["¬p3".to_owned()]]
        );

        let tau = Assignment::from_named(cnf.registry(), [("p2", true)]).unwrap();
        assert_eq!(cnf.reduce(&tau).to_string(), "p3 ∧ ¬p3");
        assert_eq!(state.first_unit(), cnf.registry().literal("p3").ok());

        let steps: Vec<Step> = state.trail().iter().copied().collect();
        assert_eq!(
            steps,
            vec![
                Step::Assigned {
                    var: p2.variable(),
                    previous: VarState::Assigned(true),
                },
                Step::Satisfied { clause: 0 },
                Step::Struck {
                    clause: 1,
                    position: 0,
                    literal: p2.negated(),
                },
                Step::Struck {
                    clause: 2,
                    position: 0,
                    literal: p2.negated(),
                },
            ]
        );
    }

    #[test]
    fn test_backtrack_restores_order_and_values() {
        let (cnf, mut state) = state("(¬a v b v ¬a v c) ∧ (a v d) ∧ (¬c v ¬a)");
        let before = render(&cnf, &state);
        let mark = state.checkpoint();

        state.assign(cnf.registry().literal("a").unwrap());
        assert_eq!(render(&cnf, &state), vec![vec!["b", "c"], vec!["¬c"]]);
        assert_eq!(state.assignment().var_value(1), Some(true));

        state.assign(cnf.registry().literal("¬b").unwrap());
        assert_eq!(state.assignment().var_value(2), Some(false));

        state.backtrack(mark);
        assert_eq!(render(&cnf, &state), before);
        assert_eq!(state.assignment(), &Assignment::uniform(4, true));
        assert!(state.trail().is_empty());
    }

    #[test]
    fn test_empty_clause_tracking() {
        let (cnf, mut state) = state("(a v a) ∧ b");
        let mark = state.checkpoint();

        state.assign(cnf.registry().literal("¬a").unwrap());
        assert!(state.has_empty_clause());
        assert_eq!(state.num_clauses(), 2);

        state.backtrack(mark);
        assert!(!state.has_empty_clause());

        state.assign(cnf.registry().literal("b").unwrap());
        state.assign(cnf.registry().literal("a").unwrap());
        assert!(state.is_solved());
    }

    #[test]
    fn test_initial_empty_clause() {
        let (_, state) = state("a ∧ ()");
        assert!(state.has_empty_clause());
        assert_eq!(state.first_unit(), Some(Literal::positive(1)));
    }
}
