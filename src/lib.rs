//! This crate decides propositional satisfiability with a chronological DPLL search.
//!
//! Formulas are built clause by clause, parsed from infix text such as
//! `(¬p0 v p1) ∧ p2`, or read from DIMACS files. The solver returns a total
//! satisfying assignment, reports unsatisfiability as `None`, and keeps a
//! timeout distinct from both.

/// The `sat` module holds the formula model, the branching policies, the DPLL
/// search engine and the DIMACS reader and writer.
pub mod sat;
