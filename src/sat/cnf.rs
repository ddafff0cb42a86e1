//! Operations that only make sense on conjunctive normal form.
//!
//! This covers reduction by a partial assignment (the step DPLL repeats at
//! every node), tolerant evaluation, the DNF to CNF distribution, and the
//! uniform random k-CNF generator used for phase-transition experiments.

use crate::sat::assignment::Assignment;
use crate::sat::clause::Clause;
use crate::sat::error::{Error, Result};
use crate::sat::formula::{Cnf, Dnf};
use crate::sat::literal::{Literal, NEGATION};
use itertools::Itertools;

impl Cnf {
    /// Applies `assignment` and returns the reduced formula.
    ///
    /// A clause containing a literal made true by the assignment is dropped.
    /// Otherwise every occurrence of each literal made false is struck, which
    /// may leave an empty clause behind. `self` is not touched; the result
    /// has its own clauses and a copy of the registry.
    #[must_use]
    pub fn reduce(&self, assignment: &Assignment) -> Self {
        let mut reduced = self.empty_like();

        for clause in self {
            let mut clause = clause.clone();
            let mut satisfied = false;

            for (var, value) in assignment.iter() {
                let made_true = Literal::new(var, value);
                if clause.contains(made_true) {
                    satisfied = true;
                } else {
                    clause.remove(&[made_true.negated()]);
                }
            }

            if !satisfied {
                reduced.clauses_mut().push(clause);
            }
        }

        reduced
    }

    /// Tolerant evaluation under a possibly partial assignment.
    ///
    /// A clause counts as satisfied when at least one of its literals is
    /// assigned and true. Unassigned literals count for nothing either way,
    /// so a partial assignment can satisfy the formula, and a clause with no
    /// true literal is unsatisfied even if some of its literals are still
    /// open. An empty formula evaluates to `true`.
    #[must_use]
    pub fn evaluate(&self, assignment: &Assignment) -> bool {
        self.iter().all(|clause| clause.evaluate(assignment))
    }

    /// Converts a DNF into an equivalent CNF by full distribution.
    ///
    /// Each CNF clause picks one literal from every DNF clause, so the result
    /// has as many clauses as the product of the DNF clause lengths. There is
    /// no factoring; keep inputs small. An empty DNF is false and becomes a
    /// single empty clause. A DNF holding an empty conjunction is true and
    /// becomes a formula with no clauses.
    #[must_use]
    pub fn from_dnf(dnf: &Dnf) -> Self {
        let mut cnf = Self::new();
        for name in dnf.vars() {
            cnf.registry_mut().register(name);
        }

        if dnf.is_empty() {
            cnf.clauses_mut().push(Clause::disjunction(std::iter::empty()));
            return cnf;
        }

        let choices = dnf
            .iter()
            .map(|clause| clause.literals().to_vec())
            .multi_cartesian_product();

        for choice in choices {
            cnf.clauses_mut().push(Clause::disjunction(choice));
        }

        cnf
    }

    /// Random k-CNF over `n` variables named `p0..p{n-1}` with `l` clauses.
    ///
    /// Every clause draws `k` distinct variables uniformly without
    /// replacement and negates each one independently with probability 0.5.
    ///
    /// # Errors
    ///
    /// `Error::Generator` if `k > n`.
    pub fn generate(n: usize, l: usize, k: usize) -> Result<Self> {
        Self::generate_with(&mut fastrand::Rng::new(), n, l, k)
    }

    /// [`generate`](Self::generate) with a caller-supplied generator, for
    /// reproducible instances.
    ///
    /// # Errors
    ///
    /// `Error::Generator` if `k > n`.
    pub fn generate_with(rng: &mut fastrand::Rng, n: usize, l: usize, k: usize) -> Result<Self> {
        if k > n {
            return Err(Error::Generator { n, k });
        }

        let mut cnf = Self::new();
        let mut pool: Vec<usize> = (0..n).collect();

        for _ in 0..l {
            // partial Fisher-Yates: the first k slots become a uniform sample
            for i in 0..k {
                let j = rng.usize(i..n);
                pool.swap(i, j);
            }

            let literals = pool[..k]
                .iter()
                .map(|&var| {
                    if rng.bool() {
                        format!("{NEGATION}p{var}")
                    } else {
                        format!("p{var}")
                    }
                })
                .collect_vec();
            cnf.add_clause(literals)?;
        }

        Ok(cnf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::formula::ClauseSet;
    use std::collections::HashSet;

    fn cnf(text: &str) -> Cnf {
        text.parse().unwrap()
    }

    #[test]
    fn test_reduce_drops_satisfied_and_strikes_falsified() {
        let formula = cnf("(p2 v ¬p1 v p0) ∧ (¬p2 v p3) ∧ (¬p2 v ¬p3)");
        let tau = Assignment::from_named(formula.registry(), [("p2", true)]).unwrap();

        let reduced = formula.reduce(&tau);
        assert_eq!(reduced.to_string(), "p3 ∧ ¬p3");
        assert_eq!(formula.len(), 3, "input formula must not change");

        let tau = Assignment::from_named(formula.registry(), [("p3", true)]).unwrap();
        let conflict = reduced.reduce(&tau);
        assert!(conflict.has_empty_clauses());
        assert_eq!(conflict.len(), 1);
    }

    #[test]
    fn test_reduce_strikes_repeated_literals() {
        let formula = cnf("(¬p5 v ¬p5 v p17)");
        let tau = Assignment::from_named(formula.registry(), [("p5", true)]).unwrap();
        assert_eq!(formula.reduce(&tau).to_string(), "p17");
    }

    #[test]
    fn test_reduce_keeps_registry() {
        let formula = cnf("a ∧ (b v c)");
        let tau = Assignment::from_named(formula.registry(), [("a", true), ("b", true)]).unwrap();
        let reduced = formula.reduce(&tau);
        assert!(reduced.is_empty());
        assert_eq!(reduced.vars().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_reduce_by_unit_keeps_agreeing_models() {
        let formula = cnf("(a v b) ∧ ¬b ∧ (¬a v c v b)");
        let forced = formula.get_unit_clauses()[0][0];
        let tau = Assignment::from_named(formula.registry(), [("b", false)]).unwrap();
        assert_eq!(forced, formula.registry().literal("¬b").unwrap());

        let reduced = formula.reduce(&tau);
        assert!(reduced.iter().all(|c| !c.contains(forced)));

        let model = Assignment::from_named(
            formula.registry(),
            [("a", true), ("b", false), ("c", true)],
        )
        .unwrap();
        assert!(formula.evaluate(&model));
        assert!(reduced.evaluate(&model));
    }

    #[test]
    fn test_evaluate_partial_assignment() {
        let formula = cnf("(p0 v p1) ∧ (¬p2 v p3)");
        let partial =
            Assignment::from_named(formula.registry(), [("p0", true), ("p2", false)]).unwrap();
        assert!(formula.evaluate(&partial));

        let open = Assignment::from_named(formula.registry(), [("p0", true)]).unwrap();
        assert!(!formula.evaluate(&open));

        assert!(Cnf::new().evaluate(&Assignment::default()));
    }

    #[test]
    fn test_from_dnf_distributes() {
        let dnf: Dnf = "(a ∧ b) v (¬c ∧ d)".parse().unwrap();
        let converted = Cnf::from_dnf(&dnf);
        assert_eq!(converted.to_string(), "(a v ¬c) ∧ (a v d) ∧ (b v ¬c) ∧ (b v d)");
        assert_eq!(converted.vars().collect::<Vec<_>>(), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_from_dnf_single_clause_and_constants() {
        let dnf: Dnf = "(a ∧ ¬b)".parse().unwrap();
        assert_eq!(Cnf::from_dnf(&dnf).to_string(), "a ∧ ¬b");

        let falsum = Cnf::from_dnf(&Dnf::new());
        assert_eq!(falsum.len(), 1);
        assert!(falsum.has_empty_clauses());

        let verum: Dnf = "() v a".parse().unwrap();
        assert!(Cnf::from_dnf(&verum).is_empty());
    }

    #[test]
    fn test_generate_shape() {
        let formula = Cnf::generate(20, 5, 3).unwrap();
        assert_eq!(formula.len(), 5);
        for clause in &formula {
            assert_eq!(clause.len(), 3);
            let vars: HashSet<_> = clause.iter().map(|l| l.variable()).collect();
            assert_eq!(vars.len(), 3, "variables within a clause must be distinct");
        }
        assert!(formula.vars().all(|name| {
            name.strip_prefix('p')
                .and_then(|n| n.parse::<usize>().ok())
                .is_some_and(|n| n < 20)
        }));
    }

    #[test]
    fn test_generate_is_reproducible() {
        let a = Cnf::generate_with(&mut fastrand::Rng::with_seed(7), 10, 30, 3).unwrap();
        let b = Cnf::generate_with(&mut fastrand::Rng::with_seed(7), 10, 30, 3).unwrap();
        assert_eq!(a.to_string(), b.to_string());
        assert_eq!(a.num_clauses(), 30);
    }

    #[test]
    fn test_generate_polarity_is_balanced() {
        let formula = Cnf::generate_with(&mut fastrand::Rng::with_seed(11), 50, 2000, 3).unwrap();
        let negated = formula
            .iter()
            .flat_map(Clause::iter)
            .filter(|l| l.is_negated())
            .count();
        // 6000 literals; a fair coin stays well inside this band
        assert!((2700..3300).contains(&negated), "negated = {negated}");
    }

    #[test]
    fn test_generate_rejects_k_above_n() {
        assert!(matches!(
            Cnf::generate(2, 1, 3),
            Err(Error::Generator { n: 2, k: 3 })
        ));
        assert_eq!(Cnf::generate(3, 0, 3).unwrap().len(), 0);
    }
}
