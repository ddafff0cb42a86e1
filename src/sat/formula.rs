//! Clausal formulas in conjunctive or disjunctive normal form.
//!
//! A [`Formula`] is an ordered list of [`Clause`]s plus the
//! [`VariableRegistry`] naming their variables. The normal form is a type
//! parameter: [`Cnf`] joins disjunctive clauses with `∧`, [`Dnf`] joins
//! conjunctive clauses with `v`.
//!
//! Formulas have a canonical infix text form. Clauses are joined by the
//! formula connective, non-unit clauses are parenthesised with their literals
//! joined by the clause connective, and negation is written as a `¬` prefix:
//!
//! ```text
//! (¬p11 v p4 v ¬p0) ∧ (¬p5 v p17) ∧ p3
//! ```
//!
//! Parsing that text and rendering it again gives back the same string for
//! any formula built with [`Formula::add_clause`].

use crate::sat::clause::{Clause, Connective};
use crate::sat::error::{Error, Result};
use crate::sat::literal::{split_literal, Literal, Variable};
use crate::sat::registry::VariableRegistry;
use core::ops::Index;
use itertools::Itertools;
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

/// Which connective joins literals and which joins clauses.
pub trait NormalForm {
    /// Connective between the literals of one clause.
    const CLAUSE: Connective;
    /// Connective between clauses.
    const FORMULA: Connective;
}

/// Conjunction of disjunctions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Conjunctive;

/// Disjunction of conjunctions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Disjunctive;

impl NormalForm for Conjunctive {
    const CLAUSE: Connective = Connective::Or;
    const FORMULA: Connective = Connective::And;
}

impl NormalForm for Disjunctive {
    const CLAUSE: Connective = Connective::And;
    const FORMULA: Connective = Connective::Or;
}

pub type Cnf = Formula<Conjunctive>;
pub type Dnf = Formula<Disjunctive>;

/// Read access to the clauses of a formula still under consideration.
///
/// Implemented by [`Formula`] itself and by the solver's working state, so
/// that branching heuristics see the same view either way.
pub trait ClauseSet {
    /// Remaining clauses, in their original order.
    fn clauses(&self) -> impl Iterator<Item = &[Literal]>;

    fn num_clauses(&self) -> usize;

    /// Size of the variable registry behind the clauses.
    fn num_vars(&self) -> usize;

    /// All registered variables in registry order, including ones that no
    /// longer occur in any clause.
    #[allow(clippy::cast_possible_truncation)]
    fn variables(&self) -> impl Iterator<Item = Variable> {
        (1..=self.num_vars()).map(|v| v as Variable)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formula<N: NormalForm> {
    clauses: Vec<Clause>,
    registry: VariableRegistry,
    form: PhantomData<N>,
}

impl<N: NormalForm> Default for Formula<N> {
    fn default() -> Self {
        Self {
            clauses: Vec::new(),
            registry: VariableRegistry::new(),
            form: PhantomData,
        }
    }
}

impl<N: NormalForm> Formula<N> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a clause built from literal text such as `["p0", "¬p1"]`.
    ///
    /// Variables not seen before are registered with the next free id, in
    /// the order they appear.
    ///
    /// # Errors
    ///
    /// `Error::InvalidLiteral` if any literal text is malformed. The formula
    /// is left unchanged in that case.
    pub fn add_clause<S: AsRef<str>>(&mut self, literals: impl IntoIterator<Item = S>) -> Result<()> {
        let texts: Vec<S> = literals.into_iter().collect();
        if let Some(bad) = texts
            .iter()
            .find(|text| split_literal(text.as_ref()).is_none())
        {
            return Err(Error::InvalidLiteral(bad.as_ref().to_owned()));
        }

        let mut clause = Clause::new(N::CLAUSE, std::iter::empty());
        for text in &texts {
            clause.push(self.registry.intern(text.as_ref())?);
        }
        self.clauses.push(clause);
        Ok(())
    }

    /// Appends a clause over already registered variables.
    ///
    /// The clause's connective is replaced by this formula's clause
    /// connective.
    ///
    /// # Errors
    ///
    /// `Error::UnregisteredId` if a literal's variable is not registered.
    pub fn push_clause(&mut self, clause: Clause) -> Result<()> {
        for &lit in clause.iter() {
            self.registry.encode(lit)?;
        }
        self.clauses.push(Clause::new(N::CLAUSE, clause.iter().copied()));
        Ok(())
    }

    /// Appends every clause of `other`, matching variables by name.
    pub fn append(&mut self, other: &Self) {
        for clause in &other.clauses {
            let mapped = clause.iter().filter_map(|&lit| {
                other
                    .registry
                    .name(lit.variable())
                    .map(|name| Literal::new(self.registry.register(name), lit.polarity()))
            });
            let clause = Clause::new(N::CLAUSE, mapped.collect::<Vec<_>>());
            self.clauses.push(clause);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Clause> {
        self.clauses.iter()
    }

    #[must_use]
    pub const fn registry(&self) -> &VariableRegistry {
        &self.registry
    }

    /// Registered variable names in id order.
    pub fn vars(&self) -> impl Iterator<Item = &str> {
        self.registry.names()
    }

    #[must_use]
    pub fn num_vars(&self) -> usize {
        self.registry.len()
    }

    #[must_use]
    pub fn has_empty_clauses(&self) -> bool {
        self.clauses.iter().any(Clause::is_empty)
    }

    #[must_use]
    pub fn has_unit_clauses(&self) -> bool {
        self.clauses.iter().any(Clause::is_unit)
    }

    /// All unit clauses in clause order.
    #[must_use]
    pub fn get_unit_clauses(&self) -> Vec<&Clause> {
        self.clauses.iter().filter(|c| c.is_unit()).collect()
    }

    /// Drops every clause equivalent to an earlier one and returns how many
    /// were dropped. Quadratic in the number of clauses.
    pub fn simplify(&mut self) -> usize {
        let mut kept: Vec<Clause> = Vec::with_capacity(self.clauses.len());
        let mut removed = 0;

        for clause in self.clauses.drain(..) {
            if kept.iter().any(|k| k.is_equivalent(&clause)) {
                removed += 1;
            } else {
                kept.push(clause);
            }
        }

        self.clauses = kept;
        log::info!("simplify removed {removed} clauses");
        removed
    }

    /// Clauses as signed-integer lists, using registry ids.
    ///
    /// # Errors
    ///
    /// Never fails for a formula built through its own methods; a literal
    /// outside the registry is reported as `Error::UnregisteredId`.
    pub fn encode(&self) -> Result<Vec<Vec<i32>>> {
        self.clauses
            .iter()
            .map(|c| c.to_dimacs(&self.registry))
            .collect()
    }

    pub(crate) fn clauses_mut(&mut self) -> &mut Vec<Clause> {
        &mut self.clauses
    }

    pub(crate) fn registry_mut(&mut self) -> &mut VariableRegistry {
        &mut self.registry
    }

    /// Same registry, no clauses.
    pub(crate) fn empty_like(&self) -> Self {
        Self {
            clauses: Vec::new(),
            registry: self.registry.clone(),
            form: PhantomData,
        }
    }
}

impl<N: NormalForm> ClauseSet for Formula<N> {
    fn clauses(&self) -> impl Iterator<Item = &[Literal]> {
        self.clauses.iter().map(Clause::literals)
    }

    fn num_clauses(&self) -> usize {
        self.clauses.len()
    }

    fn num_vars(&self) -> usize {
        self.registry.len()
    }
}

impl<N: NormalForm> Index<usize> for Formula<N> {
    type Output = Clause;

    fn index(&self, index: usize) -> &Self::Output {
        &self.clauses[index]
    }
}

impl<'a, N: NormalForm> IntoIterator for &'a Formula<N> {
    type Item = &'a Clause;
    type IntoIter = std::slice::Iter<'a, Clause>;

    fn into_iter(self) -> Self::IntoIter {
        self.clauses.iter()
    }
}

impl<N: NormalForm> fmt::Display for Formula<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let separator = format!(" {} ", N::FORMULA.symbol());
        let text = self
            .clauses
            .iter()
            .map(|c| c.display(&self.registry))
            .join(&separator);
        write!(f, "{text}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token<'a> {
    Open,
    Close,
    Word(&'a str),
}

fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut start = None;

    for (i, c) in text.char_indices() {
        let delimiter = c.is_whitespace() || c == '(' || c == ')';
        if delimiter {
            if let Some(s) = start.take() {
                tokens.push(Token::Word(&text[s..i]));
            }
            match c {
                '(' => tokens.push(Token::Open),
                ')' => tokens.push(Token::Close),
                _ => {}
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }

    if let Some(s) = start {
        tokens.push(Token::Word(&text[s..]));
    }
    tokens
}

struct Parser<'t, 'a, N: NormalForm> {
    tokens: &'t [Token<'a>],
    position: usize,
    formula: Formula<N>,
}

impl<'t, 'a, N: NormalForm> Parser<'t, 'a, N> {
    fn error(&self, message: impl Into<String>) -> Error {
        Error::Syntax {
            position: self.position,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<&'t Token<'a>> {
        self.tokens.get(self.position)
    }

    fn literal(&self, word: &str) -> Result<()> {
        if N::CLAUSE.matches(word) || N::FORMULA.matches(word) {
            return Err(self.error(format!("expected a literal, found connective '{word}'")));
        }
        Ok(())
    }

    fn clause(&mut self) -> Result<()> {
        match self.peek().cloned() {
            Some(Token::Word(word)) => {
                self.literal(word)?;
                self.position += 1;
                self.formula
                    .add_clause([word])
                    .map_err(|_| self.error(format!("invalid literal '{word}'")))
            }
            Some(Token::Open) => {
                self.position += 1;
                let mut words = Vec::new();
                loop {
                    match self.peek().cloned() {
                        Some(Token::Close) if words.is_empty() => break,
                        Some(Token::Word(word)) => {
                            self.literal(word)?;
                            words.push(word);
                            self.position += 1;
                        }
                        _ => return Err(self.error("expected a literal")),
                    }
                    match self.peek() {
                        Some(Token::Close) => break,
                        Some(Token::Word(w)) if N::CLAUSE.matches(w) => self.position += 1,
                        _ => {
                            return Err(self.error(format!(
                                "expected '{}' or ')'",
                                N::CLAUSE.symbol()
                            )));
                        }
                    }
                }
                self.position += 1;
                self.formula
                    .add_clause(words)
                    .map_err(|e| self.error(e.to_string()))
            }
            _ => Err(self.error("expected a clause")),
        }
    }

    fn formula(mut self) -> Result<Formula<N>> {
        if self.tokens.is_empty() {
            return Ok(self.formula);
        }

        self.clause()?;
        while let Some(token) = self.peek() {
            match token {
                Token::Word(w) if N::FORMULA.matches(w) => self.position += 1,
                _ => {
                    return Err(self.error(format!("expected '{}'", N::FORMULA.symbol())));
                }
            }
            self.clause()?;
        }
        Ok(self.formula)
    }
}

impl<N: NormalForm> FromStr for Formula<N> {
    type Err = Error;

    /// Parses the canonical infix form.
    fn from_str(text: &str) -> Result<Self> {
        let tokens = tokenize(text);
        Parser {
            tokens: &tokens,
            position: 0,
            formula: Self::new(),
        }
        .formula()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CNF_STR: &str = "(¬p11 v p4 v ¬p0) ∧ (¬p5 v ¬p5 v p17) ∧ (p6 v ¬p1 v ¬p12) ∧ (p8 v p0 v ¬p17) ∧ (p12 v ¬p8 v p16)";

    #[test]
    fn test_add_clause_registers_in_first_seen_order() {
        let mut cnf = Cnf::new();
        cnf.add_clause(["¬b", "a"]).unwrap();
        cnf.add_clause(["a", "c"]).unwrap();

        assert_eq!(cnf.vars().collect::<Vec<_>>(), vec!["b", "a", "c"]);
        assert_eq!(cnf.registry().id("c"), Some(3));
        assert_eq!(cnf[0][0], Literal::negative(1));
        assert_eq!(cnf[0].connective(), Connective::Or);
    }

    #[test]
    fn test_add_clause_rejects_bad_literal_atomically() {
        let mut cnf = Cnf::new();
        assert!(cnf.add_clause(["a", "¬"]).is_err());
        assert!(cnf.is_empty());
        assert_eq!(cnf.num_vars(), 0);
    }

    #[test]
    fn test_registry_is_monotonic() {
        let mut cnf = Cnf::new();
        cnf.add_clause(["x", "y"]).unwrap();
        let before: Vec<_> = cnf.vars().map(str::to_owned).collect();
        cnf.add_clause(["¬y", "z"]).unwrap();
        cnf.simplify();

        let after: Vec<_> = cnf.vars().collect();
        assert_eq!(&after[..before.len()], before.as_slice());
        assert_eq!(cnf.registry().id("x"), Some(1));
        assert_eq!(cnf.registry().id("y"), Some(2));
    }

    #[test]
    fn test_unit_and_empty_queries() {
        let mut cnf = Cnf::new();
        cnf.add_clause(["a", "b"]).unwrap();
        cnf.add_clause(["¬c"]).unwrap();
        cnf.add_clause(["b"]).unwrap();
        assert!(cnf.has_unit_clauses());
        assert!(!cnf.has_empty_clauses());

        let units = cnf.get_unit_clauses();
        assert_eq!(units.len(), 2);
        assert_eq!(units[0][0], cnf.registry().literal("¬c").unwrap());

        cnf.add_clause(Vec::<&str>::new()).unwrap();
        assert!(cnf.has_empty_clauses());
    }

    #[test]
    fn test_simplify_removes_equivalent_clauses() {
        let mut cnf = Cnf::new();
        cnf.add_clause(["a", "¬b"]).unwrap();
        cnf.add_clause(["¬b", "a", "a"]).unwrap();
        cnf.add_clause(["b"]).unwrap();
        cnf.add_clause(["a", "¬b"]).unwrap();

        assert_eq!(cnf.simplify(), 2);
        assert_eq!(cnf.to_string(), "(a v ¬b) ∧ b");
    }

    #[test]
    fn test_from_str_round_trip() {
        let cnf: Cnf = CNF_STR.parse().unwrap();
        assert_eq!(cnf.len(), 5);
        assert_eq!(cnf.to_string(), CNF_STR);
    }

    #[test]
    fn test_from_str_units_and_empty() {
        let cnf: Cnf = "p0 ∧ ¬p1 ∧ ()".parse().unwrap();
        assert_eq!(cnf.len(), 3);
        assert!(cnf[0].is_unit());
        assert!(cnf[2].is_empty());
        assert_eq!(cnf.to_string(), "p0 ∧ ¬p1 ∧ ()");

        let empty: Cnf = "".parse().unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.to_string(), "");
    }

    #[test]
    fn test_dnf_text() {
        let dnf: Dnf = "(a ∧ ¬b) v c".parse().unwrap();
        assert_eq!(dnf.len(), 2);
        assert_eq!(dnf[0].connective(), Connective::And);
        assert_eq!(dnf.to_string(), "(a ∧ ¬b) v c");
    }

    #[test]
    fn test_from_str_errors() {
        assert!(matches!("(a v b".parse::<Cnf>(), Err(Error::Syntax { .. })));
        assert!(matches!("a b".parse::<Cnf>(), Err(Error::Syntax { .. })));
        assert!(matches!("(a ∧ b)".parse::<Cnf>(), Err(Error::Syntax { .. })));
        assert!(matches!("a ∧".parse::<Cnf>(), Err(Error::Syntax { .. })));
        assert!(matches!("(a v v)".parse::<Cnf>(), Err(Error::Syntax { .. })));
    }

    #[test]
    fn test_append_maps_by_name() {
        let mut first = Cnf::new();
        first.add_clause(["a", "b"]).unwrap();
        let mut second = Cnf::new();
        second.add_clause(["¬b", "c"]).unwrap();

        first.append(&second);
        assert_eq!(first.len(), 2);
        assert_eq!(first.num_vars(), 3);
        assert_eq!(first.to_string(), "(a v b) ∧ (¬b v c)");
    }

    #[test]
    fn test_encode_uses_registry_ids() {
        let cnf: Cnf = "(¬x v y) ∧ x".parse().unwrap();
        assert_eq!(cnf.encode().unwrap(), vec![vec![-1, 2], vec![1]]);
    }

    #[test]
    fn test_push_clause_checks_registry() {
        let mut cnf: Cnf = "x".parse().unwrap();
        assert!(cnf.push_clause(Clause::conjunction([Literal::negative(1)])).is_ok());
        assert_eq!(cnf[1].connective(), Connective::Or);
        assert!(cnf.push_clause(Clause::disjunction([Literal::positive(2)])).is_err());
    }

    #[test]
    fn test_add_clause_rejects_connective_names() {
        let mut cnf = Cnf::new();
        for word in ["v", "∨", "∧", "¬v", "¬∧"] {
            assert!(
                matches!(cnf.add_clause([word, "a"]), Err(Error::InvalidLiteral(_))),
                "{word}"
            );
            assert!(matches!(cnf.add_clause([word]), Err(Error::InvalidLiteral(_))), "{word}");
        }
        assert!(cnf.is_empty());
        assert_eq!(cnf.num_vars(), 0);

        let mut dnf = Dnf::new();
        assert!(dnf.add_clause(["∧"]).is_err());
    }

    fn random_formula<N: NormalForm>(rng: &mut fastrand::Rng) -> Formula<N> {
        const NAMES: [&str; 8] = ["a", "p0", "p17", "vv", "v1", "av", "x_y", "∧∧"];

        let mut formula = Formula::new();
        for _ in 0..rng.usize(0..6) {
            let clause: Vec<String> = (0..rng.usize(0..4))
                .map(|_| {
                    let name = NAMES[rng.usize(..NAMES.len())];
                    if rng.bool() {
                        name.to_owned()
                    } else {
                        format!("¬{name}")
                    }
                })
                .collect();
            formula.add_clause(clause).unwrap();
        }
        formula
    }

    #[test]
    fn test_random_formulas_survive_render_and_parse() {
        let mut rng = fastrand::Rng::with_seed(41);
        for _ in 0..300 {
            let cnf: Cnf = random_formula(&mut rng);
            let text = cnf.to_string();
            let parsed: Cnf = text.parse().unwrap_or_else(|e| panic!("{text}: {e}"));
            assert_eq!(parsed, cnf, "{text}");

            let dnf: Dnf = random_formula(&mut rng);
            let text = dnf.to_string();
            let parsed: Dnf = text.parse().unwrap_or_else(|e| panic!("{text}: {e}"));
            assert_eq!(parsed, dnf, "{text}");
        }
    }
}
