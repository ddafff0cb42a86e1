//! Clauses: ordered literal sequences joined by a single connective.
//!
//! The same type serves both normal forms. In a CNF formula each clause is a
//! disjunction, in a DNF formula each clause is a conjunction. Literal order
//! and duplicates are preserved as built, but [`Clause::is_equivalent`]
//! compares clauses as literal sets.

use crate::sat::assignment::Assignment;
use crate::sat::error::Result;
use crate::sat::literal::Literal;
use crate::sat::registry::VariableRegistry;
use core::ops::Index;
use itertools::Itertools;
use smallvec::SmallVec;
use std::fmt;

/// Inline capacity of a clause before it spills to the heap.
pub const INLINE_LITERALS: usize = 8;

pub type LiteralStorage = SmallVec<[Literal; INLINE_LITERALS]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Connective {
    And,
    Or,
}

impl Connective {
    /// The infix symbol for this connective.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::And => "∧",
            Self::Or => "v",
        }
    }

    /// Whether `token` spells this connective. `∨` is accepted for `Or`.
    #[must_use]
    pub fn matches(self, token: &str) -> bool {
        match self {
            Self::And => token == "∧",
            Self::Or => token == "v" || token == "∨",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Clause {
    literals: LiteralStorage,
    connective: Connective,
}

impl Clause {
    pub fn new(connective: Connective, literals: impl IntoIterator<Item = Literal>) -> Self {
        Self {
            literals: literals.into_iter().collect(),
            connective,
        }
    }

    pub fn disjunction(literals: impl IntoIterator<Item = Literal>) -> Self {
        Self::new(Connective::Or, literals)
    }

    pub fn conjunction(literals: impl IntoIterator<Item = Literal>) -> Self {
        Self::new(Connective::And, literals)
    }

    #[must_use]
    pub const fn connective(&self) -> Connective {
        self.connective
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.literals.len()
    }

    /// No literals left. In a CNF formula this is a contradiction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    /// Exactly one literal left, which forces an assignment.
    #[must_use]
    pub fn is_unit(&self) -> bool {
        self.literals.len() == 1
    }

    #[must_use]
    pub fn literals(&self) -> &[Literal] {
        &self.literals
    }

    pub fn iter(&self) -> impl Iterator<Item = &Literal> {
        self.literals.iter()
    }

    #[must_use]
    pub fn contains(&self, literal: Literal) -> bool {
        self.literals.contains(&literal)
    }

    /// Same literal set, ignoring order, repetition and connective.
    #[must_use]
    pub fn is_equivalent(&self, other: &Self) -> bool {
        let ours = self.literals.iter().sorted().dedup();
        let theirs = other.literals.iter().sorted().dedup();
        ours.eq(theirs)
    }

    /// Deletes every occurrence of each given literal and returns how many
    /// literals were removed.
    pub fn remove(&mut self, literals: &[Literal]) -> usize {
        let before = self.literals.len();
        self.literals.retain(|lit| !literals.contains(lit));
        before - self.literals.len()
    }

    pub(crate) fn push(&mut self, literal: Literal) {
        self.literals.push(literal);
    }

    /// Tolerant evaluation under a possibly partial assignment.
    ///
    /// Only assigned literals count. A disjunction holds if some literal is
    /// assigned and true; a conjunction holds if every literal is.
    #[must_use]
    pub fn evaluate(&self, assignment: &Assignment) -> bool {
        let is_true = |lit: &Literal| assignment.literal_value(*lit) == Some(true);
        match self.connective {
            Connective::Or => self.literals.iter().any(is_true),
            Connective::And => self.literals.iter().all(is_true),
        }
    }

    /// Signed-integer encoding of the clause.
    ///
    /// # Errors
    ///
    /// `Error::UnregisteredId` if a literal's variable is not in `registry`.
    pub fn to_dimacs(&self, registry: &VariableRegistry) -> Result<Vec<i32>> {
        self.literals.iter().map(|&lit| registry.encode(lit)).collect()
    }

    /// Decodes a signed-integer clause.
    ///
    /// # Errors
    ///
    /// `Error::UnregisteredId` for a zero or an id the registry never issued.
    pub fn from_dimacs(
        values: &[i32],
        connective: Connective,
        registry: &VariableRegistry,
    ) -> Result<Self> {
        let literals: LiteralStorage = values
            .iter()
            .map(|&value| registry.decode(value))
            .collect::<Result<_>>()?;

        Ok(Self {
            literals,
            connective,
        })
    }

    /// Formats the clause with variable names from `registry`.
    #[must_use]
    pub const fn display<'a>(&'a self, registry: &'a VariableRegistry) -> DisplayClause<'a> {
        DisplayClause {
            clause: self,
            registry,
        }
    }
}

impl Index<usize> for Clause {
    type Output = Literal;

    fn index(&self, index: usize) -> &Self::Output {
        &self.literals[index]
    }
}

impl<'a> IntoIterator for &'a Clause {
    type Item = &'a Literal;
    type IntoIter = std::slice::Iter<'a, Literal>;

    fn into_iter(self) -> Self::IntoIter {
        self.literals.iter()
    }
}

/// Infix rendering of a clause: unit clauses bare, others parenthesised.
pub struct DisplayClause<'a> {
    clause: &'a Clause,
    registry: &'a VariableRegistry,
}

impl fmt::Display for DisplayClause<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let separator = format!(" {} ", self.clause.connective.symbol());
        let body = self
            .clause
            .iter()
            .map(|&lit| {
                self.registry
                    .render(lit)
                    .unwrap_or_else(|_| format!("#{}", lit.to_i32()))
            })
            .join(&separator);

        if self.clause.is_unit() {
            write!(f, "{body}")
        } else {
            write!(f, "({body})")
        }
    }
}
