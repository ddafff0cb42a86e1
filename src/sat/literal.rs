#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Literals: a registered variable id together with a polarity.
//!
//! A literal is stored exactly like a DIMACS literal, as a non-zero signed
//! integer. The magnitude is the variable's id in a
//! [`VariableRegistry`](crate::sat::registry::VariableRegistry) and the sign
//! is the polarity. Names only exist in the registry; the textual form of a
//! negated literal is the variable name prefixed with [`NEGATION`].

use core::ops::{Neg, Not};
use std::fmt;

/// Prefix marking a negated literal in text, e.g. `¬p1`.
pub const NEGATION: char = '¬';

/// Words the infix syntax reads as connectives. None of them can be a
/// variable name.
pub const RESERVED_NAMES: [&str; 3] = ["v", "∨", "∧"];

/// A variable id. Ids are handed out by the registry starting at 1.
pub type Variable = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Literal(i32);

impl Literal {
    /// Builds the literal of `var` with the given polarity.
    ///
    /// # Panics
    ///
    /// If `var` is 0 or does not fit in an `i32`. Registry ids never do either.
    #[must_use]
    pub fn new(var: Variable, polarity: bool) -> Self {
        assert!(var != 0, "variable ids start at 1");
        let var = i32::try_from(var).expect("literal variable overflowed");

        if polarity { Self(var) } else { Self(-var) }
    }

    /// The positive literal of `var`.
    #[must_use]
    pub fn positive(var: Variable) -> Self {
        Self::new(var, true)
    }

    /// The negated literal of `var`.
    #[must_use]
    pub fn negative(var: Variable) -> Self {
        Self::new(var, false)
    }

    /// Interprets a DIMACS-style signed integer. Returns `None` for 0.
    #[must_use]
    pub const fn from_i32(value: i32) -> Option<Self> {
        if value == 0 { None } else { Some(Self(value)) }
    }

    #[must_use]
    pub const fn to_i32(self) -> i32 {
        self.0
    }

    #[must_use]
    pub const fn variable(self) -> Variable {
        self.0.unsigned_abs()
    }

    /// `true` for a positive literal, `false` for a negated one.
    #[must_use]
    pub const fn polarity(self) -> bool {
        self.0.is_positive()
    }

    #[must_use]
    pub const fn is_negated(self) -> bool {
        !self.polarity()
    }

    #[must_use]
    pub const fn negated(self) -> Self {
        Self(-self.0)
    }

    /// Whether assigning `value` to this literal's variable makes it true.
    #[must_use]
    pub const fn is_true_under(self, value: bool) -> bool {
        self.polarity() == value
    }
}

impl Neg for Literal {
    type Output = Self;

    fn neg(self) -> Self::Output {
        self.negated()
    }
}

impl Not for Literal {
    type Output = Self;

    fn not(self) -> Self::Output {
        self.negated()
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Splits literal text into its variable name and polarity.
///
/// Returns `None` when the name is empty, is one of [`RESERVED_NAMES`], or
/// contains whitespace, parentheses or a further negation sign.
#[must_use]
pub fn split_literal(text: &str) -> Option<(&str, bool)> {
    let (name, polarity) = text
        .strip_prefix(NEGATION)
        .map_or((text, true), |rest| (rest, false));

    let valid = !name.is_empty()
        && !RESERVED_NAMES.contains(&name)
        && !name
            .chars()
            .any(|c| c.is_whitespace() || c == '(' || c == ')' || c == NEGATION);

    valid.then_some((name, polarity))
}
