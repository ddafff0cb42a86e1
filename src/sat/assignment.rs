//! Variable assignments indexed by registry id.
//!
//! An [`Assignment`] may be partial. During search it is extended one
//! variable at a time; the solver hands back a total assignment on success.
//! Conversions to and from name-keyed maps go through a
//! [`VariableRegistry`].

use crate::sat::error::{Error, Result};
use crate::sat::literal::{Literal, Variable};
use crate::sat::registry::VariableRegistry;
use core::ops::Index;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Copy, Default, Hash, PartialOrd, Ord)]
pub enum VarState {
    #[default]
    Unassigned,
    Assigned(bool),
}

impl VarState {
    #[must_use]
    pub const fn is_assigned(self) -> bool {
        matches!(self, Self::Assigned(_))
    }

    #[must_use]
    pub const fn is_unassigned(self) -> bool {
        !self.is_assigned()
    }

    #[must_use]
    pub const fn value(self) -> Option<bool> {
        match self {
            Self::Assigned(b) => Some(b),
            Self::Unassigned => None,
        }
    }
}

/// Truth values by variable id. Slot 0 is unused so ids index directly.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Assignment(Vec<VarState>);

impl Index<Variable> for Assignment {
    type Output = VarState;

    fn index(&self, index: Variable) -> &Self::Output {
        self.0
            .get(index as usize)
            .unwrap_or(&VarState::Unassigned)
    }
}

impl Assignment {
    /// An empty assignment with room for ids `1..=num_vars`.
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self(vec![VarState::Unassigned; num_vars + 1])
    }

    /// Every variable of the registry set to `value`.
    #[must_use]
    pub fn uniform(num_vars: usize, value: bool) -> Self {
        let mut states = vec![VarState::Assigned(value); num_vars + 1];
        states[0] = VarState::Unassigned;
        Self(states)
    }

    /// Highest id this assignment has room for.
    #[must_use]
    pub fn num_vars(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    /// Sets `var`, growing the assignment if the id is beyond its end.
    ///
    /// Returns the previous state of the variable.
    pub fn assign(&mut self, var: Variable, value: bool) -> VarState {
        self.set_state(var, VarState::Assigned(value))
    }

    pub fn unassign(&mut self, var: Variable) -> VarState {
        self.set_state(var, VarState::Unassigned)
    }

    pub(crate) fn set_state(&mut self, var: Variable, state: VarState) -> VarState {
        let index = var as usize;
        if index >= self.0.len() {
            self.0.resize(index + 1, VarState::Unassigned);
        }
        std::mem::replace(&mut self.0[index], state)
    }

    #[must_use]
    pub fn var_value(&self, var: Variable) -> Option<bool> {
        self[var].value()
    }

    /// The literal's truth value, or `None` if its variable is unassigned.
    #[must_use]
    pub fn literal_value(&self, literal: Literal) -> Option<bool> {
        self.var_value(literal.variable())
            .map(|value| literal.is_true_under(value))
    }

    /// Assigned variables and their values in ascending id order.
    #[allow(clippy::cast_possible_truncation)]
    pub fn iter(&self) -> impl Iterator<Item = (Variable, bool)> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(i, state)| state.value().map(|value| (i as Variable, value)))
    }

    #[must_use]
    pub fn num_assigned(&self) -> usize {
        self.0.iter().filter(|s| s.is_assigned()).count()
    }

    /// Positive literals for true variables and negative ones for false
    /// variables, the usual model line of SAT competition output.
    #[must_use]
    pub fn to_literals(&self) -> Vec<Literal> {
        self.iter()
            .map(|(var, value)| Literal::new(var, value))
            .collect()
    }

    /// Name-keyed view of the assigned variables.
    ///
    /// # Errors
    ///
    /// `Error::UnregisteredId` if a variable is assigned that `registry` does
    /// not know.
    pub fn to_named(&self, registry: &VariableRegistry) -> Result<BTreeMap<String, bool>> {
        self.iter()
            .map(|(var, value)| {
                registry
                    .name(var)
                    .map(|name| (name.to_owned(), value))
                    .ok_or(Error::UnregisteredId(i64::from(var)))
            })
            .collect()
    }

    /// Builds an assignment from `(name, value)` pairs.
    ///
    /// # Errors
    ///
    /// `Error::UnknownVariable` for a name `registry` has never seen.
    pub fn from_named<'a>(
        registry: &VariableRegistry,
        values: impl IntoIterator<Item = (&'a str, bool)>,
    ) -> Result<Self> {
        let mut assignment = Self::new(registry.len());
        for (name, value) in values {
            let var = registry
                .id(name)
                .ok_or_else(|| Error::UnknownVariable(name.to_owned()))?;
            assignment.assign(var, value);
        }
        Ok(assignment)
    }
}
