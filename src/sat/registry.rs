//! The variable registry: a stable mapping from variable names to ids.
//!
//! Ids are assigned sequentially from 1 in the order names are first
//! registered. The registry only ever grows, so an id handed out once keeps
//! meaning the same variable for the lifetime of the formula that owns it.

use crate::sat::error::{Error, Result};
use crate::sat::literal::{split_literal, Literal, Variable, NEGATION};
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableRegistry {
    names: Vec<String>,
    ids: FxHashMap<String, Variable>,
}

impl VariableRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered variables; also the largest id handed out.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Returns the id of `name`, registering it with the next id if needed.
    ///
    /// # Panics
    ///
    /// If more than `i32::MAX` variables are registered.
    pub fn register(&mut self, name: &str) -> Variable {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }

        let id = Variable::try_from(self.names.len() + 1)
            .ok()
            .filter(|&id| i32::try_from(id).is_ok())
            .expect("variable registry overflowed");
        self.names.push(name.to_owned());
        self.ids.insert(name.to_owned(), id);
        id
    }

    #[must_use]
    pub fn id(&self, name: &str) -> Option<Variable> {
        self.ids.get(name).copied()
    }

    #[must_use]
    pub fn name(&self, var: Variable) -> Option<&str> {
        let index = usize::try_from(var).ok()?.checked_sub(1)?;
        self.names.get(index).map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, var: Variable) -> bool {
        var != 0 && (var as usize) <= self.names.len()
    }

    /// Registered names in id order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Registered ids in ascending order.
    pub fn variables(&self) -> impl Iterator<Item = Variable> + use<> {
        #[allow(clippy::cast_possible_truncation)]
        let n = self.names.len() as Variable;
        1..=n
    }

    /// Parses literal text such as `¬p3`, registering the variable if new.
    ///
    /// # Errors
    ///
    /// `Error::InvalidLiteral` if the text is not a well-formed literal.
    pub fn intern(&mut self, text: &str) -> Result<Literal> {
        let (name, polarity) =
            split_literal(text).ok_or_else(|| Error::InvalidLiteral(text.to_owned()))?;
        Ok(Literal::new(self.register(name), polarity))
    }

    /// Parses literal text against the existing registry.
    ///
    /// # Errors
    ///
    /// `Error::InvalidLiteral` for malformed text and `Error::UnknownVariable`
    /// if the name was never registered.
    pub fn literal(&self, text: &str) -> Result<Literal> {
        let (name, polarity) =
            split_literal(text).ok_or_else(|| Error::InvalidLiteral(text.to_owned()))?;
        let id = self
            .id(name)
            .ok_or_else(|| Error::UnknownVariable(name.to_owned()))?;
        Ok(Literal::new(id, polarity))
    }

    /// Renders a literal back to text.
    ///
    /// # Errors
    ///
    /// `Error::UnregisteredId` if the literal's variable is not in the registry.
    pub fn render(&self, literal: Literal) -> Result<String> {
        let name = self
            .name(literal.variable())
            .ok_or_else(|| Error::UnregisteredId(i64::from(literal.to_i32())))?;

        Ok(if literal.polarity() {
            name.to_owned()
        } else {
            format!("{NEGATION}{name}")
        })
    }

    /// Signed-integer encoding of a literal, checked against the registry.
    ///
    /// # Errors
    ///
    /// `Error::UnregisteredId` if the literal's variable is not registered.
    pub fn encode(&self, literal: Literal) -> Result<i32> {
        if self.contains(literal.variable()) {
            Ok(literal.to_i32())
        } else {
            Err(Error::UnregisteredId(i64::from(literal.to_i32())))
        }
    }

    /// Inverse of [`encode`](Self::encode).
    ///
    /// # Errors
    ///
    /// `Error::UnregisteredId` for 0 or for an id the registry never issued.
    pub fn decode(&self, value: i32) -> Result<Literal> {
        Literal::from_i32(value)
            .filter(|lit| self.contains(lit.variable()))
            .ok_or(Error::UnregisteredId(i64::from(value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_is_sequential_and_stable() {
        let mut registry = VariableRegistry::new();
        assert_eq!(registry.register("x"), 1);
        assert_eq!(registry.register("y"), 2);
        assert_eq!(registry.register("x"), 1);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["x", "y"]);
        assert_eq!(registry.variables().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_intern_strips_negation() {
        let mut registry = VariableRegistry::new();
        let neg = registry.intern("¬x").unwrap();
        let pos = registry.intern("x").unwrap();
        assert_eq!(neg, pos.negated());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.render(neg).unwrap(), "¬x");
    }

    #[test]
    fn test_literal_requires_registration() {
        let mut registry = VariableRegistry::new();
        registry.register("a");
        assert!(registry.literal("¬a").is_ok());
        assert!(matches!(
            registry.literal("b"),
            Err(Error::UnknownVariable(name)) if name == "b"
        ));
        assert!(matches!(registry.intern("¬"), Err(Error::InvalidLiteral(_))));
    }

    #[test]
    fn test_encode_decode() {
        let mut registry = VariableRegistry::new();
        let a = registry.intern("¬a").unwrap();
        assert_eq!(registry.encode(a).unwrap(), -1);
        assert_eq!(registry.decode(-1).unwrap(), a);
        assert!(registry.decode(0).is_err());
        assert!(registry.decode(2).is_err());
        assert!(registry.encode(Literal::positive(5)).is_err());
    }
}
