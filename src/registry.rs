//! Atom registry: symbolic atom name ↔ search variable.
//!
//! The [`AtomRegistry`] is built once, when the search engine announces its
//! symbolic atoms, and never changes afterwards. Each [`Atom`] keeps only a
//! copyable [`Var`] handle into the engine's variable space; the engine owns
//! the variable and its value.

use std::collections::HashMap;

use serde::Serialize;

use crate::solver::{AtomBinding, Var};

/// A ground atom known to the search engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Atom {
    name: String,
    #[serde(skip)]
    var: Var,
}

impl Atom {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn var(&self) -> Var {
        self.var
    }
}

/// Immutable, ordered mapping from atom names to engine variables.
#[derive(Clone, Default)]
pub struct AtomRegistry {
    atoms: Vec<Atom>,
    by_name: HashMap<String, usize>,
}

impl AtomRegistry {
    /// Build the registry from the engine's atom announcements.
    ///
    /// Order is preserved; a repeated name keeps its first binding.
    pub fn from_bindings(bindings: &[AtomBinding]) -> Self {
        let mut atoms = Vec::with_capacity(bindings.len());
        let mut by_name = HashMap::with_capacity(bindings.len());
        for binding in bindings {
            if by_name.contains_key(&binding.name) {
                continue;
            }
            by_name.insert(binding.name.clone(), atoms.len());
            atoms.push(Atom {
                name: binding.name.clone(),
                var: binding.var,
            });
        }
        Self { atoms, by_name }
    }

    /// Look up an atom by name.
    pub fn get(&self, name: &str) -> Option<&Atom> {
        self.by_name.get(name).map(|&i| &self.atoms[i])
    }

    /// Registry position of an atom.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// All atoms in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Atom> {
        self.atoms.iter()
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// `(atom, literal number)` pairs for `--dictionary`.
    pub fn dictionary(&self) -> Vec<(String, u32)> {
        self.atoms
            .iter()
            .map(|a| (a.name.clone(), a.var.literal_number()))
            .collect()
    }
}

impl std::fmt::Debug for AtomRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AtomRegistry")
            .field("count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binding(name: &str, var: usize) -> AtomBinding {
        AtomBinding {
            name: name.to_string(),
            var: Var::new(var),
        }
    }

    #[test]
    fn register_and_lookup() {
        let reg = AtomRegistry::from_bindings(&[binding("a", 0), binding("flip(c1)", 3)]);

        assert_eq!(reg.len(), 2);
        assert_eq!(reg.get("flip(c1)").unwrap().var(), Var::new(3));
        assert_eq!(reg.position("a"), Some(0));
        assert!(reg.get("b").is_none());
    }

    #[test]
    fn order_is_preserved_and_duplicates_ignored() {
        let reg = AtomRegistry::from_bindings(&[binding("b", 1), binding("a", 0), binding("b", 7)]);
        let names: Vec<&str> = reg.iter().map(Atom::name).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(reg.get("b").unwrap().var(), Var::new(1));
    }

    #[test]
    fn lookup_is_case_sensitive() {
        // Answer-set atoms are case sensitive: `a` and `A` never coincide.
        let reg = AtomRegistry::from_bindings(&[binding("a", 0)]);
        assert!(reg.contains("a"));
        assert!(!reg.contains("A"));
    }

    #[test]
    fn dictionary_uses_one_based_literals() {
        let reg = AtomRegistry::from_bindings(&[binding("a", 0), binding("b", 1)]);
        assert_eq!(
            reg.dictionary(),
            vec![("a".to_string(), 1), ("b".to_string(), 2)]
        );
    }
}
