//! Three-valued valuations and their extraction from a search state.
//!
//! A [`Valuation`] is a snapshot of every registered atom at one fixpoint.
//! Atoms whose variable is unassigned on the current branch are
//! [`TruthValue::Undetermined`]: within the depth bound, neither proof nor
//! refutation was fixed.

use serde::Serialize;

use crate::provenance::Provenance;
use crate::registry::AtomRegistry;
use crate::solver::{AssignmentView, ROOT_LEVEL};

/// Truth value in the three-valued valuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TruthValue {
    True,
    False,
    Undetermined,
}

impl TruthValue {
    /// Map an engine value (`None` = unassigned).
    pub fn from_assignment(value: Option<bool>) -> Self {
        match value {
            Some(true) => Self::True,
            Some(false) => Self::False,
            None => Self::Undetermined,
        }
    }

    /// `1`, `0` or `⊥`.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::True => "1",
            Self::False => "0",
            Self::Undetermined => "⊥",
        }
    }

    pub fn is_determined(self) -> bool {
        self != Self::Undetermined
    }

    /// The boolean value, if determined.
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Self::True => Some(true),
            Self::False => Some(false),
            Self::Undetermined => None,
        }
    }
}

impl std::fmt::Display for TruthValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

/// One atom's entry in a valuation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AtomValue {
    pub atom: String,
    pub value: TruthValue,
    pub tag: Provenance,
}

/// A snapshot of all registered atoms at one fixpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Valuation {
    /// Discovery order within the run, starting at 1.
    sequence: usize,
    /// Decision level at capture.
    level: u32,
    entries: Vec<AtomValue>,
}

impl Valuation {
    pub fn new(sequence: usize, level: u32, entries: Vec<AtomValue>) -> Self {
        Self {
            sequence,
            level,
            entries,
        }
    }

    pub fn sequence(&self) -> usize {
        self.sequence
    }

    /// Decision level at capture.
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Number of branching decisions on the path that produced this valuation.
    pub fn depth(&self) -> u32 {
        self.level.saturating_sub(ROOT_LEVEL)
    }

    pub fn entries(&self) -> &[AtomValue] {
        &self.entries
    }

    pub fn value_of(&self, atom: &str) -> Option<TruthValue> {
        self.entries.iter().find(|e| e.atom == atom).map(|e| e.value)
    }

    pub fn tag_of(&self, atom: &str) -> Option<Provenance> {
        self.entries.iter().find(|e| e.atom == atom).map(|e| e.tag)
    }

    /// Atoms that are true, in registry order.
    pub fn true_atoms(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|e| e.value == TruthValue::True)
            .map(|e| e.atom.as_str())
    }

    /// Number of atoms with a determined value.
    pub fn decided_count(&self) -> usize {
        self.entries.iter().filter(|e| e.value.is_determined()).count()
    }

    /// Whether no atom is undetermined.
    pub fn is_complete(&self) -> bool {
        self.decided_count() == self.entries.len()
    }

    /// Finalize provenance tags. Consumes the snapshot so tags are set once.
    pub fn with_tags(mut self, mut tag: impl FnMut(&str, TruthValue) -> Provenance) -> Self {
        for entry in &mut self.entries {
            entry.tag = tag(&entry.atom, entry.value);
        }
        self
    }
}

/// Read every registered atom from the current assignment.
pub fn extract(registry: &AtomRegistry, view: &dyn AssignmentView, sequence: usize) -> Valuation {
    let entries = registry
        .iter()
        .map(|atom| AtomValue {
            atom: atom.name().to_string(),
            value: TruthValue::from_assignment(view.value(atom.var())),
            tag: Provenance::Untagged,
        })
        .collect();
    Valuation::new(sequence, view.decision_level(), entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::{AtomBinding, Var};

    struct FixedView {
        level: u32,
        values: Vec<Option<bool>>,
    }

    impl AssignmentView for FixedView {
        fn decision_level(&self) -> u32 {
            self.level
        }

        fn is_total(&self) -> bool {
            self.values.iter().all(Option::is_some)
        }

        fn value(&self, var: Var) -> Option<bool> {
            self.values[var.index()]
        }
    }

    fn registry(names: &[&str]) -> AtomRegistry {
        let bindings: Vec<AtomBinding> = names
            .iter()
            .enumerate()
            .map(|(i, n)| AtomBinding {
                name: n.to_string(),
                var: Var::new(i),
            })
            .collect();
        AtomRegistry::from_bindings(&bindings)
    }

    #[test]
    fn extract_maps_unassigned_to_undetermined() {
        let reg = registry(&["a", "b", "c"]);
        let view = FixedView {
            level: ROOT_LEVEL + 1,
            values: vec![Some(true), None, Some(false)],
        };
        let v = extract(&reg, &view, 1);

        assert_eq!(v.value_of("a"), Some(TruthValue::True));
        assert_eq!(v.value_of("b"), Some(TruthValue::Undetermined));
        assert_eq!(v.value_of("c"), Some(TruthValue::False));
        assert_eq!(v.depth(), 1);
        assert_eq!(v.decided_count(), 2);
        assert!(!v.is_complete());
        assert_eq!(v.true_atoms().collect::<Vec<_>>(), vec!["a"]);
    }

    #[test]
    fn symbols() {
        assert_eq!(TruthValue::True.symbol(), "1");
        assert_eq!(TruthValue::False.symbol(), "0");
        assert_eq!(TruthValue::Undetermined.symbol(), "⊥");
    }

    #[test]
    fn tags_are_applied_per_atom() {
        let reg = registry(&["a", "b"]);
        let view = FixedView {
            level: ROOT_LEVEL,
            values: vec![Some(true), Some(false)],
        };
        let v = extract(&reg, &view, 1).with_tags(|atom, _| {
            if atom == "a" {
                Provenance::Confirmed
            } else {
                Provenance::Baseline
            }
        });
        assert_eq!(v.tag_of("a"), Some(Provenance::Confirmed));
        assert_eq!(v.tag_of("b"), Some(Provenance::Baseline));
    }
}
