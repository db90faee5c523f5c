//! Ground logic programs: atoms, rules, and the textual reader.
//!
//! A [`GroundProgram`] is the hand-off point between grounding and search.
//! Atoms are interned in order of first appearance and addressed by
//! [`AtomId`]; rules reference atoms only by id.
//!
//! Classical negation is handled the way answer-set solvers do it: `-p` is an
//! ordinary atom whose name starts with `-`, and [`GroundProgram::finalize`]
//! adds the consistency constraint `:- p, -p.` for every complementary pair.

pub mod parser;

use std::collections::{HashMap, HashSet};

use serde::Serialize;

pub use parser::parse_program;

/// Dense index of an atom inside a [`GroundProgram`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[repr(transparent)]
pub struct AtomId(u32);

impl AtomId {
    /// Position of this atom in the program's atom table.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The head of a ground rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Head {
    /// A single atom: `a :- body.`
    Atom(AtomId),
    /// An unbounded choice over atoms: `{a; b} :- body.`
    Choice(Vec<AtomId>),
    /// No head: an integrity constraint `:- body.`
    Falsum,
}

/// A ground normal, choice, or constraint rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub head: Head,
    /// Atoms that must hold.
    pub positive: Vec<AtomId>,
    /// Atoms under default negation (`not a`).
    pub negative: Vec<AtomId>,
}

impl Rule {
    /// A fact: `a.`
    pub fn fact(head: AtomId) -> Self {
        Self {
            head: Head::Atom(head),
            positive: Vec::new(),
            negative: Vec::new(),
        }
    }

    /// Atoms this rule can make true.
    pub fn head_atoms(&self) -> &[AtomId] {
        match &self.head {
            Head::Atom(a) => std::slice::from_ref(a),
            Head::Choice(atoms) => atoms,
            Head::Falsum => &[],
        }
    }
}

/// A fully instantiated propositional program.
#[derive(Debug, Clone, Default)]
pub struct GroundProgram {
    names: Vec<String>,
    index: HashMap<String, AtomId>,
    rules: Vec<Rule>,
    /// Negated atoms whose consistency constraint is already in place.
    constrained: HashSet<AtomId>,
}

impl GroundProgram {
    /// Create an empty program.
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern an atom by name, returning its existing id if already present.
    pub fn intern(&mut self, name: &str) -> AtomId {
        if let Some(&id) = self.index.get(name) {
            return id;
        }
        let id = AtomId(self.names.len() as u32);
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), id);
        id
    }

    /// Append a rule.
    pub fn add_rule(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    /// Add consistency constraints for classically negated atoms.
    ///
    /// Call after rules have been added; pairs already constrained are skipped,
    /// so a program extended after parsing can be finalized again.
    pub fn finalize(&mut self) {
        let pairs: Vec<(AtomId, AtomId)> = self
            .names
            .iter()
            .enumerate()
            .filter_map(|(i, name)| {
                let negated = AtomId(i as u32);
                if self.constrained.contains(&negated) {
                    return None;
                }
                let base = name.strip_prefix('-')?;
                let positive = *self.index.get(base)?;
                Some((positive, negated))
            })
            .collect();
        for (positive, negated) in pairs {
            self.constrained.insert(negated);
            self.rules.push(Rule {
                head: Head::Falsum,
                positive: vec![positive, negated],
                negative: Vec::new(),
            });
        }
    }

    /// Look up an atom id by name.
    pub fn lookup(&self, name: &str) -> Option<AtomId> {
        self.index.get(name).copied()
    }

    /// Name of an atom.
    pub fn name(&self, id: AtomId) -> &str {
        &self.names[id.index()]
    }

    /// All atoms in interning order.
    pub fn atoms(&self) -> impl Iterator<Item = (AtomId, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(i, n)| (AtomId(i as u32), n.as_str()))
    }

    /// Atoms that occur in the head of at least one rule, in interning order.
    ///
    /// Atoms that only ever appear in bodies can never be derived; like a
    /// grounder, the search engine does not expose them as symbolic atoms.
    pub fn head_atoms(&self) -> Vec<AtomId> {
        let mut in_head = vec![false; self.names.len()];
        for rule in &self.rules {
            for atom in rule.head_atoms() {
                in_head[atom.index()] = true;
            }
        }
        (0..self.names.len())
            .filter(|&i| in_head[i])
            .map(|i| AtomId(i as u32))
            .collect()
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Number of interned atoms.
    pub fn atom_count(&self) -> usize {
        self.names.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_is_stable() {
        let mut program = GroundProgram::new();
        let a = program.intern("a");
        let b = program.intern("b");
        assert_ne!(a, b);
        assert_eq!(program.intern("a"), a);
        assert_eq!(program.name(b), "b");
        assert_eq!(program.atom_count(), 2);
    }

    #[test]
    fn finalize_adds_complement_constraints() {
        let mut program = GroundProgram::new();
        let p = program.intern("p");
        let np = program.intern("-p");
        program.intern("-q");
        program.finalize();

        assert_eq!(program.rules().len(), 1);
        let rule = &program.rules()[0];
        assert_eq!(rule.head, Head::Falsum);
        assert_eq!(rule.positive, vec![p, np]);

        program.finalize();
        assert_eq!(program.rules().len(), 1);
    }

    #[test]
    fn head_atoms_skip_body_only_atoms() {
        let mut program = GroundProgram::new();
        let a = program.intern("a");
        let b = program.intern("b");
        let c = program.intern("c");
        program.add_rule(Rule {
            head: Head::Atom(a),
            positive: vec![b],
            negative: Vec::new(),
        });
        program.add_rule(Rule {
            head: Head::Choice(vec![c]),
            positive: Vec::new(),
            negative: Vec::new(),
        });
        assert_eq!(program.head_atoms(), vec![a, c]);
    }
}
