//! Answer-set propagation: completion, support, and unfounded sets.
//!
//! Propagation runs to a fixpoint over four inferences:
//!
//! 1. **Forward**: a rule whose body holds forces its head (or fails, for a constraint).
//! 2. **Backward**: a false head (or a constraint) whose body has a single open
//!    literal forces that literal false.
//! 3. **Support**: a true atom with exactly one rule left that could support it
//!    forces that rule's body true; with none left the state is inconsistent.
//! 4. **Unfounded sets**: atoms outside the least fixpoint of rules whose bodies
//!    are not yet false cannot be founded and are made false.
//!
//! Together these make every total, conflict-free assignment a stable model;
//! [`Propagator::is_stable`] checks that independently.

use crate::program::{AtomId, GroundProgram, Head, Rule};

use super::assignment::{Assignment, Lit, Var};

/// Propagation reached an inconsistent state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conflict;

/// Truth of a rule body under a partial assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyState {
    True,
    False,
    Open,
}

fn var(atom: AtomId) -> Var {
    Var::new(atom.index())
}

/// Rule-based propagator compiled from a ground program.
#[derive(Debug, Clone)]
pub struct Propagator {
    rules: Vec<Rule>,
    /// Atom index → rules that have the atom in their head.
    supports: Vec<Vec<usize>>,
}

impl Propagator {
    pub fn new(program: &GroundProgram) -> Self {
        let mut supports = vec![Vec::new(); program.atom_count()];
        for (i, rule) in program.rules().iter().enumerate() {
            for atom in rule.head_atoms() {
                supports[atom.index()].push(i);
            }
        }
        Self {
            rules: program.rules().to_vec(),
            supports,
        }
    }

    /// Extend `assignment` to its propagation fixpoint.
    pub fn propagate(&self, assignment: &mut Assignment) -> Result<(), Conflict> {
        loop {
            let mut changed = false;
            self.propagate_rules(assignment, &mut changed)?;
            self.propagate_support(assignment, &mut changed)?;
            self.propagate_unfounded(assignment, &mut changed)?;
            if !changed {
                return Ok(());
            }
        }
    }

    /// Check a total assignment against the least model of its reduct.
    pub fn is_stable(&self, assignment: &Assignment) -> bool {
        let truth = |atom: &AtomId| assignment.value(var(*atom)) == Some(true);
        let mut derived = vec![false; assignment.len()];
        let applicable: Vec<&Rule> = self
            .rules
            .iter()
            .filter(|r| !r.negative.iter().any(truth))
            .collect();

        loop {
            let mut changed = false;
            for rule in &applicable {
                if !rule.positive.iter().all(|a| derived[a.index()]) {
                    continue;
                }
                match &rule.head {
                    Head::Falsum => return false,
                    Head::Atom(h) => changed |= !std::mem::replace(&mut derived[h.index()], true),
                    Head::Choice(atoms) => {
                        for h in atoms.iter().filter(|&h| truth(h)) {
                            changed |= !std::mem::replace(&mut derived[h.index()], true);
                        }
                    }
                }
            }
            if !changed {
                break;
            }
        }

        (0..assignment.len()).all(|i| derived[i] == (assignment.value(Var::new(i)) == Some(true)))
    }

    fn body_state(rule: &Rule, assignment: &Assignment) -> BodyState {
        let mut open = false;
        for atom in &rule.positive {
            match assignment.value(var(*atom)) {
                Some(false) => return BodyState::False,
                None => open = true,
                Some(true) => {}
            }
        }
        for atom in &rule.negative {
            match assignment.value(var(*atom)) {
                Some(true) => return BodyState::False,
                None => open = true,
                Some(false) => {}
            }
        }
        if open { BodyState::Open } else { BodyState::True }
    }

    /// Body literals as search literals that must hold for the body to hold.
    fn body_literals(rule: &Rule) -> impl Iterator<Item = Lit> + '_ {
        rule.positive
            .iter()
            .map(|a| Lit::positive(var(*a)))
            .chain(rule.negative.iter().map(|a| Lit::negative(var(*a))))
    }

    fn force(assignment: &mut Assignment, lit: Lit, changed: &mut bool) -> Result<(), Conflict> {
        match assignment.lit_value(lit) {
            Some(true) => Ok(()),
            Some(false) => Err(Conflict),
            None => {
                assignment.assign(lit);
                *changed = true;
                Ok(())
            }
        }
    }

    fn propagate_rules(&self, assignment: &mut Assignment, changed: &mut bool) -> Result<(), Conflict> {
        for rule in &self.rules {
            match Self::body_state(rule, assignment) {
                BodyState::False => {}
                BodyState::True => match &rule.head {
                    Head::Atom(h) => Self::force(assignment, Lit::positive(var(*h)), changed)?,
                    Head::Falsum => return Err(Conflict),
                    Head::Choice(_) => {}
                },
                BodyState::Open => {
                    let blocked = match &rule.head {
                        Head::Falsum => true,
                        Head::Atom(h) => assignment.value(var(*h)) == Some(false),
                        Head::Choice(_) => false,
                    };
                    if !blocked {
                        continue;
                    }
                    let mut open = Self::body_literals(rule).filter(|l| assignment.lit_value(*l).is_none());
                    if let (Some(last), None) = (open.next(), open.next()) {
                        Self::force(assignment, last.negate(), changed)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn propagate_support(&self, assignment: &mut Assignment, changed: &mut bool) -> Result<(), Conflict> {
        for (index, rules) in self.supports.iter().enumerate() {
            if assignment.value(Var::new(index)) != Some(true) {
                continue;
            }
            let mut candidates = rules
                .iter()
                .filter(|&&r| Self::body_state(&self.rules[r], assignment) != BodyState::False);
            match (candidates.next(), candidates.next()) {
                (None, _) => return Err(Conflict),
                (Some(&only), None) => {
                    for lit in Self::body_literals(&self.rules[only]) {
                        Self::force(assignment, lit, changed)?;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn propagate_unfounded(&self, assignment: &mut Assignment, changed: &mut bool) -> Result<(), Conflict> {
        let mut founded = vec![false; assignment.len()];
        loop {
            let mut grew = false;
            for rule in &self.rules {
                if matches!(rule.head, Head::Falsum) {
                    continue;
                }
                let body_possible = rule.negative.iter().all(|a| assignment.value(var(*a)) != Some(true))
                    && rule
                        .positive
                        .iter()
                        .all(|a| founded[a.index()] && assignment.value(var(*a)) != Some(false));
                if !body_possible {
                    continue;
                }
                for h in rule.head_atoms() {
                    if assignment.value(var(*h)) != Some(false) && !founded[h.index()] {
                        founded[h.index()] = true;
                        grew = true;
                    }
                }
            }
            if !grew {
                break;
            }
        }

        for (index, is_founded) in founded.into_iter().enumerate() {
            if !is_founded {
                Self::force(assignment, Lit::negative(Var::new(index)), changed)?;
            }
        }
        Ok(())
    }
}
