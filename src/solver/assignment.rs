//! Partial assignment with a decision-level trail.

use serde::Serialize;

/// Decision level of the search root.
///
/// Level 0 is reserved for top-level facts, so a search that has made `d`
/// branching decisions sits at level `d + 1`. Observers rely on this
/// convention: decision depth is always `level - 1`.
pub const ROOT_LEVEL: u32 = 1;

/// Boolean search variable, one per program atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[repr(transparent)]
pub struct Var(u32);

impl Var {
    pub fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// 1-based literal number, as printed by `--dictionary`.
    pub fn literal_number(self) -> u32 {
        self.0 + 1
    }
}

/// A variable with a polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Lit {
    var: Var,
    positive: bool,
}

impl Lit {
    pub fn new(var: Var, positive: bool) -> Self {
        Self { var, positive }
    }

    pub fn positive(var: Var) -> Self {
        Self::new(var, true)
    }

    pub fn negative(var: Var) -> Self {
        Self::new(var, false)
    }

    pub fn var(self) -> Var {
        self.var
    }

    pub fn is_positive(self) -> bool {
        self.positive
    }

    pub fn negate(self) -> Self {
        Self::new(self.var, !self.positive)
    }
}

impl std::fmt::Display for Lit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.positive {
            write!(f, "{}", self.var.literal_number())
        } else {
            write!(f, "-{}", self.var.literal_number())
        }
    }
}

/// Values for every variable plus the trail needed to undo them.
#[derive(Debug, Clone)]
pub struct Assignment {
    values: Vec<Option<bool>>,
    trail: Vec<Var>,
    /// Trail index at which each decision level above the root starts.
    level_starts: Vec<usize>,
}

impl Assignment {
    pub fn new(vars: usize) -> Self {
        Self {
            values: vec![None; vars],
            trail: Vec::with_capacity(vars),
            level_starts: Vec::new(),
        }
    }

    pub fn value(&self, var: Var) -> Option<bool> {
        self.values[var.index()]
    }

    /// Truth of a literal, `None` if its variable is unassigned.
    pub fn lit_value(&self, lit: Lit) -> Option<bool> {
        self.value(lit.var).map(|v| v == lit.positive)
    }

    /// Make `lit` true. Returns `false` if its complement is already true.
    pub fn assign(&mut self, lit: Lit) -> bool {
        match self.values[lit.var.index()] {
            Some(v) => v == lit.positive,
            None => {
                self.values[lit.var.index()] = Some(lit.positive);
                self.trail.push(lit.var);
                true
            }
        }
    }

    /// Open a new decision level.
    pub fn push_level(&mut self) {
        self.level_starts.push(self.trail.len());
    }

    /// Undo every assignment made after the first `decisions` decisions.
    pub fn backtrack_to(&mut self, decisions: usize) {
        if decisions >= self.level_starts.len() {
            return;
        }
        let keep = self.level_starts[decisions];
        for var in self.trail.drain(keep..) {
            self.values[var.index()] = None;
        }
        self.level_starts.truncate(decisions);
    }

    /// Number of branching decisions on the current path.
    pub fn decisions(&self) -> usize {
        self.level_starts.len()
    }

    pub fn decision_level(&self) -> u32 {
        ROOT_LEVEL + self.level_starts.len() as u32
    }

    pub fn is_total(&self) -> bool {
        self.trail.len() == self.values.len()
    }

    pub fn first_unassigned(&self) -> Option<Var> {
        self.values.iter().position(Option::is_none).map(Var::new)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assign_and_backtrack() {
        let mut a = Assignment::new(3);
        let (x, y, z) = (Var::new(0), Var::new(1), Var::new(2));

        assert!(a.assign(Lit::positive(x)));
        assert_eq!(a.decision_level(), ROOT_LEVEL);

        a.push_level();
        assert!(a.assign(Lit::negative(y)));
        a.push_level();
        assert!(a.assign(Lit::positive(z)));
        assert!(a.is_total());
        assert_eq!(a.decision_level(), ROOT_LEVEL + 2);

        a.backtrack_to(1);
        assert_eq!(a.value(z), None);
        assert_eq!(a.value(y), Some(false));
        assert_eq!(a.decisions(), 1);

        a.backtrack_to(0);
        assert_eq!(a.value(y), None);
        assert_eq!(a.value(x), Some(true));
        assert_eq!(a.first_unassigned(), Some(y));
    }

    #[test]
    fn conflicting_assignment_is_rejected() {
        let mut a = Assignment::new(1);
        let x = Var::new(0);
        assert!(a.assign(Lit::positive(x)));
        assert!(a.assign(Lit::positive(x)));
        assert!(!a.assign(Lit::negative(x)));
        assert_eq!(a.lit_value(Lit::negative(x)), Some(false));
    }

    #[test]
    fn literal_display_is_one_based() {
        assert_eq!(Lit::positive(Var::new(0)).to_string(), "1");
        assert_eq!(Lit::negative(Var::new(4)).to_string(), "-5");
    }
}
