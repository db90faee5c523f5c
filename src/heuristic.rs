//! Default-rule heuristics: loading, resolution, branch bias and tagging.
//!
//! A heuristic file holds defeasible defaults, one per line:
//!
//! ```text
//! % comment
//! flip(a) :- not -flip(a).
//! -ok_rule :- not ok_rule.
//! ```
//!
//! Each default is resolved against the grounded program's atoms. A default
//! whose head is a known atom governs that atom and prefers it true; otherwise,
//! if the complement of the head is known, the default governs the complement
//! and prefers it false. Defaults naming neither are ignored: heuristic files
//! may be written against a larger vocabulary than the program at hand.
//!
//! Resolved defaults act three ways:
//!
//! 1. defaults with a known head are added to the program as rules before the
//!    search starts ([`inject_defaults`]),
//! 2. the branching order visits governed atoms first, with their preferred
//!    polarity ([`HeuristicInjector::preferred`]),
//! 3. reported values are tagged against the defaults
//!    ([`HeuristicInjector::tag`]).

use std::collections::HashMap;
use std::path::Path;

use crate::error::HeuristicError;
use crate::program::{GroundProgram, Head, Rule, parse_program};
use crate::provenance::Provenance;
use crate::registry::AtomRegistry;
use crate::solver::{AssignmentView, Lit, Var};
use crate::valuation::{TruthValue, Valuation};

// ---------------------------------------------------------------------------
// Default rules
// ---------------------------------------------------------------------------

/// `a :- not -a.` or `-a :- not a.`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DefaultRule {
    head: String,
}

/// The classical complement of an atom name: `a` ↔ `-a`.
pub fn complement(atom: &str) -> String {
    match atom.strip_prefix('-') {
        Some(base) => base.to_string(),
        None => format!("-{atom}"),
    }
}

impl DefaultRule {
    /// Default whose head is `head`, guarded by the head's complement.
    pub fn new(head: impl Into<String>) -> Self {
        Self { head: head.into() }
    }

    /// Parse one rule line. Returns `None` if the line is not a default.
    pub fn parse(line: &str) -> Option<Self> {
        let program = parse_program("<default>", line).ok()?;
        // Parsing adds `:- a, -a.` for the complementary pair; skip it.
        let rules: Vec<&Rule> = program
            .rules()
            .iter()
            .filter(|r| r.head != Head::Falsum)
            .collect();
        let [rule] = rules.as_slice() else {
            return None;
        };
        let Head::Atom(head) = &rule.head else {
            return None;
        };
        let [guard] = rule.negative.as_slice() else {
            return None;
        };
        if !rule.positive.is_empty() {
            return None;
        }
        let head = program.name(*head);
        (program.name(*guard) == complement(head)).then(|| Self::new(head))
    }

    pub fn head(&self) -> &str {
        &self.head
    }

    /// The atom whose derivation defeats this default.
    pub fn guard(&self) -> String {
        complement(&self.head)
    }

    /// Whether this default asserts a classically negated atom.
    pub fn is_negated(&self) -> bool {
        self.head.starts_with('-')
    }
}

impl std::fmt::Display for DefaultRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} :- not {}.", self.head, self.guard())
    }
}

/// Defaults loaded from one file, in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeuristicRuleSet {
    source: String,
    rules: Vec<DefaultRule>,
}

impl HeuristicRuleSet {
    pub fn load(path: &Path) -> Result<Self, HeuristicError> {
        let source = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|e| HeuristicError::Read {
            path: source.clone(),
            source: e,
        })?;
        Self::parse(&source, &text)
    }

    /// Parse file contents. `source` names the file in diagnostics.
    pub fn parse(source: &str, text: &str) -> Result<Self, HeuristicError> {
        let mut rules = Vec::new();
        for (i, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('%') {
                continue;
            }
            let rule = DefaultRule::parse(trimmed).ok_or_else(|| HeuristicError::Malformed {
                path: source.to_string(),
                line: i + 1,
                text: trimmed.to_string(),
            })?;
            rules.push(rule);
        }
        tracing::debug!(source, rules = rules.len(), "loaded heuristic file");
        Ok(Self {
            source: source.to_string(),
            rules,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn rules(&self) -> &[DefaultRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// A default bound to one known atom.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Resolved {
    /// The governed atom.
    atom: String,
    /// Polarity the default implies for `atom`.
    prefer: bool,
    rule: DefaultRule,
}

/// Bind defaults to known atoms, first rule per atom wins.
fn resolve(sets: &[HeuristicRuleSet], known: impl Fn(&str) -> bool) -> (Vec<Resolved>, usize) {
    let mut resolved: Vec<Resolved> = Vec::new();
    let mut ignored = 0;
    for rule in sets.iter().flat_map(|s| s.rules()) {
        let (atom, prefer) = if known(rule.head()) {
            (rule.head().to_string(), true)
        } else if known(&rule.guard()) {
            (rule.guard(), false)
        } else {
            tracing::debug!(rule = %rule, "default names no known atom, ignoring");
            ignored += 1;
            continue;
        };
        if resolved.iter().any(|r| r.atom == atom) {
            tracing::debug!(rule = %rule, atom = %atom, "atom already governed, ignoring later default");
            continue;
        }
        resolved.push(Resolved {
            atom,
            prefer,
            rule: rule.clone(),
        });
    }
    (resolved, ignored)
}

/// Add every default whose head is derivable in `program` as a program rule.
///
/// Only heads the program already derives are considered, so the set of
/// derivable atoms (and with it the reported vocabulary) stays the same.
/// Returns the number of rules added.
pub fn inject_defaults(program: &mut GroundProgram, sets: &[HeuristicRuleSet]) -> usize {
    let heads: Vec<String> = program
        .head_atoms()
        .into_iter()
        .map(|id| program.name(id).to_string())
        .collect();
    let (resolved, _) = resolve(sets, |name| heads.iter().any(|h| h == name));

    let mut added = 0;
    for r in resolved.iter().filter(|r| r.prefer) {
        let head = program.intern(r.rule.head());
        let guard = program.intern(&r.rule.guard());
        program.add_rule(Rule {
            head: Head::Atom(head),
            positive: Vec::new(),
            negative: vec![guard],
        });
        added += 1;
    }
    program.finalize();
    tracing::debug!(added, "injected default rules into program");
    added
}

// ---------------------------------------------------------------------------
// Injector
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Governed {
    var: Var,
    prefer: bool,
}

/// Branch bias and provenance tagging for one run.
#[derive(Debug, Clone, Default)]
pub struct HeuristicInjector {
    /// Whether values are tagged: a heuristic file was supplied, or
    /// bounded-nonmonotonic tagging was requested.
    active: bool,
    /// Governed atoms in registry order.
    order: Vec<Governed>,
    by_atom: HashMap<String, bool>,
    ignored: usize,
}

impl HeuristicInjector {
    /// Injector that never biases and never tags.
    pub fn inactive() -> Self {
        Self::default()
    }

    pub fn new(registry: &AtomRegistry, sets: &[HeuristicRuleSet]) -> Self {
        if sets.is_empty() {
            return Self::inactive();
        }
        let (mut resolved, ignored) = resolve(sets, |name| registry.contains(name));
        resolved.sort_by_key(|r| registry.position(&r.atom));

        let order = resolved
            .iter()
            .filter_map(|r| {
                registry.get(&r.atom).map(|atom| Governed {
                    var: atom.var(),
                    prefer: r.prefer,
                })
            })
            .collect();
        let by_atom = resolved.into_iter().map(|r| (r.atom, r.prefer)).collect();

        Self {
            active: true,
            order,
            by_atom,
            ignored,
        }
    }

    /// Tag atoms no default governs as `[b]` even without heuristic files.
    pub fn with_baseline_tags(mut self, enabled: bool) -> Self {
        self.active |= enabled;
        self
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Number of atoms governed by a default.
    pub fn governed_count(&self) -> usize {
        self.order.len()
    }

    /// Number of defaults that named no known atom.
    pub fn ignored_count(&self) -> usize {
        self.ignored
    }

    /// Polarity the defaults imply for `atom`, if governed.
    pub fn preference(&self, atom: &str) -> Option<bool> {
        self.by_atom.get(atom).copied()
    }

    /// The branching literal the defaults suggest: the first unassigned
    /// governed atom, with its preferred polarity.
    pub fn preferred(&self, view: &dyn AssignmentView) -> Option<Lit> {
        self.order
            .iter()
            .find(|g| view.value(g.var).is_none())
            .map(|g| Lit::new(g.var, g.prefer))
    }

    /// Provenance of one reported value.
    pub fn tag(&self, atom: &str, value: TruthValue) -> Provenance {
        if !self.active {
            return Provenance::Untagged;
        }
        match (self.preference(atom), value.as_bool()) {
            (None, _) => Provenance::Baseline,
            (Some(_), None) => Provenance::HeuristicApplied,
            (Some(prefer), Some(actual)) if prefer == actual => Provenance::Confirmed,
            (Some(_), Some(_)) => Provenance::Disconfirmed,
        }
    }

    /// Tag every entry of a freshly extracted valuation.
    pub fn apply_tags(&self, valuation: Valuation) -> Valuation {
        valuation.with_tags(|atom, value| self.tag(atom, value))
    }
}
