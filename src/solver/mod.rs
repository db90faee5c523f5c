//! Depth-first answer-set search engine with an observer interface.
//!
//! The engine owns the live assignment and the decision stack. Everything that
//! wants to watch or steer the search does so through [`SearchObserver`]:
//!
//! - `on_init` receives every symbolic atom and the variable backing it,
//! - `on_fixpoint` runs at every consistent propagation fixpoint and may ask
//!   the engine to stop,
//! - `decide` may replace the engine's choice of branching literal,
//! - `on_restart` is told whenever the engine restarts from the root.
//!
//! Observers only ever see the assignment through [`AssignmentView`]; they
//! cannot change it.
//!
//! The search is a chronological binary branching: each decision level tries
//! the chosen literal first and its complement second, so every node of the
//! branching tree is visited once and in a fixed order. Stop requests are
//! honoured at the next decision point, never mid-propagation.

pub mod assignment;
pub mod propagate;
pub mod restart;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;

use crate::program::GroundProgram;

pub use assignment::{Assignment, Lit, ROOT_LEVEL, Var};
pub use propagate::{Conflict, Propagator};
pub use restart::{RestartSchedule, RestartStrategy};

// ---------------------------------------------------------------------------
// Observer contract
// ---------------------------------------------------------------------------

/// What an observer wants the engine to do after a fixpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Directive {
    Continue,
    Stop,
}

/// Read-only window onto the engine's current assignment.
pub trait AssignmentView {
    /// Current decision level; the root is [`ROOT_LEVEL`].
    fn decision_level(&self) -> u32;
    /// Whether every variable is assigned.
    fn is_total(&self) -> bool;
    /// Value of a variable, `None` if unassigned on the current branch.
    fn value(&self, var: Var) -> Option<bool>;
}

impl AssignmentView for Assignment {
    fn decision_level(&self) -> u32 {
        Assignment::decision_level(self)
    }

    fn is_total(&self) -> bool {
        Assignment::is_total(self)
    }

    fn value(&self, var: Var) -> Option<bool> {
        Assignment::value(self, var)
    }
}

/// A symbolic atom and the variable the engine uses for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomBinding {
    pub name: String,
    pub var: Var,
}

/// Capability implemented by anything that watches the search.
pub trait SearchObserver {
    fn on_init(&mut self, atoms: &[AtomBinding]);

    fn on_fixpoint(&mut self, view: &dyn AssignmentView) -> Directive;

    /// Choose the next branching literal. `fallback` is the engine's own choice.
    fn decide(&mut self, _view: &dyn AssignmentView, fallback: Lit) -> Lit {
        fallback
    }

    fn on_restart(&mut self) {}
}

/// Cooperative interrupt flag shared between the engine and its callers.
#[derive(Debug, Clone, Default)]
pub struct InterruptHandle(Arc<AtomicBool>);

impl InterruptHandle {
    pub fn interrupt(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_interrupted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Final status of a search, in clasp's terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SolveStatus {
    /// At least one stable model was reached.
    Satisfiable,
    /// The search space was exhausted without a stable model.
    Unsatisfiable,
    /// The search was interrupted before reaching a stable model.
    Unknown,
}

impl std::fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Satisfiable => write!(f, "SATISFIABLE"),
            Self::Unsatisfiable => write!(f, "UNSATISFIABLE"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Search counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SolveStats {
    pub decisions: u64,
    pub conflicts: u64,
    pub restarts: u64,
    pub fixpoints: u64,
    pub models: u64,
}

/// Result of [`Solver::solve`].
#[derive(Debug, Clone, Serialize)]
pub struct SolveOutcome {
    pub status: SolveStatus,
    pub interrupted: bool,
    /// True atoms of each stable model reached, in discovery order.
    pub models: Vec<Vec<String>>,
    pub stats: SolveStats,
}

// ---------------------------------------------------------------------------
// Solver
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct SolverConfig {
    pub restart: RestartStrategy,
}

/// One entry of the decision stack.
#[derive(Debug, Clone, Copy)]
struct Frame {
    lit: Lit,
    /// Whether this is already the second branch of its decision.
    flipped: bool,
}

pub struct Solver {
    program: GroundProgram,
    propagator: Propagator,
    assignment: Assignment,
    frames: Vec<Frame>,
    schedule: RestartSchedule,
    interrupt: InterruptHandle,
    stats: SolveStats,
    /// Set when replaying the decision stack after a restart hit a conflict.
    replay_conflict: bool,
}

impl Solver {
    pub fn new(program: GroundProgram, config: SolverConfig) -> Self {
        let propagator = Propagator::new(&program);
        let assignment = Assignment::new(program.atom_count());
        Self {
            program,
            propagator,
            assignment,
            frames: Vec::new(),
            schedule: RestartSchedule::new(config.restart),
            interrupt: InterruptHandle::default(),
            stats: SolveStats::default(),
            replay_conflict: false,
        }
    }

    /// Handle that stops the search at its next decision point.
    pub fn interrupt_handle(&self) -> InterruptHandle {
        self.interrupt.clone()
    }

    pub fn program(&self) -> &GroundProgram {
        &self.program
    }

    /// Symbolic atoms exposed to observers: every atom that can be derived.
    pub fn bindings(&self) -> Vec<AtomBinding> {
        self.program
            .head_atoms()
            .into_iter()
            .map(|id| AtomBinding {
                name: self.program.name(id).to_string(),
                var: Var::new(id.index()),
            })
            .collect()
    }

    /// Run the search to exhaustion or interruption.
    pub fn solve(&mut self, observer: &mut dyn SearchObserver) -> SolveOutcome {
        observer.on_init(&self.bindings());

        let mut models = Vec::new();
        let mut exhausted = false;

        loop {
            if self.interrupt.is_interrupted() {
                break;
            }

            let consistent = !std::mem::take(&mut self.replay_conflict)
                && self.propagator.propagate(&mut self.assignment).is_ok()
                && (!self.assignment.is_total() || self.propagator.is_stable(&self.assignment));

            if !consistent {
                self.stats.conflicts += 1;
                if !self.backtrack() {
                    exhausted = true;
                    break;
                }
                if self.schedule.on_conflict() {
                    self.restart(observer);
                }
                continue;
            }

            self.stats.fixpoints += 1;
            if observer.on_fixpoint(&self.assignment) == Directive::Stop {
                self.interrupt.interrupt();
            }

            if self.assignment.is_total() {
                self.stats.models += 1;
                models.push(self.model());
                if !self.backtrack() {
                    exhausted = true;
                    break;
                }
                continue;
            }

            if self.interrupt.is_interrupted() {
                break;
            }
            self.decide(observer);
        }

        let interrupted = !exhausted;
        let status = match (models.is_empty(), exhausted) {
            (false, _) => SolveStatus::Satisfiable,
            (true, true) => SolveStatus::Unsatisfiable,
            (true, false) => SolveStatus::Unknown,
        };
        tracing::debug!(
            status = %status,
            decisions = self.stats.decisions,
            conflicts = self.stats.conflicts,
            restarts = self.stats.restarts,
            "search finished"
        );

        SolveOutcome {
            status,
            interrupted,
            models,
            stats: self.stats.clone(),
        }
    }

    fn model(&self) -> Vec<String> {
        self.program
            .atoms()
            .filter(|(id, _)| self.assignment.value(Var::new(id.index())) == Some(true))
            .map(|(_, name)| name.to_string())
            .collect()
    }

    fn decide(&mut self, observer: &mut dyn SearchObserver) {
        let Some(var) = self.assignment.first_unassigned() else {
            return;
        };
        // Atoms default to false first, as in clasp's sign heuristic.
        let fallback = Lit::negative(var);
        let mut lit = observer.decide(&self.assignment, fallback);
        if self.assignment.value(lit.var()).is_some() {
            tracing::warn!(literal = %lit, "observer chose an assigned literal, using fallback");
            lit = fallback;
        }

        self.stats.decisions += 1;
        self.frames.push(Frame { lit, flipped: false });
        self.assignment.push_level();
        self.assignment.assign(lit);
    }

    /// Move to the next unexplored branch. Returns `false` when none is left.
    fn backtrack(&mut self) -> bool {
        while let Some(frame) = self.frames.pop() {
            self.assignment.backtrack_to(self.frames.len());
            if !frame.flipped {
                let lit = frame.lit.negate();
                self.frames.push(Frame { lit, flipped: true });
                self.assignment.push_level();
                self.assignment.assign(lit);
                return true;
            }
        }
        self.assignment.backtrack_to(0);
        false
    }

    /// Return to the root, notify the observer, and replay the open branch.
    ///
    /// Replaying keeps the branching tree intact, so a restart never causes a
    /// node to be visited (and reported) twice.
    fn restart(&mut self, observer: &mut dyn SearchObserver) {
        self.stats.restarts += 1;
        tracing::debug!(restarts = self.stats.restarts, "restarting search");
        self.assignment.backtrack_to(0);
        observer.on_restart();

        let mut consistent = self.propagator.propagate(&mut self.assignment).is_ok();
        for frame in &self.frames {
            self.assignment.push_level();
            consistent = self.assignment.assign(frame.lit)
                && consistent
                && self.propagator.propagate(&mut self.assignment).is_ok();
        }
        self.replay_conflict = !consistent;
    }
}

impl std::fmt::Debug for Solver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Solver")
            .field("atoms", &self.program.atom_count())
            .field("rules", &self.program.rules().len())
            .field("decisions", &self.assignment.decisions())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::parse_program;

    /// Records every total fixpoint and never stops.
    #[derive(Default)]
    struct Recorder {
        atoms: Vec<AtomBinding>,
        levels: Vec<u32>,
        restarts: usize,
        stop_after: Option<usize>,
    }

    impl SearchObserver for Recorder {
        fn on_init(&mut self, atoms: &[AtomBinding]) {
            self.atoms = atoms.to_vec();
        }

        fn on_fixpoint(&mut self, view: &dyn AssignmentView) -> Directive {
            self.levels.push(view.decision_level());
            match self.stop_after {
                Some(n) if self.levels.len() >= n => Directive::Stop,
                _ => Directive::Continue,
            }
        }

        fn on_restart(&mut self) {
            self.restarts += 1;
        }
    }

    fn solver(text: &str, restart: RestartStrategy) -> Solver {
        let program = parse_program("test.lp", text).unwrap();
        Solver::new(program, SolverConfig { restart })
    }

    #[test]
    fn enumerates_both_models_of_even_loop() {
        let mut s = solver("a :- not b. b :- not a.", RestartStrategy::None);
        let mut rec = Recorder::default();
        let outcome = s.solve(&mut rec);

        assert_eq!(outcome.status, SolveStatus::Satisfiable);
        assert!(!outcome.interrupted);
        assert_eq!(outcome.models, vec![vec!["b".to_string()], vec!["a".to_string()]]);
        assert_eq!(rec.atoms.len(), 2);
        // Root fixpoint, then one fixpoint per branch.
        assert_eq!(rec.levels, vec![ROOT_LEVEL, ROOT_LEVEL + 1, ROOT_LEVEL + 1]);
    }

    #[test]
    fn unsatisfiable_program() {
        let mut s = solver("a :- not a.", RestartStrategy::None);
        let outcome = s.solve(&mut Recorder::default());
        assert_eq!(outcome.status, SolveStatus::Unsatisfiable);
        assert!(outcome.models.is_empty());
    }

    #[test]
    fn stop_is_honoured_before_next_decision() {
        let mut s = solver("{a}. {b}. {c}.", RestartStrategy::None);
        let mut rec = Recorder {
            stop_after: Some(1),
            ..Default::default()
        };
        let outcome = s.solve(&mut rec);
        assert!(outcome.interrupted);
        assert_eq!(outcome.status, SolveStatus::Unknown);
        assert_eq!(rec.levels, vec![ROOT_LEVEL]);
        assert_eq!(outcome.stats.decisions, 0);
    }

    #[test]
    fn external_interrupt_handle() {
        let mut s = solver("{a}. {b}.", RestartStrategy::None);
        s.interrupt_handle().interrupt();
        let mut rec = Recorder::default();
        let outcome = s.solve(&mut rec);
        assert!(outcome.interrupted);
        assert!(rec.levels.is_empty());
    }

    #[test]
    fn restarts_do_not_change_enumeration() {
        // `p :- not p, not a.` rules out every branch with `a` false, which
        // the engine only discovers by deciding `p`.
        let text = "{a}. {b}. p :- not p, not a.";
        let mut plain = solver(text, RestartStrategy::None);
        let mut restarting = solver(text, RestartStrategy::Fixed(1));

        let mut rec_plain = Recorder::default();
        let mut rec_restart = Recorder::default();
        let a = plain.solve(&mut rec_plain);
        let b = restarting.solve(&mut rec_restart);

        assert_eq!(a.models, b.models);
        assert_eq!(rec_plain.levels, rec_restart.levels);
        assert!(b.stats.restarts > 0);
        assert_eq!(rec_restart.restarts as u64, b.stats.restarts);
    }

    #[test]
    fn body_only_atoms_are_not_exposed() {
        let s = solver("a :- b.", RestartStrategy::None);
        let names: Vec<String> = s.bindings().into_iter().map(|b| b.name).collect();
        assert_eq!(names, vec!["a".to_string()]);
    }
}
