//! Fixpoint checker: the search observer that decides when to report.
//!
//! At every consistent fixpoint, with `L` the decision level and `k` the depth
//! bound, a valuation is emitted when
//!
//! - `L == k + 1` (the branch has spent exactly `k` decisions), or
//! - the assignment is total and `L < k + 1` (the branch finished early).
//!
//! Emitted valuations are tagged by the [`HeuristicInjector`] and handed to the
//! [`ModeController`]. Once the controller asks to stop, every later callback
//! is absorbed and answered with [`Directive::Stop`] again.

use crate::heuristic::{HeuristicInjector, HeuristicRuleSet};
use crate::mode::{ModeController, ModeOutcome};
use crate::registry::AtomRegistry;
use crate::solver::{AssignmentView, AtomBinding, Directive, Lit, ROOT_LEVEL, SearchObserver};
use crate::valuation;

/// Whether a fixpoint at `level` should be reported under depth bound `depth`.
pub fn should_emit(level: u32, total: bool, depth: u32) -> bool {
    let bound = depth.saturating_add(ROOT_LEVEL);
    level == bound || (total && level < bound)
}

/// Counters the checker gathered during one search.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct CheckerStats {
    pub callbacks: u64,
    pub emitted: usize,
    /// Callbacks absorbed after a stop was requested.
    pub late_callbacks: u64,
    pub restarts: u64,
    /// Deepest decision level seen since the last restart.
    pub deepest_level: u32,
    pub governed_atoms: usize,
    pub ignored_defaults: usize,
}

/// Everything the checker hands back once the search is over.
#[derive(Debug)]
pub struct CheckerReport {
    pub registry: AtomRegistry,
    pub outcome: ModeOutcome,
    pub stats: CheckerStats,
}

#[derive(Debug)]
pub struct FixpointChecker {
    depth: u32,
    heuristics: Vec<HeuristicRuleSet>,
    baseline_tags: bool,
    registry: AtomRegistry,
    injector: HeuristicInjector,
    controller: ModeController,
    stopped: bool,
    callbacks_since_restart: u64,
    stats: CheckerStats,
}

impl FixpointChecker {
    pub fn new(depth: u32, controller: ModeController, heuristics: Vec<HeuristicRuleSet>) -> Self {
        Self {
            depth,
            heuristics,
            baseline_tags: false,
            registry: AtomRegistry::default(),
            injector: HeuristicInjector::inactive(),
            controller,
            stopped: false,
            callbacks_since_restart: 0,
            stats: CheckerStats::default(),
        }
    }

    /// Tag every reported atom, even when no heuristic file is loaded.
    pub fn with_baseline_tags(mut self, enabled: bool) -> Self {
        self.baseline_tags = enabled;
        self
    }

    pub fn registry(&self) -> &AtomRegistry {
        &self.registry
    }

    /// Callbacks seen since the last restart (or the start of the search).
    pub fn callbacks_since_restart(&self) -> u64 {
        self.callbacks_since_restart
    }

    pub fn finish(self) -> CheckerReport {
        CheckerReport {
            registry: self.registry,
            outcome: self.controller.finish(),
            stats: self.stats,
        }
    }
}

impl SearchObserver for FixpointChecker {
    fn on_init(&mut self, atoms: &[AtomBinding]) {
        self.registry = AtomRegistry::from_bindings(atoms);
        self.injector = HeuristicInjector::new(&self.registry, &self.heuristics)
            .with_baseline_tags(self.baseline_tags);
        self.stats.governed_atoms = self.injector.governed_count();
        self.stats.ignored_defaults = self.injector.ignored_count();
        tracing::debug!(
            atoms = self.registry.len(),
            governed = self.stats.governed_atoms,
            ignored = self.stats.ignored_defaults,
            "registered atoms"
        );
    }

    fn on_fixpoint(&mut self, view: &dyn AssignmentView) -> Directive {
        if self.stopped {
            self.stats.late_callbacks += 1;
            tracing::debug!("fixpoint after stop request, ignoring");
            return Directive::Stop;
        }

        let level = view.decision_level();
        self.stats.callbacks += 1;
        self.callbacks_since_restart += 1;
        self.stats.deepest_level = self.stats.deepest_level.max(level);
        let depth = level.saturating_sub(ROOT_LEVEL);
        tracing::debug!("Current depth = {depth}");

        if !should_emit(level, view.is_total(), self.depth) {
            return Directive::Continue;
        }

        self.stats.emitted += 1;
        let captured = valuation::extract(&self.registry, view, self.stats.emitted);
        let tagged = self.injector.apply_tags(captured);
        let directive = self.controller.accept(tagged);
        if directive == Directive::Stop {
            self.stopped = true;
        }
        directive
    }

    fn decide(&mut self, view: &dyn AssignmentView, fallback: Lit) -> Lit {
        self.injector.preferred(view).unwrap_or(fallback)
    }

    fn on_restart(&mut self) {
        self.stats.restarts += 1;
        self.callbacks_since_restart = 0;
        self.stats.deepest_level = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::Mode;
    use crate::provenance::Provenance;
    use crate::solver::Var;
    use crate::valuation::TruthValue;

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

    fn bindings(names: &[&str]) -> Vec<AtomBinding> {
        names
            .iter()
            .enumerate()
            .map(|(i, n)| AtomBinding {
                name: n.to_string(),
                var: Var::new(i),
            })
            .collect()
    }

    fn checker(depth: u32, mode: Mode, max: usize, limit: usize) -> FixpointChecker {
        let mut c = FixpointChecker::new(depth, ModeController::new(mode, max, limit), Vec::new());
        c.on_init(&bindings(&["a", "b"]));
        c
    }

    #[test]
    fn emission_rule() {
        // k = 0: only the root.
        assert!(should_emit(1, false, 0));
        assert!(!should_emit(2, true, 0));
        // k = 2: exactly level 3, or total earlier.
        assert!(!should_emit(1, false, 2));
        assert!(should_emit(2, true, 2));
        assert!(should_emit(3, false, 2));
        assert!(!should_emit(4, true, 2));
    }

    #[test]
    fn root_fixpoint_at_depth_zero_is_all_undetermined() {
        let mut c = checker(0, Mode::All, 0, 1);
        let directive = c.on_fixpoint(&FixedView {
            level: ROOT_LEVEL,
            values: vec![None, None],
        });
        assert_eq!(directive, Directive::Stop);

        let ModeOutcome::Valuations(vals) = c.finish().outcome else {
            panic!("expected valuations");
        };
        assert_eq!(vals.len(), 1);
        assert_eq!(vals[0].value_of("a"), Some(TruthValue::Undetermined));
        assert_eq!(vals[0].value_of("b"), Some(TruthValue::Undetermined));
        assert_eq!(vals[0].depth(), 0);
    }

    #[test]
    fn callbacks_after_stop_are_absorbed() {
        let mut c = checker(0, Mode::All, 0, 1);
        let view = FixedView {
            level: ROOT_LEVEL,
            values: vec![Some(true), Some(false)],
        };
        assert_eq!(c.on_fixpoint(&view), Directive::Stop);
        assert_eq!(c.on_fixpoint(&view), Directive::Stop);
        assert_eq!(c.on_fixpoint(&view), Directive::Stop);

        let report = c.finish();
        assert_eq!(report.stats.emitted, 1);
        assert_eq!(report.stats.late_callbacks, 2);
    }

    #[test]
    fn restart_resets_branch_counters_but_not_accumulation() {
        let mut c = checker(1, Mode::Brave, 0, 0);
        c.on_fixpoint(&FixedView {
            level: ROOT_LEVEL + 1,
            values: vec![Some(true), Some(false)],
        });
        assert_eq!(c.callbacks_since_restart(), 1);

        c.on_restart();
        assert_eq!(c.callbacks_since_restart(), 0);

        c.on_fixpoint(&FixedView {
            level: ROOT_LEVEL + 1,
            values: vec![Some(false), Some(true)],
        });
        let report = c.finish();
        let ModeOutcome::Consequences(cons) = report.outcome else {
            panic!("expected consequences");
        };
        assert_eq!(cons.explored, 2);
        assert_eq!(cons.atoms.len(), 2);
        assert_eq!(report.stats.restarts, 1);
    }

    #[test]
    fn shallow_partial_fixpoints_are_skipped() {
        let mut c = checker(2, Mode::All, 0, 0);
        let directive = c.on_fixpoint(&FixedView {
            level: ROOT_LEVEL + 1,
            values: vec![Some(true), None],
        });
        assert_eq!(directive, Directive::Continue);
        assert_eq!(c.finish().stats.emitted, 0);
    }

    #[test]
    fn decide_follows_defaults() {
        let rules = HeuristicRuleSet::parse("h.lp", "-b :- not b.\n").unwrap();
        let mut c = FixpointChecker::new(1, ModeController::new(Mode::All, 0, 0), vec![rules]);
        c.on_init(&bindings(&["a", "b"]));
        let view = FixedView {
            level: ROOT_LEVEL,
            values: vec![None, None],
        };
        let lit = c.decide(&view, Lit::negative(Var::new(0)));
        assert_eq!(lit, Lit::negative(Var::new(1)));
    }

    #[test]
    fn baseline_tags_mark_every_atom() {
        let mut c = FixpointChecker::new(0, ModeController::new(Mode::All, 0, 1), Vec::new())
            .with_baseline_tags(true);
        c.on_init(&bindings(&["a", "b"]));
        c.on_fixpoint(&FixedView {
            level: ROOT_LEVEL,
            values: vec![Some(true), None],
        });
        let ModeOutcome::Valuations(vals) = c.finish().outcome else {
            panic!("expected valuations");
        };
        assert!(vals[0].entries().iter().all(|e| e.tag == Provenance::Baseline));
    }
}
