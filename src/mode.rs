//! Enumeration policy: what to do with each discovered valuation.
//!
//! - **All** forwards every valuation in discovery order.
//! - **Brave** keeps the union of true atoms over every valuation.
//! - **Cautious** keeps the intersection of true atoms over every valuation.
//!
//! Brave and cautious sets are defined over the valuations actually explored
//! under the configured depth and enumeration limit. They are *not* a claim
//! about all answer sets of the program; [`Consequences::explored`] records how
//! many valuations they rest on so the output can say so.
//!
//! Accumulation is never reset by engine restarts: the sets cover the full
//! explored history of one run.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::solver::Directive;
use crate::valuation::Valuation;

/// Enumeration mode.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    All,
    Brave,
    Cautious,
}

impl Mode {
    /// Enumeration limit used when none is given: the first valuation for
    /// `All`, every explored valuation for the consequence modes.
    pub fn default_limit(self) -> usize {
        match self {
            Self::All => 1,
            Self::Brave | Self::Cautious => 0,
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Brave => write!(f, "brave"),
            Self::Cautious => write!(f, "cautious"),
        }
    }
}

/// Brave or cautious consequences over the explored valuations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Consequences {
    pub mode: Mode,
    /// Number of valuations the set was computed from.
    pub explored: usize,
    pub atoms: BTreeSet<String>,
}

impl Consequences {
    /// No valuation was found at all, as opposed to an empty consequence set.
    pub fn is_none_found(&self) -> bool {
        self.explored == 0
    }
}

/// What the controller hands downstream at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeOutcome {
    Valuations(Vec<Valuation>),
    Consequences(Consequences),
}

/// Mode-specific accumulator deciding when the search may stop.
#[derive(Debug, Clone)]
pub struct ModeController {
    mode: Mode,
    /// Cap on forwarded valuations in `All` mode; 0 is unbounded.
    max_valuations: usize,
    /// Cap on explored valuations; 0 is unbounded.
    limit: usize,
    explored: usize,
    stopped: bool,
    forwarded: Vec<Valuation>,
    brave: BTreeSet<String>,
    /// `None` until the first valuation arrives.
    cautious: Option<BTreeSet<String>>,
}

impl ModeController {
    pub fn new(mode: Mode, max_valuations: usize, limit: usize) -> Self {
        Self {
            mode,
            max_valuations,
            limit,
            explored: 0,
            stopped: false,
            forwarded: Vec::new(),
            brave: BTreeSet::new(),
            cautious: None,
        }
    }

    /// Take one valuation, in discovery order.
    pub fn accept(&mut self, valuation: Valuation) -> Directive {
        if self.stopped {
            return Directive::Stop;
        }
        self.explored += 1;

        match self.mode {
            Mode::All => self.forwarded.push(valuation),
            Mode::Brave => {
                self.brave.extend(valuation.true_atoms().map(str::to_string));
            }
            Mode::Cautious => {
                let current: BTreeSet<String> = valuation.true_atoms().map(str::to_string).collect();
                self.cautious = Some(match self.cautious.take() {
                    None => current,
                    Some(running) => running.intersection(&current).cloned().collect(),
                });
            }
        }

        let max_reached = self.mode == Mode::All
            && self.max_valuations > 0
            && self.forwarded.len() >= self.max_valuations;
        let limit_reached = self.limit > 0 && self.explored >= self.limit;
        if max_reached || limit_reached {
            tracing::debug!(explored = self.explored, mode = %self.mode, "valuation limit reached");
            self.stopped = true;
            Directive::Stop
        } else {
            Directive::Continue
        }
    }

    pub fn finish(self) -> ModeOutcome {
        match self.mode {
            Mode::All => ModeOutcome::Valuations(self.forwarded),
            Mode::Brave => ModeOutcome::Consequences(Consequences {
                mode: Mode::Brave,
                explored: self.explored,
                atoms: self.brave,
            }),
            Mode::Cautious => ModeOutcome::Consequences(Consequences {
                mode: Mode::Cautious,
                explored: self.explored,
                atoms: self.cautious.unwrap_or_default(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provenance::Provenance;
    use crate::valuation::{AtomValue, TruthValue};

    fn valuation(seq: usize, values: &[(&str, TruthValue)]) -> Valuation {
        let entries = values
            .iter()
            .map(|(a, v)| AtomValue {
                atom: a.to_string(),
                value: *v,
                tag: Provenance::Untagged,
            })
            .collect();
        Valuation::new(seq, 2, entries)
    }

    fn ab(a: TruthValue, b: TruthValue) -> Valuation {
        valuation(1, &[("a", a), ("b", b)])
    }

    fn atoms(outcome: ModeOutcome) -> Consequences {
        match outcome {
            ModeOutcome::Consequences(c) => c,
            ModeOutcome::Valuations(_) => panic!("expected consequences"),
        }
    }

    #[test]
    fn all_mode_stops_at_max_valuations() {
        let mut ctl = ModeController::new(Mode::All, 1, 0);
        assert_eq!(ctl.accept(ab(TruthValue::True, TruthValue::False)), Directive::Stop);
        // Late arrivals are absorbed.
        assert_eq!(ctl.accept(ab(TruthValue::False, TruthValue::True)), Directive::Stop);
        match ctl.finish() {
            ModeOutcome::Valuations(v) => assert_eq!(v.len(), 1),
            ModeOutcome::Consequences(_) => panic!("expected valuations"),
        }
    }

    #[test]
    fn all_mode_unbounded_preserves_order() {
        let mut ctl = ModeController::new(Mode::All, 0, 0);
        for seq in 1..=3 {
            assert_eq!(
                ctl.accept(valuation(seq, &[("a", TruthValue::True)])),
                Directive::Continue
            );
        }
        let ModeOutcome::Valuations(v) = ctl.finish() else {
            panic!("expected valuations");
        };
        let order: Vec<usize> = v.iter().map(Valuation::sequence).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn enumeration_limit_applies_to_every_mode() {
        for mode in [Mode::All, Mode::Brave, Mode::Cautious] {
            let mut ctl = ModeController::new(mode, 0, 2);
            assert_eq!(ctl.accept(ab(TruthValue::True, TruthValue::False)), Directive::Continue);
            assert_eq!(ctl.accept(ab(TruthValue::False, TruthValue::True)), Directive::Stop);
        }
    }

    #[test]
    fn brave_is_union_and_cautious_is_intersection() {
        let vals = [
            valuation(1, &[("a", TruthValue::True), ("b", TruthValue::False), ("c", TruthValue::True)]),
            valuation(2, &[("a", TruthValue::False), ("b", TruthValue::True), ("c", TruthValue::True)]),
        ];
        let mut brave = ModeController::new(Mode::Brave, 0, 0);
        let mut cautious = ModeController::new(Mode::Cautious, 0, 0);
        for v in &vals {
            brave.accept(v.clone());
            cautious.accept(v.clone());
        }
        let brave = atoms(brave.finish());
        let cautious = atoms(cautious.finish());

        assert_eq!(brave.atoms.iter().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(cautious.atoms.iter().collect::<Vec<_>>(), vec!["c"]);
        assert!(brave.atoms.is_superset(&cautious.atoms));
        assert_eq!(brave.explored, 2);
    }

    #[test]
    fn cautious_without_valuations_is_none_found() {
        let ctl = ModeController::new(Mode::Cautious, 0, 0);
        let c = atoms(ctl.finish());
        assert!(c.is_none_found());
        assert!(c.atoms.is_empty());
    }

    #[test]
    fn empty_intersection_is_not_none_found() {
        let mut ctl = ModeController::new(Mode::Cautious, 0, 0);
        ctl.accept(ab(TruthValue::True, TruthValue::False));
        ctl.accept(ab(TruthValue::False, TruthValue::True));
        let c = atoms(ctl.finish());
        assert!(c.atoms.is_empty());
        assert!(!c.is_none_found());
    }

    #[test]
    fn undetermined_atoms_are_never_consequences() {
        let mut ctl = ModeController::new(Mode::Brave, 0, 0);
        ctl.accept(ab(TruthValue::Undetermined, TruthValue::Undetermined));
        let c = atoms(ctl.finish());
        assert!(c.atoms.is_empty());
        assert_eq!(c.explored, 1);
    }
}
