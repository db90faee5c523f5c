//! One k-lingo invocation: read, search, collect, learn.
//!
//! [`run`] performs a single deterministic pass and returns a [`RunReport`].
//! Nothing is printed here; rendering happens afterwards, at the process
//! boundary, so the search itself never waits on output.

use std::path::PathBuf;

use serde::Serialize;

use crate::checker::{CheckerStats, FixpointChecker};
use crate::config::RunConfiguration;
use crate::error::{KlingoResult, ProgramError};
use crate::heuristic::{self, HeuristicRuleSet};
use crate::learner::LearnedDefaultSet;
use crate::mode::{Mode, ModeController, ModeOutcome};
use crate::program::{GroundProgram, parse_program};
use crate::solver::{SolveStats, SolveStatus, Solver, SolverConfig};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// One `--dictionary` line: an atom and its solver literal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DictionaryEntry {
    pub atom: String,
    pub literal: u32,
}

/// Where learned defaults went.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LearnedSummary {
    pub path: PathBuf,
    pub rules: usize,
}

/// Search counters from the engine and the checker.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunStats {
    pub search: SolveStats,
    pub checker: CheckerStats,
    /// Default rules added to the program before the search.
    pub injected_defaults: usize,
}

/// Everything one run produced, ready for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub version: &'static str,
    pub program: PathBuf,
    pub depth: u32,
    pub mode: Mode,
    pub result: ModeOutcome,
    /// The engine's final status and the stable models it reached.
    pub status: SolveStatus,
    pub models: Vec<Vec<String>>,
    pub dictionary: Vec<DictionaryEntry>,
    pub learned: Option<LearnedSummary>,
    pub stats: RunStats,
}

/// Run `config` against the program file it names.
pub fn run(config: &RunConfiguration) -> KlingoResult<RunReport> {
    let name = config.program.display().to_string();
    let text = std::fs::read_to_string(&config.program).map_err(|e| ProgramError::Read {
        path: name.clone(),
        source: e,
    })?;
    let program = parse_program(&name, &text)?;
    run_program(config, program)
}

/// Run `config` against an already parsed program.
pub fn run_program(config: &RunConfiguration, mut program: GroundProgram) -> KlingoResult<RunReport> {
    let heuristics = config
        .heuristics
        .iter()
        .map(|path| HeuristicRuleSet::load(path))
        .collect::<Result<Vec<_>, _>>()?;
    let injected_defaults = if heuristics.is_empty() {
        0
    } else {
        heuristic::inject_defaults(&mut program, &heuristics)
    };

    tracing::info!(
        program = %config.program.display(),
        atoms = program.atom_count(),
        rules = program.rules().len(),
        depth = config.depth,
        mode = %config.mode,
        "starting search"
    );

    let mut solver = Solver::new(
        program,
        SolverConfig {
            restart: config.restart,
        },
    );
    let controller = ModeController::new(config.mode, config.max_valuations, config.limit);
    let mut checker =
        FixpointChecker::new(config.depth, controller, heuristics).with_baseline_tags(config.bnm);
    let solved = solver.solve(&mut checker);
    let checked = checker.finish();

    let learned = match &config.learn_defaults {
        Some(path) => {
            let source = config.program.display().to_string();
            let set = match &checked.outcome {
                ModeOutcome::Valuations(vals) => {
                    LearnedDefaultSet::from_valuations(vals, &source, config.depth)
                }
                ModeOutcome::Consequences(cons) => {
                    LearnedDefaultSet::from_consequences(cons, &source, config.depth)
                }
            };
            set.write(path)?;
            Some(LearnedSummary {
                path: path.clone(),
                rules: set.len(),
            })
        }
        None => None,
    };

    let dictionary = checked
        .registry
        .dictionary()
        .into_iter()
        .map(|(atom, literal)| DictionaryEntry { atom, literal })
        .collect();

    tracing::info!(
        emitted = checked.stats.emitted,
        status = %solved.status,
        interrupted = solved.interrupted,
        "run finished"
    );

    Ok(RunReport {
        version: VERSION,
        program: config.program.clone(),
        depth: config.depth,
        mode: config.mode,
        result: checked.outcome,
        status: solved.status,
        models: solved.models,
        dictionary,
        learned,
        stats: RunStats {
            search: solved.stats,
            checker: checked.stats,
            injected_defaults,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigLayer;
    use crate::valuation::TruthValue;

    fn config(layer: ConfigLayer) -> RunConfiguration {
        RunConfiguration::resolve("mem.lp", layer).unwrap()
    }

    fn program(text: &str) -> GroundProgram {
        parse_program("mem.lp", text).unwrap()
    }

    #[test]
    fn depth_zero_even_loop_is_undetermined() {
        let report = run_program(
            &config(ConfigLayer::default()),
            program("a :- not b. b :- not a."),
        )
        .unwrap();
        let ModeOutcome::Valuations(vals) = report.result else {
            panic!("expected valuations");
        };
        assert_eq!(vals.len(), 1);
        assert_eq!(vals[0].value_of("a"), Some(TruthValue::Undetermined));
        assert_eq!(vals[0].value_of("b"), Some(TruthValue::Undetermined));
        // The first stop came at the root, before any model was reached.
        assert_eq!(report.status, SolveStatus::Unknown);
    }

    #[test]
    fn total_program_gives_one_complete_valuation() {
        let report = run_program(
            &config(ConfigLayer {
                depth: Some(3),
                models: Some(0),
                ..Default::default()
            }),
            program("p. q :- p. r :- not q."),
        )
        .unwrap();
        let ModeOutcome::Valuations(vals) = report.result else {
            panic!("expected valuations");
        };
        assert_eq!(vals.len(), 1);
        assert!(vals[0].is_complete());
        assert_eq!(report.status, SolveStatus::Satisfiable);
    }

    #[test]
    fn dictionary_lists_derivable_atoms() {
        let report = run_program(&config(ConfigLayer::default()), program("a. b :- a.")).unwrap();
        let atoms: Vec<&str> = report.dictionary.iter().map(|d| d.atom.as_str()).collect();
        assert_eq!(atoms, vec!["a", "b"]);
    }

    #[test]
    fn missing_program_is_program_error() {
        let err = run(&RunConfiguration::new("/nonexistent/program.lp")).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_PROGRAM);
    }
}
