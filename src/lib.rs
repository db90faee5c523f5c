// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # klingo
//!
//! Bounded-depth, three-valued valuations of ground answer-set programs, as a
//! model of resource-limited inference.
//!
//! A search engine explores the program's branching tree; k-lingo watches it
//! and reports what is settled after at most `k` branching decisions. Atoms
//! the search has not settled by then are *undetermined* (`⊥`).
//!
//! ## Architecture
//!
//! - **Program** (`program`): ground rules and the textual reader
//! - **Solver** (`solver`): depth-first search engine with an observer interface
//! - **Registry** (`registry`): atom name ↔ engine variable, built once
//! - **Checker** (`checker`): decides at which fixpoints a valuation is reported
//! - **Valuations** (`valuation`): three-valued snapshots of all atoms
//! - **Modes** (`mode`): all / brave / cautious enumeration
//! - **Heuristics** (`heuristic`): default rules that bias and tag the search
//! - **Learner** (`learner`): turns reported truths back into default rules
//! - **Run** (`run`, `render`, `config`): one invocation, end to end
//!
//! ## Library usage
//!
//! ```no_run
//! use klingo::config::{ConfigLayer, RunConfiguration};
//! use klingo::render::render_text;
//! use klingo::run::run;
//!
//! let layer = ConfigLayer { depth: Some(1), models: Some(0), ..Default::default() };
//! let config = RunConfiguration::resolve("program.lp", layer).unwrap();
//! let report = run(&config).unwrap();
//! print!("{}", render_text(&report, &config.output));
//! ```

pub mod checker;
pub mod config;
pub mod error;
pub mod heuristic;
pub mod learner;
pub mod mode;
pub mod program;
pub mod provenance;
pub mod registry;
pub mod render;
pub mod run;
pub mod solver;
pub mod valuation;
