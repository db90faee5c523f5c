//! Text and JSON rendering of a [`RunReport`].
//!
//! The text layout is consumed by scripts, so it is fixed:
//!
//! ```text
//! k-lingo version 0.1.0
//! Reading from program.lp
//! Running with k = 0
//!
//! 3ND-valuation found:
//! V(a) = ⊥
//! V(b) = ⊥
//! --------------------------------
//! ```
//!
//! Consequence modes print a `Brave consequences` or `Cautious consequences`
//! header followed by one line of atoms, or `(none)` when the set is empty.

use std::collections::BTreeSet;
use std::fmt;

use crossterm::style::Stylize;

use crate::config::OutputOptions;
use crate::error::KlingoResult;
use crate::mode::{Consequences, Mode, ModeOutcome};
use crate::run::RunReport;
use crate::valuation::{TruthValue, Valuation};

pub const DIVIDER: &str = "--------------------------------";

/// Render a report the way the command line prints it.
pub fn render_text(report: &RunReport, options: &OutputOptions) -> String {
    TextReport { report, options }.to_string()
}

/// Pretty-printed JSON report.
pub fn render_json(report: &RunReport) -> KlingoResult<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// `1`, `0` or `⊥`, coloured green, red or yellow when enabled.
pub fn value_symbol(value: TruthValue, color: bool) -> String {
    let symbol = value.symbol();
    if !color {
        return symbol.to_string();
    }
    match value {
        TruthValue::True => symbol.green().to_string(),
        TruthValue::False => symbol.red().to_string(),
        TruthValue::Undetermined => symbol.yellow().to_string(),
    }
}

/// The atoms printed under each `Answer: i` line.
///
/// In `all` mode every stable model is its own answer. In the consequence
/// modes answer `i` is the union (brave) or intersection (cautious) of models
/// `1..=i`, so the last answer is the consequence set.
pub fn clingo_answers(mode: Mode, models: &[Vec<String>]) -> Vec<Vec<String>> {
    let mut running: Option<BTreeSet<&str>> = None;
    models
        .iter()
        .map(|model| {
            let current: BTreeSet<&str> = model.iter().map(String::as_str).collect();
            let folded = match (mode, running.take()) {
                (Mode::All, _) => return model.clone(),
                (_, None) => current,
                (Mode::Brave, Some(acc)) => acc.union(&current).copied().collect(),
                (Mode::Cautious, Some(acc)) => acc.intersection(&current).copied().collect(),
            };
            let answer = folded.iter().map(|a| a.to_string()).collect();
            running = Some(folded);
            answer
        })
        .collect()
}

struct TextReport<'a> {
    report: &'a RunReport,
    options: &'a OutputOptions,
}

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.report;
        let options = self.options;
        let color = options.color.enabled();

        writeln!(f, "k-lingo version {}", report.version)?;
        writeln!(f, "Reading from {}", report.program.display())?;
        writeln!(f, "Running with k = {}", report.depth)?;
        writeln!(f)?;

        if options.dictionary {
            for entry in &report.dictionary {
                writeln!(f, "{} has solver literal {}", entry.atom, entry.literal)?;
            }
        }

        match &report.result {
            ModeOutcome::Valuations(vals) => {
                for valuation in vals {
                    write_valuation(f, valuation, color)?;
                }
            }
            ModeOutcome::Consequences(cons) => write_consequences(f, cons, report.depth)?,
        }

        if options.clingo_output {
            for (i, atoms) in clingo_answers(report.mode, &report.models).iter().enumerate() {
                writeln!(f, "Answer: {}", i + 1)?;
                writeln!(f, "{}", atoms.join(" "))?;
            }
            writeln!(f, "{}", report.status)?;
        }

        if let Some(learned) = &report.learned {
            writeln!(
                f,
                "% wrote {} default(s) to {}",
                learned.rules,
                learned.path.display()
            )?;
        }

        if options.stats {
            write_stats(f, report)?;
        }
        Ok(())
    }
}

fn write_valuation(f: &mut impl fmt::Write, valuation: &Valuation, color: bool) -> fmt::Result {
    writeln!(f, "3ND-valuation found:")?;
    for entry in valuation.entries() {
        writeln!(
            f,
            "V({}{}) = {}",
            entry.tag.prefix(),
            entry.atom,
            value_symbol(entry.value, color)
        )?;
    }
    writeln!(f, "{DIVIDER}")
}

fn write_consequences(f: &mut impl fmt::Write, consequences: &Consequences, depth: u32) -> fmt::Result {
    let header = match consequences.mode {
        Mode::Cautious => "Cautious consequences",
        Mode::Brave | Mode::All => "Brave consequences",
    };
    writeln!(f, "{header}")?;
    if consequences.is_none_found() {
        writeln!(f, "(none found)")?;
    } else if consequences.atoms.is_empty() {
        writeln!(f, "(none)")?;
    } else {
        let atoms: Vec<&str> = consequences.atoms.iter().map(String::as_str).collect();
        writeln!(f, "{}", atoms.join(" "))?;
    }
    writeln!(
        f,
        "% over {} explored valuation(s) at k = {}",
        consequences.explored, depth
    )
}

fn write_stats(f: &mut impl fmt::Write, report: &RunReport) -> fmt::Result {
    let search = &report.stats.search;
    let checker = &report.stats.checker;
    writeln!(f, "\nStatistics:")?;
    writeln!(f, "  decisions        : {}", search.decisions)?;
    writeln!(f, "  conflicts        : {}", search.conflicts)?;
    writeln!(f, "  restarts         : {}", search.restarts)?;
    writeln!(f, "  fixpoints        : {}", search.fixpoints)?;
    writeln!(f, "  models           : {}", search.models)?;
    writeln!(f, "  valuations       : {}", checker.emitted)?;
    writeln!(f, "  late callbacks   : {}", checker.late_callbacks)?;
    writeln!(f, "  governed atoms   : {}", checker.governed_atoms)?;
    writeln!(f, "  ignored defaults : {}", checker.ignored_defaults)?;
    writeln!(f, "  injected defaults: {}", report.stats.injected_defaults)
}
