//! Distill explored valuations back into default rules.
//!
//! Every atom reported true becomes a default for itself: `a` yields
//! `a :- not -a.` and `-a` yields `-a :- not a.`. False and undetermined atoms
//! yield nothing. Rules are kept sorted by head and deduplicated, so rerunning
//! on the same program at the same depth writes a byte-identical file, and the
//! file reads back as a [`HeuristicRuleSet`](crate::heuristic::HeuristicRuleSet).

use std::collections::BTreeSet;
use std::path::Path;

use crate::error::LearnError;
use crate::heuristic::DefaultRule;
use crate::mode::{Consequences, Mode};
use crate::valuation::Valuation;

/// Learned defaults plus the metadata written into the file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LearnedDefaultSet {
    mode: Mode,
    source: String,
    depth: u32,
    rules: BTreeSet<DefaultRule>,
}

impl LearnedDefaultSet {
    pub fn from_atoms<'a>(
        atoms: impl IntoIterator<Item = &'a str>,
        mode: Mode,
        source: &str,
        depth: u32,
    ) -> Self {
        Self {
            mode,
            source: source.to_string(),
            depth,
            rules: atoms.into_iter().map(DefaultRule::new).collect(),
        }
    }

    /// Learn from a brave or cautious consequence set.
    pub fn from_consequences(consequences: &Consequences, source: &str, depth: u32) -> Self {
        Self::from_atoms(
            consequences.atoms.iter().map(String::as_str),
            consequences.mode,
            source,
            depth,
        )
    }

    /// Learn from enumerated valuations: every atom true in at least one.
    pub fn from_valuations(valuations: &[Valuation], source: &str, depth: u32) -> Self {
        Self::from_atoms(
            valuations.iter().flat_map(Valuation::true_atoms),
            Mode::All,
            source,
            depth,
        )
    }

    pub fn rules(&self) -> impl Iterator<Item = &DefaultRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// File contents: `%` header, one rule per line, trailing newline.
    pub fn render(&self) -> String {
        let origin = match self.mode {
            Mode::All => "all valuations".to_string(),
            mode => format!("{mode} consequences"),
        };
        let mut out = format!(
            "% learned defaults from {origin}\n% source: {}\n% depth: {}\n",
            self.source, self.depth
        );
        for rule in &self.rules {
            out.push_str(&rule.to_string());
            out.push('\n');
        }
        out
    }

    pub fn write(&self, path: &Path) -> Result<(), LearnError> {
        std::fs::write(path, self.render()).map_err(|e| LearnError::Write {
            path: path.display().to_string(),
            source: e,
        })?;
        tracing::info!(path = %path.display(), rules = self.len(), "wrote learned defaults");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristic::HeuristicRuleSet;

    fn brave(atoms: &[&str]) -> Consequences {
        Consequences {
            mode: Mode::Brave,
            explored: 2,
            atoms: atoms.iter().map(|a| a.to_string()).collect(),
        }
    }

    #[test]
    fn renders_sorted_rules_with_header() {
        let set = LearnedDefaultSet::from_consequences(&brave(&["b", "-c", "a"]), "train.lp", 2);
        assert_eq!(
            set.render(),
            "% learned defaults from brave consequences\n\
             % source: train.lp\n\
             % depth: 2\n\
             -c :- not c.\n\
             a :- not -a.\n\
             b :- not -b.\n"
        );
    }

    #[test]
    fn duplicates_collapse() {
        let set = LearnedDefaultSet::from_atoms(["a", "a", "b"], Mode::Cautious, "p.lp", 0);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn output_reads_back_as_heuristics() {
        let set = LearnedDefaultSet::from_consequences(&brave(&["flip(c1)", "-ok_rule"]), "t.lp", 1);
        let parsed = HeuristicRuleSet::parse("learned.lp", &set.render()).unwrap();
        let heads: Vec<&str> = parsed.rules().iter().map(DefaultRule::head).collect();
        assert_eq!(heads, vec!["-ok_rule", "flip(c1)"]);
    }

    #[test]
    fn empty_set_still_has_header() {
        let set = LearnedDefaultSet::from_consequences(&brave(&[]), "t.lp", 0);
        assert!(set.is_empty());
        assert_eq!(set.render().lines().count(), 3);
    }

    #[test]
    fn write_is_byte_identical_across_runs() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.lp");
        let second = dir.path().join("second.lp");
        LearnedDefaultSet::from_consequences(&brave(&["q", "p"]), "t.lp", 3)
            .write(&first)
            .unwrap();
        LearnedDefaultSet::from_consequences(&brave(&["p", "q"]), "t.lp", 3)
            .write(&second)
            .unwrap();
        assert_eq!(std::fs::read(&first).unwrap(), std::fs::read(&second).unwrap());
    }

    #[test]
    fn write_to_missing_directory_fails() {
        let set = LearnedDefaultSet::from_consequences(&brave(&["a"]), "t.lp", 0);
        let err = set.write(Path::new("/nonexistent/dir/learned.lp")).unwrap_err();
        assert!(matches!(err, LearnError::Write { .. }));
    }
}
