//! Provenance tags: how an atom's reported value relates to injected defaults.
//!
//! Tags are attached per atom per run and never form part of the atom's
//! identity. Without any heuristic file every atom is [`Provenance::Untagged`],
//! which keeps plain output identical to a heuristic-free reasoner.

use serde::{Deserialize, Serialize};

/// How a reported value relates to the loaded defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provenance {
    /// No heuristics were loaded for this run.
    #[default]
    Untagged,
    /// Heuristics were loaded, but none governs this atom.
    Baseline,
    /// A default governs the atom, but it was left undetermined.
    HeuristicApplied,
    /// The atom's value agrees with its default.
    Confirmed,
    /// The atom's value contradicts its default.
    Disconfirmed,
}

impl Provenance {
    /// Prefix rendered inside `V(...)`.
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Untagged => "",
            Self::Baseline => "[b]",
            Self::HeuristicApplied => "[h]",
            Self::Confirmed => "[c]",
            Self::Disconfirmed => "[d]",
        }
    }
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Untagged => write!(f, "untagged"),
            Self::Baseline => write!(f, "baseline"),
            Self::HeuristicApplied => write!(f, "heuristic-applied"),
            Self::Confirmed => write!(f, "confirmed"),
            Self::Disconfirmed => write!(f, "disconfirmed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_match_output_format() {
        assert_eq!(Provenance::Untagged.prefix(), "");
        assert_eq!(Provenance::Baseline.prefix(), "[b]");
        assert_eq!(Provenance::HeuristicApplied.prefix(), "[h]");
        assert_eq!(Provenance::Confirmed.prefix(), "[c]");
        assert_eq!(Provenance::Disconfirmed.prefix(), "[d]");
    }
}
