//! Run configuration: one immutable record built before the search starts.
//!
//! Settings come from up to two layers, merged field by field with the later
//! layer winning:
//!
//! 1. an optional TOML file (`--config`), keys mirroring the long options,
//! 2. the command line.
//!
//! ```toml
//! depth = 2
//! mode = "brave"
//! restart-strategy = "L,100"
//! heuristics = ["learned.lp"]
//! bnm = true
//! color = "never"
//! ```
//!
//! [`RunConfiguration::resolve`] validates the merged layer once; nothing is
//! changed afterwards.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::mode::Mode;
use crate::solver::RestartStrategy;

/// When to colour truth values.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    Always,
    Never,
    /// Colour only when stdout is a terminal.
    #[default]
    Auto,
}

impl ColorChoice {
    /// Whether stdout output is coloured.
    pub fn enabled(self) -> bool {
        self.enabled_for(&std::io::stdout())
    }

    /// Whether output written to `stream` is coloured.
    pub fn enabled_for(self, stream: &impl IsTerminal) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => stream.is_terminal(),
        }
    }
}

/// Output toggles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OutputOptions {
    /// Print the engine's own answer block after the valuations.
    pub clingo_output: bool,
    pub color: ColorChoice,
    /// Print the atom → literal table.
    pub dictionary: bool,
    /// Per-callback depth diagnostics.
    pub debug: bool,
    /// Emit one JSON report instead of text.
    pub json: bool,
    /// Append search statistics.
    pub stats: bool,
}

/// Validated, immutable settings for one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunConfiguration {
    pub program: PathBuf,
    /// Depth bound `k`: decisions allowed before a valuation is reported.
    pub depth: u32,
    pub mode: Mode,
    /// Cap on valuations reported in `all` mode; 0 is unbounded.
    pub max_valuations: usize,
    /// Enumeration limit `n`; 0 is unbounded.
    pub limit: usize,
    pub heuristics: Vec<PathBuf>,
    /// Bounded-nonmonotonic tagging: atoms no default governs are reported
    /// as `[b]` even when no heuristic file is loaded.
    pub bnm: bool,
    pub restart: RestartStrategy,
    /// Where to write learned defaults, if anywhere.
    pub learn_defaults: Option<PathBuf>,
    pub output: OutputOptions,
}

impl RunConfiguration {
    /// Defaults for `program`.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            depth: 0,
            mode: Mode::All,
            max_valuations: 0,
            limit: Mode::All.default_limit(),
            heuristics: Vec::new(),
            bnm: false,
            restart: RestartStrategy::None,
            learn_defaults: None,
            output: OutputOptions::default(),
        }
    }

    /// Validate a merged layer into a configuration.
    pub fn resolve(program: impl Into<PathBuf>, layer: ConfigLayer) -> Result<Self, ConfigError> {
        let depth = layer.depth.unwrap_or(0);
        if depth < 0 {
            return Err(ConfigError::NegativeDepth { depth });
        }
        let depth = u32::try_from(depth).unwrap_or(u32::MAX);

        let mode = layer.mode.unwrap_or_default();
        let max_valuations = layer.max_valuations.unwrap_or(0);
        if max_valuations > 0 && mode != Mode::All {
            return Err(ConfigError::ConflictingFlags {
                message: format!("--max-valuations only applies to `all` mode, not `{mode}`"),
            });
        }

        let restart = match layer.restart_strategy.as_deref() {
            Some(name) => name.parse()?,
            None => RestartStrategy::None,
        };

        Ok(Self {
            program: program.into(),
            depth,
            mode,
            max_valuations,
            limit: layer.models.unwrap_or_else(|| mode.default_limit()),
            heuristics: layer.heuristics.unwrap_or_default(),
            bnm: layer.bnm.unwrap_or(false),
            restart,
            learn_defaults: layer.learn_defaults,
            output: OutputOptions {
                clingo_output: layer.clingo_output.unwrap_or(false),
                color: layer.color.unwrap_or_default(),
                dictionary: layer.dictionary.unwrap_or(false),
                debug: layer.debug.unwrap_or(false),
                json: layer.json.unwrap_or(false),
                stats: layer.stats.unwrap_or(false),
            },
        })
    }
}

/// One source of settings. Every field is optional; unset fields fall
/// through to the layer below.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConfigLayer {
    pub depth: Option<i64>,
    pub mode: Option<Mode>,
    pub max_valuations: Option<usize>,
    /// Enumeration limit, as `-n` on the command line.
    pub models: Option<usize>,
    pub heuristics: Option<Vec<PathBuf>>,
    pub bnm: Option<bool>,
    pub restart_strategy: Option<String>,
    pub clingo_output: Option<bool>,
    pub color: Option<ColorChoice>,
    pub dictionary: Option<bool>,
    pub debug: Option<bool>,
    pub json: Option<bool>,
    pub stats: Option<bool>,
    pub learn_defaults: Option<PathBuf>,
}

impl ConfigLayer {
    /// Load from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::parse(&path.display().to_string(), &content)
    }

    pub fn parse(path: &str, content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    /// Overlay `over` on `self`: fields set in `over` win.
    pub fn merge(self, over: ConfigLayer) -> ConfigLayer {
        ConfigLayer {
            depth: over.depth.or(self.depth),
            mode: over.mode.or(self.mode),
            max_valuations: over.max_valuations.or(self.max_valuations),
            models: over.models.or(self.models),
            heuristics: over.heuristics.or(self.heuristics),
            bnm: over.bnm.or(self.bnm),
            restart_strategy: over.restart_strategy.or(self.restart_strategy),
            clingo_output: over.clingo_output.or(self.clingo_output),
            color: over.color.or(self.color),
            dictionary: over.dictionary.or(self.dictionary),
            debug: over.debug.or(self.debug),
            json: over.json.or(self.json),
            stats: over.stats.or(self.stats),
            learn_defaults: over.learn_defaults.or(self.learn_defaults),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = RunConfiguration::resolve("p.lp", ConfigLayer::default()).unwrap();
        assert_eq!(config, RunConfiguration::new("p.lp"));
        assert_eq!(config.limit, 1);
        assert_eq!(config.output.color, ColorChoice::Auto);
    }

    #[test]
    fn explicit_color_choice_ignores_the_stream() {
        assert!(!ColorChoice::Never.enabled_for(&std::io::stderr()));
        assert!(ColorChoice::Always.enabled_for(&std::io::stderr()));
    }

    #[test]
    fn consequence_modes_default_to_unbounded_enumeration() {
        for mode in [Mode::Brave, Mode::Cautious] {
            let layer = ConfigLayer {
                mode: Some(mode),
                ..Default::default()
            };
            assert_eq!(RunConfiguration::resolve("p.lp", layer).unwrap().limit, 0);
        }
    }

    #[test]
    fn negative_depth_is_rejected() {
        let layer = ConfigLayer {
            depth: Some(-1),
            ..Default::default()
        };
        let err = RunConfiguration::resolve("p.lp", layer).unwrap_err();
        assert!(matches!(err, ConfigError::NegativeDepth { depth: -1 }));
    }

    #[test]
    fn max_valuations_conflicts_with_consequence_modes() {
        let layer = ConfigLayer {
            mode: Some(Mode::Cautious),
            max_valuations: Some(3),
            ..Default::default()
        };
        let err = RunConfiguration::resolve("p.lp", layer).unwrap_err();
        assert!(matches!(err, ConfigError::ConflictingFlags { .. }));
    }

    #[test]
    fn unknown_restart_strategy_is_rejected() {
        let layer = ConfigLayer {
            restart_strategy: Some("sometimes".into()),
            ..Default::default()
        };
        let err = RunConfiguration::resolve("p.lp", layer).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownRestartStrategy { .. }));
    }

    #[test]
    fn later_layer_wins() {
        let file = ConfigLayer::parse("k.toml", "depth = 2\nmode = \"brave\"\ncolor = \"never\"\n").unwrap();
        let cli = ConfigLayer {
            depth: Some(5),
            ..Default::default()
        };
        let config = RunConfiguration::resolve("p.lp", file.merge(cli)).unwrap();
        assert_eq!(config.depth, 5);
        assert_eq!(config.mode, Mode::Brave);
        assert_eq!(config.output.color, ColorChoice::Never);
    }

    #[test]
    fn bnm_is_read_from_file() {
        let layer = ConfigLayer::parse("k.toml", "bnm = true
").unwrap();
        assert!(RunConfiguration::resolve("p.lp", layer).unwrap().bnm);
        assert!(!RunConfiguration::new("p.lp").bnm);
    }

    #[test]
    fn toml_keys_are_kebab_case() {
        let layer = ConfigLayer::parse(
            "k.toml",
            "restart-strategy = \"L,64\"\nmax-valuations = 2\nheuristics = [\"a.lp\", \"b.lp\"]\n",
        )
        .unwrap();
        let config = RunConfiguration::resolve("p.lp", layer).unwrap();
        assert_eq!(config.restart, RestartStrategy::Luby(64));
        assert_eq!(config.max_valuations, 2);
        assert_eq!(config.heuristics.len(), 2);
    }

    #[test]
    fn unknown_toml_key_is_a_parse_error() {
        let err = ConfigLayer::parse("k.toml", "dept = 2\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn missing_config_file_is_read_error() {
        let err = ConfigLayer::load(Path::new("/nonexistent/klingo.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
