//! Rich diagnostic error types for k-lingo.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes, help text, and source spans so users know exactly what
//! went wrong and how to fix it.
//!
//! Two conditions are deliberately *not* errors: a heuristic rule naming an atom
//! the grounded program does not contain (silently ignored), and a fixpoint
//! callback that arrives after a stop was requested (absorbed as a no-op).

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Exit code used for configuration (usage) errors.
pub const EXIT_USAGE: u8 = 2;

/// Exit code used when the input program cannot be read or grounded.
///
/// Mirrors the clasp/clingo convention for input errors.
pub const EXIT_PROGRAM: u8 = 65;

/// Exit code for any other runtime failure (heuristic files, output files).
pub const EXIT_FAILURE: u8 = 1;

/// Top-level error type for k-lingo.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain (error codes, help text, source spans) through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum KlingoError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Program(#[from] ProgramError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Heuristic(#[from] HeuristicError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Learn(#[from] LearnError),

    #[error("failed to encode JSON report")]
    #[diagnostic(code(klingo::render::json))]
    Json(#[from] serde_json::Error),
}

impl KlingoError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => EXIT_USAGE,
            Self::Program(_) => EXIT_PROGRAM,
            Self::Heuristic(_) | Self::Learn(_) | Self::Json(_) => EXIT_FAILURE,
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("depth must be non-negative, got {depth}")]
    #[diagnostic(
        code(klingo::config::negative_depth),
        help("The depth bound counts branching decisions. Use `-k 0` to reason without branching.")
    )]
    NegativeDepth { depth: i64 },

    #[error("unknown restart strategy: \"{name}\"")]
    #[diagnostic(
        code(klingo::config::restart_strategy),
        help(
            "Valid strategies are `no`, `F,<n>` (fixed), `L,<n>` (luby) and \
             `x,<n>,<factor>` (geometric). Long names `none`, `fixed`, `luby` \
             and `geometric` are accepted as well."
        )
    )]
    UnknownRestartStrategy { name: String },

    #[error("conflicting options: {message}")]
    #[diagnostic(
        code(klingo::config::conflict),
        help("Remove one of the conflicting options and run again.")
    )]
    ConflictingFlags { message: String },

    #[error("failed to read config file: {path}")]
    #[diagnostic(
        code(klingo::config::read),
        help("Ensure the config file exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {path}: {message}")]
    #[diagnostic(
        code(klingo::config::parse),
        help("Check the TOML syntax. Keys mirror the long command-line options, e.g. `depth = 2`.")
    )]
    Parse { path: String, message: String },
}

// ---------------------------------------------------------------------------
// Program (grounding/parsing) errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ProgramError {
    #[error("failed to read program: {path}")]
    #[diagnostic(
        code(klingo::program::read),
        help("Check that the path points to a readable ground logic program.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("syntax error: {message}")]
    #[diagnostic(
        code(klingo::program::syntax),
        help(
            "Statements are facts `a.`, rules `h :- b1, not b2.`, constraints \
             `:- b.` or choices `{{a; b}} :- c.`, each terminated by a period."
        )
    )]
    Syntax {
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("non-ground term: {term}")]
    #[diagnostic(
        code(klingo::program::non_ground),
        help("Only ground programs are accepted. Ground the program first, e.g. with `gringo --text`.")
    )]
    NonGround {
        term: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("variable")]
        span: SourceSpan,
    },

    #[error("unsupported directive: {directive}")]
    #[diagnostic(
        code(klingo::program::directive),
        help("Only `#show` directives are accepted in ground input; they are ignored.")
    )]
    UnsupportedDirective {
        directive: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("directive")]
        span: SourceSpan,
    },
}

// ---------------------------------------------------------------------------
// Heuristic errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum HeuristicError {
    #[error("failed to read heuristic file: {path}")]
    #[diagnostic(
        code(klingo::heuristic::read),
        help("Check the path passed to `--heuristics`.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed default rule at {path}:{line}: {text}")]
    #[diagnostic(
        code(klingo::heuristic::malformed),
        help(
            "Heuristic files hold one default per line, shaped `atom :- not -atom.` \
             or `-atom :- not atom.`. Lines starting with `%` are comments."
        )
    )]
    Malformed {
        path: String,
        line: usize,
        text: String,
    },
}

// ---------------------------------------------------------------------------
// Learning errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum LearnError {
    #[error("failed to write learned defaults: {path}")]
    #[diagnostic(
        code(klingo::learn::write),
        help("Ensure the output directory exists and is writable.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience alias for functions returning k-lingo results.
pub type KlingoResult<T> = std::result::Result<T, KlingoError>;
