//! k-lingo CLI: bounded-depth three-valued reasoning over ground programs.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use klingo::config::{ColorChoice, ConfigLayer, RunConfiguration};
use klingo::error::KlingoResult;
use klingo::mode::Mode;
use klingo::render::{render_json, render_text};
use klingo::run::run;

#[derive(Parser)]
#[command(
    name = "klingo",
    version,
    about = "Bounded-depth three-valued valuations of ground answer-set programs"
)]
struct Cli {
    /// Path to a ground logic program.
    program: PathBuf,

    /// Depth of the reasoner: branching decisions allowed before reporting.
    #[arg(short = 'k', long, allow_negative_numbers = true)]
    depth: Option<i64>,

    /// Bounded-nonmonotonic output: tag every atom, `[b]` when no default
    /// governs it.
    #[arg(long)]
    bnm: bool,

    /// Enumeration mode.
    #[arg(long, value_enum)]
    mode: Option<Mode>,

    /// Print the engine's own answer block.
    #[arg(long, overrides_with = "no_clingo_output")]
    clingo_output: bool,

    /// Do not print the engine's own answer block.
    #[arg(long, overrides_with = "clingo_output")]
    no_clingo_output: bool,

    /// Colour truth values.
    #[arg(long, value_enum)]
    color: Option<ColorChoice>,

    /// Restart strategy handed to the search engine, e.g. `L,100` or `no`.
    #[arg(long)]
    restart_strategy: Option<String>,

    /// Number of valuations to explore (0 = all).
    #[arg(short = 'n')]
    models: Option<usize>,

    /// Default-rule file to inject (repeatable).
    #[arg(long)]
    heuristics: Vec<PathBuf>,

    /// Cap on valuations reported in `all` mode (0 = unbounded).
    #[arg(long)]
    max_valuations: Option<usize>,

    /// Display the atom dictionary.
    #[arg(long)]
    dictionary: bool,

    /// Display per-callback depth diagnostics.
    #[arg(long)]
    debug: bool,

    /// Write defaults learned from this run to a file.
    #[arg(long, value_name = "PATH")]
    learn_defaults: Option<PathBuf>,

    /// Read default settings from a TOML file.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print the report as JSON.
    #[arg(long)]
    json: bool,

    /// Append search statistics.
    #[arg(long)]
    stats: bool,
}

impl Cli {
    /// Settings given on the command line; unset flags fall through.
    fn layer(&self) -> ConfigLayer {
        let clingo_output = if self.clingo_output {
            Some(true)
        } else if self.no_clingo_output {
            Some(false)
        } else {
            None
        };
        ConfigLayer {
            depth: self.depth,
            mode: self.mode,
            max_valuations: self.max_valuations,
            models: self.models,
            heuristics: (!self.heuristics.is_empty()).then(|| self.heuristics.clone()),
            bnm: self.bnm.then_some(true),
            restart_strategy: self.restart_strategy.clone(),
            clingo_output,
            color: self.color,
            dictionary: self.dictionary.then_some(true),
            debug: self.debug.then_some(true),
            json: self.json.then_some(true),
            stats: self.stats.then_some(true),
            learn_defaults: self.learn_defaults.clone(),
        }
    }
}

fn init_tracing(debug: bool, color: ColorChoice) {
    let filter = if debug {
        tracing_subscriber::EnvFilter::new("klingo=debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(color.enabled_for(&std::io::stderr()))
        .init();
}

fn execute(cli: &Cli) -> KlingoResult<()> {
    let file_layer = match &cli.config {
        Some(path) => ConfigLayer::load(path)?,
        None => ConfigLayer::default(),
    };
    let config = RunConfiguration::resolve(cli.program.clone(), file_layer.merge(cli.layer()))?;
    init_tracing(config.output.debug, config.output.color);

    let report = run(&config)?;
    if config.output.json {
        println!("{}", render_json(&report)?);
    } else {
        print!("{}", render_text(&report, &config.output));
    }
    Ok(())
}

fn main() -> ExitCode {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    let cli = Cli::parse();
    match execute(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = err.exit_code();
            eprintln!("{:?}", miette::Report::new(err));
            ExitCode::from(code)
        }
    }
}
