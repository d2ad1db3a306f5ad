#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use linkbench_core::timing;
use output::{CliError, OutputMode};
use std::env;
use std::io::{self, Write};
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "lpb",
    author,
    version,
    about = "lpb: reproducible link-prediction benchmark",
    long_about = None
)]
struct Cli {
    /// Emit a per-stage timing report to stderr.
    #[arg(long, global = true)]
    timing: bool,

    /// Emit JSON output (same as `--format json`).
    #[arg(long, global = true)]
    json: bool,

    /// Output format: pretty, text, or json.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        output::resolve_output_mode(self.format, self.json)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Split a graph and score every predictor",
        long_about = "Hold out test and validation edges, sample matching non-edges, train each \
                      selected predictor on the remaining graph, and report ROC-AUC and average \
                      precision.",
        after_help = "EXAMPLES:\n    # Full benchmark with defaults\
                      \n    lpb run --edges cora.txt\n\n\
                      # Heuristics only, custom split\
                      \n    lpb run --edges cora.txt --predictors heuristic-AA,heuristic-JC \
                      --test-frac 0.2\n\n\
                      # Machine-readable output\
                      \n    lpb run --edges cora.txt --format json"
    )]
    Run(cmd::run::RunArgs),

    #[command(
        about = "Split a graph without running predictors",
        long_about = "Run only the edge split, print the set sizes, and optionally export the \
                      six edge sets as edge lists.",
        after_help = "EXAMPLES:\n    # Inspect the split sizes\
                      \n    lpb split --edges cora.txt --seed 7\n\n\
                      # Export edge sets\
                      \n    lpb split --edges cora.txt --out-dir split/"
    )]
    Split(cmd::split::SplitArgs),

    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n    # Bash completions\
                      \n    lpb completions bash > /etc/bash_completion.d/lpb"
    )]
    Completions {
        /// Target shell.
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Write the completion script for `shell` under the binary's own name.
fn write_completions(shell: Shell, w: &mut dyn Write) -> anyhow::Result<()> {
    let mut command = Cli::command();
    let name = command.get_name().to_string();
    clap_complete::generate(shell, &mut command, name, w);
    w.flush()?;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("LINKBENCH_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "linkbench=debug,info"
        } else {
            "linkbench=info,warn"
        })
    });

    let format = env::var("LINKBENCH_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry.with(fmt::layer().compact().with_writer(std::io::stderr)).init();
        }
    }
}

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();

    let timing_enabled = cli.timing || timing::timing_enabled_from_env();
    timing::set_timing_enabled(timing_enabled);
    timing::clear_timings();

    let output = cli.output_mode();
    let command_result = env::current_dir()
        .map_err(anyhow::Error::from)
        .and_then(|cwd| match &cli.command {
            Commands::Run(args) => {
                timing::timed("cmd.run", || cmd::run::run_run(args, output, &cwd))
            }
            Commands::Split(args) => {
                timing::timed("cmd.split", || cmd::split::run_split(args, output, &cwd))
            }
            Commands::Completions { shell } => write_completions(*shell, &mut io::stdout()),
        });

    if timing_enabled {
        let report = timing::collect_report();
        if report.is_empty() {
            eprintln!("timing report: no samples recorded");
        } else {
            eprintln!("timing report:");
            eprintln!("{}", report.display_table());
            if let Ok(json) = serde_json::to_string_pretty(&report) {
                eprintln!("timing report (json):");
                eprintln!("{json}");
            }
        }
    }

    match command_result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let cli_error = CliError::from(&err);
            if output::render_error(output, &cli_error).is_err() {
                eprintln!("error: {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}
