//! `lpb run`: split a graph and score every selected predictor.

use std::io::{self, Write};
use std::path::Path;

use anyhow::Result;
use clap::Args;
use linkbench_core::{BenchReport, PredictorKind};
use linkbench_predict::run_benchmark;
use tracing::info;

use super::input::InputArgs;
use crate::output::{OutputMode, metric_cell, pretty_kv, pretty_rule, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Comma-separated predictor codes (default: all six).
    #[arg(long, short = 'p', value_delimiter = ',')]
    pub predictors: Option<Vec<PredictorKind>>,
}

/// Execute `lpb run`.
///
/// # Errors
///
/// Returns an error if inputs cannot be loaded or any predictor fails.
pub fn run_run(args: &RunArgs, output: OutputMode, cwd: &Path) -> Result<()> {
    let mut config = args.input.config(cwd)?;
    if let Some(predictors) = &args.predictors {
        config.predictors.clone_from(predictors);
        config.validate()?;
    }

    let graph = args.input.load_graph()?;
    let features = args.input.load_features(graph.node_count())?;
    let report = run_benchmark(&graph, features.as_ref(), &config)?;
    info!(predictors = report.scores.len(), "benchmark complete");

    // JSON is always emitted; human output respects verbosity.
    if output.is_json() || config.verbosity.reports_metrics() {
        render_mode(output, &report, render_text, render_pretty)?;
    }
    Ok(())
}

fn render_text(report: &BenchReport, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "predictor\ttest_roc\ttest_ap\tval_roc\tval_ap")?;
    for (kind, scores) in &report.scores {
        writeln!(
            w,
            "{kind}\t{:.6}\t{:.6}\t{}\t{}",
            scores.test_roc,
            scores.test_ap,
            scores.val_roc.map_or_else(|| "-".to_string(), |v| format!("{v:.6}")),
            scores.val_ap.map_or_else(|| "-".to_string(), |v| format!("{v:.6}")),
        )?;
    }
    Ok(())
}

fn render_pretty(report: &BenchReport, w: &mut dyn Write) -> io::Result<()> {
    let split = &report.split;
    pretty_section(w, "Split")?;
    pretty_kv(w, "seed", report.seed.to_string())?;
    pretty_kv(w, "graph", format!("{} nodes, {} edges", split.nodes, split.edges))?;
    pretty_kv(w, "train", format!("{} pos / {} neg", split.train_pos, split.train_neg))?;
    pretty_kv(w, "val", format!("{} pos / {} neg", split.val_pos, split.val_neg))?;
    pretty_kv(w, "test", format!("{} pos / {} neg", split.test_pos, split.test_neg))?;
    writeln!(w)?;

    pretty_section(w, "Scores")?;
    writeln!(
        w,
        "{:<14} {:>9} {:>9} {:>9} {:>9}",
        "predictor", "test_roc", "test_ap", "val_roc", "val_ap"
    )?;
    for (kind, scores) in &report.scores {
        writeln!(
            w,
            "{:<14} {:>9} {:>9} {:>9} {:>9}",
            kind.code(),
            metric_cell(Some(scores.test_roc)),
            metric_cell(Some(scores.test_ap)),
            metric_cell(scores.val_roc),
            metric_cell(scores.val_ap),
        )?;
    }
    pretty_rule(w)
}
