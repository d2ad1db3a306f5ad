//! `lpb split`: run only the edge split and report or export it.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use linkbench_core::timing::timed;
use linkbench_core::{Edge, EdgeSplit, Partition, SplitSummary, split_edges_seeded};
use tracing::info;

use super::input::InputArgs;
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct SplitArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Write the six edge sets as `<partition>_pos.txt` / `<partition>_neg.txt`.
    #[arg(long)]
    pub out_dir: Option<PathBuf>,
}

/// Execute `lpb split`.
///
/// # Errors
///
/// Returns an error if inputs cannot be loaded, the split fails, or the
/// edge sets cannot be written.
pub fn run_split(args: &SplitArgs, output: OutputMode, cwd: &Path) -> Result<()> {
    let config = args.input.config(cwd)?;
    let graph = args.input.load_graph()?;
    let split = timed("split", || split_edges_seeded(&graph, &config.split, config.seed))?;
    let summary = split.summary();

    if let Some(dir) = &args.out_dir {
        write_split(&split, dir)?;
        info!(dir = %dir.display(), "edge sets written");
    }

    render_mode(output, &summary, render_text, render_pretty)
}

/// Write each partition's positives and negatives as edge lists under `dir`.
///
/// # Errors
///
/// Returns an error if `dir` cannot be created or a file cannot be written.
pub fn write_split(split: &EdgeSplit, dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    for partition in [Partition::Train, Partition::Val, Partition::Test] {
        for (suffix, edges) in [
            ("pos", split.positives(partition)),
            ("neg", split.negatives(partition)),
        ] {
            let path = dir.join(format!("{partition}_{suffix}.txt"));
            write_edges(&path, edges)
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
    }
    Ok(())
}

fn write_edges(path: &Path, edges: &[Edge]) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    for edge in edges {
        writeln!(out, "{} {}", edge.u(), edge.v())?;
    }
    out.flush()
}

fn render_text(summary: &SplitSummary, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "partition\tpos\tneg")?;
    writeln!(w, "train\t{}\t{}", summary.train_pos, summary.train_neg)?;
    writeln!(w, "val\t{}\t{}", summary.val_pos, summary.val_neg)?;
    writeln!(w, "test\t{}\t{}", summary.test_pos, summary.test_neg)
}

fn render_pretty(summary: &SplitSummary, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, "Split")?;
    pretty_kv(w, "graph", format!("{} nodes, {} edges", summary.nodes, summary.edges))?;
    pretty_kv(w, "train", format!("{} pos / {} neg", summary.train_pos, summary.train_neg))?;
    pretty_kv(w, "val", format!("{} pos / {} neg", summary.val_pos, summary.val_neg))?;
    pretty_kv(w, "test", format!("{} pos / {} neg", summary.test_pos, summary.test_neg))
}
