use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use dynbin_massloss::report::{self, FigureOptions};

/// Render the four-panel comparison figure from a time-series CSV produced by `mloss`.
#[derive(Parser, Debug)]
#[command(author, version, about = "Mass-loss figure renderer")]
struct Cli {
    /// Input CSV path
    #[arg(long, default_value = "artifacts/mloss.csv")]
    input: PathBuf,

    /// Output PNG path
    #[arg(long, default_value = "artifacts/mloss.png")]
    output: PathBuf,

    /// Image width in pixels
    #[arg(long, default_value_t = 1200)]
    width: u32,

    /// Image height in pixels
    #[arg(long, default_value_t = 900)]
    height: u32,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let records = report::read_records(&cli.input)
        .with_context(|| format!("reading {}", cli.input.display()))?;
    if records.is_empty() {
        anyhow::bail!("no valid rows in {}", cli.input.display());
    }

    let options = FigureOptions {
        width: cli.width,
        height: cli.height,
    };
    report::render_figure(&records, &cli.output, options)
        .with_context(|| format!("rendering {}", cli.output.display()))?;
    tracing::info!(path = %cli.output.display(), rows = records.len(), "wrote figure");
    println!("Wrote {}", cli.output.display());
    Ok(())
}
