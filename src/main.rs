use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;

use imbal_eval::{DEFAULT_RUNS, DefaultRunner, Driver, DriverConfig, EvaluationSettings};

#[derive(Parser)]
#[command(name = "imbal")]
#[command(about = "Average SMOTE + decision tree holdout metrics over imbalanced ARFF datasets")]
#[command(version)]
struct Cli {
    /// ARFF files to evaluate (defaults to the twelve final_datasets/ files)
    files: Vec<PathBuf>,

    /// Number of randomized runs averaged per file
    #[arg(
        long,
        default_value_t = DEFAULT_RUNS,
        value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..)
    )]
    runs: usize,

    /// Seed for the split-seed generator (omit for fresh entropy on every invocation)
    #[arg(long)]
    seed: Option<u64>,

    /// Log a failing file and continue with the next one
    #[arg(long)]
    keep_going: bool,

    /// Enable verbose (debug-level) logging
    #[arg(long)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let seeds = match cli.seed {
        Some(seed) => {
            info!(seed, "split seeds are reproducible");
            ChaCha8Rng::seed_from_u64(seed)
        }
        None => ChaCha8Rng::from_entropy(),
    };

    let mut config = DriverConfig::new()
        .with_runs(cli.runs)
        .with_keep_going(cli.keep_going);
    if !cli.files.is_empty() {
        config = config.with_files(cli.files);
    }
    let n_files = config.files().len();

    let mut runner = DefaultRunner::with_settings(EvaluationSettings::default(), seeds);
    let stdout = std::io::stdout();
    let report = Driver::new(config)
        .run(&mut runner, &mut stdout.lock())
        .context("evaluation failed")?;

    info!(
        completed = report.completed,
        failed = report.failed.len(),
        "all files processed"
    );
    if !report.failed.is_empty() {
        bail!("{} of {n_files} files failed", report.failed.len());
    }

    Ok(())
}
