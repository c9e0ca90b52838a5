use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use std::path::PathBuf;
use std::time::Instant;

use forest_fire_common::SweepConfig;
use forest_fire_engine::{output, ExperimentRunner};

/// Forest fire parameter sweep.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Sweep configuration (TOML). Runs the reference batch when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the number of repeats per parameter combination.
    #[arg(long)]
    iterations: Option<u32>,

    /// Override the step bound of every run.
    #[arg(long)]
    max_steps: Option<u32>,

    /// Override the base seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Run the sweep on the current thread only.
    #[arg(long)]
    serial: bool,

    /// Directory for the output files.
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,
}

fn main() -> Result<()> {
    // Initialize the logger
    env_logger::init();
    let args = Args::parse();

    info!("Starting forest fire sweep...");

    // --- Load Configuration ---
    let mut config = match &args.config {
        Some(path) => SweepConfig::load(path)?,
        None => {
            info!("No config given; using the reference batch.");
            SweepConfig::default()
        }
    };
    if let Some(iterations) = args.iterations {
        config.sweep.iterations = iterations;
    }
    if let Some(max_steps) = args.max_steps {
        config.sweep.max_steps = max_steps;
    }
    if let Some(seed) = args.seed {
        config.sweep.seed = seed;
    }
    if args.serial {
        config.sweep.parallel = false;
    }
    debug!("Sweep configuration: {:#?}", config);

    if config.sweep.parallel {
        info!("Using {} Rayon threads.", rayon::current_num_threads());
    }

    // --- Run the sweep ---
    let runner = ExperimentRunner::new(&config)?;
    let progress = ProgressBar::new(runner.total_runs() as u64);
    progress.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} runs ({elapsed})")
            .context("invalid progress template")?,
    );
    let start_time = Instant::now();
    let records = runner.run_with(|_| progress.inc(1))?;
    progress.finish_and_clear();
    info!(
        "Sweep finished in {:.3} seconds ({} runs).",
        start_time.elapsed().as_secs_f64(),
        records.len()
    );

    // --- Save Recorded Data ---
    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Failed to create output directory '{}'", args.output_dir.display()))?;
    let table = output::table_path(
        &args.output_dir,
        &config.output.base_filename,
        config.sweep.iterations,
        config.sweep.max_steps,
    );
    output::save_table(&table, &records, runner.parameter_names())?;

    if config.output.save_history {
        let history = output::history_path(&args.output_dir, &config.output.base_filename, config.output.format);
        output::save_history(&history, &records, config.output.format)?;
    } else {
        info!("Skipping per-step history as per config (save_history is false).");
    }

    info!("Sweep Complete.");
    Ok(())
}
