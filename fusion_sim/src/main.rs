// fusion_sim/src/main.rs

use clap::Parser;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use fusion_sim::prelude::*;
use fusion_sim::runner;

fn main() -> ExitCode {
    // Parse command-line arguments
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), SimError> {
    let config = SimConfig::load(cli.config.as_deref())?;
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    match cli.command {
        Command::Replay { input, strict } => {
            info!("Replaying measurements from: {}", input.display());
            let reader = BufReader::new(File::open(&input)?);
            let mut filter = UnscentedKalmanFilter::new(config.filter)?;
            let report = runner::run(&mut filter, parse_records(reader), &mut out, strict)?;
            report.log_summary();
        }
        Command::Synth { steps, seed, run } => {
            let mut scenario = config.scenario;
            if let Some(steps) = steps {
                scenario.steps = steps;
            }
            if let Some(seed) = seed {
                scenario.seed = seed;
            }

            let records = generate(&scenario, &config.filter)?;
            if run {
                let mut filter = UnscentedKalmanFilter::new(config.filter)?;
                let report =
                    runner::run(&mut filter, records.into_iter().map(Ok), &mut out, true)?;
                report.log_summary();
            } else {
                for record in &records {
                    writeln!(out, "{}", format_record(record))?;
                }
            }
        }
        Command::Config => write!(out, "{}", config.to_toml()?)?,
    }

    out.flush()?;
    Ok(())
}

/// Installs the fmt subscriber on stderr. `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .with_writer(io::stderr)
        .init();

    if verbose {
        info!("Verbose logging enabled (DEBUG level)");
    }
}
