mod cli;
mod logging;
mod signals;

use std::fs;
use std::process::ExitCode;

use anyhow::{ensure, Context};
use clap::Parser;
use engine_logging::{engine_debug, engine_error, engine_info};
use wikidump_core::StopReason;
use wikidump_engine::{BatchScheduler, Cancellation, DumpReader};

use crate::cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            engine_error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let logs_dir = cli.logs_dir();
    let prepared = fs::create_dir_all(&logs_dir);
    logging::initialize(&logs_dir);
    prepared.with_context(|| format!("cannot create {}", logs_dir.display()))?;

    ensure!(
        cli.filename.is_file(),
        "input file {} not found",
        cli.filename.display()
    );
    engine_debug!("memory hint {} MB is not enforced", cli.mem_limit);

    let cancel = Cancellation::new();
    let scheduler = BatchScheduler::with_pandoc(cli.run_config(), cancel.clone())
        .context("cannot start conversion")?;
    signals::install(&scheduler.runtime_handle(), cancel);

    let reader = DumpReader::open(&cli.filename)?;
    engine_info!("Reading {}", cli.filename.display());
    let summary = scheduler
        .run(reader)
        .with_context(|| format!("conversion of {} failed", cli.filename.display()))?;

    if summary.stop_reason == StopReason::Cancelled {
        engine_info!(
            "Stopped early; rerun with the same --output to resume at position {}",
            summary.checkpoint.position
        );
    }
    Ok(())
}
