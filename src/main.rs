mod cli;
mod logging;
mod term_progress;

use anyhow::Context;
use clap::Parser;
use cli::Cli;
use dotenv::dotenv;
use std::io;
use std::process;
use term_progress::TermReporter;
use tracing::{error, info};

use file_inventory::config::load_configuration;
use file_inventory::{report, InventoryEngine};

fn main() {
    dotenv().ok();

    let args = Cli::parse();

    let log_file = logging::log_file_path(args.log_file.as_deref());
    let _guard = logging::init_logger(&log_file, args.verbose);

    if let Err(err) = run(&args) {
        error!("Error: {:#}", err);
        process::exit(1);
    }
}

/// load config → scan → extract → detect → report → persist
fn run(args: &Cli) -> anyhow::Result<()> {
    let mut config = load_configuration(&args.config)
        .with_context(|| format!("loading configuration '{}'", args.config))?;
    if let Some(store) = &args.store {
        config.store_path = store.clone();
    }
    if let Some(workers) = args.workers.filter(|n| *n > 0) {
        config.workers = workers;
    }
    info!(
        "Inventory of {} roots into {}",
        config.enabled_roots().count(),
        config.store_path.display()
    );

    let engine = InventoryEngine::new(config).with_force(args.force_flags());
    let reporter = TermReporter::new();
    let outcome = engine.execute(&reporter)?;

    println!();
    report::write_summary(&mut io::stdout().lock(), &outcome)?;
    if let Some(path) = &args.duplicates_csv {
        report::write_duplicates_csv(path, &outcome.duplicates)?;
        info!("Duplicate groups written to {}", path.display());
    }

    if args.dry_run {
        info!("Dry run, {} left untouched", engine.store().path().display());
        return Ok(());
    }
    engine.persist(&outcome, &reporter)?;
    Ok(())
}
