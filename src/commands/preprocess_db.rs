use crate::batch::{BatchRunner, BatchSummary};
use crate::config::ClgenConfig;
use crate::progress::{ProgressConfig, ProgressManager};
use crate::store::{DatasetStore, SqliteStore};
use crate::toolchain::{ProcessToolchain, Toolchain};
use anyhow::{Context, Result};
use colored::*;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct PreprocessDbOptions {
    pub db: PathBuf,
    /// Run even when the dataset is not marked as modified.
    pub force: bool,
    /// Worker bound overriding the configuration.
    pub jobs: Option<usize>,
    pub progress: ProgressConfig,
}

/// Preprocess a dataset if it has changed since the last run.
///
/// Returns `None` when there was nothing to do.
pub fn preprocess_db<T: Toolchain + ?Sized>(
    toolchain: &T,
    config: &ClgenConfig,
    options: &PreprocessDbOptions,
) -> Result<Option<BatchSummary>> {
    let mut store = SqliteStore::open_existing(&options.db)
        .with_context(|| format!("Failed to open dataset {}", options.db.display()))?;
    if store.is_github()? {
        log::debug!("{} carries repository metadata", options.db.display());
    }

    if !options.force && !store.is_modified()? {
        log::info!("{} is up to date", options.db.display());
        return Ok(None);
    }

    let runner = BatchRunner::new(toolchain, config)
        .with_max_workers(options.jobs.unwrap_or(0))
        .with_progress(ProgressManager::new(options.progress.clone()));
    let summary = runner.run(&mut store, || SqliteStore::open_existing(&options.db))?;
    Ok(Some(summary))
}

pub fn handle_preprocess_db(config: &ClgenConfig, options: &PreprocessDbOptions) -> Result<()> {
    let toolchain = ProcessToolchain::from_config(&config.toolchain)?;
    match preprocess_db(&toolchain, config, options)? {
        Some(summary) => print_summary(&summary),
        None => println!("{}", "Nothing to do: dataset is up to date".dimmed()),
    }
    Ok(())
}

fn print_summary(summary: &BatchSummary) {
    let counts = &summary.counts;
    println!(
        "{} {} kernels on {} workers ({} cached)",
        "Preprocessed".bold(),
        counts.attempted,
        summary.workers,
        counts.skipped
    );
    println!("  {:<9} {}", "accepted".green(), counts.accepted);
    println!("  {:<9} {}", "bad".red(), counts.bad);
    println!("  {:<9} {}", "ugly".yellow(), counts.ugly);
}
