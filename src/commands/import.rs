use crate::store::{ImportSummary, SqliteStore};
use anyhow::{Context, Result};
use std::path::Path;

pub fn handle_import(db: &Path, dir: &Path) -> Result<ImportSummary> {
    if !dir.is_dir() {
        anyhow::bail!("{} is not a directory", dir.display());
    }
    let mut store = SqliteStore::open(db)
        .with_context(|| format!("Failed to open dataset {}", db.display()))?;
    let summary = store
        .import_dir(dir)
        .with_context(|| format!("Failed to import {}", dir.display()))?;

    println!(
        "imported {} new kernels ({} files scanned)",
        summary.added, summary.scanned
    );
    Ok(summary)
}
