use crate::store::{PurgeReport, SqliteStore, StatusCounts};
use anyhow::{Context, Result};
use indicatif::HumanBytes;
use std::path::Path;

pub fn handle_remove_bad(db: &Path) -> Result<PurgeReport> {
    let mut store = SqliteStore::open_existing(db)
        .with_context(|| format!("Failed to open dataset {}", db.display()))?;
    println!("{}", render_status_counts(&store.status_counts()?));
    log::info!("vacuuming {}", db.display());

    let report = store.purge_rejected()?;
    println!(
        "done. cleared {} records, new size {}. ({:.0}% reduction)",
        report.purged,
        HumanBytes(report.size_after),
        report.reduction_percent()
    );
    Ok(report)
}

/// One-line breakdown of stored outcomes.
fn render_status_counts(counts: &StatusCounts) -> String {
    format!(
        "{} preprocessed: {} accepted, {} bad, {} ugly",
        counts.total(),
        counts.accepted,
        counts.bad,
        counts.ugly
    )
}
