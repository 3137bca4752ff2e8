use super::BatchCounts;
use crate::errors::BatchError;
use crate::pipeline::Preprocessor;
use crate::store::DatasetStore;
use crate::toolchain::Toolchain;
use indicatif::ProgressBar;
use std::fs::File;
use std::io::{LineWriter, Write};
use std::ops::Range;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

/// One worker's share of a batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerJob {
    pub index: usize,
    /// Row positions in the content table, in insertion order.
    pub range: Range<usize>,
    /// Private scratch file receiving one record per line.
    pub output: PathBuf,
}

/// Preprocess every uncached unit of `job.range`, appending records to
/// `job.output`.
///
/// Records are flushed line by line so a failing worker still leaves every
/// finished record behind for the merge. The worker stops before its next unit
/// once `cancel` is raised.
pub fn run_worker<S, T>(
    job: &WorkerJob,
    store: &S,
    preprocessor: &Preprocessor<'_, T>,
    cancel: &AtomicBool,
    progress: &ProgressBar,
) -> Result<BatchCounts, BatchError>
where
    S: DatasetStore + ?Sized,
    T: Toolchain + ?Sized,
{
    log::debug!(
        "worker {} processing rows {:?} into {}",
        job.index,
        job.range,
        job.output.display()
    );

    let file = File::create(&job.output).map_err(|e| BatchError::scratch(&job.output, e))?;
    let mut out = LineWriter::new(file);
    let mut counts = BatchCounts::default();

    for unit in store.content_window(job.range.start, job.range.len())? {
        if cancel.load(Ordering::Relaxed) {
            log::debug!("worker {} cancelled", job.index);
            break;
        }
        progress.inc(1);

        if store.is_cached(&unit.id)? {
            counts.skipped += 1;
            continue;
        }

        let verdict = preprocessor
            .classify(&unit.contents)
            .map_err(|source| BatchError::Worker {
                worker: job.index,
                unit: unit.id.clone(),
                source,
            })?;
        log::debug!("{}: {}", unit.id, verdict.status());
        counts.record(verdict.status());

        let line = serde_json::to_string(&verdict.into_record(unit.id))
            .map_err(|e| BatchError::scratch(&job.output, e.into()))?;
        writeln!(out, "{line}").map_err(|e| BatchError::scratch(&job.output, e))?;
    }

    out.flush()
        .map_err(|e| BatchError::scratch(&job.output, e))?;
    Ok(counts)
}
