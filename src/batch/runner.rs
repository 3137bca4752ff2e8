use super::partition::partition;
use super::scratch::ScratchSpace;
use super::worker::{run_worker, WorkerJob};
use super::{BatchCounts, BatchSummary};
use crate::config::ClgenConfig;
use crate::errors::{BatchError, StoreError};
use crate::pipeline::Preprocessor;
use crate::progress::{ProgressConfig, ProgressManager, TEMPLATE_KERNELS};
use crate::store::{DatasetStore, ProcessedRecord};
use crate::toolchain::Toolchain;
use rayon::prelude::*;
use std::any::Any;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};

/// Preprocesses a whole dataset on a pool of workers.
///
/// Workers read through their own store handle and write only to private
/// scratch files. After the pool finishes, or fails, every scratch file is
/// merged into the store in one transaction; a worker error is returned only
/// after that merge.
pub struct BatchRunner<'a, T: Toolchain + ?Sized> {
    toolchain: &'a T,
    config: &'a ClgenConfig,
    max_workers: usize,
    progress: ProgressManager,
}

impl<'a, T: Toolchain + ?Sized> BatchRunner<'a, T> {
    pub fn new(toolchain: &'a T, config: &'a ClgenConfig) -> Self {
        Self {
            toolchain,
            config,
            max_workers: config.batch.effective_max_workers(),
            progress: ProgressManager::new(ProgressConfig::quiet()),
        }
    }

    /// Cap the pool size. Zero keeps the configured bound.
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        if max_workers > 0 {
            self.max_workers = max_workers;
        }
        self
    }

    pub fn with_progress(mut self, progress: ProgressManager) -> Self {
        self.progress = progress;
        self
    }

    /// Preprocess every uncached unit of `store`.
    ///
    /// `open` is called once per worker for that worker's read handle. The
    /// modified flag is cleared with the merge only if every worker succeeded.
    pub fn run<S, W, F>(&self, store: &mut S, open: F) -> Result<BatchSummary, BatchError>
    where
        S: DatasetStore + ?Sized,
        W: DatasetStore,
        F: Fn() -> Result<W, StoreError> + Sync,
    {
        let total = store.count_content_files()?;
        let cached = store.count_preprocessed_files()?;
        let workers = total.min(self.max_workers);

        let scratch = ScratchSpace::create(self.config.batch.scratch_dir.as_deref())?;
        let jobs: Vec<WorkerJob> = partition(total, workers)
            .into_iter()
            .enumerate()
            .map(|(index, range)| WorkerJob {
                index,
                range,
                output: scratch.job_path(index),
            })
            .collect();

        log::info!(
            "spawning {} worker threads to process {} files ...",
            workers,
            total.saturating_sub(cached)
        );
        let outcome = self.run_jobs(&jobs, &open, total);

        let merged = match finalize(store, &scratch, outcome.is_ok()) {
            Ok(merged) => merged,
            Err(e) => {
                let kept = scratch.keep();
                log::error!(
                    "merge failed, worker output kept in {}: {}",
                    kept.display(),
                    e
                );
                return Err(match outcome {
                    Err(worker_error) => worker_error,
                    Ok(_) => e,
                });
            }
        };
        if let Err(e) = scratch.dispose() {
            log::warn!("failed to remove scratch space: {}", e);
        }

        let counts = outcome?;
        Ok(BatchSummary {
            workers,
            merged,
            counts,
        })
    }

    fn run_jobs<W, F>(&self, jobs: &[WorkerJob], open: &F, total: usize) -> Result<BatchCounts, BatchError>
    where
        W: DatasetStore,
        F: Fn() -> Result<W, StoreError> + Sync,
    {
        if jobs.is_empty() {
            return Ok(BatchCounts::default());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs.len())
            .thread_name(|i| format!("clgen-worker-{i}"))
            .build()?;
        let preprocessor = Preprocessor::new(self.toolchain, self.config);
        let cancel = AtomicBool::new(false);
        let progress = self.progress.create_bar(total as u64, TEMPLATE_KERNELS);
        progress.set_message("Preprocessing");

        let results: Vec<Result<BatchCounts, BatchError>> = pool.install(|| {
            jobs.par_iter()
                .with_max_len(1)
                .map(|job| {
                    let result = panic::catch_unwind(AssertUnwindSafe(|| {
                        let store = open()?;
                        run_worker(job, &store, &preprocessor, &cancel, &progress)
                    }))
                    .unwrap_or_else(|payload| {
                        Err(BatchError::WorkerPanicked {
                            worker: job.index,
                            message: panic_message(payload.as_ref()),
                        })
                    });
                    if result.is_err() {
                        cancel.store(true, Ordering::Relaxed);
                    }
                    result
                })
                .collect()
        });
        progress.finish_and_clear();

        let mut counts = BatchCounts::default();
        let mut first_error = None;
        for result in results {
            match result {
                Ok(worker_counts) => counts += worker_counts,
                Err(e) if first_error.is_none() => first_error = Some(e),
                Err(e) => log::error!("{}", e),
            }
        }
        match first_error {
            Some(e) => {
                log::error!("batch run failed, salvaging worker output: {}", e);
                Err(e)
            }
            None => Ok(counts),
        }
    }
}

/// Merge every scratch file into `store` in one transaction.
///
/// Lines that do not parse, such as a record cut short by a crash, are skipped
/// with a warning.
pub fn finalize<S>(
    store: &mut S,
    scratch: &ScratchSpace,
    clear_modified: bool,
) -> Result<usize, BatchError>
where
    S: DatasetStore + ?Sized,
{
    log::debug!("worker finalize");
    let mut records = Vec::new();
    for path in scratch.outputs()? {
        let file = File::open(&path).map_err(|e| BatchError::scratch(&path, e))?;
        for (lineno, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| BatchError::scratch(&path, e))?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<ProcessedRecord>(&line) {
                Ok(record) => records.push(record),
                Err(e) => log::warn!(
                    "skipping malformed record at {}:{}: {}",
                    path.display(),
                    lineno + 1,
                    e
                ),
            }
        }
    }

    let merged = store.upsert_all(&records, clear_modified)?;
    log::info!("merged {} records", merged);
    Ok(merged)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
