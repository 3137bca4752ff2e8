use crate::config::ClgenConfig;
use crate::errors::BatchError;
use crate::pipeline::{Preprocessor, Verdict};
use crate::progress::{ProgressManager, TEMPLATE_FILES};
use crate::toolchain::Toolchain;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

/// Preprocess the kernel at `path`.
///
/// With `inplace`, an accepted kernel replaces the file contents. Rejected
/// kernels never touch the file.
pub fn preprocess_file<T: Toolchain + ?Sized>(
    preprocessor: &Preprocessor<'_, T>,
    path: &Path,
    inplace: bool,
) -> Result<Verdict, BatchError> {
    let bytes = fs::read(path).map_err(|e| BatchError::file(path, e))?;
    let src = String::from_utf8_lossy(&bytes);

    let verdict = preprocessor
        .classify(&src)
        .map_err(|source| BatchError::Unit {
            unit: path.display().to_string(),
            source,
        })?;

    if inplace {
        if let Verdict::Accepted(text) = &verdict {
            fs::write(path, text).map_err(|e| BatchError::file(path, e))?;
        }
    }
    Ok(verdict)
}

/// Outcome of preprocessing files in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InplaceSummary {
    pub workers: usize,
    /// Files rewritten with their preprocessed text.
    pub accepted: Vec<PathBuf>,
    /// Files left untouched, with the rejecting verdict.
    pub rejected: Vec<(PathBuf, Verdict)>,
}

/// Preprocess `paths` in place on `min(paths, max_workers)` threads.
///
/// The first tool failure stops the remaining files and is returned once the
/// running ones finish.
pub fn preprocess_inplace<T: Toolchain + ?Sized>(
    toolchain: &T,
    config: &ClgenConfig,
    paths: &[PathBuf],
    max_workers: usize,
    progress: &ProgressManager,
) -> Result<InplaceSummary, BatchError> {
    let workers = paths.len().min(max_workers.max(1));
    if workers == 0 {
        return Ok(InplaceSummary::default());
    }
    log::info!(
        "spawning {} worker threads to process {} files ...",
        workers,
        paths.len()
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("clgen-inplace-{i}"))
        .build()?;
    let preprocessor = Preprocessor::new(toolchain, config);
    let cancel = AtomicBool::new(false);
    let bar = progress.create_bar(paths.len() as u64, TEMPLATE_FILES);
    bar.set_message("Preprocessing");

    let results: Vec<Option<Result<Verdict, BatchError>>> = pool.install(|| {
        paths
            .par_iter()
            .map(|path| {
                if cancel.load(Ordering::Relaxed) {
                    return None;
                }
                log::info!("preprocess {}", path.display());
                let result = preprocess_file(&preprocessor, path, true);
                if result.is_err() {
                    cancel.store(true, Ordering::Relaxed);
                }
                bar.inc(1);
                Some(result)
            })
            .collect()
    });
    bar.finish_and_clear();

    let mut summary = InplaceSummary {
        workers,
        ..Default::default()
    };
    let mut first_error = None;
    for (path, result) in paths.iter().zip(results) {
        match result {
            Some(Ok(Verdict::Accepted(_))) => summary.accepted.push(path.clone()),
            Some(Ok(verdict)) => summary.rejected.push((path.clone(), verdict)),
            Some(Err(e)) if first_error.is_none() => first_error = Some(e),
            Some(Err(e)) => log::error!("{}", e),
            None => log::debug!("skipped {} after an earlier failure", path.display()),
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(summary),
    }
}
