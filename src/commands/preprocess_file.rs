use crate::batch::{preprocess_file, preprocess_inplace, InplaceSummary};
use crate::config::ClgenConfig;
use crate::pipeline::{Preprocessor, Verdict};
use crate::progress::{ProgressConfig, ProgressManager};
use crate::toolchain::ProcessToolchain;
use anyhow::Result;
use colored::*;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Process exit status for a verdict: 0 accepted, 1 bad, 2 ugly.
pub fn verdict_exit_code(verdict: &Verdict) -> u8 {
    match verdict {
        Verdict::Accepted(_) => 0,
        Verdict::Bad(_) => 1,
        Verdict::Ugly(_) => 2,
    }
}

/// Preprocess one file, printing the result or writing it back.
///
/// Rejections print their diagnostic on stderr and map to a non-zero exit.
pub fn handle_preprocess_file(config: &ClgenConfig, path: &Path, inplace: bool) -> Result<ExitCode> {
    let toolchain = ProcessToolchain::from_config(&config.toolchain)?;
    let preprocessor = Preprocessor::new(&toolchain, config);
    let verdict = preprocess_file(&preprocessor, path, inplace)?;

    match &verdict {
        Verdict::Accepted(text) if !inplace => println!("{text}"),
        Verdict::Accepted(_) => log::info!("preprocessed {}", path.display()),
        Verdict::Bad(reason) | Verdict::Ugly(reason) => eprintln!("{reason}"),
    }
    Ok(ExitCode::from(verdict_exit_code(&verdict)))
}

pub fn handle_preprocess_inplace(
    config: &ClgenConfig,
    paths: &[PathBuf],
    jobs: Option<usize>,
    progress: ProgressConfig,
) -> Result<()> {
    let toolchain = ProcessToolchain::from_config(&config.toolchain)?;
    let max_workers = jobs
        .filter(|n| *n > 0)
        .unwrap_or_else(|| config.batch.effective_max_workers());
    let summary = preprocess_inplace(
        &toolchain,
        config,
        paths,
        max_workers,
        &ProgressManager::new(progress),
    )?;

    for (path, verdict) in &summary.rejected {
        let label = match verdict {
            Verdict::Bad(_) => "bad".red(),
            _ => "ugly".yellow(),
        };
        println!("{label} {}", path.display());
        log::debug!("{}: {}", path.display(), verdict.contents());
    }
    println!(
        "{} {} files on {} workers: {}",
        "Preprocessed".bold(),
        paths.len(),
        summary.workers,
        render_verdict_counts(&summary)
    );
    Ok(())
}

/// Files per verdict, e.g. `3 accepted, 1 bad, 0 ugly`.
fn render_verdict_counts(summary: &InplaceSummary) -> String {
    let bad = summary
        .rejected
        .iter()
        .filter(|(_, verdict)| matches!(verdict, Verdict::Bad(_)))
        .count();
    let ugly = summary.rejected.len() - bad;
    format!(
        "{} accepted, {} bad, {} ugly",
        summary.accepted.len(),
        bad,
        ugly
    )
}
