//! Progress feedback for batch runs using `indicatif`.
//!
//! A run shows one bar shared by all workers, advanced once per kernel.
//!
//! # Progress Behavior
//!
//! - **Quiet Mode**: No progress output (respects `CLGEN_QUIET` env var and `--quiet` flag)
//! - **Non-TTY**: Bars are hidden in CI and piped output
//!
//! # Examples
//!
//! ```rust,no_run
//! use clgen_preprocess::progress::{ProgressConfig, ProgressManager, TEMPLATE_KERNELS};
//!
//! let manager = ProgressManager::new(ProgressConfig::from_env(false));
//! let progress = manager.create_bar(100, TEMPLATE_KERNELS);
//! progress.set_message("Preprocessing");
//! for _ in 0..100 {
//!     progress.inc(1);
//! }
//! progress.finish_with_message("Preprocessing complete");
//! ```

use indicatif::{ProgressBar, ProgressStyle};

// Progress bar templates
pub const TEMPLATE_KERNELS: &str =
    "⚙️  {msg} {pos}/{len} kernels ({percent}%) - {per_sec} - {eta}";
pub const TEMPLATE_FILES: &str = "📁 {msg} {pos}/{len} files ({percent}%) - {eta}";

/// Configuration for progress display behavior
#[derive(Debug, Clone, Default)]
pub struct ProgressConfig {
    /// Whether to suppress all progress output
    pub quiet_mode: bool,
}

impl ProgressConfig {
    /// Create progress configuration from environment and CLI arguments
    pub fn from_env(quiet: bool) -> Self {
        let env_quiet = std::env::var("CLGEN_QUIET").is_ok();
        Self {
            quiet_mode: quiet || env_quiet,
        }
    }

    /// A configuration that never shows anything.
    pub fn quiet() -> Self {
        Self { quiet_mode: true }
    }

    /// Determine if progress bars should be displayed
    pub fn should_show_progress(&self) -> bool {
        if self.quiet_mode {
            return false;
        }

        use std::io::IsTerminal;
        std::io::stderr().is_terminal()
    }
}

/// Creates bars according to a [`ProgressConfig`].
#[derive(Debug, Clone, Default)]
pub struct ProgressManager {
    config: ProgressConfig,
}

impl ProgressManager {
    pub fn new(config: ProgressConfig) -> Self {
        Self { config }
    }

    /// Create a progress bar with the given length and template
    ///
    /// Returns a hidden progress bar if progress should not be shown
    pub fn create_bar(&self, len: u64, template: &str) -> ProgressBar {
        if !self.config.should_show_progress() {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(len);
        match ProgressStyle::default_bar().template(template) {
            Ok(style) => pb.set_style(style.progress_chars("█▓▒░  ")),
            Err(e) => log::debug!("invalid progress template '{}': {}", template, e),
        }
        pb
    }
}
