//! Configuration for the preprocessing pipeline.
//!
//! Configuration is read from a `.clgen.toml` file discovered in the current
//! directory or one of its ancestors (see [`load_config`]). Every section and
//! every key is optional; missing values take the documented defaults.
//!
//! ```toml
//! [toolchain]
//! clang = "/opt/llvm/bin/clang"
//! shim = "/opt/clgen/shim.h"
//!
//! [policy]
//! min_instructions = 0
//!
//! [batch]
//! max_workers = 16
//! ```

mod format;
mod loader;
mod toolchain;

pub use format::FormatStyle;
pub use loader::{
    directory_ancestors, load_config, load_config_from, parse_config, CONFIG_FILE_NAME,
};
pub use toolchain::{default_disabled_warnings, ToolchainConfig, CLANG_CL_TARGETS};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ClgenConfig {
    #[serde(default)]
    pub toolchain: ToolchainConfig,

    #[serde(default)]
    pub policy: PolicyConfig,

    #[serde(default)]
    pub format: FormatStyle,

    #[serde(default)]
    pub batch: BatchConfig,
}

/// Accept/reject thresholds.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PolicyConfig {
    /// Kernels with fewer instructions than this are ugly.
    ///
    /// Defaults to 0, which accepts everything that compiles. Raise it to drop
    /// trivial kernels from the training set.
    #[serde(default)]
    pub min_instructions: u64,
}

/// Worker pool settings for dataset runs.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct BatchConfig {
    /// Upper bound on worker threads. `None` means four per CPU core.
    #[serde(default)]
    pub max_workers: Option<usize>,

    /// Parent directory for per-run scratch output. `None` uses the system
    /// temporary directory.
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,
}

impl BatchConfig {
    /// Worker bound after applying the default.
    ///
    /// Toolchain calls spend most of their time in child processes, so the
    /// default oversubscribes the cores.
    pub fn effective_max_workers(&self) -> usize {
        self.max_workers
            .filter(|n| *n > 0)
            .unwrap_or_else(|| num_cpus::get() * 4)
    }
}

/// Commented default configuration written by `init`.
pub const DEFAULT_CONFIG_TOML: &str = r#"# clgen-preprocess configuration

[toolchain]
clang = "clang"
opt = "opt"
clang_format = "clang-format"
rewriter = "clgen-rewriter"
# libclc = "/opt/libclc/generic/include"
# shim = "/opt/clgen/shim.h"
target = "nvptx64-nvidia-nvcl"
error_limit = 0
disabled_warnings = [
    "ignored-pragmas",
    "implicit-function-declaration",
    "incompatible-library-redeclaration",
    "macro-redefined",
]
use_shim = true

[policy]
# Kernels with fewer LLVM instructions are marked ugly.
min_instructions = 0

[format]
BasedOnStyle = "Google"
ColumnLimit = 500
IndentWidth = 2
AllowShortBlocksOnASingleLine = false
AllowShortCaseLabelsOnASingleLine = false
AllowShortFunctionsOnASingleLine = false
AllowShortLoopsOnASingleLine = false
AllowShortIfStatementsOnASingleLine = false
DerivePointerAlignment = false
PointerAlignment = "Left"

[batch]
# max_workers = 16
# scratch_dir = "/var/tmp/clgen"
"#;
