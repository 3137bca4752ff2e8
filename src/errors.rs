//! Error taxonomy for the preprocessing pipeline.
//!
//! Errors fall into three classes that drive what happens to a source unit:
//!
//! - **Bad**: the kernel does not compile, or the analysis pass rejects its
//!   bytecode. The unit is recorded with status 1.
//! - **Ugly**: the kernel compiles but is not worth training on (too few
//!   instructions, nothing for the rewriter to do). The unit is recorded with
//!   status 2.
//! - **Tool**: the local toolchain itself is broken (formatter failure, a tool
//!   that cannot be spawned). This aborts the run instead of marking one unit.
//!
//! # Example
//!
//! ```rust
//! use clgen_preprocess::errors::{ErrorClass, PreprocessError};
//!
//! let err = PreprocessError::compile("error: use of undeclared identifier 'x'");
//! assert_eq!(err.class(), ErrorClass::Bad);
//! ```

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::toolchain::Tool;

/// How a per-unit failure is treated by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Kernel failed to compile or analyse.
    Bad,
    /// Kernel is valid but uninteresting.
    Ugly,
    /// Toolchain is broken; never recorded against a unit.
    Tool,
}

/// Failure while invoking an external tool.
#[derive(Debug, Error)]
pub enum ToolchainError {
    #[error("{tool} not found (looked for '{program}')")]
    NotFound { tool: Tool, program: String },

    #[error("failed to spawn {tool}: {source}")]
    Spawn {
        tool: Tool,
        #[source]
        source: io::Error,
    },

    #[error("I/O error talking to {tool}: {source}")]
    Io {
        tool: Tool,
        #[source]
        source: io::Error,
    },
}

/// Failure while preprocessing a single source unit.
#[derive(Debug, Error)]
pub enum PreprocessError {
    /// clang exited non-zero while compiling or preprocessing.
    #[error("{stderr}")]
    Compile { stderr: String },

    /// opt exited non-zero while counting instructions.
    #[error("{output}")]
    Analysis { output: String },

    /// Bytecode has fewer instructions than the configured minimum.
    #[error("Code contains {count} instructions. The minimum allowed is {minimum}")]
    InstructionCount { count: u64, minimum: u64 },

    /// The rewriter found nothing to rename. Carries the unrewritten text.
    #[error("{text}")]
    NothingToRewrite { text: String },

    /// clang-format exited non-zero.
    #[error("clang-format failed: {stderr}")]
    Format { stderr: String },

    #[error(transparent)]
    Toolchain(#[from] ToolchainError),

    /// Scratch file for the rewriter could not be created.
    #[error("failed to stage source for rewriting: {0}")]
    Staging(#[source] io::Error),
}

impl PreprocessError {
    pub fn compile(stderr: impl Into<String>) -> Self {
        Self::Compile {
            stderr: stderr.into(),
        }
    }

    pub fn analysis(output: impl Into<String>) -> Self {
        Self::Analysis {
            output: output.into(),
        }
    }

    /// Classify this error for recording or propagation.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Compile { .. } | Self::Analysis { .. } => ErrorClass::Bad,
            Self::InstructionCount { .. } | Self::NothingToRewrite { .. } => ErrorClass::Ugly,
            Self::Format { .. } | Self::Toolchain(_) | Self::Staging(_) => ErrorClass::Tool,
        }
    }
}

/// Failure reading or writing the dataset store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("unknown preprocessing status {0}")]
    UnknownStatus(i64),

    #[error("dataset not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("I/O error on dataset: {0}")]
    Io(#[from] io::Error),
}

/// Failure of a whole batch run.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("scratch space error at {}: {source}", path.display())]
    Scratch {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    #[error("worker {worker} failed on unit {unit}: {source}")]
    Worker {
        worker: usize,
        unit: String,
        #[source]
        source: PreprocessError,
    },

    #[error("worker {worker} panicked: {message}")]
    WorkerPanicked { worker: usize, message: String },

    #[error("failed to preprocess {unit}: {source}")]
    Unit {
        unit: String,
        #[source]
        source: PreprocessError,
    },

    #[error("I/O error on {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl BatchError {
    pub fn scratch(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Scratch {
            path: path.into(),
            source,
        }
    }

    pub fn file(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::File {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_and_analysis_are_bad() {
        assert_eq!(PreprocessError::compile("x").class(), ErrorClass::Bad);
        assert_eq!(PreprocessError::analysis("x").class(), ErrorClass::Bad);
    }

    #[test]
    fn test_rewriter_and_instcount_are_ugly() {
        let nothing = PreprocessError::NothingToRewrite {
            text: "kernel void A() {}".into(),
        };
        let starved = PreprocessError::InstructionCount {
            count: 1,
            minimum: 3,
        };
        assert_eq!(nothing.class(), ErrorClass::Ugly);
        assert_eq!(starved.class(), ErrorClass::Ugly);
    }

    #[test]
    fn test_formatter_failure_is_tool_error() {
        let err = PreprocessError::Format {
            stderr: "boom".into(),
        };
        assert_eq!(err.class(), ErrorClass::Tool);
    }

    #[test]
    fn test_instruction_count_message() {
        let err = PreprocessError::InstructionCount {
            count: 2,
            minimum: 10,
        };
        assert_eq!(
            err.to_string(),
            "Code contains 2 instructions. The minimum allowed is 10"
        );
    }

    #[test]
    fn test_nothing_to_rewrite_displays_source() {
        let err = PreprocessError::NothingToRewrite {
            text: "kernel void A() {}".into(),
        };
        assert_eq!(err.to_string(), "kernel void A() {}");
    }
}
