//! Synchronous capability for running the external LLVM toolchain.
//!
//! Every external program the pipeline needs (clang, opt, clang-format and the
//! identifier rewriter) is driven through the [`Toolchain`] trait. An
//! [`Invocation`] names the tool, its arguments and an optional standard input
//! payload; the toolchain runs it to completion and returns the captured
//! [`ToolOutput`].
//!
//! Production code uses [`ProcessToolchain`], which spawns real subprocesses.
//! Tests substitute [`crate::testkit::MockToolchain`], which answers in-process.
//!
//! # Example
//!
//! ```rust,no_run
//! use clgen_preprocess::config::ToolchainConfig;
//! use clgen_preprocess::toolchain::{Invocation, ProcessToolchain, Tool, Toolchain};
//!
//! let toolchain = ProcessToolchain::from_config(&ToolchainConfig::default())?;
//! let output = toolchain.run(&Invocation::new(Tool::Clang).arg("--version"))?;
//! assert!(output.success());
//! # Ok::<(), clgen_preprocess::errors::ToolchainError>(())
//! ```

pub mod paths;
pub mod process;

pub use paths::ToolPaths;
pub use process::ProcessToolchain;

use crate::errors::ToolchainError;
use std::fmt;

/// External programs used by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    /// OpenCL frontend: preprocessing and bytecode emission.
    Clang,
    /// LLVM optimizer, used only for its instcount statistics pass.
    Opt,
    /// Code style formatter.
    ClangFormat,
    /// Identifier rewriter that renames functions and variables.
    Rewriter,
}

impl Tool {
    pub const ALL: [Tool; 4] = [Tool::Clang, Tool::Opt, Tool::ClangFormat, Tool::Rewriter];
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clang => write!(f, "clang"),
            Self::Opt => write!(f, "opt"),
            Self::ClangFormat => write!(f, "clang-format"),
            Self::Rewriter => write!(f, "rewriter"),
        }
    }
}

/// A single tool run: program, arguments and standard input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub tool: Tool,
    pub args: Vec<String>,
    /// Bytes fed to standard input. `None` closes stdin immediately.
    pub stdin: Option<Vec<u8>>,
}

impl Invocation {
    pub fn new(tool: Tool) -> Self {
        Self {
            tool,
            args: Vec::new(),
            stdin: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn stdin(mut self, input: impl Into<Vec<u8>>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    /// True if any argument equals `flag`.
    pub fn has_arg(&self, flag: &str) -> bool {
        self.args.iter().any(|a| a == flag)
    }
}

/// Captured result of a finished tool run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// Process exit code; `None` if the process was killed by a signal.
    pub exit_code: Option<i32>,
}

impl ToolOutput {
    /// Successful run producing `stdout`.
    pub fn ok(stdout: impl Into<Vec<u8>>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: Vec::new(),
            exit_code: Some(0),
        }
    }

    /// Failed run with the given exit code and diagnostics.
    pub fn exit(code: i32, stderr: impl Into<Vec<u8>>) -> Self {
        Self {
            stdout: Vec::new(),
            stderr: stderr.into(),
            exit_code: Some(code),
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    /// Standard output followed by standard error, as one text.
    ///
    /// LLVM passes print their statistics on stderr, so analysis output is
    /// read from both streams.
    pub fn combined_text(&self) -> String {
        let mut text = self.stdout_text();
        text.push_str(&self.stderr_text());
        text
    }
}

/// Runs external tools to completion.
///
/// Implementations block until the tool exits. No timeout is applied.
pub trait Toolchain: Send + Sync {
    fn run(&self, invocation: &Invocation) -> Result<ToolOutput, ToolchainError>;
}

impl<T: Toolchain + ?Sized> Toolchain for &T {
    fn run(&self, invocation: &Invocation) -> Result<ToolOutput, ToolchainError> {
        (**self).run(invocation)
    }
}
