//! Compiler adapter: clang and the identifier rewriter.
//!
//! Three operations are exposed over a [`Toolchain`]:
//!
//! - [`CompilerAdapter::compile_to_ir`] emits textual LLVM bytecode for the
//!   feature extractor.
//! - [`CompilerAdapter::preprocess_text`] runs the preprocessor, drops the
//!   injected header boilerplate and every remaining `#` directive line.
//! - [`CompilerAdapter::rewrite`] renames functions and variables. The
//!   rewriter's "nothing to rewrite" exit code is reported as
//!   [`RewriteOutcome::NothingToRewrite`] rather than a failure.

use crate::config::ToolchainConfig;
use crate::errors::PreprocessError;
use crate::toolchain::{Invocation, Tool, Toolchain};
use std::io::Write;

/// Line that ends the injected headers in clang's `-E` output.
pub const STDIN_MARKER: &str = "# 1 \"<stdin>\" 2";

/// Rewriter exit code meaning "the input had nothing to rename".
pub const EUGLY_CODE: i32 = 204;

/// Result of a rewriter run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteOutcome {
    /// Rewritten text. May be best-effort if the rewriter reported errors.
    Rewritten(String),
    /// Syntactically fine, but nothing to rename.
    NothingToRewrite,
}

/// Common clang arguments for compiling OpenCL.
pub fn clang_cl_args(config: &ToolchainConfig, use_shim: bool) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(libclc) = &config.libclc {
        args.push(format!("-I{}", libclc.display()));
    }
    args.push("-target".to_string());
    args.push(config.target.clone());
    args.push(format!("-ferror-limit={}", config.error_limit));
    args.push("-xcl".to_string());
    args.extend(config.disabled_warnings.iter().map(|w| format!("-Wno-{w}")));

    if use_shim {
        match &config.shim {
            Some(shim) => {
                args.push("-include".to_string());
                args.push(shim.display().to_string());
            }
            None => log::trace!("shim requested but none configured"),
        }
    }
    args
}

/// Remove clang's injected-header preamble and preprocessor line markers.
///
/// Everything up to and including [`STDIN_MARKER`] is dropped. Output without
/// the marker has no kernel body and yields an empty string. Lines starting
/// with `#` are then removed.
pub fn strip_injected_headers(preprocessed: &str) -> String {
    let lines: Vec<&str> = preprocessed.split('\n').collect();
    let body = match lines.iter().position(|line| *line == STDIN_MARKER) {
        Some(idx) => lines[idx + 1..].join("\n"),
        None => {
            log::warn!("preprocessor output has no '{}' marker", STDIN_MARKER);
            return String::new();
        }
    };

    body.trim()
        .split('\n')
        .filter(|line| !line.starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Drives clang and the rewriter for one toolchain configuration.
pub struct CompilerAdapter<'a, T: Toolchain + ?Sized> {
    toolchain: &'a T,
    config: &'a ToolchainConfig,
}

impl<'a, T: Toolchain + ?Sized> CompilerAdapter<'a, T> {
    pub fn new(toolchain: &'a T, config: &'a ToolchainConfig) -> Self {
        Self { toolchain, config }
    }

    /// Compile OpenCL source to textual LLVM bytecode.
    pub fn compile_to_ir(&self, src: &str, use_shim: bool) -> Result<Vec<u8>, PreprocessError> {
        let invocation = Invocation::new(Tool::Clang)
            .args(clang_cl_args(self.config, use_shim))
            .args(["-emit-llvm", "-S", "-c", "-", "-o", "-"])
            .stdin(src.as_bytes());

        let output = self.toolchain.run(&invocation)?;
        if !output.success() {
            return Err(PreprocessError::compile(output.stderr_text()));
        }
        Ok(output.stdout)
    }

    /// Run the preprocessor: inline macros, drop comments and directives.
    pub fn preprocess_text(&self, src: &str, use_shim: bool) -> Result<String, PreprocessError> {
        let invocation = Invocation::new(Tool::Clang)
            .args(clang_cl_args(self.config, use_shim))
            .args(["-E", "-c", "-", "-o", "-"])
            .stdin(src.as_bytes());

        let output = self.toolchain.run(&invocation)?;
        if !output.success() {
            return Err(PreprocessError::compile(output.stderr_text()));
        }
        Ok(strip_injected_headers(&output.stdout_text()))
    }

    /// Rename functions and variables with short unique names.
    ///
    /// The rewriter cannot read standard input, so the source is staged in a
    /// temporary `.cl` file for the duration of the call. Exit codes other than
    /// [`EUGLY_CODE`] are tolerated: the rewriter still emits usable output when,
    /// for instance, a pragma from the shim fails to propagate.
    pub fn rewrite(&self, src: &str, use_shim: bool) -> Result<RewriteOutcome, PreprocessError> {
        let mut staged = tempfile::Builder::new()
            .prefix("clgen-rewrite-")
            .suffix(".cl")
            .tempfile()
            .map_err(PreprocessError::Staging)?;
        staged
            .write_all(src.as_bytes())
            .and_then(|_| staged.flush())
            .map_err(PreprocessError::Staging)?;

        let invocation = Invocation::new(Tool::Rewriter)
            .arg(staged.path().display().to_string())
            .args(
                clang_cl_args(self.config, use_shim)
                    .into_iter()
                    .map(|arg| format!("-extra-arg={arg}")),
            )
            .arg("--");

        let output = self.toolchain.run(&invocation)?;
        match output.exit_code {
            Some(EUGLY_CODE) => Ok(RewriteOutcome::NothingToRewrite),
            Some(0) => Ok(RewriteOutcome::Rewritten(output.stdout_text())),
            code => {
                log::warn!(
                    "rewriter exited with {:?}, keeping its output: {}",
                    code,
                    output.stderr_text().trim()
                );
                Ok(RewriteOutcome::Rewritten(output.stdout_text()))
            }
        }
    }
}
