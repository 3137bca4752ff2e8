//! Scripted in-process [`Toolchain`].
//!
//! Each tool role has a handler deciding the [`ToolOutput`] for an
//! invocation. Defaults behave like a healthy toolchain that accepts every
//! kernel, so a test only scripts the role it exercises:
//!
//! | Role        | Default                                                  |
//! |-------------|----------------------------------------------------------|
//! | compile     | fixed textual bytecode                                   |
//! | preprocess  | [`STDIN_MARKER`] followed by the input                   |
//! | analysis    | an instcount report with 10 instructions                 |
//! | rewrite     | contents of the staged file (first argument)             |
//! | format      | the input, unchanged                                     |
//!
//! Every invocation is recorded and available through
//! [`MockToolchain::calls`].

use crate::compiler::STDIN_MARKER;
use crate::errors::ToolchainError;
use crate::toolchain::{Invocation, Tool, ToolOutput, Toolchain};
use std::fs;
use std::sync::{Arc, Mutex};

type Handler = Arc<dyn Fn(&Invocation) -> ToolOutput + Send + Sync>;

/// Bytecode returned by the default compile handler.
pub const MOCK_IR: &str = "; ModuleID = '-'\ntarget triple = \"nvptx64-nvidia-nvcl\"\n";

/// Statistics returned by the default analysis handler.
pub const MOCK_INSTCOUNT_REPORT: &str = "\
 4 instcount - Number of Add insts
 1 instcount - Number of Ret insts
 5 instcount - Number of Load insts
10 instcount - Number of instructions (of all types)
";

#[derive(Clone)]
pub struct MockToolchain {
    compile: Handler,
    preprocess: Handler,
    analysis: Handler,
    rewrite: Handler,
    format: Handler,
    calls: Arc<Mutex<Vec<Invocation>>>,
}

impl Default for MockToolchain {
    fn default() -> Self {
        Self::new()
    }
}

impl MockToolchain {
    pub fn new() -> Self {
        Self {
            compile: Arc::new(|_| ToolOutput::ok(MOCK_IR)),
            preprocess: Arc::new(|inv| {
                let mut out = format!("# 1 \"<built-in>\" 1\n{STDIN_MARKER}\n").into_bytes();
                out.extend_from_slice(inv.stdin.as_deref().unwrap_or_default());
                ToolOutput::ok(out)
            }),
            analysis: Arc::new(|_| ToolOutput {
                stdout: Vec::new(),
                stderr: MOCK_INSTCOUNT_REPORT.as_bytes().to_vec(),
                exit_code: Some(0),
            }),
            rewrite: Arc::new(|inv| match inv.args.first().map(fs::read) {
                Some(Ok(contents)) => ToolOutput::ok(contents),
                Some(Err(e)) => ToolOutput::exit(1, e.to_string()),
                None => ToolOutput::exit(1, "no input file"),
            }),
            format: Arc::new(|inv| ToolOutput::ok(inv.stdin.clone().unwrap_or_default())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Script clang when emitting bytecode.
    pub fn with_compile<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Invocation) -> ToolOutput + Send + Sync + 'static,
    {
        self.compile = Arc::new(handler);
        self
    }

    /// Script clang when running the preprocessor (`-E`).
    pub fn with_preprocess<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Invocation) -> ToolOutput + Send + Sync + 'static,
    {
        self.preprocess = Arc::new(handler);
        self
    }

    /// Script the opt instcount pass.
    pub fn with_analysis<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Invocation) -> ToolOutput + Send + Sync + 'static,
    {
        self.analysis = Arc::new(handler);
        self
    }

    /// Script the rewriter. The staged source path is `args[0]`.
    pub fn with_rewrite<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Invocation) -> ToolOutput + Send + Sync + 'static,
    {
        self.rewrite = Arc::new(handler);
        self
    }

    /// Script clang-format.
    pub fn with_format<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Invocation) -> ToolOutput + Send + Sync + 'static,
    {
        self.format = Arc::new(handler);
        self
    }

    /// Every invocation seen so far, in call order.
    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().expect("Lock poisoned").clone()
    }

    /// Invocations of one tool.
    pub fn calls_to(&self, tool: Tool) -> Vec<Invocation> {
        self.calls()
            .into_iter()
            .filter(|call| call.tool == tool)
            .collect()
    }
}

impl Toolchain for MockToolchain {
    fn run(&self, invocation: &Invocation) -> Result<ToolOutput, ToolchainError> {
        self.calls
            .lock()
            .expect("Lock poisoned")
            .push(invocation.clone());

        let handler = match invocation.tool {
            Tool::Clang if invocation.has_arg("-E") => &self.preprocess,
            Tool::Clang => &self.compile,
            Tool::Opt => &self.analysis,
            Tool::Rewriter => &self.rewrite,
            Tool::ClangFormat => &self.format,
        };
        Ok(handler(invocation))
    }
}

/// Source text fed to `invocation`, for handlers that branch on it.
pub fn stdin_text(invocation: &Invocation) -> String {
    String::from_utf8_lossy(invocation.stdin.as_deref().unwrap_or_default()).into_owned()
}
