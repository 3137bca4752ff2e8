//! Subprocess-backed toolchain.

use crate::config::ToolchainConfig;
use crate::errors::ToolchainError;
use std::io::{self, Write};
use std::process::{Command, Stdio};

use super::{Invocation, Tool, ToolOutput, ToolPaths, Toolchain};

/// Runs each invocation as a child process with piped stdio.
///
/// Standard input is written from a scoped helper thread while the calling
/// thread drains stdout and stderr, so large kernels cannot deadlock on a
/// full pipe.
#[derive(Debug, Clone)]
pub struct ProcessToolchain {
    paths: ToolPaths,
}

impl ProcessToolchain {
    pub fn new(paths: ToolPaths) -> Self {
        Self { paths }
    }

    /// Resolve the configured programs and build a toolchain over them.
    pub fn from_config(config: &ToolchainConfig) -> Result<Self, ToolchainError> {
        Ok(Self::new(ToolPaths::resolve(config)?))
    }

    /// Like [`ProcessToolchain::from_config`], resolving only `tools`.
    pub fn from_config_for(
        config: &ToolchainConfig,
        tools: &[Tool],
    ) -> Result<Self, ToolchainError> {
        Ok(Self::new(ToolPaths::resolve_only(config, tools)?))
    }

    pub fn paths(&self) -> &ToolPaths {
        &self.paths
    }
}

impl Toolchain for ProcessToolchain {
    fn run(&self, invocation: &Invocation) -> Result<ToolOutput, ToolchainError> {
        let tool = invocation.tool;
        let program = self.paths.get(tool);
        log::trace!("running {} {:?}", program.display(), invocation.args);

        let mut child = Command::new(program)
            .args(&invocation.args)
            .stdin(if invocation.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ToolchainError::Spawn { tool, source })?;

        let pipe = child.stdin.take();
        let (output, written) = std::thread::scope(|scope| {
            let writer = match (pipe, invocation.stdin.as_deref()) {
                (Some(mut pipe), Some(bytes)) => Some(scope.spawn(move || {
                    // Dropping the pipe afterwards closes the child's stdin.
                    pipe.write_all(bytes)
                })),
                _ => None,
            };
            let output = child.wait_with_output();
            let written = match writer {
                Some(handle) => handle
                    .join()
                    .unwrap_or_else(|_| Err(io::Error::other("stdin writer panicked"))),
                None => Ok(()),
            };
            (output, written)
        });

        let output = output.map_err(|source| ToolchainError::Io { tool, source })?;
        match written {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                log::debug!("{} exited before reading all of its input", tool);
            }
            Err(source) => return Err(ToolchainError::Io { tool, source }),
        }

        Ok(ToolOutput {
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code: output.status.code(),
        })
    }
}
