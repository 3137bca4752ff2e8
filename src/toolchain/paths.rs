use crate::config::ToolchainConfig;
use crate::errors::ToolchainError;
use std::path::{Path, PathBuf};

use super::Tool;

/// Absolute locations of every tool, resolved once before a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub clang: PathBuf,
    pub opt: PathBuf,
    pub clang_format: PathBuf,
    pub rewriter: PathBuf,
}

impl ToolPaths {
    /// Resolve all configured programs through `PATH`.
    ///
    /// Fails on the first tool that cannot be found, so a broken installation
    /// is reported before any worker starts.
    pub fn resolve(config: &ToolchainConfig) -> Result<Self, ToolchainError> {
        Self::resolve_only(
            config,
            &[Tool::Clang, Tool::Opt, Tool::ClangFormat, Tool::Rewriter],
        )
    }

    /// Resolve only `tools`; the others keep their configured program name
    /// and fail at spawn time if a command ever runs them.
    pub fn resolve_only(config: &ToolchainConfig, tools: &[Tool]) -> Result<Self, ToolchainError> {
        let pick = |tool: Tool, program: &str| {
            if tools.contains(&tool) {
                resolve_program(tool, program)
            } else {
                Ok(PathBuf::from(program))
            }
        };
        Ok(Self {
            clang: pick(Tool::Clang, &config.clang)?,
            opt: pick(Tool::Opt, &config.opt)?,
            clang_format: pick(Tool::ClangFormat, &config.clang_format)?,
            rewriter: pick(Tool::Rewriter, &config.rewriter)?,
        })
    }

    pub fn get(&self, tool: Tool) -> &Path {
        match tool {
            Tool::Clang => &self.clang,
            Tool::Opt => &self.opt,
            Tool::ClangFormat => &self.clang_format,
            Tool::Rewriter => &self.rewriter,
        }
    }
}

fn resolve_program(tool: Tool, program: &str) -> Result<PathBuf, ToolchainError> {
    let path = which::which(program).map_err(|_| ToolchainError::NotFound {
        tool,
        program: program.to_string(),
    })?;
    log::debug!("{} resolved to {}", tool, path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_program_is_not_found() {
        let config = ToolchainConfig {
            clang: "clgen-definitely-not-a-real-clang".into(),
            ..Default::default()
        };
        let err = ToolPaths::resolve(&config).unwrap_err();
        assert!(matches!(
            err,
            ToolchainError::NotFound {
                tool: Tool::Clang,
                ..
            }
        ));
    }

    #[test]
    fn test_resolve_only_ignores_unused_tools() {
        let config = ToolchainConfig {
            clang: "sh".into(),
            opt: "sh".into(),
            clang_format: "clgen-definitely-not-a-real-formatter".into(),
            rewriter: "clgen-definitely-not-a-real-rewriter".into(),
            ..Default::default()
        };
        assert!(ToolPaths::resolve(&config).is_err());

        let paths = ToolPaths::resolve_only(&config, &[Tool::Clang, Tool::Opt]).unwrap();
        assert!(paths.clang.is_absolute());
        assert_eq!(
            paths.rewriter,
            PathBuf::from("clgen-definitely-not-a-real-rewriter")
        );
    }

    #[test]
    fn test_get_returns_matching_path() {
        let paths = ToolPaths {
            clang: "/usr/bin/clang".into(),
            opt: "/usr/bin/opt".into(),
            clang_format: "/usr/bin/clang-format".into(),
            rewriter: "/opt/clgen/rewriter".into(),
        };
        assert_eq!(paths.get(Tool::Opt), Path::new("/usr/bin/opt"));
        assert_eq!(paths.get(Tool::Rewriter), Path::new("/opt/clgen/rewriter"));
    }
}
