use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// LLVM targets known to accept OpenCL input.
pub const CLANG_CL_TARGETS: [&str; 2] = ["nvptx64-nvidia-nvcl", "spir64"];

fn default_clang() -> String {
    "clang".to_string()
}

fn default_opt() -> String {
    "opt".to_string()
}

fn default_clang_format() -> String {
    "clang-format".to_string()
}

fn default_rewriter() -> String {
    "clgen-rewriter".to_string()
}

fn default_target() -> String {
    CLANG_CL_TARGETS[0].to_string()
}

fn default_use_shim() -> bool {
    true
}

/// clang warning categories that are noise for scraped kernels.
pub fn default_disabled_warnings() -> Vec<String> {
    [
        "ignored-pragmas",
        "implicit-function-declaration",
        "incompatible-library-redeclaration",
        "macro-redefined",
    ]
    .iter()
    .map(|w| w.to_string())
    .collect()
}

/// Locations and flags for the external toolchain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolchainConfig {
    /// clang executable (name on PATH or absolute path)
    #[serde(default = "default_clang")]
    pub clang: String,

    /// LLVM opt executable
    #[serde(default = "default_opt")]
    pub opt: String,

    /// clang-format executable
    #[serde(default = "default_clang_format")]
    pub clang_format: String,

    /// Identifier rewriter executable
    #[serde(default = "default_rewriter")]
    pub rewriter: String,

    /// libclc include directory passed as `-I`
    #[serde(default)]
    pub libclc: Option<PathBuf>,

    /// Shim header injected with `-include`
    #[serde(default)]
    pub shim: Option<PathBuf>,

    /// LLVM target triple
    #[serde(default = "default_target")]
    pub target: String,

    /// Value for `-ferror-limit`; 0 means unlimited
    #[serde(default)]
    pub error_limit: u32,

    /// Warning categories disabled with `-Wno-<name>`
    #[serde(default = "default_disabled_warnings")]
    pub disabled_warnings: Vec<String>,

    /// Inject the shim header when compiling
    #[serde(default = "default_use_shim")]
    pub use_shim: bool,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            clang: default_clang(),
            opt: default_opt(),
            clang_format: default_clang_format(),
            rewriter: default_rewriter(),
            libclc: None,
            shim: None,
            target: default_target(),
            error_limit: 0,
            disabled_warnings: default_disabled_warnings(),
            use_shim: default_use_shim(),
        }
    }
}

impl ToolchainConfig {
    /// Apply `CLGEN_*` environment overrides on top of file values.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    pub(crate) fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let programs: [(&str, &mut String); 4] = [
            ("CLGEN_CLANG", &mut self.clang),
            ("CLGEN_OPT", &mut self.opt),
            ("CLGEN_CLANG_FORMAT", &mut self.clang_format),
            ("CLGEN_REWRITER", &mut self.rewriter),
        ];
        for (key, slot) in programs {
            if let Some(value) = lookup(key).filter(|v| !v.is_empty()) {
                log::debug!("{} overrides {}", key, slot);
                *slot = value;
            }
        }
        if let Some(value) = lookup("CLGEN_LIBCLC").filter(|v| !v.is_empty()) {
            self.libclc = Some(PathBuf::from(value));
        }
        if let Some(value) = lookup("CLGEN_SHIM").filter(|v| !v.is_empty()) {
            self.shim = Some(PathBuf::from(value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ToolchainConfig::default();
        assert_eq!(config.target, "nvptx64-nvidia-nvcl");
        assert_eq!(config.error_limit, 0);
        assert!(config.use_shim);
        assert_eq!(config.disabled_warnings.len(), 4);
    }

    #[test]
    fn test_env_overrides_replace_programs_and_paths() {
        let env: HashMap<&str, &str> = [
            ("CLGEN_CLANG", "/opt/llvm/bin/clang"),
            ("CLGEN_SHIM", "/opt/clgen/shim.h"),
            ("CLGEN_OPT", ""),
        ]
        .into_iter()
        .collect();

        let mut config = ToolchainConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.clang, "/opt/llvm/bin/clang");
        assert_eq!(config.opt, "opt", "empty override is ignored");
        assert_eq!(config.shim, Some(PathBuf::from("/opt/clgen/shim.h")));
        assert_eq!(config.libclc, None);
    }
}
