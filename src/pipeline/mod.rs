//! Per-kernel preprocessing pipeline.
//!
//! [`Preprocessor`] takes one raw kernel through every stage:
//!
//! 1. Compile to bytecode, extract instruction counts and apply the
//!    [`VerdictPolicy`]. Kernels that fail here are never formatted.
//! 2. Run the preprocessor to inline macros and drop directives.
//! 3. Rename identifiers. A rewriter with nothing to rename makes the kernel
//!    ugly.
//! 4. Strip `__attribute__` qualifiers.
//! 5. Apply the code style.
//! 6. Collapse the prototype onto one line.
//!
//! Compile and analysis failures become [`Verdict::Bad`], uninteresting
//! kernels [`Verdict::Ugly`]. A broken formatter or a tool that cannot be run
//! is returned as an error: it says nothing about the kernel.

mod format;
mod stage;
mod text;

pub use format::Formatter;
pub use stage::PipelineStage;
pub use text::{sanitize_prototype, strip_attributes};

use crate::compiler::{CompilerAdapter, RewriteOutcome};
use crate::config::ClgenConfig;
use crate::errors::{ErrorClass, PreprocessError};
use crate::features::{FeatureExtractor, FeatureTable};
use crate::policy::VerdictPolicy;
use crate::store::{ProcessedRecord, Status};
use crate::toolchain::Toolchain;

/// Outcome of preprocessing one kernel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Normalized kernel text.
    Accepted(String),
    /// Diagnostic explaining why the kernel does not compile.
    Bad(String),
    /// Reason the kernel is not useful for training.
    Ugly(String),
}

impl Verdict {
    pub fn status(&self) -> Status {
        match self {
            Self::Accepted(_) => Status::Accepted,
            Self::Bad(_) => Status::Bad,
            Self::Ugly(_) => Status::Ugly,
        }
    }

    /// Accepted text or rejection reason.
    pub fn contents(&self) -> &str {
        match self {
            Self::Accepted(text) | Self::Bad(text) | Self::Ugly(text) => text,
        }
    }

    pub fn into_record(self, id: impl Into<String>) -> ProcessedRecord {
        let status = self.status();
        let contents = match self {
            Self::Accepted(text) | Self::Bad(text) | Self::Ugly(text) => text,
        };
        ProcessedRecord::new(id, status, contents)
    }
}

/// Runs the full pipeline against one toolchain and configuration.
pub struct Preprocessor<'a, T: Toolchain + ?Sized> {
    compiler: CompilerAdapter<'a, T>,
    extractor: FeatureExtractor<'a, T>,
    formatter: Formatter<'a, T>,
    policy: VerdictPolicy,
    use_shim: bool,
}

impl<'a, T: Toolchain + ?Sized> Preprocessor<'a, T> {
    pub fn new(toolchain: &'a T, config: &'a ClgenConfig) -> Self {
        Self {
            compiler: CompilerAdapter::new(toolchain, &config.toolchain),
            extractor: FeatureExtractor::new(toolchain),
            formatter: Formatter::new(toolchain, &config.format),
            policy: VerdictPolicy::from_config(&config.policy),
            use_shim: config.toolchain.use_shim,
        }
    }

    /// Preprocess `src`, returning the normalized text.
    ///
    /// Any error aborts the remaining stages; use [`PreprocessError::class`]
    /// or [`Preprocessor::classify`] to tell rejections from tool failures.
    pub fn preprocess(&self, src: &str) -> Result<String, PreprocessError> {
        let mut stage = PipelineStage::Start;
        let result = self.run_stages(src, &mut stage);
        if let Err(e) = &result {
            log::debug!(
                "preprocessing stopped after stage '{}' ({:?})",
                stage,
                e.class()
            );
        }
        result
    }

    fn run_stages(&self, src: &str, stage: &mut PipelineStage) -> Result<String, PreprocessError> {
        let ir = self.compiler.compile_to_ir(src, self.use_shim)?;
        *stage = stage.next();

        let features = self.extractor.extract(&ir)?;
        self.policy.classify(&features)?;
        *stage = stage.next();

        let text = self.compiler.preprocess_text(src, self.use_shim)?;
        let text = match self.compiler.rewrite(&text, self.use_shim)? {
            RewriteOutcome::Rewritten(rewritten) => rewritten,
            RewriteOutcome::NothingToRewrite => {
                return Err(PreprocessError::NothingToRewrite { text })
            }
        };
        *stage = stage.next();

        let text = self.formatter.format(&strip_attributes(&text))?;
        *stage = stage.next();

        let text = sanitize_prototype(text.trim());
        *stage = stage.next();

        *stage = stage.next();
        Ok(text)
    }

    /// Preprocess `src` and classify the result.
    ///
    /// Only tool failures are returned as errors.
    pub fn classify(&self, src: &str) -> Result<Verdict, PreprocessError> {
        match self.preprocess(src) {
            Ok(text) => Ok(Verdict::Accepted(text)),
            Err(e) => match e.class() {
                ErrorClass::Bad => Ok(Verdict::Bad(e.to_string())),
                ErrorClass::Ugly => Ok(Verdict::Ugly(e.to_string())),
                ErrorClass::Tool => Err(e),
            },
        }
    }

    /// Bytecode features of `src`, without applying the policy.
    pub fn features(&self, src: &str) -> Result<FeatureTable, PreprocessError> {
        let ir = self.compiler.compile_to_ir(src, self.use_shim)?;
        self.extractor.extract(&ir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::EUGLY_CODE;
    use crate::testkit::MockToolchain;
    use crate::toolchain::{Tool, ToolOutput};
    use pretty_assertions::assert_eq;

    const KERNEL: &str = "kernel void A(global float* a,\n  global float* b) {\n  a[0] = b[0];\n}\n";

    #[test]
    fn test_accepted_kernel_is_normalized() {
        let toolchain = MockToolchain::new();
        let config = ClgenConfig::default();
        let verdict = Preprocessor::new(&toolchain, &config)
            .classify(KERNEL)
            .unwrap();

        assert_eq!(
            verdict,
            Verdict::Accepted(
                "kernel void A(global float* a, global float* b) {\n  a[0] = b[0];\n}".to_string()
            )
        );
    }

    #[test]
    fn test_compile_failure_is_bad_and_short_circuits() {
        let toolchain = MockToolchain::new()
            .with_compile(|_| ToolOutput::exit(1, "error: use of undeclared identifier 'c'"));
        let config = ClgenConfig::default();
        let verdict = Preprocessor::new(&toolchain, &config)
            .classify(KERNEL)
            .unwrap();

        assert_eq!(
            verdict,
            Verdict::Bad("error: use of undeclared identifier 'c'".to_string())
        );
        assert_eq!(toolchain.calls().len(), 1);
    }

    #[test]
    fn test_instruction_starved_kernel_is_ugly() {
        let toolchain = MockToolchain::new();
        let mut config = ClgenConfig::default();
        config.policy.min_instructions = 11;
        let verdict = Preprocessor::new(&toolchain, &config)
            .classify(KERNEL)
            .unwrap();

        assert_eq!(
            verdict,
            Verdict::Ugly("Code contains 10 instructions. The minimum allowed is 11".to_string())
        );
        assert!(toolchain.calls_to(Tool::Rewriter).is_empty());
        assert!(toolchain.calls_to(Tool::ClangFormat).is_empty());
    }

    #[test]
    fn test_rewriter_sentinel_is_ugly_not_bad() {
        let toolchain = MockToolchain::new().with_rewrite(|_| ToolOutput::exit(EUGLY_CODE, ""));
        let config = ClgenConfig::default();
        let verdict = Preprocessor::new(&toolchain, &config)
            .classify(KERNEL)
            .unwrap();

        assert_eq!(verdict.status(), Status::Ugly);
        assert!(verdict.contents().contains("kernel void A"));
    }

    #[test]
    fn test_formatter_failure_is_surfaced() {
        let toolchain =
            MockToolchain::new().with_format(|_| ToolOutput::exit(1, "YAML:1:1: error"));
        let config = ClgenConfig::default();
        let err = Preprocessor::new(&toolchain, &config)
            .classify(KERNEL)
            .unwrap_err();

        assert_eq!(err.class(), ErrorClass::Tool);
    }

    #[test]
    fn test_attributes_are_stripped_before_formatting() {
        let toolchain = MockToolchain::new();
        let config = ClgenConfig::default();
        let text = Preprocessor::new(&toolchain, &config)
            .preprocess("kernel __attribute__((reqd_work_group_size(64, 1, 1))) void A() {}")
            .unwrap();

        assert_eq!(text, "kernel void A() {}");
        let format_call = &toolchain.calls_to(Tool::ClangFormat)[0];
        assert!(!String::from_utf8_lossy(format_call.stdin.as_deref().unwrap_or_default())
            .contains("__attribute__"));
    }

    #[test]
    fn test_empty_file_passes_through_sanitizer() {
        let toolchain = MockToolchain::new();
        let config = ClgenConfig::default();
        let text = Preprocessor::new(&toolchain, &config).preprocess("").unwrap();
        assert_eq!(text, "");
    }

    #[test]
    fn test_verdict_into_record() {
        let record = Verdict::Bad("error".to_string()).into_record("abc");
        assert_eq!(record, ProcessedRecord::new("abc", Status::Bad, "error"));
    }

    #[test]
    fn test_features_skip_policy() {
        let toolchain = MockToolchain::new();
        let mut config = ClgenConfig::default();
        config.policy.min_instructions = 1000;
        let table = Preprocessor::new(&toolchain, &config)
            .features(KERNEL)
            .unwrap();
        assert_eq!(table.instruction_count(), 10);
    }
}
