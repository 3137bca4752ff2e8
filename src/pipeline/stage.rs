//! Progress markers for a single unit moving through the pipeline.

use std::fmt;

/// The last step a unit completed.
///
/// Units advance strictly in declaration order. A failure leaves the stage at
/// the last step that succeeded, which is what debug logs report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PipelineStage {
    /// Nothing has run yet.
    Start,
    /// Bytecode was emitted.
    Compiled,
    /// Features were extracted and passed the policy.
    FeatureChecked,
    /// Preprocessed and renamed.
    Rewritten,
    /// Attributes stripped and code style applied.
    Formatted,
    /// Prototype collapsed onto one line.
    Sanitized,
    /// Accepted.
    Done,
}

impl PipelineStage {
    /// The stage that follows this one. `Done` is terminal.
    pub fn next(self) -> Self {
        match self {
            Self::Start => Self::Compiled,
            Self::Compiled => Self::FeatureChecked,
            Self::FeatureChecked => Self::Rewritten,
            Self::Rewritten => Self::Formatted,
            Self::Formatted => Self::Sanitized,
            Self::Sanitized | Self::Done => Self::Done,
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::Compiled => write!(f, "compiled"),
            Self::FeatureChecked => write!(f, "feature_checked"),
            Self::Rewritten => write!(f, "rewritten"),
            Self::Formatted => write!(f, "formatted"),
            Self::Sanitized => write!(f, "sanitized"),
            Self::Done => write!(f, "done"),
        }
    }
}
