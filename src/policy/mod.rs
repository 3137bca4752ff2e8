//! Accept/reject rules applied to bytecode features.

use crate::config::PolicyConfig;
use crate::errors::PreprocessError;
use crate::features::FeatureTable;

/// Decides whether a compiled kernel is worth keeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VerdictPolicy {
    /// Minimum total instruction count. 0 accepts every kernel.
    pub min_instructions: u64,
}

impl VerdictPolicy {
    pub fn new(min_instructions: u64) -> Self {
        Self { min_instructions }
    }

    pub fn from_config(config: &PolicyConfig) -> Self {
        Self::new(config.min_instructions)
    }

    /// Reject instruction-starved kernels as ugly.
    ///
    /// A table without the total key counts as zero instructions.
    pub fn classify(&self, features: &FeatureTable) -> Result<(), PreprocessError> {
        let count = features.instruction_count();
        if count < self.min_instructions {
            return Err(PreprocessError::InstructionCount {
                count,
                minimum: self.min_instructions,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorClass;
    use crate::features::{instcounts_to_ratios, TOTAL_KEY};
    use std::collections::BTreeMap;

    fn table_with_total(total: u64) -> FeatureTable {
        let counts: BTreeMap<String, u64> = [(TOTAL_KEY.to_string(), total)].into_iter().collect();
        instcounts_to_ratios(&counts)
    }

    #[test]
    fn test_default_policy_accepts_everything() {
        let policy = VerdictPolicy::default();
        assert!(policy.classify(&FeatureTable::new()).is_ok());
        assert!(policy.classify(&table_with_total(0)).is_ok());
    }

    #[test]
    fn test_below_threshold_is_ugly() {
        let policy = VerdictPolicy::new(5);
        let err = policy.classify(&table_with_total(4)).unwrap_err();
        assert_eq!(err.class(), ErrorClass::Ugly);
        assert!(matches!(
            err,
            PreprocessError::InstructionCount {
                count: 4,
                minimum: 5
            }
        ));
    }

    #[test]
    fn test_at_threshold_is_accepted() {
        assert!(VerdictPolicy::new(5).classify(&table_with_total(5)).is_ok());
    }

    #[test]
    fn test_missing_total_rejected_only_with_threshold() {
        assert!(VerdictPolicy::new(0).classify(&FeatureTable::new()).is_ok());
        assert!(VerdictPolicy::new(1).classify(&FeatureTable::new()).is_err());
    }

    #[test]
    fn test_from_config() {
        let policy = VerdictPolicy::from_config(&PolicyConfig {
            min_instructions: 7,
        });
        assert_eq!(policy.min_instructions, 7);
    }
}
