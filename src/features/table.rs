use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::{escape_sql_key, TOTAL_KEY};

/// A single feature: an absolute instruction count or a density in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Count(u64),
    Ratio(f64),
}

impl FeatureValue {
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Count(n) => *n as f64,
            Self::Ratio(r) => *r,
        }
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(n) => write!(f, "{n}"),
            Self::Ratio(r) => write!(f, "{r:.6}"),
        }
    }
}

/// Escaped feature name to value, ordered by name.
///
/// Keys are always produced by [`escape_sql_key`], so they are safe to use as
/// storage column names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureTable(BTreeMap<String, FeatureValue>);

impl FeatureTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, key: String, value: FeatureValue) {
        self.0.insert(key, value);
    }

    pub fn get(&self, key: &str) -> Option<FeatureValue> {
        self.0.get(key).copied()
    }

    pub fn count(&self, key: &str) -> Option<u64> {
        match self.get(key)? {
            FeatureValue::Count(n) => Some(n),
            FeatureValue::Ratio(_) => None,
        }
    }

    pub fn ratio(&self, key: &str) -> Option<f64> {
        match self.get(key)? {
            FeatureValue::Ratio(r) => Some(r),
            FeatureValue::Count(_) => None,
        }
    }

    /// Total instruction count; 0 when the total key is missing.
    pub fn instruction_count(&self) -> u64 {
        self.count(&escape_sql_key(TOTAL_KEY)).unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, FeatureValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
