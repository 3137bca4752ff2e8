//! Bytecode feature extraction from LLVM's instcount statistics.
//!
//! The extractor pipes textual bytecode through
//! `opt -analyze -stats -instcount -` and parses lines of the form
//!
//! ```text
//! 42 instcount - Number of Add insts
//! ```
//!
//! into a [`FeatureTable`]: one absolute count per instruction category plus a
//! `ratio_<category>` density relative to the total instruction count.

mod table;

pub use table::{FeatureTable, FeatureValue};

use crate::errors::PreprocessError;
use crate::toolchain::{Invocation, Tool, Toolchain};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

/// Instcount category holding the total; it gets no ratio of its own.
pub const TOTAL_KEY: &str = "instructions (of all types)";

/// Arguments for the instcount statistics pass reading bytecode from stdin.
pub const OPT_INSTCOUNT_ARGS: [&str; 4] = ["-analyze", "-stats", "-instcount", "-"];

static INSTCOUNT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<count>\d+) instcount - Number of (?P<type>.+)")
        .expect("instcount pattern is valid")
});

/// Make an instcount category usable as a storage column name.
///
/// Whitespace runs become single underscores, parentheses are removed and
/// hyphens become underscores, in that order.
///
/// ```rust
/// use clgen_preprocess::features::escape_sql_key;
///
/// assert_eq!(
///     escape_sql_key("Number of Loop-Invariant (Ops)"),
///     "Number_of_Loop_Invariant_Ops"
/// );
/// ```
pub fn escape_sql_key(key: &str) -> String {
    key.split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| *c != '(' && *c != ')')
        .map(|c| if c == '-' { '_' } else { c })
        .collect()
}

/// Sum instcount lines per (unescaped) category.
pub fn parse_instcounts(report: &str) -> BTreeMap<String, u64> {
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for line in report.lines().map(str::trim) {
        let Some(caps) = INSTCOUNT_RE.captures(line) else {
            continue;
        };
        let Ok(count) = caps["count"].parse::<u64>() else {
            log::debug!("skipping instcount line with oversized count: {}", line);
            continue;
        };
        let total = counts.entry(caps["type"].to_string()).or_default();
        *total = total.saturating_add(count);
    }
    counts
}

/// Turn raw category counts into counts plus densities.
///
/// For every category other than [`TOTAL_KEY`] the table holds the escaped
/// count and `ratio_<escaped>` = count / total. A zero or missing total yields
/// zero ratios; the escaped total key is always present in a non-empty table.
pub fn instcounts_to_ratios(counts: &BTreeMap<String, u64>) -> FeatureTable {
    let mut table = FeatureTable::new();
    if counts.is_empty() {
        return table;
    }

    let total = match counts.get(TOTAL_KEY) {
        Some(total) => *total,
        None => {
            log::warn!("instcount report has no '{}' line; ratios set to 0", TOTAL_KEY);
            0
        }
    };
    table.insert(escape_sql_key(TOTAL_KEY), FeatureValue::Count(total));

    for (key, count) in counts.iter().filter(|(key, _)| key.as_str() != TOTAL_KEY) {
        let ratio = if total == 0 {
            0.0
        } else {
            *count as f64 / total as f64
        };
        table.insert(escape_sql_key(key), FeatureValue::Count(*count));
        table.insert(
            escape_sql_key(&format!("ratio_{key}")),
            FeatureValue::Ratio(ratio),
        );
    }
    table
}

/// Runs the instcount pass over bytecode.
pub struct FeatureExtractor<'a, T: Toolchain + ?Sized> {
    toolchain: &'a T,
}

impl<'a, T: Toolchain + ?Sized> FeatureExtractor<'a, T> {
    pub fn new(toolchain: &'a T) -> Self {
        Self { toolchain }
    }

    /// Extract the feature table of `ir`.
    ///
    /// opt prints pass statistics on stderr, so both streams are parsed. A
    /// non-zero exit is an analysis failure carrying the combined text.
    pub fn extract(&self, ir: &[u8]) -> Result<FeatureTable, PreprocessError> {
        let invocation = Invocation::new(Tool::Opt)
            .args(OPT_INSTCOUNT_ARGS)
            .stdin(ir);

        let output = self.toolchain.run(&invocation)?;
        let report = output.combined_text();
        if !output.success() {
            return Err(PreprocessError::analysis(report));
        }
        Ok(instcounts_to_ratios(&parse_instcounts(&report)))
    }
}
