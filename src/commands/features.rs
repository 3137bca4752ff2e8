use crate::config::ClgenConfig;
use crate::features::FeatureTable;
use crate::pipeline::Preprocessor;
use crate::toolchain::{ProcessToolchain, Tool};
use anyhow::{Context, Result};
use std::path::Path;

pub fn handle_features(config: &ClgenConfig, path: &Path, json: bool) -> Result<()> {
    let src = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let toolchain =
        ProcessToolchain::from_config_for(&config.toolchain, &[Tool::Clang, Tool::Opt])?;
    let table = Preprocessor::new(&toolchain, config).features(&src)?;
    println!("{}", render_features(&table, json)?);
    Ok(())
}

/// One `name value` line per feature, or a JSON object.
pub fn render_features(table: &FeatureTable, json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(table)?);
    }
    let width = table.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    Ok(table
        .iter()
        .map(|(key, value)| format!("{key:<width$}  {value}"))
        .collect::<Vec<_>>()
        .join("\n"))
}
