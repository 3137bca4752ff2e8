use std::fs;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use super::ClgenConfig;

pub const CONFIG_FILE_NAME: &str = ".clgen.toml";

const MAX_TRAVERSAL_DEPTH: usize = 10;

pub(crate) fn read_config_file(path: &Path) -> Result<String, std::io::Error> {
    let file = fs::File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut contents = String::new();
    reader.read_to_string(&mut contents)?;
    Ok(contents)
}

/// Parse configuration from a TOML string.
pub fn parse_config(contents: &str) -> Result<ClgenConfig, String> {
    toml::from_str::<ClgenConfig>(contents)
        .map_err(|e| format!("Failed to parse {}: {}", CONFIG_FILE_NAME, e))
}

pub(crate) fn try_load_config_from_path(config_path: &Path) -> Option<ClgenConfig> {
    let contents = match read_config_file(config_path) {
        Ok(contents) => contents,
        Err(e) => {
            handle_read_error(config_path, &e);
            return None;
        }
    };

    match parse_config(&contents) {
        Ok(config) => {
            log::debug!("Loaded config from {}", config_path.display());
            Some(config)
        }
        Err(e) => {
            log::warn!("{}. Using defaults.", e);
            None
        }
    }
}

/// Only log actual errors, not "file not found".
pub(crate) fn handle_read_error(config_path: &Path, error: &std::io::Error) {
    if error.kind() != std::io::ErrorKind::NotFound {
        log::warn!(
            "Failed to read config file {}: {}",
            config_path.display(),
            error
        );
    }
}

/// `start` followed by its parents, at most `max_depth` directories.
pub fn directory_ancestors(start: PathBuf, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start), |dir| {
        let mut parent = dir.clone();
        if parent.pop() {
            Some(parent)
        } else {
            None
        }
    })
    .take(max_depth)
}

/// Load configuration from an explicit file.
///
/// Unlike [`load_config`], a missing or malformed file is an error here: the
/// user asked for that file specifically.
pub fn load_config_from(path: &Path) -> anyhow::Result<ClgenConfig> {
    use anyhow::Context;

    let contents = read_config_file(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let mut config = parse_config(&contents).map_err(anyhow::Error::msg)?;
    config.toolchain.apply_env_overrides();
    Ok(config)
}

/// Discover `.clgen.toml` from the current directory upwards.
///
/// Falls back to defaults when nothing is found. Environment overrides are
/// applied in both cases.
pub fn load_config() -> ClgenConfig {
    let mut config = match std::env::current_dir() {
        Ok(current) => directory_ancestors(current, MAX_TRAVERSAL_DEPTH)
            .map(|dir| dir.join(CONFIG_FILE_NAME))
            .find_map(|path| try_load_config_from_path(&path))
            .unwrap_or_else(|| {
                log::debug!(
                    "No config found after checking {} directories. Using default config.",
                    MAX_TRAVERSAL_DEPTH
                );
                ClgenConfig::default()
            }),
        Err(e) => {
            log::warn!(
                "Failed to get current directory: {}. Using default config.",
                e
            );
            ClgenConfig::default()
        }
    };
    config.toolchain.apply_env_overrides();
    config
}
