//! CLI command implementations.
//!
//! Each submodule handles one subcommand:
//! - **init**: Write a default `.clgen.toml`
//! - **preprocess-db**: Run the batch runner over a dataset
//! - **preprocess-file** / **preprocess-inplace**: Preprocess kernels on disk
//! - **features**: Print bytecode features of one kernel
//! - **remove-bad**: Purge rejected contents from a dataset
//! - **import**: Ingest local `*.cl` files into a dataset

pub mod features;
pub mod import;
pub mod init;
pub mod preprocess_db;
pub mod preprocess_file;
pub mod remove_bad;

pub use features::handle_features;
pub use import::handle_import;
pub use init::init_config;
pub use preprocess_db::{handle_preprocess_db, preprocess_db, PreprocessDbOptions};
pub use preprocess_file::{handle_preprocess_file, handle_preprocess_inplace, verdict_exit_code};
pub use remove_bad::handle_remove_bad;

use crate::config::{load_config, load_config_from, ClgenConfig};
use std::path::Path;

/// Configuration from an explicit file, or discovered from the working
/// directory.
pub fn resolve_config(path: Option<&Path>) -> anyhow::Result<ClgenConfig> {
    match path {
        Some(path) => load_config_from(path),
        None => Ok(load_config()),
    }
}
