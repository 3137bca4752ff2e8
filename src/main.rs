use anyhow::Result;
use clap::Parser;
use clgen_preprocess::cli::{Cli, Commands};
use clgen_preprocess::commands::{self, PreprocessDbOptions};
use clgen_preprocess::progress::ProgressConfig;
use log::LevelFilter;
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbosity);

    if let Commands::Init { force } = cli.command {
        commands::init_config(force)?;
        return Ok(ExitCode::SUCCESS);
    }

    let config = commands::resolve_config(cli.config.as_deref())?;
    let progress = ProgressConfig::from_env(cli.quiet);

    match cli.command {
        Commands::Init { .. } => {}
        Commands::PreprocessDb { db, force, jobs } => {
            let options = PreprocessDbOptions {
                db,
                force,
                jobs,
                progress,
            };
            commands::handle_preprocess_db(&config, &options)?;
        }
        Commands::PreprocessFile { path, inplace } => {
            return commands::handle_preprocess_file(&config, &path, inplace);
        }
        Commands::PreprocessInplace { paths, jobs } => {
            commands::handle_preprocess_inplace(&config, &paths, jobs, progress)?;
        }
        Commands::Features { path, json } => {
            commands::handle_features(&config, &path, json)?;
        }
        Commands::RemoveBad { db } => {
            commands::handle_remove_bad(&db)?;
        }
        Commands::Import { db, dir } => {
            commands::handle_import(&db, &dir)?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Warnings by default; each `-v` raises the level. `RUST_LOG` wins.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}
