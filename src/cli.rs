use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "clgen-preprocess")]
#[command(about = "OpenCL kernel preprocessing for training datasets", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Configuration file (default: discover .clgen.toml upwards)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbosity: u8,

    /// Suppress progress bars
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a default .clgen.toml in the current directory
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Preprocess every unprocessed kernel of a dataset
    PreprocessDb {
        /// Dataset database
        db: PathBuf,

        /// Run even if the dataset is not marked as modified
        #[arg(short, long)]
        force: bool,

        /// Maximum number of worker threads
        #[arg(short, long)]
        jobs: Option<usize>,
    },

    /// Preprocess a single kernel file
    PreprocessFile {
        /// Kernel source file
        path: PathBuf,

        /// Overwrite the file with the preprocessed kernel
        #[arg(short, long)]
        inplace: bool,
    },

    /// Preprocess kernel files in place, in parallel
    PreprocessInplace {
        /// Kernel source files
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Maximum number of worker threads
        #[arg(short, long)]
        jobs: Option<usize>,
    },

    /// Print the bytecode instruction features of a kernel
    Features {
        /// Kernel source file
        path: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Drop the contents of bad and ugly kernels and compact the dataset
    RemoveBad {
        /// Dataset database
        db: PathBuf,
    },

    /// Add *.cl files from a directory to a dataset
    Import {
        /// Dataset database, created if missing
        db: PathBuf,

        /// Directory searched recursively for kernels
        dir: PathBuf,
    },
}
