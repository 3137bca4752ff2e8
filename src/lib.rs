//! OpenCL kernel preprocessing for training datasets.
//!
//! Raw kernels are compiled, measured, normalized and classified as accepted,
//! bad (does not compile) or ugly (compiles, but not worth training on).
//! Whole datasets are processed by a pool of workers whose results are merged
//! into the dataset store in one transaction.
//!
//! The main entry points are [`pipeline::Preprocessor`] for single kernels and
//! [`batch::BatchRunner`] for datasets. Every external program is reached
//! through the [`toolchain::Toolchain`] trait.

pub mod batch;
pub mod cli;
pub mod commands;
pub mod compiler;
pub mod config;
pub mod errors;
pub mod features;
pub mod pipeline;
pub mod policy;
pub mod progress;
pub mod store;
pub mod testkit;
pub mod toolchain;

// Re-export commonly used types
pub use crate::batch::{BatchCounts, BatchRunner, BatchSummary};
pub use crate::config::ClgenConfig;
pub use crate::errors::{BatchError, ErrorClass, PreprocessError, StoreError, ToolchainError};
pub use crate::features::{escape_sql_key, FeatureTable};
pub use crate::pipeline::{Preprocessor, Verdict};
pub use crate::store::{DatasetStore, ProcessedRecord, SqliteStore, Status};
pub use crate::toolchain::{ProcessToolchain, Toolchain};
