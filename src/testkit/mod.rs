//! Test support: an in-process toolchain and throwaway datasets.
//!
//! Nothing here spawns clang or opt, so the pipeline, batch runner and
//! commands can be tested without an LLVM installation.
//!
//! ```rust
//! use clgen_preprocess::config::ClgenConfig;
//! use clgen_preprocess::pipeline::{Preprocessor, Verdict};
//! use clgen_preprocess::testkit::MockToolchain;
//! use clgen_preprocess::toolchain::ToolOutput;
//!
//! let toolchain = MockToolchain::new()
//!     .with_compile(|_| ToolOutput::exit(1, "error: unknown type name 'flaot'"));
//! let config = ClgenConfig::default();
//! let verdict = Preprocessor::new(&toolchain, &config)
//!     .classify("kernel void A(global flaot* a) {}")
//!     .unwrap();
//! assert!(matches!(verdict, Verdict::Bad(_)));
//! ```

pub mod fixtures;
pub mod mock_toolchain;

pub use fixtures::{seeded_dataset, TempDataset};
pub use mock_toolchain::{stdin_text, MockToolchain, MOCK_INSTCOUNT_REPORT, MOCK_IR};
