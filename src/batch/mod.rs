//! Concurrent batch preprocessing.
//!
//! [`BatchRunner`] spreads a dataset over a pool of workers. Each worker owns
//! a [`WorkerJob`]: a contiguous slice of the content table and a private
//! scratch file in the run's [`ScratchSpace`]. Workers never touch the shared
//! store; [`finalize`] merges their output once they are done.
//!
//! [`preprocess_file`] and [`preprocess_inplace`] apply the same pipeline to
//! files on disk.

mod files;
mod partition;
mod runner;
mod scratch;
mod worker;

pub use files::{preprocess_file, preprocess_inplace, InplaceSummary};
pub use partition::partition;
pub use runner::{finalize, BatchRunner};
pub use scratch::ScratchSpace;
pub use worker::{run_worker, WorkerJob};

use crate::store::Status;
use std::ops::AddAssign;

/// Verdict tallies of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchCounts {
    /// Units run through the pipeline.
    pub attempted: usize,
    /// Units with a stored outcome, left alone.
    pub skipped: usize,
    pub accepted: usize,
    pub bad: usize,
    pub ugly: usize,
}

impl BatchCounts {
    pub fn record(&mut self, status: Status) {
        self.attempted += 1;
        match status {
            Status::Accepted => self.accepted += 1,
            Status::Bad => self.bad += 1,
            Status::Ugly => self.ugly += 1,
        }
    }
}

impl AddAssign for BatchCounts {
    fn add_assign(&mut self, other: Self) {
        self.attempted += other.attempted;
        self.skipped += other.skipped;
        self.accepted += other.accepted;
        self.bad += other.bad;
        self.ugly += other.ugly;
    }
}

/// Result of a completed batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    /// Worker threads used.
    pub workers: usize,
    /// Records written to the store.
    pub merged: usize,
    pub counts: BatchCounts,
}
