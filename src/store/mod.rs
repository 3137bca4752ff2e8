//! Persistent dataset store.
//!
//! The store owns three conceptual tables: raw kernels (`ContentFiles`),
//! preprocessing outcomes keyed by kernel id (`PreprocessedFiles`) and a
//! `Meta` key/value table holding the modified flag. [`DatasetStore`] is the
//! contract the batch runner works against; [`SqliteStore`] implements it on
//! an on-disk SQLite database.

mod record;
mod sqlite;

pub use record::{ProcessedRecord, SourceUnit, Status};
pub use sqlite::{
    content_id, ImportSummary, PurgeReport, SqliteStore, StatusCounts, DELETED_MARKER,
};

use crate::errors::StoreError;

/// Read/write contract against a dataset.
///
/// Every batch worker opens its own handle; only the finalize step mutates.
pub trait DatasetStore {
    /// Number of raw kernels.
    fn count_content_files(&self) -> Result<usize, StoreError>;

    /// Number of preprocessing outcomes.
    fn count_preprocessed_files(&self) -> Result<usize, StoreError>;

    /// Raw kernels `[offset, offset + limit)` in insertion order.
    fn content_window(&self, offset: usize, limit: usize) -> Result<Vec<SourceUnit>, StoreError>;

    /// Whether an outcome for `id` is already stored.
    fn is_cached(&self, id: &str) -> Result<bool, StoreError>;

    /// Insert or replace `records` by id in one transaction.
    ///
    /// With `clear_modified` the modified flag is cleared in the same
    /// transaction, so it never reads clear while records are half written.
    fn upsert_all(
        &mut self,
        records: &[ProcessedRecord],
        clear_modified: bool,
    ) -> Result<usize, StoreError>;

    fn is_modified(&self) -> Result<bool, StoreError>;

    fn set_modified(&mut self, modified: bool) -> Result<(), StoreError>;

    /// Whether the store carries the extended repository metadata schema.
    fn is_github(&self) -> Result<bool, StoreError>;
}
