use crate::errors::StoreError;
use crate::store::SqliteStore;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A SQLite dataset living in its own temporary directory.
///
/// The directory, and the database with it, is removed on drop.
pub struct TempDataset {
    dir: TempDir,
    path: PathBuf,
}

impl TempDataset {
    pub fn new() -> Result<Self, StoreError> {
        let dir = TempDir::new()?;
        let path = dir.path().join("kernels.db");
        SqliteStore::open(&path)?;
        Ok(Self { dir, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the database, free for scratch files.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn open(&self) -> Result<SqliteStore, StoreError> {
        SqliteStore::open_existing(&self.path)
    }
}

/// A dataset holding `units` as `(id, contents)` pairs, in order.
pub fn seeded_dataset<'a>(
    units: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Result<TempDataset, StoreError> {
    let dataset = TempDataset::new()?;
    let mut store = dataset.open()?;
    for (id, contents) in units {
        store.add_content_file(id, contents)?;
    }
    Ok(dataset)
}
