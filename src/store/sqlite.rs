use super::{DatasetStore, ProcessedRecord, SourceUnit, Status};
use crate::errors::StoreError;
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use walkdir::WalkDir;

const MODIFIED_KEY: &str = "preprocessed_modified";

/// Placeholder written over the contents of rejected records by a purge.
pub const DELETED_MARKER: &str = "[DELETED]";

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS ContentFiles (
        id TEXT PRIMARY KEY ON CONFLICT IGNORE,
        contents TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS PreprocessedFiles (
        id TEXT PRIMARY KEY ON CONFLICT REPLACE,
        status INTEGER NOT NULL,
        contents TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS Meta (
        key TEXT PRIMARY KEY ON CONFLICT REPLACE,
        value TEXT
    );
";

const GITHUB_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS ContentMeta (
        id TEXT PRIMARY KEY ON CONFLICT IGNORE,
        path TEXT NOT NULL,
        repo_url TEXT NOT NULL,
        sha TEXT NOT NULL,
        date_added DATETIME
    );
    CREATE TABLE IF NOT EXISTS Repositories (
        url TEXT PRIMARY KEY ON CONFLICT IGNORE,
        owner TEXT NOT NULL,
        name TEXT NOT NULL,
        fork INTEGER NOT NULL,
        stars INTEGER NOT NULL,
        contributors INTEGER NOT NULL,
        forks INTEGER NOT NULL,
        created_at DATETIME,
        updated_at DATETIME
    );
";

/// Records per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub accepted: usize,
    pub bad: usize,
    pub ugly: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.accepted + self.bad + self.ugly
    }
}

/// Outcome of a local directory import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Files read from disk.
    pub scanned: usize,
    /// Files whose contents were not yet in the store.
    pub added: usize,
}

/// Database size around a purge of rejected contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurgeReport {
    pub purged: usize,
    pub size_before: u64,
    pub size_after: u64,
}

impl PurgeReport {
    /// Size reduction in percent.
    pub fn reduction_percent(&self) -> f64 {
        if self.size_before == 0 {
            return 0.0;
        }
        (1.0 - self.size_after as f64 / self.size_before as f64) * 100.0
    }
}

/// SQLite-backed dataset.
pub struct SqliteStore {
    conn: Connection,
    path: PathBuf,
}

impl SqliteStore {
    /// Open `path`, creating the database and base schema if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(30))?;
        conn.execute_batch(SCHEMA)?;
        log::debug!("opened dataset {}", path.display());
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    /// Open a dataset that must already exist.
    pub fn open_existing(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(StoreError::Missing(path.to_path_buf()));
        }
        Self::open(path)
    }

    /// Open `path` with the extended repository metadata schema.
    pub fn open_github(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let store = Self::open(path)?;
        store.conn.execute_batch(GITHUB_SCHEMA)?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Add a raw kernel. Returns false if the id was already present.
    ///
    /// A new kernel marks the store as modified.
    pub fn add_content_file(&mut self, id: &str, contents: &str) -> Result<bool, StoreError> {
        let tx = self.conn.transaction()?;
        let added = insert_content(&tx, id, contents)?;
        if added {
            write_modified(&tx, true)?;
        }
        tx.commit()?;
        Ok(added)
    }

    /// Ingest every `*.cl` file below `dir`, keyed by the SHA-256 of its
    /// contents.
    pub fn import_dir(&mut self, dir: &Path) -> Result<ImportSummary, StoreError> {
        let mut summary = ImportSummary::default();
        let tx = self.conn.transaction()?;

        for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::from)?;
            let path = entry.path();
            let is_kernel = path.extension().and_then(|ext| ext.to_str()) == Some("cl");
            if !entry.file_type().is_file() || !is_kernel {
                continue;
            }

            let bytes = fs::read(path)?;
            let contents = String::from_utf8_lossy(&bytes);
            summary.scanned += 1;
            if insert_content(&tx, &content_id(&contents), &contents)? {
                summary.added += 1;
            } else {
                log::debug!("{} is already in the dataset", path.display());
            }
        }

        if summary.added > 0 {
            write_modified(&tx, true)?;
        }
        tx.commit()?;
        Ok(summary)
    }

    /// Stored outcome for `id`, if any.
    pub fn processed_record(&self, id: &str) -> Result<Option<ProcessedRecord>, StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, status, contents FROM PreprocessedFiles WHERE id = ?1",
                params![id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(id, status, contents)| {
            Ok(ProcessedRecord::new(id, Status::try_from(status)?, contents))
        })
        .transpose()
    }

    pub fn status_counts(&self) -> Result<StatusCounts, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT status, COUNT(*) FROM PreprocessedFiles GROUP BY status")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)))?;

        let mut counts = StatusCounts::default();
        for row in rows {
            let (status, count) = row?;
            let count = count as usize;
            match Status::try_from(status)? {
                Status::Accepted => counts.accepted = count,
                Status::Bad => counts.bad = count,
                Status::Ugly => counts.ugly = count,
            }
        }
        Ok(counts)
    }

    /// Replace the contents of every bad or ugly record with
    /// [`DELETED_MARKER`] and compact the database file.
    pub fn purge_rejected(&mut self) -> Result<PurgeReport, StoreError> {
        let size_before = fs::metadata(&self.path)?.len();

        let tx = self.conn.transaction()?;
        let purged = tx.execute(
            "UPDATE PreprocessedFiles SET contents = ?1 WHERE status = ?2 OR status = ?3",
            params![
                DELETED_MARKER,
                Status::Bad.code(),
                Status::Ugly.code()
            ],
        )?;
        tx.commit()?;
        self.conn.execute_batch("VACUUM")?;

        let size_after = fs::metadata(&self.path)?.len();
        Ok(PurgeReport {
            purged,
            size_before,
            size_after,
        })
    }
}

impl DatasetStore for SqliteStore {
    fn count_content_files(&self) -> Result<usize, StoreError> {
        count_rows(&self.conn, "ContentFiles")
    }

    fn count_preprocessed_files(&self) -> Result<usize, StoreError> {
        count_rows(&self.conn, "PreprocessedFiles")
    }

    fn content_window(&self, offset: usize, limit: usize) -> Result<Vec<SourceUnit>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, contents FROM ContentFiles ORDER BY rowid LIMIT ?1 OFFSET ?2",
        )?;
        let units = stmt
            .query_map(params![limit as i64, offset as i64], |row| {
                Ok(SourceUnit {
                    id: row.get(0)?,
                    contents: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(units)
    }

    fn is_cached(&self, id: &str) -> Result<bool, StoreError> {
        let cached = self
            .conn
            .query_row(
                "SELECT 1 FROM PreprocessedFiles WHERE id = ?1",
                params![id],
                |_| Ok(()),
            )
            .optional()?;
        Ok(cached.is_some())
    }

    fn upsert_all(
        &mut self,
        records: &[ProcessedRecord],
        clear_modified: bool,
    ) -> Result<usize, StoreError> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO PreprocessedFiles (id, status, contents) VALUES (?1, ?2, ?3)",
            )?;
            for record in records {
                stmt.execute(params![record.id, record.status.code(), record.contents])?;
            }
        }
        if clear_modified {
            write_modified(&tx, false)?;
        }
        tx.commit()?;
        Ok(records.len())
    }

    fn is_modified(&self) -> Result<bool, StoreError> {
        let flag = self
            .conn
            .query_row(
                "SELECT 1 FROM Meta WHERE key = ?1",
                params![MODIFIED_KEY],
                |_| Ok(()),
            )
            .optional()?;
        Ok(flag.is_some())
    }

    fn set_modified(&mut self, modified: bool) -> Result<(), StoreError> {
        write_modified(&self.conn, modified)
    }

    fn is_github(&self) -> Result<bool, StoreError> {
        let table = self
            .conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'Repositories'",
                [],
                |_| Ok(()),
            )
            .optional()?;
        Ok(table.is_some())
    }
}

/// Hex SHA-256 of a kernel's text, used as its id.
pub fn content_id(contents: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(contents.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn count_rows(conn: &Connection, table: &str) -> Result<usize, StoreError> {
    let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
        row.get(0)
    })?;
    Ok(count as usize)
}

fn insert_content(conn: &Connection, id: &str, contents: &str) -> Result<bool, StoreError> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO ContentFiles (id, contents) VALUES (?1, ?2)",
        params![id, contents],
    )?;
    Ok(changed > 0)
}

/// The flag is the presence of the `Meta` row.
fn write_modified(conn: &Connection, modified: bool) -> Result<(), StoreError> {
    if modified {
        conn.execute(
            "INSERT OR REPLACE INTO Meta (key, value) VALUES (?1, '1')",
            params![MODIFIED_KEY],
        )?;
    } else {
        conn.execute("DELETE FROM Meta WHERE key = ?1", params![MODIFIED_KEY])?;
    }
    Ok(())
}
