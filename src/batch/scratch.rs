//! Per-run scratch directory holding worker output.

use crate::errors::BatchError;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const OUTPUT_EXTENSION: &str = "json";

/// Directory of worker scratch files, allocated per run and freed as a unit.
///
/// Worker `i` writes `<root>/<i>.json`. With a configured base directory the
/// root is a fresh `<base>/<pid>.<random>.preprocess`; otherwise a fresh
/// system temporary directory. Concurrent runs never share a root.
pub struct ScratchSpace {
    root: TempDir,
}

impl ScratchSpace {
    pub fn create(base: Option<&Path>) -> Result<Self, BatchError> {
        let root = match base {
            Some(base) => {
                fs::create_dir_all(base).map_err(|e| BatchError::scratch(base, e))?;
                tempfile::Builder::new()
                    .prefix(&format!("{}.", std::process::id()))
                    .suffix(".preprocess")
                    .tempdir_in(base)
                    .map_err(|e| BatchError::scratch(base, e))?
            }
            None => tempfile::Builder::new()
                .prefix("clgen-preprocess-")
                .tempdir()
                .map_err(|e| BatchError::scratch(std::env::temp_dir(), e))?,
        };
        Ok(Self { root })
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    /// Output file of worker `index`.
    pub fn job_path(&self, index: usize) -> PathBuf {
        self.path().join(format!("{index}.{OUTPUT_EXTENSION}"))
    }

    /// Every worker output present, ordered by worker index.
    pub fn outputs(&self) -> Result<Vec<PathBuf>, BatchError> {
        let entries = fs::read_dir(self.path()).map_err(|e| BatchError::scratch(self.path(), e))?;

        let mut outputs = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| BatchError::scratch(self.path(), e))?
                .path();
            let index = path
                .extension()
                .filter(|ext| *ext == OUTPUT_EXTENSION)
                .and_then(|_| path.file_stem())
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.parse::<usize>().ok());
            if let Some(index) = index {
                outputs.push((index, path));
            }
        }
        outputs.sort();
        Ok(outputs.into_iter().map(|(_, path)| path).collect())
    }

    /// Delete the directory and everything in it.
    pub fn dispose(self) -> Result<(), BatchError> {
        let path = self.root.path().to_path_buf();
        self.root.close().map_err(|e| BatchError::scratch(path, e))
    }

    /// Leave the directory on disk and return its path.
    pub fn keep(self) -> PathBuf {
        self.root.keep()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outputs_sorted_numerically() {
        let scratch = ScratchSpace::create(None).unwrap();
        for index in [10, 2, 0] {
            fs::write(scratch.job_path(index), "").unwrap();
        }
        fs::write(scratch.path().join("stray.txt"), "").unwrap();

        let names: Vec<_> = scratch
            .outputs()
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["0.json", "2.json", "10.json"]);
    }

    #[test]
    fn test_dispose_removes_directory() {
        let scratch = ScratchSpace::create(None).unwrap();
        let path = scratch.path().to_path_buf();
        fs::write(scratch.job_path(0), "[]").unwrap();
        scratch.dispose().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_configured_base_gets_fresh_directory_per_run() {
        let base = TempDir::new().unwrap();
        let first = ScratchSpace::create(Some(base.path())).unwrap();
        let second = ScratchSpace::create(Some(base.path())).unwrap();

        assert_ne!(first.path(), second.path());
        for scratch in [&first, &second] {
            assert_eq!(scratch.path().parent(), Some(base.path()));
            let name = scratch.path().file_name().unwrap().to_string_lossy().into_owned();
            assert!(name.starts_with(&format!("{}.", std::process::id())));
            assert!(name.ends_with(".preprocess"));
        }

        fs::write(first.job_path(0), "[]").unwrap();
        let path = first.path().to_path_buf();
        first.dispose().unwrap();
        assert!(!path.exists());
        assert!(second.path().exists());
    }
}
