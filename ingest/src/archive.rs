use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::interval::MonthWindow;

/// Prefix under which raw, untransformed pages land.
pub const LANDING_PREFIX: &str = "landing";

/// Object name of one archived page:
/// `landing/<dataset>/<dataset>_<year>_<month>_offset_<offset>.csv`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArchiveKey(String);

impl ArchiveKey {
    pub fn new(dataset: &str, year: i32, month: u32, offset: u64) -> Self {
        ArchiveKey(format!(
            "{LANDING_PREFIX}/{dataset}/{dataset}_{year}_{month:02}_offset_{offset}.csv"
        ))
    }

    pub fn for_window(dataset: &str, window: &MonthWindow, offset: u64) -> Self {
        Self::new(dataset, window.year(), window.month(), offset)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment, e.g. `nyc_311_2024_03_offset_0.csv`.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for ArchiveKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Durable object store holding the archived pages.
pub trait ArchiveStore {
    fn exists(&self, key: &ArchiveKey) -> Result<bool>;

    /// Upload the contents of the local file at `path` under `key`.
    fn upload_file(&self, key: &ArchiveKey, path: &Path) -> Result<()>;
}

impl<T: ArchiveStore + ?Sized> ArchiveStore for &T {
    fn exists(&self, key: &ArchiveKey) -> Result<bool> {
        (**self).exists(key)
    }

    fn upload_file(&self, key: &ArchiveKey, path: &Path) -> Result<()> {
        (**self).upload_file(key, path)
    }
}

/// Persists pages through a local staging file so stores only ever need to
/// upload from disk.
pub struct ArchiveWriter<S> {
    store: S,
    staging_dir: PathBuf,
}

impl<S: ArchiveStore> ArchiveWriter<S> {
    pub fn new(store: S, staging_dir: Option<PathBuf>) -> Self {
        ArchiveWriter {
            store,
            staging_dir: staging_dir.unwrap_or_else(std::env::temp_dir),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn exists(&self, key: &ArchiveKey) -> Result<bool> {
        self.store
            .exists(key)
            .with_context(|| format!("Failed to check whether {} exists", key))
    }

    /// Stage `body` on disk, upload it under `key`, then remove the staging
    /// file. Existence is not re-checked here.
    pub fn write_page(&self, key: &ArchiveKey, body: &str) -> Result<()> {
        let mut staged = tempfile::Builder::new()
            .prefix(key.file_name())
            .tempfile_in(&self.staging_dir)
            .with_context(|| {
                format!(
                    "Failed to create staging file in {}",
                    self.staging_dir.display()
                )
            })?;

        staged
            .write_all(body.as_bytes())
            .and_then(|_| staged.flush())
            .with_context(|| format!("Failed to stage {}", key))?;

        // on error the staging file is removed when `staged` drops
        self.store
            .upload_file(key, staged.path())
            .with_context(|| format!("Failed to upload {}", key))?;

        staged
            .close()
            .with_context(|| format!("Failed to remove staging file for {}", key))
    }
}
