/// Store file handling
///
/// A `RecordStore` is bound to one JSON file. Reads are plain; every
/// read-modify-write runs under an exclusive advisory lock and saves via a
/// temp file plus rename.

use crate::error::{Result, TrackerError};
use crate::store::models::Records;
use fs2::FileExt;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Indentation used when writing store files
const INDENT: &[u8] = b"    ";

/// Handle on one JSON-backed store
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    /// Create a handle for the store at `path`
    ///
    /// Nothing is touched on disk until the first write.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Get the store file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the backing file exists yet
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load every record in the store
    ///
    /// # Returns
    /// * `Ok(Records)` - The stored records, empty if the file is missing or blank
    /// * `Err(TrackerError::CorruptData)` - If the file is not a valid record map
    pub fn load(&self) -> Result<Records> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "store file absent, starting empty");
            return Ok(Records::new());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Records::new());
        }

        serde_json::from_str(&content).map_err(|source| {
            warn!(path = %self.path.display(), error = %source, "store file is corrupt");
            TrackerError::CorruptData {
                path: self.path.display().to_string(),
                source,
            }
        })
    }

    /// Write the whole store
    ///
    /// Serializes to a sibling temp file, syncs it, then renames it over the
    /// store so a crash never leaves a half-written file behind.
    pub fn save(&self, records: &Records) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(INDENT);
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        records.serialize(&mut serializer)?;
        buf.push(b'\n');

        let tmp_path = self.temp_path()?;
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(&buf)?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        fs::rename(&tmp_path, &self.path)?;

        debug!(path = %self.path.display(), records = records.len(), "store saved");
        Ok(())
    }

    /// Locked read-modify-write
    ///
    /// Loads the store under the lock and hands it to `f`. The store is only
    /// written back if `f` succeeded and actually changed something.
    pub fn update<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Records) -> Result<T>,
    {
        let _lock = self.lock()?;

        let mut records = self.load()?;
        let before = records.clone();

        let out = f(&mut records)?;

        if records != before {
            self.save(&records)?;
        }

        Ok(out)
    }

    /// Take the exclusive lock for this store
    ///
    /// Released when the returned guard is dropped.
    pub fn lock(&self) -> Result<StoreLock> {
        let lock_path = self.path.with_extension("lock");

        if let Some(parent) = lock_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        file.lock_exclusive().map_err(|e| {
            TrackerError::Lock(format!("{}: {}", lock_path.display(), e))
        })?;

        Ok(StoreLock { file })
    }

    fn temp_path(&self) -> Result<PathBuf> {
        let file_name = self.path.file_name().ok_or_else(|| {
            TrackerError::Config(format!("store path has no file name: {}", self.path.display()))
        })?;

        let tmp_name = format!(".{}.tmp", file_name.to_string_lossy());
        Ok(self.path.with_file_name(tmp_name))
    }
}

/// Guard holding a store lock
///
/// The lock file stays on disk; only the lock is released.
pub struct StoreLock {
    file: File,
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}
