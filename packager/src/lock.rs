//! Exclusive work directory lock.
//!
//! Build trees live at fixed, ABI-keyed paths under the work directory, so two
//! concurrent runs against the same directory would overwrite each other. A
//! run holds an advisory lock on `<work_dir>/.spatialite-aar.lock` until the
//! guard is dropped.

use crate::error::{PackagerError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use fs2::FileExt;
use log::debug;
use std::fs::{self, File, OpenOptions};

/// Lock file name inside the work directory.
pub const LOCK_FILE: &str = ".spatialite-aar.lock";

/// Guard holding the work directory lock.
#[derive(Debug)]
pub struct WorkDirLock {
    file: File,
    path: Utf8PathBuf,
}

impl WorkDirLock {
    /// Take the lock without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::WorkDirLocked`] if another run holds it, or
    /// [`PackagerError::Io`] if the lock file cannot be created.
    pub fn acquire(work_dir: &Utf8Path) -> Result<Self> {
        fs::create_dir_all(work_dir)?;
        let path = work_dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)?;

        if let Err(err) = FileExt::try_lock_exclusive(&file) {
            if err.raw_os_error() == fs2::lock_contended_error().raw_os_error() {
                return Err(PackagerError::WorkDirLocked { path });
            }
            return Err(err.into());
        }
        debug!("locked {path}");
        Ok(Self { file, path })
    }

    /// Path of the lock file.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl Drop for WorkDirLock {
    fn drop(&mut self) {
        if FileExt::unlock(&self.file).is_err() {
            debug!("could not release {}", self.path);
        }
    }
}
