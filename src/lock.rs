//! Per-locale advisory file lock guarding one-time setup work.
//!
//! The lock file lives next to the index directory (`<parent>/<locale>.lock`) so
//! processes sharing an installation agree on it even before the index exists.
//! Acquisition never blocks: losing the race is reported as `false`.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use fs2::FileExt;

use crate::error::{IndexError, Result};

#[derive(Debug)]
pub struct FileLock {
    path: PathBuf,
    held: Mutex<Option<File>>,
}

impl FileLock {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            held: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Tries to take the lock without blocking.
    ///
    /// `Ok(false)` means another holder (usually another process) owns it.
    /// Calling this again while this instance already holds the lock is a bug in
    /// the caller and yields [`IndexError::LockAlreadyHeld`].
    pub fn try_acquire(&self) -> Result<bool> {
        let mut held = self.held.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if held.is_some() {
            return Err(IndexError::LockAlreadyHeld {
                path: self.path.clone(),
            });
        }
        if let Some(parent) = self.path.parent() {
            if let Err(err) = fs_err::create_dir_all(parent) {
                tracing::debug!(
                    lock = %self.path.display(),
                    error = %err,
                    "lock directory unavailable"
                );
                return Ok(false);
            }
        }
        let file = match OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
        {
            Ok(file) => file,
            Err(err) => {
                tracing::debug!(lock = %self.path.display(), error = %err, "lock file unavailable");
                return Ok(false);
            }
        };
        match file.try_lock_exclusive() {
            Ok(()) => {
                *held = Some(file);
                Ok(true)
            }
            Err(err) => {
                tracing::debug!(lock = %self.path.display(), error = %err, "lock held elsewhere");
                Ok(false)
            }
        }
    }

    /// Releases the lock if held; a no-op otherwise.
    pub fn release(&self) {
        let mut held = self.held.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(file) = held.take() {
            if let Err(err) = FileExt::unlock(&file) {
                tracing::debug!(
                    lock = %self.path.display(),
                    error = %err,
                    "unlock failed; closing handle"
                );
            }
        }
    }

    #[must_use]
    pub fn is_held(&self) -> bool {
        self.held
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .is_some()
    }

    /// Removes the lock file. Refused (returns false) while the lock is held.
    pub fn delete_lock_file(&self) -> bool {
        if self.is_held() {
            return false;
        }
        match fs_err::remove_file(&self.path) {
            Ok(()) => true,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => true,
            Err(err) => {
                tracing::debug!(lock = %self.path.display(), error = %err, "lock file not deleted");
                false
            }
        }
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        self.release();
    }
}
