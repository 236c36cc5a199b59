//! Advisory cross-process lock
//!
//! A sibling lock file guarded with non-blocking exclusive `flock`. The file
//! holds no data. Contention fails immediately instead of waiting.

use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use fs4::FileExt;
use tracing::{debug, warn};

use crate::error::{KvError, Result};

/// Path of the lock file; acquiring it yields a [`LockGuard`]
#[derive(Debug, Clone)]
pub struct FileLock {
    path: PathBuf,
}

impl FileLock {
    /// Remember the lock path; nothing is opened yet
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Try to take the lock without blocking
    ///
    /// Returns `LockHeld` if another holder has it.
    pub fn try_acquire(&self) -> Result<LockGuard> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(&self.path)
            .map_err(|source| KvError::LockAcquire {
                path: self.path.clone(),
                source,
            })?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                debug!(path = %self.path.display(), "lock acquired");
                Ok(LockGuard {
                    file: Some(file),
                    path: self.path.clone(),
                })
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                Err(KvError::LockHeld(self.path.clone()))
            }
            Err(source) => Err(KvError::LockAcquire {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

/// Held lock. Released by [`LockGuard::release`] or, failing that, on drop.
#[derive(Debug)]
pub struct LockGuard {
    file: Option<File>,
    path: PathBuf,
}

impl LockGuard {
    /// Release the lock, reporting unlock failures
    pub fn release(mut self) -> Result<()> {
        match self.file.take() {
            Some(file) => Self::unlock(&file, &self.path),
            None => Ok(()),
        }
    }

    fn unlock(file: &File, path: &Path) -> Result<()> {
        FileExt::unlock(file).map_err(|source| KvError::LockRelease {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "lock released");
        Ok(())
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            if let Err(e) = Self::unlock(&file, &self.path) {
                warn!(error = %e, "lock release on drop failed");
            }
        }
    }
}
