use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::Path;

use crate::error::{MigrateError, Result};

/// Exclusive lock held for the length of a report run.
///
/// Released when dropped; the lock file itself stays behind.
#[derive(Debug)]
pub struct RunLock {
    file: File,
}

impl RunLock {
    pub fn acquire(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        file.try_lock_exclusive()
            .map_err(|_| MigrateError::Locked(path.display().to_string()))?;

        Ok(Self { file })
    }

    pub fn release(self) -> Result<()> {
        self.file.unlock()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn second_run_is_refused_until_release() {
        let dir = tempdir().unwrap();
        let lock_path = dir.path().join(".report.lock");

        let held = RunLock::acquire(&lock_path).unwrap();
        let err = RunLock::acquire(&lock_path).unwrap_err();
        assert_eq!(err.code(), "locked");

        held.release().unwrap();
        let _again = RunLock::acquire(&lock_path).unwrap();
    }

    #[test]
    fn drop_releases_lock() {
        let dir = tempdir().unwrap();
        let lock_path = dir.path().join(".report.lock");

        drop(RunLock::acquire(&lock_path).unwrap());
        assert!(RunLock::acquire(&lock_path).is_ok());
    }
}
