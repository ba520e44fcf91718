//! Cross-process mutual exclusion for install runs.
//!
//! The lock is a filesystem marker created with an atomic create-if-absent
//! open. A second invocation that finds the marker fails fast with
//! `AlreadyInstalling` and must leave the existing file alone — it belongs
//! to the run that created it.

use crate::error::InstallError;
use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Scoped install lock. Release consumes the lock, so a double release is
/// unrepresentable; dropping an unreleased lock removes the marker as a
/// last resort.
#[derive(Debug)]
pub struct InstallLock {
    path: PathBuf,
    released: bool,
}

impl InstallLock {
    /// Atomically create the lock marker. An existing marker means another
    /// run is in progress: fail with `AlreadyInstalling` without touching it.
    pub fn acquire(path: &Path) -> Result<Self, InstallError> {
        match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(mut file) => {
                // Record the owning pid for operator forensics.
                use std::io::Write;
                let _ = writeln!(file, "{}", std::process::id());
                info!("install lock acquired at {}", path.display());
                Ok(Self {
                    path: path.to_path_buf(),
                    released: false,
                })
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(InstallError::AlreadyInstalling(path.to_path_buf()))
            }
            Err(e) => Err(InstallError::Io(e)),
        }
    }

    /// Remove the lock marker. Absence of the file is not an error.
    pub fn release(mut self) {
        self.remove_marker();
        self.released = true;
    }

    /// Path of the lock marker.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn remove_marker(&self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => info!("install lock released"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("failed to remove lock file {}: {}", self.path.display(), e),
        }
    }
}

impl Drop for InstallLock {
    fn drop(&mut self) {
        if !self.released {
            warn!("install lock dropped without explicit release");
            self.remove_marker();
            self.released = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_creates_marker() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("setup.lock");

        let lock = InstallLock::acquire(&path).unwrap();
        assert!(path.exists());
        lock.release();
        assert!(!path.exists());
    }

    #[test]
    fn test_second_acquire_fails_and_leaves_marker() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("setup.lock");

        let lock = InstallLock::acquire(&path).unwrap();
        match InstallLock::acquire(&path) {
            Err(InstallError::AlreadyInstalling(p)) => assert_eq!(p, path),
            other => panic!("expected AlreadyInstalling, got {:?}", other),
        }
        // The failed attempt must not have touched the existing marker.
        assert!(path.exists());
        lock.release();
    }

    #[test]
    fn test_preexisting_marker_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("setup.lock");
        std::fs::write(&path, "stale\n").unwrap();

        assert!(matches!(
            InstallLock::acquire(&path),
            Err(InstallError::AlreadyInstalling(_))
        ));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "stale\n");
    }

    #[test]
    fn test_release_tolerates_missing_marker() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("setup.lock");

        let lock = InstallLock::acquire(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        // Must not panic or error.
        lock.release();
    }

    #[test]
    fn test_drop_removes_marker() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("setup.lock");

        {
            let _lock = InstallLock::acquire(&path).unwrap();
            assert!(path.exists());
        }
        assert!(!path.exists());
    }
}
