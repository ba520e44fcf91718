//! Error taxonomy for the install run.
//!
//! Every fatal kind maps to exactly one failing step, so the caller can name
//! the step in its diagnostic line before emitting the run sentinel. The
//! rollback classification lives here too: the two precondition kinds must
//! never remove the lock file (no lock is held, or the lock belongs to a
//! concurrent run).

use std::path::PathBuf;
use thiserror::Error;

/// Install-run errors.
#[derive(Debug, Error)]
pub enum InstallError {
    /// Host architecture is not one the hat driver supports.
    #[error("unsupported architecture '{0}' (supported: armhf, arm64)")]
    UnsupportedArchitecture(String),

    /// Another setup run holds the install lock.
    #[error("another install is already running (lock file {} exists)", .0.display())]
    AlreadyInstalling(PathBuf),

    /// Could not determine the Node.js runtime version.
    #[error("failed to probe the Node.js runtime: {0}")]
    RuntimeProbeFailed(String),

    /// `apt-get update` failed.
    #[error("package index refresh failed: {0}")]
    DependencyRefreshFailed(String),

    /// Batched `apt-get install` of the required packages failed.
    #[error("system package install failed: {0}")]
    DependencyInstallFailed(String),

    /// The compiled native addon is missing even after an explicit rebuild.
    #[error("native pixel-format module build failed: {0}")]
    NativeModuleBuildFailed(String),

    /// The bundled overlay blob is not in the assets directory.
    /// A packaging defect, not a recoverable runtime condition.
    #[error("boot overlay asset missing: {}", .0.display())]
    OverlayAssetMissing(PathBuf),

    /// Copying the overlay blob into the boot overlay directory failed.
    #[error("boot overlay install failed: {0}")]
    OverlayInstallFailed(#[source] std::io::Error),

    /// Appending the activation directive to the boot config file failed.
    #[error("boot config update failed: {0}")]
    BootConfigUpdateFailed(#[source] std::io::Error),

    /// Writing the service unit or its environment drop-in failed.
    #[error("service unit install failed: {0}")]
    UnitInstallFailed(#[source] std::io::Error),

    /// `systemctl daemon-reload` failed.
    #[error("supervisor reload failed: {0}")]
    SupervisorReloadFailed(String),

    /// `systemctl enable` failed.
    #[error("service enable failed: {0}")]
    ServiceEnableFailed(String),

    /// `systemctl start` failed. Only fatal in strict-start mode; the
    /// default policy downgrades this to a warning because the framebuffer
    /// device usually appears only after the post-install reboot.
    #[error("service start failed: {0}")]
    ServiceStartFailed(String),

    /// Unexpected filesystem error while creating the install lock.
    #[error("lock file error: {0}")]
    Io(#[from] std::io::Error),
}

impl InstallError {
    /// Whether the rollback path should remove the install lock.
    ///
    /// False for the two precondition kinds: `UnsupportedArchitecture`
    /// happens before the lock exists, and on `AlreadyInstalling` the lock
    /// on disk belongs to a concurrent run whose exclusivity must survive.
    pub fn needs_rollback(&self) -> bool {
        !matches!(
            self,
            InstallError::UnsupportedArchitecture(_) | InstallError::AlreadyInstalling(_)
        )
    }

    /// Short name of the step this error belongs to, for diagnostics.
    pub fn step(&self) -> &'static str {
        match self {
            InstallError::UnsupportedArchitecture(_) => "architecture check",
            InstallError::AlreadyInstalling(_) => "lock acquisition",
            InstallError::Io(_) => "lock acquisition",
            InstallError::RuntimeProbeFailed(_) => "runtime probe",
            InstallError::DependencyRefreshFailed(_) => "package index refresh",
            InstallError::DependencyInstallFailed(_) => "package install",
            InstallError::NativeModuleBuildFailed(_) => "native module build",
            InstallError::OverlayAssetMissing(_) | InstallError::OverlayInstallFailed(_) => {
                "overlay install"
            }
            InstallError::BootConfigUpdateFailed(_) => "boot config update",
            InstallError::UnitInstallFailed(_) => "service unit install",
            InstallError::SupervisorReloadFailed(_) => "supervisor reload",
            InstallError::ServiceEnableFailed(_) => "service enable",
            InstallError::ServiceStartFailed(_) => "service start",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_kinds_skip_rollback() {
        assert!(!InstallError::UnsupportedArchitecture("amd64".into()).needs_rollback());
        assert!(!InstallError::AlreadyInstalling(PathBuf::from("/tmp/x.lock")).needs_rollback());
    }

    #[test]
    fn test_fatal_kinds_trigger_rollback() {
        assert!(InstallError::DependencyRefreshFailed("no network".into()).needs_rollback());
        assert!(InstallError::DependencyInstallFailed("apt broke".into()).needs_rollback());
        assert!(InstallError::NativeModuleBuildFailed("gyp failed".into()).needs_rollback());
        assert!(InstallError::OverlayAssetMissing(PathBuf::from("/a/b.dtbo")).needs_rollback());
        assert!(InstallError::SupervisorReloadFailed("dbus down".into()).needs_rollback());
        assert!(InstallError::ServiceEnableFailed("denied".into()).needs_rollback());
    }

    #[test]
    fn test_display_names_the_condition() {
        let err = InstallError::UnsupportedArchitecture("riscv64".into());
        assert!(err.to_string().contains("riscv64"));

        let err = InstallError::AlreadyInstalling(PathBuf::from("/tmp/pixelhat-setup.lock"));
        assert!(err.to_string().contains("/tmp/pixelhat-setup.lock"));
    }

    #[test]
    fn test_step_names() {
        assert_eq!(
            InstallError::NativeModuleBuildFailed("x".into()).step(),
            "native module build"
        );
        assert_eq!(
            InstallError::ServiceStartFailed("x".into()).step(),
            "service start"
        );
    }
}
