//! System dependency provisioning via apt.
//!
//! One index refresh, then one batched install of the compiler toolchain and
//! the graphics/image libraries the compositor build links against. A partial
//! batch failure is a total failure: a single missing dependency invalidates
//! the on-device build, so there is no per-package retry.

use crate::error::InstallError;
use crate::exec::{self, HostTools};
use pkg_constants::packages::REQUIRED_PACKAGES;
use tracing::info;

/// Refresh the apt package index. The rest of the plan cannot succeed
/// against a stale index, so failure here is immediately fatal.
pub async fn refresh_index(tools: &HostTools) -> Result<(), InstallError> {
    info!("refreshing package index");
    let mut cmd = tools.command("apt-get");
    cmd.args(["update", "-q"])
        .env("DEBIAN_FRONTEND", "noninteractive");
    exec::run_checked(cmd, "apt-get update")
        .await
        .map_err(InstallError::DependencyRefreshFailed)?;
    info!("package index refreshed");
    Ok(())
}

/// Install all required system packages in one batched transaction.
/// Re-running on an already-satisfied host is a no-op: apt skips packages
/// that are already at the requested version.
pub async fn install_packages(tools: &HostTools) -> Result<(), InstallError> {
    info!(
        "installing {} system packages: {}",
        REQUIRED_PACKAGES.len(),
        REQUIRED_PACKAGES.join(" ")
    );
    let mut cmd = tools.command("apt-get");
    cmd.args(["install", "-y", "-q"])
        .args(REQUIRED_PACKAGES)
        .env("DEBIAN_FRONTEND", "noninteractive");
    exec::run_checked(cmd, "apt-get install")
        .await
        .map_err(InstallError::DependencyInstallFailed)?;
    info!("system packages installed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_refresh_failure_maps_to_refresh_error() {
        let dir = tempfile::tempdir().unwrap();
        let tools = exec::stub_tools(dir.path(), &[("apt-get", "exit 100")]);
        let err = refresh_index(&tools).await.unwrap_err();
        assert!(matches!(err, InstallError::DependencyRefreshFailed(_)));
    }

    #[tokio::test]
    async fn test_install_batch_succeeds_with_healthy_apt() {
        let dir = tempfile::tempdir().unwrap();
        let tools = exec::stub_tools(dir.path(), &[("apt-get", "exit 0")]);
        assert!(install_packages(&tools).await.is_ok());
    }
}
