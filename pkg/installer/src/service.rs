//! Service lifecycle: register the compositor unit with systemd and
//! conditionally start it.
//!
//! An immediate start failure is expected on first install — the
//! framebuffer device the overlay exposes only appears after a reboot — so
//! by default it is reported as a warning and the run still succeeds.
//! `strict_start` turns it fatal for hosts where the device is already
//! present and a start failure would mean a genuine defect.

use crate::config::RuntimeConfig;
use crate::error::InstallError;
use crate::exec::{self, HostTools};
use pkg_constants::service::UNIT_NAME;
use tracing::{info, warn};

/// Reload the supervisor, enable the unit for boot, and start it if the
/// activation flag allows.
pub async fn activate(
    tools: &HostTools,
    config: &RuntimeConfig,
    strict_start: bool,
) -> Result<(), InstallError> {
    let mut cmd = tools.command("systemctl");
    cmd.arg("daemon-reload");
    exec::run_checked(cmd, "systemctl daemon-reload")
        .await
        .map_err(InstallError::SupervisorReloadFailed)?;
    info!("supervisor reloaded");

    let mut cmd = tools.command("systemctl");
    cmd.args(["enable", UNIT_NAME]);
    exec::run_checked(cmd, "systemctl enable")
        .await
        .map_err(InstallError::ServiceEnableFailed)?;
    info!("{} enabled for boot", UNIT_NAME);

    if !config.enabled {
        info!("activation flag disabled — {} left enabled but not started", UNIT_NAME);
        return Ok(());
    }

    let mut cmd = tools.command("systemctl");
    cmd.args(["start", UNIT_NAME]);
    match exec::run_checked(cmd, "systemctl start").await {
        Ok(()) => {
            info!("{} started", UNIT_NAME);
            Ok(())
        }
        Err(e) if strict_start => Err(InstallError::ServiceStartFailed(e)),
        Err(e) => {
            warn!("{e} — the framebuffer usually appears after a reboot; continuing");
            Ok(())
        }
    }
}
