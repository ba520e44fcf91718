//! Boot-level and service-level deployment.
//!
//! Copies the overlay blob into the boot overlay directory, keeps exactly
//! one activation directive in the boot config file across reruns, and
//! writes the systemd unit plus a separate environment drop-in. The drop-in
//! carries the idle timeout so a later config change only rewrites the
//! fragment, never the base unit.

use crate::config::RuntimeConfig;
use crate::error::InstallError;
use crate::layout::PluginLayout;
use pkg_constants::{packages, service};
use tokio::io::AsyncWriteExt;
use tracing::info;

/// Installs boot overlay, boot config directive, unit, and drop-in.
pub struct DeploymentInstaller {
    layout: PluginLayout,
}

impl DeploymentInstaller {
    pub fn new(layout: PluginLayout) -> Self {
        Self { layout }
    }

    /// Run all deployment steps in order.
    pub async fn install(&self, config: &RuntimeConfig) -> Result<(), InstallError> {
        self.install_overlay().await?;
        self.ensure_boot_config_line().await?;
        self.write_service_unit().await?;
        self.write_env_override(config).await?;
        Ok(())
    }

    /// Copy the bundled overlay blob into the boot overlay directory.
    /// A missing asset is a packaging defect and fails the run.
    async fn install_overlay(&self) -> Result<(), InstallError> {
        let asset = self.layout.overlay_asset();
        if !asset.exists() {
            return Err(InstallError::OverlayAssetMissing(asset));
        }

        let dest = self.layout.overlay_dest();
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(InstallError::OverlayInstallFailed)?;
        }
        tokio::fs::copy(&asset, &dest)
            .await
            .map_err(InstallError::OverlayInstallFailed)?;
        info!("overlay installed at {}", dest.display());
        Ok(())
    }

    /// Append the activation directive to the boot config file unless a
    /// line already carries it. At most one directive survives any number
    /// of reruns.
    async fn ensure_boot_config_line(&self) -> Result<(), InstallError> {
        let path = self.layout.boot_config();
        let contents = match tokio::fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(InstallError::BootConfigUpdateFailed(e)),
        };

        if contents.contains(service::BOOT_OVERLAY_DIRECTIVE) {
            info!("boot config already contains '{}'", service::BOOT_OVERLAY_DIRECTIVE);
            return Ok(());
        }

        let mut line = String::new();
        if !contents.is_empty() && !contents.ends_with('\n') {
            line.push('\n');
        }
        line.push_str(service::BOOT_OVERLAY_DIRECTIVE);
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(path)
            .await
            .map_err(InstallError::BootConfigUpdateFailed)?;
        file.write_all(line.as_bytes())
            .await
            .map_err(InstallError::BootConfigUpdateFailed)?;
        info!(
            "appended '{}' to {}",
            service::BOOT_OVERLAY_DIRECTIVE,
            path.display()
        );
        Ok(())
    }

    /// Base unit text: fixed command line, working directory, bounded
    /// restart policy, graceful stop via SIGINT.
    pub fn render_unit(&self) -> String {
        let compositor = self.layout.compositor_dir();
        format!(
            "[Unit]\n\
             Description=pixelhat LCD compositor\n\
             After=local-fs.target\n\
             StartLimitIntervalSec=120\n\
             StartLimitBurst=5\n\
             \n\
             [Service]\n\
             ExecStart={node} {dir}/index.js\n\
             WorkingDirectory={dir}\n\
             User=root\n\
             Restart=on-failure\n\
             RestartSec=5\n\
             KillSignal=SIGINT\n\
             \n\
             [Install]\n\
             WantedBy=multi-user.target\n",
            node = packages::NODE_BIN,
            dir = compositor.display(),
        )
    }

    /// Environment drop-in text, carrying the idle timeout from the config
    /// snapshot.
    pub fn render_env_override(&self, config: &RuntimeConfig) -> String {
        format!(
            "[Service]\nEnvironment={}={}\n",
            service::IDLE_TIMEOUT_ENV,
            config.idle_timeout
        )
    }

    async fn write_service_unit(&self) -> Result<(), InstallError> {
        let path = self.layout.unit_path();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(InstallError::UnitInstallFailed)?;
        }
        tokio::fs::write(&path, self.render_unit())
            .await
            .map_err(InstallError::UnitInstallFailed)?;
        info!("service unit written to {}", path.display());
        Ok(())
    }

    async fn write_env_override(&self, config: &RuntimeConfig) -> Result<(), InstallError> {
        tokio::fs::create_dir_all(self.layout.dropin_dir())
            .await
            .map_err(InstallError::UnitInstallFailed)?;
        let path = self.layout.override_path();
        tokio::fs::write(&path, self.render_env_override(config))
            .await
            .map_err(InstallError::UnitInstallFailed)?;
        info!(
            "idle timeout {}s written to {}",
            config.idle_timeout,
            path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn test_layout(dir: &Path) -> PluginLayout {
        PluginLayout::new(&dir.join("plugin"))
            .with_boot_config(&dir.join("boot/config.txt"))
            .with_overlay_dir(&dir.join("boot/overlays"))
            .with_systemd_dir(&dir.join("systemd"))
    }

    fn seed_overlay_asset(layout: &PluginLayout) {
        std::fs::create_dir_all(layout.assets_dir()).unwrap();
        std::fs::write(layout.overlay_asset(), b"\xd0\x0d\xfe\xed").unwrap();
    }

    #[tokio::test]
    async fn test_missing_overlay_asset_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let installer = DeploymentInstaller::new(test_layout(dir.path()));

        match installer.install(&RuntimeConfig::default()).await {
            Err(InstallError::OverlayAssetMissing(path)) => {
                assert!(path.ends_with("assets/pixelhat.dtbo"))
            }
            other => panic!("expected OverlayAssetMissing, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_install_copies_overlay_and_writes_units() {
        let dir = tempfile::tempdir().unwrap();
        let layout = test_layout(dir.path());
        seed_overlay_asset(&layout);

        let installer = DeploymentInstaller::new(layout.clone());
        installer.install(&RuntimeConfig::default()).await.unwrap();

        assert_eq!(
            std::fs::read(layout.overlay_dest()).unwrap(),
            b"\xd0\x0d\xfe\xed"
        );
        assert!(layout.unit_path().exists());
        assert!(layout.override_path().exists());
    }

    #[tokio::test]
    async fn test_boot_config_directive_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let layout = test_layout(dir.path());
        seed_overlay_asset(&layout);
        std::fs::create_dir_all(layout.boot_config().parent().unwrap()).unwrap();
        std::fs::write(layout.boot_config(), "arm_64bit=1\n").unwrap();

        let installer = DeploymentInstaller::new(layout.clone());
        installer.install(&RuntimeConfig::default()).await.unwrap();
        installer.install(&RuntimeConfig::default()).await.unwrap();

        let contents = std::fs::read_to_string(layout.boot_config()).unwrap();
        assert_eq!(
            contents.matches("dtoverlay=pixelhat").count(),
            1,
            "directive must appear exactly once after two runs"
        );
        assert!(contents.starts_with("arm_64bit=1\n"));
    }

    #[tokio::test]
    async fn test_boot_config_without_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        let layout = test_layout(dir.path());
        seed_overlay_asset(&layout);
        std::fs::create_dir_all(layout.boot_config().parent().unwrap()).unwrap();
        std::fs::write(layout.boot_config(), "gpu_mem=64").unwrap();

        let installer = DeploymentInstaller::new(layout.clone());
        installer.install(&RuntimeConfig::default()).await.unwrap();

        let contents = std::fs::read_to_string(layout.boot_config()).unwrap();
        assert!(contents.contains("gpu_mem=64\ndtoverlay=pixelhat\n"));
    }

    #[test]
    fn test_unit_rendering() {
        let dir = tempfile::tempdir().unwrap();
        let layout = test_layout(dir.path());
        let unit = DeploymentInstaller::new(layout.clone()).render_unit();

        assert!(unit.contains(&format!(
            "ExecStart=/usr/bin/node {}/index.js",
            layout.compositor_dir().display()
        )));
        assert!(unit.contains("Restart=on-failure"));
        assert!(unit.contains("StartLimitIntervalSec=120"));
        assert!(unit.contains("StartLimitBurst=5"));
        assert!(unit.contains("KillSignal=SIGINT"));
        assert!(unit.contains("WantedBy=multi-user.target"));
    }

    #[test]
    fn test_env_override_default_and_explicit() {
        let dir = tempfile::tempdir().unwrap();
        let installer = DeploymentInstaller::new(test_layout(dir.path()));

        let default = installer.render_env_override(&RuntimeConfig::default());
        assert_eq!(default, "[Service]\nEnvironment=PIXELHAT_IDLE_TIMEOUT=900\n");

        let custom = installer.render_env_override(&RuntimeConfig {
            idle_timeout: 1800,
            enabled: true,
        });
        assert!(custom.contains("PIXELHAT_IDLE_TIMEOUT=1800"));
    }
}
