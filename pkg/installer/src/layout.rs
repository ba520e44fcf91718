//! Filesystem layout of the plugin tree and the host paths the installer
//! touches. Every path flows through here so tests can point the whole
//! installer at a temporary directory.

use pkg_constants::{paths, service};
use std::path::{Path, PathBuf};

/// Resolved filesystem layout for one install run.
#[derive(Debug, Clone)]
pub struct PluginLayout {
    root: PathBuf,
    boot_config: PathBuf,
    overlay_dir: PathBuf,
    systemd_dir: PathBuf,
}

impl PluginLayout {
    /// Layout rooted at `root`, with default host paths for boot config,
    /// overlay directory, and systemd unit directory.
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            boot_config: PathBuf::from(paths::BOOT_CONFIG_PATH),
            overlay_dir: PathBuf::from(paths::OVERLAY_DIR),
            systemd_dir: PathBuf::from(paths::SYSTEMD_UNIT_DIR),
        }
    }

    /// Override the boot configuration file path.
    pub fn with_boot_config(mut self, path: &Path) -> Self {
        self.boot_config = path.to_path_buf();
        self
    }

    /// Override the boot overlay directory.
    pub fn with_overlay_dir(mut self, dir: &Path) -> Self {
        self.overlay_dir = dir.to_path_buf();
        self
    }

    /// Override the systemd unit directory.
    pub fn with_systemd_dir(mut self, dir: &Path) -> Self {
        self.systemd_dir = dir.to_path_buf();
        self
    }

    /// Plugin root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Compositor install directory (prebuilt archives extract here,
    /// `npm install` runs here).
    pub fn compositor_dir(&self) -> PathBuf {
        self.root.join(paths::COMPOSITOR_SUBDIR)
    }

    /// Native pixel-format addon source directory.
    pub fn native_module_dir(&self) -> PathBuf {
        self.root.join(paths::NATIVE_MODULE_SUBDIR)
    }

    /// Conventional path of the compiled native addon.
    pub fn compiled_module_path(&self) -> PathBuf {
        self.native_module_dir().join(paths::COMPILED_MODULE_RELPATH)
    }

    /// Bundled assets directory.
    pub fn assets_dir(&self) -> PathBuf {
        self.root.join(paths::ASSETS_SUBDIR)
    }

    /// Prebuilt archive for an artifact key, e.g. `arm64-node18.tar.gz`.
    pub fn prebuilt_archive(&self, key: &str) -> PathBuf {
        self.assets_dir().join(format!("{key}.tar.gz"))
    }

    /// Bundled boot overlay blob.
    pub fn overlay_asset(&self) -> PathBuf {
        self.assets_dir().join(paths::OVERLAY_FILENAME)
    }

    /// Install destination of the boot overlay blob.
    pub fn overlay_dest(&self) -> PathBuf {
        self.overlay_dir.join(paths::OVERLAY_FILENAME)
    }

    /// Boot configuration file.
    pub fn boot_config(&self) -> &Path {
        &self.boot_config
    }

    /// Persisted plugin configuration document.
    pub fn config_path(&self) -> PathBuf {
        self.root.join(paths::CONFIG_FILENAME)
    }

    /// Service unit definition path.
    pub fn unit_path(&self) -> PathBuf {
        self.systemd_dir.join(service::UNIT_NAME)
    }

    /// Drop-in directory for the service unit.
    pub fn dropin_dir(&self) -> PathBuf {
        self.systemd_dir.join(service::DROPIN_DIR_NAME)
    }

    /// Environment-override fragment path.
    pub fn override_path(&self) -> PathBuf {
        self.dropin_dir().join(service::OVERRIDE_FILENAME)
    }
}

impl Default for PluginLayout {
    fn default() -> Self {
        Self::new(Path::new(paths::DEFAULT_PLUGIN_ROOT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout_paths() {
        let layout = PluginLayout::default();
        assert_eq!(layout.root(), Path::new("/opt/pixelhat"));
        assert_eq!(
            layout.compositor_dir(),
            PathBuf::from("/opt/pixelhat/compositor")
        );
        assert_eq!(
            layout.compiled_module_path(),
            PathBuf::from("/opt/pixelhat/native/pixelfb/build/Release/pixelfb.node")
        );
        assert_eq!(layout.boot_config(), Path::new("/boot/config.txt"));
        assert_eq!(
            layout.unit_path(),
            PathBuf::from("/etc/systemd/system/pixelhat.service")
        );
        assert_eq!(
            layout.override_path(),
            PathBuf::from("/etc/systemd/system/pixelhat.service.d/override.conf")
        );
    }

    #[test]
    fn test_prebuilt_archive_name() {
        let layout = PluginLayout::new(Path::new("/opt/pixelhat"));
        assert_eq!(
            layout.prebuilt_archive("arm64-node18"),
            PathBuf::from("/opt/pixelhat/assets/arm64-node18.tar.gz")
        );
    }

    #[test]
    fn test_overrides() {
        let layout = PluginLayout::new(Path::new("/tmp/p"))
            .with_boot_config(Path::new("/tmp/boot/config.txt"))
            .with_overlay_dir(Path::new("/tmp/boot/overlays"))
            .with_systemd_dir(Path::new("/tmp/systemd"));
        assert_eq!(layout.boot_config(), Path::new("/tmp/boot/config.txt"));
        assert_eq!(
            layout.overlay_dest(),
            PathBuf::from("/tmp/boot/overlays/pixelhat.dtbo")
        );
        assert_eq!(
            layout.unit_path(),
            PathBuf::from("/tmp/systemd/pixelhat.service")
        );
    }
}
