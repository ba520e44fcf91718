//! Filesystem path constants.

// ─── Plugin tree ──────────────────────────────────────────────────────────

/// Default plugin root directory on the target board.
pub const DEFAULT_PLUGIN_ROOT: &str = "/opt/pixelhat";

/// Compositor runtime directory, relative to the plugin root.
pub const COMPOSITOR_SUBDIR: &str = "compositor";

/// Native pixel-format addon source directory, relative to the plugin root.
pub const NATIVE_MODULE_SUBDIR: &str = "native/pixelfb";

/// Bundled assets directory (prebuilt archives + overlay blob),
/// relative to the plugin root.
pub const ASSETS_SUBDIR: &str = "assets";

/// Persisted plugin configuration document, relative to the plugin root.
pub const CONFIG_FILENAME: &str = "config.json";

/// Compiled native addon artifact, relative to `NATIVE_MODULE_SUBDIR`.
/// node-gyp always emits its output here.
pub const COMPILED_MODULE_RELPATH: &str = "build/Release/pixelfb.node";

// ─── Boot configuration ───────────────────────────────────────────────────

/// Boot configuration file the activation directive is appended to.
pub const BOOT_CONFIG_PATH: &str = "/boot/config.txt";

/// Directory that holds device-tree overlay blobs.
pub const OVERLAY_DIR: &str = "/boot/overlays";

/// Filename of the bundled overlay blob (inside `ASSETS_SUBDIR` and,
/// once installed, inside `OVERLAY_DIR`).
pub const OVERLAY_FILENAME: &str = "pixelhat.dtbo";

// ─── Supervisor / locking ─────────────────────────────────────────────────

/// Directory systemd unit definitions are written to.
pub const SYSTEMD_UNIT_DIR: &str = "/etc/systemd/system";

/// Marker file providing mutual exclusion between concurrent setup runs.
pub const INSTALL_LOCK_PATH: &str = "/tmp/pixelhat-setup.lock";
