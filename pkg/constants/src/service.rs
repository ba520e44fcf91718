//! Service unit and run-protocol constants.

/// Name of the compositor service unit.
pub const UNIT_NAME: &str = "pixelhat.service";

/// Drop-in directory for the compositor unit, inside the systemd unit dir.
pub const DROPIN_DIR_NAME: &str = "pixelhat.service.d";

/// Environment-override fragment filename inside `DROPIN_DIR_NAME`.
pub const OVERRIDE_FILENAME: &str = "override.conf";

/// Activation directive appended (once) to the boot configuration file.
pub const BOOT_OVERLAY_DIRECTIVE: &str = "dtoverlay=pixelhat";

/// Environment variable the compositor reads its idle timeout from.
pub const IDLE_TIMEOUT_ENV: &str = "PIXELHAT_IDLE_TIMEOUT";

/// Idle timeout (seconds) used when the plugin config has no usable value.
pub const DEFAULT_IDLE_TIMEOUT: u64 = 900;

/// Sentinel printed to stdout as the final line of every run, success or
/// failure. The invoking host process watches for this exact line to detect
/// run termination, so it must appear exactly once.
pub const RUN_SENTINEL: &str = "==== pixelhat-setup: run complete ====";
