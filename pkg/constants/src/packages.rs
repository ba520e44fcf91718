//! System package and runtime constants.

/// System packages required before the compositor can be built on-device:
/// a compiler toolchain plus the graphics/image libraries the canvas
/// bindings link against. Installed in one batched apt transaction.
pub const REQUIRED_PACKAGES: &[&str] = &[
    "build-essential",
    "libcairo2-dev",
    "libpango1.0-dev",
    "libjpeg-dev",
    "libgif-dev",
    "librsvg2-dev",
];

/// npm package name of the native pixel-format addon.
pub const NATIVE_MODULE: &str = "pixelfb";

/// Absolute path of the Node.js binary used in the service unit.
pub const NODE_BIN: &str = "/usr/bin/node";
