//! Shared helpers for running host commands.
//!
//! All package-manager, npm, and systemctl calls go through `run_checked`:
//! spawn, wait to completion, and fold a non-zero exit into a single
//! diagnostic string (trimmed stderr included) the caller maps onto its
//! error kind. `HostTools` is the seam every child command is built
//! through: by default tools resolve via the ambient `PATH`, while a fixed
//! search path lets tests substitute stub tools for apt, npm, and systemctl.

use std::ffi::OsString;
use tokio::process::Command;

/// Resolves the host tool binaries child processes run.
#[derive(Debug, Clone, Default)]
pub struct HostTools {
    search_path: Option<OsString>,
}

impl HostTools {
    /// Tools resolved through `path` only, ignoring the ambient `PATH`.
    pub fn with_search_path(path: impl Into<OsString>) -> Self {
        Self {
            search_path: Some(path.into()),
        }
    }

    /// Start building a command for `program`.
    pub(crate) fn command(&self, program: &str) -> Command {
        let mut cmd = Command::new(program);
        if let Some(path) = &self.search_path {
            cmd.env("PATH", path);
        }
        cmd
    }
}

/// Run a command to completion. On spawn failure or non-zero exit, returns
/// a one-line diagnostic naming `what`.
pub(crate) async fn run_checked(mut cmd: Command, what: &str) -> Result<(), String> {
    let output = cmd
        .output()
        .await
        .map_err(|e| format!("{what}: failed to spawn: {e}"))?;

    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        Err(format!("{what} exited with {}", output.status))
    } else {
        Err(format!("{what} exited with {}: {stderr}", output.status))
    }
}

/// Run a command and return trimmed stdout, or a one-line diagnostic.
pub(crate) async fn run_capture(mut cmd: Command, what: &str) -> Result<String, String> {
    let output = cmd
        .output()
        .await
        .map_err(|e| format!("{what}: failed to spawn: {e}"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        return Err(if stderr.is_empty() {
            format!("{what} exited with {}", output.status)
        } else {
            format!("{what} exited with {}: {stderr}", output.status)
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Write executable stub scripts into `dir/bin` and return a `HostTools`
/// that resolves tools there. Scripts should use shell builtins only, since
/// the stub directory replaces the child's whole search path.
#[cfg(test)]
pub(crate) fn stub_tools(dir: &std::path::Path, scripts: &[(&str, &str)]) -> HostTools {
    use std::os::unix::fs::PermissionsExt;

    let bin = dir.join("bin");
    std::fs::create_dir_all(&bin).unwrap();
    for (name, body) in scripts {
        let path = bin.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
    }
    HostTools::with_search_path(&bin)
}
