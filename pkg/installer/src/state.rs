//! In-process state for a single install run.
//!
//! One `InstallRun` exists per invocation. Each step mutates it as it
//! completes, and the finished record is what the install report on disk
//! serializes.

use crate::resolve::ArtifactSource;

/// Host architectures the hat driver supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    /// 32-bit ARM hard-float (armhf).
    Armhf,
    /// 64-bit ARM (arm64 / aarch64).
    Arm64,
}

impl Architecture {
    /// Debian architecture string, as reported by `dpkg --print-architecture`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Architecture::Armhf => "armhf",
            Architecture::Arm64 => "arm64",
        }
    }
}

impl std::fmt::Display for Architecture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Terminal outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunOutcome {
    Success,
    Failed,
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunOutcome::Success => write!(f, "success"),
            RunOutcome::Failed => write!(f, "failed"),
        }
    }
}

/// The single logical transaction for one invocation.
#[derive(Debug, Clone, serde::Serialize)]
pub struct InstallRun {
    /// Validated host architecture, once probed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub architecture: Option<Architecture>,
    /// Whether this run owns the install lock.
    pub lock_acquired: bool,
    /// How the compositor artifact was obtained, once resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_source: Option<ArtifactSource>,
    /// Terminal outcome, set exactly once at the end of the run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<RunOutcome>,
}

impl InstallRun {
    /// Fresh run record; everything unresolved.
    pub fn new() -> Self {
        Self {
            architecture: None,
            lock_acquired: false,
            artifact_source: None,
            outcome: None,
        }
    }

    /// One-line summary for the end-of-run log.
    pub fn summary(&self) -> String {
        format!(
            "arch={} lock={} source={} outcome={}",
            self.architecture
                .map(|a| a.as_str())
                .unwrap_or("unresolved"),
            self.lock_acquired,
            self.artifact_source
                .map(|s| s.as_str())
                .unwrap_or("unresolved"),
            self.outcome
                .map(|o| o.to_string())
                .unwrap_or_else(|| "unset".to_string()),
        )
    }
}

impl Default for InstallRun {
    fn default() -> Self {
        Self::new()
    }
}
