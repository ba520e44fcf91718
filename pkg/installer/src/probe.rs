//! Precondition probing: host architecture and Node.js runtime version.
//!
//! Both probes run before any side-effecting step. The architecture check
//! gates the whole run; the runtime major version feeds the artifact key.

use crate::error::InstallError;
use crate::exec::{self, HostTools};
use crate::state::Architecture;
use tracing::info;

/// Read the host architecture via `dpkg --print-architecture`.
pub async fn detect_architecture(tools: &HostTools) -> Result<Architecture, InstallError> {
    let mut cmd = tools.command("dpkg");
    cmd.arg("--print-architecture");
    let raw = exec::run_capture(cmd, "dpkg --print-architecture")
        .await
        .map_err(|e| InstallError::UnsupportedArchitecture(format!("unknown ({e})")))?;

    let arch = parse_architecture(&raw)?;
    info!("host architecture: {}", arch);
    Ok(arch)
}

/// Parse a Debian architecture string. Accepted set: armhf, arm64.
pub fn parse_architecture(raw: &str) -> Result<Architecture, InstallError> {
    match raw.trim() {
        "armhf" => Ok(Architecture::Armhf),
        "arm64" => Ok(Architecture::Arm64),
        other => Err(InstallError::UnsupportedArchitecture(other.to_string())),
    }
}

/// Major version of the Node.js runtime that will execute the compositor,
/// via `node --version`.
pub async fn runtime_major(tools: &HostTools) -> Result<u32, InstallError> {
    let mut cmd = tools.command("node");
    cmd.arg("--version");
    let raw = exec::run_capture(cmd, "node --version")
        .await
        .map_err(InstallError::RuntimeProbeFailed)?;

    let major = parse_node_major(&raw)?;
    info!("node runtime major version: {}", major);
    Ok(major)
}

/// Parse the major component out of a `vMAJOR.MINOR.PATCH` version string.
pub fn parse_node_major(raw: &str) -> Result<u32, InstallError> {
    let version = raw.trim().trim_start_matches('v');
    version
        .split('.')
        .next()
        .and_then(|major| major.parse().ok())
        .ok_or_else(|| {
            InstallError::RuntimeProbeFailed(format!("unparsable version string '{}'", raw.trim()))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepted_architectures() {
        assert_eq!(parse_architecture("armhf").unwrap(), Architecture::Armhf);
        assert_eq!(parse_architecture("arm64").unwrap(), Architecture::Arm64);
        // dpkg output carries a trailing newline
        assert_eq!(parse_architecture("arm64\n").unwrap(), Architecture::Arm64);
    }

    #[test]
    fn test_rejected_architectures() {
        for bad in ["amd64", "i386", "riscv64", "armel", ""] {
            match parse_architecture(bad) {
                Err(InstallError::UnsupportedArchitecture(found)) => {
                    assert_eq!(found, bad.trim())
                }
                other => panic!("expected UnsupportedArchitecture for {bad:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_node_major_parsing() {
        assert_eq!(parse_node_major("v18.17.1").unwrap(), 18);
        assert_eq!(parse_node_major("v20.0.0\n").unwrap(), 20);
        assert_eq!(parse_node_major("16.20.2").unwrap(), 16);
    }

    #[tokio::test]
    async fn test_detect_architecture_reads_dpkg_output() {
        let dir = tempfile::tempdir().unwrap();
        let tools = exec::stub_tools(dir.path(), &[("dpkg", "echo arm64")]);
        let arch = detect_architecture(&tools).await.unwrap();
        assert_eq!(arch, Architecture::Arm64);
    }

    #[test]
    fn test_node_major_unparsable() {
        assert!(matches!(
            parse_node_major("not-a-version"),
            Err(InstallError::RuntimeProbeFailed(_))
        ));
        assert!(matches!(
            parse_node_major(""),
            Err(InstallError::RuntimeProbeFailed(_))
        ));
    }
}
