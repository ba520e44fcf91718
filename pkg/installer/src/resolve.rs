//! Artifact resolution: prebuilt archive vs. on-device source build.
//!
//! Compiling the native pixel-format addon on the board takes many minutes,
//! so a matching prebuilt archive (keyed by architecture + node major) is
//! preferred. Prebuilt coverage is never complete across arch/runtime
//! combinations, so a missing or broken archive falls back to the source
//! build — the one allowed transition. Within the source path, npm's
//! install hook is what triggers the addon build, and its success is not
//! separately observable: the presence of the compiled `.node` file is the
//! ground truth, with exactly one explicit node-gyp rebuild before giving up.

use crate::error::InstallError;
use crate::exec::{self, HostTools};
use crate::layout::PluginLayout;
use crate::provision;
use crate::state::Architecture;
use anyhow::{Context, Result};
use pkg_constants::packages::NATIVE_MODULE;
use std::path::Path;
use tracing::{info, warn};

/// How the compositor artifact was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactSource {
    /// A matching prebuilt archive was extracted.
    Prebuilt,
    /// The compositor was built on-device from source.
    SourceBuild,
}

impl ArtifactSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactSource::Prebuilt => "prebuilt",
            ArtifactSource::SourceBuild => "source-build",
        }
    }
}

impl std::fmt::Display for ArtifactSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Key selecting a prebuilt archive, e.g. `arm64-node18`.
pub fn artifact_key(arch: Architecture, node_major: u32) -> String {
    format!("{}-node{}", arch.as_str(), node_major)
}

/// Decides between the prebuilt and source-build paths and executes the
/// chosen one.
pub struct ArtifactResolver {
    layout: PluginLayout,
    tools: HostTools,
}

impl ArtifactResolver {
    pub fn new(layout: PluginLayout) -> Self {
        Self {
            layout,
            tools: HostTools::default(),
        }
    }

    /// Resolve host tools through `tools` instead of the ambient `PATH`.
    pub fn with_tools(mut self, tools: HostTools) -> Self {
        self.tools = tools;
        self
    }

    /// Resolve and realize the compositor artifact.
    pub async fn resolve(
        &self,
        arch: Architecture,
        node_major: u32,
    ) -> Result<ArtifactSource, InstallError> {
        let key = artifact_key(arch, node_major);
        let archive = self.layout.prebuilt_archive(&key);

        if archive.exists() {
            info!("prebuilt archive found for {}", key);
            match self.extract_prebuilt(&archive).await {
                Ok(()) => {
                    info!("prebuilt compositor extracted, skipping source build");
                    return Ok(ArtifactSource::Prebuilt);
                }
                Err(e) => {
                    warn!("prebuilt extraction failed ({e:#}), falling back to source build");
                }
            }
        } else {
            info!("no prebuilt archive for {}, building from source", key);
        }

        self.source_build().await?;
        Ok(ArtifactSource::SourceBuild)
    }

    /// Extract a prebuilt gzip tarball into the compositor directory.
    async fn extract_prebuilt(&self, archive: &Path) -> Result<()> {
        let dest = self.layout.compositor_dir();
        tokio::fs::create_dir_all(&dest).await?;

        let archive = archive.to_path_buf();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let file = std::fs::File::open(&archive)
                .with_context(|| format!("opening {}", archive.display()))?;
            let decoder = flate2::read::GzDecoder::new(file);
            let mut tarball = tar::Archive::new(decoder);
            tarball
                .unpack(&dest)
                .with_context(|| format!("unpacking {}", archive.display()))?;
            Ok(())
        })
        .await
        .context("extraction task panicked")??;

        Ok(())
    }

    /// Build the compositor from source on-device.
    ///
    /// Re-provisions the build tooling (idempotent), installs the
    /// compositor's npm dependencies (the native addon compiles as a side
    /// effect of npm's install hook), then verifies the compiled artifact
    /// and performs one explicit rebuild if it is missing.
    async fn source_build(&self) -> Result<(), InstallError> {
        provision::install_packages(&self.tools).await?;

        let compositor = self.layout.compositor_dir();
        info!("installing compositor dependencies in {}", compositor.display());
        let mut cmd = self.tools.command("npm");
        cmd.args(["install", "--omit=dev"]).current_dir(&compositor);
        if let Err(e) = exec::run_checked(cmd, "npm install").await {
            // The install hook's exit status is not trustworthy evidence
            // either way; the compiled artifact below is the ground truth.
            warn!("{e}; checking for the compiled module anyway");
        }

        let compiled = self.layout.compiled_module_path();
        if compiled.exists() {
            info!("native module present at {}", compiled.display());
            return Ok(());
        }

        warn!(
            "native module missing at {}, rebuilding explicitly",
            compiled.display()
        );
        self.rebuild_native_module().await?;

        if compiled.exists() {
            info!("native module rebuilt at {}", compiled.display());
            Ok(())
        } else {
            Err(InstallError::NativeModuleBuildFailed(format!(
                "compiled module still missing at {} after explicit rebuild",
                compiled.display()
            )))
        }
    }

    /// Explicit, targeted recompilation of only the native addon from its
    /// own source directory. There is no further fallback after this.
    async fn rebuild_native_module(&self) -> Result<(), InstallError> {
        let source_dir = self.layout.native_module_dir();
        info!(
            "running node-gyp rebuild for {} in {}",
            NATIVE_MODULE,
            source_dir.display()
        );
        let mut cmd = self.tools.command("npx");
        cmd.args(["node-gyp", "rebuild"]).current_dir(&source_dir);
        exec::run_checked(cmd, "node-gyp rebuild")
            .await
            .map_err(InstallError::NativeModuleBuildFailed)
    }
}
