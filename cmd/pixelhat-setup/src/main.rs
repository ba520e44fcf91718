//! # pixelhat-setup — install orchestrator for the pixelhat LCD plugin
//!
//! Runs one fixed, linear install plan on the target board:
//!
//! 1. Probe the host architecture and acquire the install lock
//! 2. Provision system build/runtime packages via apt
//! 3. Resolve the compositor artifact: prebuilt archive, or source build
//! 4. Deploy the boot overlay, boot config directive, and service unit
//! 5. Register and (optionally) start the service under systemd
//!
//! Any fatal error rolls back by releasing the lock only — applied side
//! effects stay, because the plan is idempotent and safe to re-run from
//! scratch. The run sentinel is printed to stdout exactly once, as the
//! final line, on both success and failure; the invoking host process
//! watches for it.

use clap::Parser;
use pkg_constants::paths;
use pkg_constants::service::RUN_SENTINEL;
use pkg_installer::service as lifecycle;
use pkg_installer::{
    Architecture, ArtifactResolver, DeploymentInstaller, HostTools, InstallError, InstallLock,
    InstallRun, PluginLayout, RunOutcome, RuntimeConfig, probe, provision,
};
use std::path::PathBuf;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "pixelhat-setup",
    about = "Installer for the pixelhat LCD compositor plugin"
)]
struct Cli {
    /// Plugin root directory
    #[arg(long, default_value = paths::DEFAULT_PLUGIN_ROOT)]
    root: PathBuf,

    /// Boot configuration file the overlay directive is appended to
    #[arg(long, default_value = paths::BOOT_CONFIG_PATH)]
    boot_config: PathBuf,

    /// Boot overlay directory
    #[arg(long, default_value = paths::OVERLAY_DIR)]
    overlay_dir: PathBuf,

    /// systemd unit directory
    #[arg(long, default_value = paths::SYSTEMD_UNIT_DIR)]
    systemd_dir: PathBuf,

    /// Install lock file
    #[arg(long, default_value = paths::INSTALL_LOCK_PATH)]
    lock_file: PathBuf,

    /// Treat an immediate service start failure as fatal. Use on hosts
    /// where the framebuffer device already exists and no reboot is needed.
    #[arg(long)]
    strict_start: bool,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let mut run = InstallRun::new();
    let code = match execute(&cli, &mut run).await {
        Ok(()) => {
            run.outcome = Some(RunOutcome::Success);
            info!("install complete ({})", run.summary());
            0
        }
        Err(e) => {
            run.outcome = Some(RunOutcome::Failed);
            error!("install failed during {}: {}", e.step(), e);
            info!("run aborted ({})", run.summary());
            1
        }
    };

    // Terminal protocol: exactly one sentinel, as the final line.
    println!("{RUN_SENTINEL}");
    std::process::exit(code);
}

/// Precondition checks, then the guarded install plan under the lock.
async fn execute(cli: &Cli, run: &mut InstallRun) -> Result<(), InstallError> {
    let layout = PluginLayout::new(&cli.root)
        .with_boot_config(&cli.boot_config)
        .with_overlay_dir(&cli.overlay_dir)
        .with_systemd_dir(&cli.systemd_dir);

    info!("pixelhat-setup starting (root: {})", cli.root.display());

    let tools = HostTools::default();

    // Nothing side-effecting may happen before these two checks. A failed
    // lock acquisition means a concurrent run owns the marker on disk —
    // it is left untouched.
    let arch = probe::detect_architecture(&tools).await?;
    run.architecture = Some(arch);

    let lock = InstallLock::acquire(&cli.lock_file)?;
    run.lock_acquired = true;

    if let Err(e) = install(cli, &layout, &tools, arch, run).await {
        // Rollback releases the lock and nothing else: installed packages,
        // the copied overlay, and written unit files stay, since the plan
        // is safe to re-run from scratch.
        if e.needs_rollback() {
            lock.release();
        }
        return Err(e);
    }

    lock.release();
    Ok(())
}

/// The install plan proper. Every step short-circuits on fatal errors.
async fn install(
    cli: &Cli,
    layout: &PluginLayout,
    tools: &HostTools,
    arch: Architecture,
    run: &mut InstallRun,
) -> Result<(), InstallError> {
    let node_major = probe::runtime_major(tools).await?;

    provision::refresh_index(tools).await?;
    provision::install_packages(tools).await?;

    let source = ArtifactResolver::new(layout.clone())
        .with_tools(tools.clone())
        .resolve(arch, node_major)
        .await?;
    run.artifact_source = Some(source);

    let config = RuntimeConfig::load(&layout.config_path());
    info!(
        "config snapshot: idle_timeout={}s enabled={}",
        config.idle_timeout, config.enabled
    );

    DeploymentInstaller::new(layout.clone())
        .install(&config)
        .await?;

    lifecycle::activate(tools, &config, cli.strict_start).await?;

    if let Err(e) = save_install_info(layout, run).await {
        warn!("failed to write install info: {e:#}");
    }

    Ok(())
}

/// Record what this run installed, for operator forensics and the plugin UI.
async fn save_install_info(layout: &PluginLayout, run: &InstallRun) -> anyhow::Result<()> {
    let mut info = serde_json::to_value(run)?;
    info["installed_at"] = serde_json::json!(chrono::Utc::now().to_rfc3339());

    let path = layout.root().join("install-info.json");
    tokio::fs::write(&path, serde_json::to_string_pretty(&info)?).await?;
    Ok(())
}
