pub mod config;
pub mod deploy;
mod exec;
pub mod error;
pub mod layout;
pub mod lock;
pub mod probe;
pub mod provision;
pub mod resolve;
pub mod service;
pub mod state;

pub use config::RuntimeConfig;
pub use deploy::DeploymentInstaller;
pub use error::InstallError;
pub use exec::HostTools;
pub use layout::PluginLayout;
pub use lock::InstallLock;
pub use resolve::{ArtifactResolver, ArtifactSource};
pub use state::{Architecture, InstallRun, RunOutcome};
