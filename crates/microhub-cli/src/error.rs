use std::io;

use microhub_core::bootstrap::BootstrapError;
use microhub_core::config::ConfigError;
use microhub_core::remote::RemoteError;
use microhub_core::services::ServiceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] microhub_core::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("ID cannot be empty")]
    EmptyId,
    #[error("No {0} found for id/prefix: {1}")]
    NotFound(&'static str, String),
    #[error("{0}")]
    AmbiguousId(String),
    #[error("{0} cannot be empty")]
    EmptyText(&'static str),
    #[error("{0}")]
    MissingArgument(String),
    #[error("Refusing to wipe the remote store without --yes")]
    WipeNotConfirmed,
    #[error("Not connected. Run `microhub connect --url <URL> --store <ID>` first.")]
    NotConnected,
    #[error("This command needs the remote; drop --offline")]
    OfflineMode,
}
