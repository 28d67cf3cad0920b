use std::path::Path;

use microhub_core::config::HubConfig;
use microhub_core::remote::HttpRemoteClient;
use microhub_core::store::LibSqlStore;
use microhub_core::sync::PullOutcome;
use microhub_core::SyncCoordinator;

use crate::error::CliError;

pub type Hub = SyncCoordinator<LibSqlStore, HttpRemoteClient>;

/// One CLI invocation: the coordinator plus how it should talk to the remote.
pub struct Session {
    pub config: HubConfig,
    pub hub: Hub,
    offline: bool,
}

impl Session {
    pub async fn open(data_dir: Option<&Path>, offline: bool) -> Result<Self, CliError> {
        let mut config = HubConfig::from_env()?;
        if let Some(dir) = data_dir {
            config = config.with_data_dir(dir);
        }
        Self::open_with_config(config, offline).await
    }

    pub async fn open_with_config(config: HubConfig, offline: bool) -> Result<Self, CliError> {
        let store = LibSqlStore::open(config.database_path()).await?;
        let remote = HttpRemoteClient::new(config.http_timeout)?;
        let hub = SyncCoordinator::open(store, remote, config.sync_debounce).await?;
        tracing::debug!(path = %config.database_path().display(), offline, "Opened local store");
        Ok(Self {
            config,
            hub,
            offline,
        })
    }

    pub const fn require_online(&self) -> Result<(), CliError> {
        if self.offline {
            Err(CliError::OfflineMode)
        } else {
            Ok(())
        }
    }

    /// Startup pull, skipped when offline. Failures are reported, not fatal.
    pub async fn reconcile(&self) {
        if self.offline {
            return;
        }
        report_pull(&self.hub.startup().await);
    }

    /// Push what is pending and flush local state.
    pub async fn close(self) -> Result<(), CliError> {
        if self.offline {
            let skipped = self.hub.shutdown_offline().await?;
            if !skipped.is_empty() && self.hub.connection().await.is_some() {
                eprintln!("Offline: local changes were not pushed.");
            }
            return Ok(());
        }

        self.hub.shutdown().await?;
        let report = self.hub.report();
        if report.needs_reconnect {
            eprintln!("Warning: the remote rejected the stored key; run `microhub connect` again.");
        } else if let Some(error) = report.last_error {
            eprintln!("Warning: sync failed: {error}");
        }
        Ok(())
    }
}

/// Print a warning for pull outcomes the user should know about.
pub fn report_pull(outcome: &PullOutcome) {
    match outcome {
        PullOutcome::Failed(message) => eprintln!("Warning: could not pull remote data: {message}"),
        PullOutcome::Disconnected => eprintln!(
            "Warning: the remote rejected the stored key; run `microhub connect` again."
        ),
        _ => {}
    }
}
