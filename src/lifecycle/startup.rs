//! Startup orchestration.
//!
//! # Responsibilities
//! - Resolve and validate configuration
//! - Connect to the store under a deadline
//! - Reset and reseed the store
//! - Activate telemetry
//! - Launch the listener and hand over to the shutdown coordinator
//! - Release everything acquired, on every exit path
//!
//! # Design Decisions
//! - Fail fast: config, connect and telemetry errors abort startup
//! - Bootstrap errors are soft and never abort startup
//! - Steps run strictly in order, nothing concurrently
//! - Each resource registers its release right after it is acquired
//! - A listener fault becomes a shutdown reason instead of a process exit

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;

use crate::bootstrap::{run_bootstrap, BootstrapReport, Importer};
use crate::config::{ConfigError, ConfigSource};
use crate::http::HttpServerFactory;
use crate::lifecycle::resources::{ReleaseSummary, ResourceStack};
use crate::lifecycle::shutdown::{Shutdown, ShutdownCoordinator, ShutdownReason};
use crate::net::listener::{ListenerError, ListenerFactory, ServiceContext, ServiceListener};
use crate::observability::{PrometheusTelemetry, TelemetryBackend, TelemetryError};
use crate::registry::RegistryService;
use crate::store::{SqliteConnector, StoreConnector, StoreError};

/// Fatal startup failures.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to resolve configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to connect to database: {0}")]
    Connect(#[source] StoreError),

    #[error("database connection timed out after {0:?}")]
    ConnectTimeout(Duration),

    #[error("failed to initialize telemetry: {0}")]
    Telemetry(#[from] TelemetryError),

    #[error("failed to create listener: {0}")]
    Listener(#[from] ListenerError),
}

/// How the process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Graceful,
    StartupFailed,
    ListenerFault,
}

impl ExitStatus {
    pub fn code(self) -> u8 {
        match self {
            ExitStatus::Graceful => 0,
            ExitStatus::StartupFailed | ExitStatus::ListenerFault => 1,
        }
    }
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        ExitCode::from(status.code())
    }
}

/// External services the orchestrator drives.
#[derive(Clone)]
pub struct Collaborators {
    pub connector: Arc<dyn StoreConnector>,
    pub telemetry: Arc<dyn TelemetryBackend>,
    pub listeners: Arc<dyn ListenerFactory>,
}

impl Collaborators {
    /// SQLite store, Prometheus telemetry and the HTTP API listener.
    pub fn production() -> Self {
        Self {
            connector: Arc::new(SqliteConnector),
            telemetry: Arc::new(PrometheusTelemetry),
            listeners: Arc::new(HttpServerFactory),
        }
    }
}

/// Everything that happened during one run.
#[derive(Debug)]
pub struct RunReport {
    pub exit: ExitStatus,
    /// `None` if startup aborted before bootstrap.
    pub bootstrap: Option<BootstrapReport>,
    /// `None` if the listener was never launched.
    pub shutdown: Option<ShutdownReason>,
    pub stop_error: Option<String>,
    pub releases: ReleaseSummary,
    /// The fatal startup error, if any.
    pub error: Option<String>,
}

impl RunReport {
    fn new() -> Self {
        Self {
            exit: ExitStatus::Graceful,
            bootstrap: None,
            shutdown: None,
            stop_error: None,
            releases: ReleaseSummary::default(),
            error: None,
        }
    }
}

/// Sequences startup, serving and shutdown for one process lifetime.
pub struct Orchestrator {
    source: ConfigSource,
    collaborators: Collaborators,
    shutdown: Shutdown,
    os_signals: bool,
}

impl Orchestrator {
    pub fn new(source: ConfigSource, collaborators: Collaborators) -> Self {
        Self {
            source,
            collaborators,
            shutdown: Shutdown::new(),
            os_signals: true,
        }
    }

    pub fn with_shutdown(mut self, shutdown: Shutdown) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Whether SIGINT/SIGTERM trigger shutdown. On by default.
    pub fn with_os_signals(mut self, enabled: bool) -> Self {
        self.os_signals = enabled;
        self
    }

    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Run until shutdown. Always releases acquired resources before returning.
    pub async fn run(self) -> RunReport {
        let mut resources = ResourceStack::new();
        let mut report = RunReport::new();

        match self.run_inner(&mut resources, &mut report).await {
            Ok(exit) => report.exit = exit,
            Err(e) => {
                tracing::error!(error = %e, "Startup failed");
                report.exit = ExitStatus::StartupFailed;
                report.error = Some(e.to_string());
            }
        }

        report.releases = resources.release_all().await;
        tracing::info!(exit_code = report.exit.code(), "Server exiting");
        report
    }

    async fn run_inner(
        &self,
        resources: &mut ResourceStack,
        report: &mut RunReport,
    ) -> Result<ExitStatus, StartupError> {
        let config = Arc::new(self.source.resolve()?);
        let version = config.version.clone();
        tracing::info!(
            git_commit = %version.git_commit,
            build_time = %version.build_time,
            "Starting MCP Registry Application v{}",
            version.version
        );

        let connect_timeout = config.database.connect_timeout();
        let connecting = self.collaborators.connector.connect(&config.database);
        let store = match tokio::time::timeout(connect_timeout, connecting).await {
            Ok(Ok(store)) => store,
            Ok(Err(e)) => return Err(StartupError::Connect(e)),
            Err(_) => return Err(StartupError::ConnectTimeout(connect_timeout)),
        };
        tracing::info!("Connected to database");
        {
            let store = store.clone();
            resources.push("store", move || async move {
                store.close().await?;
                tracing::info!("Store connection closed");
                Ok::<(), StoreError>(())
            });
        }

        let service = Arc::new(RegistryService::new(store.clone()));
        let importer = Importer::new(service.clone());
        let bootstrap = run_bootstrap(store.as_ref(), &importer, &config.bootstrap).await;
        tracing::info!(
            reset = %bootstrap.reset,
            import = %bootstrap.import,
            "Bootstrap finished"
        );
        report.bootstrap = Some(bootstrap);

        let telemetry = self
            .collaborators
            .telemetry
            .start(&config.telemetry, &version)
            .await?;
        let (metrics, telemetry_shutdown) = telemetry.into_parts();
        resources.push("telemetry", telemetry_shutdown);

        let listener = self.collaborators.listeners.build(ServiceContext {
            config: config.clone(),
            service,
            metrics,
            version,
        })?;
        let serving = launch(listener.clone(), self.shutdown.clone());
        tracing::info!(
            address = %config.listener.bind_address,
            "MCP Registry server started"
        );

        let coordinator =
            ShutdownCoordinator::new(self.shutdown.clone(), config.shutdown.grace_period())
                .with_os_signals(self.os_signals);
        let outcome = coordinator.run(listener, serving).await;

        let exit = if outcome.reason.is_fault() {
            ExitStatus::ListenerFault
        } else {
            ExitStatus::Graceful
        };
        report.shutdown = Some(outcome.reason);
        report.stop_error = outcome.stop_error.map(|e| e.to_string());
        Ok(exit)
    }
}

/// Serve on a background task; any unexpected end of serving is a fault.
fn launch(listener: Arc<dyn ServiceListener>, shutdown: Shutdown) -> JoinHandle<()> {
    tokio::spawn(async move {
        match listener.start().await {
            Err(e) if e.is_closed() => tracing::debug!("Listener closed by shutdown"),
            Err(e) => {
                tracing::error!(error = %e, "Failed to start server");
                shutdown.trigger(ShutdownReason::ListenerFault(e.to_string()));
            }
            Ok(()) if !shutdown.is_triggered() => {
                tracing::error!("Listener stopped without a shutdown request");
                shutdown.trigger(ShutdownReason::ListenerFault(
                    "listener stopped unexpectedly".into(),
                ));
            }
            Ok(()) => {}
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes() {
        assert_eq!(ExitStatus::Graceful.code(), 0);
        assert_eq!(ExitStatus::StartupFailed.code(), 1);
        assert_eq!(ExitStatus::ListenerFault.code(), 1);
    }

    #[tokio::test]
    async fn invalid_config_fails_before_connecting() {
        let source =
            ConfigSource::from_vars(None, [("MCP_REGISTRY_SHUTDOWN_GRACE_SECS", "soon")]);
        let report = Orchestrator::new(source, Collaborators::production())
            .with_os_signals(false)
            .run()
            .await;

        assert_eq!(report.exit, ExitStatus::StartupFailed);
        assert!(report.bootstrap.is_none());
        assert!(report.releases.attempted().is_empty());
        assert!(report.error.unwrap().contains("configuration"));
    }
}
