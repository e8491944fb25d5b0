//! Fake collaborators shared by the lifecycle integration tests.
//!
//! Every fake appends to one shared event log so tests can assert on the
//! order in which the orchestrator drove them.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::FutureExt;
use tokio::sync::watch;
use uuid::Uuid;

use mcp_registry::config::{ConfigSource, DatabaseConfig, TelemetryConfig, VersionInfo};
use mcp_registry::lifecycle::Collaborators;
use mcp_registry::net::listener::{
    ListenerError, ListenerFactory, ListenerState, ServiceContext, ServiceListener,
};
use mcp_registry::observability::{
    MetricsHandle, Telemetry, TelemetryBackend, TelemetryError,
};
use mcp_registry::registry::ServerRecord;
use mcp_registry::store::{Store, StoreConnector, StoreError};

#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, event: &str) -> usize {
        self.0.lock().unwrap().iter().filter(|e| *e == event).count()
    }

    pub fn position(&self, event: &str) -> Option<usize> {
        self.0.lock().unwrap().iter().position(|e| e == event)
    }
}

pub struct FakeStore {
    log: EventLog,
    pub fail_reset: AtomicBool,
    pub closes: AtomicUsize,
    pub reset_delay: Mutex<Option<Duration>>,
    pub insert_delay: Mutex<Option<Duration>>,
    records: Mutex<Vec<ServerRecord>>,
}

#[async_trait]
impl Store for FakeStore {
    async fn delete_all_servers(&self) -> Result<u64, StoreError> {
        self.log.push("store.reset");
        let delay = *self.reset_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_reset.load(Ordering::SeqCst) {
            return Err(StoreError::Transaction("injected reset failure".into()));
        }
        let mut records = self.records.lock().unwrap();
        let removed = records.len() as u64;
        records.clear();
        Ok(removed)
    }

    async fn insert_server(&self, record: &ServerRecord) -> Result<(), StoreError> {
        self.log.push(format!("store.insert:{}", record.name));
        let delay = *self.insert_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn get_server(&self, id: Uuid) -> Result<Option<ServerRecord>, StoreError> {
        let records = self.records.lock().unwrap();
        Ok(records.iter().find(|r| r.id == Some(id)).cloned())
    }

    async fn list_servers(
        &self,
        _after: Option<Uuid>,
        limit: u32,
    ) -> Result<Vec<ServerRecord>, StoreError> {
        let records = self.records.lock().unwrap();
        Ok(records.iter().take(limit as usize).cloned().collect())
    }

    async fn count_servers(&self) -> Result<u64, StoreError> {
        Ok(self.records.lock().unwrap().len() as u64)
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.log.push("store.close");
        Ok(())
    }
}

pub struct FakeConnector {
    log: EventLog,
    store: Arc<FakeStore>,
    pub delay: Mutex<Option<Duration>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl StoreConnector for FakeConnector {
    async fn connect(&self, _config: &DatabaseConfig) -> Result<Arc<dyn Store>, StoreError> {
        self.log.push("store.connect");
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreError::Connect("connection refused".into()));
        }
        Ok(self.store.clone())
    }
}

pub struct FakeTelemetry {
    log: EventLog,
    pub fail: AtomicBool,
    pub shutdowns: Arc<AtomicUsize>,
}

#[async_trait]
impl TelemetryBackend for FakeTelemetry {
    async fn start(
        &self,
        _config: &TelemetryConfig,
        _version: &VersionInfo,
    ) -> Result<Telemetry, TelemetryError> {
        self.log.push("telemetry.start");
        if self.fail.load(Ordering::SeqCst) {
            return Err(TelemetryError::Init("exporter unreachable".into()));
        }
        let log = self.log.clone();
        let shutdowns = self.shutdowns.clone();
        Ok(Telemetry::new(
            MetricsHandle::disabled(),
            Box::new(move || {
                async move {
                    shutdowns.fetch_add(1, Ordering::SeqCst);
                    log.push("telemetry.shutdown");
                    Ok::<(), TelemetryError>(())
                }
                .boxed()
            }),
        ))
    }
}

/// How the fake listener behaves once started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerBehavior {
    /// Serve until stopped, then return cleanly.
    Serve,
    /// Fail on its own after the given delay.
    FaultAfter(Duration),
    /// Never finish stopping.
    HangOnStop,
}

pub struct FakeListener {
    log: EventLog,
    behavior: ListenerBehavior,
    started: Arc<watch::Sender<bool>>,
    stop: watch::Sender<bool>,
    pub stops: Mutex<Vec<Duration>>,
}

#[async_trait]
impl ServiceListener for FakeListener {
    async fn start(&self) -> Result<(), ListenerError> {
        self.log.push("listener.start");
        self.started.send_replace(true);
        match self.behavior {
            ListenerBehavior::FaultAfter(delay) => {
                tokio::time::sleep(delay).await;
                Err(ListenerError::Serve("accept loop crashed".into()))
            }
            _ => {
                let mut stop = self.stop.subscribe();
                let _ = stop.wait_for(|s| *s).await;
                Ok(())
            }
        }
    }

    async fn stop(&self, deadline: Duration) -> Result<(), ListenerError> {
        self.log.push("listener.stop");
        self.stops.lock().unwrap().push(deadline);
        if self.behavior == ListenerBehavior::HangOnStop {
            std::future::pending::<()>().await;
        }
        self.stop.send_replace(true);
        Ok(())
    }

    fn state(&self) -> ListenerState {
        if *self.stop.borrow() {
            ListenerState::Stopped
        } else if *self.started.borrow() {
            ListenerState::Running
        } else {
            ListenerState::Stopped
        }
    }
}

pub struct FakeListenerFactory {
    log: EventLog,
    pub behavior: Mutex<ListenerBehavior>,
    started: Arc<watch::Sender<bool>>,
    built: Mutex<Option<Arc<FakeListener>>>,
}

impl FakeListenerFactory {
    /// The listener built during the run, if startup got that far.
    pub fn built(&self) -> Option<Arc<FakeListener>> {
        self.built.lock().unwrap().clone()
    }

    pub async fn wait_started(&self) {
        let mut started = self.started.subscribe();
        let _ = started.wait_for(|s| *s).await;
    }
}

impl ListenerFactory for FakeListenerFactory {
    fn build(&self, _ctx: ServiceContext) -> Result<Arc<dyn ServiceListener>, ListenerError> {
        self.log.push("listener.build");
        let (stop, _) = watch::channel(false);
        let listener = Arc::new(FakeListener {
            log: self.log.clone(),
            behavior: *self.behavior.lock().unwrap(),
            started: self.started.clone(),
            stop,
            stops: Mutex::new(Vec::new()),
        });
        *self.built.lock().unwrap() = Some(listener.clone());
        Ok(listener)
    }
}

/// One set of fakes wired to a shared event log.
pub struct Harness {
    pub log: EventLog,
    pub store: Arc<FakeStore>,
    pub connector: Arc<FakeConnector>,
    pub telemetry: Arc<FakeTelemetry>,
    pub listeners: Arc<FakeListenerFactory>,
}

impl Harness {
    pub fn new() -> Self {
        let log = EventLog::default();
        let store = Arc::new(FakeStore {
            log: log.clone(),
            fail_reset: AtomicBool::new(false),
            closes: AtomicUsize::new(0),
            reset_delay: Mutex::new(None),
            insert_delay: Mutex::new(None),
            records: Mutex::new(Vec::new()),
        });
        let connector = Arc::new(FakeConnector {
            log: log.clone(),
            store: store.clone(),
            delay: Mutex::new(None),
            fail: AtomicBool::new(false),
        });
        let telemetry = Arc::new(FakeTelemetry {
            log: log.clone(),
            fail: AtomicBool::new(false),
            shutdowns: Arc::new(AtomicUsize::new(0)),
        });
        let (started, _) = watch::channel(false);
        let listeners = Arc::new(FakeListenerFactory {
            log: log.clone(),
            behavior: Mutex::new(ListenerBehavior::Serve),
            started: Arc::new(started),
            built: Mutex::new(None),
        });
        Self {
            log,
            store,
            connector,
            telemetry,
            listeners,
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            connector: self.connector.clone(),
            telemetry: self.telemetry.clone(),
            listeners: self.listeners.clone(),
        }
    }

    pub fn store_closes(&self) -> usize {
        self.store.closes.load(Ordering::SeqCst)
    }

    pub fn telemetry_shutdowns(&self) -> usize {
        self.telemetry.shutdowns.load(Ordering::SeqCst)
    }
}

pub fn test_version() -> VersionInfo {
    VersionInfo {
        version: "1.2.3".into(),
        git_commit: "deadbeef".into(),
        build_time: "2024-01-01T00:00:00Z".into(),
    }
}

/// Config source built only from the given variables.
pub fn source(vars: &[(&str, &str)]) -> ConfigSource {
    ConfigSource::from_vars(
        None,
        vars.iter().map(|(k, v)| (k.to_string(), v.to_string())),
    )
    .with_build_info(test_version())
}

/// Write a seed document to a fresh temp file.
pub fn seed_file(names: &[&str]) -> PathBuf {
    let servers: Vec<serde_json::Value> = names
        .iter()
        .map(|name| serde_json::json!({ "name": name, "version": "1.0.0" }))
        .collect();
    let path = std::env::temp_dir().join(format!("mcp-registry-seed-{}.json", Uuid::new_v4()));
    std::fs::write(&path, serde_json::to_vec(&servers).unwrap()).unwrap();
    path
}
