//! Resource release bookkeeping.
//!
//! # Responsibilities
//! - Record a release action at the moment a resource is acquired
//! - Run release actions in reverse acquisition order on every exit path
//!
//! # Design Decisions
//! - Each action is an `FnOnce`, so it cannot run twice
//! - A failed release is logged and the remaining releases still run

use std::fmt::Display;
use std::future::Future;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;

type ReleaseFn = Box<dyn FnOnce() -> BoxFuture<'static, Result<(), String>> + Send>;

/// What happened during [`ResourceStack::release_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseSummary {
    /// Resources released successfully, in release order.
    pub released: Vec<String>,
    /// Resources whose release failed, with the error text.
    pub failed: Vec<(String, String)>,
}

impl ReleaseSummary {
    /// Every resource whose release ran, successes first.
    pub fn attempted(&self) -> Vec<&str> {
        let mut all: Vec<&str> = self.released.iter().map(String::as_str).collect();
        all.extend(self.failed.iter().map(|(name, _)| name.as_str()));
        all
    }
}

/// LIFO stack of pending release actions.
#[derive(Default)]
pub struct ResourceStack {
    entries: Vec<(String, ReleaseFn)>,
}

impl ResourceStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the release action for a just-acquired resource.
    pub fn push<F, Fut, E>(&mut self, name: impl Into<String>, release: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Display + 'static,
    {
        let name = name.into();
        tracing::debug!(resource = %name, "Resource registered for release");
        let release: ReleaseFn =
            Box::new(move || async move { release().await.map_err(|e| e.to_string()) }.boxed());
        self.entries.push((name, release));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Run every pending release, newest first.
    pub async fn release_all(&mut self) -> ReleaseSummary {
        let mut summary = ReleaseSummary::default();
        while let Some((name, release)) = self.entries.pop() {
            match release().await {
                Ok(()) => {
                    tracing::info!(resource = %name, "Resource released");
                    summary.released.push(name);
                }
                Err(e) => {
                    tracing::error!(resource = %name, error = %e, "Failed to release resource");
                    summary.failed.push((name, e));
                }
            }
        }
        summary
    }
}

impl Drop for ResourceStack {
    fn drop(&mut self) {
        if !self.entries.is_empty() {
            let pending: Vec<&str> = self.entries.iter().map(|(n, _)| n.as_str()).collect();
            tracing::warn!(?pending, "Resource stack dropped with unreleased resources");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    type Release = BoxFuture<'static, Result<(), String>>;

    fn recorder(
        log: &Arc<Mutex<Vec<String>>>,
        name: &'static str,
        fail: bool,
    ) -> impl FnOnce() -> Release + Send + 'static {
        let log = log.clone();
        move || {
            async move {
                log.lock().unwrap().push(name.to_string());
                if fail {
                    Err(format!("{name} refused to close"))
                } else {
                    Ok(())
                }
            }
            .boxed()
        }
    }

    #[tokio::test]
    async fn releases_in_reverse_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut stack = ResourceStack::new();
        stack.push("store", recorder(&log, "store", false));
        stack.push("telemetry", recorder(&log, "telemetry", false));

        let summary = stack.release_all().await;
        assert_eq!(*log.lock().unwrap(), vec!["telemetry", "store"]);
        assert_eq!(summary.released, vec!["telemetry", "store"]);
        assert!(stack.is_empty());
    }

    #[tokio::test]
    async fn failure_does_not_stop_remaining_releases() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut stack = ResourceStack::new();
        stack.push("store", recorder(&log, "store", false));
        stack.push("telemetry", recorder(&log, "telemetry", true));

        let summary = stack.release_all().await;
        assert_eq!(*log.lock().unwrap(), vec!["telemetry", "store"]);
        assert_eq!(summary.released, vec!["store"]);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.attempted(), vec!["store", "telemetry"]);
    }

    #[tokio::test]
    async fn second_release_is_a_noop() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut stack = ResourceStack::new();
        stack.push("store", recorder(&log, "store", false));

        stack.release_all().await;
        let again = stack.release_all().await;
        assert!(again.attempted().is_empty());
        assert_eq!(log.lock().unwrap().len(), 1);
    }
}
