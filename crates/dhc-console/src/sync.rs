//! Worker-status synchronization.
//!
//! The worker collection is authoritative on the backend; every poll
//! replaces the local copy wholesale. There is no incremental merge: a
//! worker absent from the new snapshot ceases to exist locally.

use std::sync::{Arc, Mutex};

use tracing::debug;

use dhc_core::{placeholder, LogLevel, RemoteBridge, Worker};

use crate::logmux::LogMultiplexer;

/// Polls the full worker list and holds the last good snapshot.
pub struct WorkerStatusSynchronizer {
    bridge: Arc<dyn RemoteBridge>,
    logs: Arc<LogMultiplexer>,
    workers: Mutex<Vec<Worker>>,
}

impl WorkerStatusSynchronizer {
    pub fn new(bridge: Arc<dyn RemoteBridge>, logs: Arc<LogMultiplexer>) -> Self {
        Self {
            bridge,
            logs,
            workers: Mutex::new(Vec::new()),
        }
    }

    /// One poll. On success the local collection is replaced with the new
    /// snapshot; on rejection the previous snapshot is kept and one
    /// error-level line goes through the multiplexer. A missing transport
    /// substitutes the demo worker set silently. Returns whether the local
    /// collection now reflects a fresh snapshot.
    pub async fn poll(&self) -> bool {
        match self.bridge.workers_status().await {
            Ok(snapshot) => {
                debug!(event = "worker_poll", workers = snapshot.len());
                *self.workers.lock().unwrap() = snapshot;
                true
            }
            Err(err) if err.is_unavailable() => {
                *self.workers.lock().unwrap() = placeholder::demo_workers();
                true
            }
            Err(err) => {
                self.logs
                    .emit(LogLevel::Error, format!("worker poll failed: {err}"))
                    .await;
                false
            }
        }
    }

    /// Last good snapshot, cloned for the view layer.
    pub fn workers(&self) -> Vec<Worker> {
        self.workers.lock().unwrap().clone()
    }

    pub fn worker_ids(&self) -> Vec<String> {
        self.workers
            .lock()
            .unwrap()
            .iter()
            .map(|worker| worker.id.clone())
            .collect()
    }
}
