//! Wires the components together and drives the poll loops.
//!
//! Two independent tickers exist: the worker status poll runs for the whole
//! lifetime of the runtime, the performance poll only while a monitor view
//! is open. A poll is awaited inline inside its loop, so a slow backend call
//! never overlaps with the next tick for the same source; missed ticks are
//! skipped rather than bursted.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::info;

use dhc_core::RemoteBridge;

use crate::logmux::{BridgeLogSink, LogMultiplexer};
use crate::scheduling::SchedulingController;
use crate::sync::WorkerStatusSynchronizer;
use crate::telemetry::PerformanceSampler;

const DEFAULT_POLL_MS: u64 = 1000;

#[derive(Debug, Clone, Copy)]
pub struct RuntimeConfig {
    pub worker_poll: Duration,
    pub monitor_poll: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            worker_poll: Duration::from_millis(DEFAULT_POLL_MS),
            monitor_poll: Duration::from_millis(DEFAULT_POLL_MS),
        }
    }
}

impl RuntimeConfig {
    pub fn from_env() -> Self {
        Self {
            worker_poll: resolve_poll_ms("DHC_WORKER_POLL_MS"),
            monitor_poll: resolve_poll_ms("DHC_MONITOR_POLL_MS"),
        }
    }
}

fn resolve_poll_ms(var: &str) -> Duration {
    std::env::var(var)
        .ok()
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_millis(DEFAULT_POLL_MS))
}

/// Owns the background poll tasks and the shared component handles.
pub struct ConsoleRuntime {
    logs: Arc<LogMultiplexer>,
    synchronizer: Arc<WorkerStatusSynchronizer>,
    sampler: Arc<PerformanceSampler>,
    controller: Arc<SchedulingController>,
    config: RuntimeConfig,
    worker_task: Mutex<Option<JoinHandle<()>>>,
    monitor_task: Mutex<Option<JoinHandle<()>>>,
}

impl ConsoleRuntime {
    pub fn new(bridge: Arc<dyn RemoteBridge>, config: RuntimeConfig) -> Self {
        let logs = Arc::new(LogMultiplexer::new());
        logs.subscribe(Arc::new(BridgeLogSink::new(Arc::clone(&bridge))));
        let synchronizer = Arc::new(WorkerStatusSynchronizer::new(
            Arc::clone(&bridge),
            Arc::clone(&logs),
        ));
        let sampler = Arc::new(PerformanceSampler::new(
            Arc::clone(&bridge),
            Arc::clone(&logs),
        ));
        let controller = Arc::new(SchedulingController::new(
            bridge,
            Arc::clone(&synchronizer),
            Arc::clone(&logs),
        ));
        Self {
            logs,
            synchronizer,
            sampler,
            controller,
            config,
            worker_task: Mutex::new(None),
            monitor_task: Mutex::new(None),
        }
    }

    /// Starts the worker status loop. Idempotent; a second call while the
    /// loop is running does nothing.
    pub fn start(&self) {
        let mut slot = self.worker_task.lock().unwrap();
        if slot.is_some() {
            return;
        }
        info!(event = "runtime_start", poll_ms = self.config.worker_poll.as_millis() as u64);
        let synchronizer = Arc::clone(&self.synchronizer);
        let controller = Arc::clone(&self.controller);
        let period = self.config.worker_poll;
        *slot = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if synchronizer.poll().await {
                    controller.reconcile_edits();
                }
            }
        }));
    }

    /// Opens the monitor view: performance polling runs until it is closed.
    pub fn open_monitor(&self) {
        let mut slot = self.monitor_task.lock().unwrap();
        if slot.is_some() {
            return;
        }
        info!(event = "monitor_open");
        let sampler = Arc::clone(&self.sampler);
        let period = self.config.monitor_poll;
        *slot = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                sampler.tick().await;
            }
        }));
    }

    /// Closes the monitor view and stops performance polling. The metric
    /// board keeps its last values for the next open.
    pub fn close_monitor(&self) {
        if let Some(task) = self.monitor_task.lock().unwrap().take() {
            info!(event = "monitor_close");
            task.abort();
        }
    }

    pub fn monitor_open(&self) -> bool {
        self.monitor_task.lock().unwrap().is_some()
    }

    /// Stops both loops. Components stay usable for direct calls afterwards.
    pub fn shutdown(&self) {
        if let Some(task) = self.worker_task.lock().unwrap().take() {
            task.abort();
        }
        self.close_monitor();
        info!(event = "runtime_shutdown");
    }

    pub fn logs(&self) -> &Arc<LogMultiplexer> {
        &self.logs
    }

    pub fn synchronizer(&self) -> &Arc<WorkerStatusSynchronizer> {
        &self.synchronizer
    }

    pub fn sampler(&self) -> &Arc<PerformanceSampler> {
        &self.sampler
    }

    pub fn controller(&self) -> &Arc<SchedulingController> {
        &self.controller
    }
}

impl Drop for ConsoleRuntime {
    fn drop(&mut self) {
        if let Some(task) = self.worker_task.lock().unwrap().take() {
            task.abort();
        }
        if let Some(task) = self.monitor_task.lock().unwrap().take() {
            task.abort();
        }
    }
}
