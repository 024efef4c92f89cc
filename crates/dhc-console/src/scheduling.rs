//! Period edits and worker commands.
//!
//! Typed-but-uncommitted period values live in an [`EditBuffer`] keyed by
//! worker id, so a poll replacing the worker collection never clobbers what
//! the operator is typing. Commands go to the backend fire-and-forget; the
//! authoritative outcome arrives through the next status poll.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::debug;

use dhc_core::{BridgeError, LogLevel, RemoteBridge};

use crate::logmux::LogMultiplexer;
use crate::sync::WorkerStatusSynchronizer;

/// Uncommitted per-worker period edits. Last write per id wins.
#[derive(Debug, Default)]
pub struct EditBuffer {
    pending: HashMap<String, String>,
}

impl EditBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, worker_id: &str, value: &str) {
        self.pending
            .insert(worker_id.to_string(), value.to_string());
    }

    pub fn get(&self, worker_id: &str) -> Option<&str> {
        self.pending.get(worker_id).map(String::as_str)
    }

    pub fn take(&mut self, worker_id: &str) -> Option<String> {
        self.pending.remove(worker_id)
    }

    pub fn discard(&mut self, worker_id: &str) {
        self.pending.remove(worker_id);
    }

    /// Drops edits whose worker no longer appears in the live collection.
    pub fn reconcile(&mut self, live_ids: &[String]) {
        self.pending.retain(|id, _| live_ids.contains(id));
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Issues worker commands and owns the pending period edits.
pub struct SchedulingController {
    bridge: Arc<dyn RemoteBridge>,
    synchronizer: Arc<WorkerStatusSynchronizer>,
    logs: Arc<LogMultiplexer>,
    edits: Mutex<EditBuffer>,
}

impl SchedulingController {
    pub fn new(
        bridge: Arc<dyn RemoteBridge>,
        synchronizer: Arc<WorkerStatusSynchronizer>,
        logs: Arc<LogMultiplexer>,
    ) -> Self {
        Self {
            bridge,
            synchronizer,
            logs,
            edits: Mutex::new(EditBuffer::new()),
        }
    }

    pub async fn start_worker(&self, display_name: &str) {
        let outcome = self.bridge.start_worker(display_name).await;
        self.finish_command("start_worker", outcome).await;
    }

    pub async fn start_full_cycle(&self) {
        let outcome = self.bridge.start_full_cycle().await;
        self.finish_command("start_full_cycle", outcome).await;
    }

    pub async fn stop_full_cycle(&self) {
        let outcome = self.bridge.stop_full_cycle().await;
        self.finish_command("stop_full_cycle", outcome).await;
    }

    /// Records what the operator typed without touching the backend.
    pub fn set_pending_period(&self, worker_id: &str, value: &str) {
        self.edits.lock().unwrap().set(worker_id, value);
    }

    pub fn pending_period(&self, worker_id: &str) -> Option<String> {
        self.edits
            .lock()
            .unwrap()
            .get(worker_id)
            .map(str::to_string)
    }

    pub fn discard_pending(&self, worker_id: &str) {
        self.edits.lock().unwrap().discard(worker_id);
    }

    pub fn pending_count(&self) -> usize {
        self.edits.lock().unwrap().len()
    }

    /// Pushes the pending period for one worker to the backend.
    ///
    /// A missing or empty pending value is a no-op: nothing is sent and the
    /// buffer entry (if any) stays put. On acceptance the entry is removed
    /// and a fresh poll is forced so the view reflects the backend's copy
    /// rather than an optimistic local one. On rejection the entry stays so
    /// the operator can retry or discard.
    pub async fn commit_period(&self, worker_id: &str, display_name: &str) {
        let pending = self.edits.lock().unwrap().get(worker_id).map(str::to_string);
        let value = match pending {
            Some(value) if !value.is_empty() => value,
            _ => return,
        };

        match self.bridge.update_worker_period(display_name, &value).await {
            Ok(()) | Err(BridgeError::Unavailable) => {
                self.edits.lock().unwrap().discard(worker_id);
                debug!(event = "period_committed", worker = worker_id, period = %value);
                self.synchronizer.poll().await;
            }
            Err(err) => {
                self.logs
                    .emit(
                        LogLevel::Error,
                        format!("period update for {display_name} failed: {err}"),
                    )
                    .await;
            }
        }
    }

    /// Drops edits left behind by workers that vanished from the last poll.
    pub fn reconcile_edits(&self) {
        let live = self.synchronizer.worker_ids();
        self.edits.lock().unwrap().reconcile(&live);
    }

    async fn finish_command(&self, call: &str, outcome: Result<(), BridgeError>) {
        match outcome {
            Ok(()) | Err(BridgeError::Unavailable) => {
                debug!(event = "command_sent", call = call);
            }
            Err(err) => {
                self.logs
                    .emit(LogLevel::Error, format!("{call} failed: {err}"))
                    .await;
            }
        }
        // Commands never mutate local state directly; the next snapshot is
        // the authority. Force one so the view catches up promptly.
        self.synchronizer.poll().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use dhc_core::{LogSource, PerfSample, Progress, Worker, WorkerStatus};
    use serde_json::Value;

    fn worker(id: &str, period: u64, code: i64) -> Worker {
        Worker {
            id: id.to_string(),
            display_name: id.to_string(),
            kind: "test".to_string(),
            status_code: code,
            status_text: WorkerStatus::from_code(code).as_str().to_string(),
            period_seconds: period,
            progress: Progress::default(),
            log_preview: String::new(),
            last_update_ts: None,
        }
    }

    /// Bridge that records every command and serves a mutable worker list,
    /// applying accepted period updates so a forced poll sees them.
    #[derive(Default)]
    struct RecordingBridge {
        workers: Mutex<Vec<Worker>>,
        calls: Mutex<Vec<String>>,
        reject_updates: Mutex<bool>,
    }

    impl RecordingBridge {
        fn with_workers(workers: Vec<Worker>) -> Self {
            Self {
                workers: Mutex::new(workers),
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RemoteBridge for RecordingBridge {
        async fn workers_status(&self) -> Result<Vec<Worker>, BridgeError> {
            Ok(self.workers.lock().unwrap().clone())
        }
        async fn start_worker(&self, name: &str) -> Result<(), BridgeError> {
            self.calls.lock().unwrap().push(format!("start_worker {name}"));
            Ok(())
        }
        async fn start_full_cycle(&self) -> Result<(), BridgeError> {
            self.calls.lock().unwrap().push("start_full_cycle".to_string());
            Ok(())
        }
        async fn stop_full_cycle(&self) -> Result<(), BridgeError> {
            self.calls.lock().unwrap().push("stop_full_cycle".to_string());
            Ok(())
        }
        async fn update_worker_period(&self, name: &str, period: &str) -> Result<(), BridgeError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("update_worker_period {name} {period}"));
            if *self.reject_updates.lock().unwrap() {
                return Err(BridgeError::call("update_worker_period", "rejected"));
            }
            if let Ok(seconds) = period.parse::<u64>() {
                let mut workers = self.workers.lock().unwrap();
                if let Some(found) = workers.iter_mut().find(|w| w.display_name == name) {
                    found.period_seconds = seconds;
                }
            }
            Ok(())
        }
        async fn dashboard_data(&self) -> Result<Value, BridgeError> {
            Ok(Value::Null)
        }
        async fn performance_data(&self) -> Result<PerfSample, BridgeError> {
            Ok(PerfSample::zero())
        }
        async fn send_log(&self, _level: LogLevel, _message: &str) -> Result<(), BridgeError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn pending_edit_survives_poll_and_last_write_wins() {
        let bridge = Arc::new(RecordingBridge::with_workers(vec![worker("w1", 3600, 0)]));
        let logs = Arc::new(LogMultiplexer::new());
        let sync = Arc::new(WorkerStatusSynchronizer::new(
            bridge.clone() as Arc<dyn RemoteBridge>,
            Arc::clone(&logs),
        ));
        let ctl = SchedulingController::new(bridge.clone(), Arc::clone(&sync), logs);

        ctl.set_pending_period("w1", "18");
        ctl.set_pending_period("w1", "1800");
        sync.poll().await;

        assert_eq!(ctl.pending_period("w1").as_deref(), Some("1800"));
    }

    #[tokio::test]
    async fn committed_period_clears_edit_and_next_poll_reflects_it() {
        let bridge = Arc::new(RecordingBridge::with_workers(vec![
            worker("w1", 3600, 0),
            worker("w2", 7200, 0),
        ]));
        let logs = Arc::new(LogMultiplexer::new());
        let sync = Arc::new(WorkerStatusSynchronizer::new(
            bridge.clone() as Arc<dyn RemoteBridge>,
            Arc::clone(&logs),
        ));
        let ctl = SchedulingController::new(bridge.clone(), Arc::clone(&sync), logs);
        sync.poll().await;

        ctl.set_pending_period("w1", "1800");
        ctl.set_pending_period("w2", "60");
        ctl.commit_period("w1", "w1").await;

        assert_eq!(bridge.calls(), ["update_worker_period w1 1800"]);
        assert_eq!(ctl.pending_period("w1"), None);
        // commit forces a poll, so the view already carries the new period
        let workers = sync.workers();
        assert_eq!(workers[0].period_seconds, 1800);
        // the other worker's edit is untouched
        assert_eq!(ctl.pending_period("w2").as_deref(), Some("60"));
    }

    #[tokio::test]
    async fn empty_or_missing_pending_commit_is_a_no_op() {
        let bridge = Arc::new(RecordingBridge::with_workers(vec![worker("w1", 3600, 0)]));
        let logs = Arc::new(LogMultiplexer::new());
        let sync = Arc::new(WorkerStatusSynchronizer::new(
            bridge.clone() as Arc<dyn RemoteBridge>,
            Arc::clone(&logs),
        ));
        let ctl = SchedulingController::new(bridge.clone(), Arc::clone(&sync), Arc::clone(&logs));

        ctl.commit_period("w1", "w1").await;
        ctl.set_pending_period("w1", "");
        ctl.commit_period("w1", "w1").await;

        assert!(bridge.calls().is_empty());
        assert_eq!(ctl.pending_period("w1").as_deref(), Some(""));
        assert!(logs.is_empty());
    }

    #[tokio::test]
    async fn rejected_commit_keeps_edit_and_logs_once() {
        let bridge = Arc::new(RecordingBridge::with_workers(vec![worker("w1", 3600, 0)]));
        *bridge.reject_updates.lock().unwrap() = true;
        let logs = Arc::new(LogMultiplexer::new());
        let sync = Arc::new(WorkerStatusSynchronizer::new(
            bridge.clone() as Arc<dyn RemoteBridge>,
            Arc::clone(&logs),
        ));
        let ctl = SchedulingController::new(bridge.clone(), Arc::clone(&sync), Arc::clone(&logs));

        ctl.set_pending_period("w1", "900");
        ctl.commit_period("w1", "w1").await;

        assert_eq!(ctl.pending_period("w1").as_deref(), Some("900"));
        let captured = logs.snapshot();
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].level, LogLevel::Error);
        assert_eq!(captured[0].source, LogSource::Local);
        assert!(captured[0].message.contains("period update for w1 failed"));
    }

    #[tokio::test]
    async fn reconcile_drops_edits_for_vanished_workers() {
        let bridge = Arc::new(RecordingBridge::with_workers(vec![
            worker("w1", 3600, 0),
            worker("w2", 7200, 0),
        ]));
        let logs = Arc::new(LogMultiplexer::new());
        let sync = Arc::new(WorkerStatusSynchronizer::new(
            bridge.clone() as Arc<dyn RemoteBridge>,
            Arc::clone(&logs),
        ));
        let ctl = SchedulingController::new(bridge.clone(), Arc::clone(&sync), logs);
        sync.poll().await;

        ctl.set_pending_period("w1", "10");
        ctl.set_pending_period("w2", "20");
        *bridge.workers.lock().unwrap() = vec![worker("w2", 7200, 0)];
        sync.poll().await;
        ctl.reconcile_edits();

        assert_eq!(ctl.pending_period("w1"), None);
        assert_eq!(ctl.pending_period("w2").as_deref(), Some("20"));
        assert_eq!(ctl.pending_count(), 1);
    }

    #[tokio::test]
    async fn commands_pass_through_and_force_a_poll() {
        let bridge = Arc::new(RecordingBridge::with_workers(vec![worker("w1", 3600, 1)]));
        let logs = Arc::new(LogMultiplexer::new());
        let sync = Arc::new(WorkerStatusSynchronizer::new(
            bridge.clone() as Arc<dyn RemoteBridge>,
            Arc::clone(&logs),
        ));
        let ctl = SchedulingController::new(bridge.clone(), Arc::clone(&sync), logs);

        ctl.start_worker("w1").await;
        ctl.start_full_cycle().await;
        ctl.stop_full_cycle().await;

        assert_eq!(
            bridge.calls(),
            ["start_worker w1", "start_full_cycle", "stop_full_cycle"]
        );
        // each command forced a poll; the collection is populated without an
        // explicit scheduled tick
        assert_eq!(sync.worker_ids(), ["w1"]);
    }
}
