use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::{
    bridge::RemoteBridge, error::BridgeError, LogLevel, PerfSample, Progress, Worker, WorkerStatus,
};

/// Deterministic demo worker set used whenever no backend is reachable.
pub fn demo_workers() -> Vec<Worker> {
    vec![
        Worker {
            id: "demo-geojson".to_string(),
            display_name: "Demo GeoJson".to_string(),
            kind: "geojson".to_string(),
            status_code: WorkerStatus::Running.code(),
            status_text: WorkerStatus::Running.as_str().to_string(),
            period_seconds: 3600,
            progress: Progress {
                current: 50,
                total: 100,
                percent: 50.0,
                eta_seconds: 10,
                speed: 5.0,
                error: None,
                run_id: "demo".to_string(),
                is_active: true,
            },
            log_preview: "Processing...".to_string(),
            last_update_ts: None,
        },
        Worker {
            id: "demo-ekidata".to_string(),
            display_name: "Demo Ekidata".to_string(),
            kind: "ekidata".to_string(),
            status_code: WorkerStatus::Idle.code(),
            status_text: WorkerStatus::Idle.as_str().to_string(),
            period_seconds: 7200,
            progress: Progress::default(),
            log_preview: "Ready".to_string(),
            last_update_ts: None,
        },
    ]
}

/// Opaque dashboard summary matching the overview page's expected shape.
pub fn demo_dashboard() -> Value {
    json!({
        "geojson": { "indicator": "green", "time_since": 42 },
        "ekidata": { "indicator": "gray", "time_since": -1 },
    })
}

/// In-memory stand-in for the remote backend, used in standalone/demo mode.
///
/// Commands mutate the demo worker set just enough to keep the console
/// visually alive: starting a worker marks it running, a valid period edit
/// is applied. Telemetry is the fixed zero tuple and log forwarding is a
/// no-op. Everything is deterministic.
pub struct PlaceholderBridge {
    workers: Mutex<Vec<Worker>>,
    cycle_active: Mutex<bool>,
}

impl PlaceholderBridge {
    pub fn new() -> Self {
        Self {
            workers: Mutex::new(demo_workers()),
            cycle_active: Mutex::new(false),
        }
    }

    pub fn cycle_active(&self) -> bool {
        *self.cycle_active.lock().unwrap()
    }

    fn mark_all(&self, status: WorkerStatus) {
        let mut workers = self.workers.lock().unwrap();
        for worker in workers.iter_mut() {
            worker.status_code = status.code();
            worker.status_text = status.as_str().to_string();
        }
    }
}

impl Default for PlaceholderBridge {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteBridge for PlaceholderBridge {
    async fn workers_status(&self) -> Result<Vec<Worker>, BridgeError> {
        Ok(self.workers.lock().unwrap().clone())
    }

    async fn start_worker(&self, display_name: &str) -> Result<(), BridgeError> {
        let mut workers = self.workers.lock().unwrap();
        let Some(worker) = workers
            .iter_mut()
            .find(|worker| worker.display_name == display_name)
        else {
            return Err(BridgeError::call(
                "start_worker",
                format!("unknown worker: {display_name}"),
            ));
        };
        worker.status_code = WorkerStatus::Running.code();
        worker.status_text = WorkerStatus::Running.as_str().to_string();
        Ok(())
    }

    async fn start_full_cycle(&self) -> Result<(), BridgeError> {
        *self.cycle_active.lock().unwrap() = true;
        self.mark_all(WorkerStatus::Running);
        Ok(())
    }

    async fn stop_full_cycle(&self) -> Result<(), BridgeError> {
        // Stopping an idle cycle is a deliberate no-op, matching the remote
        // contract.
        *self.cycle_active.lock().unwrap() = false;
        Ok(())
    }

    async fn update_worker_period(
        &self,
        display_name: &str,
        period: &str,
    ) -> Result<(), BridgeError> {
        let parsed: u64 = period
            .trim()
            .parse()
            .map_err(|_| BridgeError::call("update_worker_period", "period must be an integer"))?;
        if parsed == 0 {
            return Err(BridgeError::call(
                "update_worker_period",
                "period must be positive",
            ));
        }
        let mut workers = self.workers.lock().unwrap();
        let Some(worker) = workers
            .iter_mut()
            .find(|worker| worker.display_name == display_name)
        else {
            return Err(BridgeError::call(
                "update_worker_period",
                format!("unknown worker: {display_name}"),
            ));
        };
        worker.period_seconds = parsed;
        Ok(())
    }

    async fn dashboard_data(&self) -> Result<Value, BridgeError> {
        Ok(demo_dashboard())
    }

    async fn performance_data(&self) -> Result<PerfSample, BridgeError> {
        Ok(PerfSample::zero())
    }

    async fn send_log(&self, _level: LogLevel, _message: &str) -> Result<(), BridgeError> {
        Ok(())
    }
}
