//! End-to-end checks of the runtime's poll loops against a counting bridge.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use dhc_console::{ConsoleRuntime, RuntimeConfig};
use dhc_core::{BridgeError, LogLevel, PerfSample, RemoteBridge, Worker};

#[derive(Default)]
struct CountingBridge {
    status_polls: AtomicUsize,
    perf_polls: AtomicUsize,
}

impl CountingBridge {
    fn status_polls(&self) -> usize {
        self.status_polls.load(Ordering::SeqCst)
    }

    fn perf_polls(&self) -> usize {
        self.perf_polls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteBridge for CountingBridge {
    async fn workers_status(&self) -> Result<Vec<Worker>, BridgeError> {
        self.status_polls.fetch_add(1, Ordering::SeqCst);
        Ok(Vec::new())
    }
    async fn start_worker(&self, _name: &str) -> Result<(), BridgeError> {
        Ok(())
    }
    async fn start_full_cycle(&self) -> Result<(), BridgeError> {
        Ok(())
    }
    async fn stop_full_cycle(&self) -> Result<(), BridgeError> {
        Ok(())
    }
    async fn update_worker_period(&self, _n: &str, _p: &str) -> Result<(), BridgeError> {
        Ok(())
    }
    async fn dashboard_data(&self) -> Result<Value, BridgeError> {
        Ok(Value::Null)
    }
    async fn performance_data(&self) -> Result<PerfSample, BridgeError> {
        self.perf_polls.fetch_add(1, Ordering::SeqCst);
        Ok(PerfSample([12.0, 34.0, 1.0, 2.0, 3.0, 4.0]))
    }
    async fn send_log(&self, _level: LogLevel, _message: &str) -> Result<(), BridgeError> {
        Ok(())
    }
}

fn fast_config() -> RuntimeConfig {
    RuntimeConfig {
        worker_poll: Duration::from_millis(10),
        monitor_poll: Duration::from_millis(10),
    }
}

#[tokio::test]
async fn worker_polling_runs_on_schedule() {
    let bridge = Arc::new(CountingBridge::default());
    let runtime = ConsoleRuntime::new(bridge.clone(), fast_config());
    runtime.start();

    tokio::time::sleep(Duration::from_millis(120)).await;
    assert!(
        bridge.status_polls() >= 3,
        "expected several polls, saw {}",
        bridge.status_polls()
    );

    runtime.shutdown();
}

#[tokio::test]
async fn monitor_gates_performance_polling() {
    let bridge = Arc::new(CountingBridge::default());
    let runtime = ConsoleRuntime::new(bridge.clone(), fast_config());
    runtime.start();

    // closed monitor: no performance traffic at all
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(bridge.perf_polls(), 0);

    runtime.open_monitor();
    assert!(runtime.monitor_open());
    tokio::time::sleep(Duration::from_millis(120)).await;
    assert!(bridge.perf_polls() >= 3);

    runtime.close_monitor();
    assert!(!runtime.monitor_open());
    tokio::time::sleep(Duration::from_millis(30)).await;
    let after_close = bridge.perf_polls();
    tokio::time::sleep(Duration::from_millis(120)).await;
    assert_eq!(bridge.perf_polls(), after_close);

    // the board keeps the last sampled values for the next open
    let board = runtime.sampler().board();
    assert!((board.cpu.current() - 12.0).abs() < f64::EPSILON);

    runtime.shutdown();
}

#[tokio::test]
async fn shutdown_stops_all_polling() {
    let bridge = Arc::new(CountingBridge::default());
    let runtime = ConsoleRuntime::new(bridge.clone(), fast_config());
    runtime.start();
    runtime.open_monitor();

    tokio::time::sleep(Duration::from_millis(60)).await;
    runtime.shutdown();
    tokio::time::sleep(Duration::from_millis(30)).await;

    let status = bridge.status_polls();
    let perf = bridge.perf_polls();
    tokio::time::sleep(Duration::from_millis(120)).await;
    assert_eq!(bridge.status_polls(), status);
    assert_eq!(bridge.perf_polls(), perf);
}
