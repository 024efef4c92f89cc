use async_trait::async_trait;
use serde_json::Value;

use crate::{error::BridgeError, LogLevel, PerfSample, Worker};

/// Capability surface of the remote automation backend.
///
/// Every method maps to one backend call. All calls are asynchronous and
/// non-blocking; none of them holds any engine-side state. Implementations
/// for a missing transport should return [`BridgeError::Unavailable`] so
/// callers can fall back to placeholder data.
///
/// `start_full_cycle` / `stop_full_cycle` are the full-cycle orchestration
/// contract: the remote side treats `stop` with no running cycle as a no-op
/// and `start` during a running cycle as safe. The console performs no
/// dedup or locking of its own around them.
#[async_trait]
pub trait RemoteBridge: Send + Sync {
    /// Full worker collection; the caller replaces its local state with the
    /// returned snapshot wholesale.
    async fn workers_status(&self) -> Result<Vec<Worker>, BridgeError>;

    /// Trigger one worker by display name.
    async fn start_worker(&self, display_name: &str) -> Result<(), BridgeError>;

    async fn start_full_cycle(&self) -> Result<(), BridgeError>;

    async fn stop_full_cycle(&self) -> Result<(), BridgeError>;

    /// Reconfigure a worker's schedule period. The value travels as the
    /// user's raw edit string; the backend validates it.
    async fn update_worker_period(
        &self,
        display_name: &str,
        period: &str,
    ) -> Result<(), BridgeError>;

    /// Opaque dashboard summary consumed by the overview page.
    async fn dashboard_data(&self) -> Result<Value, BridgeError>;

    /// One telemetry 6-tuple.
    async fn performance_data(&self) -> Result<PerfSample, BridgeError>;

    /// Best-effort log forwarding; callers swallow failures.
    async fn send_log(&self, level: LogLevel, message: &str) -> Result<(), BridgeError>;
}
