//! Client-side engine for the Data Hub console.
//!
//! Keeps a live, bounded view of three asynchronous backend feeds (log
//! events, telemetry samples, background-worker state) synchronized over
//! periodic polling, and reconciles user-issued scheduling commands against
//! the next poll. The rendering layer sits above this crate and only ever
//! reads snapshots.

pub mod logmux;
pub mod runtime;
pub mod scheduling;
pub mod sync;
pub mod telemetry;

pub use logmux::{BridgeLogSink, LogEntry, LogMultiplexer, RemoteLogSink, RingLogStore};
pub use runtime::{ConsoleRuntime, RuntimeConfig};
pub use scheduling::{EditBuffer, SchedulingController};
pub use sync::WorkerStatusSynchronizer;
pub use telemetry::{
    format_percent, format_rate, MetricBoard, PerformanceSampler, RateUnit, SlidingMetricChannel,
};
