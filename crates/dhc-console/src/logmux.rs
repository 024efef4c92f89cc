//! Log interception and multiplexing.
//!
//! All console log lines land in one bounded, arrival-ordered store,
//! whether they were produced locally or pushed in by the remote
//! environment. Locally produced lines are additionally forwarded to a
//! subscribed remote sink under a reentrancy guard, so a sink that logs
//! during its own forward cannot trigger unbounded forwarding recursion.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use dhc_core::{BridgeError, LogLevel, LogSource, RemoteBridge};

/// Ring capacity; the store never holds more entries than this.
pub const LOG_CAPACITY: usize = 200;

/// Stand-in message for a value that cannot be rendered.
const UNSERIALIZABLE: &str = "[unserializable]";

/// One captured log line. Immutable once created; owned by the store.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LogEntry {
    pub id: Uuid,
    pub level: LogLevel,
    pub message: String,
    pub source: LogSource,
    pub timestamp: DateTime<Utc>,
}

/// Bounded FIFO of log entries, ordered by arrival regardless of source.
#[derive(Debug, Default)]
pub struct RingLogStore {
    entries: VecDeque<LogEntry>,
}

impl RingLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: LogEntry) {
        if self.entries.len() == LOG_CAPACITY {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.entries.iter().cloned().collect()
    }
}

/// Remote destination for locally produced log lines. Delivery is
/// best-effort; the multiplexer swallows every failure.
#[async_trait]
pub trait RemoteLogSink: Send + Sync {
    async fn forward(&self, level: LogLevel, message: &str) -> Result<(), BridgeError>;
}

/// Adapter routing forwarded lines onto the backend bridge's `send_log`.
pub struct BridgeLogSink {
    bridge: Arc<dyn RemoteBridge>,
}

impl BridgeLogSink {
    pub fn new(bridge: Arc<dyn RemoteBridge>) -> Self {
        Self { bridge }
    }
}

#[async_trait]
impl RemoteLogSink for BridgeLogSink {
    async fn forward(&self, level: LogLevel, message: &str) -> Result<(), BridgeError> {
        self.bridge.send_log(level, message).await
    }
}

/// Merges locally generated log calls with externally pushed log events
/// into one [`RingLogStore`], forwarding only the local ones.
///
/// Sinks are subscribed explicitly rather than installed by rewriting any
/// ambient logging machinery; `unsubscribe` detaches forwarding without
/// touching captured entries.
pub struct LogMultiplexer {
    store: Mutex<RingLogStore>,
    sink: Mutex<Option<Arc<dyn RemoteLogSink>>>,
    forwarding: AtomicBool,
}

impl LogMultiplexer {
    pub fn new() -> Self {
        Self {
            store: Mutex::new(RingLogStore::new()),
            sink: Mutex::new(None),
            forwarding: AtomicBool::new(false),
        }
    }

    pub fn subscribe(&self, sink: Arc<dyn RemoteLogSink>) {
        *self.sink.lock().unwrap() = Some(sink);
    }

    pub fn unsubscribe(&self) {
        *self.sink.lock().unwrap() = None;
    }

    /// Capture a locally generated log call. Each argument is stringified
    /// (strings verbatim, everything else rendered as JSON) and the joined
    /// message is stored locally, then forwarded.
    pub async fn intercept(&self, level: LogLevel, args: &[Value]) {
        self.capture_local(level, render_args(args)).await;
    }

    /// Capture a pre-rendered local message. Same path as [`intercept`]
    /// without the argument rendering.
    ///
    /// [`intercept`]: Self::intercept
    pub async fn emit(&self, level: LogLevel, message: impl Into<String> + Send) {
        self.capture_local(level, message.into()).await;
    }

    /// Inbound push surface: accept an externally generated log event.
    /// Never forwarded, only stored.
    pub fn ingest(&self, level: LogLevel, message: impl Into<String>, source: LogSource) {
        self.record(level, message.into(), source);
    }

    /// Empty the local store. The remote sink is unaffected.
    pub fn clear(&self) {
        self.store.lock().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.store.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.lock().unwrap().is_empty()
    }

    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.store.lock().unwrap().snapshot()
    }

    async fn capture_local(&self, level: LogLevel, message: String) {
        self.record(level, message.clone(), LogSource::Local);

        let sink = self.sink.lock().unwrap().clone();
        let Some(sink) = sink else {
            return;
        };
        // Reentrancy guard: a forward already in flight means this line is
        // a side effect of forwarding. It stays captured above but must not
        // be forwarded again.
        if self.forwarding.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Err(err) = sink.forward(level, &message).await {
            debug!(event = "log_forward_failed", error = %err);
        }
        self.forwarding.store(false, Ordering::SeqCst);
    }

    fn record(&self, level: LogLevel, message: String, source: LogSource) {
        self.store.lock().unwrap().push(LogEntry {
            id: Uuid::new_v4(),
            level,
            message,
            source,
            timestamp: Utc::now(),
        });
    }
}

impl Default for LogMultiplexer {
    fn default() -> Self {
        Self::new()
    }
}

fn render_args(args: &[Value]) -> String {
    args.iter()
        .map(|value| match value {
            Value::String(text) => text.clone(),
            other => render_value(other),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// JSON-render one log argument; anything that refuses to serialize is
/// replaced with a fixed placeholder rather than aborting the capture.
fn render_value<S: Serialize>(value: &S) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| UNSERIALIZABLE.to_string())
}
