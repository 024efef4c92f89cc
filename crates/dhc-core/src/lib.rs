use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod bridge;
pub mod error;
pub mod placeholder;

pub use bridge::RemoteBridge;
pub use error::BridgeError;

/// Severity of a console log entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl Default for LogLevel {
    fn default() -> Self {
        Self::Info
    }
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let normalized = input.trim().to_lowercase();
        match normalized.as_str() {
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("Unknown log level: {other}")),
        }
    }
}

/// Where a console log entry originated: the console process itself, or a
/// line pushed in by the remote environment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogSource {
    Local,
    Remote,
}

impl LogSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogSource::Local => "local",
            LogSource::Remote => "remote",
        }
    }
}

impl fmt::Display for LogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Presentation mapping of the backend's numeric `status_code`.
///
/// Codes outside `{0, 1, 200, 500}` render as `Idle` rather than an
/// unhandled state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WorkerStatus {
    Idle,
    Running,
    Done,
    Error,
}

impl Default for WorkerStatus {
    fn default() -> Self {
        Self::Idle
    }
}

impl WorkerStatus {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => WorkerStatus::Running,
            200 => WorkerStatus::Done,
            500 => WorkerStatus::Error,
            _ => WorkerStatus::Idle,
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            WorkerStatus::Idle => 0,
            WorkerStatus::Running => 1,
            WorkerStatus::Done => 200,
            WorkerStatus::Error => 500,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerStatus::Idle => "Idle",
            WorkerStatus::Running => "Running",
            WorkerStatus::Done => "Done",
            WorkerStatus::Error => "Error",
        }
    }
}

impl fmt::Display for WorkerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Run progress reported by a background worker.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Progress {
    #[serde(default)]
    pub current: u64,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub percent: f64,
    #[serde(default)]
    pub eta_seconds: u64,
    #[serde(default)]
    pub speed: f64,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub run_id: String,
    #[serde(default)]
    pub is_active: bool,
}

/// One background worker as reported by the automation backend. The wire
/// shape matches the backend's dashboard view verbatim; every poll returns
/// the full list and the local collection is replaced wholesale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Worker {
    pub id: String,
    pub display_name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub status_code: i64,
    #[serde(default)]
    pub status_text: String,
    #[serde(rename = "period", default)]
    pub period_seconds: u64,
    #[serde(default)]
    pub progress: Progress,
    #[serde(default)]
    pub log_preview: String,
    #[serde(default)]
    pub last_update_ts: Option<f64>,
}

impl Worker {
    pub fn status(&self) -> WorkerStatus {
        WorkerStatus::from_code(self.status_code)
    }

    pub fn is_running(&self) -> bool {
        self.status() == WorkerStatus::Running
    }
}

/// One telemetry reading: `[cpu%, ram%, disk read MB/s, disk write MB/s,
/// net down KB/s, net up KB/s]`, exactly the 6-tuple the backend returns.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct PerfSample(pub [f64; 6]);

impl PerfSample {
    /// Deterministic reading used when no metrics provider is reachable.
    pub fn zero() -> Self {
        Self([0.0; 6])
    }

    pub fn cpu_percent(&self) -> f64 {
        self.0[0]
    }

    pub fn ram_percent(&self) -> f64 {
        self.0[1]
    }

    pub fn disk_read(&self) -> f64 {
        self.0[2]
    }

    pub fn disk_write(&self) -> f64 {
        self.0[3]
    }

    pub fn net_down(&self) -> f64 {
        self.0[4]
    }

    pub fn net_up(&self) -> f64 {
        self.0[5]
    }
}

impl<'de> Deserialize<'de> for PerfSample {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let values: Vec<f64> = Vec::deserialize(deserializer)?;
        if values.len() < 6 {
            return Err(serde::de::Error::custom(format!(
                "expected at least 6 telemetry values, got {}",
                values.len()
            )));
        }
        let mut sample = [0.0; 6];
        sample.copy_from_slice(&values[..6]);
        Ok(Self(sample))
    }
}
