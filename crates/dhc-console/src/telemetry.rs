//! Bounded sliding-window telemetry.
//!
//! Six channels (CPU%, RAM%, disk read/write, net down/up) each keep the
//! last ten samples; one poll tick pushes one value into every channel.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde::Serialize;

use dhc_core::{LogLevel, PerfSample, RemoteBridge};

use crate::logmux::LogMultiplexer;

/// Samples retained per channel.
pub const HISTORY_POINTS: usize = 10;

/// Fixed graph ceiling for the percent channels (CPU, RAM); rate channels
/// scale to their observed maximum instead.
pub const PERCENT_CEILING: f64 = 100.0;

/// Fixed-capacity FIFO history for one telemetry channel. The history is
/// always exactly [`HISTORY_POINTS`] long, zero-prefilled; a push drops the
/// front sample and appends at the back.
#[derive(Debug, Clone, Serialize)]
pub struct SlidingMetricChannel {
    current: f64,
    history: VecDeque<f64>,
}

impl SlidingMetricChannel {
    pub fn new() -> Self {
        Self {
            current: 0.0,
            history: std::iter::repeat(0.0).take(HISTORY_POINTS).collect(),
        }
    }

    pub fn push(&mut self, value: f64) {
        self.history.pop_front();
        self.history.push_back(value);
        self.current = value;
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    pub fn history(&self) -> impl Iterator<Item = f64> + '_ {
        self.history.iter().copied()
    }

    /// History scaled to 0..100 against `ceiling` (or the observed maximum
    /// when `ceiling` is `None`), ready for sparkline rendering.
    pub fn normalized(&self, ceiling: Option<f64>) -> Vec<f64> {
        let max = ceiling
            .unwrap_or_else(|| self.history().fold(10.0_f64, f64::max))
            .max(f64::EPSILON);
        self.history()
            .map(|value| (value / max * 100.0).clamp(0.0, 100.0))
            .collect()
    }
}

impl Default for SlidingMetricChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// The six telemetry channels of one console monitor.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricBoard {
    pub cpu: SlidingMetricChannel,
    pub ram: SlidingMetricChannel,
    pub disk_read: SlidingMetricChannel,
    pub disk_write: SlidingMetricChannel,
    pub net_down: SlidingMetricChannel,
    pub net_up: SlidingMetricChannel,
}

impl MetricBoard {
    pub fn apply(&mut self, sample: &PerfSample) {
        self.cpu.push(sample.cpu_percent());
        self.ram.push(sample.ram_percent());
        self.disk_read.push(sample.disk_read());
        self.disk_write.push(sample.disk_write());
        self.net_down.push(sample.net_down());
        self.net_up.push(sample.net_up());
    }
}

/// Base unit of a rate channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateUnit {
    KbPerSec,
    MbPerSec,
}

impl RateUnit {
    pub fn label(&self) -> &'static str {
        match self {
            RateUnit::KbPerSec => "KB/s",
            RateUnit::MbPerSec => "MB/s",
        }
    }

    fn next_label(&self) -> &'static str {
        match self {
            RateUnit::KbPerSec => "MB/s",
            RateUnit::MbPerSec => "GB/s",
        }
    }
}

/// Render a rate value: at 1024 or above, report in the next unit up with
/// one decimal; below, in the base unit with none.
pub fn format_rate(value: f64, unit: RateUnit) -> String {
    if value >= 1024.0 {
        format!("{:.1} {}", value / 1024.0, unit.next_label())
    } else {
        format!("{:.0} {}", value, unit.label())
    }
}

/// Render a percent channel value (CPU, RAM).
pub fn format_percent(value: f64) -> String {
    format!("{value:.1}%")
}

/// Polls the telemetry provider and drives the six channels. One instance
/// per monitor view; the runtime only runs its loop while that view is
/// open.
pub struct PerformanceSampler {
    bridge: Arc<dyn RemoteBridge>,
    logs: Arc<LogMultiplexer>,
    board: Mutex<MetricBoard>,
}

impl PerformanceSampler {
    pub fn new(bridge: Arc<dyn RemoteBridge>, logs: Arc<LogMultiplexer>) -> Self {
        Self {
            bridge,
            logs,
            board: Mutex::new(MetricBoard::default()),
        }
    }

    /// Fetch one sample and push it into every channel. A missing provider
    /// substitutes the zero tuple; a rejected poll logs once and leaves the
    /// channels untouched until the next tick.
    pub async fn tick(&self) {
        let sample = match self.bridge.performance_data().await {
            Ok(sample) => sample,
            Err(err) if err.is_unavailable() => PerfSample::zero(),
            Err(err) => {
                self.logs
                    .emit(LogLevel::Error, format!("telemetry poll failed: {err}"))
                    .await;
                return;
            }
        };
        self.board.lock().unwrap().apply(&sample);
    }

    pub fn board(&self) -> MetricBoard {
        self.board.lock().unwrap().clone()
    }
}
