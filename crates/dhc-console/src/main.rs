use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use dhc_console::{
    format_percent, format_rate, ConsoleRuntime, RateUnit, RuntimeConfig,
};
use dhc_core::placeholder::PlaceholderBridge;
use dhc_core::{LogLevel, RemoteBridge};

#[derive(Parser)]
#[command(name = "dhc-console")]
#[command(about = "Dashboard hub console over a demo backend", long_about = None)]
struct Cli {
    /// How long to run before shutting down, in seconds
    #[arg(long, default_value_t = 5)]
    duration: u64,

    /// Open the performance monitor view for the whole run
    #[arg(long)]
    monitor: bool,

    /// Poll interval for both loops, in milliseconds
    #[arg(long)]
    poll_ms: Option<u64>,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let mut config = RuntimeConfig::from_env();
    if let Some(ms) = cli.poll_ms.filter(|ms| *ms > 0) {
        config.worker_poll = Duration::from_millis(ms);
        config.monitor_poll = Duration::from_millis(ms);
    }

    let bridge: Arc<dyn RemoteBridge> = Arc::new(PlaceholderBridge::new());
    let runtime = ConsoleRuntime::new(bridge, config);
    runtime.start();
    if cli.monitor {
        runtime.open_monitor();
    }

    runtime
        .logs()
        .emit(LogLevel::Info, "console started against demo backend")
        .await;

    let mut remaining = cli.duration;
    while remaining > 0 {
        tokio::time::sleep(Duration::from_secs(1)).await;
        remaining -= 1;

        for worker in runtime.synchronizer().workers() {
            println!(
                "{:<16} {:>8} every {:>6}s  {}",
                worker.display_name,
                worker.status().as_str(),
                worker.period_seconds,
                format_percent(worker.progress.percent),
            );
        }
        if cli.monitor {
            let board = runtime.sampler().board();
            println!(
                "cpu {}  ram {}  disk r/w {} / {}  net d/u {} / {}",
                format_percent(board.cpu.current()),
                format_percent(board.ram.current()),
                format_rate(board.disk_read.current(), RateUnit::MbPerSec),
                format_rate(board.disk_write.current(), RateUnit::MbPerSec),
                format_rate(board.net_down.current(), RateUnit::KbPerSec),
                format_rate(board.net_up.current(), RateUnit::KbPerSec),
            );
        }
    }

    for entry in runtime.logs().snapshot() {
        println!(
            "[{}] {} {}",
            entry.timestamp.format("%H:%M:%S"),
            entry.level,
            entry.message
        );
    }

    runtime.shutdown();
    Ok(())
}
