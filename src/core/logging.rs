use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::core::config::AppPaths;

/// Flushes the file writer on exit; set by the first `init` call only.
static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Installs the global subscriber: stdout plus a daily-rolling file in `log_dir`.
///
/// `file_name` separates the server's log (`server.log`) from the index
/// tool's (`index.log`) in the same directory. Only the first call installs
/// anything, so tests and both binaries can call it freely.
pub fn init(paths: &AppPaths, file_name: &str) {
    let log_dir = &paths.log_dir;
    let _ = std::fs::create_dir_all(log_dir);

    let file_appender = tracing_appender::rolling::daily(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    if LOG_GUARD.set(guard).is_err() {
        return;
    }

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_ansi(false)
        .with_writer(non_blocking);

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init();
}
