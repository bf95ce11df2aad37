//! Tracing configuration and log routing.
//!
//! Console logs go to stderr so a summary printed on stdout stays clean for piping. File
//! logging is appended to `RUSTYSUM_LOG_FILE` when set, otherwise to `logs/rustysum.log`.
use std::sync::OnceLock;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const LOG_FILE_VARIABLE: &str = "RUSTYSUM_LOG_FILE";
const DEFAULT_LOG_DIR: &str = "logs";
const DEFAULT_LOG_FILE: &str = "rustysum.log";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Configure tracing subscribers for stderr and optional file logging.
///
/// - Respects `RUST_LOG` for filtering (defaults to `info`).
/// - Keeps the non-blocking writer guard alive for the process lifetime.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    if let Some(writer) = configure_file_writer(std::env::var(LOG_FILE_VARIABLE).ok()) {
        let file_layer = fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_ansi(false)
            .compact();

        registry.with(file_layer).init();
    } else {
        registry.init();
    }
}

/// Build a non-blocking file writer, or `None` when the target cannot be opened.
fn configure_file_writer(explicit_path: Option<String>) -> Option<NonBlocking> {
    let (non_blocking, guard) = match explicit_path {
        Some(path) => match std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
        {
            Ok(file) => tracing_appender::non_blocking(file),
            Err(err) => {
                eprintln!("Failed to open log file {path}: {err}");
                return None;
            }
        },
        None => {
            if let Err(err) = std::fs::create_dir_all(DEFAULT_LOG_DIR) {
                eprintln!("Failed to create logs directory: {err}");
                return None;
            }
            tracing_appender::non_blocking(tracing_appender::rolling::never(
                DEFAULT_LOG_DIR,
                DEFAULT_LOG_FILE,
            ))
        }
    };
    let _ = LOG_GUARD.set(guard);
    Some(non_blocking)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_log_file_is_created() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("run.log");

        let writer = configure_file_writer(Some(path.display().to_string()));

        assert!(writer.is_some());
        assert!(path.exists());
    }

    #[test]
    fn unopenable_log_file_disables_file_logging() {
        let writer = configure_file_writer(Some("/definitely/not/a/dir/run.log".into()));
        assert!(writer.is_none());
    }
}
