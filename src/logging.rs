//! Logging setup for the CLI and embedding applications.

use crate::error::{ObserverError, Result};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` wins over the configured level when set
fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("telephony_observer={}", level)))
}

pub fn init_logging(level: &str) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(filter(level))
        .with_target(false)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| ObserverError::Configuration {
            reason: format!("failed to install logger: {}", e),
        })
}

pub fn init_file_logging(log_file: &Path, level: &str) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter(level))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| ObserverError::Configuration {
            reason: format!("failed to install logger: {}", e),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_logging_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("observer.log");

        // Another test may already own the global subscriber
        let _ = init_file_logging(&path, "debug");
        assert!(path.exists());
    }

    #[test]
    fn test_missing_log_directory_is_io_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent").join("observer.log");

        let err = init_file_logging(&path, "info").unwrap_err();
        assert!(matches!(err, ObserverError::Io(_)));
    }
}
