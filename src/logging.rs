//! Structured logging for transcribe using the tracing crate.
//!
//! Configures a rolling file logger that writes to daily-rotated log files,
//! placed according to the XDG Base Directory Specification. The web server also
//! mirrors log lines to stderr. Only the 7 most recent log files are kept.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing_appender::rolling;
use tracing_subscriber::prelude::*;

/// File name prefix of every log file.
pub const LOG_FILE_PREFIX: &str = "transcribe.log";

const MAX_LOG_FILES: usize = 7;

/// Global non-blocking guard holder to keep the appender alive for the program lifetime.
static APPENDER_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

/// Initializes the logging system with file-based output.
///
/// Log level is controlled by the RUST_LOG environment variable (defaults to "info").
/// With `to_stderr`, log lines are also written to the terminal.
///
/// # Errors
/// - If the log directory cannot be determined or created
/// - If logging was already initialized
pub fn init_logging(to_stderr: bool) -> Result<(), anyhow::Error> {
    let log_dir = get_log_dir()?;
    fs::create_dir_all(&log_dir)?;

    if let Err(e) = cleanup_old_logs(&log_dir) {
        eprintln!("Warning: Failed to cleanup old logs: {}", e);
    }

    let file_appender = rolling::daily(&log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    APPENDER_GUARD
        .set(guard)
        .map_err(|_| anyhow::anyhow!("Logging already initialized"))?;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_ansi(false);

    let stderr_layer = to_stderr.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;

    tracing::debug!("Logging initialized. Log dir: {}", log_dir.display());
    Ok(())
}

/// Determines the log directory, following XDG Base Directory Specification.
///
/// Prefers XDG_STATE_HOME if set, otherwise uses ~/.local/state/transcribe.
///
/// # Errors
/// - If home directory cannot be determined
pub fn get_log_dir() -> Result<PathBuf, anyhow::Error> {
    let log_dir = if let Ok(xdg_state) = std::env::var("XDG_STATE_HOME") {
        PathBuf::from(xdg_state).join("transcribe")
    } else {
        let home = dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
        home.join(".local/state/transcribe")
    };

    Ok(log_dir)
}

/// True for rotated files named `transcribe.log.YYYY-MM-DD`.
fn is_rotated_log(file_name: &str) -> bool {
    file_name
        .strip_prefix(LOG_FILE_PREFIX)
        .and_then(|rest| rest.strip_prefix('.'))
        .is_some_and(|date| date.matches('-').count() == 2)
}

/// Removes old log files, keeping only the most recent ones.
///
/// # Errors
/// - If the log directory cannot be read
fn cleanup_old_logs(log_dir: &Path) -> Result<(), anyhow::Error> {
    let mut log_files: Vec<_> = fs::read_dir(log_dir)?
        .filter_map(|entry| {
            let entry = entry.ok()?;
            let path = entry.path();
            let file_name = path.file_name()?.to_string_lossy().to_string();

            if is_rotated_log(&file_name) {
                let modified = fs::metadata(&path).ok()?.modified().ok()?;
                Some((path, modified))
            } else {
                None
            }
        })
        .collect();

    // newest first
    log_files.sort_by(|a, b| b.1.cmp(&a.1));

    for (path, _) in log_files.iter().skip(MAX_LOG_FILES) {
        if let Err(e) = fs::remove_file(path) {
            tracing::warn!("Failed to delete old log file {}: {}", path.display(), e);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_rotated_log() {
        assert!(is_rotated_log("transcribe.log.2026-10-18"));
        assert!(!is_rotated_log("transcribe.log"));
        assert!(!is_rotated_log("transcribe.logger.2026-10-18"));
        assert!(!is_rotated_log("other.log.2026-10-18"));
    }

    #[test]
    fn test_cleanup_keeps_newest_files() {
        let dir = tempfile::tempdir().unwrap();
        for day in 1..=9 {
            let path = dir.path().join(format!("{LOG_FILE_PREFIX}.2026-10-0{day}"));
            fs::write(&path, "x").unwrap();
            let mtime = std::time::SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(day * 86_400);
            fs::File::options()
                .write(true)
                .open(&path)
                .unwrap()
                .set_modified(mtime)
                .unwrap();
        }
        fs::write(dir.path().join("notes.txt"), "keep").unwrap();

        cleanup_old_logs(dir.path()).unwrap();

        let mut left: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        left.sort();
        assert_eq!(left.len(), MAX_LOG_FILES + 1);
        assert!(left.contains(&"notes.txt".to_string()));
        assert!(!left.contains(&format!("{LOG_FILE_PREFIX}.2026-10-01")));
        assert!(!left.contains(&format!("{LOG_FILE_PREFIX}.2026-10-02")));
    }
}
