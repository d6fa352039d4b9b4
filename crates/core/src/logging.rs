//! Logging setup.
//!
//! Console logs go to stderr. Stdout carries the answer and nothing else, so
//! `ragomatic ask ... > answer.md` stays clean. Long-running commands can add
//! a per-run log file next to the console output.

use chrono::{DateTime, Local};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::error::{AppError, AppResult};

/// Directory under the workspace that holds per-run log files.
pub const LOG_DIR: &str = "logs";

/// Filter for the log file when no level was given explicitly.
const FILE_LOG_LEVEL: &str = "info";

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

impl LogFormat {
    /// Parse a format name ("pretty", "text", "json").
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Some(Self::Pretty),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// A log file created for a single run.
#[derive(Debug)]
pub struct LogFile {
    path: PathBuf,
    file: File,
}

impl LogFile {
    /// Create `<dir>/<prefix>_<YYYYmmdd_HHMMSS>.log`, creating `dir` if needed.
    pub fn create(dir: &Path, prefix: &str) -> AppResult<Self> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(log_file_name(prefix, Local::now()));
        let file = File::create(&path)?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn log_file_name(prefix: &str, at: DateTime<Local>) -> String {
    format!("{}_{}.log", prefix, at.format("%Y%m%d_%H%M%S"))
}

fn parse_filter(directives: &str) -> AppResult<EnvFilter> {
    EnvFilter::try_new(directives)
        .map_err(|e| AppError::Config(format!("Invalid log filter '{}': {}", directives, e)))
}

/// Initialize the tracing subscriber.
///
/// `log_level` accepts any `EnvFilter` directive ("warn", "ragomatic=debug").
/// When absent, `RUST_LOG` is consulted, then "warn" so a plain `ask` run
/// prints only the answer. A `log_file` receives plain-text lines at
/// `log_level`, or "info" when no level was given.
///
/// # Example
/// ```no_run
/// use ragomatic_core::logging::{init_logging, LogFormat};
///
/// init_logging(Some("info"), false, LogFormat::Pretty, None).expect("logging");
/// ```
pub fn init_logging(
    log_level: Option<&str>,
    no_color: bool,
    format: LogFormat,
    log_file: Option<LogFile>,
) -> AppResult<()> {
    let default_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string());
    let console_filter = parse_filter(log_level.unwrap_or(&default_level))?;

    let file_layer = match log_file {
        Some(log_file) => Some(
            fmt::layer()
                .with_writer(Mutex::new(log_file.file))
                .with_ansi(false)
                .with_target(true)
                .with_filter(parse_filter(log_level.unwrap_or(FILE_LOG_LEVEL))?),
        ),
        None => None,
    };

    let registry = tracing_subscriber::registry().with(file_layer);

    let result = match format {
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_ansi(!no_color && std::env::var_os("NO_COLOR").is_none())
                    .with_filter(console_filter),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_filter(console_filter),
            )
            .try_init(),
    };

    result.map_err(|e| AppError::Config(format!("Failed to init logging: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_format() {
        assert_eq!(LogFormat::parse("json"), Some(LogFormat::Json));
        assert_eq!(LogFormat::parse("TEXT"), Some(LogFormat::Pretty));
        assert_eq!(LogFormat::parse("xml"), None);
    }

    #[test]
    fn test_invalid_filter_is_config_error() {
        let result = init_logging(Some("ragomatic=loud"), true, LogFormat::Pretty, None);
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_log_file_name_is_timestamped() {
        let at = chrono::TimeZone::with_ymd_and_hms(&Local, 2026, 3, 7, 9, 5, 1).unwrap();
        assert_eq!(log_file_name("index", at), "index_20260307_090501.log");
    }

    #[test]
    fn test_log_file_creates_directory() {
        let temp = tempfile::TempDir::new().unwrap();
        let dir = temp.path().join(LOG_DIR);

        let log_file = LogFile::create(&dir, "index").unwrap();

        assert!(log_file.path().starts_with(&dir));
        assert!(log_file.path().exists());
        let name = log_file.path().file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("index_") && name.ends_with(".log"));
    }
}
