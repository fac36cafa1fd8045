//! Structured logging setup using tracing
//!
//! Console output for interactive use, plus an optional JSON file layer with
//! rotation.
//!
//! # Example
//!
//! ```no_run
//! use v2fhir::logging::init_logging;
//! use v2fhir::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//! ```

use crate::config::LoggingConfig;
use crate::domain::{ConvertError, Result};
use tracing::Level;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Guard that must be kept alive for the duration of the program
/// to ensure logs are flushed properly
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

impl LoggingGuard {
    fn new(file_guard: Option<WorkerGuard>) -> Self {
        Self {
            _file_guard: file_guard,
        }
    }
}

/// Log file name prefix inside `LoggingConfig::local_path`
pub const LOG_FILE_PREFIX: &str = "v2fhir.log";

/// Installs the global subscriber
///
/// `RUST_LOG` takes precedence over `log_level_str` when set. The console
/// layer always writes to stderr; the JSON file layer is added only when
/// `config.local_enabled` is set.
///
/// Returns a [`LoggingGuard`] that must live until the program exits.
pub fn init_logging(log_level_str: &str, config: &LoggingConfig) -> Result<LoggingGuard> {
    let filter_directive = default_directive(parse_log_level(log_level_str)?);
    let filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_directive))
    };

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> =
        vec![console_layer().with_filter(filter()).boxed()];

    let file_guard = if config.local_enabled {
        let (writer, guard) = file_writer(config)?;
        layers.push(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_thread_names(true)
                .with_writer(writer)
                .with_filter(filter())
                .boxed(),
        );
        Some(guard)
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .map_err(|e| ConvertError::Configuration(format!("Failed to install log subscriber: {e}")))?;

    tracing::debug!(
        directive = %filter_directive,
        file = config.local_enabled,
        path = %config.local_path,
        "Logging initialized"
    );
    Ok(LoggingGuard::new(file_guard))
}

/// `v2fhir=<level>`; other crates stay at their defaults
pub fn default_directive(level: Level) -> String {
    format!("v2fhir={}", level.as_str().to_ascii_lowercase())
}

/// Maps `logging.local_rotation` to an appender rotation
pub fn rotation_for(name: &str) -> Result<Rotation> {
    match name {
        "daily" => Ok(Rotation::DAILY),
        "hourly" => Ok(Rotation::HOURLY),
        other => Err(ConvertError::Configuration(format!(
            "Invalid log rotation: {other}. Must be daily or hourly"
        ))),
    }
}

fn console_layer<S>() -> impl Layer<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    // stdout carries NDJSON output
    tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
}

fn file_writer(config: &LoggingConfig) -> Result<(NonBlocking, WorkerGuard)> {
    let rotation = rotation_for(&config.local_rotation)?;
    std::fs::create_dir_all(&config.local_path).map_err(|e| {
        ConvertError::Configuration(format!(
            "Failed to create log directory {}: {e}",
            config.local_path
        ))
    })?;
    let appender = RollingFileAppender::new(rotation, &config.local_path, LOG_FILE_PREFIX);
    Ok(tracing_appender::non_blocking(appender))
}

/// Parse log level from string
pub fn parse_log_level(level_str: &str) -> Result<Level> {
    match level_str.trim().to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err(ConvertError::Configuration(format!(
            "Invalid log level: {level_str}. Must be one of: trace, debug, info, warn, error"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use test_case::test_case;

    #[test_case("trace", Level::TRACE)]
    #[test_case("debug", Level::DEBUG)]
    #[test_case("INFO", Level::INFO ; "upper case")]
    #[test_case(" warn ", Level::WARN ; "padded")]
    #[test_case("error", Level::ERROR)]
    fn test_parse_log_level(text: &str, expected: Level) {
        assert_eq!(parse_log_level(text).unwrap(), expected);
    }

    #[test]
    fn test_parse_log_level_invalid() {
        assert!(parse_log_level("verbose").is_err());
        assert!(parse_log_level("").is_err());
    }

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(Level::WARN), "v2fhir=warn");
        assert_eq!(default_directive(Level::TRACE), "v2fhir=trace");
    }

    #[test]
    fn test_rotation_for() {
        assert_eq!(rotation_for("daily").unwrap(), Rotation::DAILY);
        assert_eq!(rotation_for("hourly").unwrap(), Rotation::HOURLY);
        assert!(rotation_for("weekly").is_err());
    }

    #[test]
    fn test_file_writer_creates_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("logs").join("v2fhir");
        let config = LoggingConfig {
            local_enabled: true,
            local_path: dir.to_string_lossy().into_owned(),
            local_rotation: "hourly".to_string(),
        };
        let (_writer, guard) = file_writer(&config).unwrap();
        assert!(dir.is_dir());
        drop(guard);
    }

    #[test]
    fn test_init_logging_rejects_bad_level_before_installing() {
        let err = init_logging("loud", &LoggingConfig::default()).err().unwrap();
        assert!(matches!(err, ConvertError::Configuration(_)));
    }
}
