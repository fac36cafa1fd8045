//! Tracing setup and conversion log macros
//!
//! Human-readable events go to stderr and, when `logging.local_enabled` is
//! set, JSON lines go to a rotating file. Nothing is logged to stdout, which
//! carries NDJSON resource output.
//!
//! ```no_run
//! use v2fhir::config::LoggingConfig;
//! use v2fhir::logging::init_logging;
//!
//! let _guard = init_logging("debug", &LoggingConfig::default()).unwrap();
//! tracing::info!(control_id = "MSG001", "Message accepted");
//! ```

pub mod structured;

pub use structured::{init_logging, parse_log_level, rotation_for, LoggingGuard};

/// Log the start of a message conversion
///
/// # Example
///
/// ```no_run
/// use v2fhir::log_transform_start;
///
/// log_transform_start!("ADT^A01", "MSG001");
/// ```
#[macro_export]
macro_rules! log_transform_start {
    ($event:expr, $control_id:expr) => {
        tracing::debug!(
            event = %$event,
            control_id = %$control_id,
            "Starting transform"
        );
    };
}

/// Log the completion of a message conversion
///
/// # Example
///
/// ```no_run
/// use v2fhir::log_transform_complete;
///
/// log_transform_complete!("ORU^R01", "MSG002", 4);
/// ```
#[macro_export]
macro_rules! log_transform_complete {
    ($event:expr, $control_id:expr, $resources:expr) => {
        tracing::info!(
            event = %$event,
            control_id = %$control_id,
            resources = $resources,
            "Transform completed"
        );
    };
}

/// Log a failed conversion together with its rule name
///
/// ```no_run
/// use v2fhir::log_error_with_context;
/// use v2fhir::domain::ConvertError;
///
/// let error = ConvertError::Other("no input".to_string());
/// log_error_with_context!(&error, "Conversion failed");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::warn!(
            rule = $error.rule(),
            reason = %$error,
            "{}",
            $context
        );
    };
}

/// Log batch progress
///
/// # Example
///
/// ```no_run
/// use v2fhir::log_batch_progress;
///
/// log_batch_progress!(100, 1000);
/// ```
#[macro_export]
macro_rules! log_batch_progress {
    ($current:expr, $total:expr) => {
        tracing::debug!(
            done = $current,
            of = $total,
            pct = ($current as f64 / ($total as f64).max(1.0) * 100.0),
            "Batch progress"
        );
    };
}
