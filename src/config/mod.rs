//! Configuration management for v2fhir.
//!
//! This module provides TOML-based configuration loading, parsing, and
//! validation.
//!
//! # Overview
//!
//! v2fhir reads an optional TOML configuration file with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `V2FHIR_<SECTION>_<KEY>` environment overrides
//! - Default values for every setting
//! - Validation on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use v2fhir::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("v2fhir.toml")?;
//!
//! println!("Output directory: {}", config.output.directory);
//! println!("Batch concurrency: {}", config.batch.max_concurrency);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level
//! - [`OutputConfig`] - Output directory and JSON formatting
//! - [`BatchSettings`] - Batch concurrency
//! - [`TerminologyConfig`] - Extra lab / diagnosis code-system aliases
//! - [`LoggingConfig`] - File logging
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [output]
//! directory = "${V2FHIR_OUT}"
//! pretty = true
//!
//! [batch]
//! max_concurrency = 8
//!
//! [terminology]
//! lab_system_aliases = ["99LAB"]
//! diagnosis_system_aliases = []
//!
//! [logging]
//! local_enabled = true
//! local_path = "logs"
//! local_rotation = "daily"
//! ```

pub mod loader;
pub mod schema;

// Re-export commonly used types
pub use loader::{load_config, load_config_str, load_or_default, DEFAULT_CONFIG_FILE};
pub use schema::{
    ApplicationConfig, BatchSettings, LoggingConfig, OutputConfig, TerminologyConfig,
    V2fhirConfig, MAX_BATCH_CONCURRENCY,
};
