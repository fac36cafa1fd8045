//! Configuration schema types
//!
//! Every section and every key is optional; a missing file or an empty one
//! yields [`V2fhirConfig::default`].

use serde::{Deserialize, Serialize};

/// Upper bound for `batch.max_concurrency`
pub const MAX_BATCH_CONCURRENCY: usize = 256;

/// Main v2fhir configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct V2fhirConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Where and how resources are written
    #[serde(default)]
    pub output: OutputConfig,

    /// Batch driver settings
    #[serde(default)]
    pub batch: BatchSettings,

    /// Extra code-system identifiers
    #[serde(default)]
    pub terminology: TerminologyConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl V2fhirConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.output.validate()?;
        self.batch.validate()?;
        self.terminology.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory resource files are written to
    #[serde(default = "default_output_directory")]
    pub directory: String,

    /// Pretty-print JSON files
    #[serde(default)]
    pub pretty: bool,
}

impl OutputConfig {
    fn validate(&self) -> Result<(), String> {
        if self.directory.trim().is_empty() {
            return Err("output.directory cannot be empty".to_string());
        }
        Ok(())
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            pretty: false,
        }
    }
}

/// Batch driver configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSettings {
    /// Messages converted at the same time (1-256)
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

impl BatchSettings {
    fn validate(&self) -> Result<(), String> {
        if self.max_concurrency == 0 || self.max_concurrency > MAX_BATCH_CONCURRENCY {
            return Err(format!(
                "batch.max_concurrency must be between 1 and {MAX_BATCH_CONCURRENCY}"
            ));
        }
        Ok(())
    }
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
        }
    }
}

/// Code-system aliases, added to the built-in identifiers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminologyConfig {
    /// Identifiers treated as LOINC
    #[serde(default)]
    pub lab_system_aliases: Vec<String>,

    /// Identifiers treated as ICD-10
    #[serde(default)]
    pub diagnosis_system_aliases: Vec<String>,
}

impl TerminologyConfig {
    fn validate(&self) -> Result<(), String> {
        for alias in self
            .lab_system_aliases
            .iter()
            .chain(&self.diagnosis_system_aliases)
        {
            if alias.trim().is_empty() {
                return Err("terminology aliases cannot be empty strings".to_string());
            }
        }
        if let Some(alias) = self.lab_system_aliases.iter().find(|a| {
            self.diagnosis_system_aliases
                .iter()
                .any(|d| d.eq_ignore_ascii_case(a))
        }) {
            return Err(format!(
                "terminology alias '{alias}' is listed for both lab and diagnosis"
            ));
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy (daily, hourly)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        crate::logging::rotation_for(&self.local_rotation).map_err(|e| format!("logging: {e}"))?;
        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when file logging is enabled".to_string());
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_output_directory() -> String {
    "outputs".to_string()
}

fn default_max_concurrency() -> usize {
    8
}

fn default_local_path() -> String {
    "logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
