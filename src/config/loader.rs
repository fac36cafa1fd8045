//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::V2fhirConfig;
use crate::domain::errors::ConvertError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// Default configuration file name looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "v2fhir.toml";

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into V2fhirConfig
/// 4. Applies environment variable overrides (V2FHIR_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - Environment variable substitution fails
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use v2fhir::config::loader::load_config;
///
/// let config = load_config("v2fhir.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<V2fhirConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ConvertError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        ConvertError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    load_config_str(&contents)
}

/// Same as [`load_config`] but for TOML already in memory
pub fn load_config_str(contents: &str) -> Result<V2fhirConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: V2fhirConfig = toml::from_str(&contents)
        .map_err(|e| ConvertError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        ConvertError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Loads `path` when given, else `v2fhir.toml` when present, else defaults
///
/// An explicitly named file must exist. Environment overrides apply in every
/// case.
pub fn load_or_default(path: Option<&Path>) -> Result<V2fhirConfig> {
    match path {
        Some(path) => load_config(path),
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => load_config(DEFAULT_CONFIG_FILE),
        None => {
            tracing::debug!("No configuration file found, using defaults");
            load_config_str("")
        }
    }
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("env var pattern compiles")
    })
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are copied unchanged.
///
/// # Errors
///
/// Returns an error naming every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = env_var_pattern();
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let processed = re.replace_all(line, |cap: &regex::Captures<'_>| {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                    String::new()
                }
            }
        });
        result.push_str(&processed);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(ConvertError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn parse_override<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        ConvertError::Configuration(format!("Invalid value '{value}' for {name}"))
    })
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Applies environment variable overrides using the V2FHIR_* prefix
///
/// Environment variables follow the pattern: V2FHIR_<SECTION>_<KEY>, for
/// example V2FHIR_OUTPUT_DIRECTORY or V2FHIR_BATCH_MAX_CONCURRENCY. List
/// values are comma separated.
fn apply_env_overrides(config: &mut V2fhirConfig) -> Result<()> {
    // Application overrides
    if let Ok(val) = std::env::var("V2FHIR_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Output overrides
    if let Ok(val) = std::env::var("V2FHIR_OUTPUT_DIRECTORY") {
        config.output.directory = val;
    }
    if let Ok(val) = std::env::var("V2FHIR_OUTPUT_PRETTY") {
        config.output.pretty = parse_override("V2FHIR_OUTPUT_PRETTY", &val)?;
    }

    // Batch overrides
    if let Ok(val) = std::env::var("V2FHIR_BATCH_MAX_CONCURRENCY") {
        config.batch.max_concurrency = parse_override("V2FHIR_BATCH_MAX_CONCURRENCY", &val)?;
    }

    // Terminology overrides
    if let Ok(val) = std::env::var("V2FHIR_TERMINOLOGY_LAB_SYSTEM_ALIASES") {
        config.terminology.lab_system_aliases = split_list(&val);
    }
    if let Ok(val) = std::env::var("V2FHIR_TERMINOLOGY_DIAGNOSIS_SYSTEM_ALIASES") {
        config.terminology.diagnosis_system_aliases = split_list(&val);
    }

    // Logging overrides
    if let Ok(val) = std::env::var("V2FHIR_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = parse_override("V2FHIR_LOGGING_LOCAL_ENABLED", &val)?;
    }
    if let Ok(val) = std::env::var("V2FHIR_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Ok(val) = std::env::var("V2FHIR_LOGGING_LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }

    Ok(())
}
