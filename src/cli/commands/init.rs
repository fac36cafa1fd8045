//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use crate::cli::{EXIT_FATAL, EXIT_OK, EXIT_USAGE};
use crate::config::DEFAULT_CONFIG_FILE;
use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    pub output: String,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        if Path::new(&self.output).exists() && !self.force {
            println!("Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(EXIT_USAGE);
        }

        match fs::write(&self.output, Self::generate_config()) {
            Ok(()) => {
                println!("Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your settings", self.output);
                println!("  2. Validate configuration: v2fhir validate-config");
                println!("  3. Convert a message: v2fhir transform message.hl7");
                println!();
                Ok(EXIT_OK)
            }
            Err(e) => {
                println!("Failed to write configuration file");
                println!("   Error: {e}");
                Ok(EXIT_FATAL)
            }
        }
    }

    /// Sample configuration with every key at its default
    fn generate_config() -> String {
        r#"# v2fhir Configuration File
# HL7 v2 to FHIR converter
#
# Every section is optional. Values may reference environment variables
# with ${VAR_NAME}, and any key can be overridden with
# V2FHIR_<SECTION>_<KEY> (e.g. V2FHIR_OUTPUT_DIRECTORY).

[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

[output]
# Directory resource files are written to
directory = "outputs"

# Pretty-print JSON files
pretty = false

[batch]
# Messages converted at the same time (1-256)
max_concurrency = 8

[terminology]
# Extra coding-system identifiers treated as LOINC
lab_system_aliases = []

# Extra coding-system identifiers treated as ICD-10
diagnosis_system_aliases = []

[logging]
# Write JSON logs to files as well as the console
local_enabled = false

# Log directory
local_path = "logs"

# Log rotation (daily or hourly)
local_rotation = "daily"
"#
        .to_string()
    }
}
