//! Transform command implementation
//!
//! Converts a single message and writes the resources either to one file
//! per resource or to stdout as NDJSON.

use super::{load_settings, read_input};
use crate::adapters::output::{write_resources, write_resources_to_dir};
use crate::cli::{EXIT_CONVERSION_FAILED, EXIT_OK, EXIT_USAGE};
use crate::core::registry::EventRegistry;
use crate::core::transform::Converter;
use crate::log_error_with_context;
use clap::Args;
use std::path::PathBuf;

/// Arguments for the transform command
#[derive(Args, Debug)]
pub struct TransformArgs {
    /// Message file, or `-` for stdin
    #[arg(required_unless_present = "list")]
    pub input: Option<String>,

    /// List the supported events and exit
    #[arg(long)]
    pub list: bool,

    /// Directory for resource files (overrides output.directory)
    #[arg(short = 'o', long = "output-dir")]
    pub output_dir: Option<String>,

    /// Write NDJSON to stdout instead of files
    #[arg(long)]
    pub stdout: bool,

    /// Pretty-print JSON
    #[arg(long)]
    pub pretty: bool,
}

/// Listing printed by `transform --list`
pub fn event_listing(registry: &EventRegistry) -> String {
    let mut out = String::from("Registered HL7 v2 → FHIR events:");
    for event in registry.events() {
        out.push_str("\n  ");
        out.push_str(&event.to_string());
    }
    out
}

impl TransformArgs {
    /// Execute the transform command
    pub async fn execute(&self, config_path: Option<&str>) -> anyhow::Result<i32> {
        let Some(config) = load_settings(config_path) else {
            return Ok(EXIT_USAGE);
        };
        let converter = Converter::from_config(&config.terminology)?;

        if self.list {
            println!("{}", event_listing(converter.registry()));
            return Ok(EXIT_OK);
        }

        let Some(input) = self.input.as_deref() else {
            eprintln!("Error: an input path (or -) is required");
            return Ok(EXIT_USAGE);
        };
        let raw = match read_input(input) {
            Ok(raw) => raw,
            Err(e) => {
                eprintln!("Error: {e:#}");
                return Ok(EXIT_USAGE);
            }
        };

        tracing::info!(input = %input, "Transforming message");

        let resources = match converter.convert(&raw) {
            Ok(resources) => resources,
            Err(e) => {
                log_error_with_context!(e, "Conversion failed");
                eprintln!("Error: [{}] {e}", e.rule());
                return Ok(EXIT_CONVERSION_FAILED);
            }
        };

        let pretty = self.pretty || config.output.pretty;
        if self.stdout {
            let stdout = std::io::stdout();
            write_resources(&mut stdout.lock(), &resources, pretty)?;
        } else {
            let dir = PathBuf::from(
                self.output_dir
                    .clone()
                    .unwrap_or_else(|| config.output.directory.clone()),
            );
            let written = write_resources_to_dir(&resources, &dir, pretty)?;
            println!("Wrote {} resources to {}", written.len(), dir.display());
        }

        Ok(EXIT_OK)
    }
}
