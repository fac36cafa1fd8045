//! CLI command implementations
//!
//! This module contains all CLI command implementations plus the small input
//! and configuration helpers they share.

pub mod batch;
pub mod init;
pub mod parse;
pub mod transform;
pub mod validate;

use crate::config::{load_or_default, V2fhirConfig};
use anyhow::Context;
use std::io::Read;
use std::path::Path;

/// Reads a whole input, `-` meaning stdin
pub(crate) fn read_input(path: &str) -> anyhow::Result<String> {
    if path == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read message from stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read input file: {path}"))
}

/// Loads configuration, printing the problem and returning `None` on error
pub(crate) fn load_settings(config_path: Option<&str>) -> Option<V2fhirConfig> {
    match load_or_default(config_path.map(Path::new)) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load configuration");
            eprintln!("Error: {e}");
            None
        }
    }
}
