//! Output adapters for v2fhir.
//!
//! The core never touches the filesystem; produced resources leave the
//! process through this layer.
//!
//! - [`output`] - JSON files per resource, or NDJSON on a writer
//!
//! # Example
//!
//! ```rust,no_run
//! use v2fhir::adapters::output::write_resources_to_dir;
//! use v2fhir::core::transform::Converter;
//! use std::path::Path;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let raw = std::fs::read_to_string("adt_a01.hl7")?;
//! let resources = Converter::standard()?.convert(&raw)?;
//! write_resources_to_dir(&resources, Path::new("outputs"), true)?;
//! # Ok(())
//! # }
//! ```

pub mod output;

pub use output::{write_resources, write_resources_to_dir};
