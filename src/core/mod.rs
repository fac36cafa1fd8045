//! Core conversion logic for v2fhir.
//!
//! # Modules
//!
//! - [`parse`] - ER7 parsing into an addressable message tree
//! - [`registry`] - Event dispatch table
//! - [`codes`] - Code-system classification and primary code selection
//! - [`transform`] - Per-event resource builders and the [`transform::Converter`] facade
//! - [`batch`] - Multi-message splitting and concurrent conversion
//!
//! # Conversion Workflow
//!
//! 1. **Parse**: derive the encoding profile from `MSH` and tokenize
//! 2. **Dispatch**: look up the builder for `MSH-9.1^MSH-9.2`
//! 3. **Build**: run the builder, resolving coded fields on the way
//! 4. **Emit**: hand the ordered resources to the caller
//!
//! # Example
//!
//! ```rust
//! use v2fhir::core::batch::{BatchConfig, BatchProcessor};
//! use v2fhir::core::transform::Converter;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let processor = BatchProcessor::new(Converter::standard()?, BatchConfig::new(4));
//! let outcomes = processor.process_input(&std::fs::read_to_string("feed.hl7")?).await;
//! println!("{} messages", outcomes.len());
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod codes;
pub mod parse;
pub mod registry;
pub mod transform;
