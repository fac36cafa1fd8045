//! # v2fhir - HL7 v2 to FHIR conversion
//!
//! v2fhir turns pipe-delimited HL7 v2 (ER7) messages into FHIR R4 resources.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Parsing** ER7 text into an addressable segment/field/component tree
//! - **Dispatching** each message to a builder by its declared event (`ADT^A01`, `ORU^R01`, ...)
//! - **Building** Patient, Encounter, Condition, ServiceRequest, Observation and
//!   DiagnosticReport resources with resolved code systems
//! - **Batching** many messages concurrently with per-message failure isolation
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Parser, code resolution, event registry, builders and batch driver
//! - [`adapters`] - JSON file and stream output
//! - [`domain`] - Identifiers, resources and error types
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust
//! use v2fhir::core::transform::Converter;
//! use v2fhir::domain::ResourceKind;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let converter = Converter::standard()?;
//! let raw = "MSH|^~\\&|LAB|HOSP|EHR|HOSP|202501011230||ORU^R01|LAB001|P|2.5\r\
//!            PID|1||555^^^HOSP^MR||Roe^Ann\r\
//!            OBR|1|||2345-7^Glucose^LN\r\
//!            OBX|1|NM|2345-7^Glucose^LN||95|mg/dL|||||F";
//!
//! let resources = converter.convert(raw)?;
//! assert_eq!(resources[0].kind(), ResourceKind::Patient);
//! assert_eq!(resources[1].kind(), ResourceKind::Observation);
//!
//! for resource in &resources {
//!     println!("{}", serde_json::to_string(resource)?);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Every failure carries a stable rule name, so callers can group them
//! without matching on message text:
//!
//! ```rust
//! use v2fhir::core::transform::Converter;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let converter = Converter::standard()?;
//! let err = converter
//!     .convert("MSH|^~\\&|A|B|C|D|202501011230||SIU^S12|M1|P|2.5\rPID|1||1")
//!     .unwrap_err();
//! assert_eq!(err.rule(), "UnsupportedEvent");
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
