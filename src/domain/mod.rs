//! Domain models and types for v2fhir.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`EventKey`], [`ResourceId`])
//! - **Coded values** ([`CodeBinding`], [`CodeSystem`], [`CodeableConcept`])
//! - **Output resources** ([`Resource`] and one struct per kind)
//! - **Error types** ([`ConvertError`], [`ParseError`], [`TransformError`])
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! All fallible library operations return [`Result<T, ConvertError>`]. Parser
//! and builder errors convert with `?`:
//!
//! ```rust
//! use v2fhir::domain::{ConvertError, ParseError, Result};
//!
//! fn example() -> Result<()> {
//!     let err: std::result::Result<(), ParseError> =
//!         Err(ParseError::MalformedHeader("no MSH".to_string()));
//!     err?;
//!     Ok(())
//! }
//!
//! assert!(matches!(example(), Err(ConvertError::Parse(_))));
//! ```

pub mod coding;
pub mod context;
pub mod errors;
pub mod ids;
pub mod resource;
pub mod result;

// Re-export commonly used types for convenience
pub use coding::{CodeBinding, CodeSystem, CodeableConcept, Coding};
pub use errors::{ConvertError, FailureDetail, ParseError, TransformError};
pub use ids::{EventKey, ResourceId};
pub use resource::{
    Address, AdministrativeGender, Condition, ContactPoint, DiagnosticReport, Encounter,
    EncounterStatus, HumanName, Identifier, Observation, ObservationStatus, ObservationValue,
    Patient, Period, Quantity, Reference, ReferenceRange, ReportStatus, RequestPriority,
    RequestStatus, Resource, ResourceKind, ServiceRequest,
};
pub use result::Result;
