//! Message-to-resource transformation
//!
//! [`Converter`] is the facade the rest of the crate talks to: it parses the
//! raw text, looks the declared event up in the registry and runs the
//! matching builder. Builders themselves live in the per-event modules and
//! are plain functions over a parsed [`Message`].
//!
//! # Examples
//!
//! ```
//! use v2fhir::core::transform::Converter;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let converter = Converter::standard()?;
//! let raw = "MSH|^~\\&|EPIC|HOSP|LIS|LAB|202501011230||ADT^A01|MSG001|P|2.5\r\
//!            PID|1||12345^^^HOSP^MR||Doe^John||19700101|M\r\
//!            PV1|1|I";
//! let resources = converter.convert(raw)?;
//! assert_eq!(resources[0].reference().target(), Some("Patient/12345"));
//! # Ok(())
//! # }
//! ```

pub mod adt;
pub mod common;
pub mod orm;
pub mod oru;

use crate::config::TerminologyConfig;
use crate::core::codes::CodeResolver;
use crate::core::parse::{parse_message, Message};
use crate::core::registry::EventRegistry;
use crate::domain::resource::Resource;
use crate::domain::Result;
use crate::{log_transform_complete, log_transform_start};
use std::sync::Arc;

/// Parse, dispatch and build in one call
///
/// Holds only immutable state, so one instance can be cloned cheaply and
/// shared across worker threads.
#[derive(Debug, Clone)]
pub struct Converter {
    registry: Arc<EventRegistry>,
    resolver: Arc<CodeResolver>,
}

impl Converter {
    pub fn new(registry: EventRegistry, resolver: CodeResolver) -> Self {
        Self {
            registry: Arc::new(registry),
            resolver: Arc::new(resolver),
        }
    }

    /// Every supported event with the default code tables
    pub fn standard() -> Result<Self> {
        Ok(Self::new(EventRegistry::standard()?, CodeResolver::default()))
    }

    /// Every supported event, with vocabulary aliases from configuration
    pub fn from_config(config: &TerminologyConfig) -> Result<Self> {
        Ok(Self::new(
            EventRegistry::standard()?,
            CodeResolver::from_config(config),
        ))
    }

    pub fn registry(&self) -> &EventRegistry {
        &self.registry
    }

    pub fn resolver(&self) -> &CodeResolver {
        &self.resolver
    }

    /// Converts one raw message into its resources, in output order
    ///
    /// # Errors
    ///
    /// Any parse or transform error. No resources are returned for a message
    /// that fails part-way.
    pub fn convert(&self, raw: &str) -> Result<Vec<Resource>> {
        let message = parse_message(raw)?;
        self.convert_message(&message)
    }

    /// Runs the registered builder over an already parsed message
    pub fn convert_message(&self, message: &Message) -> Result<Vec<Resource>> {
        let header = message.header();
        let builder = self.registry.resolve(header)?;
        let event = header.event_label();

        log_transform_start!(event, header.control_id);
        let resources = builder(message, &self.resolver)?;
        log_transform_complete!(event, header.control_id, resources.len());

        Ok(resources)
    }
}
