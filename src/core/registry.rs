//! Event registry
//!
//! Maps a (message type, trigger event) pair to the builder that handles it.
//! The map is built once from a static list and never changes afterwards, so
//! a registry can be shared freely between threads.

use crate::core::codes::CodeResolver;
use crate::core::parse::{HeaderDescriptor, Message};
use crate::core::transform::{adt, orm, oru};
use crate::domain::errors::TransformError;
use crate::domain::ids::EventKey;
use crate::domain::resource::Resource;
use std::collections::BTreeMap;

/// Signature shared by every resource builder
pub type BuilderFn = fn(&Message, &CodeResolver) -> Result<Vec<Resource>, TransformError>;

/// Events handled out of the box
const STANDARD_EVENTS: &[(&str, &str, BuilderFn)] = &[
    ("ADT", "A01", adt::build_admit),
    ("ADT", "A03", adt::build_discharge),
    ("ADT", "A08", adt::build_update),
    ("ORM", "O01", orm::build_order),
    ("ORU", "R01", oru::build_results),
];

/// Immutable lookup table from event to builder
///
/// # Examples
///
/// ```
/// use v2fhir::core::registry::EventRegistry;
///
/// let registry = EventRegistry::standard().unwrap();
/// let events: Vec<String> = registry.events().map(|e| e.to_string()).collect();
/// assert_eq!(events, ["ADT^A01", "ADT^A03", "ADT^A08", "ORM^O01", "ORU^R01"]);
/// ```
#[derive(Clone)]
pub struct EventRegistry {
    builders: BTreeMap<EventKey, BuilderFn>,
}

impl std::fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRegistry")
            .field("events", &self.builders.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl EventRegistry {
    /// Builds a registry from `(key, builder)` pairs
    ///
    /// # Errors
    ///
    /// Returns `DuplicateEvent` when a key appears more than once.
    pub fn from_entries<I>(entries: I) -> Result<Self, TransformError>
    where
        I: IntoIterator<Item = (EventKey, BuilderFn)>,
    {
        let mut builders = BTreeMap::new();
        for (key, builder) in entries {
            if builders.contains_key(&key) {
                return Err(TransformError::DuplicateEvent {
                    event: key.to_string(),
                });
            }
            builders.insert(key, builder);
        }
        Ok(Self { builders })
    }

    /// Registry with every supported event
    pub fn standard() -> Result<Self, TransformError> {
        let entries = STANDARD_EVENTS.iter().map(|&(t, e, builder)| {
            let key = EventKey::new(t, e).map_err(|_| TransformError::UnsupportedEvent {
                event: format!("{t}^{e}"),
            })?;
            Ok((key, builder))
        });
        Self::from_entries(entries.collect::<Result<Vec<_>, TransformError>>()?)
    }

    /// Exact, case-sensitive lookup
    pub fn lookup(&self, key: &EventKey) -> Option<BuilderFn> {
        self.builders.get(key).copied()
    }

    /// Builder for the event declared in a header
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedEvent` naming `TYPE^TRIGGER` when nothing is
    /// registered, including when either part is empty.
    pub fn resolve(&self, header: &HeaderDescriptor) -> Result<BuilderFn, TransformError> {
        header
            .event_key()
            .and_then(|key| self.lookup(&key))
            .ok_or_else(|| TransformError::UnsupportedEvent {
                event: header.event_label(),
            })
    }

    /// Registered events in sorted order
    pub fn events(&self) -> impl Iterator<Item = &EventKey> + '_ {
        self.builders.keys()
    }

    pub fn contains(&self, key: &EventKey) -> bool {
        self.builders.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.builders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }
}
