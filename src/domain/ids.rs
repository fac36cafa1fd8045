//! Domain identifier types with validation
//!
//! Newtype wrappers for the two identifiers the engine passes around: the
//! dispatch key of a message and the logical id of an output resource.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum length of a logical resource id
pub const MAX_RESOURCE_ID_LEN: usize = 64;

/// Dispatch key: message type plus trigger event
///
/// Ordering is lexicographic on (type, trigger), which is the order the
/// registry advertises its events in.
///
/// # Examples
///
/// ```
/// use v2fhir::domain::ids::EventKey;
/// use std::str::FromStr;
///
/// let key = EventKey::from_str("ADT^A01").unwrap();
/// assert_eq!(key.message_type(), "ADT");
/// assert_eq!(key.trigger_event(), "A01");
/// assert_eq!(key.to_string(), "ADT^A01");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventKey {
    message_type: String,
    trigger_event: String,
}

impl EventKey {
    /// Creates a new EventKey
    ///
    /// Values are kept exactly as given; matching is case-sensitive.
    pub fn new(
        message_type: impl Into<String>,
        trigger_event: impl Into<String>,
    ) -> Result<Self, String> {
        let message_type = message_type.into();
        let trigger_event = trigger_event.into();
        if message_type.trim().is_empty() {
            return Err("Message type cannot be empty".to_string());
        }
        if trigger_event.trim().is_empty() {
            return Err("Trigger event cannot be empty".to_string());
        }
        Ok(Self {
            message_type,
            trigger_event,
        })
    }

    /// Message type code (MSH-9.1)
    pub fn message_type(&self) -> &str {
        &self.message_type
    }

    /// Trigger event code (MSH-9.2)
    pub fn trigger_event(&self) -> &str {
        &self.trigger_event
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}^{}", self.message_type, self.trigger_event)
    }
}

impl FromStr for EventKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('^');
        let message_type = parts.next().unwrap_or_default();
        let trigger_event = parts
            .next()
            .ok_or_else(|| format!("Invalid event key '{s}'. Expected TYPE^TRIGGER"))?;
        Self::new(message_type, trigger_event)
    }
}

/// Logical id of an output resource
///
/// Restricted to `[A-Za-z0-9.-]{1,64}` so that every produced reference is
/// valid downstream without repair.
///
/// # Examples
///
/// ```
/// use v2fhir::domain::ids::ResourceId;
///
/// assert!(ResourceId::new("12345").is_ok());
/// assert!(ResourceId::new("has space").is_err());
///
/// let id = ResourceId::sanitized("MRN 0042/A").unwrap();
/// assert_eq!(id.as_str(), "MRN-0042-A");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    /// Creates a ResourceId, rejecting characters outside the id charset
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.is_empty() {
            return Err("Resource id cannot be empty".to_string());
        }
        if id.len() > MAX_RESOURCE_ID_LEN {
            return Err(format!(
                "Resource id longer than {MAX_RESOURCE_ID_LEN} characters: {id}"
            ));
        }
        if let Some(bad) = id.chars().find(|c| !is_id_char(*c)) {
            return Err(format!("Invalid character {bad:?} in resource id {id}"));
        }
        Ok(Self(id))
    }

    /// Builds an id from arbitrary source text
    ///
    /// Characters outside the charset become `-`, runs of `-` collapse, and
    /// the result is truncated to 64 characters. Returns `None` when nothing
    /// usable remains.
    pub fn sanitized(raw: &str) -> Option<Self> {
        let mut out = String::with_capacity(raw.len());
        for c in raw.trim().chars() {
            let c = if is_id_char(c) { c } else { '-' };
            if c == '-' && out.ends_with('-') {
                continue;
            }
            out.push(c);
        }
        let trimmed: String = out
            .trim_matches('-')
            .chars()
            .take(MAX_RESOURCE_ID_LEN)
            .collect();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed))
        }
    }

    /// Returns the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '.'
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ResourceId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for ResourceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
