//! Domain error types
//!
//! This module defines the error hierarchy for v2fhir. Parser and builder
//! failures have their own enums so callers can match on the rule that was
//! violated; [`ConvertError`] wraps them for everything else.

use thiserror::Error;

/// Main v2fhir error type
///
/// This is the primary error type used throughout the library.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Message could not be parsed
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Parsed message could not be turned into resources
    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl ConvertError {
    /// Short, stable name of the rule that failed
    ///
    /// Used in batch reports so a failure can be grouped without parsing the
    /// display string.
    pub fn rule(&self) -> &'static str {
        match self {
            ConvertError::Parse(e) => e.rule(),
            ConvertError::Transform(e) => e.rule(),
            ConvertError::Configuration(_) => "Configuration",
            ConvertError::Serialization(_) => "Serialization",
            ConvertError::Io(_) => "Io",
            ConvertError::Other(_) => "Other",
        }
    }
}

/// Errors raised while reading the wire format
///
/// All of these are detected before dispatch, so no builder runs for a
/// message that fails here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Header segment missing, too short or declaring ambiguous separators
    #[error("Malformed header: {0}")]
    MalformedHeader(String),

    /// A line does not begin with a valid segment name
    #[error("Line {line} does not start with a segment name: {content:?}")]
    EmptySegmentName { line: usize, content: String },

    /// Header present but no body segments follow it
    #[error("Message {control_id:?} has a header but no body segments")]
    TruncatedMessage { control_id: String },
}

impl ParseError {
    /// Rule name for reporting
    pub fn rule(&self) -> &'static str {
        match self {
            ParseError::MalformedHeader(_) => "MalformedHeader",
            ParseError::EmptySegmentName { .. } => "EmptySegmentName",
            ParseError::TruncatedMessage { .. } => "TruncatedMessage",
        }
    }
}

/// Errors raised while dispatching or building resources
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    /// No builder registered for the message type and trigger event
    #[error("Unsupported event: {event}")]
    UnsupportedEvent { event: String },

    /// A segment every resource depends on is absent
    #[error("{event}: required segment {segment} is missing")]
    MissingRequiredSegment { event: String, segment: String },

    /// A field needed to identify a resource is empty
    #[error("{event}: required field {locator} is empty")]
    MissingRequiredField { event: String, locator: String },

    /// A status code has no entry in the translation table
    #[error("{event}: status code {code:?} at {locator} has no mapping")]
    UnmappedStatus {
        event: String,
        locator: String,
        code: String,
    },

    /// The same event was registered twice
    #[error("Builder already registered for event {event}")]
    DuplicateEvent { event: String },
}

impl TransformError {
    /// Rule name for reporting
    pub fn rule(&self) -> &'static str {
        match self {
            TransformError::UnsupportedEvent { .. } => "UnsupportedEvent",
            TransformError::MissingRequiredSegment { .. } => "MissingRequiredSegment",
            TransformError::MissingRequiredField { .. } => "MissingRequiredField",
            TransformError::UnmappedStatus { .. } => "UnmappedStatus",
            TransformError::DuplicateEvent { .. } => "DuplicateEvent",
        }
    }
}

/// Failure details for one message of a batch
///
/// Carries enough to locate the offending message in the source file.
#[derive(Debug, Clone)]
pub struct FailureDetail {
    /// 1-based position of the message in its input
    pub position: usize,

    /// MSH-10 control id, when the header could be read
    pub control_id: Option<String>,

    /// Rule that was violated
    pub rule: &'static str,

    /// Error message
    pub message: String,
}

impl FailureDetail {
    /// Creates a failure detail from a conversion error
    pub fn new(position: usize, error: &ConvertError) -> Self {
        Self {
            position,
            control_id: None,
            rule: error.rule(),
            message: error.to_string(),
        }
    }

    /// Sets the control id
    pub fn with_control_id(mut self, control_id: impl Into<String>) -> Self {
        let control_id = control_id.into();
        if !control_id.is_empty() {
            self.control_id = Some(control_id);
        }
        self
    }
}

impl std::fmt::Display for FailureDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.control_id {
            Some(id) => write!(
                f,
                "message #{} ({}): [{}] {}",
                self.position, id, self.rule, self.message
            ),
            None => write!(
                f,
                "message #{}: [{}] {}",
                self.position, self.rule, self.message
            ),
        }
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for ConvertError {
    fn from(err: std::io::Error) -> Self {
        ConvertError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for ConvertError {
    fn from(err: serde_json::Error) -> Self {
        ConvertError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for ConvertError {
    fn from(err: toml::de::Error) -> Self {
        ConvertError::Configuration(format!("TOML parse error: {err}"))
    }
}
