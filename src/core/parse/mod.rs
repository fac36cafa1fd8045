//! ER7 message parsing
//!
//! Raw text goes through three steps:
//!
//! 1. [`EncodingProfile::from_message`] reads the separators declared in MSH
//! 2. [`tokenizer::tokenize`] splits the text into segments and decodes values
//! 3. [`Message`] wraps the segments and exposes read-only accessors
//!
//! # Example
//!
//! ```
//! use v2fhir::core::parse::{parse_message, Locator};
//!
//! let raw = "MSH|^~\\&|EPIC|HOSP|LIS|LAB|202501011230||ADT^A01|MSG001|P|2.5\r\
//!            PID|1||12345^^^HOSP^MR||Doe^John||19700101|M";
//! let message = parse_message(raw).unwrap();
//!
//! assert_eq!(message.header().control_id, "MSG001");
//! let family: Locator = "PID-5.1".parse().unwrap();
//! assert_eq!(message.text(&family), "Doe");
//! ```

pub mod encoding;
pub mod escape;
pub mod locator;
pub mod message;
pub mod tokenizer;

pub use encoding::EncodingProfile;
pub use locator::Locator;
pub use message::{Component, Field, HeaderDescriptor, Message, Repetition, Segment};

use crate::domain::errors::ParseError;

/// Parses one message
///
/// Fails before any segment is returned if the header is unusable, a line
/// has no segment name, or nothing follows the header.
pub fn parse_message(raw: &str) -> Result<Message, ParseError> {
    let profile = EncodingProfile::from_message(raw)?;
    let segments = tokenizer::tokenize(raw, &profile)?;
    tracing::trace!(segments = segments.len(), "Tokenized message");
    Ok(Message::new(profile, segments))
}
