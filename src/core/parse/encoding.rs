//! Delimiter set declared by the message header
//!
//! `MSH|^~\&|...`: the character after `MSH` is the field separator and the
//! next four are the component, repetition, escape and sub-component
//! separators, in that order.

use crate::domain::errors::ParseError;
use std::fmt;

/// The five separator characters of one message
///
/// Immutable once derived; all five are distinct printable ASCII symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EncodingProfile {
    field: char,
    component: char,
    repetition: char,
    escape: char,
    subcomponent: char,
}

impl Default for EncodingProfile {
    fn default() -> Self {
        Self {
            field: '|',
            component: '^',
            repetition: '~',
            escape: '\\',
            subcomponent: '&',
        }
    }
}

impl EncodingProfile {
    /// Builds a profile from explicit characters, validating them
    pub fn new(
        field: char,
        component: char,
        repetition: char,
        escape: char,
        subcomponent: char,
    ) -> Result<Self, ParseError> {
        let profile = Self {
            field,
            component,
            repetition,
            escape,
            subcomponent,
        };
        profile.validate()?;
        Ok(profile)
    }

    /// Derives the profile from the header of a raw message
    ///
    /// Leading blank lines are ignored. The header must be the first segment.
    pub fn from_message(raw: &str) -> Result<Self, ParseError> {
        let header = raw
            .split(['\r', '\n'])
            .find(|line| !line.trim().is_empty())
            .ok_or_else(|| ParseError::MalformedHeader("message is empty".to_string()))?;

        let header = header.trim_start_matches('\u{feff}');
        if !header.starts_with("MSH") {
            let name: String = header.chars().take(3).collect();
            return Err(ParseError::MalformedHeader(format!(
                "first segment is {name:?}, expected MSH"
            )));
        }

        let chars: Vec<char> = header.chars().skip(3).take(6).collect();
        if chars.len() < 5 {
            return Err(ParseError::MalformedHeader(format!(
                "header too short to declare separators: {header:?}"
            )));
        }
        if let Some(&after) = chars.get(5) {
            if after != chars[0] {
                return Err(ParseError::MalformedHeader(format!(
                    "encoding characters must be followed by the field separator, found {after:?}"
                )));
            }
        }

        Self::new(chars[0], chars[1], chars[2], chars[3], chars[4])
    }

    fn validate(&self) -> Result<(), ParseError> {
        let all = self.chars();
        for (i, c) in all.iter().enumerate() {
            if !c.is_ascii_graphic() || c.is_ascii_alphanumeric() {
                return Err(ParseError::MalformedHeader(format!(
                    "separator {c:?} is not a printable symbol"
                )));
            }
            if all[..i].contains(c) {
                return Err(ParseError::MalformedHeader(format!(
                    "separator {c:?} is declared twice"
                )));
            }
        }
        Ok(())
    }

    pub fn field(&self) -> char {
        self.field
    }

    pub fn component(&self) -> char {
        self.component
    }

    pub fn repetition(&self) -> char {
        self.repetition
    }

    pub fn escape(&self) -> char {
        self.escape
    }

    pub fn subcomponent(&self) -> char {
        self.subcomponent
    }

    /// All five separators in header order (field first)
    pub fn chars(&self) -> [char; 5] {
        [
            self.field,
            self.component,
            self.repetition,
            self.escape,
            self.subcomponent,
        ]
    }

    /// The MSH-2 value this profile declares
    pub fn encoding_characters(&self) -> String {
        [self.component, self.repetition, self.escape, self.subcomponent]
            .iter()
            .collect()
    }
}

impl fmt::Display for EncodingProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.field, self.encoding_characters())
    }
}
