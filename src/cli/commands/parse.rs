//! Parse command implementation
//!
//! Prints a parsed message one segment per line, or the values at the
//! requested locators.

use super::read_input;
use crate::cli::{EXIT_CONVERSION_FAILED, EXIT_OK, EXIT_USAGE};
use crate::core::parse::{parse_message, Locator, Message};
use clap::Args;
use std::str::FromStr;

/// Arguments for the parse command
#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Message file, or `-` for stdin
    pub input: String,

    /// Print only the value at this locator (e.g. PID-5.1, OBX[2]-5); repeatable
    #[arg(long, value_name = "LOCATOR")]
    pub field: Vec<String>,
}

/// One line per segment, re-encoded with the message's own separators
pub fn render_segments(message: &Message) -> Vec<String> {
    message
        .segments()
        .iter()
        .map(|s| s.encode(message.profile()))
        .collect()
}

/// `LOCATOR<TAB>value` per locator; absent values print empty
pub fn render_fields(message: &Message, locators: &[Locator]) -> Vec<String> {
    locators
        .iter()
        .map(|l| format!("{l}\t{}", message.text(l)))
        .collect()
}

impl ParseArgs {
    /// Execute the parse command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        let locators = match self
            .field
            .iter()
            .map(|f| Locator::from_str(f))
            .collect::<Result<Vec<_>, _>>()
        {
            Ok(locators) => locators,
            Err(e) => {
                eprintln!("Error: {e}");
                return Ok(EXIT_USAGE);
            }
        };

        let raw = match read_input(&self.input) {
            Ok(raw) => raw,
            Err(e) => {
                eprintln!("Error: {e:#}");
                return Ok(EXIT_USAGE);
            }
        };

        let message = match parse_message(&raw) {
            Ok(message) => message,
            Err(e) => {
                tracing::error!(error = %e, input = %self.input, "Failed to parse message");
                eprintln!("Error: [{}] {e}", e.rule());
                return Ok(EXIT_CONVERSION_FAILED);
            }
        };

        let lines = if locators.is_empty() {
            render_segments(&message)
        } else {
            render_fields(&message, &locators)
        };
        for line in lines {
            println!("{line}");
        }
        Ok(EXIT_OK)
    }
}
