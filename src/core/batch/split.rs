//! Splitting a multi-message input into single messages
//!
//! Every `MSH` line starts a new message. File and batch envelope segments
//! (`FHS`, `BHS`, `BTS`, `FTS`) are dropped. Lines before the first `MSH`
//! are kept as a message of their own so the parser can report them rather
//! than having them vanish silently.

use crate::core::parse::tokenizer::split_lines;

const ENVELOPE_SEGMENTS: &[&str] = &["FHS", "BHS", "BTS", "FTS"];

fn starts_segment(line: &str, name: &str) -> bool {
    line.strip_prefix(name)
        .map(|rest| rest.chars().next().map_or(true, |c| !c.is_ascii_alphanumeric()))
        .unwrap_or(false)
}

/// Splits `raw` into messages, each re-joined with `\r` terminators
///
/// # Examples
///
/// ```
/// use v2fhir::core::batch::split_messages;
///
/// let raw = "MSH|^~\\&|A\nPID|1\nMSH|^~\\&|B\nPID|2\n";
/// let messages = split_messages(raw);
/// assert_eq!(messages, ["MSH|^~\\&|A\rPID|1", "MSH|^~\\&|B\rPID|2"]);
/// ```
pub fn split_messages(raw: &str) -> Vec<String> {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let mut messages: Vec<Vec<&str>> = Vec::new();

    for (_, line) in split_lines(raw) {
        if line.trim().is_empty() {
            continue;
        }
        if ENVELOPE_SEGMENTS.iter().any(|s| starts_segment(line, s)) {
            continue;
        }
        match messages.last_mut() {
            Some(current) if !starts_segment(line, "MSH") => current.push(line),
            _ => messages.push(vec![line]),
        }
    }

    messages.into_iter().map(|lines| lines.join("\r")).collect()
}
