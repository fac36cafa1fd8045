//! Segment tokenizer
//!
//! Splits raw text into segments, then each segment into fields,
//! repetitions, components and sub-components. Escape sequences are decoded
//! per sub-component once all delimiting is done.

use super::encoding::EncodingProfile;
use super::escape::decode;
use super::message::{Component, Field, Repetition, Segment};
use crate::domain::errors::ParseError;
use std::collections::HashMap;

/// Splits on `\r\n`, `\r` or `\n`, returning `(line_number, line)` pairs
///
/// Line numbers are 1-based and count every physical line, blank ones
/// included.
pub fn split_lines(raw: &str) -> Vec<(usize, &str)> {
    let bytes = raw.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\r' => {
                lines.push(&raw[start..i]);
                if bytes.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
                start = i + 1;
            }
            b'\n' => {
                lines.push(&raw[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    if start < raw.len() {
        lines.push(&raw[start..]);
    }
    lines
        .into_iter()
        .enumerate()
        .map(|(i, line)| (i + 1, line))
        .collect()
}

/// Checks that `line` starts with `[A-Z][A-Z0-9]{2}` followed by the field
/// separator or the end of the line, returning the name
pub fn segment_name(line: &str, field_separator: char) -> Option<&str> {
    let mut chars = line.chars();
    let first = chars.next()?;
    if !first.is_ascii_uppercase() {
        return None;
    }
    for _ in 0..2 {
        let c = chars.next()?;
        if !(c.is_ascii_uppercase() || c.is_ascii_digit()) {
            return None;
        }
    }
    match chars.next() {
        None => Some(line),
        Some(c) if c == field_separator => Some(&line[..3]),
        Some(_) => None,
    }
}

/// Tokenizes one message into segments
///
/// The first segment is the header; a second header is rejected, as is a
/// header with nothing after it.
pub fn tokenize(raw: &str, profile: &EncodingProfile) -> Result<Vec<Segment>, ParseError> {
    let raw = raw.trim_start_matches('\u{feff}');
    let mut segments: Vec<Segment> = Vec::new();
    let mut occurrences: HashMap<String, usize> = HashMap::new();

    for (line_no, line) in split_lines(raw) {
        if line.trim().is_empty() {
            continue;
        }
        let name = segment_name(line, profile.field()).ok_or_else(|| {
            ParseError::EmptySegmentName {
                line: line_no,
                content: line.chars().take(40).collect(),
            }
        })?;

        if name == "MSH" && !segments.is_empty() {
            return Err(ParseError::MalformedHeader(format!(
                "second MSH segment at line {line_no}"
            )));
        }
        if segments.is_empty() && name != "MSH" {
            return Err(ParseError::MalformedHeader(format!(
                "first segment is {name}, expected MSH"
            )));
        }

        let occurrence = occurrences.entry(name.to_string()).or_insert(0);
        *occurrence += 1;
        let fields = split_fields(name, &line[name.len()..], profile);
        segments.push(Segment::new(name, *occurrence, fields));
    }

    match segments.len() {
        0 => Err(ParseError::MalformedHeader("message is empty".to_string())),
        1 => Err(ParseError::TruncatedMessage {
            control_id: segments[0].text(10, 1).to_string(),
        }),
        _ => Ok(segments),
    }
}

/// `rest` is the line after the segment name, starting at the first field
/// separator (or empty)
fn split_fields(name: &str, rest: &str, profile: &EncodingProfile) -> Vec<Field> {
    let Some(body) = rest.strip_prefix(profile.field()) else {
        return Vec::new();
    };
    let mut raw_fields = body.split(profile.field());

    if name != "MSH" {
        return raw_fields.map(|f| split_field(f, profile)).collect();
    }

    let mut fields = vec![Field::verbatim(&profile.field().to_string())];
    if let Some(encoding_chars) = raw_fields.next() {
        fields.push(Field::verbatim(encoding_chars));
    }
    fields.extend(raw_fields.map(|f| split_field(f, profile)));
    fields
}

fn split_field(raw: &str, profile: &EncodingProfile) -> Field {
    if raw.is_empty() {
        return Field::default();
    }
    let repetitions = raw
        .split(profile.repetition())
        .map(|rep| {
            Repetition::new(
                rep.split(profile.component())
                    .map(|comp| {
                        Component::new(
                            comp.split(profile.subcomponent())
                                .map(|sub| decode(sub, profile).into_owned())
                                .collect(),
                        )
                    })
                    .collect(),
            )
        })
        .collect();
    Field::new(repetitions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn tokens(raw: &str) -> Result<Vec<Segment>, ParseError> {
        tokenize(raw, &EncodingProfile::from_message(raw)?)
    }

    #[test_case("a\rb\rc" ; "carriage return")]
    #[test_case("a\r\nb\r\nc" ; "crlf")]
    #[test_case("a\nb\nc\n" ; "line feed with trailing")]
    #[test_case("a\r\nb\nc\r" ; "mixed")]
    fn test_split_lines(raw: &str) {
        let lines: Vec<&str> = split_lines(raw).into_iter().map(|(_, l)| l).collect();
        assert_eq!(lines, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_split_lines_numbers_blank_lines() {
        let lines = split_lines("a\n\nb");
        assert_eq!(lines, vec![(1, "a"), (2, ""), (3, "b")]);
    }

    #[test_case("PID|1", Some("PID") ; "with fields")]
    #[test_case("PV1", Some("PV1") ; "bare name")]
    #[test_case("ZX9|", Some("ZX9") ; "custom segment")]
    #[test_case("pid|1", None ; "lower case")]
    #[test_case("1ID|1", None ; "leading digit")]
    #[test_case("PI|1", None ; "two letters")]
    #[test_case("PIDX|1", None ; "four letters")]
    #[test_case("|||", None ; "no name")]
    fn test_segment_name(line: &str, expected: Option<&str>) {
        assert_eq!(segment_name(line, '|'), expected);
    }

    #[test]
    fn test_blank_lines_skipped_and_occurrences_counted() {
        let segs = tokens("MSH|^~\\&|A\r\n\r\nOBX|1\r\n   \r\nOBX|2\r\nNTE|1").unwrap();
        let summary: Vec<(&str, usize)> = segs.iter().map(|s| (s.name(), s.occurrence())).collect();
        assert_eq!(summary, vec![("MSH", 1), ("OBX", 1), ("OBX", 2), ("NTE", 1)]);
    }

    #[test]
    fn test_bad_segment_name_reports_line() {
        let err = tokens("MSH|^~\\&|A\n\nPID|1\nbad line").unwrap_err();
        assert_eq!(
            err,
            ParseError::EmptySegmentName {
                line: 4,
                content: "bad line".to_string()
            }
        );
    }

    #[test]
    fn test_header_only_is_truncated() {
        let err = tokens("MSH|^~\\&|A|B|C|D|20250101||ADT^A01|CTRL9|P|2.5\r\n").unwrap_err();
        assert_eq!(
            err,
            ParseError::TruncatedMessage {
                control_id: "CTRL9".to_string()
            }
        );
    }

    #[test]
    fn test_second_header_rejected() {
        let err = tokens("MSH|^~\\&|A\rPID|1\rMSH|^~\\&|B\rPID|2").unwrap_err();
        assert!(matches!(err, ParseError::MalformedHeader(m) if m.contains("line 3")));
    }

    #[test]
    fn test_escaped_separator_does_not_split() {
        let segs = tokens("MSH|^~\\&|A\rNTE|1||a\\F\\b\\S\\c\\R\\d").unwrap();
        let nte = &segs[1];
        assert_eq!(nte.fields().len(), 3);
        let field = nte.field(3).unwrap();
        assert_eq!(field.repetitions().len(), 1);
        assert_eq!(field.repetition(1).unwrap().components().len(), 1);
        assert_eq!(nte.text(3, 1), "a|b^c~d");
    }

    #[test]
    fn test_field_with_one_empty_component_differs_from_empty_field() {
        let segs = tokens("MSH|^~\\&|A\rZZZ||^|~").unwrap();
        let z = &segs[1];
        assert!(z.field(1).unwrap().is_empty());
        let comp_only = z.field(2).unwrap();
        assert_eq!(comp_only.repetitions().len(), 1);
        assert_eq!(comp_only.repetition(1).unwrap().components().len(), 2);
        assert_eq!(z.field(3).unwrap().repetitions().len(), 2);
    }

    #[test]
    fn test_custom_profile_tokenizes() {
        let segs = tokens("MSH#*!@%#APP#FAC\rPID#1##123*X!456").unwrap();
        let pid = &segs[1];
        assert_eq!(pid.text(3, 1), "123");
        assert_eq!(pid.text(3, 2), "X");
        assert_eq!(pid.field(3).unwrap().repetition(2).unwrap().text(1), "456");
        assert_eq!(segs[0].text(2, 1), "*!@%");
    }

    #[test]
    fn test_bare_segment_has_no_fields() {
        let segs = tokens("MSH|^~\\&|A\rPV1").unwrap();
        assert!(segs[1].fields().is_empty());
        assert_eq!(segs[1].text(2, 1), "");
    }
}
