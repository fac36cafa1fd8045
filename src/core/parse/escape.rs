//! Escape sequence codec
//!
//! Decoding runs on one sub-component at a time, after delimiting, so an
//! escaped separator can never split a value.

use super::encoding::EncodingProfile;
use std::borrow::Cow;

/// Decodes the escape sequences in one delimited value
///
/// `\F\ \S\ \R\ \E\ \T\` become the separators, `\.br\` a newline, `\H\` and
/// `\N\` are dropped and `\Xhh..\` becomes the hex-encoded bytes. Unknown or
/// unterminated sequences are kept as written.
pub fn decode<'a>(text: &'a str, profile: &EncodingProfile) -> Cow<'a, str> {
    let esc = profile.escape();
    if !text.contains(esc) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find(esc) {
        out.push_str(&rest[..start]);
        let after = &rest[start + esc.len_utf8()..];
        let Some(end) = after.find(esc) else {
            // unterminated
            out.push_str(&rest[start..]);
            return Cow::Owned(out);
        };
        let sequence = &after[..end];
        match decode_sequence(sequence, profile) {
            Some(decoded) => out.push_str(&decoded),
            None => {
                out.push(esc);
                out.push_str(sequence);
                out.push(esc);
            }
        }
        rest = &after[end + esc.len_utf8()..];
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn decode_sequence(sequence: &str, profile: &EncodingProfile) -> Option<String> {
    let decoded = match sequence {
        "F" => profile.field().to_string(),
        "S" => profile.component().to_string(),
        "R" => profile.repetition().to_string(),
        "E" => profile.escape().to_string(),
        "T" => profile.subcomponent().to_string(),
        ".br" => "\n".to_string(),
        "H" | "N" => String::new(),
        _ => {
            let hex = sequence.strip_prefix('X')?;
            decode_hex(hex)?
        }
    };
    Some(decoded)
}

fn decode_hex(hex: &str) -> Option<String> {
    if hex.is_empty() || hex.len() % 2 != 0 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let bytes = (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16))
        .collect::<Result<Vec<u8>, _>>()
        .ok()?;
    Some(String::from_utf8_lossy(&bytes).into_owned())
}

/// Escapes separators and line breaks so `decode` restores the input
pub fn escape(text: &str, profile: &EncodingProfile) -> String {
    let mut out = String::with_capacity(text.len());
    let esc = profile.escape();
    for c in text.chars() {
        let code = if c == profile.field() {
            Some("F")
        } else if c == profile.component() {
            Some("S")
        } else if c == profile.repetition() {
            Some("R")
        } else if c == esc {
            Some("E")
        } else if c == profile.subcomponent() {
            Some("T")
        } else if c == '\n' {
            Some(".br")
        } else if c == '\r' {
            Some("X0D")
        } else {
            None
        };
        match code {
            Some(code) => {
                out.push(esc);
                out.push_str(code);
                out.push(esc);
            }
            None => out.push(c),
        }
    }
    out
}
