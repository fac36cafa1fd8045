//! Pieces shared by every event builder
//!
//! Patient demographics, order grouping, date formatting and the small
//! helpers that turn optional field reads into typed values.

use crate::core::codes::CodeResolver;
use crate::core::parse::{Field, Locator, Message, Segment};
use crate::domain::errors::TransformError;
use crate::domain::ids::{ResourceId, MAX_RESOURCE_ID_LEN};
use crate::domain::resource::{
    Address, AdministrativeGender, ContactPoint, HumanName, Identifier, Patient,
};
use chrono::{NaiveDate, NaiveTime};
use std::collections::HashSet;

/// Everything a builder reads from, plus the event label used in errors
pub struct BuildContext<'a> {
    pub message: &'a Message,
    pub resolver: &'a CodeResolver,
    pub event: String,
}

impl<'a> BuildContext<'a> {
    pub fn new(message: &'a Message, resolver: &'a CodeResolver) -> Self {
        Self {
            message,
            resolver,
            event: message.header().event_label(),
        }
    }

    /// First occurrence of `name`, or `MissingRequiredSegment`
    pub fn required_segment(&self, name: &str) -> Result<&'a Segment, TransformError> {
        self.message
            .segment(name, 1)
            .ok_or_else(|| TransformError::MissingRequiredSegment {
                event: self.event.clone(),
                segment: name.to_string(),
            })
    }

    pub fn missing_field(&self, locator: &Locator) -> TransformError {
        TransformError::MissingRequiredField {
            event: self.event.clone(),
            locator: locator.to_string(),
        }
    }

    pub fn unmapped_status(&self, locator: &Locator, code: &str) -> TransformError {
        TransformError::UnmappedStatus {
            event: self.event.clone(),
            locator: locator.to_string(),
            code: code.to_string(),
        }
    }
}

/// Locator of field `f` in the given segment occurrence
pub fn locate(segment: &Segment, f: usize) -> Locator {
    Locator::new(segment.name(), f).at_occurrence(segment.occurrence())
}

/// Trimmed, non-empty component value
pub fn value(segment: &Segment, f: usize, c: usize) -> Option<&str> {
    segment
        .component(f, c)
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Like [`value`] but tolerates an absent segment
pub fn opt_value<'a>(segment: Option<&'a Segment>, f: usize, c: usize) -> Option<&'a str> {
    segment.and_then(|s| value(s, f, c))
}

/// Id derived from a prefix, a base id and an ordinal
///
/// `base` is shortened so the prefix and ordinal always fit the id length
/// limit; distinct ordinals give distinct ids.
pub fn derived_id(prefix: &str, base: &ResourceId, ordinal: Option<usize>) -> ResourceId {
    let room = MAX_RESOURCE_ID_LEN.saturating_sub(prefix.len() + 1);
    let base_part: String = base.as_str().chars().take(room).collect();
    let prefixed =
        ResourceId::sanitized(&format!("{prefix}-{base_part}")).unwrap_or_else(|| base.clone());
    match ordinal {
        Some(n) => with_ordinal(&prefixed, n),
        None => prefixed,
    }
}

/// `{id}-{n}`, cutting `id` when needed to keep the suffix
fn with_ordinal(id: &ResourceId, n: usize) -> ResourceId {
    let suffix = format!("-{n}");
    let room = MAX_RESOURCE_ID_LEN.saturating_sub(suffix.len());
    let head: String = id.as_str().chars().take(room).collect();
    let head = head.trim_end_matches('-');
    ResourceId::sanitized(&format!("{head}{suffix}")).unwrap_or_else(|| id.clone())
}

/// Ids handed out within one conversion
///
/// A repeated id gets `-2`, `-3`, ... appended so every `Kind/id` stays a
/// distinct reference target.
#[derive(Debug, Default)]
pub struct IdPool {
    taken: HashSet<ResourceId>,
}

impl IdPool {
    pub fn claim(&mut self, id: ResourceId) -> ResourceId {
        let mut candidate = id.clone();
        let mut n = 1;
        while self.taken.contains(&candidate) {
            n += 1;
            candidate = with_ordinal(&id, n);
        }
        self.taken.insert(candidate.clone());
        candidate
    }
}

/// Packed date (`YYYY[MM[DD]]...`) to `YYYY`, `YYYY-MM` or `YYYY-MM-DD`
///
/// Anything past the day is ignored. Invalid calendar dates give `None`.
pub fn format_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let digits: String = raw.chars().take_while(char::is_ascii_digit).collect();
    match digits.len() {
        0..=3 => None,
        4 | 5 => Some(digits[..4].to_string()),
        6 | 7 => {
            let month: u32 = digits[4..6].parse().ok()?;
            (1..=12)
                .contains(&month)
                .then(|| format!("{}-{}", &digits[..4], &digits[4..6]))
        }
        _ => {
            let date = NaiveDate::from_ymd_opt(
                digits[..4].parse().ok()?,
                digits[4..6].parse().ok()?,
                digits[6..8].parse().ok()?,
            )?;
            Some(date.format("%Y-%m-%d").to_string())
        }
    }
}

/// HL7 timestamp to a FHIR dateTime
///
/// Date-only values stay dates. With a time part the result is
/// `YYYY-MM-DDThh:mm:ss` plus the declared offset, or `+00:00` when none
/// was sent.
pub fn format_datetime(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let (body, offset) = match raw.find(['+', '-']) {
        Some(i) => (&raw[..i], Some(&raw[i..])),
        None => (raw, None),
    };
    let (clock, fraction) = match body.find('.') {
        Some(i) => (&body[..i], Some(&body[i + 1..])),
        None => (body, None),
    };
    if !clock.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let offset = format_offset(offset)?;
    if clock.len() <= 8 {
        return format_date(clock);
    }
    if !matches!(clock.len(), 10 | 12 | 14) {
        return None;
    }

    let date = format_date(&clock[..8]).filter(|d| d.len() == 10)?;
    let part = |range: std::ops::Range<usize>| -> Option<u32> {
        clock.get(range).map(|s| s.parse().ok()).unwrap_or(Some(0))
    };
    let time = NaiveTime::from_hms_opt(part(8..10)?, part(10..12)?, part(12..14)?)?;

    let mut out = format!("{date}T{}", time.format("%H:%M:%S"));
    if let Some(fraction) = fraction.filter(|f| !f.is_empty()) {
        if !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        out.push('.');
        out.push_str(fraction);
    }
    out.push_str(&offset);
    Some(out)
}

fn format_offset(offset: Option<&str>) -> Option<String> {
    let Some(offset) = offset else {
        return Some("+00:00".to_string());
    };
    let (sign, digits) = offset.split_at(1);
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hours: u32 = digits[..2].parse().ok()?;
    let minutes: u32 = digits[2..].parse().ok()?;
    (hours <= 14 && minutes < 60).then(|| format!("{sign}{}:{}", &digits[..2], &digits[2..]))
}

/// Every repetition of a field rendered as text, components joined by the
/// message's component separator
pub fn field_text(field: &Field, component_separator: char) -> Vec<String> {
    field
        .repetitions()
        .iter()
        .map(|rep| {
            let parts: Vec<&str> = rep.components().iter().map(|c| c.text()).collect();
            parts
                .join(&component_separator.to_string())
                .trim_end_matches(component_separator)
                .trim()
                .to_string()
        })
        .filter(|s| !s.is_empty())
        .collect()
}

/// Builds the Patient from PID
pub fn build_patient(ctx: &BuildContext<'_>) -> Result<Patient, TransformError> {
    let pid = ctx.required_segment("PID")?;

    let mut identifier = Vec::new();
    let mut id = None;
    for rep in pid.field(3).map(Field::repetitions).unwrap_or_default() {
        let raw = rep.text(1).trim();
        if raw.is_empty() {
            continue;
        }
        if id.is_none() {
            id = ResourceId::sanitized(raw);
        }
        identifier.push(Identifier::new(raw).with_system(rep.text(4).trim()));
    }
    let id = id.ok_or_else(|| ctx.missing_field(&locate(pid, 3).at_component(1)))?;

    let name = pid
        .field(5)
        .map(Field::repetitions)
        .unwrap_or_default()
        .iter()
        .filter_map(|rep| {
            let family = Some(rep.text(1).trim()).filter(|s| !s.is_empty());
            let given: Vec<String> = [rep.text(2), rep.text(3)]
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            (family.is_some() || !given.is_empty()).then(|| HumanName {
                family: family.map(str::to_string),
                given,
            })
        })
        .collect();

    let gender = value(pid, 8, 1).and_then(|sex| match sex.to_ascii_uppercase().as_str() {
        "M" => Some(AdministrativeGender::Male),
        "F" => Some(AdministrativeGender::Female),
        "O" => Some(AdministrativeGender::Other),
        _ => None,
    });

    let address = pid
        .field(11)
        .map(Field::repetitions)
        .unwrap_or_default()
        .iter()
        .map(|rep| {
            let part = |c: usize| Some(rep.text(c).trim()).filter(|s| !s.is_empty()).map(str::to_string);
            Address {
                line: [1, 2].into_iter().filter_map(part).collect(),
                city: part(3),
                state: part(4),
                postal_code: part(5),
                country: part(6),
            }
        })
        .filter(|a| !a.is_empty())
        .collect();

    let telecom = pid
        .field(13)
        .map(Field::repetitions)
        .unwrap_or_default()
        .iter()
        .map(|rep| rep.text(1).trim())
        .filter(|s| !s.is_empty())
        .map(ContactPoint::phone)
        .collect();

    Ok(Patient {
        id,
        identifier,
        name,
        gender,
        birth_date: value(pid, 7, 1).and_then(format_date),
        address,
        telecom,
    })
}

/// One order: an ORC with its OBR and the OBX lines that follow
#[derive(Debug, Default)]
pub struct OrderGroup<'a> {
    pub orc: Option<&'a Segment>,
    pub obr: Option<&'a Segment>,
    pub observations: Vec<&'a Segment>,
}

/// Splits the body into order groups in wire order
///
/// An ORC opens a group and the next OBR joins it. Any further OBR opens a
/// new group under the same ORC; an OBR before any ORC has none. OBX lines
/// belong to the latest group.
pub fn order_groups(message: &Message) -> Vec<OrderGroup<'_>> {
    let mut groups: Vec<OrderGroup<'_>> = Vec::new();
    for segment in message.segments() {
        match segment.name() {
            "ORC" => groups.push(OrderGroup {
                orc: Some(segment),
                ..OrderGroup::default()
            }),
            "OBR" => match groups.last_mut() {
                Some(g) if g.orc.is_some() && g.obr.is_none() && g.observations.is_empty() => {
                    g.obr = Some(segment);
                }
                last => {
                    let orc = last.and_then(|g| g.orc);
                    groups.push(OrderGroup {
                        orc,
                        obr: Some(segment),
                        ..OrderGroup::default()
                    });
                }
            },
            "OBX" => match groups.last_mut() {
                Some(g) => g.observations.push(segment),
                None => groups.push(OrderGroup {
                    observations: vec![segment],
                    ..OrderGroup::default()
                }),
            },
            _ => {}
        }
    }
    groups
}

/// OBR-2 / OBR-3 (or ORC-2 / ORC-3 first, when given) as identifiers
pub fn order_identifiers(orc: Option<&Segment>, obr: Option<&Segment>) -> Vec<Identifier> {
    [2, 3]
        .into_iter()
        .filter_map(|f| opt_value(orc, f, 1).or_else(|| opt_value(obr, f, 1)))
        .map(Identifier::new)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parse::parse_message;
    use test_case::test_case;

    #[test_case("19700101", Some("1970-01-01") ; "full date")]
    #[test_case("197001011230", Some("1970-01-01") ; "timestamp truncated")]
    #[test_case("197001", Some("1970-01") ; "month")]
    #[test_case("1970", Some("1970") ; "year")]
    #[test_case("19701301", None ; "bad month")]
    #[test_case("19700230", None ; "bad day")]
    #[test_case("197013", None ; "bad month only")]
    #[test_case("19", None ; "too short")]
    #[test_case("abc", None ; "not digits")]
    #[test_case("", None ; "empty")]
    fn test_format_date(raw: &str, expected: Option<&str>) {
        assert_eq!(format_date(raw).as_deref(), expected);
    }

    #[test_case("20250101", Some("2025-01-01") ; "date only")]
    #[test_case("202501011230", Some("2025-01-01T12:30:00+00:00") ; "minutes")]
    #[test_case("20250101123045", Some("2025-01-01T12:30:45+00:00") ; "seconds")]
    #[test_case("2025010112", Some("2025-01-01T12:00:00+00:00") ; "hours")]
    #[test_case("20250101123045.123", Some("2025-01-01T12:30:45.123+00:00") ; "fraction")]
    #[test_case("20250101123045-0500", Some("2025-01-01T12:30:45-05:00") ; "offset")]
    #[test_case("202501011260", None ; "bad minute")]
    #[test_case("20250101123045+5", None ; "bad offset")]
    #[test_case("2025-01-01", None ; "iso input")]
    fn test_format_datetime(raw: &str, expected: Option<&str>) {
        assert_eq!(format_datetime(raw).as_deref(), expected);
    }

    fn msg(body: &str) -> Message {
        parse_message(&format!(
            "MSH|^~\\&|EPIC|HOSP|LIS|LAB|202501011230||ADT^A01|MSG001|P|2.5\r{body}"
        ))
        .unwrap()
    }

    #[test]
    fn test_build_patient_full() {
        let m = msg("PID|1||12345^^^HOSP^MR~SSN1^^^SSA||Doe^John^Q~Roe^Jane||19700101|M|||1 Main St^Apt 2^Springfield^IL^62701^USA||555-1234");
        let resolver = CodeResolver::default();
        let patient = build_patient(&BuildContext::new(&m, &resolver)).unwrap();
        assert_eq!(patient.id.as_str(), "12345");
        assert_eq!(patient.identifier.len(), 2);
        assert_eq!(patient.identifier[0].system.as_deref(), Some("HOSP"));
        assert_eq!(patient.name[0].family.as_deref(), Some("Doe"));
        assert_eq!(patient.name[0].given, vec!["John", "Q"]);
        assert_eq!(patient.name[1].given, vec!["Jane"]);
        assert_eq!(patient.gender, Some(AdministrativeGender::Male));
        assert_eq!(patient.birth_date.as_deref(), Some("1970-01-01"));
        assert_eq!(patient.address[0].line, vec!["1 Main St", "Apt 2"]);
        assert_eq!(patient.address[0].postal_code.as_deref(), Some("62701"));
        assert_eq!(patient.telecom[0].value, "555-1234");
    }

    #[test_case("U" ; "unknown")]
    #[test_case("" ; "absent")]
    #[test_case("X" ; "unrecognised")]
    fn test_gender_omitted(sex: &str) {
        let m = msg(&format!("PID|1||1||A^B||19700101|{sex}"));
        let resolver = CodeResolver::default();
        let patient = build_patient(&BuildContext::new(&m, &resolver)).unwrap();
        assert!(patient.gender.is_none());
    }

    #[test]
    fn test_patient_requires_pid() {
        let m = msg("PV1|1|I");
        let resolver = CodeResolver::default();
        let err = build_patient(&BuildContext::new(&m, &resolver)).unwrap_err();
        assert_eq!(
            err,
            TransformError::MissingRequiredSegment {
                event: "ADT^A01".to_string(),
                segment: "PID".to_string()
            }
        );
    }

    #[test]
    fn test_patient_requires_identifier() {
        let m = msg("PID|1||^^^HOSP||Doe^John");
        let resolver = CodeResolver::default();
        let err = build_patient(&BuildContext::new(&m, &resolver)).unwrap_err();
        assert!(matches!(
            err,
            TransformError::MissingRequiredField { ref locator, .. } if locator == "PID-3.1"
        ));
    }

    #[test]
    fn test_order_groups() {
        let m = msg("PID|1||1\rORC|NW|P1\rOBR|1|P1||GLU\rOBX|1\rOBX|2\rOBR|2|P2||K\rOBX|3\rORC|NW|P3");
        let groups = order_groups(&m);
        assert_eq!(groups.len(), 3);
        assert!(groups[0].orc.is_some() && groups[0].obr.is_some());
        assert_eq!(groups[0].observations.len(), 2);
        // second OBR stays under the first ORC
        assert_eq!(groups[1].orc.map(Segment::occurrence), Some(1));
        assert_eq!(groups[1].observations.len(), 1);
        assert!(groups[2].obr.is_none());

        let m = msg("PID|1||1\rOBR|1|A\rOBR|2|B");
        assert!(order_groups(&m).iter().all(|g| g.orc.is_none()));
    }

    #[test]
    fn test_field_text_joins_components() {
        let m = msg("OBX|1|CE|X||POS^Positive^L~NEG^^");
        let field = m.field("OBX", 5).unwrap();
        assert_eq!(field_text(field, '^'), vec!["POS^Positive^L", "NEG"]);
    }

    #[test]
    fn test_derived_id() {
        let base = ResourceId::new("12345").unwrap();
        assert_eq!(derived_id("obs", &base, Some(2)).as_str(), "obs-12345-2");
        assert_eq!(derived_id("enc", &base, None).as_str(), "enc-12345");
    }

    #[test]
    fn test_derived_id_keeps_ordinal_for_long_base() {
        let base = ResourceId::new("P".repeat(MAX_RESOURCE_ID_LEN)).unwrap();
        let first = derived_id("obs", &base, Some(1));
        let tenth = derived_id("obs", &base, Some(10));
        assert_ne!(first, tenth);
        assert!(first.as_str().starts_with("obs-PPP"));
        assert!(first.as_str().ends_with("-1"));
        assert!(tenth.as_str().ends_with("-10"));
        assert_eq!(tenth.as_str().len(), MAX_RESOURCE_ID_LEN);
        assert_eq!(derived_id("enc", &base, None).as_str().len(), MAX_RESOURCE_ID_LEN);
    }

    #[test]
    fn test_id_pool_suffixes_repeats() {
        let mut pool = IdPool::default();
        let id = ResourceId::new("P1").unwrap();
        assert_eq!(pool.claim(id.clone()).as_str(), "P1");
        assert_eq!(pool.claim(id.clone()).as_str(), "P1-2");
        assert_eq!(pool.claim(id).as_str(), "P1-3");
        // an id that already looks suffixed is still unique
        assert_eq!(pool.claim(ResourceId::new("P1-2").unwrap()).as_str(), "P1-2-2");
    }
}
