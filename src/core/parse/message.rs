//! Addressable message tree
//!
//! A [`Message`] owns its segments; every accessor borrows. Field, component
//! and sub-component numbers are 1-based HL7 positions, and any position that
//! does not exist reads as absent (`None`) or as an empty string through the
//! `text` accessors.

use super::encoding::EncodingProfile;
use super::escape::escape;
use super::locator::Locator;
use crate::domain::ids::EventKey;

/// One component: its ordered, decoded sub-components
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    subcomponents: Vec<String>,
}

impl Component {
    pub(crate) fn new(subcomponents: Vec<String>) -> Self {
        Self { subcomponents }
    }

    pub fn subcomponents(&self) -> &[String] {
        &self.subcomponents
    }

    pub fn subcomponent(&self, s: usize) -> Option<&str> {
        nth(&self.subcomponents, s).map(String::as_str)
    }

    /// First sub-component, or empty
    pub fn text(&self) -> &str {
        self.subcomponent(1).unwrap_or("")
    }
}

/// One repetition: its ordered components
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repetition {
    components: Vec<Component>,
}

impl Repetition {
    pub(crate) fn new(components: Vec<Component>) -> Self {
        Self { components }
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn component(&self, c: usize) -> Option<&Component> {
        nth(&self.components, c)
    }

    /// First sub-component of component `c`, or empty
    pub fn text(&self, c: usize) -> &str {
        self.component(c).map(Component::text).unwrap_or("")
    }
}

/// One field: its ordered repetitions
///
/// An empty field has no repetitions at all, which is not the same thing as
/// a field holding one empty component.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Field {
    repetitions: Vec<Repetition>,
}

impl Field {
    pub(crate) fn new(repetitions: Vec<Repetition>) -> Self {
        Self { repetitions }
    }

    /// A single-valued field stored without splitting or decoding
    pub(crate) fn verbatim(value: &str) -> Self {
        Self::new(vec![Repetition::new(vec![Component::new(vec![
            value.to_string(),
        ])])])
    }

    pub fn repetitions(&self) -> &[Repetition] {
        &self.repetitions
    }

    pub fn repetition(&self, r: usize) -> Option<&Repetition> {
        nth(&self.repetitions, r)
    }

    pub fn is_empty(&self) -> bool {
        self.repetitions.is_empty()
    }

    /// Component `c` of the first repetition
    pub fn component(&self, c: usize) -> Option<&str> {
        self.repetition(1)?.component(c)?.subcomponent(1)
    }
}

/// One segment line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    name: String,
    occurrence: usize,
    fields: Vec<Field>,
}

impl Segment {
    pub(crate) fn new(name: impl Into<String>, occurrence: usize, fields: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            occurrence,
            fields,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 1-based index among segments with the same name
    pub fn occurrence(&self) -> usize {
        self.occurrence
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Field `f` (HL7 numbering)
    pub fn field(&self, f: usize) -> Option<&Field> {
        nth(&self.fields, f)
    }

    /// Component `c` of the first repetition of field `f`
    pub fn component(&self, f: usize, c: usize) -> Option<&str> {
        self.field(f)?.component(c)
    }

    /// Like [`Segment::component`], empty when out of range
    pub fn text(&self, f: usize, c: usize) -> &str {
        self.component(f, c).unwrap_or("")
    }

    /// Re-encodes the segment as one ER7 line
    pub fn encode(&self, profile: &EncodingProfile) -> String {
        let is_header = self.name == "MSH";
        let mut out = self.name.clone();
        for (i, field) in self.fields.iter().enumerate() {
            if is_header && i == 0 {
                // MSH-1 is the separator itself
                out.push(profile.field());
                continue;
            }
            if !(is_header && i == 1) {
                out.push(profile.field());
            }
            if is_header && i == 1 {
                out.push_str(field.component(1).unwrap_or_default());
                continue;
            }
            out.push_str(&encode_field(field, profile));
        }
        out
    }
}

fn encode_field(field: &Field, profile: &EncodingProfile) -> String {
    let rep_sep = profile.repetition().to_string();
    let comp_sep = profile.component().to_string();
    let sub_sep = profile.subcomponent().to_string();
    field
        .repetitions()
        .iter()
        .map(|rep| {
            rep.components()
                .iter()
                .map(|comp| {
                    comp.subcomponents()
                        .iter()
                        .map(|s| escape(s, profile))
                        .collect::<Vec<_>>()
                        .join(&sub_sep)
                })
                .collect::<Vec<_>>()
                .join(&comp_sep)
        })
        .collect::<Vec<_>>()
        .join(&rep_sep)
}

/// Values read from MSH that describe the message itself
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderDescriptor {
    /// MSH-9.1
    pub message_type: String,
    /// MSH-9.2
    pub trigger_event: String,
    /// MSH-9.3
    pub structure: String,
    /// MSH-10
    pub control_id: String,
    /// MSH-12
    pub version: String,
    /// MSH-4
    pub sending_facility: String,
    /// MSH-7
    pub timestamp: String,
}

impl HeaderDescriptor {
    pub(crate) fn from_segment(msh: &Segment) -> Self {
        Self {
            // dispatch matches these exactly as sent
            message_type: msh.text(9, 1).to_string(),
            trigger_event: msh.text(9, 2).to_string(),
            structure: msh.text(9, 3).trim().to_string(),
            control_id: msh.text(10, 1).trim().to_string(),
            version: msh.text(12, 1).trim().to_string(),
            sending_facility: msh.text(4, 1).trim().to_string(),
            timestamp: msh.text(7, 1).trim().to_string(),
        }
    }

    /// Dispatch key, when both parts are present
    pub fn event_key(&self) -> Option<EventKey> {
        EventKey::new(self.message_type.as_str(), self.trigger_event.as_str()).ok()
    }

    /// `TYPE^TRIGGER` as written, for messages that cannot be dispatched
    pub fn event_label(&self) -> String {
        format!("{}^{}", self.message_type, self.trigger_event)
    }
}

/// A parsed message: segments in wire order plus the header descriptor
///
/// Read-only after parsing; all accessors take `&self`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    profile: EncodingProfile,
    header: HeaderDescriptor,
    segments: Vec<Segment>,
}

impl Message {
    pub(crate) fn new(profile: EncodingProfile, segments: Vec<Segment>) -> Self {
        let header = segments
            .first()
            .map(HeaderDescriptor::from_segment)
            .unwrap_or_default();
        Self {
            profile,
            header,
            segments,
        }
    }

    pub fn profile(&self) -> &EncodingProfile {
        &self.profile
    }

    pub fn header(&self) -> &HeaderDescriptor {
        &self.header
    }

    /// All segments in wire order (header first)
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Every segment called `name`, in wire order
    pub fn segments_named<'s, 'n>(
        &'s self,
        name: &'n str,
    ) -> impl Iterator<Item = &'s Segment> + 'n
    where
        's: 'n,
    {
        self.segments.iter().filter(move |s| s.name == name)
    }

    /// The `n`th (1-based) segment called `name`
    pub fn segment(&self, name: &str, n: usize) -> Option<&Segment> {
        if n == 0 {
            return None;
        }
        self.segments.iter().filter(|s| s.name == name).nth(n - 1)
    }

    /// Field `f` of the first segment called `name`
    pub fn field(&self, name: &str, f: usize) -> Option<&Field> {
        self.segment(name, 1)?.field(f)
    }

    /// Value at a locator, `None` when any step is missing
    pub fn get(&self, locator: &Locator) -> Option<&str> {
        self.segment(locator.segment(), locator.occurrence())?
            .field(locator.field())?
            .repetition(locator.repetition())?
            .component(locator.component())?
            .subcomponent(locator.subcomponent())
    }

    /// Value at a locator, empty when any step is missing
    pub fn text(&self, locator: &Locator) -> &str {
        self.get(locator).unwrap_or("")
    }

    /// Re-encodes the whole message with `\r` segment terminators
    pub fn encode(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.encode(&self.profile))
            .collect::<Vec<_>>()
            .join("\r")
    }
}

fn nth<T>(items: &[T], n: usize) -> Option<&T> {
    n.checked_sub(1).and_then(|i| items.get(i))
}

#[cfg(test)]
mod tests {
    use super::super::parse_message;
    use super::*;

    const ADT: &str = "MSH|^~\\&|EPIC|HOSP|LIS|LAB|202501011230||ADT^A01^ADT_A01|MSG001|P|2.5\r\
        PID|1||12345^^^HOSP^MR~67890^^^SSA||Doe^John^Q~Roe^Jane||19700101|M|||\r\
        OBX|1|NM|GLU^Glucose^LN||5.4\r\
        OBX|2|ST|NOTE||a&b";

    #[test]
    fn test_header_descriptor() {
        let msg = parse_message(ADT).unwrap();
        let header = msg.header();
        assert_eq!(header.message_type, "ADT");
        assert_eq!(header.trigger_event, "A01");
        assert_eq!(header.structure, "ADT_A01");
        assert_eq!(header.control_id, "MSG001");
        assert_eq!(header.version, "2.5");
        assert_eq!(header.sending_facility, "HOSP");
        assert_eq!(header.timestamp, "202501011230");
        assert_eq!(header.event_key().unwrap().to_string(), "ADT^A01");
    }

    #[test]
    fn test_segment_lookup_is_one_based() {
        let msg = parse_message(ADT).unwrap();
        assert!(msg.segment("OBX", 0).is_none());
        assert_eq!(msg.segment("OBX", 2).unwrap().text(3, 1), "NOTE");
        assert_eq!(msg.segment("OBX", 2).unwrap().occurrence(), 2);
        assert!(msg.segment("OBX", 3).is_none());
        assert!(msg.segment("PV1", 1).is_none());
        assert_eq!(msg.segments_named("OBX").count(), 2);
    }

    #[test]
    fn test_segment_borrow_outlives_name() {
        let msg = parse_message(ADT).unwrap();
        let second = {
            let name = String::from("OBX");
            msg.segment(&name, 2)
        };
        assert_eq!(second.unwrap().occurrence(), 2);
    }

    #[test]
    fn test_message_type_is_not_trimmed() {
        let msg = parse_message("MSH|^~\\&|A|B|C|D|20250101||ADT ^ A01|1|P|2.5\rPID|1").unwrap();
        assert_eq!(msg.header().message_type, "ADT ");
        assert_eq!(msg.header().trigger_event, " A01");
        assert_eq!(msg.header().event_label(), "ADT ^ A01");
    }

    #[test]
    fn test_repetitions_and_components() {
        let msg = parse_message(ADT).unwrap();
        let pid3 = msg.field("PID", 3).unwrap();
        assert_eq!(pid3.repetitions().len(), 2);
        assert_eq!(pid3.repetition(2).unwrap().text(1), "67890");
        assert_eq!(pid3.repetition(2).unwrap().text(4), "SSA");
        assert_eq!(msg.segment("PID", 1).unwrap().component(5, 2), Some("John"));
    }

    #[test]
    fn test_empty_field_has_no_repetitions() {
        let msg = parse_message(ADT).unwrap();
        let pid = msg.segment("PID", 1).unwrap();
        assert!(pid.field(2).unwrap().is_empty());
        assert_eq!(pid.component(2, 1), None);
        assert_eq!(pid.text(2, 1), "");
        // trailing empties are kept
        assert_eq!(pid.fields().len(), 11);
        assert!(pid.field(12).is_none());
    }

    #[test]
    fn test_out_of_range_text_is_empty() {
        let msg = parse_message(ADT).unwrap();
        let pid = msg.segment("PID", 1).unwrap();
        assert_eq!(pid.text(99, 1), "");
        assert_eq!(pid.text(5, 9), "");
        assert_eq!(pid.text(0, 1), "");
    }

    #[test]
    fn test_msh_fields_are_verbatim() {
        let msg = parse_message(ADT).unwrap();
        let msh = msg.segment("MSH", 1).unwrap();
        assert_eq!(msh.text(1, 1), "|");
        assert_eq!(msh.text(2, 1), "^~\\&");
        assert_eq!(msh.text(3, 1), "EPIC");
    }

    #[test]
    fn test_subcomponents() {
        let msg = parse_message(ADT).unwrap();
        let loc: Locator = "OBX[2]-5.1.2".parse().unwrap();
        assert_eq!(msg.get(&loc), Some("b"));
        assert_eq!(msg.text(&"OBX[2]-5.1.3".parse().unwrap()), "");
    }

    #[test]
    fn test_encode_round_trip() {
        let raw = "MSH|^~\\&|A|B|||20250101||ORU^R01|X1|P|2.5\rPID|1||1^^^H||A\\S\\B^C||\rOBX|1|ST|C||x\\F\\y~z";
        let msg = parse_message(raw).unwrap();
        assert_eq!(msg.encode(), raw);
        assert_eq!(parse_message(&msg.encode()).unwrap(), msg);
    }

    #[test]
    fn test_message_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Message>();
    }
}
