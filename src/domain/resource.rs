//! Output resources
//!
//! A closed set of FHIR-shaped resources. Every value is built once by a
//! builder, appended to the result list and never touched again; the engine
//! does not persist them. Serialization follows FHIR JSON naming with a
//! `resourceType` discriminator.

use crate::domain::coding::{CodeableConcept, Coding};
use crate::domain::ids::ResourceId;
use serde::Serialize;
use std::fmt;

/// Kind of resource, as it appears in `resourceType` and in references
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    Patient,
    Encounter,
    Condition,
    ServiceRequest,
    Observation,
    DiagnosticReport,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Patient => "Patient",
            ResourceKind::Encounter => "Encounter",
            ResourceKind::Condition => "Condition",
            ResourceKind::ServiceRequest => "ServiceRequest",
            ResourceKind::Observation => "Observation",
            ResourceKind::DiagnosticReport => "DiagnosticReport",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One produced resource
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "resourceType")]
pub enum Resource {
    Patient(Patient),
    Encounter(Encounter),
    Condition(Condition),
    ServiceRequest(ServiceRequest),
    Observation(Observation),
    DiagnosticReport(DiagnosticReport),
}

impl Resource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::Patient(_) => ResourceKind::Patient,
            Resource::Encounter(_) => ResourceKind::Encounter,
            Resource::Condition(_) => ResourceKind::Condition,
            Resource::ServiceRequest(_) => ResourceKind::ServiceRequest,
            Resource::Observation(_) => ResourceKind::Observation,
            Resource::DiagnosticReport(_) => ResourceKind::DiagnosticReport,
        }
    }

    pub fn id(&self) -> &ResourceId {
        match self {
            Resource::Patient(r) => &r.id,
            Resource::Encounter(r) => &r.id,
            Resource::Condition(r) => &r.id,
            Resource::ServiceRequest(r) => &r.id,
            Resource::Observation(r) => &r.id,
            Resource::DiagnosticReport(r) => &r.id,
        }
    }

    /// `Kind/id` reference to this resource
    pub fn reference(&self) -> Reference {
        Reference::to(self.kind(), self.id())
    }

    /// Every reference this resource holds, in field order
    pub fn references(&self) -> Vec<&Reference> {
        match self {
            Resource::Patient(_) => Vec::new(),
            Resource::Encounter(r) => vec![&r.subject],
            Resource::Condition(r) => std::iter::once(&r.subject)
                .chain(r.encounter.as_ref())
                .collect(),
            Resource::ServiceRequest(r) => std::iter::once(&r.subject)
                .chain(r.requester.as_ref())
                .collect(),
            Resource::Observation(r) => vec![&r.subject],
            Resource::DiagnosticReport(r) => std::iter::once(&r.subject)
                .chain(r.result.iter())
                .collect(),
        }
    }
}

/// Pointer from one resource to another
///
/// Typed references can only be obtained from an existing resource, so a
/// reference to something never built cannot be expressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reference {
    #[serde(skip_serializing_if = "Option::is_none")]
    reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    display: Option<String>,
}

impl Reference {
    fn to(kind: ResourceKind, id: &ResourceId) -> Self {
        Self {
            reference: Some(format!("{kind}/{id}")),
            display: None,
        }
    }

    /// A display-only reference (no target resource)
    pub fn display_only(display: impl Into<String>) -> Self {
        Self {
            reference: None,
            display: Some(display.into()),
        }
    }

    /// The `Kind/id` string, if this reference targets a resource
    pub fn target(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    pub fn display(&self) -> Option<&str> {
        self.display.as_deref()
    }
}

/// Business identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identifier {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub value: String,
}

impl Identifier {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            system: None,
            value: value.into(),
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        let system = system.into();
        if !system.is_empty() {
            self.system = Some(system);
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HumanName {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub given: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub line: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl Address {
    pub fn is_empty(&self) -> bool {
        self == &Address::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactPoint {
    pub system: &'static str,
    pub value: String,
}

impl ContactPoint {
    pub fn phone(value: impl Into<String>) -> Self {
        Self {
            system: "phone",
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Period {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

/// Numeric value with a unit
///
/// The value is kept as a JSON number exactly as parsed, so `120` stays an
/// integer and `5.4` a decimal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quantity {
    pub value: serde_json::Number,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdministrativeGender {
    Male,
    Female,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: ResourceId,
    pub identifier: Vec<Identifier>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub name: Vec<HumanName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<AdministrativeGender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub address: Vec<Address>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub telecom: Vec<ContactPoint>,
}

impl Patient {
    pub fn reference(&self) -> Reference {
        Reference::to(ResourceKind::Patient, &self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EncounterStatus {
    InProgress,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Encounter {
    pub id: ResourceId,
    pub status: EncounterStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub class: Vec<CodeableConcept>,
    pub subject: Reference,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
}

impl Encounter {
    pub fn reference(&self) -> Reference {
        Reference::to(ResourceKind::Encounter, &self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub id: ResourceId,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub category: Vec<CodeableConcept>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConcept>,
    pub subject: Reference,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encounter: Option<Reference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recorded_date: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestStatus {
    Active,
    OnHold,
    Revoked,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestPriority {
    Routine,
    Asap,
    Stat,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
    pub id: ResourceId,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,
    pub status: RequestStatus,
    pub intent: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<RequestPriority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConcept>,
    pub subject: Reference,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authored_on: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requester: Option<Reference>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObservationStatus {
    Registered,
    Preliminary,
    Final,
    Corrected,
    Cancelled,
    EnteredInError,
}

/// Observation value: a quantity or plain text, never both
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ObservationValue {
    #[serde(rename = "valueQuantity")]
    Quantity(Quantity),
    #[serde(rename = "valueString")]
    String(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceRange {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub id: ResourceId,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,
    pub status: ObservationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConcept>,
    pub subject: Reference,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_date_time: Option<String>,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub value: Option<ObservationValue>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub interpretation: Vec<CodeableConcept>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reference_range: Vec<ReferenceRange>,
}

impl Observation {
    pub fn reference(&self) -> Reference {
        Reference::to(ResourceKind::Observation, &self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportStatus {
    Preliminary,
    Final,
    Corrected,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticReport {
    pub id: ResourceId,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,
    pub status: ReportStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConcept>,
    pub subject: Reference,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued: Option<String>,
    pub result: Vec<Reference>,
}

/// Convenience for callers that only need the primary coding of a resource
pub fn primary_coding(resource: &Resource) -> Option<&Coding> {
    let code = match resource {
        Resource::Condition(r) => r.code.as_ref(),
        Resource::ServiceRequest(r) => r.code.as_ref(),
        Resource::Observation(r) => r.code.as_ref(),
        Resource::DiagnosticReport(r) => r.code.as_ref(),
        Resource::Patient(_) | Resource::Encounter(_) => None,
    };
    code.and_then(CodeableConcept::primary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn patient() -> Patient {
        Patient {
            id: ResourceId::new("12345").unwrap(),
            identifier: vec![Identifier::new("12345").with_system("HOSP")],
            name: vec![HumanName {
                family: Some("Doe".to_string()),
                given: vec!["John".to_string()],
            }],
            gender: Some(AdministrativeGender::Male),
            birth_date: Some("1970-01-01".to_string()),
            address: Vec::new(),
            telecom: Vec::new(),
        }
    }

    #[test]
    fn test_patient_serialization() {
        let value = serde_json::to_value(Resource::Patient(patient())).unwrap();
        assert_eq!(
            value,
            json!({
                "resourceType": "Patient",
                "id": "12345",
                "identifier": [{"system": "HOSP", "value": "12345"}],
                "name": [{"family": "Doe", "given": ["John"]}],
                "gender": "male",
                "birthDate": "1970-01-01"
            })
        );
    }

    #[test]
    fn test_reference_uses_kind_and_id() {
        let p = patient();
        assert_eq!(p.reference().target(), Some("Patient/12345"));
        assert_eq!(Resource::Patient(p).reference().target(), Some("Patient/12345"));
    }

    #[test]
    fn test_display_only_reference() {
        let r = Reference::display_only("Dr Smith");
        assert!(r.target().is_none());
        assert_eq!(serde_json::to_value(&r).unwrap(), json!({"display": "Dr Smith"}));
    }

    #[test]
    fn test_observation_value_flattened() {
        let obs = Observation {
            id: ResourceId::new("obs-1").unwrap(),
            identifier: Vec::new(),
            status: ObservationStatus::EnteredInError,
            code: None,
            subject: patient().reference(),
            effective_date_time: None,
            value: Some(ObservationValue::Quantity(Quantity {
                value: "5.4".parse().unwrap(),
                unit: Some("mmol/L".to_string()),
            })),
            interpretation: Vec::new(),
            reference_range: Vec::new(),
        };
        let value = serde_json::to_value(Resource::Observation(obs)).unwrap();
        assert_eq!(value["status"], "entered-in-error");
        assert_eq!(value["valueQuantity"]["value"], json!(5.4));
        assert_eq!(value["valueQuantity"]["unit"], "mmol/L");
        assert!(value.get("valueString").is_none());
    }

    #[test]
    fn test_integer_quantity_stays_integer() {
        let q = Quantity {
            value: "120".parse().unwrap(),
            unit: None,
        };
        assert_eq!(serde_json::to_string(&q).unwrap(), r#"{"value":120}"#);
    }

    #[test]
    fn test_report_references_in_order() {
        let p = patient();
        let report = Resource::DiagnosticReport(DiagnosticReport {
            id: ResourceId::new("dr-1").unwrap(),
            identifier: Vec::new(),
            status: ReportStatus::Final,
            code: None,
            subject: p.reference(),
            issued: None,
            result: Vec::new(),
        });
        let targets: Vec<_> = report.references().iter().filter_map(|r| r.target()).collect();
        assert_eq!(targets, vec!["Patient/12345"]);
        assert_eq!(report.kind().to_string(), "DiagnosticReport");
        assert!(primary_coding(&report).is_none());
    }
}
