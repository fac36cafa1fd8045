//! ADT builders: admit (A01), discharge (A03) and update (A08)
//!
//! Output order: Patient, Encounter, then one Condition per DG1.
//! Encounter status depends only on the event, never on PV1 content.

use super::common::{build_patient, derived_id, format_date, format_datetime, value, BuildContext};
use crate::core::codes::{CodeResolver, ConceptKind};
use crate::core::parse::{Message, Segment};
use crate::domain::coding::{CodeableConcept, Coding};
use crate::domain::errors::TransformError;
use crate::domain::ids::ResourceId;
use crate::domain::resource::{Condition, Encounter, EncounterStatus, Patient, Period, Resource};

/// ADT^A01
pub fn build_admit(
    message: &Message,
    resolver: &CodeResolver,
) -> Result<Vec<Resource>, TransformError> {
    build(message, resolver, EncounterStatus::InProgress)
}

/// ADT^A03
pub fn build_discharge(
    message: &Message,
    resolver: &CodeResolver,
) -> Result<Vec<Resource>, TransformError> {
    build(message, resolver, EncounterStatus::Finished)
}

/// ADT^A08
pub fn build_update(
    message: &Message,
    resolver: &CodeResolver,
) -> Result<Vec<Resource>, TransformError> {
    build(message, resolver, EncounterStatus::InProgress)
}

fn build(
    message: &Message,
    resolver: &CodeResolver,
    status: EncounterStatus,
) -> Result<Vec<Resource>, TransformError> {
    let ctx = BuildContext::new(message, resolver);
    let patient = build_patient(&ctx)?;
    let encounter = build_encounter(message.segment("PV1", 1), &patient, status);

    let conditions: Vec<Resource> = message
        .segments_named("DG1")
        .enumerate()
        .map(|(i, dg1)| Resource::Condition(build_condition(&ctx, dg1, i + 1, &patient, &encounter)))
        .collect();

    let mut resources = Vec::with_capacity(2 + conditions.len());
    resources.push(Resource::Patient(patient));
    resources.push(Resource::Encounter(encounter));
    resources.extend(conditions);
    Ok(resources)
}

fn build_encounter(pv1: Option<&Segment>, patient: &Patient, status: EncounterStatus) -> Encounter {
    let id = pv1
        .and_then(|s| value(s, 19, 1))
        .and_then(ResourceId::sanitized)
        .unwrap_or_else(|| derived_id("enc", &patient.id, None));

    let class = pv1
        .and_then(|s| value(s, 2, 1))
        .map(|code| CodeableConcept {
            coding: vec![Coding {
                system: None,
                code: code.to_string(),
                display: None,
            }],
            text: None,
        })
        .into_iter()
        .collect();

    let start = pv1.and_then(|s| value(s, 44, 1)).and_then(format_date);
    let end = pv1.and_then(|s| value(s, 45, 1)).and_then(format_date);
    let period = (start.is_some() || end.is_some()).then_some(Period { start, end });

    Encounter {
        id,
        status,
        class,
        subject: patient.reference(),
        period,
    }
}

fn build_condition(
    ctx: &BuildContext<'_>,
    dg1: &Segment,
    ordinal: usize,
    patient: &Patient,
    encounter: &Encounter,
) -> Condition {
    let category = value(dg1, 6, 1)
        .and_then(|t| match t.to_ascii_uppercase().as_str() {
            "A" => Some("admitting"),
            "W" => Some("working"),
            "F" => Some("final"),
            _ => None,
        })
        .map(CodeableConcept::text)
        .into_iter()
        .collect();

    Condition {
        id: derived_id("cond", &patient.id, Some(ordinal)),
        category,
        code: ctx.resolver.concept(dg1.field(3), ConceptKind::Diagnosis),
        subject: patient.reference(),
        encounter: Some(encounter.reference()),
        recorded_date: value(dg1, 5, 1).and_then(format_datetime),
    }
}
