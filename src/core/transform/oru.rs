//! ORU^R01 builder
//!
//! Output order: Patient, then for each order group its Observations
//! followed by a DiagnosticReport when the group holds more than one.
//!
//! Date-only OBX-14 / OBR-7 values stay dates rather than becoming midnight.

use super::common::{
    build_patient, derived_id, field_text, format_datetime, locate, opt_value, order_groups,
    order_identifiers, value, BuildContext, OrderGroup,
};
use crate::core::codes::{CodeResolver, ConceptKind};
use crate::core::parse::{Message, Segment};
use crate::domain::coding::CodeableConcept;
use crate::domain::errors::TransformError;
use crate::domain::resource::{
    DiagnosticReport, Observation, ObservationStatus, ObservationValue, Patient, Quantity,
    ReferenceRange, ReportStatus, Resource,
};

fn map_observation_status(code: &str) -> Option<ObservationStatus> {
    match code {
        "F" => Some(ObservationStatus::Final),
        "P" => Some(ObservationStatus::Preliminary),
        "C" => Some(ObservationStatus::Corrected),
        "X" => Some(ObservationStatus::Cancelled),
        "I" | "R" => Some(ObservationStatus::Registered),
        "D" | "W" => Some(ObservationStatus::EnteredInError),
        _ => None,
    }
}

fn map_report_status(code: &str) -> Option<ReportStatus> {
    match code {
        "F" => Some(ReportStatus::Final),
        "P" => Some(ReportStatus::Preliminary),
        "C" => Some(ReportStatus::Corrected),
        "X" => Some(ReportStatus::Cancelled),
        _ => None,
    }
}

/// ORU^R01
pub fn build_results(
    message: &Message,
    resolver: &CodeResolver,
) -> Result<Vec<Resource>, TransformError> {
    let ctx = BuildContext::new(message, resolver);
    let patient = build_patient(&ctx)?;

    let mut body = Vec::new();
    let mut ordinal = 0;
    for (group_index, group) in order_groups(message).iter().enumerate() {
        let mut observations = Vec::with_capacity(group.observations.len());
        for obx in &group.observations {
            ordinal += 1;
            observations.push(build_observation(&ctx, group, obx, ordinal, &patient)?);
        }

        let report = if observations.len() > 1 {
            Some(build_report(&ctx, group, group_index + 1, &observations, &patient)?)
        } else {
            None
        };

        body.extend(observations.into_iter().map(Resource::Observation));
        body.extend(report.map(Resource::DiagnosticReport));
    }

    tracing::debug!(
        patient = %patient.id,
        observations = ordinal,
        "Built result resources"
    );

    let mut resources = Vec::with_capacity(1 + body.len());
    resources.push(Resource::Patient(patient));
    resources.extend(body);
    Ok(resources)
}

fn observation_value(message: &Message, obx: &Segment) -> Option<ObservationValue> {
    let field = obx.field(5)?;
    let value_type = value(obx, 2, 1).unwrap_or_default().to_ascii_uppercase();

    if value_type == "NM" {
        let raw = field.component(1).unwrap_or_default().trim();
        if raw.is_empty() {
            return None;
        }
        return Some(match parse_numeric(raw) {
            Some(number) => ObservationValue::Quantity(Quantity {
                value: number,
                unit: value(obx, 6, 2).or_else(|| value(obx, 6, 1)).map(str::to_string),
            }),
            None => ObservationValue::String(raw.to_string()),
        });
    }

    let parts = field_text(field, message.profile().component());
    (!parts.is_empty()).then(|| ObservationValue::String(parts.join(", ")))
}

/// HL7 NM text as a JSON number
///
/// Accepts an optional sign, digits and an optional decimal point with
/// digits on either side. Leading zeros and `+` are dropped; fraction digits
/// are kept as sent, so `0.50` stays `0.50`.
fn parse_numeric(raw: &str) -> Option<serde_json::Number> {
    let (negative, unsigned) = match raw.as_bytes().first()? {
        b'-' => (true, &raw[1..]),
        b'+' => (false, &raw[1..]),
        _ => (false, raw),
    };
    let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if !whole.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }

    let whole = whole.trim_start_matches('0');
    let mut text = String::with_capacity(raw.len() + 1);
    if negative {
        text.push('-');
    }
    text.push_str(if whole.is_empty() { "0" } else { whole });
    if !fraction.is_empty() {
        text.push('.');
        text.push_str(fraction);
    }
    text.parse().ok()
}

fn build_observation(
    ctx: &BuildContext<'_>,
    group: &OrderGroup<'_>,
    obx: &Segment,
    ordinal: usize,
    patient: &Patient,
) -> Result<Observation, TransformError> {
    let status = match value(obx, 11, 1) {
        None => ObservationStatus::Final,
        Some(code) => map_observation_status(code)
            .ok_or_else(|| ctx.unmapped_status(&locate(obx, 11), code))?,
    };

    let effective_date_time = value(obx, 14, 1)
        .and_then(format_datetime)
        .or_else(|| opt_value(group.obr, 7, 1).and_then(format_datetime));

    let interpretation = obx
        .field(8)
        .map(|f| f.repetitions())
        .unwrap_or_default()
        .iter()
        .map(|rep| rep.text(1).trim())
        .filter(|s| !s.is_empty())
        .map(CodeableConcept::text)
        .collect();

    let reference_range = value(obx, 7, 1)
        .map(|text| ReferenceRange {
            text: text.to_string(),
        })
        .into_iter()
        .collect();

    Ok(Observation {
        id: derived_id("obs", &patient.id, Some(ordinal)),
        identifier: order_identifiers(None, group.obr),
        status,
        code: ctx.resolver.concept(obx.field(3), ConceptKind::Lab),
        subject: patient.reference(),
        effective_date_time,
        value: observation_value(ctx.message, obx),
        interpretation,
        reference_range,
    })
}

fn build_report(
    ctx: &BuildContext<'_>,
    group: &OrderGroup<'_>,
    group_ordinal: usize,
    observations: &[Observation],
    patient: &Patient,
) -> Result<DiagnosticReport, TransformError> {
    let status = match group.obr.and_then(|obr| value(obr, 25, 1).map(|code| (obr, code))) {
        None => ReportStatus::Final,
        Some((obr, code)) => {
            map_report_status(code).ok_or_else(|| ctx.unmapped_status(&locate(obr, 25), code))?
        }
    };

    Ok(DiagnosticReport {
        id: derived_id("dr", &patient.id, Some(group_ordinal)),
        identifier: order_identifiers(None, group.obr),
        status,
        code: ctx
            .resolver
            .concept(group.obr.and_then(|s| s.field(4)), ConceptKind::Lab),
        subject: patient.reference(),
        issued: opt_value(group.obr, 22, 1).and_then(format_datetime),
        result: observations.iter().map(Observation::reference).collect(),
    })
}
