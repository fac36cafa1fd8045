//! ORM^O01 builder
//!
//! Output order: Patient, then one ServiceRequest per order group. Any
//! order whose status has no mapping fails the whole message.
//!
//! Every OBR under one ORC becomes its own ServiceRequest sharing that ORC's
//! status and identifiers; repeated ids are suffixed `-2`, `-3`, ...

use super::common::{
    build_patient, derived_id, format_datetime, locate, opt_value, order_groups,
    order_identifiers, value, BuildContext, IdPool, OrderGroup,
};
use crate::core::codes::{CodeResolver, ConceptKind};
use crate::core::parse::{Message, Segment};
use crate::domain::errors::TransformError;
use crate::domain::ids::ResourceId;
use crate::domain::resource::{
    Patient, Reference, RequestPriority, RequestStatus, Resource, ServiceRequest,
};

/// ORC-5 order status, or ORC-1 order control when ORC-5 is empty
fn map_order_status(code: &str) -> Option<RequestStatus> {
    match code {
        "NW" | "IP" | "SC" => Some(RequestStatus::Active),
        "CA" | "OC" | "DC" => Some(RequestStatus::Revoked),
        "CM" => Some(RequestStatus::Completed),
        "HD" => Some(RequestStatus::OnHold),
        _ => None,
    }
}

fn map_priority(code: &str) -> Option<RequestPriority> {
    match code {
        "S" => Some(RequestPriority::Stat),
        "A" => Some(RequestPriority::Asap),
        "R" => Some(RequestPriority::Routine),
        _ => None,
    }
}

/// ORM^O01
pub fn build_order(
    message: &Message,
    resolver: &CodeResolver,
) -> Result<Vec<Resource>, TransformError> {
    let ctx = BuildContext::new(message, resolver);
    let patient = build_patient(&ctx)?;

    let groups: Vec<OrderGroup<'_>> = order_groups(message)
        .into_iter()
        .filter(|g| g.orc.is_some() || g.obr.is_some())
        .collect();
    if groups.is_empty() {
        return Err(TransformError::MissingRequiredSegment {
            event: ctx.event.clone(),
            segment: "ORC".to_string(),
        });
    }

    let mut ids = IdPool::default();
    let requests = groups
        .iter()
        .enumerate()
        .map(|(i, group)| build_service_request(&ctx, group, i + 1, &patient, &mut ids))
        .collect::<Result<Vec<_>, _>>()?;

    let mut resources = Vec::with_capacity(1 + requests.len());
    resources.push(Resource::Patient(patient));
    resources.extend(requests.into_iter().map(Resource::ServiceRequest));
    Ok(resources)
}

fn order_status(
    ctx: &BuildContext<'_>,
    orc: Option<&Segment>,
) -> Result<RequestStatus, TransformError> {
    let Some(orc) = orc else {
        return Ok(RequestStatus::Active);
    };
    let (field, code) = match (value(orc, 5, 1), value(orc, 1, 1)) {
        (Some(status), _) => (5, status),
        (None, Some(control)) => (1, control),
        (None, None) => return Ok(RequestStatus::Active),
    };
    map_order_status(code).ok_or_else(|| ctx.unmapped_status(&locate(orc, field), code))
}

/// Ordering provider (XCN) as display text: "given family", else the id
fn requester(orc: &Segment) -> Option<Reference> {
    let family = value(orc, 12, 2);
    let given = value(orc, 12, 3);
    let display = match (given, family) {
        (Some(g), Some(f)) => format!("{g} {f}"),
        (None, Some(f)) => f.to_string(),
        (Some(g), None) => g.to_string(),
        (None, None) => value(orc, 12, 1)?.to_string(),
    };
    Some(Reference::display_only(display))
}

fn build_service_request(
    ctx: &BuildContext<'_>,
    group: &OrderGroup<'_>,
    ordinal: usize,
    patient: &Patient,
    ids: &mut IdPool,
) -> Result<ServiceRequest, TransformError> {
    let (orc, obr) = (group.orc, group.obr);
    let status = order_status(ctx, orc)?;

    let placer = opt_value(orc, 2, 1).or_else(|| opt_value(obr, 2, 1));
    let filler = opt_value(orc, 3, 1).or_else(|| opt_value(obr, 3, 1));
    let id = ids.claim(
        placer
            .or(filler)
            .and_then(ResourceId::sanitized)
            .unwrap_or_else(|| derived_id("sr", &patient.id, Some(ordinal))),
    );

    let priority = opt_value(obr, 27, 6)
        .or_else(|| opt_value(orc, 7, 6))
        .and_then(map_priority);

    let request = ServiceRequest {
        id,
        identifier: order_identifiers(orc, obr),
        status,
        intent: "order",
        priority,
        code: ctx
            .resolver
            .concept(obr.and_then(|s| s.field(4)), ConceptKind::Lab),
        subject: patient.reference(),
        authored_on: opt_value(orc, 9, 1).and_then(format_datetime),
        requester: orc.and_then(requester),
    };
    tracing::debug!(
        id = %request.id,
        status = ?request.status,
        has_code = request.code.is_some(),
        "Built ServiceRequest"
    );
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parse::parse_message;
    use crate::domain::coding::LOINC_URI;
    use test_case::test_case;

    const PID: &str = "PID|1||12345^^^HOSP^MR||Doe^John||19700101|M";

    fn convert(body: &str) -> Result<Vec<Resource>, TransformError> {
        let raw =
            format!("MSH|^~\\&|EPIC|HOSP|LIS|LAB|202501011230||ORM^O01|MSG001|P|2.5\r{PID}\r{body}");
        build_order(&parse_message(&raw).unwrap(), &CodeResolver::default())
    }

    fn request(resources: &[Resource], i: usize) -> &ServiceRequest {
        match &resources[i] {
            Resource::ServiceRequest(sr) => sr,
            other => panic!("expected ServiceRequest, got {:?}", other.kind()),
        }
    }

    #[test]
    fn test_order_scenario() {
        let resources = convert("ORC|NW|ORD123\rOBR|1|ORD123||GLU^Glucose^LN").unwrap();
        assert_eq!(resources.len(), 2);
        let sr = request(&resources, 1);
        assert_eq!(sr.id.as_str(), "ORD123");
        assert_eq!(sr.identifier[0].value, "ORD123");
        assert_eq!(sr.status, RequestStatus::Active);
        assert_eq!(sr.intent, "order");
        let primary = sr.code.as_ref().unwrap().primary().unwrap();
        assert_eq!(primary.code, "GLU");
        assert_eq!(primary.display.as_deref(), Some("Glucose"));
        assert_eq!(primary.system.as_deref(), Some(LOINC_URI));
        assert_eq!(sr.subject.target(), Some("Patient/12345"));
        assert_eq!(resources[0].reference().target(), sr.subject.target());
    }

    #[test_case("NW", "", RequestStatus::Active ; "new order")]
    #[test_case("SC", "", RequestStatus::Active ; "status changed")]
    #[test_case("CA", "", RequestStatus::Revoked ; "cancel")]
    #[test_case("OC", "", RequestStatus::Revoked ; "order cancelled")]
    #[test_case("NW", "CM", RequestStatus::Completed ; "status field wins")]
    #[test_case("XO", "HD", RequestStatus::OnHold ; "held")]
    #[test_case("", "DC", RequestStatus::Revoked ; "discontinued")]
    #[test_case("", "", RequestStatus::Active ; "both empty")]
    fn test_status_table(control: &str, status: &str, expected: RequestStatus) {
        let resources = convert(&format!("ORC|{control}|P1|||{status}\rOBR|1|P1||GLU")).unwrap();
        assert_eq!(request(&resources, 1).status, expected);
    }

    #[test]
    fn test_unmapped_status_fails_whole_message() {
        let err = convert("ORC|NW|P1\rOBR|1|P1||GLU\rORC|ZZ|P2\rOBR|1|P2||K").unwrap_err();
        assert_eq!(
            err,
            TransformError::UnmappedStatus {
                event: "ORM^O01".to_string(),
                locator: "ORC[2]-1".to_string(),
                code: "ZZ".to_string(),
            }
        );
    }

    #[test]
    fn test_identifier_fallbacks_and_ids() {
        let resources = convert("OBR|1|PL9|FL9|K^Potassium^LN").unwrap();
        let sr = request(&resources, 1);
        assert_eq!(sr.id.as_str(), "PL9");
        let values: Vec<&str> = sr.identifier.iter().map(|i| i.value.as_str()).collect();
        assert_eq!(values, vec!["PL9", "FL9"]);
        assert_eq!(sr.status, RequestStatus::Active);

        let resources = convert("ORC|NW\rOBR|1").unwrap();
        assert_eq!(request(&resources, 1).id.as_str(), "sr-12345-1");
    }

    #[test]
    fn test_one_request_per_group() {
        let resources =
            convert("ORC|NW|A1\rOBR|1|A1||GLU^Glucose^LN\rORC|NW|A2\rOBR|2|A2||K^Potassium^LN")
                .unwrap();
        assert_eq!(resources.len(), 3);
        assert_eq!(request(&resources, 1).id.as_str(), "A1");
        assert_eq!(request(&resources, 2).id.as_str(), "A2");
    }

    #[test]
    fn test_detail_lines_share_their_order() {
        let resources = convert("ORC|CA|P1\rOBR|1|P1||GLU\rOBR|2|P1||K").unwrap();
        assert_eq!(resources.len(), 3);
        let (first, second) = (request(&resources, 1), request(&resources, 2));
        assert_eq!(first.status, RequestStatus::Revoked);
        assert_eq!(second.status, RequestStatus::Revoked);
        assert_eq!(first.id.as_str(), "P1");
        assert_eq!(second.id.as_str(), "P1-2");
        assert_eq!(second.identifier[0].value, "P1");
        assert_eq!(second.code.as_ref().unwrap().primary().unwrap().code, "K");
    }

    #[test]
    fn test_detail_line_inherits_unmapped_status() {
        let err = convert("ORC|ZZ|P1\rOBR|1|P1||GLU\rOBR|2|P1||K").unwrap_err();
        assert!(matches!(err, TransformError::UnmappedStatus { ref locator, .. } if locator == "ORC-1"));
    }

    #[test]
    fn test_repeated_placer_across_orders_gets_unique_ids() {
        let resources = convert("ORC|NW|A1\rOBR|1|A1||GLU\rORC|NW|A1\rOBR|1|A1||K").unwrap();
        assert_eq!(request(&resources, 1).id.as_str(), "A1");
        assert_eq!(request(&resources, 2).id.as_str(), "A1-2");
    }

    #[test]
    fn test_priority_authored_and_requester() {
        let obr = format!("OBR|1|P1||GLU{}|^^^^^S", "|".repeat(22));
        let orc = "ORC|NW|P1|||||||20250101083000|||1234^Smith^Anna";
        let resources = convert(&format!("{orc}\r{obr}")).unwrap();
        let sr = request(&resources, 1);
        assert_eq!(sr.priority, Some(RequestPriority::Stat));
        assert_eq!(sr.authored_on.as_deref(), Some("2025-01-01T08:30:00+00:00"));
        assert_eq!(sr.requester.as_ref().unwrap().display(), Some("Anna Smith"));
    }

    #[test]
    fn test_order_without_orc_or_obr_fails() {
        let err = convert("NTE|1||note").unwrap_err();
        assert!(matches!(err, TransformError::MissingRequiredSegment { ref segment, .. } if segment == "ORC"));
    }

    #[test]
    fn test_no_service_code_is_omitted() {
        let resources = convert("ORC|NW|P1\rOBR|1|P1").unwrap();
        assert!(request(&resources, 1).code.is_none());
    }
}
