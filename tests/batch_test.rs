//! Integration tests for multi-message conversion

use v2fhir::core::batch::{
    split_messages, BatchConfig, BatchProcessor, BatchResult, BatchSummary, MessageOutcome,
};
use v2fhir::core::transform::Converter;

fn message(event: &str, control_id: &str, body: &str) -> String {
    format!("MSH|^~\\&|EPIC|HOSP|LIS|LAB|202501011230||{event}|{control_id}|P|2.5\n{body}\n")
}

fn processor(max_concurrency: usize) -> BatchProcessor {
    BatchProcessor::new(
        Converter::standard().unwrap(),
        BatchConfig::new(max_concurrency),
    )
}

fn feed() -> String {
    let mut raw = String::from("FHS|^~\\&|EPIC\nBHS|^~\\&|EPIC\n");
    raw.push_str(&message("ADT^A01", "A1", "PID|1||100\nPV1|1|I"));
    raw.push_str(&message("ORM^O01", "O1", "PID|1||200\nORC|ZZ|P1\nOBR|1|P1||GLU"));
    raw.push_str(&message("ORU^R01", "R1", "PID|1||300\nOBR|1|A\nOBX|1|ST|X||a\nOBX|2|ST|Y||b"));
    raw.push_str(&message("SIU^S12", "S1", "PID|1||400"));
    raw.push_str(&message("ADT^A03", "A2", "PID|1||500"));
    raw.push_str("BTS|5\nFTS|1\n");
    raw
}

#[test]
fn test_envelope_is_stripped() {
    let messages = split_messages(&feed());
    assert_eq!(messages.len(), 5);
    assert!(messages.iter().all(|m| m.starts_with("MSH|")));
    assert!(messages.iter().all(|m| !m.contains("BTS") && !m.contains("FHS")));
}

#[tokio::test]
async fn test_failures_are_isolated_and_ordered() {
    let outcomes = processor(3).process_input(&feed()).await;
    assert_eq!(outcomes.len(), 5);

    let positions: Vec<usize> = outcomes.iter().map(MessageOutcome::position).collect();
    assert_eq!(positions, vec![1, 2, 3, 4, 5]);

    let ids: Vec<Option<&str>> = outcomes.iter().map(MessageOutcome::control_id).collect();
    assert_eq!(ids, vec![Some("A1"), Some("O1"), Some("R1"), Some("S1"), Some("A2")]);

    let success: Vec<bool> = outcomes.iter().map(MessageOutcome::is_success).collect();
    assert_eq!(success, vec![true, false, true, false, true]);

    let MessageOutcome::Failed(order_failure) = &outcomes[1] else {
        panic!("expected a failure");
    };
    assert_eq!(order_failure.rule, "UnmappedStatus");
    assert_eq!(order_failure.position, 2);
    assert_eq!(order_failure.control_id.as_deref(), Some("O1"));
}

#[tokio::test]
async fn test_concurrency_does_not_change_results() {
    let serial = processor(1).process_input(&feed()).await;
    let parallel = processor(8).process_input(&feed()).await;

    let resources = |outcomes: &[MessageOutcome]| -> Vec<usize> {
        outcomes
            .iter()
            .map(|o| match o {
                MessageOutcome::Converted { resources, .. } => resources.len(),
                MessageOutcome::Failed(_) => 0,
            })
            .collect()
    };
    assert_eq!(resources(&serial), resources(&parallel));
    assert_eq!(resources(&serial), vec![2, 0, 4, 0, 2]);
}

#[tokio::test]
async fn test_summary_counts() {
    let outcomes = processor(4).process_input(&feed()).await;
    let summary = BatchSummary::from(BatchResult::from_outcomes(&outcomes));

    assert_eq!(summary.total_messages, 5);
    assert_eq!(summary.successful, 3);
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.total_resources, 8);
    assert!(!summary.is_successful());

    let by_rule = summary.failures_by_rule();
    assert_eq!(by_rule.get("UnmappedStatus"), Some(&1));
    assert_eq!(by_rule.get("UnsupportedEvent"), Some(&1));
}

#[tokio::test]
async fn test_garbage_before_first_header_is_reported() {
    let raw = format!("not a segment\n{}", message("ADT^A01", "A1", "PID|1||100"));
    let outcomes = processor(2).process_input(&raw).await;
    assert_eq!(outcomes.len(), 2);
    assert!(!outcomes[0].is_success());
    assert!(outcomes[1].is_success());
}
