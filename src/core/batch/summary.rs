//! Batch summary and reporting

use super::processor::BatchResult;
use crate::domain::errors::FailureDetail;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Summary of a batch run
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    /// Messages found in the input
    pub total_messages: usize,

    /// Messages converted
    pub successful: usize,

    /// Messages rejected
    pub failed: usize,

    /// Resources produced
    pub total_resources: usize,

    /// Wall-clock time of the run
    pub duration: Duration,

    /// Rejected messages in input order
    pub failures: Vec<FailureDetail>,
}

impl BatchSummary {
    /// Create a new empty summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// True when every message converted
    pub fn is_successful(&self) -> bool {
        self.failed == 0
    }

    /// Get success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.total_messages == 0 {
            return 100.0;
        }
        (self.successful as f64 / self.total_messages as f64) * 100.0
    }

    /// Failure counts keyed by rule name
    pub fn failures_by_rule(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for failure in &self.failures {
            *counts.entry(failure.rule).or_insert(0) += 1;
        }
        counts
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            total_messages = self.total_messages,
            successful = self.successful,
            failed = self.failed,
            resources = self.total_resources,
            duration_ms = self.duration.as_millis() as u64,
            success_rate = format!("{:.2}%", self.success_rate()),
            "Batch completed"
        );

        if !self.failures.is_empty() {
            tracing::warn!(
                failure_count = self.failures.len(),
                "Batch completed with failures"
            );
            for failure in &self.failures {
                tracing::warn!(
                    position = failure.position,
                    control_id = failure.control_id.as_deref().unwrap_or(""),
                    rule = failure.rule,
                    message = %failure.message,
                    "Message failed"
                );
            }
        }
    }
}

impl From<BatchResult> for BatchSummary {
    fn from(result: BatchResult) -> Self {
        Self {
            total_messages: result.total(),
            successful: result.successful,
            failed: result.failed,
            total_resources: result.resources,
            duration: Duration::ZERO,
            failures: result.failures,
        }
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Messages:   {}", self.total_messages)?;
        writeln!(f, "Converted:  {}", self.successful)?;
        writeln!(f, "Failed:     {}", self.failed)?;
        writeln!(f, "Resources:  {}", self.total_resources)?;
        writeln!(f, "Success:    {:.2}%", self.success_rate())?;
        write!(f, "Duration:   {:.2}s", self.duration.as_secs_f64())?;
        for failure in &self.failures {
            write!(f, "\n  {failure}")?;
        }
        Ok(())
    }
}
