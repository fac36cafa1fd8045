//! Concurrent conversion of many messages
//!
//! Each message is converted on tokio's blocking pool; at most
//! `max_concurrency` run at once and results come back in input order.

use super::split::split_messages;
use crate::config::BatchSettings;
use crate::core::parse::parse_message;
use crate::core::transform::Converter;
use crate::domain::errors::{ConvertError, FailureDetail, ParseError};
use crate::domain::resource::Resource;
use crate::log_batch_progress;
use futures::stream::{self, StreamExt};

/// Configuration for batch processing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    /// Messages converted at the same time
    pub max_concurrency: usize,
}

impl BatchConfig {
    /// Create a new batch configuration
    ///
    /// A concurrency of zero is raised to one.
    pub fn new(max_concurrency: usize) -> Self {
        Self {
            max_concurrency: max_concurrency.max(1),
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self::from(&BatchSettings::default())
    }
}

impl From<&BatchSettings> for BatchConfig {
    fn from(settings: &BatchSettings) -> Self {
        Self::new(settings.max_concurrency)
    }
}

/// What happened to one message of a batch
#[derive(Debug, Clone)]
pub enum MessageOutcome {
    /// Converted; resources in output order
    Converted {
        /// 1-based position in the input
        position: usize,
        /// MSH-10, when present
        control_id: Option<String>,
        resources: Vec<Resource>,
    },
    /// Rejected; nothing was produced for it
    Failed(FailureDetail),
}

impl MessageOutcome {
    pub fn position(&self) -> usize {
        match self {
            MessageOutcome::Converted { position, .. } => *position,
            MessageOutcome::Failed(detail) => detail.position,
        }
    }

    pub fn control_id(&self) -> Option<&str> {
        match self {
            MessageOutcome::Converted { control_id, .. } => control_id.as_deref(),
            MessageOutcome::Failed(detail) => detail.control_id.as_deref(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, MessageOutcome::Converted { .. })
    }
}

/// Counts for a processed batch
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    /// Number of messages converted
    pub successful: usize,
    /// Number of messages rejected
    pub failed: usize,
    /// Resources produced by the converted messages
    pub resources: usize,
    /// One entry per rejected message
    pub failures: Vec<FailureDetail>,
}

impl BatchResult {
    /// Create a new empty batch result
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a converted message
    pub fn add_success(&mut self, resources: usize) {
        self.successful += 1;
        self.resources += resources;
    }

    /// Add a rejected message
    pub fn add_failure(&mut self, failure: FailureDetail) {
        self.failed += 1;
        self.failures.push(failure);
    }

    pub fn total(&self) -> usize {
        self.successful + self.failed
    }

    /// Tallies a list of outcomes
    pub fn from_outcomes(outcomes: &[MessageOutcome]) -> Self {
        let mut result = Self::new();
        for outcome in outcomes {
            match outcome {
                MessageOutcome::Converted { resources, .. } => result.add_success(resources.len()),
                MessageOutcome::Failed(detail) => result.add_failure(detail.clone()),
            }
        }
        result
    }
}

/// Converts one message, never panicking the batch
fn convert_one(converter: &Converter, position: usize, raw: &str) -> MessageOutcome {
    let message = match parse_message(raw) {
        Ok(message) => message,
        Err(e) => {
            let control_id = match &e {
                ParseError::TruncatedMessage { control_id } => control_id.clone(),
                _ => String::new(),
            };
            let err = ConvertError::from(e);
            tracing::warn!(position, error = %err, "Failed to parse message");
            return MessageOutcome::Failed(
                FailureDetail::new(position, &err).with_control_id(control_id),
            );
        }
    };

    let control_id = Some(message.header().control_id.clone()).filter(|id| !id.is_empty());
    match converter.convert_message(&message) {
        Ok(resources) => MessageOutcome::Converted {
            position,
            control_id,
            resources,
        },
        Err(err) => {
            tracing::warn!(
                position,
                control_id = control_id.as_deref().unwrap_or(""),
                error = %err,
                "Failed to convert message"
            );
            let detail = FailureDetail::new(position, &err);
            MessageOutcome::Failed(match control_id {
                Some(id) => detail.with_control_id(id),
                None => detail,
            })
        }
    }
}

/// Batch processor for raw messages
#[derive(Debug, Clone)]
pub struct BatchProcessor {
    converter: Converter,
    config: BatchConfig,
}

impl BatchProcessor {
    /// Create a new batch processor
    pub fn new(converter: Converter, config: BatchConfig) -> Self {
        Self { converter, config }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Splits `raw` into messages and converts them all
    pub async fn process_input(&self, raw: &str) -> Vec<MessageOutcome> {
        self.process_messages(split_messages(raw)).await
    }

    /// Converts already split messages
    ///
    /// The returned outcomes are in input order regardless of which
    /// conversion finished first.
    pub async fn process_messages(&self, messages: Vec<String>) -> Vec<MessageOutcome> {
        let total = messages.len();
        if total == 0 {
            tracing::debug!("No messages to process in batch");
            return Vec::new();
        }

        tracing::info!(
            messages = total,
            max_concurrency = self.config.max_concurrency,
            "Processing batch of messages"
        );

        stream::iter(messages.into_iter().enumerate())
            .map(|(i, raw)| {
                let converter = self.converter.clone();
                let position = i + 1;
                async move {
                    log_batch_progress!(position, total);
                    match tokio::task::spawn_blocking(move || {
                        convert_one(&converter, position, &raw)
                    })
                    .await
                    {
                        Ok(outcome) => outcome,
                        Err(e) => {
                            let err = ConvertError::Other(format!("Conversion task failed: {e}"));
                            tracing::error!(position, error = %err, "Conversion task aborted");
                            MessageOutcome::Failed(FailureDetail::new(position, &err))
                        }
                    }
                }
            })
            .buffered(self.config.max_concurrency)
            .collect()
            .await
    }
}
