//! Batch command implementation
//!
//! Converts every message of a multi-message input. Each converted message
//! gets its own `NNNN_<control id>/` directory; failures are listed in the
//! summary and do not stop the rest.

use super::{load_settings, read_input};
use crate::adapters::output::{message_dir_name, write_resources, write_resources_to_dir};
use crate::cli::{EXIT_CONVERSION_FAILED, EXIT_OK, EXIT_USAGE};
use crate::config::MAX_BATCH_CONCURRENCY;
use crate::core::batch::{BatchConfig, BatchProcessor, BatchResult, BatchSummary, MessageOutcome};
use crate::core::transform::Converter;
use clap::Args;
use std::path::PathBuf;
use std::time::Instant;

/// Arguments for the batch command
#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Input file holding one or more messages, or `-` for stdin
    pub input: String,

    /// Root directory for per-message output (overrides output.directory)
    #[arg(short = 'o', long = "output-dir")]
    pub output_dir: Option<String>,

    /// Messages converted at once (overrides batch.max_concurrency)
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Write all resources to stdout as NDJSON instead of files
    #[arg(long)]
    pub stdout: bool,
}

impl BatchArgs {
    /// Execute the batch command
    pub async fn execute(&self, config_path: Option<&str>) -> anyhow::Result<i32> {
        let Some(config) = load_settings(config_path) else {
            return Ok(EXIT_USAGE);
        };

        let concurrency = self.concurrency.unwrap_or(config.batch.max_concurrency);
        if concurrency == 0 || concurrency > MAX_BATCH_CONCURRENCY {
            eprintln!("Error: --concurrency must be between 1 and {MAX_BATCH_CONCURRENCY}");
            return Ok(EXIT_USAGE);
        }

        let raw = match read_input(&self.input) {
            Ok(raw) => raw,
            Err(e) => {
                eprintln!("Error: {e:#}");
                return Ok(EXIT_USAGE);
            }
        };

        let converter = Converter::from_config(&config.terminology)?;
        let processor = BatchProcessor::new(converter, BatchConfig::new(concurrency));

        let started = Instant::now();
        let outcomes = processor.process_input(&raw).await;

        let pretty = config.output.pretty;
        if self.stdout {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            for outcome in &outcomes {
                if let MessageOutcome::Converted { resources, .. } = outcome {
                    write_resources(&mut lock, resources, false)?;
                }
            }
        } else {
            let root = PathBuf::from(
                self.output_dir
                    .clone()
                    .unwrap_or_else(|| config.output.directory.clone()),
            );
            for outcome in &outcomes {
                if let MessageOutcome::Converted {
                    position,
                    control_id,
                    resources,
                } = outcome
                {
                    let dir = root.join(message_dir_name(*position, control_id.as_deref()));
                    write_resources_to_dir(resources, &dir, pretty)?;
                }
            }
        }

        let summary =
            BatchSummary::from(BatchResult::from_outcomes(&outcomes)).with_duration(started.elapsed());
        summary.log_summary();
        // stdout may be carrying NDJSON
        if self.stdout {
            eprintln!("{summary}");
        } else {
            println!("{summary}");
        }

        Ok(if summary.is_successful() {
            EXIT_OK
        } else {
            EXIT_CONVERSION_FAILED
        })
    }
}
