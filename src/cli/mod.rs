//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for v2fhir using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Exit code for success
pub const EXIT_OK: i32 = 0;
/// Exit code when one or more messages could not be converted
pub const EXIT_CONVERSION_FAILED: i32 = 1;
/// Exit code for configuration or usage errors
pub const EXIT_USAGE: i32 = 2;
/// Exit code for unexpected failures
pub const EXIT_FATAL: i32 = 5;

/// v2fhir - HL7 v2 to FHIR converter
#[derive(Parser, Debug)]
#[command(name = "v2fhir")]
#[command(version, about, long_about = None)]
#[command(author = "v2fhir Contributors")]
pub struct Cli {
    /// Path to configuration file (defaults to ./v2fhir.toml when present)
    #[arg(short, long, env = "V2FHIR_CONFIG")]
    pub config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "V2FHIR_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert one HL7 v2 message into FHIR resources
    Transform(commands::transform::TransformArgs),

    /// Print the segments of a message, or selected field values
    Parse(commands::parse::ParseArgs),

    /// Convert a file holding many messages
    Batch(commands::batch::BatchArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_transform() {
        let cli = Cli::parse_from(["v2fhir", "transform", "adt.hl7"]);
        assert!(cli.config.is_none());
        let Commands::Transform(args) = cli.command else {
            panic!("expected transform");
        };
        assert_eq!(args.input.as_deref(), Some("adt.hl7"));
        assert!(!args.stdout);
    }

    #[test]
    fn test_cli_parse_transform_list_without_input() {
        let cli = Cli::parse_from(["v2fhir", "transform", "--list"]);
        let Commands::Transform(args) = cli.command else {
            panic!("expected transform");
        };
        assert!(args.list);
        assert!(args.input.is_none());
    }

    #[test]
    fn test_cli_transform_requires_input() {
        assert!(Cli::try_parse_from(["v2fhir", "transform"]).is_err());
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["v2fhir", "--config", "custom.toml", "validate-config"]);
        assert_eq!(cli.config.as_deref(), Some("custom.toml"));
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["v2fhir", "--log-level", "debug", "init"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
        assert!(matches!(cli.command, Commands::Init(_)));
    }

    #[test]
    fn test_cli_parse_fields() {
        let cli = Cli::parse_from(["v2fhir", "parse", "-", "--field", "PID-5.1", "--field", "MSH-10"]);
        let Commands::Parse(args) = cli.command else {
            panic!("expected parse");
        };
        assert_eq!(args.input, "-");
        assert_eq!(args.field, vec!["PID-5.1", "MSH-10"]);
    }

    #[test]
    fn test_cli_parse_batch() {
        let cli = Cli::parse_from(["v2fhir", "batch", "feed.hl7", "--concurrency", "2", "-o", "out"]);
        let Commands::Batch(args) = cli.command else {
            panic!("expected batch");
        };
        assert_eq!(args.concurrency, Some(2));
        assert_eq!(args.output_dir.as_deref(), Some("out"));
    }
}
