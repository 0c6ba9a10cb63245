//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    sink_kind: String,
    sink_addr: String,
    workers: usize,
    queue_capacity: usize,
    interval_ms: u64,
    resource_attrs: usize,
    disabled_instruments: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    sink_kind: format!("{:?}", config.sink.kind).to_lowercase(),
                    sink_addr: config.sink.addr.clone(),
                    workers: config.dispatcher.workers,
                    queue_capacity: config.dispatcher.effective_queue_capacity(),
                    interval_ms: config.collect.interval_ms,
                    resource_attrs: config.resource.len(),
                    disabled_instruments: config.disabled_instruments.len(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &contracts::RelayConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.sink.kind == contracts::SinkKind::Log {
        warnings.push("Log sink selected - metrics will not leave the process".to_string());
    }

    if config.collect.interval_ms < 1_000 {
        warnings.push(format!(
            "Sweep interval of {}ms is very frequent for a statsd pipeline",
            config.collect.interval_ms
        ));
    }

    if config.resource.is_empty() {
        warnings.push("No resource attributes configured - writes carry no identity tags".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("Configuration OK: {}", result.config_path);
        if let Some(summary) = &result.summary {
            println!("  sink:       {} ({})", summary.sink_kind, summary.sink_addr);
            println!(
                "  dispatcher: {} worker(s), queue capacity {}",
                summary.workers, summary.queue_capacity
            );
            println!("  collect:    every {}ms", summary.interval_ms);
            println!(
                "  resource:   {} attribute(s), {} disabled instrument(s)",
                summary.resource_attrs, summary.disabled_instruments
            );
        }
        if let Some(warnings) = &result.warnings {
            for warning in warnings {
                println!("  warning: {warning}");
            }
        }
    } else {
        println!("Configuration INVALID: {}", result.config_path);
        if let Some(error) = &result.error {
            println!("  error: {error}");
        }
    }
}
