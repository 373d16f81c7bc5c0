//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::DispatcherConfig;
use serde::Serialize;
use tracing::info;

use super::load_config;
use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    listen: String,
    users_table: String,
    servers_table: String,
    chat_config_table: String,
    directory_region: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    directory_endpoint: Option<String>,
    function: String,
    invoke_region: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    invoke_endpoint: Option<String>,
    batch_limit: usize,
    deadline_ms: u64,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!("Validating configuration");

    let result = match load_config(&args.config) {
        Ok((config, source)) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                source: Some(source.to_string()),
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(summarize(&config)),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            source: None,
            error: Some(format!("{e:#}")),
            warnings: None,
            summary: None,
        },
    };

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

fn summarize(config: &DispatcherConfig) -> ConfigSummary {
    ConfigSummary {
        listen: config.http.host.clone(),
        users_table: config.directory.users_table.clone(),
        servers_table: config.directory.servers_table.clone(),
        chat_config_table: config.directory.chat_config_table.clone(),
        directory_region: config.directory.region.clone(),
        directory_endpoint: config.directory.endpoint.clone(),
        function: config.invocation.function.clone(),
        invoke_region: config.invocation.region.clone(),
        invoke_endpoint: config.invocation.endpoint.clone(),
        batch_limit: config.invocation.batch_limit,
        deadline_ms: config.broadcast.deadline_ms,
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &DispatcherConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    // Overrides are meant for local or mock services
    let overrides = [
        ("directory.endpoint", &config.directory.endpoint),
        ("invocation.endpoint", &config.invocation.endpoint),
    ];
    for (field, endpoint) in overrides {
        if let Some(url) = endpoint {
            if url.starts_with("http://") {
                warnings.push(format!("{field} overrides AWS with plain-text {url}"));
            }
        }
    }

    if config.http.drain_timeout_ms < config.broadcast.deadline_ms {
        warnings.push(format!(
            "http.drain_timeout_ms ({}) is shorter than broadcast.deadline_ms ({}) - \
             broadcasts may be cancelled on shutdown",
            config.http.drain_timeout_ms, config.broadcast.deadline_ms
        ));
    }

    warnings
}

fn endpoint_note(endpoint: Option<&str>) -> String {
    endpoint.map(|url| format!(" via {url}")).unwrap_or_default()
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        let source = result.source.as_deref().unwrap_or("unknown");
        println!("✓ Configuration is valid ({})", source);

        if let Some(ref summary) = result.summary {
            println!("\n  Listen: {}", summary.listen);
            println!(
                "  Directory: {} / {} / {} in {}{}",
                summary.users_table,
                summary.servers_table,
                summary.chat_config_table,
                summary.directory_region,
                endpoint_note(summary.directory_endpoint.as_deref())
            );
            println!(
                "  Function: {} in {}{} (batches of {})",
                summary.function,
                summary.invoke_region,
                endpoint_note(summary.invoke_endpoint.as_deref()),
                summary.batch_limit
            );
            println!("  Broadcast deadline: {}ms", summary.deadline_ms);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid");
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
