// SPDX-FileCopyrightText: 2026 Costguard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Costguard - budget guard for LLM calls.
//!
//! Command-line entry point: inspect the resolved price table, dry-run a
//! guarded charge, or print the effective configuration.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use costguard_config::{ConfigError, CostGuardConfig};
use costguard_core::CostGuardError;
use costguard_cost::{CostGuardFactory, PriceEntry, PriceRegistryCache, PriceTable};
use tracing::debug;

/// Costguard - budget guard for LLM calls.
#[derive(Parser, Debug)]
#[command(name = "costguard", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this TOML file instead of the standard hierarchy.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve the price table and print it.
    Prices {
        /// Print only this model (aliases accepted).
        #[arg(long)]
        model: Option<String>,
        /// Print the canonical entries as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Run one guarded run that reports the same usage one or more times.
    Charge {
        #[arg(long)]
        model: String,
        /// Prompt (input) units per call.
        #[arg(long, default_value_t = 0)]
        prompt: u64,
        /// Completion (output) units per call.
        #[arg(long, default_value_t = 0)]
        completion: u64,
        /// Number of calls to report.
        #[arg(long, default_value_t = 1)]
        repeat: u32,
    },
    /// Print the effective configuration as TOML.
    Config,
}

fn main() {
    let cli = Cli::parse();

    let config = match load(&cli) {
        Ok(config) => config,
        Err(errors) => {
            costguard_config::render_errors(&errors);
            std::process::exit(1);
        }
    };
    init_tracing(&config.logging.level);
    debug!(config = ?cli.config, "configuration loaded");

    let outcome = match cli.command {
        Some(Commands::Prices { model, json }) => cmd_prices(&config, model.as_deref(), json),
        Some(Commands::Charge {
            model,
            prompt,
            completion,
            repeat,
        }) => cmd_charge(&config, &model, prompt, completion, repeat),
        Some(Commands::Config) => cmd_config(&config),
        None => {
            println!("costguard: use --help for available commands");
            Ok(())
        }
    };

    if let Err(err) = outcome {
        eprintln!("costguard: {err}");
        std::process::exit(1);
    }
}

fn load(cli: &Cli) -> Result<CostGuardConfig, Vec<ConfigError>> {
    match &cli.config {
        Some(path) => costguard_config::load_and_validate_path(path),
        None => costguard_config::load_and_validate(),
    }
}

/// Initialize the tracing subscriber with an env filter.
///
/// `RUST_LOG` wins over the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("costguard={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

fn factory(config: &CostGuardConfig) -> Result<CostGuardFactory, CostGuardError> {
    let cache = Arc::new(PriceRegistryCache::new(Duration::from_secs(
        config.pricing.cache_ttl_secs,
    )));
    CostGuardFactory::from_config(config, cache)
}

fn cmd_prices(
    config: &CostGuardConfig,
    model: Option<&str>,
    json: bool,
) -> Result<(), CostGuardError> {
    let factory = factory(config)?;
    let resolved = factory.resolver().resolve_with_source();
    let Some((table, source)) = resolved else {
        println!("no price source could be loaded; all models charge $0");
        return Ok(());
    };

    if json {
        let entries = match model {
            Some(name) => vec![lookup(&table, name)?],
            None => canonical_entries(&table),
        };
        let rendered = serde_json::to_string_pretty(&entries)
            .map_err(|e| CostGuardError::Internal(format!("failed to render prices: {e}")))?;
        println!("{rendered}");
        return Ok(());
    }

    match model {
        Some(name) => {
            let entry = lookup(&table, name)?;
            println!(
                "{}: input ${} / 1k, output ${} / 1k (from {})",
                entry.model,
                entry.input_per_1k_usd,
                entry.output_per_1k_usd,
                source.label()
            );
        }
        None => {
            println!("{} models from {}", table.len(), source.label());
            for line in price_lines(&table) {
                println!("{line}");
            }
        }
    }
    Ok(())
}

fn lookup<'a>(table: &'a PriceTable, name: &str) -> Result<&'a PriceEntry, CostGuardError> {
    table.get(name).ok_or_else(|| CostGuardError::UnknownModel {
        model: name.to_string(),
    })
}

/// Entries under their canonical name only, aliases skipped.
fn canonical_entries(table: &PriceTable) -> Vec<&PriceEntry> {
    table
        .iter()
        .filter(|(key, entry)| *key == entry.model)
        .map(|(_, entry)| entry)
        .collect()
}

/// One display line per lookup key, aliases pointing at their canonical model.
fn price_lines(table: &PriceTable) -> Vec<String> {
    table
        .iter()
        .map(|(key, entry)| {
            let provider = entry.provider.as_deref().unwrap_or("-");
            let alias = if key == entry.model {
                String::new()
            } else {
                format!(" (alias of {})", entry.model)
            };
            format!(
                "  {key:<32} {provider:<12} in {:>10} out {:>10}{alias}",
                entry.input_per_1k_usd, entry.output_per_1k_usd
            )
        })
        .collect()
}

fn cmd_charge(
    config: &CostGuardConfig,
    model: &str,
    prompt: u64,
    completion: u64,
    repeat: u32,
) -> Result<(), CostGuardError> {
    let factory = factory(config)?;
    let mut guard = factory.enter();
    for call in 1..=repeat {
        let total = guard.report_usage(model, prompt, completion)?;
        println!(
            "call {call}: total ${total:.6} near_threshold={}",
            guard.near_threshold()
        );
    }
    let summary = guard.finish();
    println!(
        "run {}: {} charges, total ${:.6}, cap ${:.6} ({})",
        summary.run_id, summary.charges, summary.total_usd, summary.cap_usd, summary.enforce_mode
    );
    Ok(())
}

fn cmd_config(config: &CostGuardConfig) -> Result<(), CostGuardError> {
    let rendered =
        toml::to_string_pretty(config).map_err(|e| CostGuardError::Config(e.to_string()))?;
    print!("{rendered}");
    Ok(())
}
