// SPDX-FileCopyrightText: 2026 Costguard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a misspelled key is a
//! startup error rather than a silently ignored setting.

use costguard_core::{EnforceMode, SourceMode};
use serde::{Deserialize, Deserializer, Serialize};

/// Top-level costguard configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CostGuardConfig {
    /// Per-run spending limits.
    #[serde(default)]
    pub budget: BudgetConfig,

    /// Where model prices come from and how they are cached.
    #[serde(default)]
    pub pricing: PricingConfig,

    /// Log output settings for the binary.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Per-run budget configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BudgetConfig {
    /// Dollar cap for one run. `0.0` disables enforcement.
    #[serde(default)]
    pub cap_usd: f64,

    /// Fraction of the cap at which a run counts as "near threshold".
    #[serde(default = "default_warn_threshold_pct")]
    pub warn_threshold_pct: f64,

    /// `strict` rejects at the cap, `soft` only tracks.
    #[serde(default)]
    pub enforce_mode: EnforceMode,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            cap_usd: 0.0,
            warn_threshold_pct: default_warn_threshold_pct(),
            enforce_mode: EnforceMode::Strict,
        }
    }
}

fn default_warn_threshold_pct() -> f64 {
    0.8
}

/// Price registry configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PricingConfig {
    /// Which sources to consult (`auto`, `structured`, `environment`).
    #[serde(default)]
    pub source: SourceMode,

    /// Path to the JSON price registry.
    #[serde(default = "default_registry_path")]
    pub registry_path: String,

    /// Seconds a loaded registry is trusted before its timestamp is refreshed.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Fail on models missing from the price table instead of charging $0.
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub strict_unknown_models: bool,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            source: SourceMode::Auto,
            registry_path: default_registry_path(),
            cache_ttl_secs: default_cache_ttl_secs(),
            strict_unknown_models: false,
        }
    }
}

fn default_registry_path() -> String {
    "config/model_prices.json".to_string()
}

fn default_cache_ttl_secs() -> u64 {
    300
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Level for the `costguard` targets (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Accepts `true`/`false`, `1`/`0`, and the usual yes/no spellings.
///
/// `PRICE_STRICT=1` arrives from the environment as an integer.
fn deserialize_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
        Text(String),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => Ok(b),
        Flag::Int(n) => Ok(n != 0),
        Flag::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "" | "0" | "false" | "no" | "off" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "expected a boolean flag, got `{other}`"
            ))),
        },
    }
}
