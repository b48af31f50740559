// SPDX-FileCopyrightText: 2026 Costguard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Merge order (later overrides earlier):
//! 1. Compiled defaults
//! 2. `/etc/costguard/costguard.toml`
//! 3. `~/.config/costguard/costguard.toml`
//! 4. `./costguard.toml`
//! 5. Historical variable names (`COST_CAP_USD`, `PRICE_STRICT`, ...)
//! 6. `COSTGUARD_*` environment variables

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::CostGuardConfig;

/// Historical environment names and the config paths they feed.
///
/// `PRICE__<MODEL>__*` pairs are not listed here; those are price data and
/// are read by the environment price source, not by configuration.
pub const LEGACY_ENV_KEYS: &[(&str, &str)] = &[
    ("COST_CAP_USD", "budget.cap_usd"),
    ("COST_WARN_THRESHOLD_PCT", "budget.warn_threshold_pct"),
    ("COST_ENFORCE", "budget.enforce_mode"),
    ("PRICE_REGISTRY_PATH", "pricing.registry_path"),
    ("PRICE_STRICT", "pricing.strict_unknown_models"),
];

/// Load configuration from the standard hierarchy with env var overrides.
pub fn load_config() -> Result<CostGuardConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from an inline TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<CostGuardConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CostGuardConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<CostGuardConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CostGuardConfig::default()))
        .merge(Toml::file(path))
        .merge(legacy_env_provider())
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for the standard load, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(CostGuardConfig::default()))
        .merge(Toml::file("/etc/costguard/costguard.toml"))
        .merge(Toml::file(user_config_path()))
        .merge(Toml::file("costguard.toml"))
        .merge(legacy_env_provider())
        .merge(env_provider())
}

fn user_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("costguard/costguard.toml"))
        .unwrap_or_default()
}

/// Provider for the historical flat variable names.
fn legacy_env_provider() -> Env {
    Env::raw().filter_map(|key| {
        LEGACY_ENV_KEYS
            .iter()
            .find(|(name, _)| key.as_str().eq_ignore_ascii_case(name))
            .map(|(_, path)| (*path).into())
    })
}

/// `COSTGUARD_*` provider with explicit section mapping.
///
/// `Env::split("_")` would turn `COSTGUARD_BUDGET_CAP_USD` into
/// `budget.cap.usd`; only the first segment names a section. The key reaches
/// `map` with its original case, so it is lowercased first.
fn env_provider() -> Env {
    Env::prefixed("COSTGUARD_").map(|key| {
        let mapped = key
            .as_str()
            .to_ascii_lowercase()
            .replacen("budget_", "budget.", 1)
            .replacen("pricing_", "pricing.", 1)
            .replacen("logging_", "logging.", 1);
        mapped.into()
    })
}
