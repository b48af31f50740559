// SPDX-FileCopyrightText: 2026 Costguard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Covers constraints serde cannot express: non-negative caps, threshold
//! fractions inside `[0, 1]`, and a registry path whenever a mode reads it.

use crate::diagnostic::ConfigError;
use crate::model::CostGuardConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every problem instead of stopping at the first one.
pub fn validate_config(config: &CostGuardConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let cap = config.budget.cap_usd;
    if !cap.is_finite() || cap < 0.0 {
        errors.push(ConfigError::Validation {
            message: format!("budget.cap_usd must be a non-negative number, got {cap}"),
        });
    }

    let threshold = config.budget.warn_threshold_pct;
    if !(0.0..=1.0).contains(&threshold) {
        errors.push(ConfigError::Validation {
            message: format!(
                "budget.warn_threshold_pct must be between 0.0 and 1.0, got {threshold}"
            ),
        });
    }

    if config.pricing.source.uses_registry_file() && config.pricing.registry_path.trim().is_empty()
    {
        errors.push(ConfigError::Validation {
            message: format!(
                "pricing.registry_path must not be empty when pricing.source is `{}`",
                config.pricing.source
            ),
        });
    }

    let level = config.logging.level.trim().to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "logging.level `{}` is not one of: {}",
                config.logging.level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
