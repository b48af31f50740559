// SPDX-FileCopyrightText: 2026 Costguard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for costguard.
//!
//! Budgets and price-source settings are read from TOML files in the XDG
//! hierarchy, the historical `COST_*` / `PRICE_*` environment names, and
//! `COSTGUARD_*` overrides. Unknown keys are rejected and reported as miette
//! diagnostics with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use costguard_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("cap: ${}", config.budget.cap_usd);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{render_errors, render_report, ConfigError};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{BudgetConfig, CostGuardConfig, LoggingConfig, PricingConfig};

/// Load configuration from the standard hierarchy and validate it.
///
/// Figment errors are converted into diagnostics; validation errors are
/// collected rather than failing on the first one.
pub fn load_and_validate() -> Result<CostGuardConfig, Vec<ConfigError>> {
    finish(loader::load_config())
}

/// Load configuration from an inline TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<CostGuardConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_str(toml_content))
}

/// Load configuration from an explicit file (plus env overrides) and validate it.
pub fn load_and_validate_path(path: &Path) -> Result<CostGuardConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_path(path))
}

#[allow(clippy::result_large_err)]
fn finish(
    loaded: Result<CostGuardConfig, figment::Error>,
) -> Result<CostGuardConfig, Vec<ConfigError>> {
    let errors = match loaded {
        Ok(config) => match validation::validate_config(&config) {
            Ok(()) => return Ok(config),
            Err(errors) => errors,
        },
        Err(err) => diagnostic::figment_to_config_errors(err),
    };
    tracing::debug!(count = errors.len(), "configuration rejected");
    Err(errors)
}
