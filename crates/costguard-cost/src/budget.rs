// SPDX-FileCopyrightText: 2026 Costguard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-run budget: cap, warning threshold, and enforcement mode.
//!
//! A cap of zero (or below) disables enforcement entirely; every cap check
//! downstream goes through [`Budget::is_enforced`].

use costguard_config::BudgetConfig;
use costguard_core::{CostGuardError, EnforceMode};

/// Immutable spending limits for one run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Budget {
    cap_usd: f64,
    warn_threshold: f64,
    enforce_mode: EnforceMode,
}

impl Budget {
    /// Create a budget.
    ///
    /// `warn_threshold` must lie in `[0, 1]` and `cap_usd` must be finite.
    pub fn new(
        cap_usd: f64,
        warn_threshold: f64,
        enforce_mode: EnforceMode,
    ) -> Result<Self, CostGuardError> {
        if !cap_usd.is_finite() {
            return Err(CostGuardError::InvalidBudget(format!(
                "cap must be a finite amount, got {cap_usd}"
            )));
        }
        if !(0.0..=1.0).contains(&warn_threshold) {
            return Err(CostGuardError::InvalidBudget(format!(
                "warn threshold must be between 0.0 and 1.0, got {warn_threshold}"
            )));
        }
        Ok(Self {
            cap_usd,
            warn_threshold,
            enforce_mode,
        })
    }

    /// No cap; charges always succeed.
    pub fn unlimited() -> Self {
        Self {
            cap_usd: 0.0,
            warn_threshold: 0.8,
            enforce_mode: EnforceMode::Strict,
        }
    }

    pub fn from_config(config: &BudgetConfig) -> Result<Self, CostGuardError> {
        Self::new(
            config.cap_usd,
            config.warn_threshold_pct,
            config.enforce_mode,
        )
    }

    pub fn cap_usd(&self) -> f64 {
        self.cap_usd
    }

    pub fn warn_threshold(&self) -> f64 {
        self.warn_threshold
    }

    pub fn enforce_mode(&self) -> EnforceMode {
        self.enforce_mode
    }

    /// Whether a cap is configured at all.
    pub fn is_enforced(&self) -> bool {
        self.cap_usd > 0.0
    }

    /// Whether charges can be rejected.
    pub fn rejects_at_cap(&self) -> bool {
        self.is_enforced() && self.enforce_mode == EnforceMode::Strict
    }

    /// Dollar amount at which a run is near threshold, if a cap is set.
    pub fn warn_at_usd(&self) -> Option<f64> {
        self.is_enforced()
            .then(|| self.cap_usd * self.warn_threshold)
    }
}
