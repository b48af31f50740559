// SPDX-FileCopyrightText: 2026 Costguard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-run cost accumulator.
//!
//! Every charge goes through [`CostTracker::charge_dollars`]. The running total
//! is written only after the cap check passes, so a rejected charge never
//! lands, and the total never decreases.

use std::sync::Arc;

use costguard_core::CostGuardError;
use tracing::{debug, warn};

use crate::budget::Budget;
use crate::pricing::PriceTable;

/// Spending state for one run.
#[derive(Debug, Clone)]
pub struct CostTracker {
    budget: Budget,
    prices: Arc<PriceTable>,
    strict_unknown_models: bool,
    total_usd: f64,
    charges: u64,
    rejected: u64,
}

impl CostTracker {
    /// Create a tracker with a zero total. Unknown models are charged $0.
    pub fn new(budget: Budget, prices: Arc<PriceTable>) -> Self {
        Self {
            budget,
            prices,
            strict_unknown_models: false,
            total_usd: 0.0,
            charges: 0,
            rejected: 0,
        }
    }

    /// Fail with `UnknownModel` instead of charging $0 for unpriced models.
    pub fn with_strict_unknown_models(mut self, strict: bool) -> Self {
        self.strict_unknown_models = strict;
        self
    }

    /// Dollar cost of a call, without charging it.
    pub fn cost_of(
        &self,
        model: &str,
        prompt_units: u64,
        completion_units: u64,
    ) -> Result<f64, CostGuardError> {
        match self.prices.get(model) {
            Some(entry) => Ok(entry.cost(prompt_units, completion_units)),
            None if self.strict_unknown_models => Err(CostGuardError::UnknownModel {
                model: model.to_string(),
            }),
            None => {
                debug!(model, "model not in price table, charging $0");
                Ok(0.0)
            }
        }
    }

    /// Charge one model call and return the new total.
    pub fn report_usage(
        &mut self,
        model: &str,
        prompt_units: u64,
        completion_units: u64,
    ) -> Result<f64, CostGuardError> {
        let delta = self.cost_of(model, prompt_units, completion_units)?;
        let context =
            format!("model={model}, prompt={prompt_units}, completion={completion_units}");
        self.charge_dollars(delta, &context)
    }

    /// Charge a flat dollar amount and return the new total.
    ///
    /// In Strict mode with a cap set, an attempted total at or above the cap
    /// fails with `CostCapExceeded` and leaves the total unchanged. Amounts
    /// that are negative, not finite, or would overflow the total fail with
    /// `InvalidCharge`.
    pub fn charge_dollars(&mut self, amount: f64, context: &str) -> Result<f64, CostGuardError> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(CostGuardError::InvalidCharge { amount });
        }

        let attempted = self.total_usd + amount;
        if !attempted.is_finite() {
            return Err(CostGuardError::InvalidCharge { amount });
        }
        if self.budget.rejects_at_cap() && attempted >= self.budget.cap_usd() {
            self.rejected += 1;
            warn!(
                attempted_usd = attempted,
                cap_usd = self.budget.cap_usd(),
                context,
                "charge rejected by cost cap"
            );
            return Err(CostGuardError::CostCapExceeded {
                attempted,
                cap: self.budget.cap_usd(),
                detail: context.to_string(),
            });
        }

        let was_near = self.near_threshold();
        self.total_usd = attempted;
        self.charges += 1;
        debug!(
            amount_usd = amount,
            total_usd = self.total_usd,
            context,
            "charge committed"
        );
        if !was_near && self.near_threshold() {
            warn!(
                total_usd = self.total_usd,
                cap_usd = self.budget.cap_usd(),
                "run crossed warning threshold"
            );
        }
        Ok(self.total_usd)
    }

    /// Whether the total has reached `cap * warn_threshold`.
    ///
    /// Always false without a cap.
    pub fn near_threshold(&self) -> bool {
        self.budget
            .warn_at_usd()
            .is_some_and(|warn_at| self.total_usd >= warn_at)
    }

    pub fn total_usd(&self) -> f64 {
        self.total_usd
    }

    /// Dollars left before the cap, if a cap is set.
    ///
    /// Negative once a Soft run overspends.
    pub fn remaining_usd(&self) -> Option<f64> {
        self.budget
            .is_enforced()
            .then(|| self.budget.cap_usd() - self.total_usd)
    }

    /// Number of committed charges.
    pub fn charge_count(&self) -> u64 {
        self.charges
    }

    /// Number of charges rejected by the cap.
    pub fn rejected_count(&self) -> u64 {
        self.rejected
    }

    pub fn budget(&self) -> &Budget {
        &self.budget
    }

    pub fn prices(&self) -> &Arc<PriceTable> {
        &self.prices
    }

    pub fn strict_unknown_models(&self) -> bool {
        self.strict_unknown_models
    }
}
