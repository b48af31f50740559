// SPDX-FileCopyrightText: 2026 Costguard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the costguard workspace.

use std::path::PathBuf;

use thiserror::Error;

/// The error type returned by price loading, budget construction, and charges.
///
/// Registry variants are contained by the price resolver and never reach a
/// tracker. `UnknownModel` and `CostCapExceeded` are the two variants a run's
/// caller sees: the first is a pricing data problem, the second a budget
/// decision.
#[derive(Debug, Error)]
pub enum CostGuardError {
    /// The structured price registry file does not exist.
    #[error("price registry not found at {}", path.display())]
    RegistryNotFound { path: PathBuf },

    /// The registry file exists but could not be read or stat'ed.
    #[error("failed to read price registry {}: {source}", path.display())]
    RegistryRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The registry file is not valid JSON.
    #[error("failed to parse price registry {}: {source}", path.display())]
    RegistryParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// A model has no price and strict unknown-model handling is on.
    #[error("model '{model}' not found in price registry")]
    UnknownModel { model: String },

    /// A Strict-mode charge would reach or pass the cap. Nothing was committed.
    #[error("cost cap exceeded: attempted ${attempted:.4} >= cap ${cap:.4} ({detail})")]
    CostCapExceeded {
        attempted: f64,
        cap: f64,
        detail: String,
    },

    /// A charge amount was negative or not finite.
    #[error("invalid charge amount: {amount}")]
    InvalidCharge { amount: f64 },

    /// Budget parameters were rejected at construction.
    #[error("invalid budget: {0}")]
    InvalidBudget(String),

    /// Configuration errors surfaced outside the config crate's diagnostics.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors (poisoned locks and the like).
    #[error("internal error: {0}")]
    Internal(String),
}

impl CostGuardError {
    /// True only for the Strict-mode cap rejection.
    pub fn is_budget_exhausted(&self) -> bool {
        matches!(self, CostGuardError::CostCapExceeded { .. })
    }

    /// True for errors that originate in the price registry file.
    pub fn is_registry_error(&self) -> bool {
        matches!(
            self,
            CostGuardError::RegistryNotFound { .. }
                | CostGuardError::RegistryRead { .. }
                | CostGuardError::RegistryParse { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cap_exceeded_message_carries_amounts() {
        let err = CostGuardError::CostCapExceeded {
            attempted: 0.01,
            cap: 0.006,
            detail: "model=gpt4o".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("cost cap exceeded"), "got: {msg}");
        assert!(msg.contains("$0.0100"), "got: {msg}");
        assert!(msg.contains("$0.0060"), "got: {msg}");
        assert!(msg.contains("model=gpt4o"), "got: {msg}");
    }

    #[test]
    fn unknown_model_is_not_budget_exhausted() {
        let unknown = CostGuardError::UnknownModel {
            model: "ghost-model".into(),
        };
        assert!(!unknown.is_budget_exhausted());
        assert!(!unknown.is_registry_error());

        let cap = CostGuardError::CostCapExceeded {
            attempted: 2.0,
            cap: 1.0,
            detail: String::new(),
        };
        assert!(cap.is_budget_exhausted());
    }

    #[test]
    fn registry_errors_are_classified() {
        let err = CostGuardError::RegistryNotFound {
            path: PathBuf::from("/nope/prices.json"),
        };
        assert!(err.is_registry_error());
        assert!(err.to_string().contains("/nope/prices.json"));
    }
}
