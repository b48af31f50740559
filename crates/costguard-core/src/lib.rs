// SPDX-FileCopyrightText: 2026 Costguard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the costguard workspace.
//!
//! Holds the error type shared by the pricing, budget, and guard layers, plus
//! the small enums that configuration and runtime code both need to agree on.

pub mod error;
pub mod types;

pub use error::CostGuardError;
pub use types::{normalize_model_key, EnforceMode, SourceMode};
