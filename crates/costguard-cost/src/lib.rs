// SPDX-FileCopyrightText: 2026 Costguard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-run cost tracking and budget enforcement for LLM calls.
//!
//! This crate provides:
//! - **Price table**: model name (and aliases) to per-1k input/output prices
//! - **Registry cache**: TTL + modification-marker cache over a JSON price file
//! - **Resolver**: ordered price sources with environment-variable fallback
//! - **Budget / tracker**: per-run accumulator with Strict and Soft caps
//! - **Guard**: one tracker per run with a teardown hook on every exit path

pub mod budget;
pub mod cache;
pub mod env_source;
pub mod guard;
pub mod pricing;
pub mod resolver;
pub mod tracker;

pub use budget::Budget;
pub use cache::{PriceRegistryCache, DEFAULT_CACHE_TTL};
pub use env_source::EnvSnapshot;
pub use guard::{CostGuard, CostGuardFactory, GuardHook, LogHook, RunSummary};
pub use pricing::{PriceEntry, PriceTable};
pub use resolver::{PriceResolver, PriceSource};
pub use tracker::CostTracker;
