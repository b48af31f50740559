// SPDX-FileCopyrightText: 2026 Costguard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Run-scoped cost guards.
//!
//! A [`CostGuardFactory`] is built once per process. Each run calls
//! [`CostGuardFactory::enter`] (or [`CostGuardFactory::run`]) to get a fresh
//! [`CostTracker`] wrapped in a [`CostGuard`]. Teardown hooks fire exactly
//! once when the guard is finished or dropped, including when a
//! `CostCapExceeded` error is propagating through the caller or the thread
//! is unwinding. Teardown never touches the caller's result.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::{Duration, Instant};

use costguard_config::CostGuardConfig;
use costguard_core::{CostGuardError, EnforceMode};
use tracing::{info, warn};
use uuid::Uuid;

use crate::budget::Budget;
use crate::cache::PriceRegistryCache;
use crate::env_source::EnvSnapshot;
use crate::resolver::PriceResolver;
use crate::tracker::CostTracker;

/// Final state of one run, handed to every hook at teardown.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub total_usd: f64,
    pub cap_usd: f64,
    pub enforce_mode: EnforceMode,
    pub charges: u64,
    pub rejected: u64,
    pub near_threshold: bool,
    pub elapsed: Duration,
}

/// Called once per run at teardown.
///
/// Hooks run inside `Drop` and must not panic.
pub trait GuardHook: Send + Sync {
    fn on_exit(&self, summary: &RunSummary);
}

/// Emits one structured log event per finished run.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogHook;

impl GuardHook for LogHook {
    fn on_exit(&self, summary: &RunSummary) {
        if summary.rejected > 0 || summary.near_threshold {
            warn!(
                run_id = %summary.run_id,
                total_usd = summary.total_usd,
                cap_usd = summary.cap_usd,
                charges = summary.charges,
                rejected = summary.rejected,
                near_threshold = summary.near_threshold,
                "cost guard run finished near or over budget"
            );
        } else {
            info!(
                run_id = %summary.run_id,
                total_usd = summary.total_usd,
                cap_usd = summary.cap_usd,
                charges = summary.charges,
                elapsed_ms = summary.elapsed.as_millis() as u64,
                "cost guard run finished"
            );
        }
    }
}

/// Builds one [`CostGuard`] per run from shared budget and pricing state.
#[derive(Clone)]
pub struct CostGuardFactory {
    budget: Budget,
    resolver: PriceResolver,
    strict_unknown_models: bool,
    hooks: Vec<Arc<dyn GuardHook>>,
}

impl std::fmt::Debug for CostGuardFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CostGuardFactory")
            .field("budget", &self.budget)
            .field("resolver", &self.resolver)
            .field("strict_unknown_models", &self.strict_unknown_models)
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

impl CostGuardFactory {
    /// Create a factory with the default [`LogHook`].
    pub fn new(budget: Budget, resolver: PriceResolver) -> Self {
        Self {
            budget,
            resolver,
            strict_unknown_models: false,
            hooks: vec![Arc::new(LogHook)],
        }
    }

    /// Build from configuration, capturing `PRICE__*` variables from the process.
    pub fn from_config(
        config: &CostGuardConfig,
        cache: Arc<PriceRegistryCache>,
    ) -> Result<Self, CostGuardError> {
        Self::from_config_with_env(config, cache, &EnvSnapshot::capture())
    }

    /// Build from configuration and an explicit environment snapshot.
    pub fn from_config_with_env(
        config: &CostGuardConfig,
        cache: Arc<PriceRegistryCache>,
        env: &EnvSnapshot,
    ) -> Result<Self, CostGuardError> {
        let budget = Budget::from_config(&config.budget)?;
        let resolver = PriceResolver::from_config(&config.pricing, cache, env);
        Ok(Self::new(budget, resolver)
            .with_strict_unknown_models(config.pricing.strict_unknown_models))
    }

    pub fn with_strict_unknown_models(mut self, strict: bool) -> Self {
        self.strict_unknown_models = strict;
        self
    }

    /// Add a teardown hook after the existing ones.
    pub fn with_hook(mut self, hook: Arc<dyn GuardHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Remove every hook, including the default log hook.
    pub fn without_hooks(mut self) -> Self {
        self.hooks.clear();
        self
    }

    pub fn budget(&self) -> &Budget {
        &self.budget
    }

    pub fn resolver(&self) -> &PriceResolver {
        &self.resolver
    }

    /// Start a run: resolve prices and hand out a fresh tracker.
    pub fn enter(&self) -> CostGuard {
        let prices = self.resolver.resolve();
        let tracker = CostTracker::new(self.budget, prices)
            .with_strict_unknown_models(self.strict_unknown_models);
        CostGuard {
            run_id: Uuid::new_v4(),
            tracker,
            hooks: self.hooks.clone(),
            started: Instant::now(),
            finished: false,
        }
    }

    /// Run `f` inside a guard and return its result untouched.
    pub fn run<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut CostTracker) -> Result<T, E>,
    {
        let mut guard = self.enter();
        let result = f(&mut guard);
        guard.finish();
        result
    }
}

/// One run's tracker plus its teardown obligation.
///
/// Derefs to [`CostTracker`].
pub struct CostGuard {
    run_id: Uuid,
    tracker: CostTracker,
    hooks: Vec<Arc<dyn GuardHook>>,
    started: Instant,
    finished: bool,
}

impl CostGuard {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn tracker(&self) -> &CostTracker {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut CostTracker {
        &mut self.tracker
    }

    /// Snapshot of the run so far.
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            run_id: self.run_id,
            total_usd: self.tracker.total_usd(),
            cap_usd: self.tracker.budget().cap_usd(),
            enforce_mode: self.tracker.budget().enforce_mode(),
            charges: self.tracker.charge_count(),
            rejected: self.tracker.rejected_count(),
            near_threshold: self.tracker.near_threshold(),
            elapsed: self.started.elapsed(),
        }
    }

    /// End the run now, run the hooks, and return the final summary.
    pub fn finish(mut self) -> RunSummary {
        self.teardown()
    }

    fn teardown(&mut self) -> RunSummary {
        let summary = self.summary();
        if !self.finished {
            self.finished = true;
            for hook in &self.hooks {
                hook.on_exit(&summary);
            }
        }
        summary
    }
}

impl Deref for CostGuard {
    type Target = CostTracker;

    fn deref(&self) -> &CostTracker {
        &self.tracker
    }
}

impl DerefMut for CostGuard {
    fn deref_mut(&mut self) -> &mut CostTracker {
        &mut self.tracker
    }
}

impl Drop for CostGuard {
    fn drop(&mut self) {
        if !self.finished {
            self.teardown();
        }
    }
}

impl std::fmt::Debug for CostGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CostGuard")
            .field("run_id", &self.run_id)
            .field("tracker", &self.tracker)
            .field("finished", &self.finished)
            .finish()
    }
}
