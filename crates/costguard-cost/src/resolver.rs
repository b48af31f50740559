// SPDX-FileCopyrightText: 2026 Costguard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ordered price-source resolution.
//!
//! A resolver walks its sources in order and returns the first table that
//! loads. Failures are logged and the next source is tried; when every source
//! fails the caller still gets an empty table. `SourceMode::Auto` is the
//! list `[Structured, Environment]`.

use std::path::PathBuf;
use std::sync::Arc;

use costguard_config::PricingConfig;
use costguard_core::{CostGuardError, SourceMode};
use tracing::{debug, warn};

use crate::cache::PriceRegistryCache;
use crate::env_source::EnvSnapshot;
use crate::pricing::PriceTable;

/// One place prices can come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriceSource {
    /// JSON registry file, read through the shared cache.
    Structured(PathBuf),
    /// `PRICE__<MODEL>__INPUT/OUTPUT` variables.
    Environment,
}

impl PriceSource {
    pub fn label(&self) -> &'static str {
        match self {
            PriceSource::Structured(_) => "structured",
            PriceSource::Environment => "environment",
        }
    }
}

/// Resolves a usable price table from an ordered list of sources.
#[derive(Debug, Clone)]
pub struct PriceResolver {
    sources: Vec<PriceSource>,
    cache: Arc<PriceRegistryCache>,
    env_table: Arc<PriceTable>,
}

impl PriceResolver {
    /// Build a resolver over explicit sources.
    ///
    /// The environment snapshot is converted once, here.
    pub fn new(
        sources: Vec<PriceSource>,
        cache: Arc<PriceRegistryCache>,
        env: &EnvSnapshot,
    ) -> Self {
        Self {
            sources,
            cache,
            env_table: Arc::new(env.price_table()),
        }
    }

    /// The source list a `SourceMode` stands for.
    pub fn sources_for_mode(
        mode: SourceMode,
        registry_path: impl Into<PathBuf>,
    ) -> Vec<PriceSource> {
        let structured = PriceSource::Structured(registry_path.into());
        match mode {
            SourceMode::Auto => vec![structured, PriceSource::Environment],
            SourceMode::Structured => vec![structured],
            SourceMode::Environment => vec![PriceSource::Environment],
        }
    }

    /// Build a resolver from configuration and an explicit environment snapshot.
    pub fn from_config(
        config: &PricingConfig,
        cache: Arc<PriceRegistryCache>,
        env: &EnvSnapshot,
    ) -> Self {
        let sources = Self::sources_for_mode(config.source, &config.registry_path);
        Self::new(sources, cache, env)
    }

    pub fn sources(&self) -> &[PriceSource] {
        &self.sources
    }

    pub fn cache(&self) -> &Arc<PriceRegistryCache> {
        &self.cache
    }

    /// Load a single source, surfacing its error.
    pub fn load_source(&self, source: &PriceSource) -> Result<Arc<PriceTable>, CostGuardError> {
        match source {
            PriceSource::Structured(path) => self.cache.load(path),
            PriceSource::Environment => Ok(Arc::clone(&self.env_table)),
        }
    }

    /// First table that loads, or an empty table. Never fails.
    pub fn resolve(&self) -> Arc<PriceTable> {
        self.resolve_with_source()
            .map(|(table, _)| table)
            .unwrap_or_default()
    }

    /// Like [`resolve`](Self::resolve), also reporting which source won.
    ///
    /// `None` means every source failed. A registry failure with a later
    /// source to fall back on is logged at debug, anything else at warn.
    pub fn resolve_with_source(&self) -> Option<(Arc<PriceTable>, &PriceSource)> {
        for (position, source) in self.sources.iter().enumerate() {
            match self.load_source(source) {
                Ok(table) => {
                    debug!(source = source.label(), models = table.len(), "price table resolved");
                    return Some((table, source));
                }
                Err(err) => {
                    let has_fallback = position + 1 < self.sources.len();
                    if has_fallback && err.is_registry_error() {
                        debug!(
                            source = source.label(),
                            error = %err,
                            "price source failed, trying next"
                        );
                    } else {
                        warn!(source = source.label(), error = %err, "price source failed");
                    }
                }
            }
        }
        warn!("no price source available, using an empty price table");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tracing_test::traced_test;

    fn env() -> EnvSnapshot {
        EnvSnapshot::from_pairs([
            ("PRICE__GPT4O__INPUT", "0.005"),
            ("PRICE__GPT4O__OUTPUT", "0.015"),
        ])
    }

    fn cache() -> Arc<PriceRegistryCache> {
        Arc::new(PriceRegistryCache::new(Duration::from_secs(300)))
    }

    #[test]
    fn auto_mode_orders_structured_first() {
        let sources = PriceResolver::sources_for_mode(SourceMode::Auto, "p.json");
        assert_eq!(
            sources,
            vec![
                PriceSource::Structured(PathBuf::from("p.json")),
                PriceSource::Environment
            ]
        );
    }

    #[test]
    fn missing_file_falls_back_to_environment() {
        let dir = tempfile::tempdir().unwrap();
        let sources =
            PriceResolver::sources_for_mode(SourceMode::Auto, dir.path().join("missing.json"));
        let resolver = PriceResolver::new(sources, cache(), &env());

        let (table, source) = resolver.resolve_with_source().unwrap();
        assert_eq!(source, &PriceSource::Environment);
        assert_eq!(table.get("gpt4o").unwrap().prices(), (0.005, 0.015));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn malformed_file_falls_back_to_environment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prices.json");
        std::fs::write(&path, "[{").unwrap();
        let resolver = PriceResolver::new(
            PriceResolver::sources_for_mode(SourceMode::Auto, &path),
            cache(),
            &env(),
        );
        assert!(resolver.resolve().contains("gpt4o"));
    }

    #[test]
    fn structured_file_wins_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prices.json");
        std::fs::write(
            &path,
            r#"[{"model": "claude-3-haiku",
                 "input_per_1k_usd": 0.00025, "output_per_1k_usd": 0.00125}]"#,
        )
        .unwrap();
        let resolver = PriceResolver::new(
            PriceResolver::sources_for_mode(SourceMode::Auto, &path),
            cache(),
            &env(),
        );

        let table = resolver.resolve();
        assert!(table.contains("claude-3-haiku"));
        assert!(!table.contains("gpt4o"));
    }

    #[test]
    fn structured_only_mode_degrades_to_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        let sources = PriceResolver::sources_for_mode(SourceMode::Structured, missing);
        let resolver = PriceResolver::new(sources, cache(), &env());
        assert!(resolver.resolve_with_source().is_none());
        assert!(resolver.resolve().is_empty());
    }

    #[test]
    fn environment_mode_ignores_file() {
        let config = PricingConfig {
            source: SourceMode::Environment,
            ..PricingConfig::default()
        };
        let resolver = PriceResolver::from_config(&config, cache(), &env());
        assert_eq!(resolver.sources(), &[PriceSource::Environment]);
        assert!(resolver.resolve().contains("gpt4o"));
    }

    #[test]
    fn load_source_surfaces_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = PriceResolver::new(Vec::new(), cache(), &EnvSnapshot::default());
        let err = resolver
            .load_source(&PriceSource::Structured(dir.path().join("missing.json")))
            .unwrap_err();
        assert!(matches!(err, CostGuardError::RegistryNotFound { .. }));
    }

    #[traced_test]
    #[test]
    fn registry_failure_with_fallback_logs_at_debug() {
        let dir = tempfile::tempdir().unwrap();
        let sources =
            PriceResolver::sources_for_mode(SourceMode::Auto, dir.path().join("missing.json"));
        let resolver = PriceResolver::new(sources, cache(), &env());

        assert!(resolver.resolve().contains("gpt4o"));
        assert!(logs_contain("price source failed, trying next"));
        assert!(!logs_contain("WARN"));
    }

    #[traced_test]
    #[test]
    fn last_source_failure_logs_a_warning() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        let sources = PriceResolver::sources_for_mode(SourceMode::Structured, missing);
        let resolver = PriceResolver::new(sources, cache(), &env());

        assert!(resolver.resolve().is_empty());
        assert!(logs_contain("WARN"));
        assert!(logs_contain("price source failed"));
    }
}
