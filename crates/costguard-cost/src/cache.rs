// SPDX-FileCopyrightText: 2026 Costguard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared cache over the structured price registry file.
//!
//! The file's modification time is checked on every load, which costs one
//! `stat`. A changed marker (or a different path) always re-parses, even
//! inside the TTL window. An unchanged marker never re-parses; once the TTL
//! has elapsed only the refresh timestamp moves. Where the platform reports
//! no modification time the cache degrades to plain TTL expiry.
//!
//! One cache is built per process and handed to every resolver that needs it.
//! The check-then-reload sequence runs under a mutex, so concurrent misses
//! parse the file once.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant, SystemTime};

use costguard_core::CostGuardError;
use tracing::{debug, info};

use crate::pricing::{table_from_document, PriceTable};

/// Default time a loaded registry is trusted before its timestamp is refreshed.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

#[derive(Debug)]
struct CachedRegistry {
    path: PathBuf,
    table: Arc<PriceTable>,
    modified: Option<SystemTime>,
    refreshed_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CacheDecision {
    /// Serve the cached table untouched.
    Hit,
    /// Serve the cached table and restart the TTL window.
    Touch,
    /// Parse the file again.
    Reload,
}

/// TTL + modification-marker cache for the JSON price registry.
#[derive(Debug)]
pub struct PriceRegistryCache {
    ttl: Duration,
    state: Mutex<Option<CachedRegistry>>,
    parses: AtomicU64,
}

impl Default for PriceRegistryCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

impl PriceRegistryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            state: Mutex::new(None),
            parses: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// How many times a registry file has actually been parsed.
    pub fn parse_count(&self) -> u64 {
        self.parses.load(Ordering::Relaxed)
    }

    /// Drop the cached table so the next load re-parses.
    ///
    /// Also resets a cache whose lock was poisoned by a panicking loader.
    pub fn invalidate(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        *state = None;
        drop(state);
        self.state.clear_poison();
    }

    /// Load the registry at `path`, re-parsing only when the cache is stale.
    ///
    /// A missing file is `RegistryNotFound`; the cached table for another
    /// path is left alone in that case.
    pub fn load(&self, path: &Path) -> Result<Arc<PriceTable>, CostGuardError> {
        let mut state = self.state.lock().map_err(|e| {
            CostGuardError::Internal(format!("price registry cache lock poisoned: {e}"))
        })?;

        let modified = registry_modified(path)?;
        let now = Instant::now();

        if let Some(cached) = state.as_mut() {
            match decide(cached, path, modified, now, self.ttl) {
                CacheDecision::Hit => return Ok(Arc::clone(&cached.table)),
                CacheDecision::Touch => {
                    debug!(path = %path.display(), "price registry unchanged, TTL refreshed");
                    cached.refreshed_at = now;
                    return Ok(Arc::clone(&cached.table));
                }
                CacheDecision::Reload => {}
            }
        }

        let table = Arc::new(read_registry(path)?);
        self.parses.fetch_add(1, Ordering::Relaxed);
        info!(
            path = %path.display(),
            models = table.len(),
            "price registry loaded"
        );

        *state = Some(CachedRegistry {
            path: path.to_path_buf(),
            table: Arc::clone(&table),
            modified,
            refreshed_at: now,
        });
        Ok(table)
    }
}

fn decide(
    cached: &CachedRegistry,
    path: &Path,
    modified: Option<SystemTime>,
    now: Instant,
    ttl: Duration,
) -> CacheDecision {
    if cached.path != path {
        return CacheDecision::Reload;
    }
    let expired = now.saturating_duration_since(cached.refreshed_at) >= ttl;
    match (cached.modified, modified) {
        (Some(old), Some(new)) if old == new => {
            if expired {
                CacheDecision::Touch
            } else {
                CacheDecision::Hit
            }
        }
        (None, None) => {
            if expired {
                CacheDecision::Reload
            } else {
                CacheDecision::Hit
            }
        }
        _ => CacheDecision::Reload,
    }
}

/// Stat the file, mapping absence to `RegistryNotFound`.
fn registry_modified(path: &Path) -> Result<Option<SystemTime>, CostGuardError> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_file() => Ok(meta.modified().ok()),
        Ok(_) => Err(CostGuardError::RegistryRead {
            path: path.to_path_buf(),
            source: std::io::Error::other("not a regular file"),
        }),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(CostGuardError::RegistryNotFound {
            path: path.to_path_buf(),
        }),
        Err(source) => Err(CostGuardError::RegistryRead {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn read_registry(path: &Path) -> Result<PriceTable, CostGuardError> {
    let raw = fs::read_to_string(path).map_err(|source| CostGuardError::RegistryRead {
        path: path.to_path_buf(),
        source,
    })?;
    let document: serde_json::Value =
        serde_json::from_str(&raw).map_err(|source| CostGuardError::RegistryParse {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(table_from_document(&document))
}
