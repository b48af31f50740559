// SPDX-FileCopyrightText: 2026 Costguard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Price tables and the JSON registry record format.
//!
//! A registry document is either an array of records or an object keyed by
//! `"provider:model"`:
//!
//! ```json
//! [
//!   {"provider": "openai", "model": "gpt-4o", "input_per_1k_usd": 0.005,
//!    "output_per_1k_usd": 0.015, "aliases": ["gpt4o"]}
//! ]
//! ```
//!
//! Records that are inactive, unnamed, or carry unparseable prices are
//! skipped; one bad row never empties the table.

use std::collections::HashMap;
use std::fmt;

use costguard_core::normalize_model_key;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

/// Prices for one model, in USD per 1,000 units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceEntry {
    /// Normalized canonical model name.
    pub model: String,
    /// Provider label, when the source carried one.
    pub provider: Option<String>,
    /// Cost per 1,000 prompt (input) units.
    pub input_per_1k_usd: f64,
    /// Cost per 1,000 completion (output) units.
    pub output_per_1k_usd: f64,
}

impl PriceEntry {
    pub fn new(model: &str, input_per_1k_usd: f64, output_per_1k_usd: f64) -> Self {
        Self {
            model: normalize_model_key(model),
            provider: None,
            input_per_1k_usd,
            output_per_1k_usd,
        }
    }

    /// Dollar cost of one call.
    ///
    /// `prompt / 1000 * input + completion / 1000 * output`
    pub fn cost(&self, prompt_units: u64, completion_units: u64) -> f64 {
        (prompt_units as f64 / 1000.0) * self.input_per_1k_usd
            + (completion_units as f64 / 1000.0) * self.output_per_1k_usd
    }

    /// The `(input, output)` price tuple.
    pub fn prices(&self) -> (f64, f64) {
        (self.input_per_1k_usd, self.output_per_1k_usd)
    }
}

/// Model key to price mapping.
///
/// Aliases index the same stored entry as their canonical model, so a lookup
/// through any alias returns the very same `PriceEntry`.
#[derive(Debug, Clone, Default)]
pub struct PriceTable {
    entries: Vec<PriceEntry>,
    index: HashMap<String, usize>,
}

impl PriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `(model, input, output)` triples without aliases.
    pub fn from_prices<'a>(prices: impl IntoIterator<Item = (&'a str, f64, f64)>) -> Self {
        let mut table = Self::new();
        for (model, input, output) in prices {
            table.insert(PriceEntry::new(model, input, output), std::iter::empty::<&str>());
        }
        table
    }

    /// Insert an entry under its model name and every alias.
    ///
    /// Later inserts for an existing key replace the earlier mapping. Empty
    /// keys are ignored.
    pub fn insert<S: AsRef<str>>(
        &mut self,
        mut entry: PriceEntry,
        aliases: impl IntoIterator<Item = S>,
    ) {
        entry.model = normalize_model_key(&entry.model);
        if entry.model.is_empty() {
            return;
        }
        let slot = self.entries.len();
        self.index.insert(entry.model.clone(), slot);
        for alias in aliases {
            let key = normalize_model_key(alias.as_ref());
            if !key.is_empty() {
                self.index.insert(key, slot);
            }
        }
        self.entries.push(entry);
    }

    /// Case-insensitive, whitespace-tolerant lookup.
    pub fn get(&self, model: &str) -> Option<&PriceEntry> {
        self.index
            .get(&normalize_model_key(model))
            .map(|&slot| &self.entries[slot])
    }

    pub fn contains(&self, model: &str) -> bool {
        self.get(model).is_some()
    }

    /// Number of resolvable keys (models plus aliases).
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// All keys with their entries, sorted by key.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PriceEntry)> {
        let mut keys: Vec<(&str, usize)> = self
            .index
            .iter()
            .map(|(key, &slot)| (key.as_str(), slot))
            .collect();
        keys.sort_unstable_by(|a, b| a.0.cmp(b.0));
        keys.into_iter().map(|(key, slot)| (key, &self.entries[slot]))
    }
}

/// Why a registry record was left out of the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// `active` was present and falsy.
    Inactive,
    /// No usable `model` string.
    MissingModel,
    /// A price field was absent, non-numeric, negative, or not finite.
    InvalidPrice(&'static str),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Inactive => write!(f, "inactive"),
            SkipReason::MissingModel => write!(f, "missing model name"),
            SkipReason::InvalidPrice(field) => write!(f, "invalid or missing `{field}`"),
        }
    }
}

/// Build a table from a parsed registry document.
///
/// Anything that is neither an array nor an object yields an empty table.
pub fn table_from_document(document: &Value) -> PriceTable {
    let mut table = PriceTable::new();
    for (position, record) in records(document).iter().enumerate() {
        match parse_record(record) {
            Ok((entry, aliases)) => table.insert(entry, aliases),
            Err(reason) => {
                debug!(position, %reason, "skipping price registry record");
            }
        }
    }
    table
}

/// Flatten either document shape into a list of record objects.
fn records(document: &Value) -> Vec<Map<String, Value>> {
    match document {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| item.as_object().cloned())
            .collect(),
        Value::Object(by_key) => by_key
            .iter()
            .filter_map(|(key, body)| {
                let body = body.as_object()?;
                let (provider, model) = key.split_once(':').unwrap_or((key.as_str(), ""));
                let mut record = Map::new();
                record.insert("provider".into(), Value::String(provider.to_string()));
                record.insert("model".into(), Value::String(model.to_string()));
                // Body fields win over what the key implies.
                for (field, value) in body {
                    record.insert(field.clone(), value.clone());
                }
                Some(record)
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn parse_record(record: &Map<String, Value>) -> Result<(PriceEntry, Vec<String>), SkipReason> {
    if let Some(active) = record.get("active") {
        if !is_truthy(active) {
            return Err(SkipReason::Inactive);
        }
    }

    let model = record
        .get("model")
        .and_then(Value::as_str)
        .map(normalize_model_key)
        .filter(|m| !m.is_empty())
        .ok_or(SkipReason::MissingModel)?;

    let input = price_field(record, "input_per_1k_usd")?;
    let output = price_field(record, "output_per_1k_usd")?;

    let provider = record
        .get("provider")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string);

    let aliases = match record.get("aliases") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|alias| match alias {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };

    Ok((
        PriceEntry {
            model,
            provider,
            input_per_1k_usd: input,
            output_per_1k_usd: output,
        },
        aliases,
    ))
}

/// Numbers, or strings holding numbers. Negative and non-finite values are rejected.
fn price_field(record: &Map<String, Value>, field: &'static str) -> Result<f64, SkipReason> {
    let value = match record.get(field) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    value
        .filter(|v| v.is_finite() && *v >= 0.0)
        .ok_or(SkipReason::InvalidPrice(field))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn list_document_with_aliases() {
        let doc = json!([
            {
                "provider": "openai",
                "model": "gpt-4o",
                "input_per_1k_usd": 0.005,
                "output_per_1k_usd": 0.015,
                "active": true,
                "aliases": ["gpt4o"]
            },
            {
                "provider": "anthropic",
                "model": "claude-3-5-sonnet",
                "input_per_1k_usd": 0.003,
                "output_per_1k_usd": 0.015
            }
        ]);
        let table = table_from_document(&doc);

        assert_eq!(table.get("gpt-4o").unwrap().prices(), (0.005, 0.015));
        assert_eq!(table.get("gpt4o").unwrap().prices(), (0.005, 0.015));
        assert_eq!(table.get("claude-3-5-sonnet").unwrap().prices(), (0.003, 0.015));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn alias_and_canonical_share_one_entry() {
        let doc = json!([{
            "model": "GPT-4o",
            "input_per_1k_usd": 0.005,
            "output_per_1k_usd": 0.015,
            "aliases": ["GPT4O", " gpt-4o-latest "]
        }]);
        let table = table_from_document(&doc);

        let canonical = table.get("gpt-4o").unwrap();
        for alias in ["gpt4o", "Gpt4O", "gpt-4o-latest"] {
            assert!(std::ptr::eq(canonical, table.get(alias).unwrap()), "alias {alias}");
        }
        assert_eq!(canonical.model, "gpt-4o");
    }

    #[test]
    fn keyed_document_splits_provider_and_model() {
        let doc = json!({
            "openai:gpt-4o-mini": {"input_per_1k_usd": 0.00015, "output_per_1k_usd": 0.0006},
            "anthropic:claude-3-haiku": {"input_per_1k_usd": "0.00025", "output_per_1k_usd": "0.00125"},
            "ignored": "not an object"
        });
        let table = table_from_document(&doc);

        let mini = table.get("gpt-4o-mini").unwrap();
        assert_eq!(mini.provider.as_deref(), Some("openai"));
        assert_eq!(mini.prices(), (0.00015, 0.0006));
        assert_eq!(table.get("claude-3-haiku").unwrap().prices(), (0.00025, 0.00125));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn keyed_document_body_overrides_key() {
        let doc = json!({
            "openai:gpt-4o": {"model": "gpt-4o-2024-08-06", "input_per_1k_usd": 0.0025, "output_per_1k_usd": 0.01}
        });
        let table = table_from_document(&doc);
        assert!(table.contains("gpt-4o-2024-08-06"));
        assert!(!table.contains("gpt-4o"));
    }

    #[test]
    fn key_without_colon_has_no_model() {
        let doc = json!({"gpt-4o": {"input_per_1k_usd": 0.005, "output_per_1k_usd": 0.015}});
        assert!(table_from_document(&doc).is_empty());
    }

    #[test]
    fn inactive_and_malformed_records_are_skipped() {
        let doc = json!([
            {"model": "gpt-4o-mini", "input_per_1k_usd": 0.002, "output_per_1k_usd": 0.006, "active": false},
            {"provider": "misc", "model": "broken-model"},
            {"model": "bad-price", "input_per_1k_usd": "cheap", "output_per_1k_usd": 0.1},
            {"model": "negative", "input_per_1k_usd": -1.0, "output_per_1k_usd": 0.1},
            {"model": "   ", "input_per_1k_usd": 0.1, "output_per_1k_usd": 0.1},
            "not a record",
            {"model": "claude-3-haiku", "input_per_1k_usd": 0.001, "output_per_1k_usd": 0.005, "active": true}
        ]);
        let table = table_from_document(&doc);

        assert_eq!(table.len(), 1);
        assert_eq!(table.get("claude-3-haiku").unwrap().prices(), (0.001, 0.005));
    }

    #[test]
    fn falsy_active_values_deactivate() {
        for active in [json!(false), json!(0), json!(""), json!(null), json!([])] {
            let doc = json!([{"model": "m", "input_per_1k_usd": 1, "output_per_1k_usd": 1, "active": active}]);
            assert!(table_from_document(&doc).is_empty(), "active = {active}");
        }
    }

    #[test]
    fn later_record_replaces_earlier_key() {
        let doc = json!([
            {"model": "m", "input_per_1k_usd": 1.0, "output_per_1k_usd": 1.0},
            {"model": "M", "input_per_1k_usd": 2.0, "output_per_1k_usd": 3.0}
        ]);
        let table = table_from_document(&doc);
        assert_eq!(table.get("m").unwrap().prices(), (2.0, 3.0));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn scalar_document_is_empty_table() {
        assert!(table_from_document(&json!(42)).is_empty());
    }

    #[test]
    fn entry_cost_formula() {
        let entry = PriceEntry::new("gpt4o", 0.005, 0.015);
        let cost = entry.cost(2000, 1000);
        assert!((cost - (0.010 + 0.015)).abs() < 1e-12);
        assert_eq!(entry.cost(0, 0), 0.0);
    }

    #[test]
    fn iter_is_sorted_by_key() {
        let table = PriceTable::from_prices([("b", 1.0, 1.0), ("a", 2.0, 2.0)]);
        let keys: Vec<&str> = table.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }
}
