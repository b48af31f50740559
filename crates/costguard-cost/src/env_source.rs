// SPDX-FileCopyrightText: 2026 Costguard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Environment-variable price source.
//!
//! Prices are read from `PRICE__<MODEL>__INPUT` / `PRICE__<MODEL>__OUTPUT`
//! pairs. The variables are captured into an `EnvSnapshot` up front so the
//! rest of the crate (and its tests) never reads the live process environment.

use std::collections::BTreeMap;

use tracing::warn;

use crate::pricing::{PriceEntry, PriceTable};

const PREFIX: &str = "PRICE__";
const INPUT_SUFFIX: &str = "__INPUT";

/// A frozen set of environment-style key/value pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    vars: BTreeMap<String, String>,
}

impl EnvSnapshot {
    /// Capture the `PRICE__*` variables of the current process.
    ///
    /// Variables whose name or value is not valid UTF-8 are ignored.
    pub fn capture() -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
            .filter(|(key, _)| key.starts_with(PREFIX))
            .collect();
        Self { vars }
    }

    /// Build a snapshot from explicit pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Convert the `PRICE__` pairs into a price table.
    ///
    /// A model with no `OUTPUT` variable (or a blank one) has output price 0.
    /// Models whose values do not parse as non-negative numbers are skipped.
    pub fn price_table(&self) -> PriceTable {
        let mut table = PriceTable::new();
        for (key, raw_input) in &self.vars {
            let Some(model_key) = key
                .strip_prefix(PREFIX)
                .and_then(|rest| rest.strip_suffix(INPUT_SUFFIX))
            else {
                continue;
            };
            if model_key.is_empty() {
                continue;
            }

            let Some(input) = parse_price(raw_input) else {
                warn!(variable = %key, value = %raw_input, "ignoring unparseable input price");
                continue;
            };

            let output_key = format!("{PREFIX}{model_key}__OUTPUT");
            let output = match self.get(&output_key).map(str::trim) {
                None | Some("") => 0.0,
                Some(raw) => match parse_price(raw) {
                    Some(value) => value,
                    None => {
                        warn!(
                            variable = %output_key,
                            value = %raw,
                            "ignoring unparseable output price"
                        );
                        continue;
                    }
                },
            };

            table.insert(
                PriceEntry::new(model_key, input, output),
                std::iter::empty::<&str>(),
            );
        }
        table
    }
}

fn parse_price(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}
