// SPDX-FileCopyrightText: 2026 Costguard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared enums and helpers.

use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::{Display, EnumString};

/// How a budget reacts once the cap is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum EnforceMode {
    /// Reject any charge whose attempted total reaches the cap.
    #[default]
    Strict,
    /// Never reject; keep accumulating past the cap.
    Soft,
}

// Hand-written so `COST_ENFORCE=STRICT` parses the same as `strict`.
impl Serialize for EnforceMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EnforceMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        EnforceMode::from_str(raw.trim()).map_err(|_| {
            serde::de::Error::custom(format!(
                "unknown enforce mode `{raw}`, expected `strict` or `soft`"
            ))
        })
    }
}

/// Which price sources are consulted, in order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    /// Structured file first, environment variables when the file fails.
    #[default]
    Auto,
    /// Structured file only.
    Structured,
    /// `PRICE__<MODEL>__INPUT/OUTPUT` variables only.
    Environment,
}

impl SourceMode {
    /// Whether this mode reads the structured registry file.
    pub fn uses_registry_file(self) -> bool {
        matches!(self, SourceMode::Auto | SourceMode::Structured)
    }
}

/// Canonical form of a model name used as a price table key.
pub fn normalize_model_key(name: &str) -> String {
    name.trim().to_lowercase()
}
