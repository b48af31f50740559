// SPDX-FileCopyrightText: 2026 Costguard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Figment-to-miette error bridge.
//!
//! Figment errors become `ConfigError` diagnostics that name the offending
//! key, where it came from (file or environment), and a "did you mean?"
//! suggestion based on Jaro-Winkler similarity.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use miette::Diagnostic;
use thiserror::Error;

/// Minimum Jaro-Winkler similarity for a suggestion (`cap_usb` -> `cap_usd`).
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A configuration error with diagnostic metadata.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// An unrecognized key was found.
    #[error("unknown configuration key `{key}` (from {origin})")]
    #[diagnostic(
        code(costguard::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        suggestion: Option<String>,
        valid_keys: String,
        origin: String,
    },

    /// A value could not be converted to the expected type.
    #[error("invalid value for `{key}` (from {origin}): {detail}")]
    #[diagnostic(code(costguard::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        key: String,
        detail: String,
        expected: String,
        origin: String,
    },

    /// A required key is missing.
    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(costguard::config::missing_key),
        help("add `{key} = <value>` to costguard.toml")
    )]
    MissingKey { key: String },

    /// A semantic validation failure.
    #[error("validation error: {message}")]
    #[diagnostic(code(costguard::config::validation))]
    Validation { message: String },

    /// Anything else figment reports.
    #[error("configuration error: {0}")]
    #[diagnostic(code(costguard::config::other))]
    Other(String),
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid keys: {valid_keys}"),
        None => format!("valid keys: {valid_keys}"),
    }
}

/// Convert every error contained in a `figment::Error` into a `ConfigError`.
pub fn figment_to_config_errors(err: figment::Error) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|error| {
            let origin = describe_origin(&error);
            match &error.kind {
                Kind::UnknownField(field, expected) => {
                    let suggestion = suggest_key(field, expected);
                    ConfigError::UnknownKey {
                        key: qualified_key(&error, field),
                        suggestion,
                        valid_keys: expected.join(", "),
                        origin,
                    }
                }
                Kind::MissingField(field) => ConfigError::MissingKey {
                    key: qualified_key(&error, field),
                },
                Kind::InvalidType(actual, expected) => ConfigError::InvalidType {
                    key: error.path.join("."),
                    detail: format!("found {actual}"),
                    expected: expected.to_string(),
                    origin,
                },
                Kind::Message(message) => ConfigError::InvalidType {
                    key: error.path.join("."),
                    detail: message.clone(),
                    expected: "a valid value".to_string(),
                    origin,
                },
                _ => ConfigError::Other(error.to_string()),
            }
        })
        .collect()
}

fn qualified_key(error: &figment::Error, field: &str) -> String {
    if error.path.is_empty() {
        field.to_string()
    } else {
        format!("{}.{field}", error.path.join("."))
    }
}

/// Human-readable origin of a value: a file path, "environment", or "defaults".
fn describe_origin(error: &figment::Error) -> String {
    match error.metadata.as_ref() {
        Some(meta) => match &meta.source {
            Some(figment::Source::File(path)) => path.display().to_string(),
            _ => meta.name.to_string(),
        },
        None => "unknown source".to_string(),
    }
}

/// Suggest the closest valid key, if any is similar enough.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Render every diagnostic into one report string.
///
/// A diagnostic the graphical handler cannot draw falls back to its message.
pub fn render_report(errors: &[ConfigError]) -> String {
    let handler = miette::GraphicalReportHandler::new();
    let mut report = format!(
        "costguard: {} configuration error{}\n",
        errors.len(),
        if errors.len() == 1 { "" } else { "s" }
    );
    for error in errors {
        let mut rendered = String::new();
        match handler.render_report(&mut rendered, error as &dyn Diagnostic) {
            Ok(()) => report.push_str(&rendered),
            Err(_) => report.push_str(&format!("  {error}\n")),
        }
    }
    report
}

/// Print [`render_report`] to stderr.
pub fn render_errors(errors: &[ConfigError]) {
    eprint!("{}", render_report(errors));
}
