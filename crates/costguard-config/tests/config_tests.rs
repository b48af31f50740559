// SPDX-FileCopyrightText: 2026 Costguard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for costguard configuration loading.

use costguard_config::diagnostic::ConfigError;
use costguard_config::model::CostGuardConfig;
use costguard_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};
use costguard_core::{EnforceMode, SourceMode};

/// A fully specified file deserializes into every field.
#[test]
fn valid_toml_deserializes_into_config() {
    let toml = r#"
[budget]
cap_usd = 0.75
warn_threshold_pct = 0.5
enforce_mode = "soft"

[pricing]
source = "structured"
registry_path = "/srv/prices.json"
cache_ttl_secs = 60
strict_unknown_models = true

[logging]
level = "debug"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert!((config.budget.cap_usd - 0.75).abs() < f64::EPSILON);
    assert!((config.budget.warn_threshold_pct - 0.5).abs() < f64::EPSILON);
    assert_eq!(config.budget.enforce_mode, EnforceMode::Soft);
    assert_eq!(config.pricing.source, SourceMode::Structured);
    assert_eq!(config.pricing.registry_path, "/srv/prices.json");
    assert_eq!(config.pricing.cache_ttl_secs, 60);
    assert!(config.pricing.strict_unknown_models);
    assert_eq!(config.logging.level, "debug");
}

/// Empty input falls back to compiled defaults.
#[test]
fn missing_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");
    assert_eq!(config, CostGuardConfig::default());
}

/// A misspelled budget key is reported with a suggestion.
#[test]
fn unknown_key_produces_suggestion() {
    let toml = r#"
[budget]
cap_usb = 1.0
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject unknown field");
    let found = errors.iter().any(|e| {
        matches!(
            e,
            ConfigError::UnknownKey { key, suggestion, .. }
                if key.ends_with("cap_usb") && suggestion.as_deref() == Some("cap_usd")
        )
    });
    assert!(found, "expected an UnknownKey with suggestion, got: {errors:?}");
}

/// An unknown enforce mode is a type error, not a silent soft mode.
#[test]
fn unknown_enforce_mode_rejected() {
    let toml = r#"
[budget]
enforce_mode = "lenient"
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject enforce mode");
    let rendered: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
    assert!(
        rendered.iter().any(|m| m.contains("enforce")),
        "got: {rendered:?}"
    );
}

/// Semantically invalid values pass deserialization but fail validation.
#[test]
fn out_of_range_threshold_fails_validation() {
    let toml = r#"
[budget]
cap_usd = 1.0
warn_threshold_pct = 1.2
"#;

    let errors = load_and_validate_str(toml).expect_err("threshold above 1 must fail");
    assert!(errors.iter().any(|e| matches!(
        e,
        ConfigError::Validation { message } if message.contains("warn_threshold_pct")
    )));
}

/// A missing explicit file is skipped, leaving defaults in place.
#[test]
fn missing_config_file_silently_skipped() {
    use figment::{
        providers::{Format, Serialized, Toml},
        Figment,
    };

    let config: CostGuardConfig = Figment::new()
        .merge(Serialized::defaults(CostGuardConfig::default()))
        .merge(Toml::file("/nonexistent/path/costguard.toml"))
        .extract()
        .expect("missing file should be silently skipped");

    assert_eq!(config.pricing.registry_path, "config/model_prices.json");
}

/// Dotted overrides land in the right section.
#[test]
fn dotted_override_sets_nested_value() {
    use figment::{providers::Serialized, Figment};

    let config: CostGuardConfig = Figment::new()
        .merge(Serialized::defaults(CostGuardConfig::default()))
        .merge(("pricing.cache_ttl_secs", 5))
        .merge(("budget.enforce_mode", "soft"))
        .extract()
        .expect("should merge overrides");

    assert_eq!(config.pricing.cache_ttl_secs, 5);
    assert_eq!(config.budget.enforce_mode, EnforceMode::Soft);
}

/// An explicit path is loaded and validated.
#[test]
fn load_and_validate_path_reads_file() {
    figment::Jail::expect_with(|jail| {
        jail.create_file(
            "custom.toml",
            r#"
[budget]
cap_usd = 3.0
"#,
        )?;

        let config = load_and_validate_path(std::path::Path::new("custom.toml"))
            .expect("file should load");
        assert!((config.budget.cap_usd - 3.0).abs() < f64::EPSILON);
        Ok(())
    });
}

/// Defaults serialize back into TOML that loads to the same config.
#[test]
fn defaults_survive_toml_serialization() {
    let rendered = toml::to_string(&CostGuardConfig::default()).expect("serialize");
    let config = load_config_from_str(&rendered).expect("reload");
    assert_eq!(config, CostGuardConfig::default());
}
