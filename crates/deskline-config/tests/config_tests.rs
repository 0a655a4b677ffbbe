// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Deskline configuration system.

use deskline_config::model::DesklineConfig;
use deskline_config::{ConfigError, load_and_validate_str, load_config_from_str};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_deskline_config() {
    let toml = r#"
[service]
name = "support-engine"
log_level = "debug"

[server]
host = "0.0.0.0"
port = 9000
bearer_token = "sekrit"
connection_buffer = 128

[lifecycle]
strict_transitions = true

[typing]
expiry_secs = 5

[sla]
urgent_hours = 1
high_hours = 4
medium_hours = 24
low_hours = 72
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.service.name, "support-engine");
    assert_eq!(config.service.log_level, "debug");
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.server.bearer_token.as_deref(), Some("sekrit"));
    assert_eq!(config.server.connection_buffer, 128);
    assert!(config.lifecycle.strict_transitions);
    assert_eq!(config.typing.expiry_secs, 5);
    assert_eq!(config.sla.urgent_hours, 1);
    assert_eq!(config.sla.low_hours, 72);
}

/// Unknown field produces a parse error from figment.
#[test]
fn unknown_field_is_rejected() {
    let toml = r#"
[server]
hostt = "0.0.0.0"
"#;
    let errors = load_and_validate_str(toml).unwrap_err();
    assert!(matches!(errors[0], ConfigError::Parse { .. }));
}

/// Semantic validation errors are collected, not fail-fast.
#[test]
fn validation_collects_all_errors() {
    let toml = r#"
[service]
log_level = "shout"

[typing]
expiry_secs = 0

[sla]
medium_hours = 0
"#;
    let errors = load_and_validate_str(toml).unwrap_err();
    assert_eq!(errors.len(), 3);
    assert!(errors.iter().all(|e| matches!(e, ConfigError::Validation { .. })));
}

/// The empty config is valid and matches compiled defaults.
#[test]
fn empty_config_is_valid() {
    let config = load_and_validate_str("").expect("defaults should validate");
    let defaults = DesklineConfig::default();
    assert_eq!(config.server.port, defaults.server.port);
    assert_eq!(config.typing.expiry_secs, defaults.typing.expiry_secs);
    assert!(!config.lifecycle.strict_transitions);
}
