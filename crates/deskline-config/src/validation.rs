// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as valid log levels and positive SLA windows.

use crate::diagnostic::ConfigError;
use crate::model::DesklineConfig;

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &DesklineConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !VALID_LOG_LEVELS.contains(&config.service.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "service.log_level must be one of {VALID_LOG_LEVELS:?}, got `{}`",
                config.service.log_level
            ),
        });
    }

    if config.server.host.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "server.host must not be empty".to_string(),
        });
    }

    if config.server.port == 0 {
        errors.push(ConfigError::Validation {
            message: "server.port must be non-zero".to_string(),
        });
    }

    if config.server.connection_buffer == 0 {
        errors.push(ConfigError::Validation {
            message: "server.connection_buffer must be at least 1".to_string(),
        });
    }

    if config.typing.expiry_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "typing.expiry_secs must be at least 1".to_string(),
        });
    }

    for (key, hours) in [
        ("sla.urgent_hours", config.sla.urgent_hours),
        ("sla.high_hours", config.sla.high_hours),
        ("sla.medium_hours", config.sla.medium_hours),
        ("sla.low_hours", config.sla.low_hours),
    ] {
        if hours < 1 {
            errors.push(ConfigError::Validation {
                message: format!("{key} must be at least 1, got {hours}"),
            });
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
