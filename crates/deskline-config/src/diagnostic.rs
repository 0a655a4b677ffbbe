// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Miette diagnostics for configuration errors.
//!
//! Figment deserialization errors and post-deserialization validation
//! failures are both surfaced as [`ConfigError`] values so the binary can
//! render them uniformly before aborting startup.

use miette::Diagnostic;
use thiserror::Error;

/// A configuration error rendered as a miette diagnostic.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// The configuration failed to parse or deserialize.
    #[error("failed to load configuration: {message}")]
    #[diagnostic(
        code(deskline::config::parse),
        help("check deskline.toml for unknown keys or mistyped values")
    )]
    Parse {
        /// Figment's description of the failure.
        message: String,
    },

    /// A semantic constraint on a config value was violated.
    #[error("validation error: {message}")]
    #[diagnostic(code(deskline::config::validation))]
    Validation {
        /// Description of the validation failure.
        message: String,
    },
}

impl ConfigError {
    /// Wrap a figment error, preserving its message.
    pub fn from_figment(err: &figment::Error) -> Self {
        Self::Parse {
            message: err.to_string(),
        }
    }
}

/// Render a list of configuration errors to stderr as miette reports.
pub fn render_errors(errors: &[ConfigError]) {
    for error in errors {
        let report = miette::Report::msg(format!("{error}"));
        eprintln!("{report:?}");
        if let Some(help) = error.help() {
            eprintln!("  help: {help}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_carries_message() {
        let err = ConfigError::Parse {
            message: "unknown field `expiry_seconds`".into(),
        };
        assert!(err.to_string().contains("expiry_seconds"));
    }

    #[test]
    fn validation_error_formats() {
        let err = ConfigError::Validation {
            message: "sla.urgent_hours must be at least 1, got 0".into(),
        };
        assert!(err.to_string().contains("urgent_hours"));
    }
}
