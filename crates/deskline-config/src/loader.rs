// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./deskline.toml` > `~/.config/deskline/deskline.toml`
//! > `/etc/deskline/deskline.toml` with environment variable overrides via
//! the `DESKLINE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::DesklineConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/deskline/deskline.toml` (system-wide)
/// 3. `~/.config/deskline/deskline.toml` (user XDG config)
/// 4. `./deskline.toml` (local directory)
/// 5. `DESKLINE_*` environment variables
pub fn load_config() -> Result<DesklineConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DesklineConfig::default()))
        .merge(Toml::file("/etc/deskline/deskline.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("deskline/deskline.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("deskline.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<DesklineConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DesklineConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<DesklineConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DesklineConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` so that keys containing
/// underscores stay unambiguous: `DESKLINE_SERVER_BEARER_TOKEN` must map to
/// `server.bearer_token`, not `server.bearer.token`.
fn env_provider() -> Env {
    Env::prefixed("DESKLINE_").map(|key| {
        let key = key.as_str().to_ascii_lowercase();
        for section in ["service", "server", "lifecycle", "typing", "sla"] {
            if let Some(rest) = key.strip_prefix(&format!("{section}_")) {
                return format!("{section}.{rest}").into();
            }
        }
        key.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn inline_toml_overrides_defaults() {
        let config = load_config_from_str(
            r#"
[service]
log_level = "debug"
"#,
        )
        .unwrap();
        assert_eq!(config.service.log_level, "debug");
        assert_eq!(config.server.port, 8430);
    }

    #[test]
    fn empty_toml_yields_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.service.name, "deskline");
    }

    #[test]
    #[serial]
    fn env_var_overrides_section_key() {
        // SAFETY: test is serialized; no other thread reads the environment.
        unsafe { std::env::set_var("DESKLINE_SERVER_PORT", "9999") };
        let config = Figment::new()
            .merge(Serialized::defaults(DesklineConfig::default()))
            .merge(env_provider())
            .extract::<DesklineConfig>()
            .unwrap();
        unsafe { std::env::remove_var("DESKLINE_SERVER_PORT") };
        assert_eq!(config.server.port, 9999);
    }

    #[test]
    #[serial]
    fn env_var_with_underscore_key_maps_to_dotted_path() {
        unsafe { std::env::set_var("DESKLINE_SERVER_BEARER_TOKEN", "sekrit") };
        let config = Figment::new()
            .merge(Serialized::defaults(DesklineConfig::default()))
            .merge(env_provider())
            .extract::<DesklineConfig>()
            .unwrap();
        unsafe { std::env::remove_var("DESKLINE_SERVER_BEARER_TOKEN") };
        assert_eq!(config.server.bearer_token.as_deref(), Some("sekrit"));
    }
}
