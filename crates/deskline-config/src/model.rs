// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Deskline engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Deskline configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DesklineConfig {
    /// Service identity and logging settings.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Gateway server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Lifecycle state-machine settings.
    #[serde(default)]
    pub lifecycle: LifecycleConfig,

    /// Typing indicator settings.
    #[serde(default)]
    pub typing: TypingConfig,

    /// SLA deadlines per ticket priority, in hours.
    #[serde(default)]
    pub sla: SlaConfig,
}

/// Service identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Display name of the service instance.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "deskline".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Gateway HTTP/WebSocket server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Bearer token for the authenticated API routes. `None` rejects all
    /// authenticated requests (fail-closed).
    #[serde(default)]
    pub bearer_token: Option<String>,

    /// Per-connection outbound buffer size (events queued before a slow
    /// connection starts dropping).
    #[serde(default = "default_connection_buffer")]
    pub connection_buffer: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            bearer_token: None,
            connection_buffer: default_connection_buffer(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8430
}

fn default_connection_buffer() -> usize {
    64
}

/// Lifecycle state-machine configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LifecycleConfig {
    /// When `true`, status updates outside the explicit transition tables
    /// are rejected with a validation error. When `false` (the default)
    /// any status is reachable from any status; out-of-table transitions
    /// are applied and logged.
    #[serde(default)]
    pub strict_transitions: bool,
}

/// Typing indicator configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TypingConfig {
    /// Seconds of inactivity before a typing indicator auto-expires.
    #[serde(default = "default_typing_expiry")]
    pub expiry_secs: u64,
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self {
            expiry_secs: default_typing_expiry(),
        }
    }
}

fn default_typing_expiry() -> u64 {
    3
}

/// SLA deadlines per ticket priority, in hours from ticket creation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SlaConfig {
    #[serde(default = "default_sla_urgent")]
    pub urgent_hours: i64,

    #[serde(default = "default_sla_high")]
    pub high_hours: i64,

    #[serde(default = "default_sla_medium")]
    pub medium_hours: i64,

    #[serde(default = "default_sla_low")]
    pub low_hours: i64,
}

impl Default for SlaConfig {
    fn default() -> Self {
        Self {
            urgent_hours: default_sla_urgent(),
            high_hours: default_sla_high(),
            medium_hours: default_sla_medium(),
            low_hours: default_sla_low(),
        }
    }
}

fn default_sla_urgent() -> i64 {
    1
}

fn default_sla_high() -> i64 {
    4
}

fn default_sla_medium() -> i64 {
    24
}

fn default_sla_low() -> i64 {
    72
}
