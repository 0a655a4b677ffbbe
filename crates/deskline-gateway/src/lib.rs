// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP/WebSocket gateway for the Deskline engine.
//!
//! Exposes the lifecycle managers over a small REST surface and attaches
//! live connections to the connection registry over WebSocket.

pub mod auth;
pub mod handlers;
pub mod server;
pub mod ws;

pub use auth::AuthConfig;
pub use server::{GatewayState, ServerConfig, build_router, start_server};
