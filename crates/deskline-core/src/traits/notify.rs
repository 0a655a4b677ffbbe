// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound notification port (email/SMS), consumed best-effort.
//!
//! Delivery is an external collaborator. The engine calls this port after
//! the triggering domain mutation has committed, and the broadcaster wraps
//! every call so failures are logged and swallowed -- a notification
//! failure never fails the lifecycle operation that triggered it.

use async_trait::async_trait;

use crate::error::DesklineError;

/// Maximum SMS body length accepted by the notification contract.
pub const SMS_MAX_LEN: usize = 160;

/// Port for outbound email and SMS delivery.
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    /// Sends an email. `html_body` is an optional rich-text alternative.
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        html_body: Option<&str>,
    ) -> Result<(), DesklineError>;

    /// Sends an SMS. Implementations may reject messages longer than
    /// [`SMS_MAX_LEN`]; callers truncate before sending.
    async fn send_sms(&self, to: &str, message: &str) -> Result<(), DesklineError>;
}
