// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock notifier for deterministic testing.
//!
//! `MockNotifier` implements `Notifier` with captured outbound email/SMS
//! for assertion in tests, and a failure switch to exercise the
//! best-effort swallow path.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use deskline_core::error::DesklineError;
use deskline_core::traits::Notifier;

/// A captured outbound email.
#[derive(Debug, Clone)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub html_body: Option<String>,
}

/// A captured outbound SMS.
#[derive(Debug, Clone)]
pub struct SentSms {
    pub to: String,
    pub message: String,
}

/// Capturing notifier with a switchable failure mode.
#[derive(Debug, Default)]
pub struct MockNotifier {
    emails: Mutex<Vec<SentEmail>>,
    sms: Mutex<Vec<SentSms>>,
    failing: AtomicBool,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent send fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// All captured emails.
    pub fn sent_emails(&self) -> Vec<SentEmail> {
        self.emails.lock().expect("poisoned").clone()
    }

    /// All captured SMS messages.
    pub fn sent_sms(&self) -> Vec<SentSms> {
        self.sms.lock().expect("poisoned").clone()
    }

    /// Drop all captured messages.
    pub fn clear(&self) {
        self.emails.lock().expect("poisoned").clear();
        self.sms.lock().expect("poisoned").clear();
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        html_body: Option<&str>,
    ) -> Result<(), DesklineError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DesklineError::Notification {
                message: "mock notifier failing".into(),
                source: None,
            });
        }
        self.emails.lock().expect("poisoned").push(SentEmail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
            html_body: html_body.map(str::to_string),
        });
        Ok(())
    }

    async fn send_sms(&self, to: &str, message: &str) -> Result<(), DesklineError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DesklineError::Notification {
                message: "mock notifier failing".into(),
                source: None,
            });
        }
        self.sms.lock().expect("poisoned").push(SentSms {
            to: to.to_string(),
            message: message.to_string(),
        });
        Ok(())
    }
}
