// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Deskline integration tests.

pub mod fixtures;
pub mod harness;
pub mod mock_notifier;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_notifier::{MockNotifier, SentEmail, SentSms};
