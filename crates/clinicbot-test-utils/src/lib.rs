// SPDX-FileCopyrightText: 2026 Clinicbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for clinicbot integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic tests without a Telegram bot.
//!
//! # Components
//!
//! - [`MockChannel`] - Mock channel with message injection, send capture and
//!   scripted per-destination failures
//! - [`TestHarness`] - Temp SQLite storage wired to a dispatcher and inbound router

pub mod harness;
pub mod mock_channel;

pub use harness::{TestHarness, inbound_message};
pub use mock_channel::MockChannel;
