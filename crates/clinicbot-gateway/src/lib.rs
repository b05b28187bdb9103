// SPDX-FileCopyrightText: 2026 Clinicbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP admin API for clinicbot.
//!
//! Exposes the contact directory, template store, bot settings and manual
//! notification actions to the admin UI, plus the appointment hook used by
//! the booking side. `/health` and `/metrics` are public; everything under
//! `/v1` requires the configured bearer token.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod server;

pub use auth::AuthConfig;
pub use error::{ApiError, ApiJson};
pub use server::{GatewayState, HealthState, ServerConfig, router, start_server};
