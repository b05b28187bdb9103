// SPDX-FileCopyrightText: 2026 Clinicbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel adapter trait for the external messaging platform (Telegram).

use async_trait::async_trait;

use crate::error::ClinicError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{InboundMessage, MessageId, OutboundMessage};

/// Adapter for the bot platform used to reach patients and staff.
///
/// `send` is the single outbound primitive: one call per message, no retry.
/// A rejected send (for example a chat that never talked to the bot) is a
/// [`ClinicError::Channel`] carrying the platform's raw error text.
#[async_trait]
pub trait ChannelAdapter: PluginAdapter {
    /// Establishes a connection to the messaging platform and starts receiving.
    async fn connect(&mut self) -> Result<(), ClinicError>;

    /// Sends a text message to one destination.
    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, ClinicError>;

    /// Receives the next inbound message from the channel.
    async fn receive(&self) -> Result<InboundMessage, ClinicError>;
}
