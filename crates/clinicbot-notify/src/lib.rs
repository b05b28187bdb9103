// SPDX-FileCopyrightText: 2026 Clinicbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification dispatch and inbound routing for clinicbot.
//!
//! [`Dispatcher`] renders notification events and delivers them through a
//! [`ChannelAdapter`]. [`InboundRouter`] records incoming patient messages,
//! sends automatic replies and alerts operators. [`InboundLoop`] ties the
//! router to the channel until shutdown.

pub mod appointment;
pub mod dispatcher;
pub mod inbound;
pub mod render;
pub mod routing;
pub mod shutdown;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use clinicbot_core::{ChannelAdapter, ClinicError};

pub use appointment::{AppointmentKind, AppointmentNotice};
pub use dispatcher::Dispatcher;
pub use inbound::{InboundOutcome, InboundRouter};
pub use render::render;
pub use routing::NotificationRouting;

/// Feeds channel messages to the [`InboundRouter`] until cancelled.
pub struct InboundLoop {
    channel: Arc<dyn ChannelAdapter>,
    router: InboundRouter,
}

impl InboundLoop {
    pub fn new(channel: Arc<dyn ChannelAdapter>, router: InboundRouter) -> Self {
        Self { channel, router }
    }

    /// Runs until the token is cancelled or the channel closes.
    ///
    /// A message that fails to process is logged and skipped. A message
    /// being handled when the token fires is finished first.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), ClinicError> {
        info!("inbound loop running");

        loop {
            tokio::select! {
                msg = self.channel.receive() => {
                    match msg {
                        Ok(inbound) => {
                            let sender = inbound.sender.channel_id.clone();
                            if let Err(e) = self.router.handle(inbound).await {
                                error!(contact = %sender, error = %e, "failed to handle inbound message");
                            }
                        }
                        Err(e) => {
                            if e.to_string().contains("closed") {
                                warn!(error = %e, "inbound channel closed");
                                break;
                            }
                            error!(error = %e, "channel receive error");
                        }
                    }
                }
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping inbound loop");
                    break;
                }
            }
        }

        info!("inbound loop stopped");
        Ok(())
    }
}
