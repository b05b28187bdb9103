// SPDX-FileCopyrightText: 2026 Clinicbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the clinicbot notification layer.
//!
//! Holds the domain types (contacts, templates, conversation entries, bot
//! settings, notification events), the shared error type, and the adapter
//! traits implemented by the storage and channel crates.

pub mod error;
pub mod notification;
pub mod settings;
pub mod traits;
pub mod types;

pub use error::ClinicError;
pub use notification::{
    DeliveryOutcome, DeliveryReport, DispatchResult, DispatchStatus, NotificationCategory,
    NotificationEvent,
};
pub use settings::{BotSettings, BotSettingsPatch};
pub use types::{AdapterType, Destination, HealthStatus, LanguageCode, MessageId};

pub use traits::{ChannelAdapter, PluginAdapter, StorageAdapter};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_type_round_trips_through_display() {
        use std::str::FromStr;

        for variant in [
            AdapterType::Channel,
            AdapterType::Storage,
            AdapterType::Observability,
        ] {
            let parsed = AdapterType::from_str(&variant.to_string()).expect("should parse back");
            assert_eq!(variant, parsed);
        }
    }

    #[test]
    fn all_trait_modules_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_channel_adapter<T: ChannelAdapter>() {}
        fn _assert_storage_adapter<T: StorageAdapter>() {}
    }
}
