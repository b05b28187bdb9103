// SPDX-FileCopyrightText: 2026 Clinicbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the clinicbot notification layer.

use thiserror::Error;

/// The primary error type used across all clinicbot adapter traits and core operations.
#[derive(Debug, Error)]
pub enum ClinicError {
    /// Configuration errors (invalid TOML, missing bot token, bad group id).
    #[error("configuration error: {0}")]
    Config(String),

    /// Malformed input to a CRUD operation (empty title, bad working-hour window).
    #[error("validation error: {0}")]
    Validation(String),

    /// The referenced contact, template, or record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Channel errors (rejected send, unknown chat, rate limiting, network failure).
    ///
    /// `message` carries the raw channel error so operators can act on it.
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ClinicError {
    /// Shorthand for a [`ClinicError::NotFound`] with an owned id.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Shorthand for a [`ClinicError::Channel`] without an underlying source.
    pub fn channel(message: impl Into<String>) -> Self {
        Self::Channel {
            message: message.into(),
            source: None,
        }
    }

    /// Returns true for errors caused by caller input (validation, not found).
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_entity_and_id() {
        let err = ClinicError::not_found("contact", "42");
        assert_eq!(err.to_string(), "contact not found: 42");
        assert!(err.is_client_error());
    }

    #[test]
    fn channel_error_keeps_raw_message() {
        let err = ClinicError::channel("Bad Request: chat not found");
        assert_eq!(err.to_string(), "channel error: Bad Request: chat not found");
        assert!(!err.is_client_error());
    }
}
