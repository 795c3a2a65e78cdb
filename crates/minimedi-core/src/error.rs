// SPDX-FileCopyrightText: 2026 MiniMedi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the MiniMedi intake engine.

use thiserror::Error;

use crate::types::RecordId;

/// The primary error type used across all MiniMedi ports and engine operations.
#[derive(Debug, Error)]
pub enum MinimediError {
    /// Configuration errors (invalid TOML, bad values, unusable header values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Durable storage errors (database open, query failure, encoding).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The remote service could not be reached or returned an undecodable body.
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The remote service answered with a non-success status.
    #[error("service returned {status}: {message}")]
    Api { status: u16, message: String },

    /// An update targeted a record that no longer exists on the backend.
    #[error("record {id} not found")]
    RecordNotFound { id: RecordId },

    /// A submission was rejected because another one is still in flight.
    #[error("a submission is already in flight")]
    Busy,

    /// A submission was rejected because the message was empty.
    #[error("message must not be empty")]
    EmptyMessage,

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl MinimediError {
    /// Wraps any error as a storage failure.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        MinimediError::Storage {
            source: Box::new(err),
        }
    }
}
