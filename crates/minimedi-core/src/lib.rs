// SPDX-FileCopyrightText: 2026 MiniMedi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the MiniMedi intake engine.
//!
//! This crate provides the error type, the conversation and record types,
//! and the port traits through which the engine talks to durable storage,
//! the remote model service, and the record backend. Adapter crates
//! implement the ports defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::MinimediError;
pub use types::{
    ExtractedProfile, NewSessionRecord, RecordId, RecordPatch, Role, SessionRecord, Severity, Turn,
};

pub use traits::{ModelService, PersistencePort, RecordBackend};
