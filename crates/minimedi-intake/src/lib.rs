// SPDX-FileCopyrightText: 2026 MiniMedi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation-to-record reconciliation engine for MiniMedi health intake.
//!
//! The engine keeps exactly one backend record in step with a free-form
//! intake conversation. The model embeds structured fields in its replies;
//! the engine extracts them, decides whether they create or update the
//! session's record, and keeps the transcript and the record identifier in
//! durable storage across restarts.
//!
//! # Components
//!
//! - [`extractor`] - splits a raw reply into display text and an [`ExtractedProfile`](minimedi_core::ExtractedProfile)
//! - [`TranscriptStore`] - persisted, ordered turn log
//! - [`RecordCache`] - persisted hint of the session's record id
//! - [`Reconciler`] - create-once, update-after write logic
//! - [`ConversationController`] - single-flight turn orchestration and reset

pub mod controller;
pub mod extractor;
pub mod reconciler;
pub mod record_cache;
pub mod transcript;
mod writer;

pub use controller::{ConversationController, TurnOutcome};
pub use extractor::{extract, Extraction, ExtractionError};
pub use reconciler::{
    rolling_summary, PlaceholderRiskScorer, ReconcileOutcome, Reconciler, RiskScorer,
};
pub use record_cache::RecordCache;
pub use transcript::TranscriptStore;
