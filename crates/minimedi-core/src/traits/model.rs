// SPDX-FileCopyrightText: 2026 MiniMedi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Port for the remote conversational model service.

use async_trait::async_trait;

use crate::error::MinimediError;
use crate::types::Turn;

/// The remote language-model service.
#[async_trait]
pub trait ModelService: Send + Sync {
    /// Sends the whole transcript as context and returns the raw assistant text.
    ///
    /// The text may embed a delimited data block; callers are responsible
    /// for separating it from the human-readable part.
    async fn converse(&self, transcript: &[Turn]) -> Result<String, MinimediError>;
}
