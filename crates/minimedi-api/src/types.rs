// SPDX-FileCopyrightText: 2026 MiniMedi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request/response bodies of the remote service.

use minimedi_core::Turn;
use serde::{Deserialize, Serialize};

/// Body of `POST /ai-check/`.
#[derive(Debug, Clone, Serialize)]
pub struct AiCheckRequest<'a> {
    pub messages: &'a [Turn],
}

/// Successful body of `POST /ai-check/`.
#[derive(Debug, Clone, Deserialize)]
pub struct AiCheckResponse {
    /// Raw assistant text, possibly embedding a data block.
    pub response: String,
}

/// Successful body of `DELETE /symptoms/clear-all/`.
#[derive(Debug, Clone, Deserialize)]
pub struct ClearRecordsResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub deleted_count: u64,
}

/// Error body shapes the backend is known to produce.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}

impl ApiErrorResponse {
    /// Best human-readable message from an error body, falling back to the raw text.
    pub fn message_from_body(body: &str) -> String {
        match serde_json::from_str::<ApiErrorResponse>(body) {
            Ok(ApiErrorResponse {
                error: Some(message),
                ..
            })
            | Ok(ApiErrorResponse {
                detail: Some(message),
                ..
            }) => message,
            _ => body.to_string(),
        }
    }
}
