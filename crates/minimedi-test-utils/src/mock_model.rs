// SPDX-FileCopyrightText: 2026 MiniMedi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock model service for deterministic testing.
//!
//! `MockModel` implements `ModelService` with pre-configured replies,
//! enabling fast, CI-runnable tests without a live model endpoint.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use minimedi_core::{MinimediError, ModelService, Turn};

enum Reply {
    Text(String),
    Failure(u16),
}

/// A mock model service that returns pre-configured replies.
///
/// Replies are popped from a FIFO queue. When the queue is empty,
/// a default "mock reply" text is returned. Every transcript it receives
/// is recorded for later assertions.
pub struct MockModel {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<Vec<Turn>>>,
    gate: Option<Arc<Notify>>,
}

impl MockModel {
    /// Create a new mock model with an empty reply queue.
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    /// Create a mock model pre-loaded with the given replies.
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(|r| Reply::Text(r.into())).collect()),
            ..Self::new()
        }
    }

    /// Hold every call until the returned handle is notified (one permit per call).
    pub fn gated(mut self) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.gate = Some(gate.clone());
        (self, gate)
    }

    /// Queue a failed call answered with the given HTTP status.
    pub async fn push_failure(&self, status: u16) {
        self.replies.lock().await.push_back(Reply::Failure(status));
    }

    /// Transcripts received so far, in call order.
    pub async fn requests(&self) -> Vec<Vec<Turn>> {
        self.requests.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.requests.lock().await.len()
    }
}

impl Default for MockModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelService for MockModel {
    async fn converse(&self, transcript: &[Turn]) -> Result<String, MinimediError> {
        self.requests.lock().await.push(transcript.to_vec());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        match self.replies.lock().await.pop_front() {
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Failure(status)) => Err(MinimediError::Api {
                status,
                message: "mock model failure".to_string(),
            }),
            None => Ok("mock reply".to_string()),
        }
    }
}
