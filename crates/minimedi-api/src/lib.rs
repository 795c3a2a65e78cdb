// SPDX-FileCopyrightText: 2026 MiniMedi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP adapters for the MiniMedi remote service.
//!
//! [`ApiClient`] implements both [`ModelService`](minimedi_core::ModelService)
//! (the conversational endpoint) and [`RecordBackend`](minimedi_core::RecordBackend)
//! (the session record endpoints) over one pooled reqwest client.

pub mod client;
pub mod types;

pub use client::ApiClient;
