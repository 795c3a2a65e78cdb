// SPDX-FileCopyrightText: 2026 MiniMedi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Port traits through which the engine reaches the outside world.
//!
//! Async ports use `#[async_trait]` for dynamic dispatch compatibility.

pub mod model;
pub mod persistence;
pub mod records;

pub use model::ModelService;
pub use persistence::PersistencePort;
pub use records::RecordBackend;
