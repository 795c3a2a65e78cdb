// SPDX-FileCopyrightText: 2026 MiniMedi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation and record types shared by the engine and its adapters.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Speaker of a conversational turn.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message in the conversation, tagged with its speaker.
///
/// Serializes as `{"role": "...", "content": "..."}`, which is both the
/// persisted transcript format and the wire format of the model service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Intake fields extracted from a single assistant response.
///
/// Every field is optional and the snapshot is self-contained: a later
/// profile never inherits values from an earlier one. Deciding how the
/// fields land in the backend record is the reconciler's job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedProfile {
    pub name: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub symptoms: Option<String>,
    /// Duration of the complaint in days.
    pub duration: Option<u32>,
    /// `Some(true)` once the model has gathered every field.
    pub complete: Option<bool>,
}

impl ExtractedProfile {
    /// Returns true when the model flagged the intake as finished.
    pub fn is_complete(&self) -> bool {
        self.complete == Some(true)
    }
}

/// Server-issued identifier of a session record.
///
/// The backend may encode it as a JSON number or a string; both decode to
/// the same textual form, which is also how it is persisted and placed in
/// request paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawRecordId")]
pub struct RecordId(pub String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRecordId {
    Number(serde_json::Number),
    Text(String),
}

impl From<RawRecordId> for RecordId {
    fn from(raw: RawRecordId) -> Self {
        match raw {
            RawRecordId::Number(n) => RecordId(n.to_string()),
            RawRecordId::Text(s) => RecordId(s),
        }
    }
}

impl RecordId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId(s.to_string())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        RecordId(s)
    }
}

/// Severity bucket shown on record cards.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// Full field set sent when a session's record is first created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSessionRecord {
    pub patient_name: String,
    pub title: String,
    pub description: String,
    pub ai_analysis: String,
    pub age: u32,
    pub gender: String,
    pub duration: u32,
    pub severity: Severity,
    pub risk_score: u8,
}

/// Partial update of an existing record.
///
/// Absent fields are omitted from the request body entirely so the server
/// leaves them untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_analysis: Option<String>,
}

impl RecordPatch {
    /// A patch that only replaces the analysis text.
    pub fn analysis(summary: impl Into<String>) -> Self {
        Self {
            ai_analysis: Some(summary.into()),
            ..Self::default()
        }
    }
}

/// A session record as returned by the backend.
///
/// Only `id` is guaranteed; everything else is decoded leniently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: RecordId,
    #[serde(default)]
    pub patient_name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub ai_analysis: Option<String>,
    #[serde(default)]
    pub age: Option<i64>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub duration: Option<i64>,
    #[serde(default)]
    pub severity: Option<Severity>,
    #[serde(default)]
    pub risk_score: Option<i64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl SessionRecord {
    /// Builds the record the backend would hold right after a create.
    pub fn from_new(id: RecordId, record: &NewSessionRecord) -> Self {
        Self {
            id,
            patient_name: Some(record.patient_name.clone()),
            title: Some(record.title.clone()),
            description: Some(record.description.clone()),
            ai_analysis: Some(record.ai_analysis.clone()),
            age: Some(i64::from(record.age)),
            gender: Some(record.gender.clone()),
            duration: Some(i64::from(record.duration)),
            severity: Some(record.severity),
            risk_score: Some(i64::from(record.risk_score)),
            created_at: Some(Utc::now()),
        }
    }
}
