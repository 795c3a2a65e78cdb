// SPDX-FileCopyrightText: 2026 MiniMedi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Data block extraction from raw assistant responses.
//!
//! The model embeds intake fields as a JSON object between two literal
//! markers somewhere in its free-text reply. [`extract`] splits a response
//! into the text shown to the user and the decoded [`ExtractedProfile`].
//!
//! Display text never contains a marker, whether or not the enclosed JSON
//! decodes. Field types from the model are untrusted and coerced here:
//! numeric fields accept numbers or numeric strings, and anything that does
//! not yield a positive integer is treated as absent.

use minimedi_core::ExtractedProfile;
use serde_json::{Map, Value};
use thiserror::Error;

/// Literal marker opening a data block.
pub const DATA_START: &str = "###DATA_START###";

/// Literal marker closing a data block.
pub const DATA_END: &str = "###DATA_END###";

/// Why a response yielded no usable profile.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The response carried no complete data block.
    #[error("no data block present")]
    Absent,

    /// The block was present but its content is not valid JSON.
    #[error("data block is not valid JSON: {0}")]
    Malformed(#[source] serde_json::Error),

    /// The block decoded to JSON that is not an object.
    #[error("data block is not a JSON object")]
    NotAnObject,
}

/// Result of splitting one assistant response.
#[derive(Debug)]
pub struct Extraction {
    /// The response with every data block removed, trimmed.
    pub display_text: String,
    /// The first data block, decoded.
    pub payload: Result<ExtractedProfile, ExtractionError>,
}

impl Extraction {
    /// Returns the decoded profile, if any.
    pub fn profile(&self) -> Option<&ExtractedProfile> {
        self.payload.as_ref().ok()
    }
}

/// Splits a raw assistant response into display text and structured payload.
///
/// Regions are matched non-greedily from left to right: each start marker
/// pairs with the next end marker after it. Every matched region is removed
/// from the display text; the first one is decoded as the payload.
pub fn extract(raw: &str) -> Extraction {
    let mut display = String::with_capacity(raw.len());
    let mut block: Option<&str> = None;
    let mut rest = raw;

    while let Some(start) = rest.find(DATA_START) {
        let inner = &rest[start + DATA_START.len()..];
        let Some(end) = inner.find(DATA_END) else {
            break;
        };
        display.push_str(&rest[..start]);
        if block.is_none() {
            block = Some(&inner[..end]);
        }
        rest = &inner[end + DATA_END.len()..];
    }
    display.push_str(rest);

    let display_text = strip_markers(display).trim().to_string();
    let payload = match block {
        Some(content) => decode_profile(content),
        None => Err(ExtractionError::Absent),
    };

    Extraction {
        display_text,
        payload,
    }
}

/// Removes unmatched markers, including ones formed by joining the pieces
/// left around a removed region.
fn strip_markers(mut text: String) -> String {
    while text.contains(DATA_START) || text.contains(DATA_END) {
        text = text.replace(DATA_START, "").replace(DATA_END, "");
    }
    text
}

fn decode_profile(content: &str) -> Result<ExtractedProfile, ExtractionError> {
    let value: Value =
        serde_json::from_str(content.trim()).map_err(ExtractionError::Malformed)?;
    let Value::Object(fields) = value else {
        return Err(ExtractionError::NotAnObject);
    };

    Ok(ExtractedProfile {
        name: text_field(&fields, "name"),
        age: count_field(&fields, "age"),
        gender: text_field(&fields, "gender"),
        symptoms: text_field(&fields, "symptoms"),
        duration: count_field(&fields, "duration"),
        complete: flag_field(&fields, "complete"),
    })
}

fn text_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    match fields.get(key)? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Reads a positive whole number. Zero is the model's "unknown" placeholder.
fn count_field(fields: &Map<String, Value>, key: &str) -> Option<u32> {
    let n = match fields.get(key)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))?,
        Value::String(s) => leading_integer(s)?,
        _ => return None,
    };
    u32::try_from(n).ok().filter(|&n| n > 0)
}

/// Parses the integer prefix of a string, after optional whitespace and sign.
fn leading_integer(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first()? {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let magnitude: i64 = digits[..end].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

fn flag_field(fields: &Map<String, Value>, key: &str) -> Option<bool> {
    match fields.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}
