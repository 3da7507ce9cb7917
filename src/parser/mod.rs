//! Tolerant extraction of a JSON object from free-form generator output.
//!
//! The parser never fails outward: it returns the first mapping it can
//! recover, or `None` when the text is unparseable. It does not guess beyond
//! the fixed repair stages, since speculative fixes risk changing meaning.

mod repairs;

pub use repairs::{Repairs, STAGES, Stage};

use regex::Regex;
use serde_json::{Map, Value};

/// Inputs (and repaired candidates) longer than this are rejected outright.
pub const MAX_INPUT_CHARS: usize = 50_000;

/// Recovers JSON objects from model output.
pub struct TolerantParser {
    /// Matches a fenced block (optionally tagged `json`) holding an object
    fence_regex: Regex,
    /// Matches the widest `{ ... }` span
    object_regex: Regex,
    repairs: Repairs,
}

impl Default for TolerantParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TolerantParser {
    pub fn new() -> Self {
        Self {
            fence_regex: Regex::new(r"(?s)```(?:json|JSON)?\s*(\{.*?\})\s*```").unwrap(),
            object_regex: Regex::new(r"(?s)\{.*\}").unwrap(),
            repairs: Repairs::new(),
        }
    }

    /// Parse `text` into a JSON object, repairing common defects.
    pub fn parse(&self, text: &str) -> Option<Map<String, Value>> {
        if too_long(text) {
            tracing::warn!(chars = text.chars().count(), "rejecting oversized generator output");
            return None;
        }
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let mut candidate = self.extract_candidate(text);
        if let Some(map) = parse_object(&candidate) {
            return Some(map);
        }

        for stage in STAGES {
            candidate = self.repairs.apply(stage, &candidate);
            if too_long(&candidate) {
                return None;
            }
            if let Some(map) = parse_object(&candidate) {
                tracing::debug!(?stage, "recovered JSON after repair");
                return Some(map);
            }
        }

        tracing::debug!("generator output is unparseable");
        None
    }

    /// Pick the span most likely to hold the object.
    fn extract_candidate(&self, text: &str) -> String {
        if let Some(cap) = self.fence_regex.captures(text) {
            if let Some(m) = cap.get(1) {
                return m.as_str().to_string();
            }
        }
        if text.starts_with('{') {
            return first_complete_object(text).unwrap_or(text).to_string();
        }
        self.object_regex
            .find(text)
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| text.to_string())
    }
}

fn too_long(text: &str) -> bool {
    text.len() > MAX_INPUT_CHARS && text.chars().count() > MAX_INPUT_CHARS
}

fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// The first balanced top-level `{...}` at the start of `text`.
fn first_complete_object(text: &str) -> Option<&str> {
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escape = false;

    for (i, b) in text.bytes().enumerate() {
        if escape {
            escape = false;
            continue;
        }
        if b == b'\\' && in_string {
            escape = true;
            continue;
        }
        if b == b'"' {
            in_string = !in_string;
            continue;
        }
        if in_string {
            continue;
        }
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}
