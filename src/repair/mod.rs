//! Deterministic repair of parsed-but-untrusted report mappings.
//!
//! [`repair`] is a pure, total function: whatever mapping it receives, the
//! result satisfies every cardinality, length, enum and pattern constraint of
//! the report schema, and repairing an already repaired mapping changes
//! nothing. Unknown keys are dropped.

pub mod defaults;
mod field;

pub use field::{RawField, bounded, integer, item_text};

use crate::report::{SCHEMA_VERSION, TARGET_DAYS, TARGET_PERCENT_REGEX, is_http_url};
use serde_json::{Map, Value, json};
use std::collections::HashSet;

pub const ACTION_COUNT: usize = 5;

/// Cardinality and per-item length of a bullet list field.
#[derive(Debug, Clone, Copy)]
pub struct ListBounds {
    pub min: usize,
    pub max: usize,
    pub item_max: usize,
}

pub const EXEC_SUMMARY: ListBounds = ListBounds { min: 4, max: 6, item_max: 240 };
pub const FINDINGS: ListBounds = ListBounds { min: 6, max: 10, item_max: 240 };
pub const GAPS: ListBounds = ListBounds { min: 3, max: 8, item_max: 200 };
pub const SOURCES: ListBounds = ListBounds { min: 2, max: 10, item_max: 200 };

/// Repair a whole report mapping.
pub fn repair(input: &Map<String, Value>) -> Map<String, Value> {
    let actions: Vec<Value> = RawField::of(input, "actions")
        .items()
        .iter()
        .take(ACTION_COUNT)
        .enumerate()
        .map(|(i, action)| match action {
            Value::Object(map) => repair_action(i, map),
            _ => defaults::incomplete_action(i),
        })
        .chain(std::iter::repeat_with(defaults::pending_action))
        .take(ACTION_COUNT)
        .collect();

    let mut out = Map::new();
    out.insert("schema_version".into(), json!(SCHEMA_VERSION));
    out.insert("short_summary".into(), json!(short_summary(RawField::of(input, "short_summary"))));
    out.insert("actions".into(), Value::Array(actions));
    out.insert(
        "exec_summary".into(),
        json!(bullets(RawField::of(input, "exec_summary"), EXEC_SUMMARY, defaults::EXEC_SUMMARY_ITEM)),
    );
    out.insert(
        "findings".into(),
        json!(bullets(RawField::of(input, "findings"), FINDINGS, defaults::FINDING)),
    );
    out.insert("gaps".into(), json!(bullets(RawField::of(input, "gaps"), GAPS, defaults::GAP)));
    out.insert("sources".into(), Value::Array(sources(RawField::of(input, "sources"))));
    out
}

/// Repair any JSON value; non-objects are treated as an empty mapping.
pub fn repair_value(input: &Value) -> Map<String, Value> {
    match input {
        Value::Object(map) => repair(map),
        _ => repair(&Map::new()),
    }
}

fn short_summary(field: RawField<'_>) -> String {
    let summary = field.text().map(|s| bounded(&s, 300)).unwrap_or_default();
    if summary.chars().count() < 20 {
        defaults::SUMMARY.to_string()
    } else {
        summary
    }
}

fn repair_action(index: usize, action: &Map<String, Value>) -> Value {
    let (target_percent, target_days) = if action.contains_key("target_by") {
        // dated targets predate relative deadlines; there is nothing to convert
        (defaults::TARGET_PERCENT.to_string(), defaults::TARGET_DAYS)
    } else {
        (
            target_percent(RawField::of(action, "target_percent")),
            target_days(RawField::of(action, "target_days")),
        )
    };

    let tools = match (RawField::of(action, "tools"), RawField::of(action, "tool")) {
        (RawField::Missing, single) if !single.is_missing() => {
            let tool = single.text().map(|t| bounded(&t, 100)).unwrap_or_default();
            vec![tool; 3]
        }
        (RawField::Missing, _) => Vec::new(),
        (RawField::List(items), _) => items.iter().filter_map(item_text).collect(),
        (other, _) => other.text().into_iter().collect(),
    };

    let steps: Vec<String> = RawField::of(action, "how_steps")
        .items()
        .iter()
        .filter_map(item_text)
        .collect();

    json!({
        "title": title(index, RawField::of(action, "title")),
        "kpi": kpi(RawField::of(action, "kpi")),
        "target_percent": target_percent,
        "target_days": target_days,
        "how_steps": exactly_three(&steps, 240, defaults::STEP),
        "tools": exactly_three(&tools, 100, defaults::TOOL),
        "effort": level(RawField::of(action, "effort")),
        "impact": level(RawField::of(action, "impact")),
    })
}

fn title(index: usize, field: RawField<'_>) -> String {
    let title = field.text().map(|t| bounded(&t, 120)).unwrap_or_default();
    let numbered = format!("Action {}", index + 1);
    if title.is_empty() {
        numbered
    } else if title.chars().count() < 8 {
        bounded(&format!("{}: {}", numbered, title), 120)
    } else {
        title
    }
}

fn kpi(field: RawField<'_>) -> String {
    let kpi = field.text().map(|k| bounded(&k, 60)).unwrap_or_default();
    if kpi.chars().count() < 3 {
        defaults::KPI.to_string()
    } else {
        kpi
    }
}

fn target_percent(field: RawField<'_>) -> String {
    let Some(text) = field.text() else {
        return defaults::TARGET_PERCENT.to_string();
    };
    let text = text.trim();
    if text.eq_ignore_ascii_case("complete") {
        "complete".to_string()
    } else if TARGET_PERCENT_REGEX.is_match(text) {
        text.to_string()
    } else {
        defaults::TARGET_PERCENT.to_string()
    }
}

fn target_days(field: RawField<'_>) -> u32 {
    integer(field)
        .and_then(|d| u32::try_from(d).ok())
        .filter(|d| TARGET_DAYS.contains(d))
        .unwrap_or(defaults::TARGET_DAYS)
}

fn level(field: RawField<'_>) -> &'static str {
    let text = field.text().unwrap_or_default();
    match text.trim().to_ascii_lowercase().as_str() {
        "l" | "low" => "L",
        "h" | "high" => "H",
        _ => defaults::LEVEL,
    }
}

/// Pad with `pad` or truncate to exactly three non-blank items.
fn exactly_three(items: &[String], item_max: usize, pad: &str) -> Vec<String> {
    items
        .iter()
        .map(|item| bounded(item, item_max))
        .filter(|item| !item.is_empty())
        .chain(std::iter::repeat(pad.to_string()))
        .take(3)
        .collect()
}

/// Bound, dedupe (first occurrence wins), pad to `min` and cap at `max`.
fn bullets(field: RawField<'_>, limits: ListBounds, pad: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut unique: Vec<String> = field
        .items()
        .iter()
        .filter_map(item_text)
        .map(|item| bounded(&item, limits.item_max))
        .filter(|item| !item.is_empty() && seen.insert(item.clone()))
        .collect();

    while unique.len() < limits.min {
        unique.push(pad.to_string());
    }
    unique.truncate(limits.max);
    unique
}

fn sources(field: RawField<'_>) -> Vec<Value> {
    let mut out: Vec<Value> = field.items().iter().map(source).collect();
    while out.len() < SOURCES.min {
        out.push(defaults::pending_source());
    }
    out.truncate(SOURCES.max);
    out
}

fn source(value: &Value) -> Value {
    match RawField::from_value(Some(value)) {
        RawField::Str(s) => {
            let s = s.trim();
            if is_http_url(s) {
                json!({ "url": s, "citation": citation(s) })
            } else {
                json!({ "url": null, "citation": citation(s) })
            }
        }
        RawField::Map(map) => {
            let url = RawField::of(map, "url")
                .text()
                .map(|u| u.trim().to_string())
                .filter(|u| is_http_url(u));
            let text = RawField::of(map, "citation").text().unwrap_or_default();
            json!({ "url": url, "citation": citation(&text) })
        }
        _ => defaults::unknown_source(),
    }
}

fn citation(text: &str) -> String {
    let citation = bounded(text, SOURCES.item_max);
    if citation.chars().count() < 3 {
        defaults::UNKNOWN_SOURCE.to_string()
    } else {
        citation
    }
}
