//! JSON Schema for the report contract.
//!
//! The schema mirrors every structural constraint on [`Report`](super::Report):
//! exact and bounded cardinalities, string lengths, enums and patterns. It is
//! also embedded in the writer prompt so the generator sees the same contract
//! that validation enforces.

use serde_json::{Value, json};

pub const SCHEMA_VERSION: &str = "1.0";

/// Allowed relative deadlines for an action.
pub const TARGET_DAYS: [u32; 4] = [14, 30, 60, 90];

pub const TARGET_PERCENT_PATTERN: &str = r"^([+-]?\d+%|complete)$";
/// Single line with at least one visible character.
const SINGLE_LINE: &str = r"^[^\r\n]*\S[^\r\n]*$";
const HTTP_URL: &str = r"^[Hh][Tt][Tt][Pp][Ss]?://\S+$";

fn text(min: usize, max: usize) -> Value {
    json!({ "type": "string", "minLength": min, "maxLength": max, "pattern": SINGLE_LINE })
}

fn text_list(item_max: usize, min: usize, max: usize) -> Value {
    json!({
        "type": "array",
        "minItems": min,
        "maxItems": max,
        "items": text(1, item_max),
    })
}

fn level() -> Value {
    json!({ "type": "string", "enum": ["L", "M", "H"] })
}

/// Build the report JSON Schema document.
pub fn report_schema() -> Value {
    let action = json!({
        "type": "object",
        "required": ["title", "kpi", "target_percent", "target_days", "how_steps", "tools", "effort", "impact"],
        "properties": {
            "title": text(8, 120),
            "kpi": text(3, 60),
            "target_percent": { "type": "string", "pattern": TARGET_PERCENT_PATTERN },
            "target_days": { "type": "integer", "enum": TARGET_DAYS },
            "how_steps": text_list(240, 3, 3),
            "tools": text_list(100, 3, 3),
            "effort": level(),
            "impact": level(),
        },
    });

    let source = json!({
        "type": "object",
        "required": ["citation"],
        "properties": {
            "url": { "type": ["string", "null"], "pattern": HTTP_URL },
            "citation": text(3, 200),
        },
    });

    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "Report",
        "type": "object",
        "required": ["schema_version", "short_summary", "actions", "exec_summary", "findings", "gaps", "sources"],
        "properties": {
            "schema_version": { "const": SCHEMA_VERSION },
            "short_summary": text(20, 300),
            "actions": { "type": "array", "minItems": 5, "maxItems": 5, "items": action },
            "exec_summary": text_list(240, 4, 6),
            "findings": text_list(240, 6, 10),
            "gaps": text_list(200, 3, 8),
            "sources": { "type": "array", "minItems": 2, "maxItems": 10, "items": source },
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_compiles() {
        assert!(jsonschema::validator_for(&report_schema()).is_ok());
    }

    #[test]
    fn test_schema_pins_version() {
        let schema = report_schema();
        assert_eq!(schema["properties"]["schema_version"]["const"], "1.0");
        assert_eq!(schema["properties"]["actions"]["minItems"], 5);
        assert_eq!(schema["properties"]["actions"]["maxItems"], 5);
    }

    #[test]
    fn test_text_must_be_single_line() {
        let validator = jsonschema::validator_for(&text(1, 50)).unwrap();
        assert!(validator.is_valid(&json!("one line")));
        assert!(!validator.is_valid(&json!("two\n## lines")));
        assert!(!validator.is_valid(&json!("   ")));
    }

    #[test]
    fn test_source_url_pattern() {
        let schema = report_schema();
        let source = &schema["properties"]["sources"]["items"];
        let validator = jsonschema::validator_for(source).unwrap();
        assert!(validator.is_valid(&json!({"url": "https://a.com/x", "citation": "a.com"})));
        assert!(validator.is_valid(&json!({"url": null, "citation": "a.com"})));
        assert!(!validator.is_valid(&json!({"url": "ftp://a.com", "citation": "a.com"})));
        assert!(!validator.is_valid(&json!({"url": "https://a.com\n## x", "citation": "a.com"})));
    }
}
