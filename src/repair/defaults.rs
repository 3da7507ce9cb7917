//! Placeholder content used when generator output is missing or invalid.

use serde_json::{Value, json};

pub const SUMMARY: &str =
    "Insufficient data - expand search scope to generate comprehensive summary.";
pub const EXEC_SUMMARY_ITEM: &str = "Insufficient data - expand search scope";
pub const FINDING: &str =
    "Limited public data available for this query (consider refining search terms)";
pub const GAP: &str = "Market research incomplete - expand search scope";

pub const TARGET_PERCENT: &str = "+10%";
pub const TARGET_DAYS: u32 = 30;
pub const LEVEL: &str = "M";
pub const KPI: &str = "metric";
pub const STEP: &str = "See documentation";
pub const TOOL: &str = "Tool TBD";

pub const UNKNOWN_SOURCE: &str = "Unknown source";
pub const PENDING_SOURCE: &str = "Additional research needed";

/// Appended when fewer than five actions were generated.
pub fn pending_action() -> Value {
    json!({
        "title": "Additional action pending - expand research scope",
        "kpi": "completion",
        "target_percent": TARGET_PERCENT,
        "target_days": TARGET_DAYS,
        "how_steps": ["Gather additional data", "Analyze findings", "Implement recommendations"],
        "tools": ["Research tools", "Research tools", "Research tools"],
        "effort": LEVEL,
        "impact": LEVEL,
    })
}

/// Replaces an action entry that is not a mapping at all.
pub fn incomplete_action(index: usize) -> Value {
    json!({
        "title": format!("Action {} - data incomplete", index + 1),
        "kpi": "completion",
        "target_percent": TARGET_PERCENT,
        "target_days": TARGET_DAYS,
        "how_steps": ["Review data", "Plan approach", "Execute"],
        "tools": [TOOL, TOOL, TOOL],
        "effort": LEVEL,
        "impact": LEVEL,
    })
}

pub fn pending_source() -> Value {
    json!({ "url": null, "citation": PENDING_SOURCE })
}

pub fn unknown_source() -> Value {
    json!({ "url": null, "citation": UNKNOWN_SOURCE })
}
