//! The canonical report model and its trust boundary.
//!
//! A [`Report`] can only be obtained through validation (or as a synthetic
//! [`Report::fallback`]). Construction HTML-escapes every free-text field, so
//! nothing downstream re-escapes. Validation is strict: it rejects instead of
//! fixing; coercion belongs to [`crate::repair`].

mod sanitize;
mod schema;

pub use sanitize::{collapse_whitespace, escape_html, truncate_chars, unescape_html};
pub use schema::{SCHEMA_VERSION, TARGET_DAYS, TARGET_PERCENT_PATTERN, report_schema};

use crate::error::{Error, Result};
use regex::Regex;
use sanitize::clean;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::LazyLock;

// ============================================================================
// Value types
// ============================================================================

/// Effort / impact grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level {
    L,
    M,
    H,
}

impl Level {
    /// Parse the exact single-letter form.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "L" => Some(Level::L),
            "M" => Some(Level::M),
            "H" => Some(Level::H),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::L => "L",
            Level::M => "M",
            Level::H => "H",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A citation: a URL, a free-text citation, or both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Source {
    url: Option<String>,
    citation: String,
}

impl Source {
    /// Build a validated, escaped source.
    ///
    /// A URL that does not start with `http://` or `https://` is dropped.
    pub fn new(url: Option<&str>, citation: &str) -> Result<Self> {
        let mut check = Checker::default();
        let source = check.source("source", url, citation);
        check.finish(source)
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn citation(&self) -> &str {
        &self.citation
    }
}

/// One recommended action with fixed-shape steps and tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionItem {
    title: String,
    kpi: String,
    target_percent: String,
    target_days: u32,
    how_steps: [String; 3],
    tools: [String; 3],
    effort: Level,
    impact: Level,
}

impl ActionItem {
    /// Validate a draft and build an escaped action.
    pub fn new(draft: &ActionDraft) -> Result<Self> {
        let mut check = Checker::default();
        let action = check.action("action", draft);
        check.finish(action)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn kpi(&self) -> &str {
        &self.kpi
    }

    pub fn target_percent(&self) -> &str {
        &self.target_percent
    }

    pub fn target_days(&self) -> u32 {
        self.target_days
    }

    pub fn how_steps(&self) -> &[String; 3] {
        &self.how_steps
    }

    pub fn tools(&self) -> &[String; 3] {
        &self.tools
    }

    pub fn effort(&self) -> Level {
        self.effort
    }

    pub fn impact(&self) -> Level {
        self.impact
    }
}

/// The complete brief. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    schema_version: String,
    short_summary: String,
    actions: [ActionItem; 5],
    exec_summary: Vec<String>,
    findings: Vec<String>,
    gaps: Vec<String>,
    sources: Vec<Source>,
}

impl Report {
    /// Validate a typed draft and build the report.
    pub fn new(draft: &ReportDraft) -> Result<Self> {
        let mut check = Checker::default();
        let report = check.report(draft);
        check.finish(report)
    }

    /// Validate an untyped mapping against the schema and build the report.
    ///
    /// Compiles the schema on every call; hold a [`ReportSchema`] to reuse it.
    pub fn from_value(value: &Value) -> Result<Self> {
        ReportSchema::new()?.validate(value)
    }

    /// A fully valid report carrying `message` as its visible summary.
    pub fn fallback(message: &str) -> Self {
        let mut summary = truncate_chars(&collapse_whitespace(message), 300);
        if summary.chars().count() < 20 {
            summary = format!("Brief unavailable: {}", summary.trim());
            if summary.chars().count() < 20 {
                summary.push_str(" (no details)");
            }
        }
        let summary = truncate_chars(&summary, 300);

        let filler = |text: &str, n: usize| vec![text.to_string(); n];

        Report {
            schema_version: SCHEMA_VERSION.to_string(),
            short_summary: escape_html(&summary),
            actions: std::array::from_fn(fallback_action),
            exec_summary: filler("Insufficient data - expand search scope", 4),
            findings: filler("No findings available for this request", 6),
            gaps: filler("Market research incomplete - expand search scope", 3),
            sources: vec![
                Source {
                    url: None,
                    citation: "Additional research needed".to_string(),
                };
                2
            ],
        }
    }

    pub fn schema_version(&self) -> &str {
        &self.schema_version
    }

    pub fn short_summary(&self) -> &str {
        &self.short_summary
    }

    pub fn actions(&self) -> &[ActionItem; 5] {
        &self.actions
    }

    pub fn exec_summary(&self) -> &[String] {
        &self.exec_summary
    }

    pub fn findings(&self) -> &[String] {
        &self.findings
    }

    pub fn gaps(&self) -> &[String] {
        &self.gaps
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }
}

// ============================================================================
// Drafts (unvalidated, typed input)
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceDraft {
    #[serde(default)]
    pub url: Option<String>,
    pub citation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionDraft {
    pub title: String,
    pub kpi: String,
    pub target_percent: String,
    pub target_days: u32,
    pub how_steps: Vec<String>,
    pub tools: Vec<String>,
    pub effort: String,
    pub impact: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportDraft {
    #[serde(default = "default_version")]
    pub schema_version: String,
    pub short_summary: String,
    pub actions: Vec<ActionDraft>,
    pub exec_summary: Vec<String>,
    pub findings: Vec<String>,
    pub gaps: Vec<String>,
    pub sources: Vec<SourceDraft>,
}

fn default_version() -> String {
    SCHEMA_VERSION.to_string()
}

// ============================================================================
// Schema validator
// ============================================================================

/// Compiled report schema. Cheap to share; holds no mutable state.
pub struct ReportSchema {
    validator: jsonschema::Validator,
}

impl ReportSchema {
    pub fn new() -> Result<Self> {
        let validator = jsonschema::validator_for(&report_schema())
            .map_err(|e| Error::Schema(e.to_string()))?;
        Ok(Self { validator })
    }

    /// Check `value` against the schema, then build the escaped [`Report`].
    pub fn validate(&self, value: &Value) -> Result<Report> {
        let violations: Vec<String> = self
            .validator
            .iter_errors(value)
            .map(|e| e.to_string())
            .collect();
        if !violations.is_empty() {
            tracing::error!(count = violations.len(), "report failed schema validation");
            return Err(Error::Validation(violations));
        }

        let draft: ReportDraft = serde_json::from_value(value.clone())?;
        Report::new(&draft)
    }
}

// ============================================================================
// Field checks
// ============================================================================

/// Collects every violation instead of stopping at the first.
#[derive(Default)]
struct Checker {
    errors: Vec<String>,
}

impl Checker {
    fn finish<T>(self, value: T) -> Result<T> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(Error::Validation(self.errors))
        }
    }

    fn fail(&mut self, field: &str, msg: impl fmt::Display) {
        self.errors.push(format!("{}: {}", field, msg));
    }

    fn text(&mut self, field: &str, value: &str, min: usize, max: usize) -> String {
        let trimmed = value.trim();
        let len = trimmed.chars().count();
        if len < min || len > max {
            self.fail(field, format_args!("length {} outside {}..={}", len, min, max));
        }
        if trimmed.contains(['\n', '\r']) {
            self.fail(field, "contains a line break");
        }
        clean(trimmed)
    }

    fn list(&mut self, field: &str, items: &[String], item_max: usize, min: usize, max: usize) -> Vec<String> {
        if items.len() < min || items.len() > max {
            self.fail(field, format_args!("{} items outside {}..={}", items.len(), min, max));
        }
        items
            .iter()
            .enumerate()
            .map(|(i, item)| self.text(&format!("{}[{}]", field, i), item, 1, item_max))
            .collect()
    }

    fn triple(&mut self, field: &str, items: &[String], item_max: usize) -> [String; 3] {
        let cleaned = self.list(field, items, item_max, 3, 3);
        std::array::from_fn(|i| cleaned.get(i).cloned().unwrap_or_default())
    }

    fn level(&mut self, field: &str, value: &str) -> Level {
        Level::parse(value).unwrap_or_else(|| {
            self.fail(field, format_args!("expected L, M or H, got {:?}", value));
            Level::M
        })
    }

    fn source(&mut self, field: &str, url: Option<&str>, citation: &str) -> Source {
        let url = url
            .map(str::trim)
            .filter(|u| is_http_url(u))
            .map(escape_html);
        Source {
            url,
            citation: self.text(&format!("{}.citation", field), citation, 3, 200),
        }
    }

    fn action(&mut self, field: &str, draft: &ActionDraft) -> ActionItem {
        let percent = draft.target_percent.trim().to_string();
        if !TARGET_PERCENT_REGEX.is_match(&percent) {
            self.fail(
                &format!("{}.target_percent", field),
                format_args!("expected +N% or 'complete', got {:?}", percent),
            );
        }
        if !TARGET_DAYS.contains(&draft.target_days) {
            self.fail(
                &format!("{}.target_days", field),
                format_args!("expected one of {:?}, got {}", TARGET_DAYS, draft.target_days),
            );
        }

        ActionItem {
            title: self.text(&format!("{}.title", field), &draft.title, 8, 120),
            kpi: self.text(&format!("{}.kpi", field), &draft.kpi, 3, 60),
            target_percent: percent,
            target_days: draft.target_days,
            how_steps: self.triple(&format!("{}.how_steps", field), &draft.how_steps, 240),
            tools: self.triple(&format!("{}.tools", field), &draft.tools, 100),
            effort: self.level(&format!("{}.effort", field), &draft.effort),
            impact: self.level(&format!("{}.impact", field), &draft.impact),
        }
    }

    fn report(&mut self, draft: &ReportDraft) -> Report {
        if draft.schema_version != SCHEMA_VERSION {
            self.fail(
                "schema_version",
                format_args!("expected {:?}, got {:?}", SCHEMA_VERSION, draft.schema_version),
            );
        }
        if draft.actions.len() != 5 {
            self.fail("actions", format_args!("expected exactly 5, got {}", draft.actions.len()));
        }
        let actions: Vec<ActionItem> = draft
            .actions
            .iter()
            .enumerate()
            .map(|(i, a)| self.action(&format!("actions[{}]", i), a))
            .collect();

        let sources_len = draft.sources.len();
        if !(2..=10).contains(&sources_len) {
            self.fail("sources", format_args!("{} items outside 2..=10", sources_len));
        }
        let sources = draft
            .sources
            .iter()
            .enumerate()
            .map(|(i, s)| self.source(&format!("sources[{}]", i), s.url.as_deref(), &s.citation))
            .collect();

        Report {
            schema_version: SCHEMA_VERSION.to_string(),
            short_summary: self.text("short_summary", &draft.short_summary, 20, 300),
            // a short list has already been recorded as a violation
            actions: std::array::from_fn(|i| {
                actions.get(i).cloned().unwrap_or_else(|| fallback_action(i))
            }),
            exec_summary: self.list("exec_summary", &draft.exec_summary, 240, 4, 6),
            findings: self.list("findings", &draft.findings, 240, 6, 10),
            gaps: self.list("gaps", &draft.gaps, 200, 3, 8),
            sources,
        }
    }
}

fn fallback_action(i: usize) -> ActionItem {
    ActionItem {
        title: format!("Action {} - unavailable", i + 1),
        kpi: "completion".to_string(),
        target_percent: "+10%".to_string(),
        target_days: 30,
        how_steps: [
            "Review the error above".to_string(),
            "Adjust the request".to_string(),
            "Generate the brief again".to_string(),
        ],
        tools: ["Tool TBD".to_string(), "Tool TBD".to_string(), "Tool TBD".to_string()],
        effort: Level::M,
        impact: Level::M,
    }
}

/// Compiled [`TARGET_PERCENT_PATTERN`], shared with the repairer.
pub(crate) static TARGET_PERCENT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(TARGET_PERCENT_PATTERN).unwrap());

/// `http(s)://` followed by at least one character, with no whitespace.
pub(crate) fn is_http_url(s: &str) -> bool {
    let s = s.trim();
    let lower = s.to_ascii_lowercase();
    let rest = lower
        .strip_prefix("http://")
        .or_else(|| lower.strip_prefix("https://"));
    rest.is_some_and(|r| !r.is_empty()) && !s.contains(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn action_draft(title: &str) -> ActionDraft {
        ActionDraft {
            title: title.to_string(),
            kpi: "test metric".to_string(),
            target_percent: "+15%".to_string(),
            target_days: 30,
            how_steps: vec!["step 1".into(), "step 2".into(), "step 3".into()],
            tools: vec!["Test tool 1".into(), "Test tool 2".into(), "Test tool 3".into()],
            effort: "M".to_string(),
            impact: "H".to_string(),
        }
    }

    fn report_draft() -> ReportDraft {
        ReportDraft {
            schema_version: "1.0".to_string(),
            short_summary: "This is a test summary that is long enough to pass validation".to_string(),
            actions: (1..=5).map(|i| action_draft(&format!("Test action {}", i))).collect(),
            exec_summary: (1..=4).map(|i| format!("bullet {}", i)).collect(),
            findings: (1..=6).map(|i| format!("finding {}", i)).collect(),
            gaps: (1..=3).map(|i| format!("gap {}", i)).collect(),
            sources: vec![
                SourceDraft { url: Some("https://example.com".into()), citation: "example.com".into() },
                SourceDraft { url: None, citation: "(local research)".into() },
            ],
        }
    }

    #[test]
    fn test_valid_report() {
        let report = Report::new(&report_draft()).unwrap();
        assert_eq!(report.schema_version(), "1.0");
        assert_eq!(report.actions().len(), 5);
        assert_eq!(report.exec_summary().len(), 4);
        assert_eq!(report.findings().len(), 6);
        assert_eq!(report.sources()[0].url(), Some("https://example.com"));
        assert_eq!(report.sources()[1].url(), None);
    }

    #[test]
    fn test_action_item_escapes_script() {
        let item = ActionItem::new(&action_draft("<script>alert(1)</script>")).unwrap();
        assert!(item.title().contains("&lt;script&gt;"));
        assert!(!item.title().contains("<script>"));
    }

    #[test]
    fn test_report_escapes_summary_and_findings() {
        let mut draft = report_draft();
        draft.short_summary = "Summary with <script>alert(1)</script> inside".to_string();
        draft.findings[0] = "<script>alert(1)</script>".to_string();
        let report = Report::new(&draft).unwrap();
        assert!(report.short_summary().contains("&lt;script&gt;"));
        assert_eq!(report.findings()[0], "&lt;script&gt;alert(1)&lt;/script&gt;");
    }

    #[test]
    fn test_source_escapes_citation_and_drops_non_http_url() {
        let source = Source::new(Some("ftp://example.com"), "<b>Local</b> paper").unwrap();
        assert_eq!(source.url(), None);
        assert_eq!(source.citation(), "&lt;b&gt;Local&lt;/b&gt; paper");
    }

    #[test]
    fn test_rejects_wrong_action_count() {
        let mut draft = report_draft();
        draft.actions.pop();
        let err = Report::new(&draft).unwrap_err();
        assert!(matches!(err, Error::Validation(ref v) if v.iter().any(|m| m.starts_with("actions"))));
    }

    #[test]
    fn test_rejects_bad_target_and_level() {
        let mut draft = action_draft("Launch the fall campaign");
        draft.target_percent = "fifteen".to_string();
        draft.target_days = 45;
        draft.effort = "X".to_string();
        match ActionItem::new(&draft) {
            Err(Error::Validation(v)) => assert_eq!(v.len(), 3),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_accepts_complete_target() {
        let mut draft = action_draft("Finish the GBP profile");
        draft.target_percent = "complete".to_string();
        assert_eq!(ActionItem::new(&draft).unwrap().target_percent(), "complete");
    }

    #[test]
    fn test_rejects_short_title() {
        assert!(ActionItem::new(&action_draft("Do SEO")).is_err());
    }

    #[test]
    fn test_from_value_reports_schema_violations() {
        let err = Report::from_value(&json!({"short_summary": "too short"})).unwrap_err();
        match err {
            Error::Validation(v) => assert!(!v.is_empty()),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_from_value_round_trips_draft() {
        let value = serde_json::to_value(report_draft()).unwrap();
        let report = Report::from_value(&value).unwrap();
        assert_eq!(report, Report::new(&report_draft()).unwrap());
    }

    #[test]
    fn test_fallback_is_valid_and_visible() {
        let report = Report::fallback("Generation timed out <after 180s>");
        assert!(report.short_summary().contains("timed out &lt;after 180s&gt;"));
        let short = Report::fallback("oops");
        assert!(short.short_summary().chars().count() >= 20);
        assert_eq!(short.actions().len(), 5);
        assert_eq!(short.sources().len(), 2);
    }

    #[test]
    fn test_fallback_summary_is_one_line() {
        let report = Report::fallback("Report validation failed:\n## findings[0]\r\ncontains a line break");
        assert_eq!(
            report.short_summary(),
            "Report validation failed: ## findings[0] contains a line break"
        );
    }

    #[test]
    fn test_http_url_rejects_whitespace() {
        assert!(is_http_url("https://example.com/a"));
        assert!(is_http_url("HTTP://EXAMPLE.COM"));
        assert!(!is_http_url("https://"));
        assert!(!is_http_url("https://example.com/a\n## Sources"));
        assert!(!is_http_url("www.example.com"));
    }
}
