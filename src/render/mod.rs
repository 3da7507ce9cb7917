//! Deterministic markdown rendering of a validated [`Report`].
//!
//! Same report, same bytes. The output is semantic markdown only; styling is
//! the email formatter's job.

use crate::report::{ActionItem, Report};

/// Section headings, in render order.
pub const SECTIONS: [&str; 5] = [
    "Action Board",
    "Executive Summary",
    "Main Findings",
    "Dogs Not Barking",
    "Sources",
];

const GAPS_INTRO: &str = "Market gaps and unmet opportunities in this area:";

/// Render one action as a single pipe-delimited line:
///
/// `title — KPI: k Target: t in d days (Effort:E; Impact:I) | HOW: 1) a | 2) b | 3) c | TOOLS: 1) x 2) y 3) z`
pub fn render_action(action: &ActionItem) -> String {
    let how = numbered(action.how_steps(), " | ");
    let tools = numbered(action.tools(), " ");
    format!(
        "{} — KPI: {} Target: {} in {} days (Effort:{}; Impact:{}) | HOW: {} | TOOLS: {}",
        action.title(),
        action.kpi(),
        action.target_percent(),
        action.target_days(),
        action.effort(),
        action.impact(),
        how,
        tools,
    )
}

/// Render the full report.
pub fn render_markdown(report: &Report) -> String {
    let mut lines: Vec<String> = Vec::new();

    section(&mut lines, SECTIONS[0], None, report.actions().iter().map(render_action));
    section(&mut lines, SECTIONS[1], None, report.exec_summary().iter().cloned());
    section(&mut lines, SECTIONS[2], None, report.findings().iter().cloned());
    section(&mut lines, SECTIONS[3], Some(GAPS_INTRO), report.gaps().iter().cloned());
    section(
        &mut lines,
        SECTIONS[4],
        None,
        report
            .sources()
            .iter()
            .map(|s| s.url().unwrap_or(s.citation()).to_string()),
    );

    lines.join("\n")
}

fn section(lines: &mut Vec<String>, heading: &str, intro: Option<&str>, items: impl Iterator<Item = String>) {
    lines.push(format!("## {}", heading));
    lines.push(String::new());
    if let Some(intro) = intro {
        lines.push(intro.to_string());
        lines.push(String::new());
    }
    lines.extend(items.map(|item| format!("- {}", item)));
    lines.push(String::new());
}

fn numbered(items: &[String], sep: &str) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}) {}", i + 1, item))
        .collect::<Vec<_>>()
        .join(sep)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{ActionDraft, ReportDraft, SourceDraft};

    fn test_report(title_prefix: &str, finding: &str) -> Report {
        let draft = ReportDraft {
            schema_version: "1.0".to_string(),
            short_summary: "This is a test summary that is long enough to pass validation".to_string(),
            actions: (1..=5)
                .map(|i| ActionDraft {
                    title: format!("{} {}", title_prefix, i),
                    kpi: "test metric".to_string(),
                    target_percent: "+15%".to_string(),
                    target_days: 30,
                    how_steps: vec!["step 1".into(), "step 2".into(), "step 3".into()],
                    tools: vec!["Test tool 1".into(), "Test tool 2".into(), "Test tool 3".into()],
                    effort: "M".to_string(),
                    impact: "H".to_string(),
                })
                .collect(),
            exec_summary: (1..=4).map(|i| format!("bullet {}", i)).collect(),
            findings: std::iter::once(finding.to_string())
                .chain((2..=6).map(|i| format!("finding {}", i)))
                .collect(),
            gaps: (1..=3).map(|i| format!("gap {}", i)).collect(),
            sources: vec![
                SourceDraft { url: Some("https://example.com".into()), citation: "example.com".into() },
                SourceDraft { url: None, citation: "(local research)".into() },
            ],
        };
        Report::new(&draft).unwrap()
    }

    #[test]
    fn test_deterministic() {
        let report = test_report("Test action", "finding 1");
        assert_eq!(render_markdown(&report), render_markdown(&report));
    }

    #[test]
    fn test_five_headings_in_order() {
        let markdown = render_markdown(&test_report("Test action", "finding 1"));
        let headings: Vec<&str> = markdown.lines().filter(|l| l.starts_with("## ")).collect();
        assert_eq!(
            headings,
            vec![
                "## Action Board",
                "## Executive Summary",
                "## Main Findings",
                "## Dogs Not Barking",
                "## Sources",
            ]
        );
    }

    #[test]
    fn test_action_line_format() {
        let report = test_report("Test action", "finding 1");
        assert_eq!(
            render_action(&report.actions()[0]),
            "Test action 1 — KPI: test metric Target: +15% in 30 days (Effort:M; Impact:H) \
             | HOW: 1) step 1 | 2) step 2 | 3) step 3 | TOOLS: 1) Test tool 1 2) Test tool 2 3) Test tool 3"
        );
    }

    #[test]
    fn test_sources_prefer_url() {
        let markdown = render_markdown(&test_report("Test action", "finding 1"));
        assert!(markdown.contains("- https://example.com\n"));
        assert!(markdown.contains("- (local research)\n"));
        assert!(!markdown.contains("- example.com\n"));
    }

    #[test]
    fn test_gaps_intro() {
        let markdown = render_markdown(&test_report("Test action", "finding 1"));
        assert!(markdown.contains("## Dogs Not Barking\n\nMarket gaps and unmet opportunities in this area:\n\n- gap 1"));
    }

    #[test]
    fn test_script_never_rendered_raw() {
        let report = test_report("<script>alert(1)</script>", "<script>alert(1)</script>");
        let markdown = render_markdown(&report);
        assert!(!markdown.contains("<script>"));
        assert!(markdown.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_line_breaks_in_fields_stay_inside_their_line() {
        use crate::repair::repair_value;
        use crate::report::ReportSchema;
        use serde_json::{Value, json};

        let raw = json!({
            "findings": ["Prices are high\n## Injected Heading\n- extra"],
            "actions": [{"title": "Fix the listing now\n## Sneaky", "how_steps": ["a\nb"]}],
            "sources": ["https://example.com/a\n## Sources"],
        });
        let repaired = Value::Object(repair_value(&raw));
        let report = ReportSchema::new().unwrap().validate(&repaired).unwrap();
        let markdown = render_markdown(&report);

        let headings: Vec<&str> = markdown.lines().filter(|l| l.starts_with('#')).collect();
        assert_eq!(headings.len(), 5);
        assert!(markdown.contains("- Prices are high ## Injected Heading - extra\n"));
        let action_lines: Vec<&str> = markdown.lines().filter(|l| l.contains("KPI:")).collect();
        assert_eq!(action_lines.len(), 5);
        assert!(action_lines[0].starts_with("- Fix the listing now ## Sneaky — KPI:"));
    }

    #[test]
    fn test_line_break_is_a_validation_error() {
        let mut draft = ReportDraft {
            schema_version: "1.0".to_string(),
            short_summary: "This is a test summary that is long enough to pass validation".to_string(),
            ..Default::default()
        };
        draft.findings = vec!["x\n## Injected".to_string()];
        match Report::new(&draft) {
            Err(crate::error::Error::Validation(v)) => {
                assert!(v.iter().any(|m| m == "findings[0]: contains a line break"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
