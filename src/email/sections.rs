//! Heading-based section lookup for loosely structured markdown.
//!
//! Each canonical section has a rule listing the heading texts accepted for
//! it. Rules are tried at heading depth `###`, then `##`, then `#`; the first
//! non-empty match wins. A section runs until the next heading of equal or
//! shallower depth.

/// The sections the email layout knows how to place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    ActionBoard,
    ExecutiveSummary,
    MainFindings,
    DogsNotBarking,
    Sources,
}

/// Accepted heading texts for one section, compared case-insensitively.
#[derive(Debug, Clone, Copy)]
pub struct SectionRule {
    pub kind: SectionKind,
    pub synonyms: &'static [&'static str],
}

pub const SECTION_RULES: [SectionRule; 5] = [
    SectionRule {
        kind: SectionKind::ActionBoard,
        synonyms: &[
            "action board",
            "actions",
            "action items",
            "top actions",
            "recommended actions",
            "next steps",
        ],
    },
    SectionRule {
        kind: SectionKind::ExecutiveSummary,
        synonyms: &["executive summary", "exec summary", "summary", "overview", "key takeaways"],
    },
    SectionRule {
        kind: SectionKind::MainFindings,
        synonyms: &["main findings", "findings", "key findings", "main brief", "research findings"],
    },
    SectionRule {
        kind: SectionKind::DogsNotBarking,
        synonyms: &["dogs not barking", "market gaps", "gaps", "unmet opportunities", "opportunities"],
    },
    SectionRule {
        kind: SectionKind::Sources,
        synonyms: &["sources", "references", "citations", "links"],
    },
];

/// Heading depths in the order they are tried.
pub const HEADING_LEVELS: [usize; 3] = [3, 2, 1];

/// Section bodies found in a document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sections {
    pub action_board: Option<String>,
    pub executive_summary: Option<String>,
    pub main_findings: Option<String>,
    pub dogs_not_barking: Option<String>,
    pub sources: Option<String>,
}

impl Sections {
    /// Apply every rule to `markdown`.
    pub fn extract(markdown: &str) -> Self {
        let mut sections = Sections::default();
        for rule in &SECTION_RULES {
            let body = find_section(markdown, rule);
            match rule.kind {
                SectionKind::ActionBoard => sections.action_board = body,
                SectionKind::ExecutiveSummary => sections.executive_summary = body,
                SectionKind::MainFindings => sections.main_findings = body,
                SectionKind::DogsNotBarking => sections.dogs_not_barking = body,
                SectionKind::Sources => sections.sources = body,
            }
        }
        sections
    }

    pub fn get(&self, kind: SectionKind) -> Option<&str> {
        match kind {
            SectionKind::ActionBoard => self.action_board.as_deref(),
            SectionKind::ExecutiveSummary => self.executive_summary.as_deref(),
            SectionKind::MainFindings => self.main_findings.as_deref(),
            SectionKind::DogsNotBarking => self.dogs_not_barking.as_deref(),
            SectionKind::Sources => self.sources.as_deref(),
        }
    }
}

/// Body of the first heading matching `rule`, trying each depth in turn.
pub fn find_section(markdown: &str, rule: &SectionRule) -> Option<String> {
    let lines: Vec<&str> = markdown.lines().collect();
    HEADING_LEVELS
        .iter()
        .find_map(|&level| find_at_level(&lines, level, rule))
}

fn find_at_level(lines: &[&str], level: usize, rule: &SectionRule) -> Option<String> {
    let start = lines.iter().position(|line| {
        heading(line).is_some_and(|(depth, text)| depth == level && matches_rule(text, rule))
    })?;

    let body: Vec<&str> = lines[start + 1..]
        .iter()
        .take_while(|line| !heading(line).is_some_and(|(depth, _)| depth <= level))
        .copied()
        .collect();

    let body = body.join("\n").trim().to_string();
    if body.is_empty() { None } else { Some(body) }
}

/// `(depth, text)` for an ATX heading line.
pub fn heading(line: &str) -> Option<(usize, &str)> {
    let trimmed = line.trim_start();
    let depth = trimmed.chars().take_while(|&c| c == '#').count();
    if depth == 0 || depth > 6 {
        return None;
    }
    let rest = &trimmed[depth..];
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some((depth, rest.trim()))
}

fn matches_rule(text: &str, rule: &SectionRule) -> bool {
    let normalized = normalize_heading(text);
    rule.synonyms.iter().any(|synonym| {
        normalized == *synonym
            || normalized
                .strip_prefix(synonym)
                .is_some_and(|rest| rest.starts_with(|c: char| !c.is_alphanumeric()))
    })
}

/// Lowercase, without emphasis markers, leading emoji/numbering or a trailing colon.
fn normalize_heading(text: &str) -> String {
    let text = text.replace("**", "").replace("__", "");
    let text = text
        .trim()
        .trim_start_matches(|c: char| !c.is_alphabetic())
        .trim_end_matches(|c: char| c == ':' || c.is_whitespace());
    text.to_lowercase()
}

/// Content lines of a section body: bullet items when there are any,
/// otherwise the non-empty text lines.
pub fn section_lines(body: &str) -> Vec<String> {
    let lines: Vec<&str> = body
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && heading(l).is_none())
        .collect();

    let bullets: Vec<String> = lines.iter().filter_map(|l| strip_bullet(l)).collect();
    if !bullets.is_empty() {
        return bullets;
    }
    lines.into_iter().map(str::to_string).collect()
}

/// Item text of a `-`, `*`, `•`, `1.` or `1)` bullet line.
pub fn strip_bullet(line: &str) -> Option<String> {
    let line = line.trim();
    for marker in ["- ", "* ", "• ", "+ "] {
        if let Some(rest) = line.strip_prefix(marker) {
            return non_empty(rest);
        }
    }
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(rest) = rest.strip_prefix(". ").or_else(|| rest.strip_prefix(") ")) {
            return non_empty(rest);
        }
    }
    None
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    if s.is_empty() { None } else { Some(s.to_string()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "# Brief\n\n## Top Actions\n\n- Do one\n- Do two\n\n### Detail\nnested\n\n## Key Findings:\n\n- Found\n\n# Sources\n- https://a.com\n";

    fn rule(kind: SectionKind) -> &'static SectionRule {
        SECTION_RULES.iter().find(|r| r.kind == kind).unwrap()
    }

    #[test]
    fn test_synonym_heading_matches() {
        let body = find_section(DOC, rule(SectionKind::ActionBoard)).unwrap();
        assert!(body.starts_with("- Do one"));
        // deeper headings stay inside the section
        assert!(body.contains("nested"));
    }

    #[test]
    fn test_section_stops_at_shallower_heading() {
        let body = find_section(DOC, rule(SectionKind::MainFindings)).unwrap();
        assert_eq!(body, "- Found");
    }

    #[test]
    fn test_level_three_tried_first() {
        let doc = "## Summary\nouter\n### Executive Summary\ninner\n";
        let body = find_section(doc, rule(SectionKind::ExecutiveSummary)).unwrap();
        assert_eq!(body, "inner");
    }

    #[test]
    fn test_case_insensitive_and_decorated() {
        let doc = "## 🐕 DOGS NOT BARKING\n- gap\n";
        assert_eq!(find_section(doc, rule(SectionKind::DogsNotBarking)).unwrap(), "- gap");
        let doc = "## **Action Board** (next 30 days)\n- act\n";
        assert_eq!(find_section(doc, rule(SectionKind::ActionBoard)).unwrap(), "- act");
    }

    #[test]
    fn test_prefix_must_end_at_word_boundary() {
        let doc = "## Actionable ideas\n- x\n";
        assert_eq!(find_section(doc, rule(SectionKind::ActionBoard)), None);
    }

    #[test]
    fn test_missing_or_empty_section() {
        assert_eq!(find_section("## Sources\n\n## Other\n", rule(SectionKind::Sources)), None);
        assert_eq!(find_section("no headings", rule(SectionKind::Sources)), None);
    }

    #[test]
    fn test_extract_all() {
        let sections = Sections::extract(DOC);
        assert!(sections.action_board.is_some());
        assert!(sections.main_findings.is_some());
        assert_eq!(sections.get(SectionKind::Sources), Some("- https://a.com"));
        assert_eq!(sections.executive_summary, None);
    }

    #[test]
    fn test_section_lines_prefers_bullets() {
        let lines = section_lines("Intro line:\n\n- one\n2. two\n* three");
        assert_eq!(lines, vec!["one", "two", "three"]);
        let lines = section_lines("Plain paragraph.\nAnother line.");
        assert_eq!(lines, vec!["Plain paragraph.", "Another line."]);
    }

    #[test]
    fn test_heading_parse() {
        assert_eq!(heading("### Title"), Some((3, "Title")));
        assert_eq!(heading("#hashtag"), None);
        assert_eq!(heading("plain"), None);
    }
}
