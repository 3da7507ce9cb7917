//! Prompt templates for the planner, search and writer agents.

use crate::error::{Error, Result};

/// Shared rules appended to every agent prompt.
pub const GLOBAL_HARDENING: &str = "No chain-of-thought. Obey required structure and length exactly. \
If inputs are incomplete, produce best-effort but label unknowns. \
Do not invent facts or sources. US English. Use relative days (14, 30, 60, 90) not dates.";

/// Shape of one action line.
pub const ACTION_LINE_FORMAT: &str = "[Owner optional] Action — KPI: <metric> Target: +X% in <14/30/60/90> days \
(Effort: L/M/H; Impact: L/M/H)";

/// One worked action line per agent.
pub const EXAMPLE_ACTIONS: [(&str, &str); 4] = [
    (
        "search",
        "Marketing Launch fall tune-up email — KPI: booked appts Target: +25% in 30 days (Effort: M; Impact: H)",
    ),
    (
        "writer",
        "Ops Add Saturday service block — KPI: jobs/day Target: +20% in 14 days (Effort: M; Impact: M)",
    ),
    (
        "smb",
        "Owner Update GBP holiday hours — KPI: direction requests Target: +12% in 14 days (Effort: L; Impact: M)",
    ),
    (
        "email",
        "Sales Call lapsed quotes — KPI: closes Target: +20% in 30 days (Effort: M; Impact: H)",
    ),
];

/// Brief templates: name and context sentence with `{biz}` and `{location}`.
pub const TEMPLATES: [(&str, &str); 3] = [
    (
        "Competitor Snapshot",
        "Top 5 local competitors near {location}. Pricing, offers, and site SEO notes. \
         End with 5 actions for the next 14 days.",
    ),
    (
        "Local SEO Audit",
        "Audit {biz} in {location}: NAP consistency, priority keywords, Google Business Profile, \
         citations, and site speed. Prioritize fixes by effort and impact.",
    ),
    (
        "Grant Opportunities",
        "Active grants for {biz} in {location}: eligibility, deadlines, award sizes, and a prep checklist.",
    ),
];

pub const PLANNER_TEMPLATE: &str = "You are a helpful research assistant. Given a query, come up with a set of web \
searches to perform to best answer the query. Output {count} terms to query for.

Respond with JSON only:
{\"searches\": [{\"reason\": \"why this search matters\", \"query\": \"the search term\"}]}

{hardening}";

pub const SEARCH_INSTRUCTIONS: &str = "You are a research assistant. Given a search term, you search the web for \
that term and produce a concise summary of the results. The summary must be 2-3 paragraphs and less than 300 \
words. Capture the main points. Write succinctly, no need to have complete sentences or good grammar. This will \
be consumed by someone synthesizing a report, so capture the essence and ignore any fluff. Do not include any \
additional commentary other than the summary itself.";

/// JSON contract the writer must follow.
pub const WRITER_CONTRACT: &str = r#"Return ONE JSON object and nothing else:
{
  "schema_version": "1.0",
  "short_summary": "2-3 sentences, 20-300 chars",
  "actions": [
    {
      "title": "8-120 chars",
      "kpi": "3-60 chars",
      "target_percent": "+X% or complete",
      "target_days": 14 | 30 | 60 | 90,
      "how_steps": ["step 1", "step 2", "step 3"],
      "tools": ["tool 1", "tool 2", "tool 3"],
      "effort": "L" | "M" | "H",
      "impact": "L" | "M" | "H"
    }
  ],
  "exec_summary": ["4-6 bullets"],
  "findings": ["6-10 bullets"],
  "gaps": ["3-8 market gaps nobody is addressing"],
  "sources": [{"url": "https://...", "citation": "publisher, title"}]
}
Exactly 5 actions, each with exactly 3 how_steps and 3 tools."#;

pub const WRITER_TEMPLATE: &str = "You produce an SMB Decision Brief.
Context: {context}
Sections: Action Board (5 actions with effort/impact); Executive Summary (4-6 bullets); \
Main Findings (6-10 bullets); Dogs Not Barking (3 market gaps); Sources (links).
Action line format: {action_format}
Example: {example}

{contract}

{hardening}";

/// Names of the available brief templates.
pub fn template_names() -> impl Iterator<Item = &'static str> {
    TEMPLATES.iter().map(|(name, _)| *name)
}

fn example_action(agent: &str) -> &'static str {
    EXAMPLE_ACTIONS
        .iter()
        .find(|(name, _)| *name == agent)
        .map_or(EXAMPLE_ACTIONS[1].1, |(_, line)| *line)
}

/// Writer prompt for a template. Unknown templates are a config error.
pub fn writer_instructions(template: &str, biz: &str, location: &str) -> Result<String> {
    let (_, context) = TEMPLATES
        .iter()
        .find(|(name, _)| *name == template)
        .ok_or_else(|| {
            Error::Config(format!(
                "Unknown brief template {:?}; expected one of: {}",
                template,
                template_names().collect::<Vec<_>>().join(", ")
            ))
        })?;

    let context = context.replace("{biz}", biz).replace("{location}", location);
    Ok(WRITER_TEMPLATE
        .replace("{action_format}", ACTION_LINE_FORMAT)
        .replace("{example}", example_action("writer"))
        .replace("{contract}", WRITER_CONTRACT)
        .replace("{hardening}", GLOBAL_HARDENING)
        .replace("{context}", &context))
}

pub fn planner_instructions(count: usize) -> String {
    PLANNER_TEMPLATE
        .replace("{count}", &count.to_string())
        .replace("{hardening}", GLOBAL_HARDENING)
}

pub fn planner_input(query: &str) -> String {
    format!("Query: {}", query)
}

pub fn search_input(query: &str, reason: &str) -> String {
    format!("Search term: {}\nReason: {}", query, reason)
}

pub fn writer_input(query: &str, results: &[String]) -> String {
    let mut input = format!("Original query: {}\nSummarized search results:", query);
    if results.is_empty() {
        input.push_str("\n(no search results available)");
    }
    for (i, result) in results.iter().enumerate() {
        input.push_str(&format!("\n\n[{}] {}", i + 1, result.trim()));
    }
    input
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_instructions() {
        let prompt = writer_instructions("Local SEO Audit", "Acme Plumbing", "Austin, TX").unwrap();
        assert!(prompt.starts_with("You produce an SMB Decision Brief."));
        assert!(prompt.contains("Audit Acme Plumbing in Austin, TX"));
        assert!(prompt.contains("Action Board"));
        assert!(prompt.contains("Dogs Not Barking"));
        assert!(prompt.contains("\"target_days\""));
        assert!(!prompt.contains("{context}"));
        assert!(!prompt.contains("{hardening}"));
    }

    #[test]
    fn test_every_template_renders() {
        for name in template_names() {
            let prompt = writer_instructions(name, "Biz", "Town").unwrap();
            assert!(!prompt.contains("{biz}"));
            assert!(!prompt.contains("{location}"));
        }
    }

    #[test]
    fn test_unknown_template() {
        let err = writer_instructions("Haiku", "Biz", "Town").unwrap_err();
        assert!(matches!(err, Error::Config(ref m) if m.contains("Competitor Snapshot")));
    }

    #[test]
    fn test_planner_instructions() {
        let prompt = planner_instructions(5);
        assert!(prompt.contains("Output 5 terms"));
        assert!(prompt.contains("\"searches\""));
    }

    #[test]
    fn test_inputs() {
        assert_eq!(planner_input("plumbers"), "Query: plumbers");
        assert_eq!(search_input("q", "r"), "Search term: q\nReason: r");
        let input = writer_input("q", &["one".to_string(), " two ".to_string()]);
        assert!(input.ends_with("[1] one\n\n[2] two"));
        assert!(writer_input("q", &[]).contains("no search results"));
    }
}
