//! Email HTML skeleton, branding and fragment builders.
//!
//! Fragments are built from plain text and escaped here; the skeleton is
//! filled in a single pass so inserted content is never re-scanned for
//! placeholders.

use super::actions::ParsedAction;
use super::links::{Linker, SourceLink, anchor};
use crate::report::escape_html;
use regex::{Captures, Regex};

pub const EMPTY_ACTIONS: &str = "No actions were generated for this brief. Re-run with a broader search scope.";
pub const EMPTY_FINDINGS: &str = "No findings were available for this brief.";
pub const EMPTY_SOURCES: &str = "No sources were cited.";
pub const EMPTY_SUMMARY: &str = "Summary unavailable.";
pub const GAPS_INTRO: &str = "Market gaps and unmet opportunities in this area:";

/// Brand constants placed into the skeleton.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branding {
    pub name: String,
    pub tagline: String,
    pub primary_color: String,
    pub accent_color: String,
    pub footer: String,
}

impl Default for Branding {
    fn default() -> Self {
        Self {
            name: "SMB Decision Brief".to_string(),
            tagline: "Research-backed actions for local businesses".to_string(),
            primary_color: "#0f172a".to_string(),
            accent_color: "#2563eb".to_string(),
            footer: "Generated from public web research. Verify figures before acting.".to_string(),
        }
    }
}

/// Skeleton for canonical briefs.
pub const BRIEF_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{subject}</title>
</head>
<body style="margin:0;padding:0;background:#f1f5f9;font-family:Helvetica,Arial,sans-serif;color:#0f172a;">
<table role="presentation" width="100%" cellpadding="0" cellspacing="0"><tr><td align="center">
<table role="presentation" width="640" cellpadding="0" cellspacing="0" style="max-width:640px;background:#ffffff;">
<tr><td style="background:{primary_color};color:#ffffff;padding:20px 28px;">
<div style="font-size:18px;font-weight:bold;">{brand_name}</div>
<div style="font-size:13px;opacity:0.8;">{tagline}</div>
</td></tr>
<tr><td style="padding:28px;border-bottom:4px solid {accent_color};">
<h1 style="margin:0 0 8px;font-size:24px;">{subject}</h1>
<div style="font-size:14px;color:#475569;">{hero_meta}</div>
</td></tr>
<tr><td style="padding:24px 28px;">
<h2 style="font-size:18px;color:{accent_color};">Action Board</h2>
{actions}
</td></tr>
<tr><td style="padding:0 28px 24px;">
<h2 style="font-size:18px;color:{accent_color};">Executive Summary</h2>
{summary}
</td></tr>
<tr><td style="padding:0 28px 24px;">
<h2 style="font-size:18px;color:{accent_color};">Main Findings</h2>
{findings}
</td></tr>
<tr><td style="padding:0 28px 24px;">
<h2 style="font-size:18px;color:{accent_color};">Dogs Not Barking</h2>
<p style="margin:0 0 8px;color:#475569;">{gaps_intro}</p>
{gaps}
</td></tr>
<tr><td style="padding:0 28px 24px;">
<h2 style="font-size:18px;color:{accent_color};">Sources</h2>
{sources}
</td></tr>
<tr><td style="background:#f8fafc;padding:16px 28px;font-size:12px;color:#64748b;">{footer}</td></tr>
</table>
</td></tr></table>
</body>
</html>
"#;

/// Skeleton for free-form markdown that did not come from a validated report.
pub const LEGACY_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{subject}</title>
</head>
<body style="margin:0;padding:0;background:#f1f5f9;font-family:Helvetica,Arial,sans-serif;color:#0f172a;">
<table role="presentation" width="100%" cellpadding="0" cellspacing="0"><tr><td align="center">
<table role="presentation" width="640" cellpadding="0" cellspacing="0" style="max-width:640px;background:#ffffff;">
<tr><td style="background:{primary_color};color:#ffffff;padding:20px 28px;">
<div style="font-size:18px;font-weight:bold;">{brand_name}</div>
<div style="font-size:13px;opacity:0.8;">{tagline}</div>
</td></tr>
<tr><td style="padding:28px;border-bottom:4px solid {accent_color};">
<h1 style="margin:0;font-size:24px;">{subject}</h1>
</td></tr>
<tr><td style="padding:24px 28px;line-height:1.5;">
{body}
</td></tr>
<tr><td style="background:#f8fafc;padding:16px 28px;font-size:12px;color:#64748b;">{footer}</td></tr>
</table>
</td></tr></table>
</body>
</html>
"#;

/// Substitutes `{name}` placeholders in one pass. Unknown names are left as is.
pub struct TemplateFiller {
    placeholder: Regex,
}

impl Default for TemplateFiller {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateFiller {
    pub fn new() -> Self {
        Self {
            placeholder: Regex::new(r"\{([a-z_]+)\}").unwrap(),
        }
    }

    pub fn fill(&self, template: &str, values: &[(&str, &str)]) -> String {
        self.placeholder
            .replace_all(template, |caps: &Captures| {
                values
                    .iter()
                    .find(|(name, _)| *name == &caps[1])
                    .map_or_else(|| caps[0].to_string(), |(_, value)| value.to_string())
            })
            .into_owned()
    }
}

/// Placeholder values shared by both skeletons. Text values are escaped.
pub fn brand_values(branding: &Branding, subject: &str) -> Vec<(&'static str, String)> {
    vec![
        ("subject", escape_html(subject)),
        ("brand_name", escape_html(&branding.name)),
        ("tagline", escape_html(&branding.tagline)),
        ("primary_color", escape_html(&branding.primary_color)),
        ("accent_color", escape_html(&branding.accent_color)),
        ("footer", escape_html(&branding.footer)),
    ]
}

pub fn empty_state(message: &str) -> String {
    format!("<p style=\"margin:0;color:#64748b;font-style:italic;\">{}</p>", escape_html(message))
}

pub fn paragraph(linker: &Linker, text: &str) -> String {
    format!("<p style=\"margin:0;line-height:1.5;\">{}</p>", linker.inline(text))
}

pub fn bullet_list(linker: &Linker, items: &[String], empty: &str) -> String {
    if items.is_empty() {
        return empty_state(empty);
    }
    let items: String = items
        .iter()
        .map(|item| format!("<li style=\"margin:0 0 6px;\">{}</li>", linker.inline(item)))
        .collect();
    format!("<ul style=\"margin:0;padding-left:20px;line-height:1.5;\">{}</ul>", items)
}

pub fn source_list(sources: &[SourceLink]) -> String {
    if sources.is_empty() {
        return empty_state(EMPTY_SOURCES);
    }
    let items: String = sources
        .iter()
        .map(|source| {
            let body = match &source.href {
                Some(href) => anchor(href, &source.label),
                None => escape_html(&source.label),
            };
            format!("<li style=\"margin:0 0 4px;\">{}</li>", body)
        })
        .collect();
    format!("<ol style=\"margin:0;padding-left:20px;font-size:13px;\">{}</ol>", items)
}

/// One card per action.
pub fn action_cards(actions: &[ParsedAction]) -> String {
    if actions.is_empty() {
        return empty_state(EMPTY_ACTIONS);
    }
    actions
        .iter()
        .enumerate()
        .map(|(i, action)| action_card(i + 1, action))
        .collect()
}

fn action_card(number: usize, action: &ParsedAction) -> String {
    let mut html = String::from(
        "<div style=\"border:1px solid #e2e8f0;border-radius:6px;padding:14px 16px;margin:0 0 12px;\">",
    );

    html.push_str(&format!(
        "<div style=\"font-size:15px;font-weight:bold;\">{} {}. {}</div>",
        action.category.emoji(),
        number,
        escape_html(&action.phrase)
    ));
    if let Some(owner) = &action.owner {
        html.push_str(&format!(
            "<div style=\"font-size:12px;color:#64748b;\">Owner: {}</div>",
            escape_html(owner)
        ));
    }

    let m = &action.metrics;
    let metrics: Vec<String> = [
        ("KPI", &m.kpi),
        ("Target", &m.target),
        ("Baseline", &m.baseline),
        ("Effort", &m.effort),
        ("Impact", &m.impact),
        ("Season", &m.season),
        ("Source", &m.source),
    ]
    .iter()
    .filter_map(|&(label, value)| {
        value
            .as_ref()
            .map(|v| format!("<strong>{}:</strong> {}", label, escape_html(v)))
    })
    .collect();
    if !metrics.is_empty() {
        html.push_str(&format!(
            "<div style=\"font-size:13px;margin:6px 0;\">{}</div>",
            metrics.join(" &middot; ")
        ));
    }

    if !action.how.is_empty() {
        let steps: String = action
            .how
            .iter()
            .map(|s| format!("<li>{}</li>", escape_html(s)))
            .collect();
        html.push_str(&format!("<ol style=\"margin:6px 0;padding-left:20px;font-size:13px;\">{}</ol>", steps));
    }
    if !action.tools.is_empty() {
        let tools: Vec<String> = action.tools.iter().map(|t| escape_html(t)).collect();
        html.push_str(&format!(
            "<div style=\"font-size:12px;color:#475569;\"><strong>Tools:</strong> {}</div>",
            tools.join(", ")
        ));
    }
    html.push_str(&format!(
        "<div style=\"font-size:12px;color:#475569;margin-top:6px;\"><em>Why it matters:</em> {}</div>",
        escape_html(action.why)
    ));

    html.push_str("</div>");
    html
}
