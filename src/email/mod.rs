//! Styled HTML email from canonical or free-form brief markdown.
//!
//! The formatter never fails. Every section has a fallback: missing actions
//! and findings become empty-state copy, a missing executive summary is
//! synthesised from the subject and findings, and the gap list is always
//! exactly three items.
//!
//! ```ignore
//! let formatter = EmailFormatter::new();
//! let html = formatter.format("Local SEO Audit Brief: Acme – Austin, TX", &markdown);
//! ```

pub mod actions;
pub mod gaps;
mod legacy;
pub mod links;
pub mod sections;
pub mod summary;
pub mod template;

pub use actions::{ActionParser, Category, ParsedAction};
pub use gaps::{FALLBACK_GAPS, GapDetector};
pub use links::{Linker, SourceLink};
pub use sections::{SECTION_RULES, SectionKind, SectionRule, Sections};
pub use summary::{SubjectParts, SummarySynthesizer};
pub use template::Branding;

use sections::section_lines;
use template::TemplateFiller;

/// Findings filtering is abandoned below this many remaining lines.
pub const MIN_FILTERED_FINDINGS: usize = 3;

pub struct EmailFormatter {
    actions: ActionParser,
    summary: SummarySynthesizer,
    gaps: GapDetector,
    linker: Linker,
    filler: TemplateFiller,
    branding: Branding,
}

impl Default for EmailFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl EmailFormatter {
    pub fn new() -> Self {
        Self::with_branding(Branding::default())
    }

    pub fn with_branding(branding: Branding) -> Self {
        Self {
            actions: ActionParser::new(),
            summary: SummarySynthesizer::new(),
            gaps: GapDetector::new(),
            linker: Linker::new(),
            filler: TemplateFiller::new(),
            branding,
        }
    }

    pub fn branding(&self) -> &Branding {
        &self.branding
    }

    /// Complete HTML document for `markdown`, laid out by section.
    pub fn format(&self, subject: &str, markdown: &str) -> String {
        let sections = Sections::extract(markdown);

        let actions = self.actions.parse(sections.action_board.as_deref(), markdown);
        let findings = sections
            .main_findings
            .as_deref()
            .map(section_lines)
            .unwrap_or_default();
        let explicit_gaps: Vec<String> = sections
            .dogs_not_barking
            .as_deref()
            .map(section_lines)
            .unwrap_or_default()
            .into_iter()
            .filter(|line| !line.trim_end().ends_with(':'))
            .collect();
        let source_lines = sections.sources.as_deref().map(section_lines).unwrap_or_default();

        let summary_html = match sections.executive_summary.as_deref() {
            Some(body) => template::bullet_list(&self.linker, &section_lines(body), template::EMPTY_SUMMARY),
            None => {
                tracing::debug!("No executive summary section, synthesising from subject and findings");
                template::paragraph(&self.linker, &self.summary.synthesize(subject, &findings))
            }
        };

        let gaps = self.gaps.extract(&explicit_gaps, &findings);
        let shown_findings = self.filter_findings(&findings);
        let sources = self.linker.sources(&source_lines);

        let hero_meta = hero_meta(subject, actions.len(), shown_findings.len(), sources.len());

        let actions_html = template::action_cards(&actions);
        let findings_html = template::bullet_list(&self.linker, &shown_findings, template::EMPTY_FINDINGS);
        let gaps_html = template::bullet_list(&self.linker, &gaps, template::EMPTY_FINDINGS);
        let sources_html = template::source_list(&sources);
        let gaps_intro = crate::report::escape_html(template::GAPS_INTRO);

        let mut values = template::brand_values(&self.branding, subject);
        values.extend([
            ("hero_meta", hero_meta),
            ("actions", actions_html),
            ("summary", summary_html),
            ("findings", findings_html),
            ("gaps_intro", gaps_intro),
            ("gaps", gaps_html),
            ("sources", sources_html),
        ]);
        self.fill(template::BRIEF_TEMPLATE, &values)
    }

    /// HTML document for free-form markdown, converted block by block.
    pub fn format_legacy(&self, subject: &str, markdown: &str) -> String {
        let body = legacy::markdown_to_html(&self.linker, markdown);
        let body = if body.trim().is_empty() {
            template::empty_state(template::EMPTY_FINDINGS)
        } else {
            body
        };
        let mut values = template::brand_values(&self.branding, subject);
        values.push(("body", body));
        self.fill(template::LEGACY_TEMPLATE, &values)
    }

    /// Findings without trend and gap lines, unless that leaves fewer than
    /// three.
    pub fn filter_findings(&self, findings: &[String]) -> Vec<String> {
        let kept: Vec<String> = findings
            .iter()
            .filter(|line| !self.summary.is_trend(line) && !self.gaps.is_gap(line))
            .cloned()
            .collect();
        if kept.len() < MIN_FILTERED_FINDINGS {
            return findings.to_vec();
        }
        kept
    }

    fn fill(&self, template: &str, values: &[(&'static str, String)]) -> String {
        let borrowed: Vec<(&str, &str)> = values.iter().map(|(k, v)| (*k, v.as_str())).collect();
        self.filler.fill(template, &borrowed)
    }
}

fn hero_meta(subject: &str, actions: usize, findings: usize, sources: usize) -> String {
    let parts = SubjectParts::parse(subject);
    let mut meta = Vec::new();
    if let Some(location) = parts.location {
        meta.push(crate::report::escape_html(&location));
    }
    meta.push(format!("{} actions", actions));
    meta.push(format!("{} findings", findings));
    meta.push(format!("{} sources", sources));
    meta.join(" &middot; ")
}
