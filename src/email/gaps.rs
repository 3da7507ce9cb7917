//! "Dogs Not Barking": gap statements for the email layout.

use regex::Regex;

/// Gap phrasing recognised in findings.
pub const GAP_PATTERNS: &[&str] = &[
    r"(?i)\black(s|ing)?\b",
    r"(?i)\bmissing\b",
    r"(?i)\b(few|no|none of the)\s+(\w+\s+){0,3}(offer|offers|provide|provides|have|has|list|lists|show|shows)\b",
    r"(?i)\bunmet\b",
    r"(?i)\bgaps?\s+in\b",
    r"(?i)\b\d{1,3}%\s+of\s+(\w+\s+){0,3}(lack|don't|do not|without|have no)\b",
    r"(?i)\bunderserved\b",
];

pub const FALLBACK_GAPS: [&str; 3] = [
    "No competitor clearly owns after-hours or emergency availability in this area.",
    "Few local providers publish transparent pricing or package options online.",
    "Review responses and follow-up are inconsistent across local competitors.",
];

pub struct GapDetector {
    patterns: Vec<Regex>,
    parenthesized_url: Regex,
    name_colon: Regex,
}

impl Default for GapDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl GapDetector {
    pub fn new() -> Self {
        Self {
            patterns: GAP_PATTERNS.iter().map(|p| Regex::new(p).unwrap()).collect(),
            parenthesized_url: Regex::new(r"\(\s*https?://[^)]*\)").unwrap(),
            name_colon: Regex::new(r"^\s*(?:\*\*)?[A-Z][\w&.'-]*(?:\s+[A-Z][\w&.'-]*)*(?:\*\*)?\s*:\s").unwrap(),
        }
    }

    /// Statements about one named firm, which are not market-wide gaps.
    pub fn is_firm_fact(&self, line: &str) -> bool {
        self.parenthesized_url.is_match(line) || self.name_colon.is_match(line)
    }

    pub fn is_gap(&self, line: &str) -> bool {
        !self.is_firm_fact(line) && self.patterns.iter().any(|p| p.is_match(line))
    }

    /// Exactly three gaps: explicit ones first, then gap-like findings, then
    /// fallbacks.
    pub fn extract(&self, explicit: &[String], findings: &[String]) -> [String; 3] {
        let mut gaps: Vec<String> = Vec::new();
        let candidates = explicit
            .iter()
            .map(|s| s.trim())
            .chain(findings.iter().map(|s| s.trim()).filter(|s| self.is_gap(s)))
            .chain(FALLBACK_GAPS);

        for candidate in candidates {
            if gaps.len() == 3 {
                break;
            }
            if !candidate.is_empty() && !gaps.iter().any(|g| g == candidate) {
                gaps.push(candidate.to_string());
            }
        }

        std::array::from_fn(|i| {
            gaps.get(i)
                .cloned()
                .unwrap_or_else(|| FALLBACK_GAPS[i].to_string())
        })
    }
}
