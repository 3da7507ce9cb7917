//! Executive summary synthesis for documents that carry none.
//!
//! The result is always one plain-text paragraph.

use regex::Regex;

pub const MAX_FACTS: usize = 3;
pub const MAX_TRENDS: usize = 2;

/// Business and location named in a subject such as
/// `"Local SEO Audit Brief: Acme Plumbing – Austin, TX"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectParts {
    pub business: Option<String>,
    pub location: Option<String>,
}

impl SubjectParts {
    pub fn parse(subject: &str) -> Self {
        let tail = subject.split_once(':').map_or(subject, |(_, rest)| rest);
        let mut parts = tail
            .split(['—', '–', ','])
            .flat_map(|p| p.split(" - "))
            .map(str::trim)
            .filter(|p| !p.is_empty());

        let business = parts.next().map(str::to_string);
        let location: Vec<&str> = parts.collect();
        Self {
            business,
            location: if location.is_empty() { None } else { Some(location.join(", ")) },
        }
    }
}

pub struct SummarySynthesizer {
    fact_regex: Regex,
    trend_regex: Regex,
}

impl Default for SummarySynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

impl SummarySynthesizer {
    pub fn new() -> Self {
        Self {
            fact_regex: Regex::new(
                r"(?i)[$%]|\b(offers?|provides?|specializ\w*|serves?|operates?|charges?|founded|employs?|located)\b",
            )
            .unwrap(),
            trend_regex: Regex::new(
                r"(?i)\b(trends?|trending|growing|growth|increas\w*|declin\w*|shift\w*|rising|emerging|adoption|demand for)\b",
            )
            .unwrap(),
        }
    }

    pub fn is_fact(&self, line: &str) -> bool {
        self.fact_regex.is_match(line)
    }

    pub fn is_trend(&self, line: &str) -> bool {
        self.trend_regex.is_match(line)
    }

    /// Narrative from the subject, then up to three facts and two trends
    /// drawn from `findings`.
    pub fn synthesize(&self, subject: &str, findings: &[String]) -> String {
        let parts = SubjectParts::parse(subject);
        let mut sentences = narrative(&parts);

        let facts: Vec<&String> = findings
            .iter()
            .filter(|line| self.is_fact(line))
            .take(MAX_FACTS)
            .collect();
        let trends = findings
            .iter()
            .filter(|line| self.is_trend(line) && !facts.contains(line))
            .take(MAX_TRENDS);

        sentences.extend(facts.iter().map(|s| sentence(s)));
        sentences.extend(trends.map(|s| sentence(s)));
        sentences.join(" ")
    }
}

fn narrative(parts: &SubjectParts) -> Vec<String> {
    let Some(business) = parts.business.as_deref() else {
        return vec![
            "This brief summarises what local research shows about your market and where to act first."
                .to_string(),
        ];
    };

    let lowered = business.to_lowercase();
    let mut sentences = if ["law", "legal", "attorney", "lawyer"].iter().any(|k| lowered.contains(k)) {
        vec![
            format!("{} operates in a relationship-driven legal market where referrals and reputation decide most engagements.", business),
            "Prospective clients compare firms online well before they call.".to_string(),
        ]
    } else if ["consult", "advis", "advisory"].iter().any(|k| lowered.contains(k)) {
        vec![
            format!("{} sells expertise, so credibility and visible results drive new engagements.", business),
            "Buyers shortlist advisors from search results, referrals and published work.".to_string(),
        ]
    } else {
        vec![format!("{} competes for local customers who compare options online before they buy.", business)]
    };

    if let Some(location) = parts.location.as_deref() {
        sentences.push(format!(
            "In {}, demand rewards businesses that are easy to find, easy to trust and quick to respond.",
            location
        ));
    }
    sentences
}

fn sentence(line: &str) -> String {
    let line = line.trim();
    if line.ends_with(['.', '!', '?']) {
        line.to_string()
    } else {
        format!("{}.", line)
    }
}
