//! Action line parsing for the email Action Board.
//!
//! Works on both canonical renderer lines and free-form bullets. Labeled
//! fields are located by label position, so a value runs until the next
//! recognised label.

use super::sections::strip_bullet;
use crate::report::unescape_html;
use regex::Regex;

/// Actions shown on the board.
pub const MAX_ACTIONS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Visibility,
    Reputation,
    Marketing,
    Sales,
    Pricing,
    Funding,
    Operations,
    General,
}

impl Category {
    pub fn emoji(self) -> &'static str {
        match self {
            Category::Visibility => "🔍",
            Category::Reputation => "⭐",
            Category::Marketing => "📣",
            Category::Sales => "💼",
            Category::Pricing => "💲",
            Category::Funding => "🏦",
            Category::Operations => "⚙️",
            Category::General => "✅",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Visibility => "Visibility",
            Category::Reputation => "Reputation",
            Category::Marketing => "Marketing",
            Category::Sales => "Sales",
            Category::Pricing => "Pricing",
            Category::Funding => "Funding",
            Category::Operations => "Operations",
            Category::General => "General",
        }
    }
}

/// Keyword table for categorisation, first match wins.
pub const CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::Visibility,
        &["seo", "google business", "gbp", "search", "keyword", "listing", "website", "site speed", "map pack"],
    ),
    (Category::Reputation, &["review", "rating", "testimonial", "reputation"]),
    (
        Category::Marketing,
        &["email", "newsletter", "campaign", "social", "instagram", "facebook", "ads", "promotion", "content", "marketing"],
    ),
    (
        Category::Sales,
        &["crm", "lead", "quote", "follow-up", "follow up", "referral", "sales", "pipeline"],
    ),
    (Category::Pricing, &["price", "pricing", "discount", "offer", "bundle", "package"]),
    (Category::Funding, &["grant", "loan", "funding"]),
    (
        Category::Operations,
        &["schedule", "hours", "staff", "hire", "training", "booking", "process", "ops"],
    ),
];

/// Keyword table for the "why it matters" line, first match wins.
pub const WHY_IT_MATTERS: &[(&[&str], &str)] = &[
    (
        &["seo", "search", "keyword"],
        "Most local customers start with a search; ranking higher puts you in front of buyers who are ready to act.",
    ),
    (
        &["google business", "gbp", "listing", "hours"],
        "Your Google Business Profile is often the first impression; accurate details turn searches into calls and visits.",
    ),
    (
        &["review", "rating", "testimonial"],
        "Reviews are social proof; recent positive reviews lift both rankings and conversion.",
    ),
    (
        &["crm", "follow-up", "follow up", "lead", "quote"],
        "Systematic follow-up recovers revenue already in your pipeline instead of chasing new leads.",
    ),
    (
        &["email", "newsletter"],
        "Email reaches customers who already know you, at almost no cost per message.",
    ),
    (
        &["social", "instagram", "facebook", "content"],
        "Consistent social content keeps you visible between purchases and builds local recognition.",
    ),
    (
        &["website", "site speed", "landing page"],
        "A fast, clear website converts more of the visitors you already pay to attract.",
    ),
    (
        &["price", "pricing", "offer", "bundle"],
        "Pricing and offers shape perceived value; small changes can move margin and close rates quickly.",
    ),
    (
        &["grant", "funding", "loan"],
        "Outside funding extends your runway without giving up equity or cash flow.",
    ),
    (
        &["referral", "partner"],
        "Referrals convert at higher rates and cost less than paid acquisition.",
    ),
    (
        &["staff", "hire", "training", "schedule"],
        "Capacity and consistency decide how much demand you can actually serve.",
    ),
];

pub const GENERIC_WHY: &str =
    "This action targets a measurable outcome you can track within the stated timeframe.";

/// Leading role words treated as the action owner.
pub const OWNER_ROLES: &[&str] = &[
    "Owner", "Marketing", "Sales", "Ops", "Operations", "Manager", "Admin", "Finance", "Staff", "Team",
    "Partner", "Office",
];

/// Labeled metric values of one action line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metrics {
    pub kpi: Option<String>,
    pub target: Option<String>,
    pub baseline: Option<String>,
    pub source: Option<String>,
    pub effort: Option<String>,
    pub impact: Option<String>,
    pub season: Option<String>,
}

/// One action line broken into display parts. All text is unescaped plain
/// text; escaping happens at template assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAction {
    pub category: Category,
    pub owner: Option<String>,
    pub phrase: String,
    pub how: Vec<String>,
    pub tools: Vec<String>,
    pub metrics: Metrics,
    pub why: &'static str,
}

pub struct ActionParser {
    label_regex: Regex,
    season_regex: Regex,
    owner_regex: Regex,
    step_split_regex: Regex,
}

impl Default for ActionParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionParser {
    pub fn new() -> Self {
        let roles = OWNER_ROLES.join("|");
        Self {
            label_regex: Regex::new(r"(?i)\b(KPI|Target|Baseline|Source|Effort|Impact|HOW|TOOLS?)\s*:").unwrap(),
            season_regex: Regex::new(r"(?i)\[Season:\s*([^\]]+)\]").unwrap(),
            owner_regex: Regex::new(&format!(
                r"^(?:Owner:\s*(?P<named>\S+)\s+|(?P<role>{})\b:?\s+)(?P<phrase>[A-Z0-9].*)$",
                roles
            ))
            .unwrap(),
            step_split_regex: Regex::new(r"\s*(?:\b\d+[.)]\s+|;|\|)\s*").unwrap(),
        }
    }

    /// Up to five actions from the Action Board body, or from lines carrying
    /// both `KPI:` and `Target:` anywhere in the document.
    pub fn parse(&self, section: Option<&str>, document: &str) -> Vec<ParsedAction> {
        let mut lines = section.map(action_lines).unwrap_or_default();
        if lines.is_empty() {
            lines = document
                .lines()
                .filter(|l| l.contains("KPI:") && l.contains("Target:"))
                .map(|l| strip_bullet(l).unwrap_or_else(|| l.trim().to_string()))
                .collect();
        }
        lines
            .iter()
            .take(MAX_ACTIONS)
            .map(|line| self.parse_line(line))
            .collect()
    }

    pub fn parse_line(&self, line: &str) -> ParsedAction {
        let text = unescape_html(line).replace("**", "");

        let season = self
            .season_regex
            .captures(&text)
            .map(|c| c[1].trim().to_string());
        let text = self.season_regex.replace_all(&text, "").trim().to_string();

        let fields = self.labeled_fields(&text);
        let field = |name: &str| {
            fields
                .iter()
                .find(|(label, _)| label == name)
                .map(|(_, value)| value.clone())
                .filter(|v| !v.is_empty())
        };

        let head = self.head(&text);
        let (owner, phrase) = match self.owner_regex.captures(head) {
            Some(caps) => {
                let owner = caps
                    .name("named")
                    .or_else(|| caps.name("role"))
                    .map(|m| m.as_str().to_string());
                (owner, caps["phrase"].trim().to_string())
            }
            None => (None, head.to_string()),
        };
        let phrase = if phrase.is_empty() { text.clone() } else { phrase };

        let lowered = text.to_lowercase();
        ParsedAction {
            category: categorize(&lowered),
            owner,
            phrase,
            how: field("how").map(|v| self.split_steps(&v)).unwrap_or_default(),
            tools: field("tools").map(|v| self.split_steps(&v)).unwrap_or_default(),
            metrics: Metrics {
                kpi: field("kpi"),
                target: field("target"),
                baseline: field("baseline"),
                source: field("source"),
                effort: field("effort"),
                impact: field("impact"),
                season,
            },
            why: why_it_matters(&lowered),
        }
    }

    /// Text before the first dash separator or label.
    fn head<'t>(&self, text: &'t str) -> &'t str {
        let mut end = text.len();
        for sep in [" — ", " – ", " | "] {
            if let Some(i) = text.find(sep) {
                end = end.min(i);
            }
        }
        if let Some(m) = self.label_regex.find(text) {
            end = end.min(m.start());
        }
        text[..end].trim().trim_end_matches(['—', '–', '-', '|']).trim()
    }

    /// `(label, value)` pairs with lowercase labels; `tool` folds into `tools`.
    fn labeled_fields(&self, text: &str) -> Vec<(String, String)> {
        let matches: Vec<_> = self.label_regex.captures_iter(text).collect();
        matches
            .iter()
            .enumerate()
            .map(|(i, caps)| {
                let whole = caps.get(0).map_or(0..0, |m| m.range());
                let end = matches
                    .get(i + 1)
                    .and_then(|next| next.get(0))
                    .map_or(text.len(), |m| m.start());
                let mut label = caps[1].to_lowercase();
                if label == "tool" {
                    label = "tools".to_string();
                }
                (label, clean_value(&text[whole.end..end]))
            })
            .collect()
    }

    fn split_steps(&self, value: &str) -> Vec<String> {
        self.step_split_regex
            .split(value)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

fn action_lines(body: &str) -> Vec<String> {
    let bullets: Vec<String> = body.lines().filter_map(strip_bullet).collect();
    if !bullets.is_empty() {
        return bullets;
    }
    body.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Trim separators around a labeled value and drop an unmatched closing paren.
fn clean_value(raw: &str) -> String {
    let separators = |c: char| c.is_whitespace() || matches!(c, '|' | ';' | ',' | '—' | '–' | '(');
    let mut value = raw.trim_matches(separators).to_string();
    while value.ends_with(')') && value.matches(')').count() > value.matches('(').count() {
        value.pop();
        value = value.trim_end_matches(separators).to_string();
    }
    value
}

/// Category for lowercased action text.
pub fn categorize(lowered: &str) -> Category {
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lowered.contains(k)))
        .map_or(Category::General, |(category, _)| *category)
}

/// Plain-language explanation for lowercased action text.
pub fn why_it_matters(lowered: &str) -> &'static str {
    WHY_IT_MATTERS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lowered.contains(k)))
        .map_or(GENERIC_WHY, |(_, why)| *why)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANONICAL: &str = "Update GBP holiday hours — KPI: profile views Target: +15% in 30 days \
        (Effort:L; Impact:H) | HOW: 1) Open GBP | 2) Set hours | 3) Post update | \
        TOOLS: 1) Google Business Profile 2) Canva 3) Calendar";

    #[test]
    fn test_canonical_line() {
        let action = ActionParser::new().parse_line(CANONICAL);
        assert_eq!(action.phrase, "Update GBP holiday hours");
        assert_eq!(action.owner, None);
        assert_eq!(action.metrics.kpi.as_deref(), Some("profile views"));
        assert_eq!(action.metrics.target.as_deref(), Some("+15% in 30 days"));
        assert_eq!(action.metrics.effort.as_deref(), Some("L"));
        assert_eq!(action.metrics.impact.as_deref(), Some("H"));
        assert_eq!(action.how, vec!["Open GBP", "Set hours", "Post update"]);
        assert_eq!(action.tools, vec!["Google Business Profile", "Canva", "Calendar"]);
        assert_eq!(action.category, Category::Visibility);
    }

    #[test]
    fn test_owner_extraction() {
        let parser = ActionParser::new();
        let action = parser.parse_line("Marketing Launch fall tune-up email — KPI: bookings Target: +10%");
        assert_eq!(action.owner.as_deref(), Some("Marketing"));
        assert_eq!(action.phrase, "Launch fall tune-up email");

        let action = parser.parse_line("Owner: Dana Call lapsed quotes — KPI: closes Target: +5%");
        assert_eq!(action.owner.as_deref(), Some("Dana"));
        assert_eq!(action.phrase, "Call lapsed quotes");

        // lowercase continuation is part of the phrase, not an owner
        let action = parser.parse_line("Marketing budget review — KPI: spend Target: -5%");
        assert_eq!(action.owner, None);
        assert_eq!(action.phrase, "Marketing budget review");
    }

    #[test]
    fn test_free_form_fields_and_season() {
        let line = "Ask for reviews after each job [Season: Fall] KPI: new reviews; Target: +20%; \
                    Baseline: 3/month; Source: owner tally; HOW: text link; thank reviewers; TOOL: Podium";
        let action = ActionParser::new().parse_line(line);
        assert_eq!(action.metrics.season.as_deref(), Some("Fall"));
        assert_eq!(action.metrics.baseline.as_deref(), Some("3/month"));
        assert_eq!(action.metrics.source.as_deref(), Some("owner tally"));
        assert_eq!(action.how, vec!["text link", "thank reviewers"]);
        assert_eq!(action.tools, vec!["Podium"]);
        assert_eq!(action.category, Category::Reputation);
        assert_eq!(action.phrase, "Ask for reviews after each job");
    }

    #[test]
    fn test_balanced_parens_kept() {
        let action = ActionParser::new().parse_line("Track calls — KPI: booked appts (monthly) Target: +5%");
        assert_eq!(action.metrics.kpi.as_deref(), Some("booked appts (monthly)"));
    }

    #[test]
    fn test_parse_caps_at_five() {
        let body = (1..=7).map(|i| format!("- Action {} KPI: x Target: +1%", i)).collect::<Vec<_>>().join("\n");
        assert_eq!(ActionParser::new().parse(Some(&body), "").len(), MAX_ACTIONS);
    }

    #[test]
    fn test_document_scan_fallback() {
        let doc = "Intro\nRun promo KPI: sales Target: +5%\nOnly KPI: here\n- Fix site KPI: speed Target: +20%";
        let actions = ActionParser::new().parse(None, doc);
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[1].phrase, "Fix site");
    }

    #[test]
    fn test_why_it_matters_first_match() {
        assert_eq!(why_it_matters("improve seo and reviews"), WHY_IT_MATTERS[0].1);
        assert_eq!(why_it_matters("get more reviews"), WHY_IT_MATTERS[2].1);
        assert_eq!(why_it_matters("repaint the lobby"), GENERIC_WHY);
    }

    #[test]
    fn test_categorize_default() {
        assert_eq!(categorize("repaint the lobby"), Category::General);
        assert_eq!(Category::General.emoji(), "✅");
        assert_eq!(categorize("apply for a grant"), Category::Funding);
    }

    #[test]
    fn test_escaped_input_is_unescaped() {
        let action = ActionParser::new().parse_line("Fix &lt;title&gt; tags — KPI: clicks Target: +5%");
        assert_eq!(action.phrase, "Fix <title> tags");
    }
}
