//! Inline markup and source links for email HTML.

use crate::report::{escape_html, unescape_html};
use regex::Regex;
use url::Url;

const LINK_STYLE: &str = "color:#1d4ed8;text-decoration:underline;";

/// One entry of the Sources list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLink {
    pub href: Option<String>,
    pub label: String,
}

pub struct Linker {
    link_regex: Regex,
    bold_regex: Regex,
    italic_regex: Regex,
}

impl Default for Linker {
    fn default() -> Self {
        Self::new()
    }
}

impl Linker {
    pub fn new() -> Self {
        Self {
            link_regex: Regex::new(r#"\[([^\]]+)\]\((https?://[^)\s]+)\)|(https?://[^\s<>()\[\]"]+)"#).unwrap(),
            bold_regex: Regex::new(r"\*\*(.+?)\*\*").unwrap(),
            italic_regex: Regex::new(r"\*([^*\s](?:[^*]*[^*\s])?)\*|\b_([^_\s](?:[^_]*[^_\s])?)_\b").unwrap(),
        }
    }

    /// Escaped HTML for a line of text. Markdown links and bare URLs become
    /// anchors, `**bold**` becomes `<strong>` and `*italic*`/`_italic_`
    /// becomes `<em>`.
    pub fn inline(&self, text: &str) -> String {
        let text = unescape_html(text);
        let mut out = String::with_capacity(text.len() + 16);
        let mut last = 0;

        for caps in self.link_regex.captures_iter(&text) {
            let Some(whole) = caps.get(0) else { continue };
            out.push_str(&self.emphasis(&text[last..whole.start()]));

            match (caps.get(1), caps.get(2), caps.get(3)) {
                (Some(label), Some(url), _) => out.push_str(&anchor(url.as_str(), label.as_str())),
                (_, _, Some(bare)) => {
                    let (url, trailing) = split_trailing_punctuation(bare.as_str());
                    out.push_str(&anchor(url, url));
                    out.push_str(&escape_html(trailing));
                }
                _ => out.push_str(&escape_html(whole.as_str())),
            }
            last = whole.end();
        }
        out.push_str(&self.emphasis(&text[last..]));
        out
    }

    fn emphasis(&self, segment: &str) -> String {
        let escaped = escape_html(segment);
        let bold = self.bold_regex.replace_all(&escaped, "<strong>$1</strong>");
        self.italic_regex
            .replace_all(&bold, |caps: &regex::Captures| {
                let inner = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
                format!("<em>{}</em>", inner)
            })
            .into_owned()
    }

    /// Sources list entries. URLs lose their `utm_*` parameters and only the
    /// first URL per root domain is kept; plain citations are kept once each.
    pub fn sources(&self, lines: &[String]) -> Vec<SourceLink> {
        let mut seen_domains: Vec<String> = Vec::new();
        let mut links: Vec<SourceLink> = Vec::new();

        for line in lines {
            let line = unescape_html(line.trim());
            if line.is_empty() {
                continue;
            }
            let Some(caps) = self.link_regex.captures(&line) else {
                if !links.iter().any(|l| l.href.is_none() && l.label == line) {
                    links.push(SourceLink { href: None, label: line.clone() });
                }
                continue;
            };

            let (raw_url, label) = match (caps.get(2), caps.get(3)) {
                (Some(url), _) => (url.as_str(), caps.get(1).map(|m| m.as_str().to_string())),
                (None, Some(bare)) => (split_trailing_punctuation(bare.as_str()).0, None),
                _ => continue,
            };

            let url = strip_tracking(raw_url);
            let domain = root_domain(&url).unwrap_or_else(|| url.clone());
            if seen_domains.contains(&domain) {
                continue;
            }
            seen_domains.push(domain.clone());
            links.push(SourceLink { href: Some(url), label: label.unwrap_or(domain) });
        }
        links
    }
}

pub fn anchor(href: &str, label: &str) -> String {
    format!(
        "<a href=\"{}\" style=\"{}\">{}</a>",
        escape_html(href),
        LINK_STYLE,
        escape_html(label)
    )
}

fn split_trailing_punctuation(url: &str) -> (&str, &str) {
    let trimmed = url.trim_end_matches(['.', ',', ';', ':', '!', '?']);
    (trimmed, &url[trimmed.len()..])
}

/// Drop `utm_*` query parameters. Unparseable URLs are returned unchanged.
pub fn strip_tracking(raw: &str) -> String {
    let Ok(mut url) = Url::parse(raw) else {
        return raw.to_string();
    };
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !key.starts_with("utm_"))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }
    url.to_string()
}

/// Last two labels of the host, without `www.`.
pub fn root_domain(raw: &str) -> Option<String> {
    let url = Url::parse(raw).ok()?;
    let host = url.host_str()?.trim_start_matches("www.").to_lowercase();
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() <= 2 {
        return Some(host);
    }
    Some(labels[labels.len() - 2..].join("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_and_bare_links() {
        let html = Linker::new().inline("See [the report](https://a.com/x) or https://b.com/y.");
        assert!(html.contains("<a href=\"https://a.com/x\""));
        assert!(html.contains(">the report</a>"));
        assert!(html.contains("<a href=\"https://b.com/y\""));
        assert!(html.ends_with("</a>."));
    }

    #[test]
    fn test_emphasis() {
        let linker = Linker::new();
        assert_eq!(
            linker.inline("**Bold** then *italic* and _also_ here"),
            "<strong>Bold</strong> then <em>italic</em> and <em>also</em> here"
        );
        assert_eq!(linker.inline("5 * 3 * 2 and snake_case_name"), "5 * 3 * 2 and snake_case_name");
    }

    #[test]
    fn test_text_is_escaped() {
        let html = Linker::new().inline("<script>alert(1)</script> & **bold**");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("&amp;"));
        assert!(html.contains("<strong>bold</strong>"));
    }

    #[test]
    fn test_no_double_escape() {
        let html = Linker::new().inline("Tom &amp; Jerry &lt;3");
        assert_eq!(html, "Tom &amp; Jerry &lt;3");
    }

    #[test]
    fn test_strip_tracking() {
        assert_eq!(
            strip_tracking("https://a.com/p?utm_source=x&id=7&utm_medium=y"),
            "https://a.com/p?id=7"
        );
        assert_eq!(strip_tracking("https://a.com/p?utm_source=x"), "https://a.com/p");
        assert_eq!(strip_tracking("not a url"), "not a url");
    }

    #[test]
    fn test_root_domain() {
        assert_eq!(root_domain("https://www.yelp.com/biz/x").as_deref(), Some("yelp.com"));
        assert_eq!(root_domain("https://maps.google.com").as_deref(), Some("google.com"));
        assert_eq!(root_domain("nope"), None);
    }

    #[test]
    fn test_sources_dedupe_by_root_domain() {
        let lines: Vec<String> = vec![
            "https://www.yelp.com/a?utm_source=news".into(),
            "https://m.yelp.com/b".into(),
            "[Census](https://census.gov/data)".into(),
            "(local research)".into(),
            "(local research)".into(),
        ];
        let sources = Linker::new().sources(&lines);
        assert_eq!(sources.len(), 3);
        assert_eq!(sources[0].href.as_deref(), Some("https://www.yelp.com/a"));
        assert_eq!(sources[0].label, "yelp.com");
        assert_eq!(sources[1].label, "Census");
        assert_eq!(sources[2], SourceLink { href: None, label: "(local research)".into() });
    }
}
