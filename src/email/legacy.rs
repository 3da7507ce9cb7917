//! Markdown to HTML for free-form generator output.
//!
//! Events from `pulldown-cmark` are rendered by hand so every piece of text
//! goes through the same escaping as the sectioned layout. Raw HTML in the
//! input is escaped, never passed through. Headings are clamped to h2-h4
//! and soft line breaks become `<br>`.

use super::links::{Linker, anchor};
use crate::report::{escape_html, is_http_url};
use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};

/// Link being collected: destination and label text.
struct OpenLink {
    href: String,
    label: String,
}

/// Convert `markdown` to an HTML body fragment.
pub fn markdown_to_html(linker: &Linker, markdown: &str) -> String {
    let mut html = String::new();
    let mut link: Option<OpenLink> = None;
    let mut in_code_block = false;
    // adjacent text events are joined so URLs split by the parser stay whole
    let mut text = String::new();

    for event in Parser::new_ext(markdown, Options::ENABLE_STRIKETHROUGH) {
        if let (Event::Text(chunk), None, false) = (&event, &link, in_code_block) {
            text.push_str(chunk);
            continue;
        }
        if !text.is_empty() {
            html.push_str(&linker.inline(&text));
            text.clear();
        }

        if let Some(open) = link.as_mut() {
            match event {
                Event::Text(chunk) | Event::Code(chunk) => open.label.push_str(&chunk),
                Event::SoftBreak | Event::HardBreak => open.label.push(' '),
                Event::End(TagEnd::Link) => {
                    let label = if open.label.trim().is_empty() { open.href.clone() } else { open.label.clone() };
                    if is_http_url(&open.href) {
                        html.push_str(&anchor(&open.href, &label));
                    } else {
                        html.push_str(&escape_html(&label));
                    }
                    link = None;
                }
                _ => {}
            }
            continue;
        }

        match event {
            Event::Start(tag) => match tag {
                Tag::Paragraph => html.push_str("<p>"),
                Tag::Heading { level, .. } => html.push_str(&format!("<h{}>", clamp(level))),
                Tag::List(Some(start)) if start != 1 => html.push_str(&format!("<ol start=\"{}\">\n", start)),
                Tag::List(Some(_)) => html.push_str("<ol>\n"),
                Tag::List(None) => html.push_str("<ul>\n"),
                Tag::Item => html.push_str("<li>"),
                Tag::Emphasis => html.push_str("<em>"),
                Tag::Strong => html.push_str("<strong>"),
                Tag::Strikethrough => html.push_str("<s>"),
                Tag::CodeBlock(_) => {
                    in_code_block = true;
                    html.push_str("<pre><code>");
                }
                Tag::Link { dest_url, .. } => {
                    link = Some(OpenLink {
                        href: dest_url.to_string(),
                        label: String::new(),
                    });
                }
                _ => {}
            },
            Event::End(tag) => match tag {
                TagEnd::Paragraph => html.push_str("</p>\n"),
                TagEnd::Heading(level) => html.push_str(&format!("</h{}>\n", clamp(level))),
                TagEnd::List(true) => html.push_str("</ol>\n"),
                TagEnd::List(false) => html.push_str("</ul>\n"),
                TagEnd::Item => html.push_str("</li>\n"),
                TagEnd::Emphasis => html.push_str("</em>"),
                TagEnd::Strong => html.push_str("</strong>"),
                TagEnd::Strikethrough => html.push_str("</s>"),
                TagEnd::CodeBlock => {
                    in_code_block = false;
                    html.push_str("</code></pre>\n");
                }
                _ => {}
            },
            Event::Text(code) => html.push_str(&escape_html(&code)),
            Event::Code(code) => {
                html.push_str("<code>");
                html.push_str(&escape_html(&code));
                html.push_str("</code>");
            }
            Event::Html(raw) | Event::InlineHtml(raw) => html.push_str(&escape_html(&raw)),
            Event::SoftBreak | Event::HardBreak => html.push_str("<br>\n"),
            Event::Rule => html.push_str("<hr>\n"),
            _ => {}
        }
    }
    html.push_str(&linker.inline(&text));
    html
}

fn clamp(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 | HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        _ => 4,
    }
}
