//! Brief from saved writer output.
//!
//! Runs captured model text through recovery, repair, validation and
//! rendering, then prints the markdown brief and the HTML email.
//!
//! Run with:
//!   cargo run --example brief_from_output -- writer_output.txt
//!   cat writer_output.txt | RUST_LOG=debug cargo run --example brief_from_output

use smb_brief::{EmailFormatter, RequestContext, Report, ReportSchema, TolerantParser, render_markdown, repair};
use serde_json::Value;
use std::io::Read;
use tracing_subscriber::EnvFilter;

fn read_input() -> std::io::Result<String> {
    match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(path),
        None => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let text = read_input()?;
    let context = RequestContext::new("Local SEO Audit", "Acme Plumbing", "Austin, TX");
    let formatter = EmailFormatter::new();

    let (markdown, html) = match TolerantParser::new().parse(&text) {
        Some(parsed) => {
            let report = match ReportSchema::new()?.validate(&Value::Object(repair(&parsed))) {
                Ok(report) => report,
                Err(e) => {
                    tracing::warn!(error = %e, "Using fallback report");
                    Report::fallback(&e.to_string())
                }
            };
            let markdown = render_markdown(&report);
            let html = formatter.format(&context.subject(), &markdown);
            (markdown, html)
        }
        None => {
            tracing::warn!("No JSON object found, formatting as free-form markdown");
            let markdown = text.trim().to_string();
            let html = formatter.format_legacy(&context.subject(), &markdown);
            (markdown, html)
        }
    };

    println!("{}", "=".repeat(60));
    println!("{}", context.subject());
    println!("{}", "=".repeat(60));
    println!("{}\n", markdown);
    println!("{}", html);
    Ok(())
}
