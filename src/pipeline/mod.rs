//! Brief generation: plan, search, write, recover, render and deliver.
//!
//! Planning, searching and writing run under one wall-clock timeout. What
//! comes back from the writer goes through the structured-output core:
//! tolerant parse, repair, schema validation and deterministic rendering.
//! Writer output that is not JSON at all takes the free-form path instead.
//! Validation failures, generator failures and timeouts all end in a
//! synthetic fallback report, so a run always yields a brief.

mod config;
mod events;
mod generator;
mod plan;
mod prompts;
mod search;
mod transport;

pub use config::{BriefConfig, DEFAULT_SEARCH_COUNT, DEFAULT_TIMEOUT, TokenCaps};
pub use events::{EventCallback, PipelineCallbacks, PipelineEvent, verbose_callbacks};
pub use generator::{AgentRole, Generation, TextGenerator, TokenUsage, check_token_usage};
pub use plan::{WebSearchItem, WebSearchPlan};
pub use prompts::{
    ACTION_LINE_FORMAT, EXAMPLE_ACTIONS, GLOBAL_HARDENING, TEMPLATES, planner_instructions, template_names,
    writer_instructions,
};
pub use search::perform_searches;
pub use transport::{DeliveryReceipt, EmailMessage, EmailTransport, SENDGRID_ENDPOINT, SendGridTransport};

use crate::context::RequestContext;
use crate::email::{EmailFormatter, Sections};
use crate::error::{Error, Result};
use crate::parser::TolerantParser;
use crate::render::render_markdown;
use crate::repair::repair;
use crate::report::{Report, ReportSchema};
use serde_json::Value;
use std::sync::Arc;
use tracing::Instrument;

/// One brief to produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BriefRequest {
    pub query: String,
    /// Name from [`TEMPLATES`]
    pub template: String,
    pub business: String,
    pub location: String,
    pub send_email: bool,
}

impl BriefRequest {
    pub fn new(
        query: impl Into<String>,
        template: impl Into<String>,
        business: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            query: query.into(),
            template: template.into(),
            business: business.into(),
            location: location.into(),
            send_email: false,
        }
    }

    pub fn send_email(mut self, enabled: bool) -> Self {
        self.send_email = enabled;
        self
    }
}

/// Which path produced the brief.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    /// Parsed, repaired and validated writer output
    Canonical,
    /// Synthetic report after a validation failure, generator error or timeout
    Fallback,
    /// Writer output with no JSON object, formatted as free-form markdown
    Legacy,
}

/// Everything a run produced.
#[derive(Debug)]
pub struct BriefOutcome {
    pub context: RequestContext,
    pub branch: Branch,
    /// The validated (or fallback) report; `None` on the free-form path
    pub report: Option<Report>,
    pub markdown: String,
    pub email: EmailMessage,
    /// Delivery result, when sending was requested
    pub delivery: Option<Result<DeliveryReceipt>>,
}

/// Rendered brief before delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct Brief {
    pub branch: Branch,
    pub report: Option<Report>,
    pub markdown: String,
}

/// Orchestrates brief generation over a [`TextGenerator`] and an optional
/// [`EmailTransport`].
pub struct BriefPipeline<G, T = SendGridTransport> {
    generator: G,
    transport: Option<T>,
    config: BriefConfig,
    parser: TolerantParser,
    schema: ReportSchema,
    formatter: EmailFormatter,
    callbacks: PipelineCallbacks,
}

impl<G: TextGenerator> BriefPipeline<G> {
    /// Create a pipeline without a transport.
    pub fn new(generator: G, config: BriefConfig) -> Result<Self> {
        Ok(Self {
            generator,
            transport: None,
            formatter: EmailFormatter::with_branding(config.branding.clone()),
            config,
            parser: TolerantParser::new(),
            schema: ReportSchema::new()?,
            callbacks: PipelineCallbacks::default(),
        })
    }
}

impl<G: TextGenerator, T: EmailTransport> BriefPipeline<G, T> {
    /// Use `transport` for requests with `send_email` set.
    pub fn with_transport<U: EmailTransport>(self, transport: U) -> BriefPipeline<G, U> {
        BriefPipeline {
            generator: self.generator,
            transport: Some(transport),
            config: self.config,
            parser: self.parser,
            schema: self.schema,
            formatter: self.formatter,
            callbacks: self.callbacks,
        }
    }

    /// Log progress through `tracing`.
    pub fn verbose(mut self, enabled: bool) -> Self {
        if enabled {
            self.callbacks = verbose_callbacks();
        }
        self
    }

    /// Set a callback for every event.
    pub fn on_event<F>(mut self, f: F) -> Self
    where
        F: Fn(&PipelineEvent) + Send + Sync + 'static,
    {
        self.callbacks.on_event = Some(Arc::new(f));
        self
    }

    /// Set a callback for search progress events.
    pub fn on_search_completed<F>(mut self, f: F) -> Self
    where
        F: Fn(&PipelineEvent) + Send + Sync + 'static,
    {
        self.callbacks.on_search_completed = Some(Arc::new(f));
        self
    }

    /// Set a callback for fallback and free-form events.
    pub fn on_fallback<F>(mut self, f: F) -> Self
    where
        F: Fn(&PipelineEvent) + Send + Sync + 'static,
    {
        self.callbacks.on_fallback = Some(Arc::new(f));
        self
    }

    pub fn config(&self) -> &BriefConfig {
        &self.config
    }

    fn emit(&self, event: PipelineEvent) {
        self.callbacks.emit(&event);
    }

    /// Produce a brief and, when requested, email it.
    ///
    /// Fails only on an unknown template. Generator failures and timeouts
    /// become a fallback brief; delivery failures are reported in
    /// [`BriefOutcome::delivery`].
    pub async fn run(&self, request: &BriefRequest) -> Result<BriefOutcome> {
        let instructions = writer_instructions(&request.template, &request.business, &request.location)?;
        let context = RequestContext::new(&request.template, &request.business, &request.location);
        let span = tracing::info_span!(
            "brief",
            trace_id = %context.trace_id(),
            template = %context.template(),
        );

        async {
            self.emit(PipelineEvent::Started {
                trace_id: context.trace_id().to_string(),
            });

            let written = tokio::time::timeout(self.config.timeout, self.write(request, &instructions)).await;
            let brief = match written {
                Ok(Ok(text)) => self.recover(&text),
                Ok(Err(e)) => {
                    self.emit(PipelineEvent::Error { message: e.to_string() });
                    self.fallback(&e)
                }
                Err(_) => self.fallback(&Error::Timeout(self.config.timeout)),
            };

            let email = self.compose(&context, &brief);
            let delivery = if request.send_email {
                Some(self.deliver(&email).await)
            } else {
                None
            };

            Ok(BriefOutcome {
                context,
                branch: brief.branch,
                report: brief.report,
                markdown: brief.markdown,
                email,
                delivery,
            })
        }
        .instrument(span)
        .await
    }

    /// Plan, search and write; returns the raw writer text.
    async fn write(&self, request: &BriefRequest, instructions: &str) -> Result<String> {
        let caps = &self.config.token_caps;

        let plan = match self
            .generator
            .generate(
                AgentRole::Planner,
                &planner_instructions(self.config.search_count),
                &prompts::planner_input(&request.query),
            )
            .await
        {
            Ok(generation) => {
                check_token_usage(AgentRole::Planner, generation.output_tokens, caps.cap(AgentRole::Planner));
                WebSearchPlan::from_output(&self.parser, &generation.text, &request.query, self.config.search_count)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Planner failed, searching the raw query");
                WebSearchPlan::fallback(&request.query)
            }
        };
        self.emit(PipelineEvent::SearchesPlanned { count: plan.len() });

        let results = perform_searches(&self.generator, &plan, caps.cap(AgentRole::Search), &self.callbacks).await;

        let generation = self
            .generator
            .generate(
                AgentRole::Writer,
                instructions,
                &prompts::writer_input(&request.query, &results),
            )
            .await?;
        check_token_usage(AgentRole::Writer, generation.output_tokens, caps.cap(AgentRole::Writer));
        self.emit(PipelineEvent::ReportWritten {
            chars: generation.text.chars().count(),
        });
        Ok(generation.text)
    }

    /// Turn writer text into a brief: parse, repair, validate and render,
    /// or the free-form path when no JSON object can be recovered.
    pub fn recover(&self, text: &str) -> Brief {
        let Some(parsed) = self.parser.parse(text) else {
            self.emit(PipelineEvent::LegacyFormat);
            return Brief {
                branch: Branch::Legacy,
                report: None,
                markdown: text.trim().to_string(),
            };
        };

        let repaired = Value::Object(repair(&parsed));
        match self.schema.validate(&repaired) {
            Ok(report) => Brief {
                branch: Branch::Canonical,
                markdown: render_markdown(&report),
                report: Some(report),
            },
            Err(e) => self.fallback(&e),
        }
    }

    fn fallback(&self, error: &Error) -> Brief {
        let reason = error.to_string();
        self.emit(PipelineEvent::FallbackUsed { reason: reason.clone() });
        let report = Report::fallback(&reason);
        Brief {
            branch: Branch::Fallback,
            markdown: render_markdown(&report),
            report: Some(report),
        }
    }

    /// Email for a brief. Free-form markdown with recognisable sections
    /// still gets the sectioned layout.
    pub fn compose(&self, context: &RequestContext, brief: &Brief) -> EmailMessage {
        let subject = context.subject();
        let sectioned = brief.branch != Branch::Legacy || Sections::extract(&brief.markdown) != Sections::default();
        let html = if sectioned {
            self.formatter.format(&subject, &brief.markdown)
        } else {
            self.formatter.format_legacy(&subject, &brief.markdown)
        };
        EmailMessage { subject, html }
    }

    async fn deliver(&self, email: &EmailMessage) -> Result<DeliveryReceipt> {
        let Some(transport) = &self.transport else {
            let e = Error::Config("Email requested but no transport configured".to_string());
            self.emit(PipelineEvent::Error { message: e.to_string() });
            return Err(e);
        };

        match transport.send(email).await {
            Ok(receipt) => {
                self.emit(PipelineEvent::EmailSent {
                    status_code: receipt.status_code,
                    recipient: receipt.recipient.clone(),
                });
                Ok(receipt)
            }
            Err(e) => {
                self.emit(PipelineEvent::Error { message: e.to_string() });
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    const WRITER_JSON: &str = r#"Here is the brief:
```json
{
  "short_summary": "Acme can win more local searches by fixing its listing and reviews.",
  "actions": [
    {"title": "Update GBP holiday hours", "kpi": "profile views", "target_percent": "+15%",
     "target_days": 30, "how_steps": ["Open GBP", "Set hours", "Post update"],
     "tools": ["Google Business Profile", "Canva", "Calendar"], "effort": "L", "impact": "H"},
  ],
  "exec_summary": ["Search drives most calls", "Reviews lag rivals"],
  "findings": ["Average call costs $180", "Most competitors lack online booking"],
  "gaps": ["No one offers weekend service"],
  "sources": ["https://www.yelp.com/biz/acme"]
}
```"#;

    /// Scripted generator: fixed planner, search and writer replies.
    struct Scripted {
        planner: Result<Generation>,
        writer: std::result::Result<String, String>,
        delay: Duration,
        calls: Mutex<Vec<AgentRole>>,
    }

    impl Scripted {
        fn writing(text: &str) -> Self {
            Self {
                planner: Ok(Generation::new(
                    r#"{"searches": [{"reason": "prices", "query": "plumber prices"}, {"reason": "rivals", "query": "plumbers near me"}]}"#,
                )),
                writer: Ok(text.to_string()),
                delay: Duration::ZERO,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl TextGenerator for Scripted {
        async fn generate(&self, role: AgentRole, _instructions: &str, input: &str) -> Result<Generation> {
            self.calls.lock().unwrap().push(role);
            match role {
                AgentRole::Planner => match &self.planner {
                    Ok(g) => Ok(g.clone()),
                    Err(_) => Err(Error::Generator { agent: role.to_string(), message: "down".into() }),
                },
                AgentRole::Search => Ok(Generation::new(format!("notes for {}", input))),
                _ => {
                    tokio::time::sleep(self.delay).await;
                    self.writer
                        .clone()
                        .map(|text| Generation::new(text).with_tokens(850))
                        .map_err(|message| Error::Generator { agent: role.to_string(), message })
                }
            }
        }
    }

    #[derive(Default)]
    struct Outbox {
        sent: Mutex<Vec<EmailMessage>>,
        fail: bool,
    }

    impl EmailTransport for Outbox {
        async fn send(&self, message: &EmailMessage) -> Result<DeliveryReceipt> {
            if self.fail {
                return Err(Error::Transport("SendGrid returned HTTP 401".into()));
            }
            self.sent.lock().unwrap().push(message.clone());
            Ok(DeliveryReceipt {
                status_code: 202,
                recipient: "owner@example.com".into(),
            })
        }
    }

    fn request() -> BriefRequest {
        BriefRequest::new("plumbing market trends", "Local SEO Audit", "Acme Plumbing", "Austin, TX")
    }

    #[tokio::test]
    async fn test_canonical_run() {
        let pipeline = BriefPipeline::new(Scripted::writing(WRITER_JSON), BriefConfig::default()).unwrap();
        let outcome = pipeline.run(&request()).await.unwrap();

        assert_eq!(outcome.branch, Branch::Canonical);
        let report = outcome.report.unwrap();
        assert_eq!(report.actions().len(), 5);
        assert_eq!(report.actions()[0].title(), "Update GBP holiday hours");
        assert!(outcome.markdown.starts_with("## Action Board"));
        assert_eq!(outcome.email.subject, "Local SEO Audit Brief: Acme Plumbing – Austin, TX");
        assert!(outcome.email.html.contains("Update GBP holiday hours"));
        assert!(outcome.delivery.is_none());
        assert!(outcome.context.trace_id().starts_with("trace_"));

        let calls = pipeline.generator.calls.lock().unwrap();
        assert_eq!(calls.iter().filter(|r| **r == AgentRole::Search).count(), 2);
        assert_eq!(calls.first(), Some(&AgentRole::Planner));
        assert_eq!(calls.last(), Some(&AgentRole::Writer));
    }

    #[tokio::test]
    async fn test_unknown_template_is_config_error() {
        let pipeline = BriefPipeline::new(Scripted::writing(WRITER_JSON), BriefConfig::default()).unwrap();
        let mut req = request();
        req.template = "Poetry".into();
        assert!(matches!(pipeline.run(&req).await, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_planner_failure_searches_raw_query() {
        let mut generator = Scripted::writing(WRITER_JSON);
        generator.planner = Err(Error::Config("unused".into()));
        let pipeline = BriefPipeline::new(generator, BriefConfig::default()).unwrap();
        let outcome = pipeline.run(&request()).await.unwrap();
        assert_eq!(outcome.branch, Branch::Canonical);
        let calls = pipeline.generator.calls.lock().unwrap();
        assert_eq!(calls.iter().filter(|r| **r == AgentRole::Search).count(), 1);
    }

    #[tokio::test]
    async fn test_writer_failure_uses_fallback_report() {
        let mut generator = Scripted::writing(WRITER_JSON);
        generator.writer = Err("quota exceeded".into());
        let reasons: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = reasons.clone();
        let pipeline = BriefPipeline::new(generator, BriefConfig::default())
            .unwrap()
            .on_fallback(move |e| {
                if let PipelineEvent::FallbackUsed { reason } = e {
                    sink.lock().unwrap().push(reason.clone());
                }
            });

        let outcome = pipeline.run(&request()).await.unwrap();
        assert_eq!(outcome.branch, Branch::Fallback);
        assert!(outcome.report.unwrap().short_summary().contains("quota exceeded"));
        assert_eq!(reasons.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_uses_fallback_report() {
        let mut generator = Scripted::writing(WRITER_JSON);
        generator.delay = Duration::from_secs(600);
        let config = BriefConfig::default().timeout(Duration::from_secs(5));
        let pipeline = BriefPipeline::new(generator, config).unwrap();

        let outcome = pipeline.run(&request()).await.unwrap();
        assert_eq!(outcome.branch, Branch::Fallback);
        assert!(outcome.report.unwrap().short_summary().contains("timed out"));
        assert!(outcome.markdown.contains("## Action Board"));
    }

    #[tokio::test]
    async fn test_free_form_output_takes_legacy_path() {
        let markdown = "## Executive Summary\n- Search drives calls\n\n## Main Findings\n- Rivals lack booking\n";
        let pipeline = BriefPipeline::new(Scripted::writing(markdown), BriefConfig::default()).unwrap();
        let outcome = pipeline.run(&request()).await.unwrap();
        assert_eq!(outcome.branch, Branch::Legacy);
        assert!(outcome.report.is_none());
        assert_eq!(outcome.markdown, markdown.trim());
        // sectioned layout still applies
        assert!(outcome.email.html.contains("Dogs Not Barking"));

        let plain = BriefPipeline::new(Scripted::writing("Just a paragraph."), BriefConfig::default()).unwrap();
        let outcome = plain.run(&request()).await.unwrap();
        assert!(outcome.email.html.contains("<p>Just a paragraph.</p>"));
        assert!(!outcome.email.html.contains("Dogs Not Barking"));
    }

    #[tokio::test]
    async fn test_delivery() {
        let pipeline = BriefPipeline::new(Scripted::writing(WRITER_JSON), BriefConfig::default())
            .unwrap()
            .with_transport(Outbox::default());
        let outcome = pipeline.run(&request().send_email(true)).await.unwrap();
        let receipt = outcome.delivery.unwrap().unwrap();
        assert_eq!(receipt.status_code, 202);
        let sent = pipeline.transport.as_ref().unwrap().sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, outcome.email.subject);
    }

    #[tokio::test]
    async fn test_delivery_failure_keeps_brief() {
        let pipeline = BriefPipeline::new(Scripted::writing(WRITER_JSON), BriefConfig::default())
            .unwrap()
            .with_transport(Outbox { fail: true, ..Default::default() });
        let outcome = pipeline.run(&request().send_email(true)).await.unwrap();
        assert_eq!(outcome.branch, Branch::Canonical);
        assert!(matches!(outcome.delivery, Some(Err(Error::Transport(_)))));
    }

    #[tokio::test]
    async fn test_send_without_transport() {
        let pipeline = BriefPipeline::new(Scripted::writing(WRITER_JSON), BriefConfig::default()).unwrap();
        let outcome = pipeline.run(&request().send_email(true)).await.unwrap();
        assert!(matches!(outcome.delivery, Some(Err(Error::Config(_)))));
    }

    #[test]
    fn test_recover_is_synchronous() {
        let pipeline = BriefPipeline::new(Scripted::writing(""), BriefConfig::default()).unwrap();
        let brief = pipeline.recover(r#"{"short_summary": "test", "actions": [],}"#);
        assert_eq!(brief.branch, Branch::Canonical);
        assert_eq!(brief.report.unwrap().actions().len(), 5);
    }
}
