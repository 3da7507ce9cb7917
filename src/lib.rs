//! smb-brief - decision briefs for small businesses
//!
//! A research pipeline plans web searches, runs them concurrently, and asks a
//! writer model for a structured brief. Model output is never trusted: it is
//! recovered by a tolerant JSON parser, repaired into a schema-conforming
//! shape, validated, and rendered deterministically into markdown and a
//! styled HTML email. Every failure path still produces a complete brief.
//!
//! # Quick Start
//!
//! ```ignore
//! use smb_brief::{BriefConfig, BriefPipeline, BriefRequest, SendGridTransport};
//!
//! #[tokio::main]
//! async fn main() -> smb_brief::Result<()> {
//!     let config = BriefConfig::from_env()?;
//!     let transport = SendGridTransport::from_config(&config)?;
//!     let pipeline = BriefPipeline::new(MyModel::default(), config)?
//!         .with_transport(transport)
//!         .verbose(true);
//!
//!     let request = BriefRequest::new(
//!         "plumbing demand in Austin",
//!         "Local SEO Audit",
//!         "Acme Plumbing",
//!         "Austin, TX",
//!     )
//!     .send_email(true);
//!
//!     let outcome = pipeline.run(&request).await?;
//!     println!("{}", outcome.markdown);
//!     Ok(())
//! }
//! ```
//!
//! The structured-output core can also be used on its own:
//!
//! ```ignore
//! use smb_brief::{ReportSchema, TolerantParser, render_markdown, repair};
//!
//! let parsed = TolerantParser::new().parse(model_text).unwrap_or_default();
//! let report = ReportSchema::new()?.validate(&repair(&parsed).into())?;
//! let markdown = render_markdown(&report);
//! ```

pub mod context;
pub mod email;
mod error;
pub mod parser;
pub mod pipeline;
pub mod render;
pub mod repair;
pub mod report;

pub use context::{RequestContext, new_trace_id};
pub use email::{Branding, EmailFormatter};
pub use error::{Error, Result};
pub use parser::TolerantParser;
pub use pipeline::{
    AgentRole, Branch, Brief, BriefConfig, BriefOutcome, BriefPipeline, BriefRequest, DeliveryReceipt,
    EmailMessage, EmailTransport, Generation, PipelineCallbacks, PipelineEvent, SendGridTransport,
    TextGenerator,
};
pub use render::render_markdown;
pub use repair::repair;
pub use report::{ActionItem, Report, ReportSchema, Source};
