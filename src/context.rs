//! Per-request context threaded through the pipeline.
//!
//! A `RequestContext` is created once per brief and passed by reference to
//! every orchestration step. It carries the trace id used to correlate log
//! lines, plus the request parameters that shape prompts and the subject.
//!
//! # Example
//!
//! ```ignore
//! use smb_brief::RequestContext;
//!
//! let ctx = RequestContext::new("Local SEO Audit", "Acme Plumbing", "Austin, TX");
//! assert!(ctx.trace_id().starts_with("trace_"));
//! assert_eq!(ctx.subject(), "Local SEO Audit Brief: Acme Plumbing – Austin, TX");
//! ```

use uuid::Uuid;

/// Immutable per-request values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    trace_id: String,
    template: String,
    business: String,
    location: String,
}

impl RequestContext {
    /// Create a context with a fresh trace id.
    pub fn new(template: impl Into<String>, business: impl Into<String>, location: impl Into<String>) -> Self {
        Self::with_trace_id(new_trace_id(), template, business, location)
    }

    pub fn with_trace_id(
        trace_id: impl Into<String>,
        template: impl Into<String>,
        business: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            trace_id: trace_id.into(),
            template: template.into(),
            business: business.into(),
            location: location.into(),
        }
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn business(&self) -> &str {
        &self.business
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Email subject line for this request.
    pub fn subject(&self) -> String {
        format!("{} Brief: {} – {}", self.template, self.business, self.location)
    }
}

/// `trace_` followed by 32 lowercase hex digits.
pub fn new_trace_id() -> String {
    format!("trace_{}", Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_id_format() {
        let id = new_trace_id();
        assert_eq!(id.len(), "trace_".len() + 32);
        assert!(id["trace_".len()..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_trace_ids_are_unique() {
        let a = RequestContext::new("t", "b", "l");
        let b = RequestContext::new("t", "b", "l");
        assert_ne!(a.trace_id(), b.trace_id());
    }

    #[test]
    fn test_subject() {
        let ctx = RequestContext::with_trace_id("trace_1", "Grant Opportunities", "Acme", "Reno, NV");
        assert_eq!(ctx.subject(), "Grant Opportunities Brief: Acme – Reno, NV");
        assert_eq!(ctx.trace_id(), "trace_1");
        assert_eq!(ctx.business(), "Acme");
        assert_eq!(ctx.location(), "Reno, NV");
        assert_eq!(ctx.template(), "Grant Opportunities");
    }
}
