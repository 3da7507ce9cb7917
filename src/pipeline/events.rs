//! Pipeline events and callbacks for progress reporting.

use std::sync::Arc;

/// Progress events emitted while a brief is produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    /// A run started
    Started { trace_id: String },
    /// The planner produced a search plan
    SearchesPlanned { count: usize },
    /// One search finished, successfully or not
    SearchCompleted {
        completed: usize,
        total: usize,
        success: bool,
    },
    /// The writer returned its output
    ReportWritten { chars: usize },
    /// A synthetic fallback report replaced the generated one
    FallbackUsed { reason: String },
    /// The writer output was not JSON and went through the free-form path
    LegacyFormat,
    /// The email was accepted by the transport
    EmailSent { status_code: u16, recipient: String },
    /// An error occurred
    Error { message: String },
}

/// Type alias for event callbacks
pub type EventCallback = Arc<dyn Fn(&PipelineEvent) + Send + Sync>;

#[derive(Default, Clone)]
pub struct PipelineCallbacks {
    pub on_started: Option<EventCallback>,
    pub on_searches_planned: Option<EventCallback>,
    pub on_search_completed: Option<EventCallback>,
    pub on_report_written: Option<EventCallback>,
    pub on_fallback: Option<EventCallback>,
    pub on_email_sent: Option<EventCallback>,
    pub on_error: Option<EventCallback>,
    /// Catch-all callback for any event
    pub on_event: Option<EventCallback>,
}

impl PipelineCallbacks {
    /// Emit an event to the matching callback, then to the catch-all.
    pub fn emit(&self, event: &PipelineEvent) {
        let specific = match event {
            PipelineEvent::Started { .. } => &self.on_started,
            PipelineEvent::SearchesPlanned { .. } => &self.on_searches_planned,
            PipelineEvent::SearchCompleted { .. } => &self.on_search_completed,
            PipelineEvent::ReportWritten { .. } => &self.on_report_written,
            PipelineEvent::FallbackUsed { .. } | PipelineEvent::LegacyFormat => &self.on_fallback,
            PipelineEvent::EmailSent { .. } => &self.on_email_sent,
            PipelineEvent::Error { .. } => &self.on_error,
        };

        if let Some(cb) = specific {
            cb(event);
        }

        if let Some(cb) = &self.on_event {
            cb(event);
        }
    }
}

/// Callbacks that log every event through `tracing`.
pub fn verbose_callbacks() -> PipelineCallbacks {
    PipelineCallbacks {
        on_event: Some(Arc::new(|e| match e {
            PipelineEvent::Started { trace_id } => {
                tracing::info!(%trace_id, "Starting research");
            }
            PipelineEvent::SearchesPlanned { count } => {
                tracing::info!(count, "Searches planned, starting to search");
            }
            PipelineEvent::SearchCompleted {
                completed,
                total,
                success,
            } => {
                tracing::info!(completed, total, success, "Searching... {}/{} completed", completed, total);
            }
            PipelineEvent::ReportWritten { chars } => {
                tracing::info!(chars, "Report written");
            }
            PipelineEvent::FallbackUsed { reason } => {
                tracing::warn!(%reason, "Using fallback report");
            }
            PipelineEvent::LegacyFormat => {
                tracing::warn!("Writer output was not JSON, formatting as free-form markdown");
            }
            PipelineEvent::EmailSent {
                status_code,
                recipient,
            } => {
                tracing::info!(status_code, %recipient, "Email sent");
            }
            PipelineEvent::Error { message } => {
                tracing::error!(%message, "Pipeline error");
            }
        })),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_specific_and_catch_all() {
        let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let specific = seen.clone();
        let all = seen.clone();
        let callbacks = PipelineCallbacks {
            on_search_completed: Some(Arc::new(move |_| specific.lock().unwrap().push("specific".into()))),
            on_event: Some(Arc::new(move |_| all.lock().unwrap().push("all".into()))),
            ..Default::default()
        };

        callbacks.emit(&PipelineEvent::SearchCompleted {
            completed: 1,
            total: 2,
            success: true,
        });
        callbacks.emit(&PipelineEvent::ReportWritten { chars: 10 });

        assert_eq!(*seen.lock().unwrap(), vec!["specific", "all", "all"]);
    }

    #[test]
    fn test_verbose_callbacks_do_not_panic() {
        let callbacks = verbose_callbacks();
        callbacks.emit(&PipelineEvent::Started { trace_id: "trace_x".into() });
        callbacks.emit(&PipelineEvent::LegacyFormat);
        callbacks.emit(&PipelineEvent::Error { message: "boom".into() });
    }
}
