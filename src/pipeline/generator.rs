//! The external text generator and output-token monitoring.

use crate::error::Result;
use std::fmt;
use std::future::Future;

/// The agents the pipeline asks for text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentRole {
    Planner,
    Search,
    Writer,
}

impl AgentRole {
    pub fn name(self) -> &'static str {
        match self {
            AgentRole::Planner => "PlannerAgent",
            AgentRole::Search => "Search agent",
            AgentRole::Writer => "WriterAgent",
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One completion from the generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub text: String,
    /// Output tokens, when the backend reports usage
    pub output_tokens: Option<u32>,
}

impl Generation {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            output_tokens: None,
        }
    }

    pub fn with_tokens(mut self, tokens: u32) -> Self {
        self.output_tokens = Some(tokens);
        self
    }
}

/// Black-box text generation: instructions plus input in, text out.
///
/// Implementations wrap whatever hosted model or agent runtime produces the
/// plan, the search summaries and the brief itself.
pub trait TextGenerator: Send + Sync {
    fn generate(
        &self,
        role: AgentRole,
        instructions: &str,
        input: &str,
    ) -> impl Future<Output = Result<Generation>> + Send;
}

/// How close a generation came to its agent's token cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenUsage {
    Normal,
    Warning,
    Critical,
}

/// Log output-token usage against `cap`: 90% and above is critical, 80% and
/// above a warning. Returns `None` when usage is unknown.
pub fn check_token_usage(role: AgentRole, output_tokens: Option<u32>, cap: u32) -> Option<TokenUsage> {
    let tokens = output_tokens.filter(|&t| t > 0)?;
    if cap == 0 {
        return None;
    }
    let pct = f64::from(tokens) / f64::from(cap) * 100.0;
    let scaled = u64::from(tokens) * 100;

    let usage = if scaled >= u64::from(cap) * 90 {
        tracing::warn!(
            agent = %role,
            tokens,
            cap,
            "CRITICAL: {} used {}/{} tokens ({:.0}%). Output may be truncated",
            role, tokens, cap, pct
        );
        TokenUsage::Critical
    } else if scaled >= u64::from(cap) * 80 {
        tracing::warn!(
            agent = %role,
            tokens,
            cap,
            "{} used {}/{} tokens ({:.0}%), approaching cap",
            role, tokens, cap, pct
        );
        TokenUsage::Warning
    } else {
        tracing::info!(agent = %role, tokens, cap, "{}: {}/{} tokens ({:.0}%)", role, tokens, cap, pct);
        TokenUsage::Normal
    };
    Some(usage)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_thresholds() {
        assert_eq!(check_token_usage(AgentRole::Writer, Some(810), 900), Some(TokenUsage::Critical));
        assert_eq!(check_token_usage(AgentRole::Writer, Some(720), 900), Some(TokenUsage::Warning));
        assert_eq!(check_token_usage(AgentRole::Writer, Some(719), 900), Some(TokenUsage::Normal));
        assert_eq!(check_token_usage(AgentRole::Planner, Some(250), 200), Some(TokenUsage::Critical));
    }

    #[test]
    fn test_unknown_usage() {
        assert_eq!(check_token_usage(AgentRole::Search, None, 300), None);
        assert_eq!(check_token_usage(AgentRole::Search, Some(0), 300), None);
        assert_eq!(check_token_usage(AgentRole::Search, Some(10), 0), None);
    }

    #[test]
    fn test_role_names() {
        assert_eq!(AgentRole::Planner.to_string(), "PlannerAgent");
        assert_eq!(Generation::new("x").with_tokens(5).output_tokens, Some(5));
    }
}
