//! Search plans produced by the planner agent.

use crate::parser::TolerantParser;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reason recorded when the planner output could not be used.
pub const FALLBACK_REASON: &str = "Planner output unavailable; searching the original query";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebSearchItem {
    /// Why this search helps answer the query
    #[serde(default)]
    pub reason: String,
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WebSearchPlan {
    #[serde(default)]
    pub searches: Vec<WebSearchItem>,
}

impl WebSearchPlan {
    /// Single search of the raw query.
    pub fn fallback(query: &str) -> Self {
        Self {
            searches: vec![WebSearchItem {
                reason: FALLBACK_REASON.to_string(),
                query: query.trim().to_string(),
            }],
        }
    }

    /// Plan from planner output, read through the tolerant parser. Blank
    /// queries are dropped and at most `max` searches kept; anything
    /// unusable degrades to [`WebSearchPlan::fallback`].
    pub fn from_output(parser: &TolerantParser, text: &str, query: &str, max: usize) -> Self {
        let parsed = parser
            .parse(text)
            .and_then(|map| serde_json::from_value::<WebSearchPlan>(Value::Object(map)).ok());

        let Some(mut plan) = parsed else {
            tracing::warn!("Planner output could not be parsed, falling back to the raw query");
            return Self::fallback(query);
        };

        plan.searches.retain(|item| !item.query.trim().is_empty());
        plan.searches.truncate(max.max(1));
        if plan.searches.is_empty() {
            tracing::warn!("Planner returned no usable searches, falling back to the raw query");
            return Self::fallback(query);
        }
        plan
    }

    pub fn len(&self) -> usize {
        self.searches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.searches.is_empty()
    }
}
