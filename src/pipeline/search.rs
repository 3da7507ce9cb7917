//! Concurrent execution of a search plan.

use super::events::{PipelineCallbacks, PipelineEvent};
use super::generator::{AgentRole, TextGenerator, check_token_usage};
use super::plan::WebSearchPlan;
use super::prompts::{SEARCH_INSTRUCTIONS, search_input};
use futures::stream::{FuturesUnordered, StreamExt};

/// Run every search concurrently and collect summaries in completion order.
/// Failed or empty searches contribute nothing.
pub async fn perform_searches<G: TextGenerator>(
    generator: &G,
    plan: &WebSearchPlan,
    token_cap: u32,
    callbacks: &PipelineCallbacks,
) -> Vec<String> {
    let total = plan.len();
    let mut in_flight: FuturesUnordered<_> = plan
        .searches
        .iter()
        .map(|item| async move {
            let input = search_input(&item.query, &item.reason);
            let result = generator.generate(AgentRole::Search, SEARCH_INSTRUCTIONS, &input).await;
            (item, result)
        })
        .collect();

    let mut results = Vec::with_capacity(total);
    let mut completed = 0;

    while let Some((item, result)) = in_flight.next().await {
        completed += 1;
        let success = match result {
            Ok(generation) => {
                check_token_usage(AgentRole::Search, generation.output_tokens, token_cap);
                let text = generation.text.trim().to_string();
                if text.is_empty() {
                    tracing::debug!(query = %item.query, "Search returned no text");
                    false
                } else {
                    results.push(text);
                    true
                }
            }
            Err(e) => {
                tracing::warn!(query = %item.query, error = %e, "Search failed, skipping");
                false
            }
        };
        callbacks.emit(&PipelineEvent::SearchCompleted {
            completed,
            total,
            success,
        });
    }

    tracing::info!(succeeded = results.len(), total, "Finished searching");
    results
}
