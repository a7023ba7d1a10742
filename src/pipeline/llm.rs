//! The model round-trip: one call, parse, score.
//!
//! This is the only stage with network I/O. It never returns an error: a
//! failed call or an unusable reply becomes [`Review::degraded`] so a flaky
//! provider cannot break the caller's flow. There are no retries; a single
//! failure degrades immediately, keeping latency and cost predictable.

use crate::output::Review;
use crate::pipeline::parse::parse_reply;
use crate::pipeline::score::ScoreBreakdown;
use crate::provider::chat_once;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Send `messages` once and turn the reply into a scored [`Review`].
pub async fn run_review(
    llm: &dyn LLMProvider,
    messages: &[ChatMessage],
    options: &CompletionOptions,
    timeout: Option<Duration>,
) -> Review {
    let start = Instant::now();
    let (provider, model) = (llm.name(), llm.model());

    let response = match chat_once(llm, messages, options, timeout).await {
        Ok(response) => response,
        Err(e) => {
            warn!("{}/{}: model call failed: {}", provider, model, e);
            return Review::degraded(e);
        }
    };
    debug!(
        "{}/{}: {} input tokens, {} output tokens, {:?}",
        provider,
        model,
        response.prompt_tokens,
        response.completion_tokens,
        start.elapsed()
    );

    let parsed = match parse_reply(&response.content) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("{}/{}: unusable reply: {}", provider, model, e);
            return Review::degraded(e);
        }
    };

    let breakdown = ScoreBreakdown::from_items(&parsed.checklist);
    let score = breakdown.score();
    info!(
        "{}/{}: score {} ({} pass, {} warning, {} fail, {} n/a)",
        provider,
        model,
        score,
        breakdown.pass,
        breakdown.warning,
        breakdown.fail,
        breakdown.not_applicable
    );

    Review {
        checklist: parsed.checklist,
        suggestions: parsed.suggestions,
        rewritten_content: parsed.rewritten_content,
        score,
    }
}
