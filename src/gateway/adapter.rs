//! Component A: the provider adapter trait every backend implements (spec §4.A).

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::GatewayResult;
use crate::gateway::message::{CompletionRequest, CompletionResult, StreamChunk};

/// A single LLM provider's wire protocol, hidden behind one shape.
///
/// Implementors must be cheap to clone-share (`Arc<dyn Adapter>` in the
/// registry) and safe to call concurrently — no adapter holds mutable state
/// of its own beyond its `reqwest::Client` and static config.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Stable identifier used in error messages and router scoring (e.g. `"zhipu"`).
    fn provider_name(&self) -> &'static str;

    async fn complete(&self, request: &CompletionRequest) -> GatewayResult<CompletionResult>;

    /// Stream a completion as it arrives. The returned stream yields one
    /// [`StreamChunk`] per SSE delta and ends naturally at `[DONE]` or the
    /// provider's own completion signal.
    async fn stream(&self, request: &CompletionRequest) -> GatewayResult<BoxStream<'static, GatewayResult<StreamChunk>>>;

    /// A cheap connectivity/auth check, used by `ModelGateway::test_all` —
    /// typically a minimal completion request or a lightweight models-list call.
    async fn test(&self) -> GatewayResult<()>;

    /// Estimate the USD cost of `request` given this provider's per-token
    /// pricing, assuming `request.max_tokens` (or a provider default) tokens
    /// of output.
    fn estimate_cost(&self, request: &CompletionRequest) -> f64;
}

/// Shared helper for the per-1k-token pricing model every adapter uses.
pub fn estimate_cost_usd(prompt_tokens: u32, completion_tokens: u32, price_per_1k_prompt: f64, price_per_1k_completion: f64) -> f64 {
    (prompt_tokens as f64 / 1000.0) * price_per_1k_prompt + (completion_tokens as f64 / 1000.0) * price_per_1k_completion
}

/// Rough token estimate when a provider doesn't report usage up front: ~4
/// characters per token, the same rule of thumb used across the pack's
/// cost-estimation helpers.
pub fn estimate_tokens(text: &str) -> u32 {
    ((text.chars().count() as f64) / 4.0).ceil() as u32
}
