//! Qwen (DashScope) adapter (spec §6): native `input`/`parameters` request
//! envelope and an `output.choices[].message` response shape, distinct from
//! the OpenAI chat-completions body used by [`super::openai_compatible`].
//! Streaming requires the `X-DashScope-SSE: enable` header and
//! `parameters.incremental_output = true`, or Qwen replays the full text on
//! every event instead of deltas.

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, GatewayResult};
use crate::gateway::adapter::{estimate_cost_usd, estimate_tokens, Adapter};
use crate::gateway::message::{ChatRole, CompletionRequest, CompletionResult, StreamChunk, TokenUsage};
use crate::gateway::providers::openai_compatible::Pricing;
use crate::gateway::sse;

#[derive(Serialize)]
struct ApiMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ApiInput {
    messages: Vec<ApiMessage>,
}

#[derive(Serialize)]
struct ApiParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    incremental_output: bool,
}

#[derive(Serialize)]
struct ApiRequest {
    model: String,
    input: ApiInput,
    parameters: ApiParameters,
}

#[derive(Deserialize)]
struct ApiResponse {
    output: ApiOutput,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Deserialize)]
struct ApiOutput {
    #[serde(default)]
    choices: Vec<ApiOutputChoice>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ApiOutputChoice {
    message: ApiChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ApiChoiceMessage {
    content: String,
}

#[derive(Deserialize)]
struct ApiUsage {
    input_tokens: u32,
    output_tokens: u32,
    total_tokens: u32,
}

pub struct QwenAdapter {
    base_url: String,
    api_key: String,
    model_name: String,
    pricing: Pricing,
    http: reqwest::Client,
}

impl QwenAdapter {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, model_name: impl Into<String>, pricing: Pricing, http: reqwest::Client) -> Self {
        Self { base_url: base_url.into(), api_key: api_key.into(), model_name: model_name.into(), pricing, http }
    }

    fn build_body(&self, request: &CompletionRequest, incremental_output: bool) -> ApiRequest {
        ApiRequest {
            model: self.model_name.clone(),
            input: ApiInput {
                messages: request
                    .messages
                    .iter()
                    .map(|m| ApiMessage {
                        role: match m.role {
                            ChatRole::System => "system",
                            ChatRole::User => "user",
                            ChatRole::Assistant => "assistant",
                            ChatRole::Tool => "tool",
                        },
                        content: m.content.clone(),
                    })
                    .collect(),
            },
            parameters: ApiParameters { max_tokens: request.max_tokens, temperature: request.temperature, incremental_output },
        }
    }
}

#[async_trait]
impl Adapter for QwenAdapter {
    fn provider_name(&self) -> &'static str {
        "qwen"
    }

    async fn complete(&self, request: &CompletionRequest) -> GatewayResult<CompletionResult> {
        let body = self.build_body(request, false);
        let resp = self
            .http
            .post(format!("{}/api/v1/services/aigc/text-generation/generation", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Network { provider: "qwen".into(), model_id: request.model_id.clone(), message: e.to_string() })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            return Err(GatewayError::from_status("qwen", &request.model_id, status, text));
        }

        let parsed: ApiResponse = resp.json().await.map_err(|e| GatewayError::Codec { model_id: request.model_id.clone(), message: e.to_string() })?;
        let choice = parsed.output.choices.into_iter().next();
        let content = choice.as_ref().map(|c| c.message.content.clone()).unwrap_or_default();
        let finish_reason = choice.and_then(|c| c.finish_reason).or(parsed.output.finish_reason);
        let usage = parsed.usage.map(|u| TokenUsage { prompt_tokens: u.input_tokens, completion_tokens: u.output_tokens, total_tokens: u.total_tokens });
        let estimated_cost_usd = usage
            .map(|u| estimate_cost_usd(u.prompt_tokens, u.completion_tokens, self.pricing.prompt_per_1k, self.pricing.completion_per_1k))
            .unwrap_or_else(|| estimate_cost_usd(estimate_tokens(&content), 0, self.pricing.prompt_per_1k, self.pricing.completion_per_1k));

        Ok(CompletionResult { content, model_id: request.model_id.clone(), usage, finish_reason, estimated_cost_usd, routing: Default::default(), latency_ms: 0 })
    }

    async fn stream(&self, request: &CompletionRequest) -> GatewayResult<BoxStream<'static, GatewayResult<StreamChunk>>> {
        let body = self.build_body(request, true);
        let mut resp = self
            .http
            .post(format!("{}/api/v1/services/aigc/text-generation/generation", self.base_url))
            .bearer_auth(&self.api_key)
            .header("X-DashScope-SSE", "enable")
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Network { provider: "qwen".into(), model_id: request.model_id.clone(), message: e.to_string() })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            return Err(GatewayError::from_status("qwen", &request.model_id, status, text));
        }

        let model_id = request.model_id.clone();
        let s = async_stream::try_stream! {
            let mut pending = String::new();
            let mut emitted = 0usize;
            while let Some(chunk) = resp
                .chunk()
                .await
                .map_err(|e| GatewayError::Network { provider: "qwen".to_string(), model_id: model_id.clone(), message: e.to_string() })?
            {
                pending.push_str(&String::from_utf8_lossy(&chunk));
                for frame in sse::drain_frames(&mut pending) {
                    let Ok(event) = serde_json::from_str::<ApiResponse>(&frame) else { continue };
                    let Some(choice) = event.output.choices.into_iter().next() else { continue };
                    // DashScope incremental_output still replays content as a
                    // running total on some model families; guard against
                    // double-counting by only yielding the suffix grown since
                    // the last event.
                    let full = choice.message.content;
                    if full.len() > emitted {
                        let delta = full[emitted..].to_string();
                        emitted = full.len();
                        yield StreamChunk { delta, finish_reason: choice.finish_reason };
                    }
                }
            }
        };
        Ok(Box::pin(s))
    }

    async fn test(&self) -> GatewayResult<()> {
        let request = CompletionRequest::new(self.model_name.clone(), vec![crate::gateway::message::ChatMessage::user("ping")]);
        self.complete(&request).await.map(|_| ())
    }

    fn estimate_cost(&self, request: &CompletionRequest) -> f64 {
        let prompt_tokens: u32 = request.messages.iter().map(|m| estimate_tokens(&m.content)).sum();
        let completion_tokens = request.max_tokens.unwrap_or(512);
        estimate_cost_usd(prompt_tokens, completion_tokens, self.pricing.prompt_per_1k, self.pricing.completion_per_1k)
    }
}
