//! Anthropic Messages API adapter (spec §6): `x-api-key` + `anthropic-version`
//! headers, a `system` field held apart from `messages`, and a tagged-union
//! SSE event stream rather than the OpenAI `delta.content` shape.

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, GatewayResult};
use crate::gateway::adapter::{estimate_cost_usd, estimate_tokens, Adapter};
use crate::gateway::message::{ChatRole, CompletionRequest, CompletionResult, StreamChunk, TokenUsage};
use crate::gateway::providers::openai_compatible::Pricing;
use crate::gateway::sse;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 4096;

#[derive(Serialize)]
struct ApiMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ApiRequest {
    model: String,
    messages: Vec<ApiMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Deserialize)]
struct ApiResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct ApiUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum StreamEvent {
    #[serde(rename = "content_block_delta")]
    ContentBlockDelta { delta: TextDelta },
    #[serde(rename = "message_delta")]
    MessageDelta { delta: StopDelta },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct TextDelta {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct StopDelta {
    #[serde(default)]
    stop_reason: Option<String>,
}

pub struct AnthropicAdapter {
    base_url: String,
    api_key: String,
    model_name: String,
    pricing: Pricing,
    http: reqwest::Client,
}

impl AnthropicAdapter {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, model_name: impl Into<String>, pricing: Pricing, http: reqwest::Client) -> Self {
        Self { base_url: base_url.into(), api_key: api_key.into(), model_name: model_name.into(), pricing, http }
    }

    fn system_prompt(messages: &[crate::gateway::message::ChatMessage]) -> (Option<String>, Vec<ApiMessage>) {
        let mut system = None;
        let mut out = Vec::with_capacity(messages.len());
        for m in messages {
            if m.role == ChatRole::System {
                system = Some(match system {
                    Some(existing) => format!("{existing}\n{}", m.content),
                    None => m.content.clone(),
                });
                continue;
            }
            out.push(ApiMessage {
                role: if m.role == ChatRole::Assistant { "assistant" } else { "user" },
                content: m.content.clone(),
            });
        }
        (system, out)
    }

    fn build_body(&self, request: &CompletionRequest, stream: bool) -> ApiRequest {
        let (system, messages) = Self::system_prompt(&request.messages);
        ApiRequest {
            model: self.model_name.clone(),
            messages,
            max_tokens: request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            system,
            temperature: request.temperature,
            stream: stream.then_some(true),
        }
    }
}

#[async_trait]
impl Adapter for AnthropicAdapter {
    fn provider_name(&self) -> &'static str {
        "anthropic"
    }

    async fn complete(&self, request: &CompletionRequest) -> GatewayResult<CompletionResult> {
        let body = self.build_body(request, false);
        let resp = self
            .http
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Network { provider: "anthropic".into(), model_id: request.model_id.clone(), message: e.to_string() })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            return Err(GatewayError::from_status("anthropic", &request.model_id, status, text));
        }

        let parsed: ApiResponse = resp.json().await.map_err(|e| GatewayError::Codec { model_id: request.model_id.clone(), message: e.to_string() })?;
        let content = parsed.content.into_iter().map(|b| b.text).collect::<Vec<_>>().join("");
        let usage = parsed.usage.map(|u| TokenUsage { prompt_tokens: u.input_tokens, completion_tokens: u.output_tokens, total_tokens: u.input_tokens + u.output_tokens });
        let estimated_cost_usd = usage
            .map(|u| estimate_cost_usd(u.prompt_tokens, u.completion_tokens, self.pricing.prompt_per_1k, self.pricing.completion_per_1k))
            .unwrap_or_else(|| estimate_cost_usd(estimate_tokens(&content), 0, self.pricing.prompt_per_1k, self.pricing.completion_per_1k));

        Ok(CompletionResult { content, model_id: request.model_id.clone(), usage, finish_reason: parsed.stop_reason, estimated_cost_usd, routing: Default::default(), latency_ms: 0 })
    }

    async fn stream(&self, request: &CompletionRequest) -> GatewayResult<BoxStream<'static, GatewayResult<StreamChunk>>> {
        let body = self.build_body(request, true);
        let mut resp = self
            .http
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Network { provider: "anthropic".into(), model_id: request.model_id.clone(), message: e.to_string() })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            return Err(GatewayError::from_status("anthropic", &request.model_id, status, text));
        }

        let model_id = request.model_id.clone();
        let s = async_stream::try_stream! {
            let mut pending = String::new();
            while let Some(chunk) = resp
                .chunk()
                .await
                .map_err(|e| GatewayError::Network { provider: "anthropic".to_string(), model_id: model_id.clone(), message: e.to_string() })?
            {
                pending.push_str(&String::from_utf8_lossy(&chunk));
                for frame in sse::drain_frames(&mut pending) {
                    let Ok(event) = serde_json::from_str::<StreamEvent>(&frame) else { continue };
                    match event {
                        StreamEvent::ContentBlockDelta { delta } if !delta.text.is_empty() => {
                            yield StreamChunk { delta: delta.text, finish_reason: None };
                        }
                        StreamEvent::MessageDelta { delta } => {
                            yield StreamChunk { delta: String::new(), finish_reason: delta.stop_reason };
                        }
                        _ => {}
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
        let completion_tokens = request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS);
        estimate_cost_usd(prompt_tokens, completion_tokens, self.pricing.prompt_per_1k, self.pricing.completion_per_1k)
    }
}
