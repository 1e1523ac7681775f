//! OpenAI-compatible chat-completions wire shape, shared verbatim by the
//! `openai`, `deepseek`, and `moonshot` provider rows of spec §6 — all three
//! speak the exact same `{model, messages, stream}` request body and
//! `choices[].{message,delta}.content` response shape.

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, GatewayResult};
use crate::gateway::adapter::{estimate_cost_usd, estimate_tokens, Adapter};
use crate::gateway::message::{ChatRole, CompletionRequest, CompletionResult, StreamChunk, TokenUsage};
use crate::gateway::sse;

#[derive(Serialize)]
struct ApiMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ApiRequest {
    model: String,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Deserialize)]
struct ApiChoice {
    message: ApiChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ApiChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Deserialize)]
struct StreamEvent {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize, Default)]
struct StreamDelta {
    content: Option<String>,
}

fn role_str(role: ChatRole) -> &'static str {
    match role {
        ChatRole::System => "system",
        ChatRole::User => "user",
        ChatRole::Assistant => "assistant",
        ChatRole::Tool => "tool",
    }
}

/// Pricing per 1k tokens, USD.
#[derive(Debug, Clone, Copy)]
pub struct Pricing {
    pub prompt_per_1k: f64,
    pub completion_per_1k: f64,
}

pub struct OpenAiCompatibleAdapter {
    provider: &'static str,
    base_url: String,
    api_key: String,
    model_name: String,
    pricing: Pricing,
    http: reqwest::Client,
}

impl OpenAiCompatibleAdapter {
    pub fn new(provider: &'static str, base_url: impl Into<String>, api_key: impl Into<String>, model_name: impl Into<String>, pricing: Pricing, http: reqwest::Client) -> Self {
        Self {
            provider,
            base_url: base_url.into(),
            api_key: api_key.into(),
            model_name: model_name.into(),
            pricing,
            http,
        }
    }

    fn build_body(&self, request: &CompletionRequest, stream: bool) -> ApiRequest {
        ApiRequest {
            model: self.model_name.clone(),
            messages: request
                .messages
                .iter()
                .map(|m| ApiMessage { role: role_str(m.role), content: m.content.clone() })
                .collect(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stream: stream.then_some(true),
        }
    }

    fn net_err(&self, model_id: &str, e: reqwest::Error) -> GatewayError {
        GatewayError::Network { provider: self.provider.to_string(), model_id: model_id.to_string(), message: e.to_string() }
    }
}

#[async_trait]
impl Adapter for OpenAiCompatibleAdapter {
    fn provider_name(&self) -> &'static str {
        self.provider
    }

    async fn complete(&self, request: &CompletionRequest) -> GatewayResult<CompletionResult> {
        let body = self.build_body(request, false);
        let resp = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.net_err(&request.model_id, e))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            return Err(GatewayError::from_status(self.provider, &request.model_id, status, text));
        }

        let parsed: ApiResponse = resp.json().await.map_err(|e| GatewayError::Codec { model_id: request.model_id.clone(), message: e.to_string() })?;
        let choice = parsed.choices.into_iter().next();
        let content = choice.as_ref().and_then(|c| c.message.content.clone()).unwrap_or_default();
        let finish_reason = choice.and_then(|c| c.finish_reason);
        let usage = parsed.usage.map(|u| TokenUsage { prompt_tokens: u.prompt_tokens, completion_tokens: u.completion_tokens, total_tokens: u.total_tokens });
        let estimated_cost_usd = usage
            .map(|u| estimate_cost_usd(u.prompt_tokens, u.completion_tokens, self.pricing.prompt_per_1k, self.pricing.completion_per_1k))
            .unwrap_or_else(|| estimate_cost_usd(estimate_tokens(&content), 0, self.pricing.prompt_per_1k, self.pricing.completion_per_1k));

        Ok(CompletionResult { content, model_id: request.model_id.clone(), usage, finish_reason, estimated_cost_usd, routing: Default::default(), latency_ms: 0 })
    }

    async fn stream(&self, request: &CompletionRequest) -> GatewayResult<BoxStream<'static, GatewayResult<StreamChunk>>> {
        let body = self.build_body(request, true);
        let mut resp = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.net_err(&request.model_id, e))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            return Err(GatewayError::from_status(self.provider, &request.model_id, status, text));
        }

        let provider = self.provider;
        let model_id = request.model_id.clone();

        let s = async_stream::try_stream! {
            let mut pending = String::new();
            while let Some(chunk) = resp
                .chunk()
                .await
                .map_err(|e| GatewayError::Network { provider: provider.to_string(), model_id: model_id.clone(), message: e.to_string() })?
            {
                pending.push_str(&String::from_utf8_lossy(&chunk));
                for frame in sse::drain_frames(&mut pending) {
                    let Ok(event) = serde_json::from_str::<StreamEvent>(&frame) else { continue };
                    let Some(choice) = event.choices.into_iter().next() else { continue };
                    let finish_reason = choice.finish_reason;
                    if let Some(text) = choice.delta.content.filter(|t| !t.is_empty()) {
                        yield StreamChunk { delta: text, finish_reason };
                    } else if finish_reason.is_some() {
                        yield StreamChunk { delta: String::new(), finish_reason };
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
