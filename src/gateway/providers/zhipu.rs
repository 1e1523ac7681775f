//! Zhipu (BigModel/GLM) adapter (spec §6): chat-completions wire shape like
//! [`super::openai_compatible`], but authenticated with a short-lived
//! HMAC-SHA256-signed token instead of a static bearer key — Zhipu API keys
//! are `"{id}.{secret}"` pairs, not opaque tokens.

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use futures::stream::BoxStream;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::{GatewayError, GatewayResult};
use crate::gateway::adapter::{estimate_cost_usd, estimate_tokens, Adapter};
use crate::gateway::message::{ChatRole, CompletionRequest, CompletionResult, StreamChunk, TokenUsage};
use crate::gateway::providers::openai_compatible::Pricing;
use crate::gateway::sse;

type HmacSha256 = Hmac<Sha256>;

const TOKEN_TTL_MS: i64 = 3 * 60 * 1000;

#[derive(Serialize)]
struct TokenHeader {
    alg: &'static str,
    sign_type: &'static str,
}

#[derive(Serialize)]
struct TokenPayload {
    api_key: String,
    exp: i64,
    timestamp: i64,
}

/// Build the signed token Zhipu expects in `Authorization: Bearer <token>`.
fn build_signed_token(api_key: &str) -> GatewayResult<String> {
    let (id, secret) = api_key.split_once('.').ok_or_else(|| GatewayError::Auth {
        provider: "zhipu".into(),
        model_id: String::new(),
        message: "API key must be in '<id>.<secret>' form".into(),
    })?;

    let now = chrono::Utc::now().timestamp_millis();
    let header = TokenHeader { alg: "HS256", sign_type: "SIGN" };
    let payload = TokenPayload { api_key: id.to_string(), exp: now + TOKEN_TTL_MS, timestamp: now };

    let header_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header).map_err(|e| codec_err(e.to_string()))?);
    let payload_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&payload).map_err(|e| codec_err(e.to_string()))?);
    let signing_input = format!("{header_b64}.{payload_b64}");

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|e| GatewayError::Auth {
        provider: "zhipu".into(),
        model_id: String::new(),
        message: e.to_string(),
    })?;
    mac.update(signing_input.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{signing_input}.{signature}"))
}

fn codec_err(message: String) -> GatewayError {
    GatewayError::Codec { model_id: String::new(), message }
}

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

pub struct ZhipuAdapter {
    base_url: String,
    api_key: String,
    model_name: String,
    pricing: Pricing,
    http: reqwest::Client,
}

impl ZhipuAdapter {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, model_name: impl Into<String>, pricing: Pricing, http: reqwest::Client) -> Self {
        Self { base_url: base_url.into(), api_key: api_key.into(), model_name: model_name.into(), pricing, http }
    }

    fn build_body(&self, request: &CompletionRequest, stream: bool) -> ApiRequest {
        ApiRequest {
            model: self.model_name.clone(),
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
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stream: stream.then_some(true),
        }
    }
}

#[async_trait]
impl Adapter for ZhipuAdapter {
    fn provider_name(&self) -> &'static str {
        "zhipu"
    }

    async fn complete(&self, request: &CompletionRequest) -> GatewayResult<CompletionResult> {
        let token = build_signed_token(&self.api_key)?;
        let body = self.build_body(request, false);
        let resp = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Network { provider: "zhipu".into(), model_id: request.model_id.clone(), message: e.to_string() })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            return Err(GatewayError::from_status("zhipu", &request.model_id, status, text));
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
        let token = build_signed_token(&self.api_key)?;
        let body = self.build_body(request, true);
        let mut resp = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Network { provider: "zhipu".into(), model_id: request.model_id.clone(), message: e.to_string() })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            return Err(GatewayError::from_status("zhipu", &request.model_id, status, text));
        }

        let model_id = request.model_id.clone();
        let s = async_stream::try_stream! {
            let mut pending = String::new();
            while let Some(chunk) = resp
                .chunk()
                .await
                .map_err(|e| GatewayError::Network { provider: "zhipu".to_string(), model_id: model_id.clone(), message: e.to_string() })?
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_token_has_three_dot_separated_parts() {
        let token = build_signed_token("abc123.supersecret").unwrap();
        assert_eq!(token.split('.').count(), 3);
    }

    #[test]
    fn malformed_api_key_is_rejected() {
        assert!(build_signed_token("no-dot-here").is_err());
    }
}
