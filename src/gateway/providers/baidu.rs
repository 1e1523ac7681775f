//! Baidu (ERNIE/Wenxin) adapter (spec §6): OAuth2 client-credentials access
//! token, cached and refreshed on demand, then passed as an `access_token`
//! query parameter rather than an `Authorization` header.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use futures::stream::BoxStream;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, GatewayResult};
use crate::gateway::adapter::{estimate_cost_usd, estimate_tokens, Adapter};
use crate::gateway::message::{ChatRole, CompletionRequest, CompletionResult, StreamChunk, TokenUsage};
use crate::gateway::providers::openai_compatible::Pricing;
use crate::gateway::sse;

const OAUTH_URL: &str = "https://aip.baidubce.com/oauth/2.0/token";
const TOKEN_SAFETY_MARGIN: ChronoDuration = ChronoDuration::seconds(30);

struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct OAuthResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Serialize)]
struct ApiMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ApiRequest {
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Deserialize)]
struct ApiResponse {
    result: String,
    #[serde(default)]
    is_end: bool,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

pub struct BaiduAdapter {
    base_url: String,
    client_id: String,
    client_secret: String,
    /// Path segment identifying the model, e.g. `"completions_pro"`.
    model_endpoint: String,
    pricing: Pricing,
    http: reqwest::Client,
    token: RwLock<Option<CachedToken>>,
}

impl BaiduAdapter {
    pub fn new(base_url: impl Into<String>, client_id: impl Into<String>, client_secret: impl Into<String>, model_endpoint: impl Into<String>, pricing: Pricing, http: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            model_endpoint: model_endpoint.into(),
            pricing,
            http,
            token: RwLock::new(None),
        }
    }

    async fn ensure_token(&self) -> GatewayResult<String> {
        if let Some(cached) = self.token.read().as_ref() {
            if cached.expires_at > Utc::now() + TOKEN_SAFETY_MARGIN {
                return Ok(cached.token.clone());
            }
        }

        let resp = self
            .http
            .post(OAUTH_URL)
            .query(&[("grant_type", "client_credentials"), ("client_id", &self.client_id), ("client_secret", &self.client_secret)])
            .send()
            .await
            .map_err(|e| GatewayError::Network { provider: "baidu".into(), model_id: self.model_endpoint.clone(), message: e.to_string() })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            return Err(GatewayError::from_status("baidu", &self.model_endpoint, status, text));
        }

        let parsed: OAuthResponse = resp.json().await.map_err(|e| GatewayError::Codec { model_id: self.model_endpoint.clone(), message: e.to_string() })?;
        let expires_at = Utc::now() + ChronoDuration::seconds(parsed.expires_in);
        *self.token.write() = Some(CachedToken { token: parsed.access_token.clone(), expires_at });
        Ok(parsed.access_token)
    }

    fn build_body(&self, request: &CompletionRequest, stream: bool) -> ApiRequest {
        ApiRequest {
            messages: request
                .messages
                .iter()
                .filter(|m| m.role != ChatRole::System)
                .map(|m| ApiMessage { role: if m.role == ChatRole::Assistant { "assistant" } else { "user" }, content: m.content.clone() })
                .collect(),
            temperature: request.temperature,
            stream: stream.then_some(true),
        }
    }
}

#[async_trait]
impl Adapter for BaiduAdapter {
    fn provider_name(&self) -> &'static str {
        "baidu"
    }

    async fn complete(&self, request: &CompletionRequest) -> GatewayResult<CompletionResult> {
        let token = self.ensure_token().await?;
        let body = self.build_body(request, false);
        let resp = self
            .http
            .post(format!("{}/rpc/2.0/ai_custom/v1/wenxinworkshop/chat/{}", self.base_url, self.model_endpoint))
            .query(&[("access_token", token)])
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Network { provider: "baidu".into(), model_id: request.model_id.clone(), message: e.to_string() })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            return Err(GatewayError::from_status("baidu", &request.model_id, status, text));
        }

        let parsed: ApiResponse = resp.json().await.map_err(|e| GatewayError::Codec { model_id: request.model_id.clone(), message: e.to_string() })?;
        let usage = parsed.usage.map(|u| TokenUsage { prompt_tokens: u.prompt_tokens, completion_tokens: u.completion_tokens, total_tokens: u.total_tokens });
        let estimated_cost_usd = usage
            .map(|u| estimate_cost_usd(u.prompt_tokens, u.completion_tokens, self.pricing.prompt_per_1k, self.pricing.completion_per_1k))
            .unwrap_or_else(|| estimate_cost_usd(estimate_tokens(&parsed.result), 0, self.pricing.prompt_per_1k, self.pricing.completion_per_1k));

        Ok(CompletionResult {
            content: parsed.result,
            model_id: request.model_id.clone(),
            usage,
            finish_reason: parsed.is_end.then(|| "stop".to_string()),
            estimated_cost_usd,
            routing: Default::default(),
            latency_ms: 0,
        })
    }

    async fn stream(&self, request: &CompletionRequest) -> GatewayResult<BoxStream<'static, GatewayResult<StreamChunk>>> {
        let token = self.ensure_token().await?;
        let body = self.build_body(request, true);
        let mut resp = self
            .http
            .post(format!("{}/rpc/2.0/ai_custom/v1/wenxinworkshop/chat/{}", self.base_url, self.model_endpoint))
            .query(&[("access_token", token)])
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Network { provider: "baidu".into(), model_id: request.model_id.clone(), message: e.to_string() })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            return Err(GatewayError::from_status("baidu", &request.model_id, status, text));
        }

        let model_id = request.model_id.clone();
        let s = async_stream::try_stream! {
            let mut pending = String::new();
            while let Some(chunk) = resp
                .chunk()
                .await
                .map_err(|e| GatewayError::Network { provider: "baidu".to_string(), model_id: model_id.clone(), message: e.to_string() })?
            {
                pending.push_str(&String::from_utf8_lossy(&chunk));
                for frame in sse::drain_frames(&mut pending) {
                    let Ok(event) = serde_json::from_str::<ApiResponse>(&frame) else { continue };
                    if !event.result.is_empty() || event.is_end {
                        yield StreamChunk { delta: event.result, finish_reason: event.is_end.then(|| "stop".to_string()) };
                    }
                }
            }
        };
        Ok(Box::pin(s))
    }

    async fn test(&self) -> GatewayResult<()> {
        self.ensure_token().await.map(|_| ())
    }

    fn estimate_cost(&self, request: &CompletionRequest) -> f64 {
        let prompt_tokens: u32 = request.messages.iter().map(|m| estimate_tokens(&m.content)).sum();
        let completion_tokens = request.max_tokens.unwrap_or(512);
        estimate_cost_usd(prompt_tokens, completion_tokens, self.pricing.prompt_per_1k, self.pricing.completion_per_1k)
    }
}
