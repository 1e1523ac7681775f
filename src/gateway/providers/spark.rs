//! iFlytek Spark adapter (spec §6 lists Spark among the providers in scope,
//! §6's wire-shape table does not cover it). Spark's HTTP-compatible chat
//! endpoint accepts the same `{model, messages, stream}` body and bearer
//! auth as [`super::openai_compatible`], so this wraps that adapter rather
//! than re-deriving an identical wire shape under a new name.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::GatewayResult;
use crate::gateway::adapter::Adapter;
use crate::gateway::message::{CompletionRequest, CompletionResult, StreamChunk};
use crate::gateway::providers::openai_compatible::{OpenAiCompatibleAdapter, Pricing};

pub struct SparkAdapter {
    inner: OpenAiCompatibleAdapter,
}

impl SparkAdapter {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, model_name: impl Into<String>, pricing: Pricing, http: reqwest::Client) -> Self {
        Self { inner: OpenAiCompatibleAdapter::new("spark", base_url, api_key, model_name, pricing, http) }
    }
}

#[async_trait]
impl Adapter for SparkAdapter {
    fn provider_name(&self) -> &'static str {
        "spark"
    }

    async fn complete(&self, request: &CompletionRequest) -> GatewayResult<CompletionResult> {
        self.inner.complete(request).await
    }

    async fn stream(&self, request: &CompletionRequest) -> GatewayResult<BoxStream<'static, GatewayResult<StreamChunk>>> {
        self.inner.stream(request).await
    }

    async fn test(&self) -> GatewayResult<()> {
        self.inner.test().await
    }

    fn estimate_cost(&self, request: &CompletionRequest) -> f64 {
        self.inner.estimate_cost(request)
    }
}
