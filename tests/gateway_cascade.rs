//! S5 — gateway cascade: a persistently failing priority-1 model falls back
//! to a working priority-2 model within the retry/fallback policy.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::BoxStream;

use taskflow_core::error::{GatewayError, GatewayResult};
use taskflow_core::gateway::{
    Adapter, ChatMessage, CompletionRequest, CompletionResult, GatewayRetryPolicy, ModelConfig, ModelGateway,
    RouterStrategy, RoutingContext, StreamChunk,
};

struct ScriptedAdapter {
    name: &'static str,
    /// Pre-scripted outcomes consumed in order; once exhausted, always succeeds.
    failures: AtomicUsize,
}

#[async_trait]
impl Adapter for ScriptedAdapter {
    fn provider_name(&self) -> &'static str {
        self.name
    }

    async fn complete(&self, request: &CompletionRequest) -> GatewayResult<CompletionResult> {
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.fetch_sub(1, Ordering::SeqCst);
            return Err(GatewayError::Provider {
                provider: self.name.to_string(),
                model_id: request.model_id.clone(),
                message: "500 internal error".to_string(),
            });
        }
        Ok(CompletionResult {
            content: format!("response from {}", self.name),
            model_id: request.model_id.clone(),
            usage: None,
            finish_reason: Some("stop".to_string()),
            estimated_cost_usd: 0.0,
            routing: Default::default(),
            latency_ms: 0,
        })
    }

    async fn stream(&self, _request: &CompletionRequest) -> GatewayResult<BoxStream<'static, GatewayResult<StreamChunk>>> {
        Ok(Box::pin(futures::stream::empty()))
    }

    async fn test(&self) -> GatewayResult<()> {
        Ok(())
    }

    fn estimate_cost(&self, _request: &CompletionRequest) -> f64 {
        0.0
    }
}

fn model(id: &str, priority: u8) -> ModelConfig {
    ModelConfig {
        model_id: id.to_string(),
        provider: "test".to_string(),
        display_name: id.to_string(),
        enabled: true,
        priority,
        capabilities: vec![],
        cost_per_1k_prompt: Some(0.1),
        cost_per_1k_completion: Some(0.1),
        avg_latency_ms: None,
    }
}

#[tokio::test]
async fn s5_gateway_cascade_falls_back_to_second_priority_model() {
    let mut gateway = ModelGateway::new(GatewayRetryPolicy { max_attempts_per_model: 2, initial_backoff: Duration::from_millis(1) });
    gateway.register(model("p1", 1), Arc::new(ScriptedAdapter { name: "p1", failures: AtomicUsize::new(2) }));
    gateway.register(model("p2", 2), Arc::new(ScriptedAdapter { name: "p2", failures: AtomicUsize::new(0) }));

    let candidates = RouterStrategy::Priority;
    let enabled = gateway.enabled_models();
    assert_eq!(enabled[0].model_id, "p1");
    assert_eq!(enabled[1].model_id, "p2");

    let request = CompletionRequest::new("p1", vec![ChatMessage::user("hi")]);
    let result = gateway.complete(request, candidates, RoutingContext::default()).await.unwrap();

    assert_eq!(result.model_id, "p2");
    assert_eq!(result.content, "response from p2");
    assert_eq!(result.routing.candidates[0].id, "p1");
    assert_eq!(result.routing.candidates[1].id, "p2");
}
