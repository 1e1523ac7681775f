//! Component C: the model registry and request cascade (spec §4.C, §5).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::BoxStream;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::error::{GatewayError, GatewayResult};
use crate::gateway::adapter::Adapter;
use crate::gateway::message::{CompletionRequest, CompletionResult, RoutingCandidate, RoutingInfo, StreamChunk};
use crate::gateway::router::{self, Capability, RouterStrategy, RoutingContext};

/// Registry entry for one model: provider identity, routing metadata, and
/// pricing — everything the router needs without touching the adapter.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub model_id: String,
    pub provider: String,
    pub display_name: String,
    pub enabled: bool,
    /// Lower sorts first (preferred) under the `priority` strategy, the
    /// `enabled_models` snapshot order, and the `smart` strategy's tie-break.
    pub priority: u8,
    pub capabilities: Vec<Capability>,
    /// `None` means no pricing is configured for this model; the `cost`
    /// strategy treats that as infinitely expensive and sorts it last.
    pub cost_per_1k_prompt: Option<f64>,
    pub cost_per_1k_completion: Option<f64>,
    pub avg_latency_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy)]
pub struct GatewayRetryPolicy {
    /// Attempts against the *same* model before moving to the next candidate.
    pub max_attempts_per_model: usize,
    pub initial_backoff: Duration,
}

impl Default for GatewayRetryPolicy {
    fn default() -> Self {
        Self { max_attempts_per_model: 2, initial_backoff: Duration::from_millis(1000) }
    }
}

/// Holds the model registry (mutable, behind a read-mostly lock) and the
/// adapter map (fixed after construction — no lock needed, per spec §4.C's
/// "writer-exclusive discipline" applying only to the registry).
pub struct ModelGateway {
    models: RwLock<HashMap<String, ModelConfig>>,
    adapters: HashMap<String, Arc<dyn Adapter>>,
    retry_policy: GatewayRetryPolicy,
}

impl ModelGateway {
    pub fn new(retry_policy: GatewayRetryPolicy) -> Self {
        Self { models: RwLock::new(HashMap::new()), adapters: HashMap::new(), retry_policy }
    }

    /// Register a model and its adapter. Adapters are immutable for the
    /// gateway's lifetime; call this only during setup, not per-request.
    pub fn register(&mut self, config: ModelConfig, adapter: Arc<dyn Adapter>) {
        self.adapters.insert(config.model_id.clone(), adapter);
        self.models.write().insert(config.model_id.clone(), config);
    }

    pub fn set_enabled(&self, model_id: &str, enabled: bool) -> GatewayResult<()> {
        let mut models = self.models.write();
        let config = models.get_mut(model_id).ok_or_else(|| GatewayError::UnknownModel { model_id: model_id.to_string() })?;
        config.enabled = enabled;
        Ok(())
    }

    pub fn remove_model(&self, model_id: &str) {
        self.models.write().remove(model_id);
    }

    /// A consistent snapshot of enabled models, sorted by ascending
    /// priority (lower = preferred), taken under a brief read lock released
    /// before any I/O (spec §5's "consistent snapshot" requirement).
    pub fn enabled_models(&self) -> Vec<ModelConfig> {
        let models = self.models.read();
        let mut enabled: Vec<ModelConfig> = models.values().filter(|m| m.enabled).cloned().collect();
        enabled.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.model_id.cmp(&b.model_id)));
        enabled
    }

    fn candidates(&self, strategy: RouterStrategy, context: &RoutingContext) -> Vec<ModelConfig> {
        router::rank(strategy, self.enabled_models(), context)
    }

    /// Try each candidate model in router order, retrying within a model per
    /// `retry_policy` before cascading to the next one. Returns
    /// [`GatewayError::Exhausted`] if every candidate fails (spec §4.C, §7).
    pub async fn complete(&self, request: CompletionRequest, strategy: RouterStrategy, context: RoutingContext) -> GatewayResult<CompletionResult> {
        let request_id = Uuid::new_v4().to_string();
        let candidates = self.candidates(strategy, &context);
        if candidates.is_empty() {
            return Err(GatewayError::UnknownModel { model_id: request.model_id.clone() });
        }

        let start = tokio::time::Instant::now();
        let routing = RoutingInfo { candidates: candidates.iter().map(|c| RoutingCandidate { id: c.model_id.clone() }).collect() };

        let mut last_error: Option<GatewayError> = None;
        for config in &candidates {
            let Some(adapter) = self.adapters.get(&config.model_id) else { continue };
            let per_model_request = request.clone_with_model(config.model_id.clone());

            for attempt in 0..self.retry_policy.max_attempts_per_model {
                let outcome = match per_model_request.deadline {
                    Some(deadline) => tokio::time::timeout(deadline, adapter.complete(&per_model_request))
                        .await
                        .unwrap_or_else(|_| Err(GatewayError::Timeout { model_id: config.model_id.clone(), elapsed_ms: deadline.as_millis() as u64 })),
                    None => adapter.complete(&per_model_request).await,
                };

                match outcome {
                    Ok(mut result) => {
                        result.routing = routing;
                        result.latency_ms = start.elapsed().as_millis() as u64;
                        return Ok(result);
                    }
                    Err(err) => {
                        tracing::warn!(model_id = %config.model_id, attempt, error = %err, "completion attempt failed");
                        let retryable = err.is_retryable();
                        last_error = Some(err);
                        if !retryable {
                            break;
                        }
                        if attempt + 1 < self.retry_policy.max_attempts_per_model {
                            tokio::time::sleep(self.retry_policy.initial_backoff * (attempt as u32 + 1)).await;
                        }
                    }
                }
            }
        }

        let last_error_msg = last_error.map(|e| e.to_string()).unwrap_or_else(|| "no candidate models available".to_string());
        tracing::error!(request_id = %request_id, attempted = candidates.len(), "all candidate models exhausted");
        Err(GatewayError::Exhausted { request_id, attempted: candidates.len(), last_error: last_error_msg })
    }

    /// Like [`Self::complete`], but cascades only on the *initial* failure to
    /// open a stream; once a provider starts streaming, errors mid-stream
    /// surface through the stream itself rather than triggering another
    /// cascade (a partially-emitted response can't be silently replaced).
    pub async fn stream(&self, request: CompletionRequest, strategy: RouterStrategy, context: RoutingContext) -> GatewayResult<BoxStream<'static, GatewayResult<StreamChunk>>> {
        let request_id = Uuid::new_v4().to_string();
        let candidates = self.candidates(strategy, &context);
        if candidates.is_empty() {
            return Err(GatewayError::UnknownModel { model_id: request.model_id.clone() });
        }

        let mut last_error: Option<GatewayError> = None;
        for config in &candidates {
            let Some(adapter) = self.adapters.get(&config.model_id) else { continue };
            let per_model_request = request.clone_with_model(config.model_id.clone());
            match adapter.stream(&per_model_request).await {
                Ok(stream) => return Ok(stream),
                Err(err) => {
                    tracing::warn!(model_id = %config.model_id, error = %err, "stream open failed, cascading");
                    last_error = Some(err);
                }
            }
        }

        let last_error_msg = last_error.map(|e| e.to_string()).unwrap_or_else(|| "no candidate models available".to_string());
        tracing::error!(request_id = %request_id, attempted = candidates.len(), "all candidate models exhausted opening stream");
        Err(GatewayError::Exhausted { request_id, attempted: candidates.len(), last_error: last_error_msg })
    }

    /// Run each registered adapter's connectivity check concurrently.
    pub async fn test_all(&self) -> HashMap<String, GatewayResult<()>> {
        let ids: Vec<String> = self.adapters.keys().cloned().collect();
        let futures = ids.iter().map(|id| {
            let adapter = self.adapters.get(id).expect("id came from adapters.keys()").clone();
            async move { adapter.test().await }
        });
        let results = futures::future::join_all(futures).await;
        ids.into_iter().zip(results).collect()
    }
}

impl CompletionRequest {
    fn clone_with_model(&self, model_id: String) -> Self {
        Self { model_id, messages: self.messages.clone(), max_tokens: self.max_tokens, temperature: self.temperature, deadline: self.deadline }
    }
}
