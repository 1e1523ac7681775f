//! Wire-agnostic chat types shared by every provider adapter (spec §3, §4.A).

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    System,
    User,
    Assistant,
    Tool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    pub name: Option<String>,
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: ChatRole::System, content: content.into(), name: None, tool_call_id: None }
    }
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into(), name: None, tool_call_id: None }
    }
    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: ChatRole::Assistant, content: content.into(), name: None, tool_call_id: None }
    }
    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self { role: ChatRole::Tool, content: content.into(), name: None, tool_call_id: Some(tool_call_id.into()) }
    }
}

/// A provider-agnostic completion request. `model_id` is the gateway's
/// registry key, not necessarily the provider's own model name (the adapter
/// maps it via its `ModelConfig`).
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model_id: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
    /// Honored via `tokio::time::timeout` around the adapter call (spec §5).
    pub deadline: Option<Duration>,
}

impl CompletionRequest {
    pub fn new(model_id: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model_id: model_id.into(),
            messages,
            max_tokens: None,
            temperature: None,
            deadline: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// One candidate the router considered for a request, in cascade order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoutingCandidate {
    pub id: String,
}

/// The ordered candidate list a `complete` call cascaded through (spec §3,
/// §4.C). Populated by [`crate::gateway::gateway::ModelGateway::complete`]
/// after the winning adapter returns; adapters themselves have no visibility
/// into sibling candidates, so they leave this at its default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoutingInfo {
    pub candidates: Vec<RoutingCandidate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResult {
    pub content: String,
    pub model_id: String,
    pub usage: Option<TokenUsage>,
    pub finish_reason: Option<String>,
    pub estimated_cost_usd: f64,
    pub routing: RoutingInfo,
    /// Wall-clock time spent on the winning attempt, `now - start` (spec §4.C).
    pub latency_ms: u64,
}

/// One incremental piece of a streamed completion (spec §4.A streaming).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamChunk {
    pub delta: String,
    pub finish_reason: Option<String>,
}
