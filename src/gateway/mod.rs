//! Multi-provider model gateway: adapter trait (A), router (B), and the
//! gateway registry/cascade (C).

pub mod adapter;
pub mod gateway;
pub mod message;
pub mod providers;
pub mod router;
pub mod sse;

pub use adapter::Adapter;
pub use gateway::{GatewayRetryPolicy, ModelConfig, ModelGateway};
pub use message::{ChatMessage, ChatRole, CompletionRequest, CompletionResult, RoutingCandidate, RoutingInfo, StreamChunk, TokenUsage};
pub use router::{Capability, RouterStrategy, RoutingContext};
