//! Task orchestration (Critical Path Method scheduling) and a multi-provider
//! LLM gateway, packaged as one crate so an AI-assisted planning host can
//! schedule a project and route its model calls through a single
//! dependency.
//!
//! The crate has two independent halves that share only [`error`] and
//! [`model`]:
//!
//! - `model`, `graph`, `orchestrator` — the CPM scheduler. Build a
//!   dependency graph from a task list ([`graph::DependencyGraph`]), run the
//!   forward/backward pass ([`graph::cpm`]), then drive the whole pipeline
//!   through [`orchestrator::Orchestrator::orchestrate`].
//! - `gateway` — the model gateway. Register provider adapters and
//!   [`gateway::ModelConfig`]s on a [`gateway::ModelGateway`], then call
//!   [`gateway::ModelGateway::complete`] or `::stream` with a router
//!   strategy.
//!
//! [`contracts`] defines the traits a host application implements to plug in
//! its own PRD parser, task store, logger, and config source; this crate
//! consumes them but ships no concrete implementation beyond the
//! [`contracts::NoopLogger`]/[`contracts::NullConfigSource`] fixtures.

pub mod contracts;
pub mod error;
pub mod gateway;
pub mod graph;
pub mod model;
pub mod orchestrator;

pub use error::{GatewayError, GatewayResult, TaskflowError, TaskflowResult};
