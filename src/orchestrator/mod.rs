//! Orchestration config/presets (H config surface), strategy layer (I), and
//! the facade (H) that ties the graph components into one call.

pub mod config;
pub mod facade;
pub mod strategy;

pub use config::{OptimizationGoal, OrchestrationConfig, OrchestrationConfigOverrides, Preset, ProjectCharacteristics, SchedulingStrategy};
pub use facade::{Orchestrator, OrchestrationResult, OrchestrationRunMetadata};
