//! Data model shared by the orchestration engine and the gateway (spec §3).

pub mod dependency;
pub mod parallel;
pub mod resource;
pub mod risk;
pub mod task;

pub use dependency::{Dependency, DependencyType};
pub use parallel::ParallelGroup;
pub use resource::{ResourceRequirement, ResourceType, ResourceUtilization};
pub use risk::{RiskAssessment, RiskCategory, RiskFactor};
pub use task::{OrchestrationMetadata, Priority, Task, TaskStatus, TaskType, TimeInfo, CPM_EPSILON};
