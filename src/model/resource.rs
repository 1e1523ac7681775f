//! Resources a task may consume (spec §3 "ResourceRequirement").

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Human,
    Equipment,
    Material,
    Software,
    Budget,
}

/// A resource a task requires. `quantity` must be > 0; `availability`, when
/// present, should be >= `quantity` for a non-conflicting plan (flagged, not
/// enforced, by the risk analyzer — see [`crate::graph::risk_analyzer`]).
///
/// Conflict matching is name-based and restricted to [`ResourceType::Human`]
/// (spec §4.F, §9): two tasks conflict only if they list the same human
/// resource *name*. Other resource types may overlap freely; more structured
/// resource identity (e.g. a pooled equipment id) is out of scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceRequirement {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ResourceType,
    pub quantity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<f64>,
}

impl ResourceRequirement {
    /// Two requirements conflict iff both are human resources with the same name.
    pub fn conflicts_with(&self, other: &ResourceRequirement) -> bool {
        self.kind == ResourceType::Human && other.kind == ResourceType::Human && self.name == other.name
    }
}

/// Aggregate allocation of a single named resource across a plan, used by
/// the orchestrator's resource-leveling step (spec §4.H step 7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceUtilization {
    pub resource_name: String,
    pub resource_type: ResourceType,
    pub allocated_capacity: f64,
    pub total_capacity: f64,
    pub task_ids: Vec<String>,
}

impl ResourceUtilization {
    pub fn is_overallocated(&self) -> bool {
        self.allocated_capacity > self.total_capacity
    }

    pub fn utilization_ratio(&self) -> f64 {
        if self.total_capacity <= 0.0 {
            0.0
        } else {
            self.allocated_capacity / self.total_capacity
        }
    }
}
