//! Typed dependency edges between tasks (spec §3 "Dependency").

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a predecessor's timing constrains its successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyType {
    /// Successor cannot start before predecessor finishes.
    FinishToStart,
    /// Successor cannot start before predecessor starts.
    StartToStart,
    /// Successor cannot finish before predecessor finishes.
    FinishToFinish,
    /// Successor cannot finish before predecessor starts.
    StartToFinish,
}

impl Default for DependencyType {
    fn default() -> Self {
        Self::FinishToStart
    }
}

/// A typed edge between two tasks, optionally carrying a lag in hours.
///
/// `lag` may be negative (a "lead"). Invariants: `predecessor_id != successor_id`;
/// both endpoints must exist in the same plan (checked when the graph is built,
/// not here); the full edge set induces no directed cycle (checked by
/// [`crate::graph::dependency_graph::DependencyGraph::build`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dependency {
    pub id: String,
    pub predecessor_id: String,
    pub successor_id: String,
    #[serde(rename = "type")]
    pub kind: DependencyType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lag: Option<f64>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Dependency {
    /// Build the implicit finish-to-start, zero-lag edge that legacy
    /// `task.dependencies: [id]` entries imply (spec §4.D, source 1).
    pub fn legacy_finish_to_start(predecessor_id: impl Into<String>, successor_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            predecessor_id: predecessor_id.into(),
            successor_id: successor_id.into(),
            kind: DependencyType::FinishToStart,
            lag: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn lag_hours(&self) -> f64 {
        self.lag.unwrap_or(0.0)
    }
}
