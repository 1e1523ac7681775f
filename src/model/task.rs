//! The core unit of work (spec §3 "Task") and its computed schedule ([`TimeInfo`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TaskflowError;
use crate::model::dependency::Dependency;
use crate::model::resource::ResourceRequirement;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    NotStarted,
    Pending,
    InProgress,
    Running,
    Completed,
    Done,
    Cancelled,
    Failed,
    Blocked,
    OnHold,
    Review,
    Todo,
}

impl TaskStatus {
    fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Done | Self::Cancelled)
    }

    /// Allowed status transitions (spec §3 invariants, expanded in SPEC_FULL §3):
    /// any not-yet-started state may move to an active state; active states may
    /// move to a terminal or waiting state; any non-terminal state may be
    /// cancelled. Terminal states do not transition further.
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        use TaskStatus::*;
        if self == next {
            return true;
        }
        if self.is_terminal() {
            return false;
        }
        if next == Cancelled {
            return true;
        }
        match self {
            NotStarted | Pending | Todo => matches!(next, InProgress | Running | Blocked | OnHold),
            InProgress | Running => matches!(next, Completed | Done | Blocked | OnHold | Review | Failed),
            Blocked | OnHold => matches!(next, InProgress | Running),
            Review => matches!(next, Completed | Done | InProgress | Running),
            Failed => matches!(next, InProgress | Running),
            Completed | Done | Cancelled => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    /// Ordinal used by the `priority_first` strategy (critical=4 .. low=1).
    pub fn ordinal(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
            Self::Critical => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Feature,
    BugFix,
    Refactor,
    Test,
    Document,
    Analysis,
    Design,
    Deployment,
    Research,
}

/// Computed CPM schedule attached to a task after orchestration (spec §3 "TimeInfo").
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeInfo {
    pub earliest_start: f64,
    pub latest_start: f64,
    pub earliest_finish: f64,
    pub latest_finish: f64,
    pub total_float: f64,
    pub free_float: f64,
    pub is_critical: bool,
}

/// Epsilon used for all float/critical-path comparisons (spec §4.E).
pub const CPM_EPSILON: f64 = 1e-6;

/// AI-derived attributes consumed from the gateway (spec §1, "they interact...").
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationMetadata {
    pub parallelizable: bool,
    /// In `[0, 10]`.
    pub complexity: f64,
    pub requires_review: bool,
}

impl Default for OrchestrationMetadata {
    fn default() -> Self {
        Self {
            parallelizable: true,
            complexity: 0.0,
            requires_review: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub status: TaskStatus,
    pub priority: Priority,
    #[serde(rename = "type")]
    pub kind: TaskType,
    /// Legacy dependency list; equivalent to a finish-to-start edge with zero
    /// lag to each listed predecessor (spec §4.D, source 1).
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Structured, typed dependency edges; overrides/augments `dependencies`
    /// (spec §4.D, source 2).
    #[serde(default)]
    pub dependency_relations: Vec<Dependency>,
    pub estimated_hours: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_hours: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(default)]
    pub resource_requirements: Vec<ResourceRequirement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orchestration_metadata: Option<OrchestrationMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_info: Option<TimeInfo>,
}

impl Task {
    /// Duration used by the CPM engine: `time_info.estimated_duration` is not
    /// a separate field in this model (time_info is CPM *output*), so per
    /// spec §4.E this falls back to `estimated_hours`, defaulting to 8h.
    pub fn duration_hours(&self) -> f64 {
        if self.estimated_hours > 0.0 {
            self.estimated_hours
        } else {
            8.0
        }
    }

    pub fn is_critical(&self) -> bool {
        self.time_info.map(|t| t.is_critical).unwrap_or(false)
    }

    pub fn is_parallelizable(&self) -> bool {
        self.orchestration_metadata
            .map(|m| m.parallelizable)
            .unwrap_or(true)
    }

    /// Validate and apply a status transition, enforcing the §3 invariant that
    /// `completed`/`done` implies `progress == 100` and `completed_at` set.
    pub fn transition_to(&mut self, next: TaskStatus) -> Result<(), TaskflowError> {
        if !self.status.can_transition_to(next) {
            return Err(TaskflowError::Validation {
                field: self.id.clone(),
                message: format!("illegal status transition {:?} -> {:?}", self.status, next),
            });
        }
        self.status = next;
        if matches!(next, TaskStatus::Completed | TaskStatus::Done) {
            self.progress = Some(100);
            self.completed_at.get_or_insert_with(Utc::now);
        }
        self.updated_at = Some(Utc::now());
        Ok(())
    }

    pub fn human_resources(&self) -> impl Iterator<Item = &ResourceRequirement> {
        self.resource_requirements
            .iter()
            .filter(|r| r.kind == crate::model::resource::ResourceType::Human)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task_with_status(status: TaskStatus) -> Task {
        Task {
            id: "t1".into(),
            name: "task".into(),
            description: String::new(),
            status,
            priority: Priority::Medium,
            kind: TaskType::Feature,
            dependencies: vec![],
            dependency_relations: vec![],
            estimated_hours: 4.0,
            actual_hours: None,
            assignee: None,
            tags: vec![],
            created_at: None,
            updated_at: None,
            started_at: None,
            completed_at: None,
            due_date: None,
            progress: None,
            resource_requirements: vec![],
            orchestration_metadata: None,
            time_info: None,
        }
    }

    #[test]
    fn completing_a_task_sets_progress_and_timestamp() {
        let mut t = task_with_status(TaskStatus::InProgress);
        t.transition_to(TaskStatus::Completed).unwrap();
        assert_eq!(t.progress, Some(100));
        assert!(t.completed_at.is_some());
    }

    #[test]
    fn terminal_status_cannot_transition_further() {
        let mut t = task_with_status(TaskStatus::Done);
        assert!(t.transition_to(TaskStatus::InProgress).is_err());
    }

    #[test]
    fn not_started_cannot_jump_to_completed() {
        let mut t = task_with_status(TaskStatus::NotStarted);
        assert!(t.transition_to(TaskStatus::Completed).is_err());
    }

    #[test]
    fn any_active_state_can_be_cancelled() {
        let mut t = task_with_status(TaskStatus::Blocked);
        assert!(t.transition_to(TaskStatus::Cancelled).is_ok());
    }

    #[test]
    fn duration_hours_falls_back_to_default() {
        let mut t = task_with_status(TaskStatus::NotStarted);
        t.estimated_hours = 0.0;
        assert_eq!(t.duration_hours(), 8.0);
    }
}
