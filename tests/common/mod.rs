//! Shared task-builder fixtures for the integration test suite.

use taskflow_core::model::{
    Dependency, DependencyType, Priority, ResourceRequirement, ResourceType, Task, TaskStatus, TaskType,
};

pub fn task(id: &str, hours: f64, deps: &[&str]) -> Task {
    Task {
        id: id.to_string(),
        name: id.to_string(),
        description: String::new(),
        status: TaskStatus::NotStarted,
        priority: Priority::Medium,
        kind: TaskType::Feature,
        dependencies: deps.iter().map(|s| s.to_string()).collect(),
        dependency_relations: vec![],
        estimated_hours: hours,
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

pub fn with_ss_lag(mut successor: Task, predecessor_id: &str, lag: f64) -> Task {
    successor.dependency_relations.push(Dependency {
        id: format!("{predecessor_id}-{}", successor.id),
        predecessor_id: predecessor_id.to_string(),
        successor_id: successor.id.clone(),
        kind: DependencyType::StartToStart,
        lag: Some(lag),
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
    });
    successor
}

pub fn with_human_resource(mut t: Task, name: &str, quantity: f64) -> Task {
    t.resource_requirements.push(ResourceRequirement {
        id: format!("{}-{name}", t.id),
        name: name.to_string(),
        kind: ResourceType::Human,
        quantity,
        availability: None,
    });
    t
}
