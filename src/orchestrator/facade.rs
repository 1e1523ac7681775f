//! Component H: the orchestrator facade that runs the full pipeline —
//! dependency graph, CPM, strategy ordering, parallel groups, resource
//! utilization, and risk assessment — over a task set (spec §4.H).

use std::collections::HashMap;
use std::time::Instant;

use chrono::{Duration as ChronoDuration, Utc};

use crate::error::TaskflowError;
use crate::graph::{cpm, parallel_finder, risk_analyzer, CpmResult, DependencyGraph};
use crate::model::{ParallelGroup, ResourceType, ResourceUtilization, RiskAssessment, Task};
use crate::orchestrator::config::{OptimizationGoal, OrchestrationConfig, SchedulingStrategy};
use crate::orchestrator::strategy;

/// Everything produced by one call to [`Orchestrator::orchestrate`].
#[derive(Debug, Clone)]
pub struct OrchestrationResult {
    /// Tasks with `time_info` populated, ordered per `config.scheduling_strategy`.
    pub tasks: Vec<Task>,
    pub critical_path: Vec<String>,
    /// `project_duration` from CPM, inflated by `config.buffer_percentage`.
    pub total_duration: f64,
    pub parallel_groups: Vec<ParallelGroup>,
    pub resource_utilization: Vec<ResourceUtilization>,
    pub risk_assessment: RiskAssessment,
    pub recommendations: Vec<String>,
    pub run_metadata: OrchestrationRunMetadata,
}

#[derive(Debug, Clone)]
pub struct OrchestrationRunMetadata {
    pub strategy: SchedulingStrategy,
    pub goal: OptimizationGoal,
    pub elapsed_ms: u64,
    pub crate_version: &'static str,
}

/// Stateless entry point into the orchestration engine. Holds no data of its
/// own; every call is independent and takes its inputs by reference (spec §5).
#[derive(Debug, Default, Clone, Copy)]
pub struct Orchestrator;

impl Orchestrator {
    pub fn new() -> Self {
        Self
    }

    /// Run the full pipeline: build the dependency graph, run CPM, order
    /// tasks per the configured strategy, find parallel groups, level
    /// resources, assess risk, and produce textual recommendations.
    pub fn orchestrate(&self, tasks: &[Task], config: &OrchestrationConfig) -> Result<OrchestrationResult, TaskflowError> {
        let started = Instant::now();

        let graph = DependencyGraph::build(tasks)?;
        let cpm_result = cpm::run(&graph, tasks, config.strict_scheduling)?;

        let mut timed_tasks = update_task_time_info(tasks, &cpm_result);

        let order = strategy::order_tasks(&timed_tasks, &cpm_result.times, config.scheduling_strategy);
        let position: HashMap<&str, usize> = order.iter().enumerate().map(|(i, id)| (id.as_str(), i)).collect();
        timed_tasks.sort_by_key(|t| position.get(t.id.as_str()).copied().unwrap_or(usize::MAX));

        let parallel_groups = if config.enable_parallel_optimization {
            parallel_finder::find_parallel_groups(&timed_tasks, &cpm_result.times, config.max_parallel_tasks)
        } else {
            Vec::new()
        };

        let resource_utilization = if config.enable_resource_leveling {
            compute_resource_utilization(&timed_tasks)
        } else {
            Vec::new()
        };

        let risk_assessment = if config.enable_risk_analysis {
            risk_analyzer::analyze(&timed_tasks, &resource_utilization)
        } else {
            RiskAssessment::empty()
        };

        for util in resource_utilization.iter().filter(|r| r.is_overallocated()) {
            tracing::warn!(resource = %util.resource_name, allocated = util.allocated_capacity, capacity = util.total_capacity, "resource over-allocated");
        }

        let critical_path = if config.enable_critical_path {
            cpm_result.critical_path.clone()
        } else {
            Vec::new()
        };

        let recommendations = generate_recommendations(&timed_tasks, &parallel_groups, &resource_utilization, &risk_assessment);

        let total_duration = cpm_result.project_duration * (1.0 + config.buffer_percentage);

        Ok(OrchestrationResult {
            tasks: timed_tasks,
            critical_path,
            total_duration,
            parallel_groups,
            resource_utilization,
            risk_assessment,
            recommendations,
            run_metadata: OrchestrationRunMetadata {
                strategy: config.scheduling_strategy,
                goal: config.optimization_goal,
                elapsed_ms: started.elapsed().as_millis() as u64,
                crate_version: env!("CARGO_PKG_VERSION"),
            },
        })
    }
}

/// Attach the CPM-computed [`crate::model::TimeInfo`] to each task, and
/// project a `due_date` from `now + earliest_finish` hours when the task has
/// none set already. Returns cloned tasks; does not mutate the input slice.
pub fn update_task_time_info(tasks: &[Task], cpm_result: &CpmResult) -> Vec<Task> {
    let now = Utc::now();
    tasks
        .iter()
        .cloned()
        .map(|mut t| {
            if let Some(times) = cpm_result.times.get(&t.id) {
                t.time_info = Some(*times);
                if t.due_date.is_none() {
                    let minutes = (times.earliest_finish * 60.0).round() as i64;
                    t.due_date = Some(now + ChronoDuration::minutes(minutes));
                }
            }
            t
        })
        .collect()
}

/// Aggregate allocated vs. available capacity per named resource (spec §4.H
/// step 7). `total_capacity` is the first explicit `availability` seen for
/// that resource name; when no task declares one, capacity is assumed to
/// exactly match demand (never flagged as over-allocated) rather than
/// guessed.
fn compute_resource_utilization(tasks: &[Task]) -> Vec<ResourceUtilization> {
    struct Acc {
        kind: ResourceType,
        allocated: f64,
        capacity: Option<f64>,
        task_ids: Vec<String>,
    }

    let mut by_name: HashMap<String, Acc> = HashMap::new();
    for task in tasks {
        for req in &task.resource_requirements {
            let acc = by_name.entry(req.name.clone()).or_insert_with(|| Acc {
                kind: req.kind,
                allocated: 0.0,
                capacity: None,
                task_ids: Vec::new(),
            });
            acc.allocated += req.quantity;
            if acc.capacity.is_none() {
                acc.capacity = req.availability;
            }
            acc.task_ids.push(task.id.clone());
        }
    }

    let mut out: Vec<ResourceUtilization> = by_name
        .into_iter()
        .map(|(name, acc)| {
            let mut task_ids = acc.task_ids;
            task_ids.sort_unstable();
            task_ids.dedup();
            ResourceUtilization {
                resource_name: name,
                resource_type: acc.kind,
                allocated_capacity: acc.allocated,
                total_capacity: acc.capacity.unwrap_or(acc.allocated),
                task_ids,
            }
        })
        .collect();
    out.sort_by(|a, b| a.resource_name.cmp(&b.resource_name));
    out
}

fn generate_recommendations(
    tasks: &[Task],
    parallel_groups: &[ParallelGroup],
    resource_utilization: &[ResourceUtilization],
    risk_assessment: &RiskAssessment,
) -> Vec<String> {
    let mut out = Vec::new();

    let critical_count = tasks.iter().filter(|t| t.is_critical()).count();
    if !tasks.is_empty() && critical_count as f64 / tasks.len() as f64 > 0.3 {
        out.push(format!(
            "{critical_count} of {} tasks sit on the critical path; add schedule buffer there before committing a date.",
            tasks.len()
        ));
    }

    if !parallel_groups.is_empty() {
        out.push(format!(
            "{} group(s) of tasks can run concurrently; assign separate owners to realize the parallel schedule.",
            parallel_groups.len()
        ));
    }

    let overallocated: Vec<&str> = resource_utilization
        .iter()
        .filter(|r| r.is_overallocated())
        .map(|r| r.resource_name.as_str())
        .collect();
    if !overallocated.is_empty() {
        out.push(format!("Resource(s) over capacity: {}. Re-balance before the plan starts.", overallocated.join(", ")));
    }

    if risk_assessment.overall_risk_level > 4.0 {
        out.push("Overall risk is elevated; review the contingency plans before kickoff.".to_string());
    }

    if out.is_empty() {
        out.push("Plan looks healthy at current scope; proceed with the scheduled dates.".to_string());
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Priority, TaskStatus, TaskType};

    fn task(id: &str, hours: f64, deps: &[&str]) -> Task {
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

    #[test]
    fn orchestrate_fan_out_matches_cpm_scenario() {
        let tasks = vec![
            task("A", 4.0, &[]),
            task("B", 1.0, &["A"]),
            task("C", 2.0, &["A"]),
            task("D", 1.0, &["B", "C"]),
        ];
        let config = OrchestrationConfig::default();
        let result = Orchestrator::new().orchestrate(&tasks, &config).unwrap();

        assert_eq!(result.critical_path, vec!["A", "C", "D"]);
        assert_eq!(result.parallel_groups.len(), 1);
        assert!((result.total_duration - 6.0).abs() < 1e-9);
        assert!(result.tasks.iter().all(|t| t.time_info.is_some()));
    }

    #[test]
    fn disabling_critical_path_suppresses_output_but_not_scheduling() {
        let tasks = vec![task("A", 1.0, &[]), task("B", 1.0, &["A"])];
        let mut config = OrchestrationConfig::default();
        config.enable_critical_path = false;
        let result = Orchestrator::new().orchestrate(&tasks, &config).unwrap();
        assert!(result.critical_path.is_empty());
        assert!((result.total_duration - 2.0).abs() < 1e-9);
    }

    #[test]
    fn overallocated_human_resource_is_flagged_and_recommended() {
        use crate::model::ResourceRequirement;
        let mut a = task("A", 2.0, &[]);
        a.resource_requirements.push(ResourceRequirement {
            id: "r1".into(),
            name: "Alice".into(),
            kind: ResourceType::Human,
            quantity: 2.0,
            availability: Some(1.0),
        });
        let tasks = vec![a];
        let config = OrchestrationConfig::default();
        let result = Orchestrator::new().orchestrate(&tasks, &config).unwrap();

        let alice = result.resource_utilization.iter().find(|r| r.resource_name == "Alice").unwrap();
        assert!(alice.is_overallocated());
        assert!(result.recommendations.iter().any(|r| r.contains("Alice")));
    }
}
