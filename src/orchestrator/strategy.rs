//! Component I: task orderings the orchestrator can expose alongside the raw
//! CPM schedule (spec §4.I).

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::model::{Task, TimeInfo};
use crate::orchestrator::config::SchedulingStrategy;

/// Order `tasks` by `strategy`, returning task ids.
///
/// `resource_leveling` and `late_start` are not specialized orderings in the
/// source this was distilled from; both are literal aliases of
/// `critical_path` here, not separate algorithms (spec §9).
pub fn order_tasks(tasks: &[Task], times: &HashMap<String, TimeInfo>, strategy: SchedulingStrategy) -> Vec<String> {
    let mut ids: Vec<&Task> = tasks.iter().collect();
    let time_of = |id: &str| -> TimeInfo {
        times.get(id).copied().unwrap_or(TimeInfo {
            earliest_start: 0.0,
            latest_start: 0.0,
            earliest_finish: 0.0,
            latest_finish: 0.0,
            total_float: 0.0,
            free_float: 0.0,
            is_critical: false,
        })
    };

    match strategy {
        SchedulingStrategy::CriticalPath | SchedulingStrategy::ResourceLeveling | SchedulingStrategy::LateStart => {
            ids.sort_by(|a, b| {
                let ta = time_of(&a.id);
                let tb = time_of(&b.id);
                critical_first(ta.is_critical, tb.is_critical)
                    .then_with(|| cmp_f64(ta.earliest_start, tb.earliest_start))
                    .then_with(|| cmp_f64(ta.total_float, tb.total_float))
                    .then_with(|| a.priority.ordinal().cmp(&b.priority.ordinal()))
                    .then_with(|| a.id.cmp(&b.id))
            });
        }
        SchedulingStrategy::PriorityFirst => {
            ids.sort_by(|a, b| {
                let ta = time_of(&a.id);
                let tb = time_of(&b.id);
                b.priority
                    .ordinal()
                    .cmp(&a.priority.ordinal())
                    .then_with(|| cmp_f64(ta.earliest_start, tb.earliest_start))
                    .then_with(|| cmp_f64(ta.total_float, tb.total_float))
                    .then_with(|| a.id.cmp(&b.id))
            });
        }
        SchedulingStrategy::ShortestFirst => {
            ids.sort_by(|a, b| {
                let ta = time_of(&a.id);
                let tb = time_of(&b.id);
                cmp_f64(a.duration_hours(), b.duration_hours())
                    .then_with(|| cmp_f64(ta.earliest_start, tb.earliest_start))
                    .then_with(|| a.id.cmp(&b.id))
            });
        }
        SchedulingStrategy::LongestFirst => {
            ids.sort_by(|a, b| {
                let ta = time_of(&a.id);
                let tb = time_of(&b.id);
                cmp_f64(b.duration_hours(), a.duration_hours())
                    .then_with(|| cmp_f64(ta.earliest_start, tb.earliest_start))
                    .then_with(|| a.id.cmp(&b.id))
            });
        }
        SchedulingStrategy::EarlyStart => {
            ids.sort_by(|a, b| {
                let ta = time_of(&a.id);
                let tb = time_of(&b.id);
                cmp_f64(ta.earliest_start, tb.earliest_start)
                    .then_with(|| cmp_f64(ta.total_float, tb.total_float))
                    .then_with(|| a.priority.ordinal().cmp(&b.priority.ordinal()))
                    .then_with(|| a.id.cmp(&b.id))
            });
        }
    }

    ids.into_iter().map(|t| t.id.clone()).collect()
}

fn critical_first(a: bool, b: bool) -> Ordering {
    // Critical tasks (true) sort before non-critical (false).
    b.cmp(&a)
}

fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{cpm, DependencyGraph};
    use crate::model::{Priority, TaskStatus, TaskType};

    fn task(id: &str, hours: f64, priority: Priority, deps: &[&str]) -> Task {
        Task {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            status: TaskStatus::NotStarted,
            priority,
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
    fn critical_path_strategy_puts_critical_tasks_first() {
        let tasks = vec![
            task("A", 4.0, Priority::Medium, &[]),
            task("B", 1.0, Priority::Medium, &["A"]),
            task("C", 2.0, Priority::Medium, &["A"]),
            task("D", 1.0, Priority::Medium, &["B", "C"]),
        ];
        let graph = DependencyGraph::build(&tasks).unwrap();
        let cpm = cpm::run(&graph, &tasks, true).unwrap();
        let order = order_tasks(&tasks, &cpm.times, SchedulingStrategy::CriticalPath);
        // A, C, D are critical; B is not.
        assert_eq!(order.last().unwrap(), "B");
    }

    #[test]
    fn priority_first_orders_descending_priority() {
        let tasks = vec![
            task("low", 1.0, Priority::Low, &[]),
            task("crit", 1.0, Priority::Critical, &[]),
            task("med", 1.0, Priority::Medium, &[]),
        ];
        let order = order_tasks(&tasks, &HashMap::new(), SchedulingStrategy::PriorityFirst);
        assert_eq!(order, vec!["crit", "med", "low"]);
    }

    #[test]
    fn shortest_first_orders_ascending_duration() {
        let tasks = vec![
            task("long", 10.0, Priority::Medium, &[]),
            task("short", 1.0, Priority::Medium, &[]),
            task("mid", 5.0, Priority::Medium, &[]),
        ];
        let order = order_tasks(&tasks, &HashMap::new(), SchedulingStrategy::ShortestFirst);
        assert_eq!(order, vec!["short", "mid", "long"]);
    }

    #[test]
    fn resource_leveling_and_late_start_are_aliases_of_critical_path() {
        let tasks = vec![
            task("A", 4.0, Priority::Medium, &[]),
            task("B", 1.0, Priority::Medium, &["A"]),
        ];
        let graph = DependencyGraph::build(&tasks).unwrap();
        let cpm = cpm::run(&graph, &tasks, true).unwrap();
        let cp = order_tasks(&tasks, &cpm.times, SchedulingStrategy::CriticalPath);
        let rl = order_tasks(&tasks, &cpm.times, SchedulingStrategy::ResourceLeveling);
        let ls = order_tasks(&tasks, &cpm.times, SchedulingStrategy::LateStart);
        assert_eq!(cp, rl);
        assert_eq!(cp, ls);
    }
}
