//! Component D: the dependency graph, built from legacy and structured edges,
//! with DFS cycle detection (spec §4.D).

use std::collections::{HashMap, HashSet};

use crate::error::TaskflowError;
use crate::model::{Dependency, Task};

/// One node's adjacency in the graph. Predecessor/successor sets are keyed by
/// task id; the dependency that created each edge is kept alongside so the
/// CPM engine can read its type and lag (spec §4.E).
#[derive(Debug, Clone, Default)]
pub struct Node {
    pub task_id: String,
    pub predecessors: Vec<(String, Dependency)>,
    pub successors: Vec<(String, Dependency)>,
}

impl Node {
    pub fn in_degree(&self) -> usize {
        self.predecessors.len()
    }

    pub fn out_degree(&self) -> usize {
        self.successors.len()
    }
}

#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    pub nodes: HashMap<String, Node>,
}

impl DependencyGraph {
    /// Build the graph from a task list: first materialize legacy
    /// `task.dependencies: [id]` entries as finish-to-start, zero-lag edges,
    /// then apply `task.dependency_relations`, which override/augment them
    /// (spec §4.D). Runs cycle detection before returning.
    pub fn build(tasks: &[Task]) -> Result<Self, TaskflowError> {
        let mut nodes: HashMap<String, Node> = tasks
            .iter()
            .map(|t| {
                (
                    t.id.clone(),
                    Node {
                        task_id: t.id.clone(),
                        ..Default::default()
                    },
                )
            })
            .collect();

        let known_ids: HashSet<&str> = tasks.iter().map(|t| t.id.as_str()).collect();

        for task in tasks {
            for pred_id in &task.dependencies {
                if !known_ids.contains(pred_id.as_str()) {
                    tracing::warn!(task_id = %task.id, missing = %pred_id, "legacy dependency references unknown task, skipping");
                    continue;
                }
                let dep = Dependency::legacy_finish_to_start(pred_id.clone(), task.id.clone());
                Self::add_edge(&mut nodes, dep);
            }
        }

        for task in tasks {
            for dep in &task.dependency_relations {
                if dep.predecessor_id == dep.successor_id {
                    return Err(TaskflowError::Validation {
                        field: dep.id.clone(),
                        message: "dependency predecessor and successor must differ".to_string(),
                    });
                }
                if !known_ids.contains(dep.predecessor_id.as_str())
                    || !known_ids.contains(dep.successor_id.as_str())
                {
                    tracing::warn!(dependency_id = %dep.id, "dependency references a task outside this plan, skipping");
                    continue;
                }
                Self::add_edge(&mut nodes, dep.clone());
            }
        }

        let graph = Self { nodes };
        graph.detect_cycle()?;
        Ok(graph)
    }

    fn add_edge(nodes: &mut HashMap<String, Node>, dep: Dependency) {
        let pred_id = dep.predecessor_id.clone();
        let succ_id = dep.successor_id.clone();
        if let Some(n) = nodes.get_mut(&succ_id) {
            n.predecessors.retain(|(id, _)| id != &pred_id);
            n.predecessors.push((pred_id.clone(), dep.clone()));
        }
        if let Some(n) = nodes.get_mut(&pred_id) {
            n.successors.retain(|(id, _)| id != &succ_id);
            n.successors.push((succ_id.clone(), dep));
        }
    }

    /// DFS with a recursion stack; any back edge raises `TaskflowError::Cycle`
    /// naming the task where the back edge was found (spec §4.D).
    fn detect_cycle(&self) -> Result<(), TaskflowError> {
        let mut marks: HashMap<&str, MarkState> = HashMap::new();

        let mut ids: Vec<&str> = self.nodes.keys().map(|s| s.as_str()).collect();
        ids.sort_unstable();

        for start in ids {
            if marks.contains_key(start) {
                continue;
            }
            self.visit(start, &mut marks)?;
        }
        Ok(())
    }

    fn visit<'a>(
        &'a self,
        id: &'a str,
        marks: &mut HashMap<&'a str, MarkState>,
    ) -> Result<(), TaskflowError> {
        marks.insert(id, MarkState::Visiting);
        if let Some(node) = self.nodes.get(id) {
            let mut succ_ids: Vec<&str> = node.successors.iter().map(|(s, _)| s.as_str()).collect();
            succ_ids.sort_unstable();
            for succ in succ_ids {
                match marks.get(succ) {
                    Some(MarkState::Visiting) => {
                        return Err(TaskflowError::Cycle {
                            task_id: succ.to_string(),
                        });
                    }
                    Some(MarkState::Done) => continue,
                    None => self.visit(succ, marks)?,
                }
            }
        }
        marks.insert(id, MarkState::Done);
        Ok(())
    }

    /// Topological order via Kahn's algorithm, ties broken lexicographically
    /// by id so output is independent of hash-map iteration order (spec §5).
    pub fn topological_order(&self) -> Vec<String> {
        let mut in_degree: HashMap<&str, usize> = self
            .nodes
            .iter()
            .map(|(id, n)| (id.as_str(), n.in_degree()))
            .collect();

        let mut ready: std::collections::BTreeSet<String> = in_degree
            .iter()
            .filter(|(_, &d)| d == 0)
            .map(|(id, _)| id.to_string())
            .collect();

        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(id) = ready.iter().next().cloned() {
            ready.remove(&id);
            order.push(id.clone());
            if let Some(node) = self.nodes.get(&id) {
                for (succ, _) in &node.successors {
                    if let Some(d) = in_degree.get_mut(succ.as_str()) {
                        *d -= 1;
                        if *d == 0 {
                            ready.insert(succ.clone());
                        }
                    }
                }
            }
        }
        order
    }

    pub fn sources(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .nodes
            .values()
            .filter(|n| n.in_degree() == 0)
            .map(|n| n.task_id.as_str())
            .collect();
        ids.sort_unstable();
        ids
    }

    pub fn sinks(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .nodes
            .values()
            .filter(|n| n.out_degree() == 0)
            .map(|n| n.task_id.as_str())
            .collect();
        ids.sort_unstable();
        ids
    }
}

#[derive(Clone, Copy, PartialEq)]
enum MarkState {
    Visiting,
    Done,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Priority, TaskStatus, TaskType};

    fn task(id: &str, deps: &[&str]) -> Task {
        Task {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            status: TaskStatus::NotStarted,
            priority: Priority::Medium,
            kind: TaskType::Feature,
            dependencies: deps.iter().map(|s| s.to_string()).collect(),
            dependency_relations: vec![],
            estimated_hours: 1.0,
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
    fn acyclic_chain_builds_and_orders_topologically() {
        let tasks = vec![task("A", &[]), task("B", &["A"]), task("C", &["B"])];
        let graph = DependencyGraph::build(&tasks).unwrap();
        assert_eq!(graph.topological_order(), vec!["A", "B", "C"]);
    }

    #[test]
    fn direct_cycle_is_detected() {
        let tasks = vec![task("A", &["B"]), task("B", &["A"])];
        let err = DependencyGraph::build(&tasks).unwrap_err();
        assert!(matches!(err, TaskflowError::Cycle { .. }));
    }

    #[test]
    fn self_loop_in_dependency_relations_is_rejected() {
        use crate::model::Dependency;
        let mut a = task("A", &[]);
        a.dependency_relations.push(Dependency::legacy_finish_to_start("A", "A"));
        let err = DependencyGraph::build(&[a]).unwrap_err();
        assert!(matches!(err, TaskflowError::Validation { .. }));
    }

    #[test]
    fn unknown_legacy_dependency_is_skipped_not_fatal() {
        let tasks = vec![task("A", &["ghost"])];
        let graph = DependencyGraph::build(&tasks).unwrap();
        assert_eq!(graph.nodes["A"].in_degree(), 0);
    }
}
