//! Component E: the Critical Path Method engine — forward pass, backward
//! pass, float, and critical-path marking (spec §4.E).

use std::collections::HashMap;

use crate::error::TaskflowError;
use crate::graph::dependency_graph::DependencyGraph;
use crate::model::{DependencyType, Task, TimeInfo, CPM_EPSILON};

#[derive(Debug, Clone, Default)]
pub struct CpmResult {
    pub times: HashMap<String, TimeInfo>,
    /// `max(EF)` over sink tasks — the project's minimum duration.
    pub project_duration: f64,
    /// Task ids with `total_float == 0` (within epsilon), id-sorted.
    pub critical_path: Vec<String>,
}

/// Run the forward pass, backward pass, and float calculation over `graph`.
///
/// `strict` controls whether a negative total float (an infeasible schedule,
/// spec §4.J) is returned as a fatal [`TaskflowError::Scheduling`] or merely
/// tolerated (the float is still reported, un-clamped, so the caller can see it).
pub fn run(graph: &DependencyGraph, tasks: &[Task], strict: bool) -> Result<CpmResult, TaskflowError> {
    let durations: HashMap<&str, f64> = tasks.iter().map(|t| (t.id.as_str(), t.duration_hours())).collect();
    let duration_of = |id: &str| -> f64 { *durations.get(id).unwrap_or(&8.0) };

    let topo = graph.topological_order();

    // ---- forward pass: ES/EF ----
    let mut es: HashMap<String, f64> = HashMap::new();
    let mut ef: HashMap<String, f64> = HashMap::new();

    for id in &topo {
        let node = &graph.nodes[id];
        let dur = duration_of(id);
        let start = if node.predecessors.is_empty() {
            0.0
        } else {
            node.predecessors
                .iter()
                .map(|(pred_id, dep)| {
                    let es_n = es[pred_id];
                    let ef_n = ef[pred_id];
                    forward_candidate(dep.kind, es_n, ef_n, dur, dep.lag_hours())
                })
                .fold(0.0_f64, f64::max)
        };
        es.insert(id.clone(), start);
        ef.insert(id.clone(), start + dur);
    }

    // Project duration is the latest finish across *all* tasks, not only
    // graph-theoretic sinks (out-degree 0): with SS/FF/SF edges a predecessor
    // can legitimately finish after its successors, so restricting to sinks
    // would understate the project length (see DESIGN.md, CPM backward-pass
    // seeding).
    let project_duration = ef.values().copied().fold(0.0_f64, f64::max);

    // ---- backward pass: LS/LF, processed in reverse topological order ----
    let mut ls: HashMap<String, f64> = HashMap::new();
    let mut lf: HashMap<String, f64> = HashMap::new();

    for id in topo.iter().rev() {
        let node = &graph.nodes[id];
        let dur = duration_of(id);
        let finish = if node.successors.is_empty() {
            project_duration
        } else {
            node.successors
                .iter()
                .map(|(succ_id, dep)| {
                    let ls_s = ls[succ_id];
                    let lf_s = lf[succ_id];
                    backward_candidate(dep.kind, ls_s, lf_s, dur, dep.lag_hours())
                })
                .fold(f64::INFINITY, f64::min)
        };
        lf.insert(id.clone(), finish);
        ls.insert(id.clone(), finish - dur);
    }

    // ---- float ----
    let mut times = HashMap::with_capacity(topo.len());
    let mut infeasible: Option<(String, f64)> = None;

    for id in &topo {
        let node = &graph.nodes[id];
        let total_float = ls[id] - es[id];
        let free_float = if node.successors.is_empty() {
            total_float
        } else {
            node.successors
                .iter()
                .map(|(succ_id, _)| es[succ_id])
                .fold(f64::INFINITY, f64::min)
                - ef[id]
        };
        let is_critical = total_float.abs() <= CPM_EPSILON;

        if total_float < -CPM_EPSILON && infeasible.is_none() {
            infeasible = Some((id.clone(), total_float));
        }

        times.insert(
            id.clone(),
            TimeInfo {
                earliest_start: es[id],
                latest_start: ls[id],
                earliest_finish: ef[id],
                latest_finish: lf[id],
                total_float,
                free_float,
                is_critical,
            },
        );
    }

    if strict {
        if let Some((task_id, total_float)) = infeasible {
            return Err(TaskflowError::Scheduling { task_id, total_float });
        }
    }

    let mut critical_path: Vec<String> = times
        .iter()
        .filter(|(_, t)| t.is_critical)
        .map(|(id, _)| id.clone())
        .collect();
    critical_path.sort_unstable();

    Ok(CpmResult {
        times,
        project_duration,
        critical_path,
    })
}

fn forward_candidate(kind: DependencyType, es_n: f64, ef_n: f64, dur_s: f64, lag: f64) -> f64 {
    match kind {
        DependencyType::FinishToStart => ef_n + lag,
        DependencyType::StartToStart => es_n + lag,
        DependencyType::FinishToFinish => ef_n - dur_s + lag,
        DependencyType::StartToFinish => es_n - dur_s + lag,
    }
}

fn backward_candidate(kind: DependencyType, ls_s: f64, lf_s: f64, dur_p: f64, lag: f64) -> f64 {
    match kind {
        DependencyType::FinishToStart => ls_s - lag,
        DependencyType::StartToStart => ls_s + dur_p - lag,
        DependencyType::FinishToFinish => lf_s - lag,
        DependencyType::StartToFinish => lf_s + dur_p - lag,
    }
}
