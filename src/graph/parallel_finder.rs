//! Component F: groups of tasks that can run concurrently, time-bucketed by
//! earliest start and filtered by resource conflict (spec §4.F).

use std::collections::HashMap;

use crate::model::{ParallelGroup, Task, TimeInfo, CPM_EPSILON};

/// Find parallel-execution groups given CPM times.
///
/// Tasks are bucketed by identical `earliest_start` (within [`CPM_EPSILON`]).
/// Within a bucket, candidates are considered in id order and greedily added
/// to a single group for that bucket as long as the task is not explicitly
/// non-parallelizable, the group has not yet reached `max_parallel_tasks`,
/// and adding it introduces no human-resource conflict (spec §4.F, §9: name
/// matching, human resources only). A bucket emits a group only if at least
/// two tasks were selected; leftover candidates in an over-full or
/// conflicting bucket are simply not grouped.
pub fn find_parallel_groups(
    tasks: &[Task],
    times: &HashMap<String, TimeInfo>,
    max_parallel_tasks: usize,
) -> Vec<ParallelGroup> {
    let mut with_es: Vec<(&Task, f64)> = tasks
        .iter()
        .filter_map(|t| times.get(&t.id).map(|ti| (t, ti.earliest_start)))
        .collect();
    with_es.sort_by(|(a, a_es), (b, b_es)| {
        a_es.partial_cmp(b_es).unwrap_or(std::cmp::Ordering::Equal).then_with(|| a.id.cmp(&b.id))
    });

    let mut groups = Vec::new();
    let mut i = 0;
    while i < with_es.len() {
        let bucket_es = with_es[i].1;
        let mut j = i;
        while j < with_es.len() && (with_es[j].1 - bucket_es).abs() <= CPM_EPSILON {
            j += 1;
        }
        let bucket = &with_es[i..j];

        let mut selected: Vec<&Task> = Vec::new();
        for (task, _) in bucket {
            if !task.is_parallelizable() {
                continue;
            }
            if selected.len() >= max_parallel_tasks {
                break;
            }
            let conflicts = selected.iter().any(|member| has_human_resource_conflict(member, task));
            if conflicts {
                continue;
            }
            selected.push(task);
        }

        if selected.len() >= 2 {
            groups.push(build_group(&selected, bucket_es));
        }
        i = j;
    }

    groups
}

fn has_human_resource_conflict(a: &Task, b: &Task) -> bool {
    a.human_resources()
        .any(|ra| b.human_resources().any(|rb| ra.conflicts_with(rb)))
}

fn build_group(selected: &[&Task], _bucket_es: f64) -> ParallelGroup {
    let task_ids: Vec<String> = selected.iter().map(|t| t.id.clone()).collect();
    let duration = selected.iter().map(|t| t.duration_hours()).fold(0.0_f64, f64::max);

    let mut required_resources: Vec<String> = selected
        .iter()
        .flat_map(|t| t.resource_requirements.iter().map(|r| r.name.clone()))
        .collect();
    required_resources.sort_unstable();
    required_resources.dedup();

    ParallelGroup {
        task_ids,
        duration,
        required_resources,
        conflict_risk: conflict_risk(selected),
    }
}

/// Rises with shared tags ("skills") across the group and with task-type
/// homogeneity; clipped to `[0, 1]` (spec §4.F.4).
fn conflict_risk(selected: &[&Task]) -> f64 {
    let n = selected.len();
    if n < 2 {
        return 0.0;
    }

    let mut tag_counts: HashMap<&str, usize> = HashMap::new();
    let mut total_tags = 0usize;
    for t in selected {
        for tag in &t.tags {
            *tag_counts.entry(tag.as_str()).or_insert(0) += 1;
            total_tags += 1;
        }
    }
    let shared_tags: usize = tag_counts.values().filter(|&&c| c > 1).sum();
    let skill_overlap = if total_tags == 0 {
        0.0
    } else {
        shared_tags as f64 / total_tags as f64
    };

    let distinct_kinds: std::collections::HashSet<_> = selected.iter().map(|t| t.kind).collect();
    let type_homogeneity = 1.0 - (distinct_kinds.len() as f64 - 1.0) / (n as f64 - 1.0).max(1.0);

    ((skill_overlap + type_homogeneity) / 2.0).clamp(0.0, 1.0)
}
