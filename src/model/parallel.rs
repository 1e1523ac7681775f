//! Parallel-execution groupings produced by the parallel-group finder (spec §4.F).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParallelGroup {
    pub task_ids: Vec<String>,
    pub duration: f64,
    pub required_resources: Vec<String>,
    /// In `[0, 1]`; rises with shared skills and type homogeneity across the group.
    pub conflict_risk: f64,
}
