//! Component G: deterministic risk scoring over the scheduled task set (spec §4.G).

use crate::model::{risk::RiskCategory, RiskAssessment, RiskFactor, ResourceUtilization, Task};

const CRITICAL_PATH_RATIO_THRESHOLD: f64 = 0.3;
const LONG_DURATION_HOURS: f64 = 40.0;
const COMPLEXITY_THRESHOLD: f64 = 7.0;
const LOW_REVIEW_RATIO_THRESHOLD: f64 = 0.5;
const CONTINGENCY_SCORE_THRESHOLD: f64 = 4.0;

/// Score the plan's risk profile. `resource_utilization` is the output of the
/// orchestrator's resource-leveling step (empty if that step was disabled).
pub fn analyze(tasks: &[Task], resource_utilization: &[ResourceUtilization]) -> RiskAssessment {
    let mut factors = Vec::new();

    if let Some(f) = critical_path_risk(tasks) {
        factors.push(f);
    }
    if let Some(f) = long_duration_risk(tasks) {
        factors.push(f);
    }
    if let Some(f) = resource_overallocation_risk(resource_utilization) {
        factors.push(f);
    }
    if let Some(f) = technical_complexity_risk(tasks) {
        factors.push(f);
    }
    if let Some(f) = quality_review_risk(tasks) {
        factors.push(f);
    }

    let overall_risk_level = if factors.is_empty() {
        0.0
    } else {
        factors.iter().map(|f| f.risk_score).sum::<f64>() / factors.len() as f64
    };

    let mitigation_suggestions = factors.iter().map(|f| mitigation_for(f)).collect();
    let contingency_plans = factors
        .iter()
        .filter(|f| f.risk_score > CONTINGENCY_SCORE_THRESHOLD)
        .map(|f| contingency_for(f))
        .collect();

    RiskAssessment {
        overall_risk_level,
        risk_factors: factors,
        mitigation_suggestions,
        contingency_plans,
    }
}

fn critical_path_risk(tasks: &[Task]) -> Option<RiskFactor> {
    if tasks.is_empty() {
        return None;
    }
    let critical: Vec<String> = tasks.iter().filter(|t| t.is_critical()).map(|t| t.id.clone()).collect();
    let ratio = critical.len() as f64 / tasks.len() as f64;
    if ratio <= CRITICAL_PATH_RATIO_THRESHOLD {
        return None;
    }
    Some(RiskFactor::new(
        "critical-path-risk",
        format!(
            "{:.0}% of tasks are on the critical path; any slip there delays the whole plan",
            ratio * 100.0
        ),
        0.7,
        8.0,
        critical,
        RiskCategory::Schedule,
    ))
}

fn long_duration_risk(tasks: &[Task]) -> Option<RiskFactor> {
    let long: Vec<String> = tasks
        .iter()
        .filter(|t| t.duration_hours() > LONG_DURATION_HOURS)
        .map(|t| t.id.clone())
        .collect();
    if long.is_empty() {
        return None;
    }
    Some(RiskFactor::new(
        "long-duration-risk",
        format!("{} task(s) exceed {LONG_DURATION_HOURS}h and are hard to estimate reliably", long.len()),
        0.5,
        6.0,
        long,
        RiskCategory::Schedule,
    ))
}

fn resource_overallocation_risk(utilization: &[ResourceUtilization]) -> Option<RiskFactor> {
    let overallocated: Vec<&ResourceUtilization> = utilization.iter().filter(|r| r.is_overallocated()).collect();
    if overallocated.is_empty() {
        return None;
    }
    let affected: Vec<String> = overallocated
        .iter()
        .flat_map(|r| r.task_ids.iter().cloned())
        .collect();
    let names: Vec<&str> = overallocated.iter().map(|r| r.resource_name.as_str()).collect();
    Some(RiskFactor::new(
        "resource-overallocation-risk",
        format!("resource(s) over-allocated beyond capacity: {}", names.join(", ")),
        0.8,
        7.0,
        affected,
        RiskCategory::Resource,
    ))
}

fn technical_complexity_risk(tasks: &[Task]) -> Option<RiskFactor> {
    let complex: Vec<String> = tasks
        .iter()
        .filter(|t| t.orchestration_metadata.map(|m| m.complexity > COMPLEXITY_THRESHOLD).unwrap_or(false))
        .map(|t| t.id.clone())
        .collect();
    if complex.is_empty() {
        return None;
    }
    Some(RiskFactor::new(
        "technical-complexity-risk",
        format!("{} task(s) have complexity above {COMPLEXITY_THRESHOLD}", complex.len()),
        0.6,
        7.0,
        complex,
        RiskCategory::Technical,
    ))
}

fn quality_review_risk(tasks: &[Task]) -> Option<RiskFactor> {
    if tasks.is_empty() {
        return None;
    }
    let unreviewed: Vec<String> = tasks
        .iter()
        .filter(|t| t.orchestration_metadata.map(|m| !m.requires_review).unwrap_or(false))
        .map(|t| t.id.clone())
        .collect();
    let ratio = unreviewed.len() as f64 / tasks.len() as f64;
    if ratio <= LOW_REVIEW_RATIO_THRESHOLD {
        return None;
    }
    Some(RiskFactor::new(
        "quality-review-risk",
        format!("{:.0}% of tasks are explicitly marked as not requiring review", ratio * 100.0),
        0.4,
        6.0,
        unreviewed,
        RiskCategory::Quality,
    ))
}

fn mitigation_for(factor: &RiskFactor) -> String {
    match factor.category {
        RiskCategory::Schedule => {
            "Add schedule buffer on the critical path and track float consumption weekly.".to_string()
        }
        RiskCategory::Resource => {
            "Re-balance allocations or source additional capacity for the over-subscribed resource(s).".to_string()
        }
        RiskCategory::Technical => {
            "Schedule a technical spike and pair high-complexity tasks with a senior reviewer.".to_string()
        }
        RiskCategory::Quality => {
            "Expand review coverage and increase QA sampling on the affected tasks.".to_string()
        }
        RiskCategory::External => "Identify an external point of contact and confirm lead times in advance.".to_string(),
        RiskCategory::Communication => {
            "Add a recurring sync for the affected tasks' owners.".to_string()
        }
    }
}

fn contingency_for(factor: &RiskFactor) -> String {
    format!(
        "If '{}' materializes, re-sequence affected tasks ({}) and notify stakeholders immediately.",
        factor.name,
        factor.affected_task_ids.len()
    )
}
