//! Risk scoring types produced by the risk analyzer (spec §3 "RiskFactor", §4.G).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    Technical,
    Resource,
    Schedule,
    Quality,
    External,
    Communication,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskFactor {
    pub id: String,
    pub name: String,
    pub description: String,
    /// In `[0, 1]`.
    pub probability: f64,
    /// In `[1, 10]`.
    pub impact: f64,
    /// `probability * impact`, clipped to `[0, 10]`.
    pub risk_score: f64,
    pub affected_task_ids: Vec<String>,
    pub category: RiskCategory,
}

impl RiskFactor {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        probability: f64,
        impact: f64,
        affected_task_ids: Vec<String>,
        category: RiskCategory,
    ) -> Self {
        let risk_score = (probability * impact).clamp(0.0, 10.0);
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            description: description.into(),
            probability,
            impact,
            risk_score,
            affected_task_ids,
            category,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RiskAssessment {
    /// Mean `risk_score` across `risk_factors`; 0 when empty.
    pub overall_risk_level: f64,
    pub risk_factors: Vec<RiskFactor>,
    pub mitigation_suggestions: Vec<String>,
    pub contingency_plans: Vec<String>,
}

impl RiskAssessment {
    pub fn empty() -> Self {
        Self::default()
    }
}
