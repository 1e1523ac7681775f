//! Component B: the five router strategies that rank candidate models for a
//! request (spec §4.B). The router never calls a provider itself — it only
//! orders [`ModelConfig`]s; [`crate::gateway::gateway::ModelGateway`] walks
//! that order and cascades on failure.

use rand::seq::SliceRandom;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::gateway::gateway::ModelConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouterStrategy {
    Smart,
    Cost,
    Speed,
    Priority,
    Random,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Code,
    Reasoning,
    Vision,
    Function,
    General,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Low,
    Medium,
    High,
}

/// What the router knows about the request it's choosing a model for.
#[derive(Debug, Clone, Default)]
pub struct RoutingContext {
    pub prompt: String,
    pub required_capability: Option<Capability>,
    pub preferred_model_id: Option<String>,
    /// Caller-signaled time pressure; feeds the `smart` strategy's "urgent
    /// speed models" rule.
    pub urgent: bool,
}

/// Keyword table for the `smart` strategy's capability inference, shaped
/// like the teacher's `BACKEND_PRESETS` const table (`agent/provider.rs`).
const CAPABILITY_KEYWORDS: &[(&str, Capability)] = &[
    (r"\b(code|function|implement|debug|compile)\b", Capability::Code),
    (r"\b(analyze|think|reason|why|explain)\b", Capability::Reasoning),
    (r"\b(image|picture|photo|diagram|screenshot)\b", Capability::Vision),
];

fn compiled_keyword_patterns() -> Vec<(Regex, Capability)> {
    CAPABILITY_KEYWORDS
        .iter()
        .map(|(pattern, cap)| (Regex::new(&format!("(?i){pattern}")).expect("static pattern is valid regex"), *cap))
        .collect()
}

fn infer_capability(prompt: &str) -> Capability {
    for (re, cap) in compiled_keyword_patterns() {
        if re.is_match(prompt) {
            return cap;
        }
    }
    Capability::General
}

/// <200 chars → low, >2000 → high, otherwise medium.
fn derive_complexity(prompt: &str) -> Complexity {
    match prompt.chars().count() {
        n if n < 200 => Complexity::Low,
        n if n > 2000 => Complexity::High,
        _ => Complexity::Medium,
    }
}

enum SmartRule {
    Capability(Capability),
    LowComplexity,
    Urgent,
}

/// Fixed weight table for the `smart` strategy, shaped like the teacher's
/// `BACKEND_PRESETS` const table (`agent/provider.rs`): each row names the
/// condition it fires under and the model ids it rewards, in preference
/// order (first id scores highest within the row).
const SMART_WEIGHT_TABLE: &[(SmartRule, &[&str], i32)] = &[
    (SmartRule::Capability(Capability::Code), &["deepseek-coder", "gpt-4o", "claude-3-5-sonnet"], 10),
    (SmartRule::Capability(Capability::Reasoning), &["o1", "claude-3-opus", "qwen-plus"], 10),
    (SmartRule::Capability(Capability::Vision), &["gpt-4o", "claude-3-5-sonnet", "qwen-vl-plus"], 10),
    (SmartRule::Capability(Capability::Function), &["gpt-4o", "claude-3-5-sonnet", "deepseek-chat"], 8),
    (SmartRule::LowComplexity, &["gpt-4o-mini", "deepseek-chat", "glm-4-flash"], 5),
    (SmartRule::Urgent, &["gpt-4o-mini", "claude-3-5-haiku", "deepseek-chat"], 5),
];

/// Score a candidate model under the `smart` strategy's rule table: each row
/// whose condition matches `needed`/`complexity`/`urgent` contributes its
/// weight, scaled down by the model's rank within that row's preference list
/// (first-listed id scores the full weight, later ones less, ids not listed
/// score nothing for that row).
fn smart_score(model_id: &str, needed: Capability, complexity: Complexity, urgent: bool) -> i32 {
    SMART_WEIGHT_TABLE
        .iter()
        .filter(|row| match &row.0 {
            SmartRule::Capability(cap) => *cap == needed,
            SmartRule::LowComplexity => complexity == Complexity::Low,
            SmartRule::Urgent => urgent,
        })
        .filter_map(|row| row.1.iter().position(|&id| id == model_id).map(|rank| row.2 - rank as i32))
        .sum()
}

/// Rank `candidates` (already filtered to enabled models) for `context`
/// under `strategy`. The returned order is the cascade order: the gateway
/// tries index 0 first, then 1, and so on.
pub fn rank(strategy: RouterStrategy, mut candidates: Vec<ModelConfig>, context: &RoutingContext) -> Vec<ModelConfig> {
    if let Some(preferred) = &context.preferred_model_id {
        if let Some(pos) = candidates.iter().position(|c| &c.model_id == preferred) {
            let preferred = candidates.remove(pos);
            candidates.insert(0, preferred);
        }
    }

    match strategy {
        RouterStrategy::Smart => {
            let needed = context.required_capability.unwrap_or_else(|| infer_capability(&context.prompt));
            let complexity = derive_complexity(&context.prompt);
            candidates.sort_by(|a, b| {
                let a_score = smart_score(&a.model_id, needed, complexity, context.urgent);
                let b_score = smart_score(&b.model_id, needed, complexity, context.urgent);
                b_score.cmp(&a_score).then_with(|| a.priority.cmp(&b.priority)).then_with(|| a.model_id.cmp(&b.model_id))
            });
        }
        RouterStrategy::Cost => {
            // Missing pricing sorts last ("+inf"), per spec: a model with no
            // configured cost is not automatically the cheapest one.
            candidates.sort_by(|a, b| {
                let a_cost = match (a.cost_per_1k_prompt, a.cost_per_1k_completion) {
                    (Some(p), Some(c)) => p + c,
                    _ => f64::INFINITY,
                };
                let b_cost = match (b.cost_per_1k_prompt, b.cost_per_1k_completion) {
                    (Some(p), Some(c)) => p + c,
                    _ => f64::INFINITY,
                };
                a_cost.partial_cmp(&b_cost).unwrap_or(std::cmp::Ordering::Equal).then_with(|| a.model_id.cmp(&b.model_id))
            });
        }
        RouterStrategy::Speed => {
            candidates.sort_by(|a, b| {
                let a_latency = a.avg_latency_ms.unwrap_or(u64::MAX);
                let b_latency = b.avg_latency_ms.unwrap_or(u64::MAX);
                a_latency.cmp(&b_latency).then_with(|| a.priority.cmp(&b.priority)).then_with(|| a.model_id.cmp(&b.model_id))
            });
        }
        RouterStrategy::Priority => {
            candidates.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.model_id.cmp(&b.model_id)));
        }
        RouterStrategy::Random => {
            candidates.shuffle(&mut rand::thread_rng());
        }
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::gateway::ModelConfig;

    fn model(id: &str, priority: u8, cost: Option<f64>, latency_ms: Option<u64>, caps: &[Capability]) -> ModelConfig {
        ModelConfig {
            model_id: id.to_string(),
            provider: "openai".to_string(),
            display_name: id.to_string(),
            enabled: true,
            priority,
            capabilities: caps.to_vec(),
            cost_per_1k_prompt: cost,
            cost_per_1k_completion: cost,
            avg_latency_ms: latency_ms,
        }
    }

    #[test]
    fn smart_strategy_prefers_the_weight_tables_code_models() {
        let candidates = vec![
            model("unrelated-model", 1, None, None, &[Capability::Code]),
            model("deepseek-coder", 1, None, None, &[Capability::Code]),
        ];
        let ctx = RoutingContext { prompt: "please implement this function".into(), ..Default::default() };
        let ranked = rank(RouterStrategy::Smart, candidates, &ctx);
        assert_eq!(ranked[0].model_id, "deepseek-coder");
    }

    #[test]
    fn smart_strategy_breaks_score_ties_by_ascending_priority() {
        let candidates = vec![model("low-priority", 9, None, None, &[]), model("high-priority", 1, None, None, &[])];
        let ranked = rank(RouterStrategy::Smart, candidates, &RoutingContext::default());
        assert_eq!(ranked[0].model_id, "high-priority");
    }

    #[test]
    fn derive_complexity_buckets_by_prompt_length() {
        assert_eq!(derive_complexity(&"x".repeat(199)), Complexity::Low);
        assert_eq!(derive_complexity(&"x".repeat(2001)), Complexity::High);
        assert_eq!(derive_complexity("short but not tiny prompt text here"), Complexity::Medium);
    }

    #[test]
    fn cost_strategy_orders_ascending() {
        let candidates = vec![model("pricey", 1, Some(5.0), None, &[]), model("cheap", 1, Some(0.5), None, &[])];
        let ranked = rank(RouterStrategy::Cost, candidates, &RoutingContext::default());
        assert_eq!(ranked[0].model_id, "cheap");
    }

    #[test]
    fn cost_strategy_sorts_missing_pricing_last() {
        let candidates = vec![model("unpriced", 1, None, None, &[]), model("priced", 1, Some(100.0), None, &[])];
        let ranked = rank(RouterStrategy::Cost, candidates, &RoutingContext::default());
        assert_eq!(ranked[0].model_id, "priced");
        assert_eq!(ranked[1].model_id, "unpriced");
    }

    #[test]
    fn speed_strategy_treats_unknown_latency_as_worst() {
        let candidates = vec![model("unknown", 1, None, None, &[]), model("fast", 1, None, Some(100), &[])];
        let ranked = rank(RouterStrategy::Speed, candidates, &RoutingContext::default());
        assert_eq!(ranked[0].model_id, "fast");
    }

    #[test]
    fn priority_strategy_orders_ascending() {
        let candidates = vec![model("later", 9, None, None, &[]), model("first", 1, None, None, &[])];
        let ranked = rank(RouterStrategy::Priority, candidates, &RoutingContext::default());
        assert_eq!(ranked[0].model_id, "first");
    }

    #[test]
    fn preferred_model_always_wins_first_slot() {
        let candidates = vec![model("a", 1, Some(0.1), Some(1), &[]), model("b", 9, Some(9.0), Some(999), &[])];
        let ctx = RoutingContext { preferred_model_id: Some("b".to_string()), ..Default::default() };
        let ranked = rank(RouterStrategy::Priority, candidates, &ctx);
        assert_eq!(ranked[0].model_id, "b");
    }
}
