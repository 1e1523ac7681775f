//! Orchestration configuration, presets, and preset recommendation (spec §3
//! "OrchestrationConfig", §4.H "Presets").

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulingStrategy {
    CriticalPath,
    PriorityFirst,
    ShortestFirst,
    LongestFirst,
    EarlyStart,
    /// Declared but not specialized in the source this was distilled from;
    /// treated as an alias of [`SchedulingStrategy::CriticalPath`] (spec §9).
    ResourceLeveling,
    /// Same alias note as [`SchedulingStrategy::ResourceLeveling`].
    LateStart,
}

/// What the orchestrator should prioritize when more than one ordering is
/// defensible. Not enumerated by name in the distilled spec's `optimizationGoal`
/// field; this is the resolution of that open question (see DESIGN.md).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationGoal {
    MinimizeDuration,
    MinimizeCost,
    MaximizeQuality,
    BalanceAll,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationConfig {
    pub enable_critical_path: bool,
    pub enable_parallel_optimization: bool,
    pub enable_resource_leveling: bool,
    pub enable_risk_analysis: bool,
    pub scheduling_strategy: SchedulingStrategy,
    pub optimization_goal: OptimizationGoal,
    pub max_parallel_tasks: usize,
    pub working_hours_per_day: f64,
    pub working_days_per_week: f64,
    /// In `[0, 1]`.
    pub buffer_percentage: f64,
    /// When true, a negative total float (spec §4.J) is a fatal
    /// [`crate::error::TaskflowError::Scheduling`] instead of a flagged
    /// infeasibility.
    pub strict_scheduling: bool,
}

impl Default for OrchestrationConfig {
    fn default() -> Self {
        Self {
            enable_critical_path: true,
            enable_parallel_optimization: true,
            enable_resource_leveling: true,
            enable_risk_analysis: true,
            scheduling_strategy: SchedulingStrategy::CriticalPath,
            optimization_goal: OptimizationGoal::BalanceAll,
            max_parallel_tasks: 5,
            working_hours_per_day: 8.0,
            working_days_per_week: 5.0,
            // 0.0 so `total_duration` equals the raw CPM project duration
            // unless a preset or override opts into a buffer (spec S1-S3
            // expect totalDuration == project duration under default config).
            buffer_percentage: 0.0,
            strict_scheduling: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    AgileSprint,
    Waterfall,
    CriticalChain,
    LeanStartup,
    RapidPrototype,
    Enterprise,
    Research,
    Maintenance,
}

impl OrchestrationConfig {
    /// A fixed, partial configuration for a named preset, layered over
    /// [`OrchestrationConfig::default`] (spec §4.H "Presets").
    pub fn from_preset(preset: Preset) -> Self {
        let base = Self::default();
        match preset {
            Preset::AgileSprint => Self {
                scheduling_strategy: SchedulingStrategy::PriorityFirst,
                max_parallel_tasks: 3,
                buffer_percentage: 0.15,
                optimization_goal: OptimizationGoal::MinimizeDuration,
                ..base
            },
            Preset::Waterfall => Self {
                scheduling_strategy: SchedulingStrategy::CriticalPath,
                enable_parallel_optimization: false,
                max_parallel_tasks: 1,
                buffer_percentage: 0.2,
                optimization_goal: OptimizationGoal::MinimizeCost,
                ..base
            },
            Preset::CriticalChain => Self {
                scheduling_strategy: SchedulingStrategy::CriticalPath,
                enable_resource_leveling: true,
                buffer_percentage: 0.25,
                optimization_goal: OptimizationGoal::BalanceAll,
                ..base
            },
            Preset::LeanStartup => Self {
                scheduling_strategy: SchedulingStrategy::EarlyStart,
                buffer_percentage: 0.05,
                enable_risk_analysis: false,
                optimization_goal: OptimizationGoal::MinimizeDuration,
                ..base
            },
            Preset::RapidPrototype => Self {
                scheduling_strategy: SchedulingStrategy::ShortestFirst,
                enable_risk_analysis: false,
                enable_resource_leveling: false,
                buffer_percentage: 0.0,
                max_parallel_tasks: 8,
                optimization_goal: OptimizationGoal::MinimizeDuration,
                ..base
            },
            Preset::Enterprise => Self {
                scheduling_strategy: SchedulingStrategy::CriticalPath,
                enable_resource_leveling: true,
                enable_risk_analysis: true,
                buffer_percentage: 0.3,
                max_parallel_tasks: 10,
                optimization_goal: OptimizationGoal::MaximizeQuality,
                ..base
            },
            Preset::Research => Self {
                scheduling_strategy: SchedulingStrategy::CriticalPath,
                enable_parallel_optimization: false,
                buffer_percentage: 0.2,
                optimization_goal: OptimizationGoal::MaximizeQuality,
                ..base
            },
            Preset::Maintenance => Self {
                scheduling_strategy: SchedulingStrategy::PriorityFirst,
                max_parallel_tasks: 2,
                buffer_percentage: 0.1,
                optimization_goal: OptimizationGoal::MinimizeCost,
                ..base
            },
        }
    }

    /// Apply user overrides on top of a preset or the default config.
    pub fn merge(self, overrides: OrchestrationConfigOverrides) -> Self {
        overrides.apply(self)
    }
}

/// Sparse overrides applied on top of a base [`OrchestrationConfig`] (usually
/// a preset) — every field is optional so only the caller's explicit choices
/// take effect.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct OrchestrationConfigOverrides {
    pub enable_critical_path: Option<bool>,
    pub enable_parallel_optimization: Option<bool>,
    pub enable_resource_leveling: Option<bool>,
    pub enable_risk_analysis: Option<bool>,
    pub scheduling_strategy: Option<SchedulingStrategy>,
    pub optimization_goal: Option<OptimizationGoal>,
    pub max_parallel_tasks: Option<usize>,
    pub working_hours_per_day: Option<f64>,
    pub working_days_per_week: Option<f64>,
    pub buffer_percentage: Option<f64>,
    pub strict_scheduling: Option<bool>,
}

impl OrchestrationConfigOverrides {
    fn apply(self, base: OrchestrationConfig) -> OrchestrationConfig {
        OrchestrationConfig {
            enable_critical_path: self.enable_critical_path.unwrap_or(base.enable_critical_path),
            enable_parallel_optimization: self
                .enable_parallel_optimization
                .unwrap_or(base.enable_parallel_optimization),
            enable_resource_leveling: self.enable_resource_leveling.unwrap_or(base.enable_resource_leveling),
            enable_risk_analysis: self.enable_risk_analysis.unwrap_or(base.enable_risk_analysis),
            scheduling_strategy: self.scheduling_strategy.unwrap_or(base.scheduling_strategy),
            optimization_goal: self.optimization_goal.unwrap_or(base.optimization_goal),
            max_parallel_tasks: self.max_parallel_tasks.unwrap_or(base.max_parallel_tasks),
            working_hours_per_day: self.working_hours_per_day.unwrap_or(base.working_hours_per_day),
            working_days_per_week: self.working_days_per_week.unwrap_or(base.working_days_per_week),
            buffer_percentage: self.buffer_percentage.unwrap_or(base.buffer_percentage),
            strict_scheduling: self.strict_scheduling.unwrap_or(base.strict_scheduling),
        }
    }
}

/// Inputs to [`recommend_preset`] — characteristics a caller already knows
/// about their project (team size, timeline, risk posture) before any task
/// has been scheduled.
#[derive(Debug, Clone, Copy)]
pub struct ProjectCharacteristics {
    pub team_size: usize,
    pub duration_days: f64,
    /// In `[0, 1]`: how unpredictable requirements/scope are.
    pub uncertainty: f64,
    /// In `[0, 1]`: how strict the quality bar is.
    pub quality_requirement: f64,
    pub time_constrained: bool,
    pub budget_constrained: bool,
}

/// Map project characteristics to a preset via a documented rule cascade
/// (spec §4.H). Rules are evaluated in order; the first match wins.
pub fn recommend_preset(c: ProjectCharacteristics) -> Preset {
    if c.team_size <= 3 && c.duration_days <= 14.0 {
        Preset::RapidPrototype
    } else if c.uncertainty >= 0.7 && c.quality_requirement < 0.5 {
        Preset::LeanStartup
    } else if c.uncertainty >= 0.6 {
        Preset::Research
    } else if c.team_size >= 20 || (c.quality_requirement >= 0.8 && !c.budget_constrained) {
        Preset::Enterprise
    } else if c.budget_constrained && !c.time_constrained && c.duration_days >= 60.0 {
        Preset::Waterfall
    } else if c.duration_days >= 120.0 {
        Preset::Maintenance
    } else if c.team_size <= 8 && c.duration_days <= 30.0 {
        Preset::AgileSprint
    } else {
        Preset::CriticalChain
    }
}
