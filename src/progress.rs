use crate::models::{round_to_i64, safe_percent, DailyRecord, Goals, Metric};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Banding thresholds for "cap" style metrics such as calories
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressConfig {
    /// Percent at or above which a metric is "near" its goal (default: 80)
    pub near_threshold: i64,

    /// Percent at or above which a metric is "over" its goal (default: 100)
    pub over_threshold: i64,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        ProgressConfig {
            near_threshold: 80,
            over_threshold: 100,
        }
    }
}

/// Progress band for a current/goal pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    Under,
    Near,
    Over,
}

impl ProgressStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ProgressStatus::Under => "under",
            ProgressStatus::Near => "near",
            ProgressStatus::Over => "over",
        }
    }
}

/// Progress of one metric towards its daily goal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalProgress {
    pub metric: Metric,
    pub current: Decimal,
    pub goal: Decimal,

    /// Unclamped percent of goal, may exceed 100
    pub percent: i64,

    /// Percent clamped to [0, 100] for progress bars
    pub display_percent: i64,

    pub status: ProgressStatus,
}

/// Percent-of-goal calculator
#[derive(Debug, Clone, Default)]
pub struct GoalProgressTracker {
    config: ProgressConfig,
}

impl GoalProgressTracker {
    /// Create tracker with default thresholds
    pub fn new() -> Self {
        GoalProgressTracker {
            config: ProgressConfig::default(),
        }
    }

    /// Create tracker with custom thresholds
    pub fn with_config(config: ProgressConfig) -> Self {
        GoalProgressTracker { config }
    }

    /// Rounded percent of goal. Returns 0 when there is no target.
    pub fn compute_progress(current: Decimal, goal: Decimal) -> i64 {
        if !Goals::has_target(goal) {
            return 0;
        }
        round_to_i64(safe_percent(current.max(Decimal::ZERO), goal))
    }

    /// Clamp a raw percent for display
    pub fn display_percent(percent: i64) -> i64 {
        percent.clamp(0, 100)
    }

    /// Band a raw percent
    pub fn status_band(&self, percent: i64) -> ProgressStatus {
        if percent >= self.config.over_threshold {
            ProgressStatus::Over
        } else if percent >= self.config.near_threshold {
            ProgressStatus::Near
        } else {
            ProgressStatus::Under
        }
    }

    /// Full progress record for a single metric
    pub fn track(&self, metric: Metric, current: Decimal, goal: Decimal) -> GoalProgress {
        let percent = Self::compute_progress(current, goal);
        GoalProgress {
            metric,
            current,
            goal,
            percent,
            display_percent: Self::display_percent(percent),
            status: self.status_band(percent),
        }
    }

    /// Progress for every nutrient goal of one day
    pub fn daily_progress(&self, record: &DailyRecord, goals: &Goals) -> Vec<GoalProgress> {
        let progress: Vec<GoalProgress> = Metric::NUTRIENTS
            .iter()
            .map(|&metric| self.track(metric, record.value(metric), goals.goal_for(metric)))
            .collect();

        tracing::debug!(
            date = %record.date,
            metrics = progress.len(),
            "Computed daily goal progress"
        );
        progress
    }
}
