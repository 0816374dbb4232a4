use crate::models::{
    round_half_up, round_to_i64, safe_add, safe_percent, safe_sum, DailyRecord, Metric,
};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// How a metric's half averages are rounded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendPrecision {
    /// Averages rounded to whole units before the percent change
    Integer,
    /// Ratio kept to `dp` decimals for display, percent change from the raw rate
    Rate { dp: u32 },
}

impl TrendPrecision {
    /// Default precision per metric: counts are rates, nutrients are integers
    pub fn for_metric(metric: Metric) -> Self {
        match metric {
            Metric::WorkoutsCompleted | Metric::WorkoutsPlanned => TrendPrecision::Rate { dp: 2 },
            _ => TrendPrecision::Integer,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendDirection {
    Increasing,
    Stable,
    Decreasing,
}

/// Half-over-half comparison of one metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendResult {
    pub metric: Metric,
    pub first_half_avg: Decimal,
    pub second_half_avg: Decimal,
    pub percent_change: i64,

    /// Raw per-day values in series order, for sparklines
    pub series: Vec<Decimal>,
}

impl TrendResult {
    fn empty(metric: Metric) -> Self {
        TrendResult {
            metric,
            first_half_avg: Decimal::ZERO,
            second_half_avg: Decimal::ZERO,
            percent_change: 0,
            series: Vec::new(),
        }
    }

    pub fn direction(&self) -> TrendDirection {
        match self.percent_change {
            c if c > 0 => TrendDirection::Increasing,
            c if c < 0 => TrendDirection::Decreasing,
            _ => TrendDirection::Stable,
        }
    }

    pub fn has_data(&self) -> bool {
        !self.series.is_empty()
    }
}

/// Trend summary for the standard summary cards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSummary {
    pub day_count: usize,
    pub calories: TrendResult,
    pub protein: TrendResult,
    pub workouts: TrendResult,
}

impl TrendSummary {
    pub fn is_empty(&self) -> bool {
        self.day_count == 0
    }
}

/// Completed vs planned workouts over a series
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutCompletion {
    pub total_completed: u64,
    pub total_planned: u64,
    /// Rounded percent of planned workouts completed, 0 when nothing was planned
    pub completion_rate: i64,
}

/// Splits a day-series into an older and a newer half and compares them.
///
/// `half = max(1, n / 2)`, so a single day lands entirely in the first half
/// and the second half averages to zero. That produces a -100% change for any
/// non-zero value; callers that show the delta should treat `day_count < 2`
/// as "not enough data".
#[derive(Debug, Clone, Default)]
pub struct TrendSynthesizer;

impl TrendSynthesizer {
    pub fn new() -> Self {
        TrendSynthesizer
    }

    /// Index splitting the series into its two halves
    pub fn split_index(len: usize) -> usize {
        (len / 2).max(1).min(len)
    }

    /// Calories, protein and workouts-per-day trends
    pub fn synthesize(&self, records: &[DailyRecord]) -> TrendSummary {
        let summary = TrendSummary {
            day_count: records.len(),
            calories: self.synthesize_metric(records, Metric::Calories),
            protein: self.synthesize_metric(records, Metric::Protein),
            workouts: self.synthesize_metric(records, Metric::WorkoutsCompleted),
        };

        tracing::debug!(
            days = summary.day_count,
            calories_change = summary.calories.percent_change,
            protein_change = summary.protein.percent_change,
            workouts_change = summary.workouts.percent_change,
            "Synthesized trends"
        );

        summary
    }

    /// Trend of a single metric with its default precision
    pub fn synthesize_metric(&self, records: &[DailyRecord], metric: Metric) -> TrendResult {
        self.synthesize_with_precision(records, metric, TrendPrecision::for_metric(metric))
    }

    pub fn synthesize_with_precision(
        &self,
        records: &[DailyRecord],
        metric: Metric,
        precision: TrendPrecision,
    ) -> TrendResult {
        if records.is_empty() {
            return TrendResult::empty(metric);
        }

        let series: Vec<Decimal> = records.iter().map(|r| r.value(metric)).collect();
        let (first, second) = series.split_at(Self::split_index(series.len()));

        let first_avg = Self::average(first);
        let second_avg = Self::average(second);

        let (first_half_avg, second_half_avg, percent_change) = match precision {
            TrendPrecision::Integer => {
                let first_avg = round_half_up(first_avg);
                let second_avg = round_half_up(second_avg);
                (first_avg, second_avg, Self::percent_change(first_avg, second_avg))
            }
            TrendPrecision::Rate { dp } => (
                first_avg.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero),
                second_avg.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero),
                Self::percent_change(first_avg, second_avg),
            ),
        };

        if second.is_empty() {
            tracing::trace!(%metric, "Second half empty, percent change against zero baseline");
        }

        TrendResult {
            metric,
            first_half_avg,
            second_half_avg,
            percent_change,
            series,
        }
    }

    /// `sum / max(1, count)`
    pub fn average(values: &[Decimal]) -> Decimal {
        safe_sum(values.iter().copied()) / Decimal::from(values.len().max(1))
    }

    /// Rounded percent change from `first` to `second`, 0 unless `first` is positive
    pub fn percent_change(first: Decimal, second: Decimal) -> i64 {
        round_to_i64(safe_percent(safe_add(second, -first), first))
    }

    /// Totals for the completed/planned bar chart
    pub fn workout_completion(&self, records: &[DailyRecord]) -> WorkoutCompletion {
        let total_completed: u64 = records.iter().map(|r| u64::from(r.workouts_completed)).sum();
        let total_planned: u64 = records.iter().map(|r| u64::from(r.workouts_planned)).sum();
        let completion_rate = round_to_i64(safe_percent(
            Decimal::from(total_completed),
            Decimal::from(total_planned),
        ));

        WorkoutCompletion {
            total_completed,
            total_planned,
            completion_rate,
        }
    }
}
