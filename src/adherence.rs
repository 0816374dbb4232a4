//! Adherence score and streaks
//!
//! Consistency metrics over a day-series: a weighted 0-100 adherence score
//! (calories, protein, workouts, optionally blended with wearable activity)
//! and current streaks of days meeting each goal.

use crate::models::{round_to_i64, safe_add, safe_div, safe_mul, safe_sum, DailyRecord, Goals};
use chrono::{Days, NaiveDate};
use rust_decimal::prelude::*;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Weights and targets for the adherence score.
///
/// Calorie and protein targets come from the user's `Goals`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdherenceConfig {
    /// Planned workouts per week
    pub workouts_per_week: Decimal,

    pub calorie_weight: Decimal,
    pub protein_weight: Decimal,
    pub workout_weight: Decimal,

    /// Active minutes per day counted as full activity adherence
    pub active_minutes_target: Decimal,
    /// Share of wearable calories in the wearable sub-score
    pub wearable_calorie_weight: Decimal,
    /// Share of the wearable sub-score in the blended score
    pub wearable_weight: Decimal,
    /// Upper bound applied to `wearable_weight`
    pub max_wearable_weight: Decimal,
}

impl Default for AdherenceConfig {
    fn default() -> Self {
        AdherenceConfig {
            workouts_per_week: dec!(3),
            calorie_weight: dec!(0.4),
            protein_weight: dec!(0.3),
            workout_weight: dec!(0.3),
            active_minutes_target: dec!(30),
            wearable_calorie_weight: dec!(0.6),
            wearable_weight: dec!(0.6),
            max_wearable_weight: dec!(0.7),
        }
    }
}

/// Averages reported by a wearable over the same date range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WearableSummary {
    pub avg_calories_burned: Decimal,
    pub avg_active_minutes: Decimal,
    pub days: u32,
}

/// Per-component adherence, in percent with one decimal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdherenceDetails {
    pub calories: Decimal,
    pub protein: Decimal,
    pub workouts: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdherenceScore {
    pub score: i64,
    pub details: AdherenceDetails,
    pub wearable_blended: bool,
}

/// Current run of consecutive days meeting each goal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Streaks {
    pub diet: u32,
    pub protein: u32,
    pub workout: u32,
}

#[derive(Debug, Clone, Default)]
pub struct AdherenceCalculator {
    config: AdherenceConfig,
}

impl AdherenceCalculator {
    pub fn new() -> Self {
        AdherenceCalculator {
            config: AdherenceConfig::default(),
        }
    }

    pub fn with_config(config: AdherenceConfig) -> Self {
        AdherenceCalculator { config }
    }

    /// Weighted adherence over the days present in `records`
    pub fn score(
        &self,
        records: &[DailyRecord],
        goals: &Goals,
        wearable: Option<&WearableSummary>,
    ) -> AdherenceScore {
        let cfg = &self.config;
        let days = Decimal::from(records.len().max(1));
        let (calorie_goal, protein_goal) = daily_targets(goals);

        let avg_calories = records
            .iter()
            .map(|r| capped_ratio(r.calories, calorie_goal))
            .sum::<Decimal>()
            / days;
        let avg_protein = records
            .iter()
            .map(|r| capped_ratio(r.protein, protein_goal))
            .sum::<Decimal>()
            / days;

        let planned_per_day = safe_div(cfg.workouts_per_week, dec!(7));
        let completed = safe_sum(records.iter().map(|r| Decimal::from(r.workouts_completed)));
        let avg_workouts = completed / days;
        let workout_ratio = capped_ratio(avg_workouts, planned_per_day);

        let base = weighted(&[
            (avg_calories, cfg.calorie_weight),
            (avg_protein, cfg.protein_weight),
            (workout_ratio, cfg.workout_weight),
        ]);

        let (blended, wearable_blended) = match wearable.filter(|w| w.days > 0) {
            Some(w) => {
                let calorie_ratio = capped_ratio(w.avg_calories_burned, calorie_goal);
                let activity_ratio =
                    capped_ratio(w.avg_active_minutes, cfg.active_minutes_target.max(Decimal::ONE));
                let wearable_score = weighted(&[
                    (calorie_ratio, cfg.wearable_calorie_weight),
                    (activity_ratio, safe_add(Decimal::ONE, -cfg.wearable_calorie_weight)),
                ]);
                let weight = cfg.wearable_weight.min(cfg.max_wearable_weight);
                let blended = weighted(&[
                    (base, safe_add(Decimal::ONE, -weight)),
                    (wearable_score, weight),
                ]);
                (blended, true)
            }
            None => (base, false),
        };

        let score = round_to_i64(safe_mul(blended, Decimal::ONE_HUNDRED));
        tracing::debug!(days = records.len(), score, wearable_blended, "Computed adherence score");

        AdherenceScore {
            score,
            details: AdherenceDetails {
                calories: one_decimal_percent(avg_calories),
                protein: one_decimal_percent(avg_protein),
                workouts: one_decimal_percent(workout_ratio),
            },
            wearable_blended,
        }
    }

    /// Diet, protein and workout streaks ending on `today`
    pub fn streaks(&self, records: &[DailyRecord], goals: &Goals, today: NaiveDate) -> Streaks {
        let (calorie_goal, protein_goal) = daily_targets(goals);

        Streaks {
            diet: current_streak(&days_meeting(records, |r| r.calories >= calorie_goal), today),
            protein: current_streak(&days_meeting(records, |r| r.protein >= protein_goal), today),
            workout: current_streak(&days_meeting(records, |r| r.workouts_completed > 0), today),
        }
    }
}

fn days_meeting(
    records: &[DailyRecord],
    predicate: impl Fn(&DailyRecord) -> bool,
) -> BTreeSet<NaiveDate> {
    records
        .iter()
        .filter(|r| predicate(r))
        .map(|r| r.date)
        .collect()
}

/// Consecutive qualifying days ending today, or ending yesterday when today
/// has not qualified (yet)
pub fn current_streak(dates: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let start = if dates.contains(&today) {
        today
    } else {
        match today.checked_sub_days(Days::new(1)) {
            Some(yesterday) if dates.contains(&yesterday) => yesterday,
            _ => return 0,
        }
    };

    let mut streak = 0;
    let mut expected = Some(start);
    while let Some(day) = expected.filter(|d| dates.contains(d)) {
        streak += 1;
        expected = day.checked_sub_days(Days::new(1));
    }
    streak
}

/// Calorie and protein targets floored at 1. An unset goal falls back to the default goal.
fn daily_targets(goals: &Goals) -> (Decimal, Decimal) {
    let defaults = Goals::default();
    let target = |goal: Decimal, fallback: Decimal| {
        if Goals::has_target(goal) {
            goal.max(Decimal::ONE)
        } else {
            fallback
        }
    };
    (
        target(goals.calories, defaults.calories),
        target(goals.protein, defaults.protein),
    )
}

/// `sum(value * weight)`, saturating
fn weighted(terms: &[(Decimal, Decimal)]) -> Decimal {
    safe_sum(terms.iter().map(|&(value, weight)| safe_mul(value, weight)))
}

/// `min(actual / goal, 1)` for a positive goal, else 0
fn capped_ratio(actual: Decimal, goal: Decimal) -> Decimal {
    safe_div(actual.max(Decimal::ZERO), goal).min(Decimal::ONE)
}

fn one_decimal_percent(ratio: Decimal) -> Decimal {
    (ratio * Decimal::ONE_HUNDRED).round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

impl AdherenceScore {
    /// Score as a float, for gauges
    pub fn fraction(&self) -> f64 {
        Decimal::from(self.score).to_f64().unwrap_or(0.0) / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(date: NaiveDate, calories: Decimal, protein: Decimal, workouts: u32) -> DailyRecord {
        DailyRecord {
            calories,
            protein,
            workouts_completed: workouts,
            ..DailyRecord::empty(date)
        }
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, day).unwrap()
    }

    fn goals() -> Goals {
        Goals {
            protein: dec!(75),
            ..Goals::default()
        }
    }

    #[test]
    fn test_perfect_adherence() {
        let calc = AdherenceCalculator::new();
        let records: Vec<_> = (1..=7).map(|i| day(d(i), dec!(2100), dec!(80), 1)).collect();

        let result = calc.score(&records, &goals(), None);
        assert_eq!(result.score, 100);
        assert_eq!(result.details.calories, dec!(100.0));
        assert_eq!(result.details.workouts, dec!(100.0));
        assert!(!result.wearable_blended);
    }

    #[test]
    fn test_partial_adherence() {
        let calc = AdherenceCalculator::new();
        // Half the calories, full protein, no workouts
        let records = vec![day(d(1), dec!(1000), dec!(75), 0), day(d(2), dec!(1000), dec!(75), 0)];

        let result = calc.score(&records, &goals(), None);
        // 0.5 * 0.4 + 1.0 * 0.3 + 0 * 0.3 = 0.5
        assert_eq!(result.score, 50);
        assert_eq!(result.details.calories, dec!(50.0));
        assert_eq!(result.details.protein, dec!(100.0));
        assert_eq!(result.details.workouts, dec!(0.0));
    }

    #[test]
    fn test_no_planned_workouts() {
        let calc = AdherenceCalculator::with_config(AdherenceConfig {
            workouts_per_week: Decimal::ZERO,
            ..AdherenceConfig::default()
        });
        let result = calc.score(&[day(d(1), dec!(2000), dec!(75), 3)], &goals(), None);
        assert_eq!(result.details.workouts, dec!(0.0));
        assert_eq!(result.score, 70);
    }

    #[test]
    fn test_wearable_blending() {
        let calc = AdherenceCalculator::new();
        let records = vec![day(d(1), dec!(1000), dec!(75), 0), day(d(2), dec!(1000), dec!(75), 0)];
        let wearable = WearableSummary {
            avg_calories_burned: dec!(2000),
            avg_active_minutes: dec!(15),
            days: 2,
        };

        let result = calc.score(&records, &goals(), Some(&wearable));
        // base 0.5; wearable 1.0 * 0.6 + 0.5 * 0.4 = 0.8; 0.5 * 0.4 + 0.8 * 0.6 = 0.68
        assert_eq!(result.score, 68);
        assert!(result.wearable_blended);

        let empty_wearable = WearableSummary { days: 0, ..wearable };
        assert_eq!(calc.score(&records, &goals(), Some(&empty_wearable)).score, 50);
    }

    #[test]
    fn test_empty_records() {
        let calc = AdherenceCalculator::new();
        let result = calc.score(&[], &goals(), None);
        assert_eq!(result.score, 0);
    }

    #[test]
    fn test_streak_from_today() {
        let dates: BTreeSet<_> = [d(8), d(9), d(10), d(6)].into_iter().collect();
        assert_eq!(current_streak(&dates, d(10)), 3);
    }

    #[test]
    fn test_streak_from_yesterday() {
        let dates: BTreeSet<_> = [d(8), d(9)].into_iter().collect();
        assert_eq!(current_streak(&dates, d(10)), 2);
    }

    #[test]
    fn test_broken_streak() {
        let dates: BTreeSet<_> = [d(7), d(8)].into_iter().collect();
        assert_eq!(current_streak(&dates, d(10)), 0);
        assert_eq!(current_streak(&BTreeSet::new(), d(10)), 0);
    }

    #[test]
    fn test_streaks_per_goal() {
        let calc = AdherenceCalculator::new();
        let records = vec![
            day(d(8), dec!(2100), dec!(50), 1),
            day(d(9), dec!(2050), dec!(80), 1),
            day(d(10), dec!(2000), dec!(90), 0),
        ];

        let streaks = calc.streaks(&records, &goals(), d(10));
        assert_eq!(streaks.diet, 3);
        assert_eq!(streaks.protein, 2);
        // No workout today, but yesterday and the day before count
        assert_eq!(streaks.workout, 2);
    }

    #[test]
    fn test_user_goals_drive_score_and_streaks() {
        let calc = AdherenceCalculator::new();
        let records = vec![
            day(d(9), dec!(2000), dec!(150), 1),
            day(d(10), dec!(2000), dec!(150), 1),
        ];

        let strict = Goals {
            protein: dec!(200),
            ..Goals::default()
        };
        assert_eq!(calc.score(&records, &strict, None).details.protein, dec!(75.0));
        assert_eq!(calc.streaks(&records, &strict, d(10)).protein, 0);

        let lenient = Goals {
            protein: dec!(150),
            ..Goals::default()
        };
        assert_eq!(calc.score(&records, &lenient, None).details.protein, dec!(100.0));
        assert_eq!(calc.streaks(&records, &lenient, d(10)).protein, 2);
    }

    #[test]
    fn test_unset_goals_fall_back_to_defaults() {
        let calc = AdherenceCalculator::new();
        let records = vec![day(d(10), dec!(1000), dec!(75), 0)];
        let unset = Goals {
            calories: Decimal::ZERO,
            protein: dec!(-1),
            ..Goals::default()
        };

        let result = calc.score(&records, &unset, None);
        // 1000 / 2000 and 75 / 150
        assert_eq!(result.details.calories, dec!(50.0));
        assert_eq!(result.details.protein, dec!(50.0));
        assert_eq!(calc.streaks(&records, &unset, d(10)).diet, 0);
    }

    #[test]
    fn test_extreme_values_do_not_overflow() {
        let calc = AdherenceCalculator::with_config(AdherenceConfig {
            workouts_per_week: Decimal::MAX,
            calorie_weight: Decimal::MAX,
            ..AdherenceConfig::default()
        });
        let records = vec![
            day(d(9), Decimal::MAX, Decimal::MAX, u32::MAX),
            day(d(10), Decimal::MAX, Decimal::MAX, u32::MAX),
        ];
        let tiny = Goals {
            calories: Decimal::new(1, 28),
            protein: Decimal::new(1, 28),
            ..Goals::default()
        };
        let wearable = WearableSummary {
            avg_calories_burned: Decimal::MAX,
            avg_active_minutes: Decimal::MAX,
            days: 2,
        };

        let result = calc.score(&records, &tiny, Some(&wearable));
        assert_eq!(result.details.calories, dec!(100.0));
        assert!(result.score > 0);
    }
}
