//! Nutrition quality scoring
//!
//! Turns one day's macronutrient totals into a per-macro breakdown, a calorie
//! status, and a 0-100 quality score built from three additive components:
//! protein adequacy (max 40), calorie accuracy (max 30) and macro balance
//! (max 30). Every threshold is a field of [`ScoringThresholds`] so it can be
//! overridden from the config file.

use crate::models::{safe_add, safe_div, safe_mul, safe_percent, DailyRecord, Goals};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Inclusive percent-of-calories range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PercentRange {
    pub min: Decimal,
    pub max: Decimal,
}

impl PercentRange {
    pub fn new(min: Decimal, max: Decimal) -> Self {
        PercentRange { min, max }
    }

    pub fn contains(&self, value: Decimal) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Points awarded at a ratio threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreTier {
    pub threshold: Decimal,
    pub points: u32,
}

impl ScoreTier {
    pub fn new(threshold: Decimal, points: u32) -> Self {
        ScoreTier { threshold, points }
    }
}

/// Heuristic scoring constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringThresholds {
    /// kcal per gram of protein
    pub protein_kcal_per_gram: Decimal,
    /// kcal per gram of carbohydrate
    pub carbs_kcal_per_gram: Decimal,
    /// kcal per gram of fat
    pub fat_kcal_per_gram: Decimal,

    /// Fraction of the protein goal rated "fair"
    pub protein_fair_ratio: Decimal,
    /// Carbs rated "good" within these fractions of goal
    pub carbs_good_low: Decimal,
    pub carbs_good_high: Decimal,
    /// Fat rated "good" within these fractions of goal
    pub fat_good_low: Decimal,
    pub fat_good_high: Decimal,

    /// Calories are "optimal" within this fraction of goal either way
    pub calorie_tolerance: Decimal,

    /// Balance points per macro inside its range
    pub balance_points: u32,

    /// Protein component tiers, as fraction of goal reached (descending)
    pub protein_tiers: Vec<ScoreTier>,
    /// Calorie accuracy tiers, as max relative deviation (ascending)
    pub calorie_tiers: Vec<ScoreTier>,

    pub protein_balance: PercentRange,
    pub carbs_balance: PercentRange,
    pub fat_balance: PercentRange,
}

impl Default for ScoringThresholds {
    fn default() -> Self {
        ScoringThresholds {
            protein_kcal_per_gram: dec!(4),
            carbs_kcal_per_gram: dec!(4),
            fat_kcal_per_gram: dec!(9),
            protein_fair_ratio: dec!(0.8),
            carbs_good_low: dec!(0.8),
            carbs_good_high: dec!(1.2),
            fat_good_low: dec!(0.7),
            fat_good_high: dec!(1.2),
            calorie_tolerance: dec!(0.1),
            balance_points: 10,
            protein_tiers: vec![
                ScoreTier::new(dec!(1.0), 40),
                ScoreTier::new(dec!(0.8), 25),
                ScoreTier::new(dec!(0.6), 10),
            ],
            calorie_tiers: vec![
                ScoreTier::new(dec!(0.10), 30),
                ScoreTier::new(dec!(0.20), 20),
                ScoreTier::new(dec!(0.30), 10),
            ],
            protein_balance: PercentRange::new(dec!(20), dec!(35)),
            carbs_balance: PercentRange::new(dec!(40), dec!(60)),
            fat_balance: PercentRange::new(dec!(20), dec!(35)),
        }
    }
}

/// Per-macro rating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MacroStatus {
    Good,
    Fair,
    Poor,
}

/// Calorie intake relative to goal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalorieStatus {
    Optimal,
    Excess,
    Deficit,
    /// Calorie goal is zero or unset
    NoTarget,
}

/// Quality score band
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBand {
    Poor,
    Fair,
    Good,
    Excellent,
}

impl ScoreBand {
    pub fn from_score(score: u32) -> Self {
        if score >= 80 {
            ScoreBand::Excellent
        } else if score >= 60 {
            ScoreBand::Good
        } else if score >= 40 {
            ScoreBand::Fair
        } else {
            ScoreBand::Poor
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ScoreBand::Excellent => "Excellent nutrition balance",
            ScoreBand::Good => "Good overall balance",
            ScoreBand::Fair => "Room for improvement",
            ScoreBand::Poor => "Consider adjusting your food choices",
        }
    }
}

/// Bounded score with its band
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Always within [0, 100]
    pub value: u32,
    pub band: ScoreBand,
}

impl ScoreResult {
    pub fn new(value: u32) -> Self {
        let value = value.min(100);
        ScoreResult {
            value,
            band: ScoreBand::from_score(value),
        }
    }
}

/// One macronutrient's contribution to the day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroBreakdown {
    pub grams: Decimal,
    pub calories: Decimal,
    pub percent_of_calories: Decimal,
    pub goal: Decimal,
    pub status: MacroStatus,
}

/// Points earned by each score component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreComponents {
    pub protein: u32,
    pub calorie_accuracy: u32,
    pub balance: u32,
}

impl ScoreComponents {
    pub fn total(&self) -> u32 {
        self.protein
            .saturating_add(self.calorie_accuracy)
            .saturating_add(self.balance)
    }
}

/// Full nutrition analysis for one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroAnalysis {
    pub total_calories: Decimal,
    pub protein: MacroBreakdown,
    pub carbs: MacroBreakdown,
    pub fat: MacroBreakdown,
    pub calorie_status: CalorieStatus,
    pub components: ScoreComponents,
    pub quality: ScoreResult,
}

/// Weighted nutrition quality scorer
#[derive(Debug, Clone, Default)]
pub struct MacroQualityScorer {
    thresholds: ScoringThresholds,
}

impl MacroQualityScorer {
    /// Create scorer with default thresholds
    pub fn new() -> Self {
        MacroQualityScorer {
            thresholds: ScoringThresholds::default(),
        }
    }

    /// Create scorer with custom thresholds
    pub fn with_thresholds(thresholds: ScoringThresholds) -> Self {
        MacroQualityScorer { thresholds }
    }

    pub fn thresholds(&self) -> &ScoringThresholds {
        &self.thresholds
    }

    /// Analyze one day's totals against the goals
    pub fn analyze(&self, day: &DailyRecord, goals: &Goals) -> MacroAnalysis {
        let t = &self.thresholds;
        let total_calories = day.calories;

        let protein = self.breakdown(
            day.protein,
            t.protein_kcal_per_gram,
            total_calories,
            goals.protein,
            self.protein_status(day.protein, goals.protein),
        );
        let carbs = self.breakdown(
            day.carbs,
            t.carbs_kcal_per_gram,
            total_calories,
            goals.carbs,
            Self::range_status(day.carbs, goals.carbs, t.carbs_good_low, t.carbs_good_high),
        );
        let fat = self.breakdown(
            day.fat,
            t.fat_kcal_per_gram,
            total_calories,
            goals.fat,
            Self::range_status(day.fat, goals.fat, t.fat_good_low, t.fat_good_high),
        );

        let components = ScoreComponents {
            protein: self.protein_points(day.protein, goals.protein),
            calorie_accuracy: self.calorie_accuracy_points(total_calories, goals.calories),
            balance: self.balance_points(&protein, &carbs, &fat),
        };
        let quality = ScoreResult::new(components.total());

        tracing::debug!(
            date = %day.date,
            protein_points = components.protein,
            calorie_points = components.calorie_accuracy,
            balance_points = components.balance,
            score = quality.value,
            "Scored daily nutrition"
        );

        MacroAnalysis {
            total_calories,
            protein,
            carbs,
            fat,
            calorie_status: self.calorie_status(total_calories, goals.calories),
            components,
            quality,
        }
    }

    /// Calorie status against the goal
    pub fn calorie_status(&self, total: Decimal, goal: Decimal) -> CalorieStatus {
        if !Goals::has_target(goal) {
            return CalorieStatus::NoTarget;
        }
        let tolerance = self.thresholds.calorie_tolerance;
        if total > safe_mul(goal, safe_add(Decimal::ONE, tolerance)) {
            CalorieStatus::Excess
        } else if total < safe_mul(goal, safe_add(Decimal::ONE, -tolerance)) {
            CalorieStatus::Deficit
        } else {
            CalorieStatus::Optimal
        }
    }

    fn breakdown(
        &self,
        grams: Decimal,
        kcal_per_gram: Decimal,
        total_calories: Decimal,
        goal: Decimal,
        status: MacroStatus,
    ) -> MacroBreakdown {
        let calories = safe_mul(grams, kcal_per_gram);
        MacroBreakdown {
            grams,
            calories,
            percent_of_calories: safe_percent(calories, total_calories),
            goal,
            status,
        }
    }

    fn protein_status(&self, grams: Decimal, goal: Decimal) -> MacroStatus {
        if !Goals::has_target(goal) {
            return MacroStatus::Fair;
        }
        if grams >= goal {
            MacroStatus::Good
        } else if grams >= safe_mul(goal, self.thresholds.protein_fair_ratio) {
            MacroStatus::Fair
        } else {
            MacroStatus::Poor
        }
    }

    fn range_status(grams: Decimal, goal: Decimal, low: Decimal, high: Decimal) -> MacroStatus {
        if Goals::has_target(goal)
            && grams >= safe_mul(goal, low)
            && grams <= safe_mul(goal, high)
        {
            MacroStatus::Good
        } else {
            MacroStatus::Fair
        }
    }

    fn protein_points(&self, grams: Decimal, goal: Decimal) -> u32 {
        if !Goals::has_target(goal) {
            return 0;
        }
        self.thresholds
            .protein_tiers
            .iter()
            .find(|tier| grams >= safe_mul(goal, tier.threshold))
            .map(|tier| tier.points)
            .unwrap_or(0)
    }

    fn calorie_accuracy_points(&self, total: Decimal, goal: Decimal) -> u32 {
        if !Goals::has_target(goal) {
            return 0;
        }
        let deviation = safe_div(safe_add(total, -goal).abs(), goal);
        self.thresholds
            .calorie_tiers
            .iter()
            .find(|tier| deviation <= tier.threshold)
            .map(|tier| tier.points)
            .unwrap_or(0)
    }

    fn balance_points(
        &self,
        protein: &MacroBreakdown,
        carbs: &MacroBreakdown,
        fat: &MacroBreakdown,
    ) -> u32 {
        let t = &self.thresholds;
        let in_range = [
            (&t.protein_balance, protein),
            (&t.carbs_balance, carbs),
            (&t.fat_balance, fat),
        ]
        .into_iter()
        .filter(|(range, breakdown)| range.contains(breakdown.percent_of_calories))
        .count() as u32;

        in_range.saturating_mul(t.balance_points)
    }
}

/// `part / whole * 100`, or zero when the whole is not positive
impl MacroBreakdown {
    /// Percent of calories rounded for display
    pub fn rounded_percent(&self) -> i64 {
        crate::models::round_to_i64(self.percent_of_calories)
    }

    /// Grams as a float for chart or table output
    pub fn grams_f64(&self) -> f64 {
        self.grams.to_f64().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn day(calories: Decimal, protein: Decimal, carbs: Decimal, fat: Decimal) -> DailyRecord {
        DailyRecord {
            calories,
            protein,
            carbs,
            fat,
            ..DailyRecord::empty(NaiveDate::from_ymd_opt(2024, 4, 10).unwrap())
        }
    }

    #[test]
    fn test_balanced_day_scores_100() {
        let scorer = MacroQualityScorer::new();
        let goals = Goals {
            calories: dec!(2000),
            protein: dec!(150),
            carbs: dec!(250),
            fat: dec!(65),
            fiber: dec!(35),
        };

        let analysis = scorer.analyze(&day(dec!(2100), dec!(160), dec!(220), dec!(55)), &goals);

        assert_eq!(analysis.calorie_status, CalorieStatus::Optimal);
        assert_eq!(analysis.protein.status, MacroStatus::Good);
        assert_eq!(analysis.carbs.status, MacroStatus::Good);
        assert_eq!(analysis.fat.status, MacroStatus::Good);

        assert_eq!(analysis.protein.calories, dec!(640));
        assert_eq!(analysis.carbs.calories, dec!(880));
        assert_eq!(analysis.fat.calories, dec!(495));
        assert_eq!(analysis.protein.rounded_percent(), 30);
        assert_eq!(analysis.carbs.rounded_percent(), 42);
        assert_eq!(analysis.fat.rounded_percent(), 24);

        assert_eq!(analysis.components.protein, 40);
        assert_eq!(analysis.components.calorie_accuracy, 30);
        assert_eq!(analysis.components.balance, 30);
        assert_eq!(analysis.quality.value, 100);
        assert_eq!(analysis.quality.band, ScoreBand::Excellent);
    }

    #[test]
    fn test_protein_tiers() {
        let scorer = MacroQualityScorer::new();
        assert_eq!(scorer.protein_points(dec!(150), dec!(150)), 40);
        assert_eq!(scorer.protein_points(dec!(120), dec!(150)), 25);
        assert_eq!(scorer.protein_points(dec!(90), dec!(150)), 10);
        assert_eq!(scorer.protein_points(dec!(89), dec!(150)), 0);
        assert_eq!(scorer.protein_status(dec!(120), dec!(150)), MacroStatus::Fair);
        assert_eq!(scorer.protein_status(dec!(119), dec!(150)), MacroStatus::Poor);
    }

    #[test]
    fn test_calorie_accuracy_tiers() {
        let scorer = MacroQualityScorer::new();
        assert_eq!(scorer.calorie_accuracy_points(dec!(2200), dec!(2000)), 30);
        assert_eq!(scorer.calorie_accuracy_points(dec!(1600), dec!(2000)), 20);
        assert_eq!(scorer.calorie_accuracy_points(dec!(2600), dec!(2000)), 10);
        assert_eq!(scorer.calorie_accuracy_points(dec!(1000), dec!(2000)), 0);
    }

    #[test]
    fn test_calorie_status_bands() {
        let scorer = MacroQualityScorer::new();
        assert_eq!(scorer.calorie_status(dec!(1800), dec!(2000)), CalorieStatus::Optimal);
        assert_eq!(scorer.calorie_status(dec!(2200), dec!(2000)), CalorieStatus::Optimal);
        assert_eq!(scorer.calorie_status(dec!(2201), dec!(2000)), CalorieStatus::Excess);
        assert_eq!(scorer.calorie_status(dec!(1799), dec!(2000)), CalorieStatus::Deficit);
        assert_eq!(scorer.calorie_status(dec!(1799), Decimal::ZERO), CalorieStatus::NoTarget);
    }

    #[test]
    fn test_range_status_edges() {
        assert_eq!(
            MacroQualityScorer::range_status(dec!(200), dec!(250), dec!(0.8), dec!(1.2)),
            MacroStatus::Good
        );
        assert_eq!(
            MacroQualityScorer::range_status(dec!(301), dec!(250), dec!(0.8), dec!(1.2)),
            MacroStatus::Fair
        );
        assert_eq!(
            MacroQualityScorer::range_status(dec!(45.5), dec!(65), dec!(0.7), dec!(1.2)),
            MacroStatus::Good
        );
    }

    #[test]
    fn test_empty_day_guards_zero_calories() {
        let scorer = MacroQualityScorer::new();
        let analysis = scorer.analyze(&day(dec!(0), dec!(0), dec!(0), dec!(0)), &Goals::default());

        assert_eq!(analysis.protein.percent_of_calories, Decimal::ZERO);
        assert_eq!(analysis.components.balance, 0);
        assert_eq!(analysis.calorie_status, CalorieStatus::Deficit);
        assert_eq!(analysis.quality.value, 0);
        assert_eq!(analysis.quality.band, ScoreBand::Poor);
    }

    #[test]
    fn test_missing_goals_do_not_divide() {
        let scorer = MacroQualityScorer::new();
        let goals = Goals {
            calories: Decimal::ZERO,
            protein: Decimal::ZERO,
            carbs: Decimal::ZERO,
            fat: Decimal::ZERO,
            fiber: Decimal::ZERO,
        };
        let analysis = scorer.analyze(&day(dec!(2000), dec!(150), dec!(250), dec!(60)), &goals);

        assert_eq!(analysis.components.protein, 0);
        assert_eq!(analysis.components.calorie_accuracy, 0);
        assert_eq!(analysis.calorie_status, CalorieStatus::NoTarget);
        assert_eq!(analysis.protein.status, MacroStatus::Fair);
        // Balance only depends on the day's own calorie split
        assert_eq!(analysis.components.balance, 30);
    }

    #[test]
    fn test_custom_thresholds() {
        let thresholds = ScoringThresholds {
            carbs_balance: PercentRange::new(dec!(10), dec!(30)),
            ..ScoringThresholds::default()
        };
        let scorer = MacroQualityScorer::with_thresholds(thresholds);
        let analysis =
            scorer.analyze(&day(dec!(2100), dec!(160), dec!(220), dec!(55)), &Goals::default());

        // Carbs at ~42% now fall outside the custom balance range
        assert_eq!(analysis.components.balance, 20);
        assert_eq!(analysis.quality.value, 90);
    }

    #[test]
    fn test_score_band_boundaries() {
        assert_eq!(ScoreBand::from_score(80), ScoreBand::Excellent);
        assert_eq!(ScoreBand::from_score(79), ScoreBand::Good);
        assert_eq!(ScoreBand::from_score(40), ScoreBand::Fair);
        assert_eq!(ScoreBand::from_score(39), ScoreBand::Poor);
        assert_eq!(ScoreResult::new(140).value, 100);
    }

    #[test]
    fn test_huge_intake_does_not_overflow() {
        let scorer = MacroQualityScorer::new();
        let huge = dec!(30000000000000000000000000000);
        let record = day(dec!(2000), huge, dec!(250), dec!(65));
        let analysis = scorer.analyze(&record, &Goals::default());

        assert_eq!(analysis.protein.calories, Decimal::MAX);
        assert_eq!(analysis.protein.status, MacroStatus::Good);
        assert_eq!(analysis.calorie_status, CalorieStatus::Optimal);
        assert!(analysis.quality.value <= 100);
    }

    #[test]
    fn test_tiny_goals_do_not_overflow() {
        let scorer = MacroQualityScorer::new();
        let tiny = Decimal::new(1, 28);
        let goals = Goals {
            calories: tiny,
            protein: tiny,
            carbs: tiny,
            fat: tiny,
            fiber: tiny,
        };
        let analysis = scorer.analyze(&day(dec!(2100), dec!(160), dec!(220), dec!(55)), &goals);

        assert_eq!(analysis.calorie_status, CalorieStatus::Excess);
        assert_eq!(analysis.components.calorie_accuracy, 0);
        assert_eq!(analysis.components.protein, 40);
    }

    /// Any non-negative `Decimal`, from the smallest fraction up to `Decimal::MAX`
    fn any_quantity() -> impl Strategy<Value = Decimal> {
        (any::<u32>(), any::<u32>(), any::<u32>(), 0u32..=28)
            .prop_map(|(lo, mid, hi, scale)| Decimal::from_parts(lo, mid, hi, false, scale))
    }

    proptest! {
        #[test]
        fn test_quality_score_bounded(
            calories in 0u32..6000u32,
            protein in 0u32..400u32,
            carbs in 0u32..800u32,
            fat in 0u32..300u32,
            goal_calories in 0u32..5000u32,
            goal_protein in 0u32..300u32,
        ) {
            let scorer = MacroQualityScorer::new();
            let goals = Goals {
                calories: Decimal::from(goal_calories),
                protein: Decimal::from(goal_protein),
                ..Goals::default()
            };
            let analysis = scorer.analyze(
                &day(
                    Decimal::from(calories),
                    Decimal::from(protein),
                    Decimal::from(carbs),
                    Decimal::from(fat),
                ),
                &goals,
            );
            prop_assert!(analysis.quality.value <= 100);
        }

        #[test]
        fn test_quality_score_bounded_over_decimal_range(
            calories in any_quantity(),
            protein in any_quantity(),
            carbs in any_quantity(),
            fat in any_quantity(),
            goal_calories in any_quantity(),
            goal_protein in any_quantity(),
            goal_carbs in any_quantity(),
            goal_fat in any_quantity(),
        ) {
            let scorer = MacroQualityScorer::new();
            let goals = Goals {
                calories: goal_calories,
                protein: goal_protein,
                carbs: goal_carbs,
                fat: goal_fat,
                fiber: Decimal::ZERO,
            };
            let analysis = scorer.analyze(&day(calories, protein, carbs, fat), &goals);
            prop_assert!(analysis.quality.value <= 100);
            prop_assert!(analysis.protein.percent_of_calories >= Decimal::ZERO);
        }
    }
}
