use chrono::NaiveDate;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Trackable per-day metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Calories,
    Protein,
    Carbs,
    Fat,
    Fiber,
    WorkoutsCompleted,
    WorkoutsPlanned,
}

impl Metric {
    /// Nutrient metrics that carry a daily goal
    pub const NUTRIENTS: [Metric; 5] = [
        Metric::Calories,
        Metric::Protein,
        Metric::Carbs,
        Metric::Fat,
        Metric::Fiber,
    ];

    /// Display unit for the metric
    pub fn unit(&self) -> &'static str {
        match self {
            Metric::Calories => "kcal",
            Metric::Protein | Metric::Carbs | Metric::Fat | Metric::Fiber => "g",
            Metric::WorkoutsCompleted | Metric::WorkoutsPlanned => "workouts",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Metric::Calories => "calories",
            Metric::Protein => "protein",
            Metric::Carbs => "carbs",
            Metric::Fat => "fat",
            Metric::Fiber => "fiber",
            Metric::WorkoutsCompleted => "workouts_completed",
            Metric::WorkoutsPlanned => "workouts_planned",
        };
        write!(f, "{}", name)
    }
}

impl std::str::FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "calories" | "kcal" => Ok(Metric::Calories),
            "protein" => Ok(Metric::Protein),
            "carbs" | "carbohydrates" => Ok(Metric::Carbs),
            "fat" => Ok(Metric::Fat),
            "fiber" | "fibre" => Ok(Metric::Fiber),
            "workouts" | "workouts_completed" => Ok(Metric::WorkoutsCompleted),
            "workouts_planned" => Ok(Metric::WorkoutsPlanned),
            _ => Err(format!("Unknown metric: {}", s)),
        }
    }
}

/// One normalized day of nutrition and workout totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    /// Calendar day, unique within a series
    pub date: NaiveDate,

    /// Total energy intake in kcal
    pub calories: Decimal,

    /// Protein in grams
    pub protein: Decimal,

    /// Carbohydrates in grams
    pub carbs: Decimal,

    /// Fat in grams
    pub fat: Decimal,

    /// Fiber in grams
    pub fiber: Decimal,

    /// Workouts logged on this day
    pub workouts_completed: u32,

    /// Workouts scheduled for this day
    pub workouts_planned: u32,
}

impl DailyRecord {
    /// Empty record for a date
    pub fn empty(date: NaiveDate) -> Self {
        DailyRecord {
            date,
            calories: Decimal::ZERO,
            protein: Decimal::ZERO,
            carbs: Decimal::ZERO,
            fat: Decimal::ZERO,
            fiber: Decimal::ZERO,
            workouts_completed: 0,
            workouts_planned: 0,
        }
    }

    /// Value of a metric on this day
    pub fn value(&self, metric: Metric) -> Decimal {
        match metric {
            Metric::Calories => self.calories,
            Metric::Protein => self.protein,
            Metric::Carbs => self.carbs,
            Metric::Fat => self.fat,
            Metric::Fiber => self.fiber,
            Metric::WorkoutsCompleted => Decimal::from(self.workouts_completed),
            Metric::WorkoutsPlanned => Decimal::from(self.workouts_planned),
        }
    }
}

/// Daily nutrition targets. A goal of zero or less means "no target".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goals {
    pub calories: Decimal,
    pub protein: Decimal,
    pub carbs: Decimal,
    pub fat: Decimal,
    pub fiber: Decimal,
}

impl Default for Goals {
    fn default() -> Self {
        Goals {
            calories: dec!(2000),
            protein: dec!(150),
            carbs: dec!(250),
            fat: dec!(65),
            fiber: dec!(35),
        }
    }
}

impl Goals {
    /// Goal for a nutrient metric; workout metrics have no daily goal here
    pub fn goal_for(&self, metric: Metric) -> Decimal {
        match metric {
            Metric::Calories => self.calories,
            Metric::Protein => self.protein,
            Metric::Carbs => self.carbs,
            Metric::Fat => self.fat,
            Metric::Fiber => self.fiber,
            Metric::WorkoutsCompleted | Metric::WorkoutsPlanned => Decimal::ZERO,
        }
    }

    /// True when the goal can be used as a divisor
    pub fn has_target(goal: Decimal) -> bool {
        goal > Decimal::ZERO
    }
}

/// Record as it arrives from the persistence layer, any field may be missing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDailyRecord {
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub calories: Option<f64>,
    #[serde(default)]
    pub protein: Option<f64>,
    #[serde(default)]
    pub carbs: Option<f64>,
    #[serde(default)]
    pub fat: Option<f64>,
    #[serde(default)]
    pub fiber: Option<f64>,
    #[serde(default)]
    pub workouts_completed: Option<f64>,
    #[serde(default)]
    pub workouts_planned: Option<f64>,
}

impl RawDailyRecord {
    /// Replace missing, non-finite and negative values with zero.
    ///
    /// Returns `None` when the record has no date, since the date is the
    /// series key and cannot be defaulted.
    pub fn normalize(&self) -> Option<DailyRecord> {
        let date = self.date?;
        Some(DailyRecord {
            date,
            calories: sanitize(self.calories),
            protein: sanitize(self.protein),
            carbs: sanitize(self.carbs),
            fat: sanitize(self.fat),
            fiber: sanitize(self.fiber),
            workouts_completed: sanitize_count(self.workouts_completed),
            workouts_planned: sanitize_count(self.workouts_planned),
        })
    }
}

/// Goals as supplied by a user profile or plan, any field may be missing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawGoals {
    #[serde(default)]
    pub calories: Option<f64>,
    #[serde(default)]
    pub protein: Option<f64>,
    #[serde(default)]
    pub carbs: Option<f64>,
    #[serde(default)]
    pub fat: Option<f64>,
    #[serde(default)]
    pub fiber: Option<f64>,
}

impl RawGoals {
    /// Missing or malformed goals become zero, i.e. "no target"
    pub fn normalize(&self) -> Goals {
        Goals {
            calories: sanitize(self.calories),
            protein: sanitize(self.protein),
            carbs: sanitize(self.carbs),
            fat: sanitize(self.fat),
            fiber: sanitize(self.fiber),
        }
    }
}

/// Largest quantity a sanitized field can hold. Inputs above it are capped,
/// which keeps every product and sum in the calculators inside `Decimal` range.
pub const MAX_QUANTITY: Decimal = dec!(1_000_000_000_000_000);

/// Largest workout count a sanitized field can hold
pub const MAX_COUNT: u32 = 1_000_000;

/// Convert an optional float into a non-negative decimal, capped at `MAX_QUANTITY`
pub fn sanitize(value: Option<f64>) -> Decimal {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => Decimal::from_f64(v)
            .unwrap_or(MAX_QUANTITY)
            .min(MAX_QUANTITY),
        _ => Decimal::ZERO,
    }
}

fn sanitize_count(value: Option<f64>) -> u32 {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => v.round().min(MAX_COUNT as f64) as u32,
        _ => 0,
    }
}

fn saturate(negative: bool) -> Decimal {
    if negative {
        Decimal::MIN
    } else {
        Decimal::MAX
    }
}

/// `a * b`, saturating at the `Decimal` range
pub fn safe_mul(a: Decimal, b: Decimal) -> Decimal {
    a.checked_mul(b)
        .unwrap_or_else(|| saturate(a.is_sign_negative() != b.is_sign_negative()))
}

/// `a + b`, saturating at the `Decimal` range
pub fn safe_add(a: Decimal, b: Decimal) -> Decimal {
    a.checked_add(b)
        .unwrap_or_else(|| saturate(a.is_sign_negative()))
}

/// `numerator / denominator`; 0 unless the denominator is positive, saturating on overflow
pub fn safe_div(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    numerator
        .checked_div(denominator)
        .unwrap_or_else(|| saturate(numerator.is_sign_negative()))
}

/// `numerator / denominator * 100` with the same guards as `safe_div`
pub fn safe_percent(numerator: Decimal, denominator: Decimal) -> Decimal {
    safe_mul(safe_div(numerator, denominator), Decimal::ONE_HUNDRED)
}

/// Sum that saturates instead of overflowing
pub fn safe_sum<I: IntoIterator<Item = Decimal>>(values: I) -> Decimal {
    values.into_iter().fold(Decimal::ZERO, safe_add)
}

/// Round to the nearest integer with halves going up (2.5 -> 3, -2.5 -> -2)
pub fn round_half_up(value: Decimal) -> Decimal {
    match value.checked_add(dec!(0.5)) {
        Some(shifted) => shifted.floor(),
        None => value.floor(),
    }
}

/// Integer percentage helper shared by the calculators, saturating at the `i64` range
pub fn round_to_i64(value: Decimal) -> i64 {
    round_half_up(value).to_i64().unwrap_or(if value.is_sign_negative() {
        i64::MIN
    } else {
        i64::MAX
    })
}

/// Single point in a metric series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricPoint {
    pub date: NaiveDate,
    pub value: Decimal,
}

/// Chronologically ordered, immutable sequence of metric values (oldest first)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSeries {
    points: Vec<MetricPoint>,
}

impl MetricSeries {
    pub fn new(points: Vec<MetricPoint>) -> Self {
        MetricSeries { points }
    }

    /// Extract one metric from a day-series
    pub fn from_records(records: &[DailyRecord], metric: Metric) -> Self {
        MetricSeries {
            points: records
                .iter()
                .map(|r| MetricPoint {
                    date: r.date,
                    value: r.value(metric),
                })
                .collect(),
        }
    }

    pub fn points(&self) -> &[MetricPoint] {
        &self.points
    }

    pub fn values(&self) -> Vec<Decimal> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    #[test]
    fn test_normalize_defaults_missing_fields() {
        let raw = RawDailyRecord {
            date: Some(date(1)),
            calories: Some(1850.5),
            protein: None,
            carbs: Some(f64::NAN),
            fat: Some(-12.0),
            fiber: Some(f64::INFINITY),
            workouts_completed: Some(2.0),
            workouts_planned: None,
        };

        let record = raw.normalize().unwrap();
        assert_eq!(record.calories, dec!(1850.5));
        assert_eq!(record.protein, Decimal::ZERO);
        assert_eq!(record.carbs, Decimal::ZERO);
        assert_eq!(record.fat, Decimal::ZERO);
        assert_eq!(record.fiber, Decimal::ZERO);
        assert_eq!(record.workouts_completed, 2);
        assert_eq!(record.workouts_planned, 0);
    }

    #[test]
    fn test_normalize_requires_date() {
        let raw = RawDailyRecord {
            calories: Some(2000.0),
            ..RawDailyRecord::default()
        };
        assert!(raw.normalize().is_none());
    }

    #[test]
    fn test_raw_goals_missing_means_no_target() {
        let goals = RawGoals {
            calories: Some(2200.0),
            protein: Some(0.0),
            ..RawGoals::default()
        }
        .normalize();

        assert!(Goals::has_target(goals.calories));
        assert!(!Goals::has_target(goals.protein));
        assert!(!Goals::has_target(goals.fiber));
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_half_up(dec!(2.5)), dec!(3));
        assert_eq!(round_half_up(dec!(-2.5)), dec!(-2));
        assert_eq!(round_half_up(dec!(30.47)), dec!(30));
        assert_eq!(round_to_i64(dec!(-99.6)), -100);
    }

    #[test]
    fn test_sanitize_caps_large_values() {
        assert_eq!(sanitize(Some(1e29)), MAX_QUANTITY);
        assert_eq!(sanitize(Some(f64::MAX)), MAX_QUANTITY);
        assert_eq!(sanitize(Some(2e15)), MAX_QUANTITY);
        assert_eq!(sanitize(Some(f64::INFINITY)), Decimal::ZERO);
        assert_eq!(sanitize_count(Some(5e9)), MAX_COUNT);
    }

    #[test]
    fn test_safe_arithmetic_saturates() {
        assert_eq!(safe_div(dec!(1), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(safe_div(dec!(5), dec!(-2)), Decimal::ZERO);
        assert_eq!(safe_div(MAX_QUANTITY, dec!(0.0000000000000000000000000001)), Decimal::MAX);
        assert_eq!(safe_mul(Decimal::MAX, dec!(9)), Decimal::MAX);
        assert_eq!(safe_mul(Decimal::MAX, dec!(-2)), Decimal::MIN);
        assert_eq!(safe_sum(vec![Decimal::MAX, Decimal::MAX]), Decimal::MAX);
        assert_eq!(safe_percent(dec!(1), dec!(4)), dec!(25));
        assert_eq!(round_half_up(Decimal::MAX), Decimal::MAX.floor());
        assert_eq!(round_to_i64(Decimal::MAX), i64::MAX);
        assert_eq!(round_to_i64(Decimal::MIN), i64::MIN);
    }

    #[test]
    fn test_metric_series_from_records() {
        let mut first = DailyRecord::empty(date(1));
        first.protein = dec!(120);
        let mut second = DailyRecord::empty(date(2));
        second.protein = dec!(140);

        let series = MetricSeries::from_records(&[first, second], Metric::Protein);
        assert_eq!(series.len(), 2);
        assert_eq!(series.values(), vec![dec!(120), dec!(140)]);
        assert_eq!(series.points()[0].date, date(1));
    }

    #[test]
    fn test_metric_parsing() {
        assert_eq!("Calories".parse::<Metric>().unwrap(), Metric::Calories);
        assert_eq!("workouts".parse::<Metric>().unwrap(), Metric::WorkoutsCompleted);
        assert!("sodium".parse::<Metric>().is_err());
    }
}
