// Library interface for NutriRS modules
// This allows integration tests and benches to access the core functionality

pub mod adherence;
pub mod chart;
pub mod config;
pub mod error;
pub mod import;
pub mod logging;
pub mod models;
pub mod progress;
pub mod scoring;
pub mod trends;

// Re-export commonly used types for convenience
pub use models::*;
pub use adherence::{AdherenceCalculator, AdherenceConfig, AdherenceScore, Streaks, WearableSummary};
pub use chart::{ChartConfig, ChartGeometry, Plot, ScaleBounds, SeriesNormalizer, SparklineGeometry};
pub use config::AppConfig;
pub use error::{ImportError, NutriRsError, Result};
pub use import::ImportManager;
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use progress::{GoalProgress, GoalProgressTracker, ProgressConfig, ProgressStatus};
pub use scoring::{MacroAnalysis, MacroQualityScorer, ScoreBand, ScoreResult, ScoringThresholds};
pub use trends::{TrendResult, TrendSummary, TrendSynthesizer};
