use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use colored::*;
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};

use nutrirs::adherence::{AdherenceCalculator, WearableSummary};
use nutrirs::chart::{fill_path_data, path_data, BarItem, Plot, ScaleBounds, SeriesNormalizer};
use nutrirs::config::AppConfig;
use nutrirs::error::{ErrorSeverity, NutriRsError};
use nutrirs::import::ImportManager;
use nutrirs::logging::{init_logging, LogFormat, LogLevel};
use nutrirs::models::{DailyRecord, Metric, MetricSeries};
use nutrirs::progress::{GoalProgressTracker, ProgressStatus};
use nutrirs::scoring::{MacroBreakdown, MacroQualityScorer, MacroStatus, ScoreBand};
use nutrirs::trends::{TrendDirection, TrendResult, TrendSynthesizer};

/// NutriRS - Nutrition Analytics CLI
///
/// Goal progress, nutrition quality scores, trends and chart geometry for
/// daily nutrition and workout logs.
#[derive(Parser)]
#[command(name = "nutrirs")]
#[command(author = "NutriRS Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Nutrition Analytics CLI", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log level override (error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL", global = true)]
    log_level: Option<LogLevel>,

    /// Log output format (pretty, json, compact)
    #[arg(long, value_name = "FORMAT", global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show progress toward each daily nutrient goal
    Progress {
        /// Day-series file (JSON or CSV)
        #[arg(short, long)]
        file: PathBuf,

        /// Day to report (defaults to the latest day in the file)
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Score one day's macro balance
    Score {
        /// Day-series file (JSON or CSV)
        #[arg(short, long)]
        file: PathBuf,

        /// Day to score (defaults to the latest day in the file)
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Compare the first and second half of the series
    Trend {
        /// Day-series file (JSON or CSV)
        #[arg(short, long)]
        file: PathBuf,

        /// Single metric to analyze (default: calories, protein and workouts)
        #[arg(short, long)]
        metric: Option<Metric>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Line chart geometry for one metric
    Chart {
        /// Day-series file (JSON or CSV)
        #[arg(short, long)]
        file: PathBuf,

        /// Metric to plot
        #[arg(short, long, default_value = "calories")]
        metric: Metric,

        /// Fixed lower bound of the value axis
        #[arg(long)]
        min: Option<f64>,

        /// Fixed upper bound of the value axis
        #[arg(long)]
        max: Option<f64>,

        /// Print JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Sparkline geometry for one metric
    Sparkline {
        /// Day-series file (JSON or CSV)
        #[arg(short, long)]
        file: PathBuf,

        /// Metric to plot
        #[arg(short, long, default_value = "calories")]
        metric: Metric,

        /// Print JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Completed vs planned workouts with bar geometry
    Workouts {
        /// Day-series file (JSON or CSV)
        #[arg(short, long)]
        file: PathBuf,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Weighted adherence score over the series
    Adherence {
        /// Day-series file (JSON or CSV)
        #[arg(short, long)]
        file: PathBuf,

        /// Wearable average calories burned per day
        #[arg(long, requires = "active_minutes")]
        calories_burned: Option<Decimal>,

        /// Wearable average active minutes per day
        #[arg(long, requires = "calories_burned")]
        active_minutes: Option<Decimal>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Current streaks of days meeting each goal
    Streaks {
        /// Day-series file (JSON or CSV)
        #[arg(short, long)]
        file: PathBuf,

        /// Reference day (defaults to today)
        #[arg(short, long)]
        today: Option<NaiveDate>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Configure application settings
    Config {
        /// List all configuration options
        #[arg(short, long)]
        list: bool,

        /// Set a configuration value (key=value)
        #[arg(short, long)]
        set: Option<String>,

        /// Get a configuration value
        #[arg(short, long)]
        get: Option<String>,
    },
}

#[derive(Tabled)]
struct ProgressRow {
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Current")]
    current: String,
    #[tabled(rename = "Goal")]
    goal: String,
    #[tabled(rename = "Progress")]
    percent: String,
    #[tabled(rename = "")]
    bar: String,
    #[tabled(rename = "Status")]
    status: String,
}

#[derive(Tabled)]
struct MacroRow {
    #[tabled(rename = "Macro")]
    name: &'static str,
    #[tabled(rename = "Grams")]
    grams: String,
    #[tabled(rename = "kcal")]
    calories: String,
    #[tabled(rename = "% of kcal")]
    percent: String,
    #[tabled(rename = "Goal")]
    goal: String,
    #[tabled(rename = "Status")]
    status: String,
}

#[derive(Tabled)]
struct TrendRow {
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "First half")]
    first: String,
    #[tabled(rename = "Second half")]
    second: String,
    #[tabled(rename = "Change")]
    change: String,
}

#[derive(Tabled)]
struct KeyValueRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Value")]
    value: String,
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        report_error(&err);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path)?,
        None => AppConfig::load_or_default()?,
    };

    let log_config = config
        .logging
        .clone()
        .with_verbosity(cli.verbose)
        .with_overrides(cli.log_level, cli.log_format);
    init_logging(&log_config)
        .context("Failed to initialize logging")?;

    match cli.command {
        Commands::Progress { file, date, json } => {
            let records = load_records(&file)?;
            let day = select_day(&records, date)?;
            let tracker = GoalProgressTracker::with_config(config.progress.clone());
            let progress = tracker.daily_progress(day, &config.goals);

            if json {
                return print_json(&progress);
            }

            println!("{} {}", "Goal progress for".green().bold(), day.date);
            let rows: Vec<ProgressRow> = progress
                .iter()
                .map(|p| ProgressRow {
                    metric: p.metric.to_string(),
                    current: format!("{} {}", p.current.round_dp(1), p.metric.unit()),
                    goal: format!("{} {}", p.goal.round_dp(1), p.metric.unit()),
                    percent: format!("{}%", p.percent),
                    bar: progress_bar(p.display_percent),
                    status: colorize_status(p.status),
                })
                .collect();
            println!("{}", Table::new(rows).with(Style::rounded()));
        }

        Commands::Score { file, date, json } => {
            let records = load_records(&file)?;
            let day = select_day(&records, date)?;
            let scorer = MacroQualityScorer::with_thresholds(config.scoring.clone());
            let analysis = scorer.analyze(day, &config.goals);

            if json {
                return print_json(&analysis);
            }

            println!("{} {}", "Nutrition quality for".blue().bold(), day.date);
            let rows = vec![
                macro_row("Protein", &analysis.protein),
                macro_row("Carbs", &analysis.carbs),
                macro_row("Fat", &analysis.fat),
            ];
            println!("{}", Table::new(rows).with(Style::rounded()));
            println!(
                "  Calories: {} kcal ({:?})",
                analysis.total_calories.round_dp(0),
                analysis.calorie_status
            );
            println!(
                "  Components: protein {} + calorie accuracy {} + balance {}",
                analysis.components.protein,
                analysis.components.calorie_accuracy,
                analysis.components.balance
            );
            println!(
                "  Score: {} {}",
                colorize_band(analysis.quality.band, analysis.quality.value.to_string()),
                analysis.quality.band.description().dimmed()
            );
        }

        Commands::Trend { file, metric, json } => {
            let records = load_records(&file)?;
            let synthesizer = TrendSynthesizer::new();

            let trends: Vec<TrendResult> = match metric {
                Some(metric) => vec![synthesizer.synthesize_metric(&records, metric)],
                None => {
                    let summary = synthesizer.synthesize(&records);
                    vec![summary.calories, summary.protein, summary.workouts]
                }
            };

            if json {
                return print_json(&trends);
            }

            println!(
                "{} ({} days)",
                "Half-over-half trends".cyan().bold(),
                records.len()
            );
            if records.len() < 2 {
                println!("{}", "  Not enough data for a meaningful comparison".yellow());
            }
            let rows: Vec<TrendRow> = trends
                .iter()
                .map(|t| TrendRow {
                    metric: t.metric.to_string(),
                    first: t.first_half_avg.to_string(),
                    second: t.second_half_avg.to_string(),
                    change: colorize_change(t),
                })
                .collect();
            println!("{}", Table::new(rows).with(Style::rounded()));
        }

        Commands::Chart {
            file,
            metric,
            min,
            max,
            json,
        } => {
            let records = load_records(&file)?;
            let series = MetricSeries::from_records(&records, metric);
            let normalizer = SeriesNormalizer::with_config(config.chart.clone());
            let plot = normalizer.line_chart(&series, ScaleBounds::new(min, max));

            if json {
                return print_json(&plot);
            }

            let geometry = match &plot {
                Plot::NoData => {
                    println!("{}", "No data to chart".yellow());
                    return Ok(());
                }
                Plot::Geometry(geometry) => geometry,
            };

            println!("{} {}", "Line chart for".magenta().bold(), metric);
            println!("  Value axis: {} .. {}", geometry.y_min, geometry.y_max);
            if let Some(stats) = SeriesNormalizer::stats(&series) {
                println!(
                    "  Average {} / peak {} / low {}",
                    stats.average, stats.peak, stats.low
                );
            }
            println!("  Path: {}", path_data(&geometry.path_vertices));
            println!("  Fill: {}", fill_path_data(&geometry.fill_vertices));
            let rows: Vec<KeyValueRow> = geometry
                .gridlines
                .iter()
                .map(|g| KeyValueRow {
                    key: format!("y = {}", g.y),
                    value: g.value.to_string(),
                })
                .chain(geometry.x_labels.iter().map(|l| KeyValueRow {
                    key: format!("x = {}", l.x),
                    value: l.text.clone(),
                }))
                .collect();
            println!("{}", Table::new(rows).with(Style::rounded()));
        }

        Commands::Sparkline { file, metric, json } => {
            let records = load_records(&file)?;
            let values = MetricSeries::from_records(&records, metric).values();
            let normalizer = SeriesNormalizer::with_config(config.chart.clone());
            let plot = normalizer.sparkline(&values);

            if json {
                return print_json(&plot);
            }

            match plot {
                Plot::NoData => println!("{}", "No data to chart".yellow()),
                Plot::Geometry(geometry) => {
                    println!("{} {}", "Sparkline for".magenta().bold(), metric);
                    println!("  Range: {} .. {}", geometry.min, geometry.max);
                    println!("  Path: {}", path_data(&geometry.path_vertices));
                    println!("  Fill: {}", fill_path_data(&geometry.fill_vertices));
                }
            }
        }

        Commands::Workouts { file, json } => {
            let records = load_records(&file)?;
            let completion = TrendSynthesizer::new().workout_completion(&records);
            let items: Vec<BarItem> = records
                .iter()
                .map(|r| BarItem {
                    date: r.date,
                    completed: r.workouts_completed,
                    planned: r.workouts_planned,
                })
                .collect();
            let plot = SeriesNormalizer::with_config(config.chart.clone()).bar_chart(&items);

            if json {
                return print_json(&serde_json::json!({
                    "completion": completion,
                    "bars": plot,
                }));
            }

            println!("{}", "Workout completion".cyan().bold());
            println!(
                "  {} of {} planned workouts completed ({}%)",
                completion.total_completed, completion.total_planned, completion.completion_rate
            );
            if let Some(geometry) = plot.geometry() {
                let rows: Vec<KeyValueRow> = geometry
                    .bars
                    .iter()
                    .map(|bar| KeyValueRow {
                        key: bar.label.text.clone(),
                        value: format!(
                            "planned {:.0}% / completed {:.0}%",
                            bar.planned_percent, bar.completed_percent
                        ),
                    })
                    .collect();
                println!("{}", Table::new(rows).with(Style::rounded()));
            }
        }

        Commands::Adherence {
            file,
            calories_burned,
            active_minutes,
            json,
        } => {
            let records = load_records(&file)?;
            let wearable = match (calories_burned, active_minutes) {
                (Some(avg_calories_burned), Some(avg_active_minutes)) => Some(WearableSummary {
                    avg_calories_burned,
                    avg_active_minutes,
                    days: records.len() as u32,
                }),
                _ => None,
            };
            let calculator = AdherenceCalculator::with_config(config.adherence.clone());
            let result = calculator.score(&records, &config.goals, wearable.as_ref());

            if json {
                return print_json(&result);
            }

            println!("{}", "Adherence".green().bold());
            let rows = vec![
                KeyValueRow {
                    key: "Calories".to_string(),
                    value: format!("{}%", result.details.calories),
                },
                KeyValueRow {
                    key: "Protein".to_string(),
                    value: format!("{}%", result.details.protein),
                },
                KeyValueRow {
                    key: "Workouts".to_string(),
                    value: format!("{}%", result.details.workouts),
                },
            ];
            println!("{}", Table::new(rows).with(Style::rounded()));
            let suffix = if result.wearable_blended {
                " (blended with wearable data)"
            } else {
                ""
            };
            println!("  Score: {}{}", result.score.to_string().bold(), suffix.dimmed());
        }

        Commands::Streaks { file, today, json } => {
            let records = load_records(&file)?;
            let today = today.unwrap_or_else(|| Local::now().date_naive());
            let calculator = AdherenceCalculator::with_config(config.adherence.clone());
            let streaks = calculator.streaks(&records, &config.goals, today);

            if json {
                return print_json(&streaks);
            }

            println!("{} {}", "Streaks as of".green().bold(), today);
            let rows = vec![
                KeyValueRow {
                    key: "Diet".to_string(),
                    value: format!("{} days", streaks.diet),
                },
                KeyValueRow {
                    key: "Protein".to_string(),
                    value: format!("{} days", streaks.protein),
                },
                KeyValueRow {
                    key: "Workout".to_string(),
                    value: format!("{} days", streaks.workout),
                },
            ];
            println!("{}", Table::new(rows).with(Style::rounded()));
        }

        Commands::Config { list, set, get } => {
            let config_path = cli
                .config
                .clone()
                .unwrap_or_else(AppConfig::default_config_path);
            handle_config(config, &config_path, list, set, get)?;
        }
    }

    Ok(())
}

fn handle_config(
    mut config: AppConfig,
    config_path: &Path,
    list: bool,
    set: Option<String>,
    get: Option<String>,
) -> Result<()> {
    if let Some(key_value) = set {
        let (key, value) = key_value
            .split_once('=')
            .with_context(|| format!("Expected key=value, got {}", key_value))?;
        config.set_value(key.trim(), value.trim())?;
        config.save_to_file(config_path)?;
        println!(
            "{} {} = {}",
            "✓ Set".green(),
            key.trim(),
            config.get_value(key.trim())?
        );
    } else if let Some(key) = get {
        println!("{}", config.get_value(&key)?);
    } else if list {
        let rows: Vec<KeyValueRow> = config
            .list_values()?
            .into_iter()
            .map(|(key, value)| KeyValueRow { key, value })
            .collect();
        println!("{}", Table::new(rows).with(Style::rounded()));
    } else {
        println!("Config file: {}", config_path.display());
    }
    Ok(())
}

/// Print the friendliest message available for a failed command
fn report_error(err: &anyhow::Error) {
    match err.chain().find_map(|cause| cause.downcast_ref::<NutriRsError>()) {
        Some(nutri_err) => {
            let label = match nutri_err.severity() {
                ErrorSeverity::Warning => "Warning:".yellow().bold(),
                ErrorSeverity::Error => "Error:".red().bold(),
            };
            tracing::debug!(error = %err, "Command failed");
            eprintln!("{} {}", label, nutri_err.user_message());
        }
        None => eprintln!("{} {:#}", "Error:".red().bold(), err),
    }
}

fn load_records(file: &Path) -> Result<Vec<DailyRecord>> {
    ImportManager::new()
        .import_file(file)
        .with_context(|| format!("Failed to import {}", file.display()))
}

fn select_day(records: &[DailyRecord], date: Option<NaiveDate>) -> Result<&DailyRecord> {
    match date {
        Some(date) => records
            .iter()
            .find(|r| r.date == date)
            .with_context(|| format!("No entry for {}", date)),
        None => match records.last() {
            Some(day) => Ok(day),
            None => bail!("The file contains no days"),
        },
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn macro_row(name: &'static str, breakdown: &MacroBreakdown) -> MacroRow {
    let status = match breakdown.status {
        MacroStatus::Good => "good".green(),
        MacroStatus::Fair => "fair".yellow(),
        MacroStatus::Poor => "poor".red(),
    };
    MacroRow {
        name,
        grams: breakdown.grams.round_dp(1).to_string(),
        calories: breakdown.calories.round_dp(0).to_string(),
        percent: format!("{}%", breakdown.rounded_percent()),
        goal: breakdown.goal.round_dp(1).to_string(),
        status: status.to_string(),
    }
}

fn progress_bar(display_percent: i64) -> String {
    let filled = (display_percent / 5).clamp(0, 20) as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(20 - filled))
}

fn colorize_status(status: ProgressStatus) -> String {
    match status {
        ProgressStatus::Under => status.label().yellow().to_string(),
        ProgressStatus::Near => status.label().green().to_string(),
        ProgressStatus::Over => status.label().red().to_string(),
    }
}

fn colorize_band(band: ScoreBand, text: String) -> ColoredString {
    match band {
        ScoreBand::Excellent => text.green().bold(),
        ScoreBand::Good => text.green(),
        ScoreBand::Fair => text.yellow(),
        ScoreBand::Poor => text.red(),
    }
}

fn colorize_change(trend: &TrendResult) -> String {
    let text = format!("{:+}%", trend.percent_change);
    match trend.direction() {
        TrendDirection::Increasing => text.green().to_string(),
        TrendDirection::Decreasing => text.red().to_string(),
        TrendDirection::Stable => text.dimmed().to_string(),
    }
}
