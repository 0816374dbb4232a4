//! Chart geometry
//!
//! Maps metric series onto a pixel canvas for line, bar and sparkline
//! charts. Output is a set of vertices and labels for an external renderer
//! (SVG, canvas, terminal); nothing here draws.
//!
//! Coordinates follow screen convention: `y` grows downwards, so larger
//! values get smaller `y`.

use crate::models::{round_to_i64, safe_div, safe_sum, MetricSeries};
use chrono::NaiveDate;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Drawing surface dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    pub width: f64,
    pub height: f64,
    pub padding: f64,
}

impl Canvas {
    pub fn new(width: f64, height: f64, padding: f64) -> Self {
        Canvas {
            width,
            height,
            padding,
        }
    }

    /// Full-size line/bar chart canvas
    pub fn line_default() -> Self {
        Canvas::new(800.0, 300.0, 50.0)
    }

    /// Summary-card sparkline canvas
    pub fn sparkline_default() -> Self {
        Canvas::new(120.0, 36.0, 4.0)
    }

    /// Baseline `y` of the plot area
    pub fn baseline(&self) -> f64 {
        self.height - self.padding
    }
}

/// Chart layout settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartConfig {
    /// Vertical space reserved for axis labels (px)
    pub label_inset: f64,

    /// Distance of x-axis labels above the bottom edge (px)
    pub x_label_offset: f64,

    /// Fractions of the value range that get a gridline
    pub gridline_fractions: Vec<f64>,

    /// Target maximum number of x-axis labels
    pub max_x_labels: usize,

    /// Gap between the planned and completed bar in a slot (px)
    pub bar_gap: f64,

    pub line_canvas: Canvas,
    pub sparkline_canvas: Canvas,
}

impl Default for ChartConfig {
    fn default() -> Self {
        ChartConfig {
            label_inset: 20.0,
            x_label_offset: 15.0,
            gridline_fractions: vec![0.0, 0.25, 0.5, 0.75, 1.0],
            max_x_labels: 8,
            bar_gap: 2.0,
            line_canvas: Canvas::line_default(),
            sparkline_canvas: Canvas::sparkline_default(),
        }
    }
}

/// Optional explicit value range
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScaleBounds {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl ScaleBounds {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        ScaleBounds {
            min: min.filter(|v| v.is_finite()),
            max: max.filter(|v| v.is_finite()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub x: f64,
    pub y: f64,
}

impl Vertex {
    pub fn new(x: f64, y: f64) -> Self {
        Vertex { x, y }
    }
}

/// Horizontal gridline with its axis label value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gridline {
    pub y: f64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisLabel {
    pub index: usize,
    pub x: f64,
    pub y: f64,
    pub text: String,
}

/// Line chart geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartGeometry {
    pub path_vertices: Vec<Vertex>,
    /// Path closed down to the baseline for area fill
    pub fill_vertices: Vec<Vertex>,
    pub gridlines: Vec<Gridline>,
    pub x_labels: Vec<AxisLabel>,
    pub y_min: f64,
    pub y_max: f64,
}

/// Sparkline geometry, scaled to the local min/max of its values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparklineGeometry {
    pub path_vertices: Vec<Vertex>,
    pub fill_vertices: Vec<Vertex>,
    pub min: f64,
    pub max: f64,
}

/// One day of the completed vs planned workout chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarItem {
    pub date: NaiveDate,
    pub completed: u32,
    pub planned: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarGeometry {
    pub date: NaiveDate,
    /// Planned bar, absent when nothing was planned
    pub planned: Option<Rect>,
    /// Completed bar, absent when nothing was completed
    pub completed: Option<Rect>,
    /// Bar heights as percent of the chart's shared maximum
    pub planned_percent: f64,
    pub completed_percent: f64,
    pub label: AxisLabel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarChartGeometry {
    pub bars: Vec<BarGeometry>,
    pub max: f64,
}

/// Geometry or an explicit "nothing to draw" marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "geometry", rename_all = "snake_case")]
pub enum Plot<G> {
    NoData,
    Geometry(G),
}

impl<G> Plot<G> {
    pub fn is_no_data(&self) -> bool {
        matches!(self, Plot::NoData)
    }

    pub fn geometry(&self) -> Option<&G> {
        match self {
            Plot::Geometry(g) => Some(g),
            Plot::NoData => None,
        }
    }
}

/// Average/peak/low summary shown under a line chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesStats {
    pub average: i64,
    pub peak: f64,
    pub low: f64,
}

/// Value-to-pixel mapping for a line chart
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineScale {
    canvas: Canvas,
    min: f64,
    max: f64,
    step_x: f64,
    plot_height: f64,
}

impl LineScale {
    pub fn to_x(&self, index: usize) -> f64 {
        self.canvas.padding + index as f64 * self.step_x
    }

    pub fn to_y(&self, value: f64) -> f64 {
        let range = non_zero(self.max - self.min);
        self.canvas.height - self.canvas.padding - ((value - self.min) / range) * self.plot_height
    }

    pub fn step_x(&self) -> f64 {
        self.step_x
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

/// Series-to-pixel coordinate mapper
#[derive(Debug, Clone, Default)]
pub struct SeriesNormalizer {
    config: ChartConfig,
}

impl SeriesNormalizer {
    pub fn new() -> Self {
        SeriesNormalizer {
            config: ChartConfig::default(),
        }
    }

    pub fn with_config(config: ChartConfig) -> Self {
        SeriesNormalizer { config }
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    /// Build the scale for `values` on `canvas`
    pub fn line_scale(&self, values: &[f64], canvas: Canvas, bounds: ScaleBounds) -> LineScale {
        let max = bounds.max.unwrap_or_else(|| {
            let observed = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            if observed.is_finite() && observed != 0.0 {
                observed
            } else {
                1.0
            }
        });
        let min = bounds.min.unwrap_or(0.0);
        let intervals = values.len().saturating_sub(1).max(1) as f64;

        LineScale {
            canvas,
            min,
            max,
            step_x: (canvas.width - 2.0 * canvas.padding) / intervals,
            plot_height: canvas.height - 2.0 * canvas.padding - self.config.label_inset,
        }
    }

    /// Line chart on the configured canvas
    pub fn line_chart(&self, series: &MetricSeries, bounds: ScaleBounds) -> Plot<ChartGeometry> {
        self.line_chart_on(series, self.config.line_canvas, bounds)
    }

    /// Line chart on an explicit canvas
    pub fn line_chart_on(
        &self,
        series: &MetricSeries,
        canvas: Canvas,
        bounds: ScaleBounds,
    ) -> Plot<ChartGeometry> {
        if series.is_empty() {
            return Plot::NoData;
        }

        let values = to_pixels_input(&series.values());
        let scale = self.line_scale(&values, canvas, bounds);

        let path_vertices: Vec<Vertex> = values
            .iter()
            .enumerate()
            .map(|(i, &v)| Vertex::new(scale.to_x(i), scale.to_y(v)))
            .collect();
        let fill_vertices = close_to_baseline(&path_vertices, canvas.baseline());

        let plot_height = canvas.height - 2.0 * canvas.padding - self.config.label_inset;
        let gridlines = self
            .config
            .gridline_fractions
            .iter()
            .map(|&fraction| Gridline {
                y: canvas.height - canvas.padding - fraction * plot_height,
                value: scale.min + fraction * (scale.max - scale.min),
            })
            .collect();

        let x_labels = self
            .label_indices(values.len())
            .into_iter()
            .map(|i| AxisLabel {
                index: i,
                x: scale.to_x(i),
                y: canvas.height - self.config.x_label_offset,
                text: short_date(series.points()[i].date),
            })
            .collect();

        tracing::trace!(
            points = values.len(),
            y_min = scale.min,
            y_max = scale.max,
            "Built line chart geometry"
        );

        Plot::Geometry(ChartGeometry {
            path_vertices,
            fill_vertices,
            gridlines,
            x_labels,
            y_min: scale.min,
            y_max: scale.max,
        })
    }

    /// Indices that receive an x-axis label: every `stride`-th plus the last
    pub fn label_indices(&self, len: usize) -> Vec<usize> {
        if len == 0 {
            return Vec::new();
        }
        let stride = (len / self.config.max_x_labels.max(1)).max(1);
        (0..len)
            .filter(|&i| i % stride == 0 || i == len - 1)
            .collect()
    }

    /// Sparkline on the configured canvas
    pub fn sparkline(&self, values: &[Decimal]) -> Plot<SparklineGeometry> {
        self.sparkline_on(values, self.config.sparkline_canvas)
    }

    /// Sparkline scaled to its own min/max; flat at mid-height when constant
    pub fn sparkline_on(&self, values: &[Decimal], canvas: Canvas) -> Plot<SparklineGeometry> {
        if values.is_empty() {
            return Plot::NoData;
        }

        let values = to_pixels_input(values);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let pad = canvas.padding;
        let inner_height = canvas.height - 2.0 * pad;
        let step_x = (canvas.width - 2.0 * pad) / values.len().saturating_sub(1).max(1) as f64;

        let to_y = |v: f64| {
            if max == min {
                canvas.height / 2.0
            } else {
                pad + inner_height - ((v - min) / (max - min)) * inner_height
            }
        };

        let path_vertices: Vec<Vertex> = values
            .iter()
            .enumerate()
            .map(|(i, &v)| Vertex::new(pad + i as f64 * step_x, to_y(v)))
            .collect();
        let fill_vertices = close_to_baseline(&path_vertices, canvas.height);

        Plot::Geometry(SparklineGeometry {
            path_vertices,
            fill_vertices,
            min,
            max,
        })
    }

    /// Planned vs completed bars sharing one vertical scale
    pub fn bar_chart(&self, items: &[BarItem]) -> Plot<BarChartGeometry> {
        if items.is_empty() {
            return Plot::NoData;
        }

        let canvas = self.config.line_canvas;
        let max = items
            .iter()
            .map(|it| it.completed.max(it.planned))
            .max()
            .filter(|&m| m > 0)
            .unwrap_or(1) as f64;

        let slot_width = (canvas.width - 2.0 * canvas.padding) / items.len() as f64;
        let bar_width = ((slot_width - self.config.bar_gap) / 2.0).max(0.0);
        let plot_height = canvas.height - 2.0 * canvas.padding - self.config.label_inset;
        let baseline = canvas.baseline();

        let rect = |x: f64, value: u32| -> Option<Rect> {
            if value == 0 {
                return None;
            }
            let height = value as f64 / max * plot_height;
            Some(Rect {
                x,
                y: baseline - height,
                width: bar_width,
                height,
            })
        };

        let bars = items
            .iter()
            .enumerate()
            .map(|(i, it)| {
                let slot_x = canvas.padding + i as f64 * slot_width;
                BarGeometry {
                    date: it.date,
                    planned: rect(slot_x, it.planned),
                    completed: rect(slot_x + bar_width + self.config.bar_gap, it.completed),
                    planned_percent: it.planned as f64 / max * 100.0,
                    completed_percent: it.completed as f64 / max * 100.0,
                    label: AxisLabel {
                        index: i,
                        x: slot_x + slot_width / 2.0,
                        y: canvas.height - self.config.x_label_offset,
                        text: short_date(it.date),
                    },
                }
            })
            .collect();

        Plot::Geometry(BarChartGeometry { bars, max })
    }

    /// Average (rounded), peak and low of a series
    pub fn stats(series: &MetricSeries) -> Option<SeriesStats> {
        if series.is_empty() {
            return None;
        }
        let values = series.values();
        let sum = safe_sum(values.iter().copied());
        let average = round_to_i64(safe_div(sum, Decimal::from(values.len())));
        let floats = to_pixels_input(&values);

        Some(SeriesStats {
            average,
            peak: floats.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            low: floats.iter().copied().fold(f64::INFINITY, f64::min),
        })
    }
}

/// SVG path data for an open polyline, e.g. `M 50 250 L 225 130`
pub fn path_data(vertices: &[Vertex]) -> String {
    vertices
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let command = if i == 0 { 'M' } else { 'L' };
            format!("{} {} {}", command, v.x, v.y)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// SVG path data for a closed area
pub fn fill_path_data(vertices: &[Vertex]) -> String {
    if vertices.is_empty() {
        return String::new();
    }
    format!("{} Z", path_data(vertices))
}

fn close_to_baseline(path: &[Vertex], baseline: f64) -> Vec<Vertex> {
    let mut fill = path.to_vec();
    if let (Some(first), Some(last)) = (path.first(), path.last()) {
        fill.push(Vertex::new(last.x, baseline));
        fill.push(Vertex::new(first.x, baseline));
    }
    fill
}

fn to_pixels_input(values: &[Decimal]) -> Vec<f64> {
    values
        .iter()
        .map(|v| v.to_f64().filter(|f| f.is_finite()).unwrap_or(0.0))
        .collect()
}

fn non_zero(range: f64) -> f64 {
    if range == 0.0 || !range.is_finite() {
        1.0
    } else {
        range
    }
}

fn short_date(date: NaiveDate) -> String {
    date.format("%m-%d").to_string()
}
