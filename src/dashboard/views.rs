//! Chart view models for the dashboard.
//!
//! Views are rebuilt from scratch on every refresh from the current window of
//! derived metrics. Nothing is carried over between refreshes.

use chrono::{DateTime, Utc};

use crate::types::{DerivedMetrics, MovementPattern};

pub const VIEW_COUNT: usize = 8;
/// 仪表盘量程 = 窗口内最大速度 × 1.1
pub const GAUGE_HEADROOM: f64 = 1.1;

pub const SPEED_GAUGE: &str = "speed-gauge";
pub const KICK_DETECTION_BAR: &str = "kick-detection-bar";
pub const KICK_POWER_SCATTER: &str = "kick-power-scatter";
pub const STEP_DETECTION_HISTOGRAM: &str = "step-detection-histogram";
pub const MOVEMENT_PATTERN_PIE: &str = "movement-pattern-pie";
pub const JUMP_HEIGHT_BAR: &str = "jump-height-bar";
pub const IMPACT_FORCE_HEATMAP: &str = "impact-force-heatmap";
pub const ROTATION_RATE_LINE: &str = "rotation-rate-line";

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub pattern: MovementPattern,
    pub count: usize,
    pub fraction: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeatCell {
    pub time: f64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartKind {
    Gauge { value: f64, max: f64 },
    Bar { points: Vec<[f64; 2]> },
    Scatter { points: Vec<[f64; 2]> },
    Histogram { bins: Vec<HistogramBin> },
    Pie { slices: Vec<PieSlice> },
    Heatmap { cells: Vec<HeatCell>, min: f64, max: f64 },
    Line { points: Vec<[f64; 2]> },
    /// 窗口为空时的占位图
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartView {
    pub id: &'static str,
    pub title: &'static str,
    pub x_label: &'static str,
    pub y_label: &'static str,
    pub color: [u8; 3],
    pub kind: ChartKind,
}

impl ChartView {
    fn new(id: &'static str, title: &'static str, kind: ChartKind) -> Self {
        Self {
            id,
            title,
            x_label: "Time (s)",
            y_label: "",
            color: [128, 128, 128],
            kind,
        }
    }

    fn y_label(mut self, label: &'static str) -> Self {
        self.y_label = label;
        self
    }

    fn color(mut self, color: [u8; 3]) -> Self {
        self.color = color;
        self
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.kind, ChartKind::Empty)
    }
}

/// 某一次刷新得到的全部 8 个视图
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardViews {
    pub views: Vec<ChartView>,
    /// 时间轴原点（窗口内最早的样本）
    pub origin: Option<DateTime<Utc>>,
    pub latest: Option<DateTime<Utc>>,
    pub sample_count: usize,
}

impl DashboardViews {
    pub fn empty() -> Self {
        let views = layout()
            .into_iter()
            .map(|(id, title)| ChartView::new(id, title, ChartKind::Empty))
            .collect();

        Self {
            views,
            origin: None,
            latest: None,
            sample_count: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sample_count == 0
    }

    pub fn get(&self, id: &str) -> Option<&ChartView> {
        self.views.iter().find(|v| v.id == id)
    }
}

impl Default for DashboardViews {
    fn default() -> Self {
        Self::empty()
    }
}

fn layout() -> [(&'static str, &'static str); VIEW_COUNT] {
    [
        (SPEED_GAUGE, "Speed"),
        (KICK_DETECTION_BAR, "Kick Detection over Time"),
        (KICK_POWER_SCATTER, "Kick Power Over Time"),
        (STEP_DETECTION_HISTOGRAM, "Step Detection Frequency"),
        (MOVEMENT_PATTERN_PIE, "Movement Pattern Distribution"),
        (JUMP_HEIGHT_BAR, "Jump Height Over Time"),
        (IMPACT_FORCE_HEATMAP, "Impact Force Heatmap"),
        (ROTATION_RATE_LINE, "Rotation Rate Over Time"),
    ]
}

fn seconds_since(origin: DateTime<Utc>, timestamp: DateTime<Utc>) -> f64 {
    (timestamp - origin).num_milliseconds() as f64 / 1000.0
}

/// Build all eight views from a window of metrics (any order; the store
/// returns newest first). An empty window yields eight `Empty` views.
pub fn build_views(window: &[DerivedMetrics], histogram_bins: usize) -> DashboardViews {
    // 转为时间升序；时间戳相同时保持写入顺序
    let mut series: Vec<&DerivedMetrics> = window.iter().rev().collect();
    series.sort_by_key(|m| m.timestamp);

    let (first, last) = match (series.first(), series.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return DashboardViews::empty(),
    };

    let origin = first.timestamp;
    let times: Vec<f64> = series.iter().map(|m| seconds_since(origin, m.timestamp)).collect();
    let points = |f: fn(&DerivedMetrics) -> f64| -> Vec<[f64; 2]> {
        times.iter().zip(&series).map(|(&t, m)| [t, f(m)]).collect()
    };

    let max_speed = series.iter().map(|m| m.speed).fold(0.0, f64::max);

    let step_times: Vec<f64> = times
        .iter()
        .zip(&series)
        .filter(|(_, m)| m.step_detected)
        .map(|(&t, _)| t)
        .collect();
    let span = times.last().copied().unwrap_or(0.0);

    let cells: Vec<HeatCell> = times
        .iter()
        .zip(&series)
        .map(|(&time, m)| HeatCell { time, value: m.impact_force })
        .collect();
    let (heat_min, heat_max) = cells.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), c| {
        (lo.min(c.value), hi.max(c.value))
    });

    let [gauge, kick_bar, kick_scatter, steps, pie, jump_bar, heatmap, rotation] = layout();

    let views = vec![
        ChartView::new(gauge.0, gauge.1, ChartKind::Gauge {
            value: last.speed,
            max: max_speed * GAUGE_HEADROOM,
        }),
        ChartView::new(kick_bar.0, kick_bar.1, ChartKind::Bar {
            points: points(|m| if m.kick_detected { 1.0 } else { 0.0 }),
        })
        .y_label("Kick Detected (1/0)")
        .color([255, 165, 0]),
        ChartView::new(kick_scatter.0, kick_scatter.1, ChartKind::Scatter {
            points: points(|m| m.kick_power),
        })
        .y_label("Kick Power")
        .color([0, 0, 255]),
        ChartView::new(steps.0, steps.1, ChartKind::Histogram {
            bins: histogram(&step_times, span, histogram_bins),
        })
        .y_label("Frequency")
        .color([128, 0, 128]),
        ChartView::new(pie.0, pie.1, ChartKind::Pie {
            slices: pattern_distribution(&series),
        }),
        ChartView::new(jump_bar.0, jump_bar.1, ChartKind::Bar {
            points: points(|m| m.jump_height),
        })
        .y_label("Jump Height (m)")
        .color([0, 128, 0]),
        ChartView::new(heatmap.0, heatmap.1, ChartKind::Heatmap {
            cells,
            min: heat_min,
            max: heat_max,
        }),
        ChartView::new(rotation.0, rotation.1, ChartKind::Line {
            points: points(|m| m.rotation_rate),
        })
        .y_label("Rotation Rate")
        .color([255, 0, 0]),
    ];

    DashboardViews {
        views,
        origin: Some(origin),
        latest: Some(last.timestamp),
        sample_count: series.len(),
    }
}

/// 在 [0, span] 上等宽分箱；span 为 0 时只有一个箱
pub fn histogram(values: &[f64], span: f64, bins: usize) -> Vec<HistogramBin> {
    let bins = if span > 0.0 { bins.max(1) } else { 1 };
    let width = if span > 0.0 { span / bins as f64 } else { 1.0 };

    let mut result: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            start: i as f64 * width,
            end: (i + 1) as f64 * width,
            count: 0,
        })
        .collect();

    for &v in values {
        // 最后一个箱包含右端点
        let index = ((v / width).floor() as usize).min(bins - 1);
        result[index].count += 1;
    }

    result
}

/// 各运动模式计数，按数量降序，只保留出现过的模式
fn pattern_distribution(series: &[&DerivedMetrics]) -> Vec<PieSlice> {
    let total = series.len();
    if total == 0 {
        return Vec::new();
    }

    let mut slices: Vec<PieSlice> = MovementPattern::ALL
        .into_iter()
        .map(|pattern| {
            let count = series.iter().filter(|m| m.movement_pattern == pattern).count();
            PieSlice {
                pattern,
                count,
                fraction: count as f64 / total as f64,
            }
        })
        .filter(|s| s.count > 0)
        .collect();

    slices.sort_by(|a, b| b.count.cmp(&a.count));
    slices
}
