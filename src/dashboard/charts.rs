use std::f32::consts::{FRAC_PI_2, TAU};

use egui::{Color32, Pos2, RichText, Shape, Stroke};
use egui_plot::{Bar, BarChart, Line, Plot, PlotPoints, Points};

use super::views::{ChartKind, ChartView, HeatCell, HistogramBin, PieSlice};
use crate::types::MovementPattern;

const PLOT_HEIGHT: f32 = 200.0;

/// 热力图色标（低 → 高）
const VIRIDIS: [[u8; 3]; 5] = [
    [68, 1, 84],
    [59, 82, 139],
    [33, 145, 140],
    [94, 201, 98],
    [253, 231, 37],
];

fn rgb(color: [u8; 3]) -> Color32 {
    Color32::from_rgb(color[0], color[1], color[2])
}

/// t 会被截断到 [0, 1]
pub fn viridis(t: f64) -> [u8; 3] {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let scaled = t * (VIRIDIS.len() - 1) as f64;
    let index = (scaled.floor() as usize).min(VIRIDIS.len() - 2);
    let frac = scaled - index as f64;

    let (lo, hi) = (VIRIDIS[index], VIRIDIS[index + 1]);
    let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
    [mix(lo[0], hi[0]), mix(lo[1], hi[1]), mix(lo[2], hi[2])]
}

pub fn pattern_color(pattern: MovementPattern) -> Color32 {
    match pattern {
        MovementPattern::Standing => Color32::from_rgb(99, 110, 250),
        MovementPattern::Walking => Color32::from_rgb(0, 204, 150),
        MovementPattern::Running => Color32::from_rgb(239, 85, 59),
    }
}

pub fn render_view(ui: &mut egui::Ui, view: &ChartView) {
    ui.vertical(|ui| {
        ui.heading(view.title);

        match &view.kind {
            ChartKind::Empty => {
                ui.add_sized([ui.available_width(), PLOT_HEIGHT], egui::Label::new("No data"));
            }
            ChartKind::Gauge { value, max } => render_gauge(ui, *value, *max),
            ChartKind::Pie { slices } => render_pie(ui, slices),
            kind => render_plot(ui, view, kind),
        }
    });
}

fn render_gauge(ui: &mut egui::Ui, value: f64, max: f64) {
    let fraction = if max > 0.0 { (value / max).clamp(0.0, 1.0) } else { 0.0 };

    ui.add_space(20.0);
    ui.label(RichText::new(format!("{:.3}", value)).size(36.0).strong());
    ui.add(
        egui::ProgressBar::new(fraction as f32)
            .desired_width(ui.available_width())
            .fill(Color32::from_rgb(0, 100, 200))
            .text(format!("0 .. {:.3}", max)),
    );
    ui.add_space(PLOT_HEIGHT - 80.0);
}

fn render_pie(ui: &mut egui::Ui, slices: &[PieSlice]) {
    ui.horizontal(|ui| {
        let size = PLOT_HEIGHT;
        let (response, painter) = ui.allocate_painter(egui::vec2(size, size), egui::Sense::hover());
        let center = response.rect.center();
        let radius = size / 2.0 - 4.0;

        let mut start = -FRAC_PI_2;
        for slice in slices {
            let sweep = slice.fraction as f32 * TAU;
            for points in wedge_polygons(center, radius, start, sweep) {
                painter.add(Shape::convex_polygon(points, pattern_color(slice.pattern), Stroke::NONE));
            }
            start += sweep;
        }

        ui.vertical(|ui| {
            for slice in slices {
                ui.colored_label(
                    pattern_color(slice.pattern),
                    format!("■ {}: {} ({:.1}%)", slice.pattern, slice.count, slice.fraction * 100.0),
                );
            }
        });
    });
}

/// 把扇形拆成不超过 90° 的凸多边形
fn wedge_polygons(center: Pos2, radius: f32, start: f32, sweep: f32) -> Vec<Vec<Pos2>> {
    let chunks = (sweep / FRAC_PI_2).ceil().max(1.0) as usize;
    let chunk_sweep = sweep / chunks as f32;
    let steps_per_chunk = 16;

    (0..chunks)
        .map(|c| {
            let chunk_start = start + c as f32 * chunk_sweep;
            let mut points = Vec::with_capacity(steps_per_chunk + 2);
            points.push(center);
            for i in 0..=steps_per_chunk {
                let angle = chunk_start + chunk_sweep * i as f32 / steps_per_chunk as f32;
                points.push(center + radius * egui::vec2(angle.cos(), angle.sin()));
            }
            points
        })
        .collect()
}

fn render_plot(ui: &mut egui::Ui, view: &ChartView, kind: &ChartKind) {
    let color = rgb(view.color);
    let is_heatmap = matches!(kind, ChartKind::Heatmap { .. });

    Plot::new(view.id)
        .height(PLOT_HEIGHT)
        .x_axis_label(view.x_label)
        .y_axis_label(view.y_label)
        .x_axis_formatter(|v, _| format!("{:.1}s", v.value))
        .show_y(!is_heatmap)
        .show_axes([true, !is_heatmap])
        .include_y(0.0)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| match kind {
            ChartKind::Bar { points } => {
                let width = bar_width(points.iter().map(|p| p[0]));
                let bars = points.iter().map(|p| Bar::new(p[0], p[1]).width(width)).collect();
                plot_ui.bar_chart(BarChart::new(view.title, bars).color(color));
            }
            ChartKind::Scatter { points } => {
                plot_ui.points(
                    Points::new(view.title, PlotPoints::from(points.clone()))
                        .radius(4.0)
                        .color(color),
                );
            }
            ChartKind::Histogram { bins } => {
                plot_ui.bar_chart(BarChart::new(view.title, histogram_bars(bins)).color(color));
            }
            ChartKind::Heatmap { cells, min, max } => {
                plot_ui.bar_chart(BarChart::new(view.title, heatmap_bars(cells, *min, *max)));
            }
            ChartKind::Line { points } => {
                plot_ui.line(
                    Line::new(view.title, PlotPoints::from(points.clone()))
                        .color(color)
                        .width(1.5),
                );
                plot_ui.points(
                    Points::new(view.title, PlotPoints::from(points.clone()))
                        .radius(2.5)
                        .color(color),
                );
            }
            ChartKind::Gauge { .. } | ChartKind::Pie { .. } | ChartKind::Empty => {}
        });
}

/// 相邻样本最小间隔的 80%
fn bar_width(xs: impl Iterator<Item = f64>) -> f64 {
    let xs: Vec<f64> = xs.collect();
    let min_gap = xs
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|gap| *gap > 0.0)
        .fold(f64::INFINITY, f64::min);

    if min_gap.is_finite() {
        min_gap * 0.8
    } else {
        0.8
    }
}

fn histogram_bars(bins: &[HistogramBin]) -> Vec<Bar> {
    bins.iter()
        .map(|b| Bar::new((b.start + b.end) / 2.0, b.count as f64).width((b.end - b.start) * 0.95))
        .collect()
}

fn heatmap_bars(cells: &[HeatCell], min: f64, max: f64) -> Vec<Bar> {
    let range = max - min;
    let width = bar_width(cells.iter().map(|c| c.time)) / 0.8;

    cells
        .iter()
        .map(|c| {
            let t = if range > 0.0 { (c.value - min) / range } else { 0.0 };
            Bar::new(c.time, 1.0)
                .width(width)
                .fill(rgb(viridis(t)))
                .name(format!("{:.2}", c.value))
        })
        .collect()
}
