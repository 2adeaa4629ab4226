use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use eframe::{egui, Frame};
use log::info;

use super::charts::render_view;
use super::refresher::{DashboardRefresher, RecentMetricsSource};
use crate::config::DashboardConfig;
use crate::database::StoreHandle;
use crate::utils::format_timestamp;

/// 检查外部关闭信号的间隔
const SHUTDOWN_POLL: Duration = Duration::from_millis(250);

pub struct DashboardApp<S> {
    refresher: DashboardRefresher<S>,
    shutdown_signal: Option<Arc<AtomicBool>>,
}

impl<S: RecentMetricsSource> DashboardApp<S> {
    pub fn new(source: S, config: &DashboardConfig) -> Self {
        info!(
            "Dashboard started: refresh every {} ms, window of {} records",
            config.refresh_interval_ms, config.window_size
        );
        Self {
            refresher: DashboardRefresher::new(source, config),
            shutdown_signal: None,
        }
    }

    /// 信号置位时关闭窗口（例如 Ctrl-C）
    pub fn with_shutdown_signal(mut self, shutdown_signal: Arc<AtomicBool>) -> Self {
        self.shutdown_signal = Some(shutdown_signal);
        self
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown_signal
            .as_ref()
            .is_some_and(|signal| signal.load(Ordering::Relaxed))
    }

    fn render_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("status_bar")
            .min_height(32.0)
            .show(ctx, |ui| {
                ui.add_space(4.0);
                ui.horizontal(|ui| {
                    let views = self.refresher.views();

                    if let Some(error) = self.refresher.last_error() {
                        ui.colored_label(egui::Color32::from_rgb(150, 0, 0), format!("Refresh failed: {}", error));
                    } else if views.is_empty() {
                        ui.colored_label(egui::Color32::from_rgb(255, 165, 0), "Waiting for data");
                    } else {
                        ui.colored_label(egui::Color32::from_rgb(0, 150, 0), "Live");
                    }

                    ui.separator();
                    ui.label(format!("Samples: {}", views.sample_count));

                    if let (Some(origin), Some(latest)) = (views.origin, views.latest) {
                        ui.separator();
                        ui.label(format!("From {} to {}", format_timestamp(&origin), format_timestamp(&latest)));
                    }
                });
            });
    }

    fn render_charts(&self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                // 两列网格，按固定顺序排列
                for pair in self.refresher.views().views.chunks(2) {
                    ui.columns(2, |columns| {
                        for (column, view) in columns.iter_mut().zip(pair) {
                            render_view(column, view);
                        }
                    });
                    ui.separator();
                }
            });
        });
    }
}

impl<S: RecentMetricsSource> eframe::App for DashboardApp<S> {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        if self.shutdown_requested() {
            info!("Shutdown requested, closing dashboard");
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            return;
        }

        ctx.set_visuals(egui::Visuals::light());

        self.refresher.poll(Instant::now());

        self.render_status_bar(ctx);
        self.render_charts(ctx);

        let next = self.refresher.time_until_next(Instant::now());
        ctx.request_repaint_after(next.min(SHUTDOWN_POLL));
    }
}

/// 在当前线程运行窗口，直到窗口关闭
pub fn run_dashboard(
    store: StoreHandle,
    config: &DashboardConfig,
    shutdown_signal: Arc<AtomicBool>,
) -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions {
        vsync: true,
        hardware_acceleration: eframe::HardwareAcceleration::Preferred,
        renderer: eframe::Renderer::Glow,
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.width, config.height])
            .with_resizable(true),
        ..Default::default()
    };

    let app = DashboardApp::new(store, config).with_shutdown_signal(shutdown_signal);
    eframe::run_native(&config.title, options, Box::new(move |_cc| Ok(Box::new(app))))
}
