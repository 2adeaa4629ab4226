use std::time::{Duration, Instant};

use log::{debug, warn};

use super::views::{build_views, DashboardViews};
use crate::config::DashboardConfig;
use crate::database::{StoreError, StoreHandle};
use crate::types::DerivedMetrics;

/// 仪表盘的数据来源
pub trait RecentMetricsSource {
    /// 最近的 limit 条派生指标，最新的在前
    fn recent_metrics(&self, limit: usize) -> Result<Vec<DerivedMetrics>, StoreError>;
}

impl RecentMetricsSource for StoreHandle {
    fn recent_metrics(&self, limit: usize) -> Result<Vec<DerivedMetrics>, StoreError> {
        self.most_recent_derived_blocking(limit)
    }
}

/// Rebuilds the dashboard views on a fixed interval.
///
/// The first `poll` always refreshes. A failed fetch keeps the previously
/// built views and records the error for display.
pub struct DashboardRefresher<S> {
    source: S,
    interval: Duration,
    window_size: usize,
    histogram_bins: usize,
    last_refresh: Option<Instant>,
    views: DashboardViews,
    last_error: Option<String>,
}

impl<S: RecentMetricsSource> DashboardRefresher<S> {
    pub fn new(source: S, config: &DashboardConfig) -> Self {
        Self {
            source,
            interval: config.refresh_interval(),
            window_size: config.window_size,
            histogram_bins: config.histogram_bins,
            last_refresh: None,
            views: DashboardViews::empty(),
            last_error: None,
        }
    }

    pub fn is_due(&self, now: Instant) -> bool {
        match self.last_refresh {
            Some(last) => now.saturating_duration_since(last) >= self.interval,
            None => true,
        }
    }

    /// 到期则刷新，返回是否刷新过
    pub fn poll(&mut self, now: Instant) -> bool {
        if !self.is_due(now) {
            return false;
        }
        self.refresh(now);
        true
    }

    pub fn refresh(&mut self, now: Instant) {
        self.last_refresh = Some(now);

        match self.source.recent_metrics(self.window_size) {
            Ok(window) => {
                debug!("Dashboard refresh: {} records in window", window.len());
                self.views = build_views(&window, self.histogram_bins);
                self.last_error = None;
            }
            Err(e) => {
                warn!("Dashboard refresh failed, keeping previous views: {}", e);
                self.last_error = Some(e.to_string());
            }
        }
    }

    pub fn time_until_next(&self, now: Instant) -> Duration {
        match self.last_refresh {
            Some(last) => self.interval.saturating_sub(now.saturating_duration_since(last)),
            None => Duration::ZERO,
        }
    }

    pub fn views(&self) -> &DashboardViews {
        &self.views
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}
