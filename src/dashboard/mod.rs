//! Live dashboard: eight charts over the most recent derived metrics.

pub mod app;
pub mod charts;
pub mod refresher;
pub mod views;

pub use app::{run_dashboard, DashboardApp};
pub use refresher::{DashboardRefresher, RecentMetricsSource};
pub use views::{build_views, ChartKind, ChartView, DashboardViews, VIEW_COUNT};
