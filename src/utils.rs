use chrono::{DateTime, Local, Utc};

/// 将毫秒时间戳转换为 UTC 时间，超出范围时返回 Unix 纪元
pub fn timestamp_from_millis(timestamp_ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(timestamp_ms).unwrap_or_default()
}

/// 服务端分配的采样时间，截断到毫秒以便与数据库中的值完全一致
pub fn current_timestamp() -> DateTime<Utc> {
    timestamp_from_millis(Utc::now().timestamp_millis())
}

/// 将时间格式化为本地时间 HH:MM:SS.mmm
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.with_timezone(&Local).format("%H:%M:%S%.3f").to_string()
}
