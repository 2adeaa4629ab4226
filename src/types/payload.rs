use chrono::{DateTime, Utc};
use serde_json::Value;

use super::RawSample;

/// Errors raised while reading an inbound sample body
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PayloadError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("field {0} must be a number")]
    InvalidField(&'static str),
}

/// 设备上报的原始数据（尚未分配时间戳）
///
/// Wire names follow the device firmware: `accX`, `accY`, `accZ` are required,
/// `gyroX`, `gyroY`, `gyroZ` may be omitted or `null`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplePayload {
    pub acc_x: f64,
    pub acc_y: f64,
    pub acc_z: f64,
    pub gyro_x: f64,
    pub gyro_y: f64,
    pub gyro_z: f64,
}

impl SamplePayload {
    pub fn from_json(value: &Value) -> Result<Self, PayloadError> {
        Ok(Self {
            acc_x: required_axis(value, "accX")?,
            acc_y: required_axis(value, "accY")?,
            acc_z: required_axis(value, "accZ")?,
            gyro_x: optional_axis(value, "gyroX")?,
            gyro_y: optional_axis(value, "gyroY")?,
            gyro_z: optional_axis(value, "gyroZ")?,
        })
    }

    pub fn into_sample(self, timestamp: DateTime<Utc>) -> RawSample {
        RawSample::new(
            timestamp,
            [self.acc_x, self.acc_y, self.acc_z],
            [self.gyro_x, self.gyro_y, self.gyro_z],
        )
    }
}

fn required_axis(value: &Value, field: &'static str) -> Result<f64, PayloadError> {
    match value.get(field) {
        None | Some(Value::Null) => Err(PayloadError::MissingField(field)),
        Some(v) => v.as_f64().ok_or(PayloadError::InvalidField(field)),
    }
}

fn optional_axis(value: &Value, field: &'static str) -> Result<f64, PayloadError> {
    match value.get(field) {
        None | Some(Value::Null) => Ok(0.0),
        Some(v) => v.as_f64().ok_or(PayloadError::InvalidField(field)),
    }
}
