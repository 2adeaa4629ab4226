use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 一条带时间戳的惯性采样，对应 `raw_sensor_data` 表中的一行
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RawSample {
    pub timestamp: DateTime<Utc>,
    pub acc_x: f64,
    pub acc_y: f64,
    pub acc_z: f64,
    pub gyro_x: f64,
    pub gyro_y: f64,
    pub gyro_z: f64,
}

impl RawSample {
    pub fn new(timestamp: DateTime<Utc>, acc: [f64; 3], gyro: [f64; 3]) -> Self {
        Self {
            timestamp,
            acc_x: acc[0],
            acc_y: acc[1],
            acc_z: acc[2],
            gyro_x: gyro[0],
            gyro_y: gyro[1],
            gyro_z: gyro[2],
        }
    }
}
