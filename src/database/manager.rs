use duckdb::{params, Connection, Result as DuckResult, Row};
use log::{debug, error, info};
use std::fs;
use std::path::Path;

use super::schema::{DatabaseSchema, METRICS_TABLE, RAW_TABLE};
use super::store::StoreError;
use crate::types::{DerivedMetrics, MovementPattern, RawSample, StoredRaw};
use crate::utils::timestamp_from_millis;

const DERIVED_COLUMNS: &str = "timestamp_ms, speed, kick_detected, kick_power, step_detected, \
     movement_pattern, jump_height, impact_force, rotation_rate";

/// 只追加的两张表：原始采样与派生指标
pub struct DatabaseManager {
    conn: Connection,
}

/// 派生指标的行数据，movement_pattern 尚未解析
struct DerivedRow {
    timestamp_ms: i64,
    speed: f64,
    kick_detected: bool,
    kick_power: f64,
    step_detected: bool,
    movement_pattern: String,
    jump_height: f64,
    impact_force: f64,
    rotation_rate: f64,
}

impl DerivedRow {
    fn from_row(row: &Row<'_>) -> DuckResult<Self> {
        Ok(Self {
            timestamp_ms: row.get(0)?,
            speed: row.get(1)?,
            kick_detected: row.get(2)?,
            kick_power: row.get(3)?,
            step_detected: row.get(4)?,
            movement_pattern: row.get(5)?,
            jump_height: row.get(6)?,
            impact_force: row.get(7)?,
            rotation_rate: row.get(8)?,
        })
    }

    fn into_metrics(self) -> Result<DerivedMetrics, StoreError> {
        let movement_pattern = self
            .movement_pattern
            .parse::<MovementPattern>()
            .map_err(|e| StoreError::CorruptRecord(e.to_string()))?;

        Ok(DerivedMetrics {
            timestamp: timestamp_from_millis(self.timestamp_ms),
            speed: self.speed,
            kick_detected: self.kick_detected,
            kick_power: self.kick_power,
            step_detected: self.step_detected,
            movement_pattern,
            jump_height: self.jump_height,
            impact_force: self.impact_force,
            rotation_rate: self.rotation_rate,
        })
    }
}

impl DatabaseManager {
    pub fn open<P: AsRef<Path>>(db_path: P, auto_create_dir: bool) -> Result<Self, StoreError> {
        let db_path = db_path.as_ref();

        // 确保数据目录存在
        if auto_create_dir {
            if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
                if let Err(e) = fs::create_dir_all(parent) {
                    error!("Failed to create data directory {}: {}", parent.display(), e);
                }
            }
        }

        let conn = Connection::open(db_path)?;
        info!("Database connection established at: {}", db_path.display());

        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        DatabaseSchema::create_tables(&conn)?;
        Ok(DatabaseManager { conn })
    }

    pub fn append_raw(&self, sample: &RawSample) -> DuckResult<i64> {
        let id = self.conn.query_row(
            "INSERT INTO raw_sensor_data (timestamp_ms, acc_x, acc_y, acc_z, gyro_x, gyro_y, gyro_z)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             RETURNING id",
            params![
                sample.timestamp.timestamp_millis(),
                sample.acc_x,
                sample.acc_y,
                sample.acc_z,
                sample.gyro_x,
                sample.gyro_y,
                sample.gyro_z,
            ],
            |row| row.get::<_, i64>(0),
        )?;

        debug!("Saved raw sample {} to database", id);
        Ok(id)
    }

    pub fn append_derived(&self, metrics: &DerivedMetrics) -> DuckResult<i64> {
        let id = self.conn.query_row(
            "INSERT INTO processed_metrics (timestamp_ms, speed, kick_detected, kick_power, step_detected,
                 movement_pattern, jump_height, impact_force, rotation_rate)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING id",
            params![
                metrics.timestamp.timestamp_millis(),
                metrics.speed,
                metrics.kick_detected,
                metrics.kick_power,
                metrics.step_detected,
                metrics.movement_pattern.as_str(),
                metrics.jump_height,
                metrics.impact_force,
                metrics.rotation_rate,
            ],
            |row| row.get::<_, i64>(0),
        )?;

        debug!("Saved derived metrics {} to database", id);
        Ok(id)
    }

    /// 最近的 limit 条派生指标，最新的在前
    pub fn most_recent_derived(&self, limit: usize) -> Result<Vec<DerivedMetrics>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let sql = format!(
            "SELECT {} FROM processed_metrics ORDER BY timestamp_ms DESC, id DESC LIMIT ?",
            DERIVED_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([limit], DerivedRow::from_row)?;

        let mut metrics = Vec::new();
        for row in rows {
            metrics.push(row?.into_metrics()?);
        }
        Ok(metrics)
    }

    /// 全部派生指标，按写入顺序
    pub fn all_derived(&self) -> Result<Vec<DerivedMetrics>, StoreError> {
        let sql = format!(
            "SELECT {} FROM processed_metrics ORDER BY timestamp_ms, id",
            DERIVED_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], DerivedRow::from_row)?;

        let mut metrics = Vec::new();
        for row in rows {
            metrics.push(row?.into_metrics()?);
        }
        Ok(metrics)
    }

    pub fn most_recent_raw(&self) -> DuckResult<Option<StoredRaw>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, timestamp_ms, acc_x, acc_y, acc_z, gyro_x, gyro_y, gyro_z
             FROM raw_sensor_data
             ORDER BY timestamp_ms DESC, id DESC
             LIMIT 1",
        )?;

        let mut rows = stmt.query_map([], |row| {
            Ok(StoredRaw {
                id: row.get(0)?,
                sample: RawSample {
                    timestamp: timestamp_from_millis(row.get(1)?),
                    acc_x: row.get(2)?,
                    acc_y: row.get(3)?,
                    acc_z: row.get(4)?,
                    gyro_x: row.get(5)?,
                    gyro_y: row.get(6)?,
                    gyro_z: row.get(7)?,
                },
            })
        })?;

        let latest = rows.next().transpose()?;
        Ok(latest)
    }

    /// (原始记录数, 派生记录数)
    pub fn get_stats(&self) -> DuckResult<(usize, usize)> {
        let count = |table: &str| -> DuckResult<usize> {
            self.conn
                .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                    Ok(row.get::<_, i64>(0)? as usize)
                })
        };

        Ok((count(RAW_TABLE)?, count(METRICS_TABLE)?))
    }
}
