use duckdb::{Connection, Result as DuckResult};
use log::info;

pub const RAW_TABLE: &str = "raw_sensor_data";
pub const METRICS_TABLE: &str = "processed_metrics";

pub struct DatabaseSchema;

impl DatabaseSchema {
    pub fn create_tables(conn: &Connection) -> DuckResult<()> {
        Self::create_raw_table(conn)?;
        Self::create_metrics_table(conn)?;
        Self::create_recency_indexes(conn)?;

        info!("Database tables created successfully");
        Ok(())
    }

    fn create_raw_table(conn: &Connection) -> DuckResult<()> {
        conn.execute("CREATE SEQUENCE IF NOT EXISTS raw_sensor_data_seq", [])?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS raw_sensor_data (
                id BIGINT PRIMARY KEY DEFAULT nextval('raw_sensor_data_seq'),
                timestamp_ms BIGINT NOT NULL,
                acc_x DOUBLE NOT NULL,
                acc_y DOUBLE NOT NULL,
                acc_z DOUBLE NOT NULL,
                gyro_x DOUBLE DEFAULT 0.0,
                gyro_y DOUBLE DEFAULT 0.0,
                gyro_z DOUBLE DEFAULT 0.0,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;

        Ok(())
    }

    fn create_metrics_table(conn: &Connection) -> DuckResult<()> {
        conn.execute("CREATE SEQUENCE IF NOT EXISTS processed_metrics_seq", [])?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS processed_metrics (
                id BIGINT PRIMARY KEY DEFAULT nextval('processed_metrics_seq'),
                timestamp_ms BIGINT NOT NULL,
                speed DOUBLE NOT NULL,
                kick_detected BOOLEAN NOT NULL,
                kick_power DOUBLE NOT NULL,
                step_detected BOOLEAN NOT NULL,
                movement_pattern VARCHAR NOT NULL,
                jump_height DOUBLE NOT NULL,
                impact_force DOUBLE NOT NULL,
                rotation_rate DOUBLE NOT NULL,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;

        Ok(())
    }

    fn create_recency_indexes(conn: &Connection) -> DuckResult<()> {
        conn.execute(
            "CREATE INDEX IF NOT EXISTS raw_sensor_data_ts_idx ON raw_sensor_data (timestamp_ms)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS processed_metrics_ts_idx ON processed_metrics (timestamp_ms)",
            [],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creating_tables_twice_is_harmless() {
        let conn = Connection::open_in_memory().unwrap();
        DatabaseSchema::create_tables(&conn).unwrap();
        DatabaseSchema::create_tables(&conn).unwrap();

        for table in [RAW_TABLE, METRICS_TABLE] {
            let count: i64 = conn
                .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
                .unwrap();
            assert_eq!(count, 0);
        }
    }
}
