use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::controllers::odb::{insert_sensor_reading, sensor_readings_for_session};
use crate::ingest::TripLog;
use crate::models::{OdbSession, SensorReading};
use crate::storage::tables;
use crate::utils::error::TelemetryError;

/// Controller for fuel level readings.
pub struct FuelController;

impl FuelController {
    pub async fn register_level(
        conn: &mut SqliteConnection,
        session: &OdbSession,
        value: f64,
        date: DateTime<Utc>,
    ) -> Result<SensorReading, TelemetryError> {
        insert_sensor_reading(conn, tables::FUEL_LEVEL, &session.id, value, date).await
    }

    pub async fn register_level_from_csv(
        conn: &mut SqliteConnection,
        session: &OdbSession,
        log: &TripLog,
    ) -> Result<Vec<SensorReading>, TelemetryError> {
        let mut readings = Vec::with_capacity(log.len());
        for row in log.rows() {
            readings.push(
                insert_sensor_reading(conn, tables::FUEL_LEVEL, &session.id, row.fuel_level, row.device_time)
                    .await?,
            );
        }
        Ok(readings)
    }

    pub async fn levels_for_session(
        conn: &mut SqliteConnection,
        session_id: &str,
    ) -> Result<Vec<SensorReading>, TelemetryError> {
        sensor_readings_for_session(conn, tables::FUEL_LEVEL, session_id).await
    }
}
