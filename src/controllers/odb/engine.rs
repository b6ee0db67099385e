use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::controllers::odb::{insert_sensor_reading, sensor_readings_for_session};
use crate::ingest::TripLog;
use crate::models::{OdbSession, SensorReading};
use crate::storage::tables;
use crate::utils::error::TelemetryError;

/// Controller for engine sensor readings: load, RPM and vehicle speed.
pub struct EngineController;

impl EngineController {
    pub async fn register_load(
        conn: &mut SqliteConnection,
        session: &OdbSession,
        value: f64,
        date: DateTime<Utc>,
    ) -> Result<SensorReading, TelemetryError> {
        insert_sensor_reading(conn, tables::ENGINE_LOAD, &session.id, value, date).await
    }

    pub async fn register_rpm(
        conn: &mut SqliteConnection,
        session: &OdbSession,
        value: f64,
        date: DateTime<Utc>,
    ) -> Result<SensorReading, TelemetryError> {
        insert_sensor_reading(conn, tables::ENGINE_RPM, &session.id, value, date).await
    }

    pub async fn register_load_from_csv(
        conn: &mut SqliteConnection,
        session: &OdbSession,
        log: &TripLog,
    ) -> Result<Vec<SensorReading>, TelemetryError> {
        let mut readings = Vec::with_capacity(log.len());
        for row in log.rows() {
            readings.push(
                insert_sensor_reading(conn, tables::ENGINE_LOAD, &session.id, row.engine_load, row.device_time)
                    .await?,
            );
        }
        Ok(readings)
    }

    pub async fn register_rpm_from_csv(
        conn: &mut SqliteConnection,
        session: &OdbSession,
        log: &TripLog,
    ) -> Result<Vec<SensorReading>, TelemetryError> {
        let mut readings = Vec::with_capacity(log.len());
        for row in log.rows() {
            readings.push(
                insert_sensor_reading(conn, tables::ENGINE_RPM, &session.id, row.engine_rpm, row.device_time)
                    .await?,
            );
        }
        Ok(readings)
    }

    // Speed only arrives through trip logs; TORQUE does not post it live.
    pub async fn register_speed_from_csv(
        conn: &mut SqliteConnection,
        session: &OdbSession,
        log: &TripLog,
    ) -> Result<Vec<SensorReading>, TelemetryError> {
        let mut readings = Vec::with_capacity(log.len());
        for row in log.rows() {
            readings.push(
                insert_sensor_reading(conn, tables::SPEED, &session.id, row.speed, row.device_time)
                    .await?,
            );
        }
        Ok(readings)
    }

    pub async fn loads_for_session(
        conn: &mut SqliteConnection,
        session_id: &str,
    ) -> Result<Vec<SensorReading>, TelemetryError> {
        sensor_readings_for_session(conn, tables::ENGINE_LOAD, session_id).await
    }

    pub async fn rpms_for_session(
        conn: &mut SqliteConnection,
        session_id: &str,
    ) -> Result<Vec<SensorReading>, TelemetryError> {
        sensor_readings_for_session(conn, tables::ENGINE_RPM, session_id).await
    }

    pub async fn speeds_for_session(
        conn: &mut SqliteConnection,
        session_id: &str,
    ) -> Result<Vec<SensorReading>, TelemetryError> {
        sensor_readings_for_session(conn, tables::SPEED, session_id).await
    }
}
