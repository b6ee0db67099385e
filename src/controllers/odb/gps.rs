use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::ingest::TripLog;
use crate::models::{GpsReading, OdbSession};
use crate::storage::tables;
use crate::utils::error::TelemetryError;

/// Controller for GPS position readings.
pub struct GpsController;

impl GpsController {
    pub async fn register_reading(
        conn: &mut SqliteConnection,
        session: &OdbSession,
        latitude: f64,
        longitude: f64,
        date: DateTime<Utc>,
    ) -> Result<GpsReading, TelemetryError> {
        let result = sqlx::query(&format!(
            "INSERT INTO {} (session_id, latitude, longitude, date) VALUES (?, ?, ?, ?)",
            tables::GPS
        ))
        .bind(&session.id)
        .bind(latitude)
        .bind(longitude)
        .bind(date)
        .execute(&mut *conn)
        .await?;

        Ok(GpsReading {
            id: result.last_insert_rowid(),
            session_id: session.id.clone(),
            latitude,
            longitude,
            date,
        })
    }

    /// Inserts one GPS reading per trip-log row, inside the caller's
    /// transaction.
    pub async fn register_from_csv(
        conn: &mut SqliteConnection,
        session: &OdbSession,
        log: &TripLog,
    ) -> Result<Vec<GpsReading>, TelemetryError> {
        let mut readings = Vec::with_capacity(log.len());
        for row in log.rows() {
            let reading =
                Self::register_reading(conn, session, row.latitude, row.longitude, row.device_time)
                    .await?;
            readings.push(reading);
        }
        Ok(readings)
    }

    /// GPS readings of a session ordered by time.
    pub async fn readings_for_session(
        conn: &mut SqliteConnection,
        session_id: &str,
    ) -> Result<Vec<GpsReading>, TelemetryError> {
        let readings = sqlx::query_as::<_, GpsReading>(&format!(
            "SELECT id, session_id, latitude, longitude, date FROM {} WHERE session_id = ? ORDER BY date, id",
            tables::GPS
        ))
        .bind(session_id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(readings)
    }
}
