//! Controllers for ODB telemetry: resolves the user and drive session for
//! incoming data and dispatches to the per-sensor sub-controllers.

pub mod engine;
pub mod fuel;
pub mod gps;
pub mod session;

pub use engine::EngineController;
pub use fuel::FuelController;
pub use gps::GpsController;
pub use session::SessionController;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use log::{debug, info};
use sqlx::{SqliteConnection, SqlitePool};

use crate::constants::{labels, prefixes, EMAIL_KEY, SESSION_KEY};
use crate::controllers::user::UserController;
use crate::ingest::TripLog;
use crate::models::{SensorReading, User};
use crate::utils::error::TelemetryError;

/// Typed rendering of a live TORQUE request, parsed at the boundary.
#[derive(Debug, Clone, Default)]
pub struct LiveParams {
    pub email: Option<String>,
    pub session_token: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub fuel_level: Option<f64>,
    pub engine_load: Option<f64>,
    pub engine_rpm: Option<f64>,
    /// True when any key carries the sensor-full-name prefix; the request
    /// then describes sensor metadata, not readings.
    pub metadata_only: bool,
}

impl LiveParams {
    pub fn from_request(data: &HashMap<String, String>) -> Result<Self, TelemetryError> {
        if data.keys().any(|k| k.starts_with(prefixes::FULL_NAME)) {
            return Ok(Self {
                metadata_only: true,
                ..Self::default()
            });
        }

        let float = |key: &str| -> Result<Option<f64>, TelemetryError> {
            data.get(key)
                .map(|raw| {
                    raw.trim().parse::<f64>().map_err(|_| {
                        TelemetryError::InvalidData(format!(
                            "value for '{}' is not numeric: '{}'",
                            key, raw
                        ))
                    })
                })
                .transpose()
        };

        Ok(Self {
            email: data.get(EMAIL_KEY).cloned(),
            session_token: data.get(SESSION_KEY).cloned(),
            latitude: float(labels::gps::LATITUDE)?,
            longitude: float(labels::gps::LONGITUDE)?,
            fuel_level: float(labels::fuel::LEVEL)?,
            engine_load: float(labels::engine::LOAD)?,
            engine_rpm: float(labels::engine::RPM)?,
            metadata_only: false,
        })
    }
}

/// Result of a CSV trip-log upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CsvIngest {
    Ingested { session_id: String, rows: usize },
    /// The derived session id already exists; the whole upload was skipped.
    AlreadyIngested { session_id: String },
}

/// Controller for ODB-related data manipulations.
pub struct OdbController;

impl OdbController {
    /// Processes one live request from the TORQUE application.
    ///
    /// Requests describing sensor metadata are ignored without touching the
    /// database. Otherwise the user and session are resolved and one
    /// timestamped reading is registered per recognized sensor key; missing
    /// keys are skipped.
    pub async fn process_sensor_params(
        conn: &mut SqliteConnection,
        data: &HashMap<String, String>,
    ) -> Result<(), TelemetryError> {
        debug!("Received live payload with {} keys", data.len());

        let params = LiveParams::from_request(data)?;
        if params.metadata_only {
            info!("Ignoring request, payload describes sensor metadata");
            return Ok(());
        }

        let email = params
            .email
            .as_deref()
            .ok_or_else(|| TelemetryError::Domain("User email not found".to_string()))?;
        let user = UserController::find_by_email(conn, email)
            .await?
            .ok_or_else(|| TelemetryError::Domain("User does not exist".to_string()))?;
        info!("Request is attached to {} (user {})", user.full_name(), user.id);

        let token = params
            .session_token
            .as_deref()
            .ok_or_else(|| TelemetryError::Domain("Session token not found".to_string()))?;
        let session = SessionController::get_or_create(conn, user.id, token).await?;
        info!("Resolved session {}", session.to_json());

        let now = Utc::now();

        if let (Some(latitude), Some(longitude)) = (params.latitude, params.longitude) {
            let reading =
                GpsController::register_reading(conn, &session, latitude, longitude, now).await?;
            info!("Saved GPS reading {}", reading.to_json());
        }

        if let Some(level) = params.fuel_level {
            let reading = FuelController::register_level(conn, &session, level, now).await?;
            info!("Saved fuel level {}", reading.to_json());
        }

        if let Some(load) = params.engine_load {
            let reading = EngineController::register_load(conn, &session, load, now).await?;
            info!("Saved engine load {}", reading.to_json());
        }

        if let Some(rpm) = params.engine_rpm {
            let reading = EngineController::register_rpm(conn, &session, rpm, now).await?;
            info!("Saved engine RPM {}", reading.to_json());
        }

        Ok(())
    }

    /// Ingests a CSV trip log for `user`.
    ///
    /// The session id derives from the first row's timestamp; if a session
    /// with that id already exists the whole upload is a silent no-op. All
    /// inserts run in one transaction committed at the end, so any failure
    /// rolls the upload back.
    pub async fn process_csv(
        pool: &SqlitePool,
        user: &User,
        csv_text: &str,
    ) -> Result<CsvIngest, TelemetryError> {
        let log = TripLog::parse(csv_text)?;
        let start_time = log.start_time();
        let session_id = SessionController::derive_id(start_time);

        let mut tx = pool.begin().await?;

        if SessionController::find(&mut tx, &session_id).await?.is_some() {
            info!("Session {} already ingested, skipping upload", session_id);
            return Ok(CsvIngest::AlreadyIngested { session_id });
        }

        let session = SessionController::create(&mut tx, &session_id, user.id, start_time).await?;

        GpsController::register_from_csv(&mut tx, &session, &log).await?;
        EngineController::register_load_from_csv(&mut tx, &session, &log).await?;
        EngineController::register_rpm_from_csv(&mut tx, &session, &log).await?;
        EngineController::register_speed_from_csv(&mut tx, &session, &log).await?;
        FuelController::register_level_from_csv(&mut tx, &session, &log).await?;

        tx.commit().await?;

        info!("Ingested {} rows into session {}", log.len(), session.id);
        Ok(CsvIngest::Ingested {
            session_id: session.id,
            rows: log.len(),
        })
    }
}

/// Inserts one row into a single-valued sensor table. `table` must be one of
/// the constants in [`crate::storage::tables`].
pub(crate) async fn insert_sensor_reading(
    conn: &mut SqliteConnection,
    table: &str,
    session_id: &str,
    value: f64,
    date: DateTime<Utc>,
) -> Result<SensorReading, TelemetryError> {
    let result = sqlx::query(&format!(
        "INSERT INTO {} (session_id, value, date) VALUES (?, ?, ?)",
        table
    ))
    .bind(session_id)
    .bind(value)
    .bind(date)
    .execute(&mut *conn)
    .await?;

    Ok(SensorReading {
        id: result.last_insert_rowid(),
        session_id: session_id.to_string(),
        value,
        date,
    })
}

/// Readings of a session from one sensor table, ordered by time.
pub(crate) async fn sensor_readings_for_session(
    conn: &mut SqliteConnection,
    table: &str,
    session_id: &str,
) -> Result<Vec<SensorReading>, TelemetryError> {
    let readings = sqlx::query_as::<_, SensorReading>(&format!(
        "SELECT id, session_id, value, date FROM {} WHERE session_id = ? ORDER BY date, id",
        table
    ))
    .bind(session_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(readings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteManager;

    const TEST_COST: u32 = 4;

    const TRIP_LOG: &str = "\
GPS Time,Device Time,Longitude,Latitude,GPS Speed (Meters/second),Engine Load(%),Engine RPM(rpm),Speed (OBD)(km/h),Fuel Level (From Engine ECU)(%)
Sun Aug 23 13:21:19 GMT 2020,23-Aug-2020 13:21:19.250,-46.639,-23.548,8.3,42.5,2210.0,63.0,71.0
Sun Aug 23 13:21:20 GMT 2020,23-Aug-2020 13:21:20.250,-46.640,-23.549,8.4,43.0,2250.0,64.0,70.9
Sun Aug 23 13:21:21 GMT 2020,23-Aug-2020 13:21:21.250,-46.641,-23.550,8.5,43.5,2300.0,65.0,70.8
";

    async fn setup() -> (SqliteManager, User) {
        let manager = SqliteManager::in_memory().await.unwrap();
        let user = {
            let mut conn = manager.pool().acquire().await.unwrap();
            UserController::create(
                &mut conn,
                "driver@example.com",
                "hunter2",
                "Ada",
                "Lovelace",
                TEST_COST,
            )
            .await
            .unwrap()
        };
        (manager, user)
    }

    fn request(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    async fn total_rows(manager: &SqliteManager) -> i64 {
        let stats = manager.stats().await.unwrap();
        stats.total_sessions + stats.total_readings()
    }

    #[tokio::test]
    async fn test_metadata_request_is_never_persisted() {
        let (manager, _user) = setup().await;
        let mut conn = manager.pool().acquire().await.unwrap();

        let data = request(&[
            ("userFullName04", "Engine Load"),
            ("eml", "driver@example.com"),
            ("session", "1597775914000"),
        ]);
        OdbController::process_sensor_params(&mut conn, &data)
            .await
            .unwrap();
        drop(conn);

        assert_eq!(total_rows(&manager).await, 0);
    }

    #[tokio::test]
    async fn test_live_request_without_email_is_domain_error() {
        let (manager, _user) = setup().await;
        let mut conn = manager.pool().acquire().await.unwrap();

        let err = OdbController::process_sensor_params(&mut conn, &request(&[("kc", "2210")]))
            .await
            .unwrap_err();
        assert!(matches!(err, TelemetryError::Domain(_)));
        assert_eq!(err.to_string(), "User email not found");

        let err = OdbController::process_sensor_params(
            &mut conn,
            &request(&[("eml", "nobody@example.com"), ("session", "s1"), ("kc", "2210")]),
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "User does not exist");
    }

    #[tokio::test]
    async fn test_latitude_and_longitude_yield_one_gps_reading() {
        let (manager, _user) = setup().await;
        let mut conn = manager.pool().acquire().await.unwrap();

        let data = request(&[
            ("eml", "driver@example.com"),
            ("session", "1597775914000"),
            ("kff1006", "-23.548"),
            ("kff1005", "-46.639"),
        ]);
        OdbController::process_sensor_params(&mut conn, &data)
            .await
            .unwrap();

        let readings = GpsController::readings_for_session(&mut conn, "1597775914000")
            .await
            .unwrap();
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].latitude, -23.548);
        assert_eq!(readings[0].longitude, -46.639);

        // Latitude alone is not a GPS fix
        let partial = request(&[
            ("eml", "driver@example.com"),
            ("session", "1597775914000"),
            ("kff1006", "-23.548"),
        ]);
        OdbController::process_sensor_params(&mut conn, &partial)
            .await
            .unwrap();
        let readings = GpsController::readings_for_session(&mut conn, "1597775914000")
            .await
            .unwrap();
        assert_eq!(readings.len(), 1);
    }

    #[tokio::test]
    async fn test_each_present_sensor_key_is_dispatched() {
        let (manager, _user) = setup().await;
        let mut conn = manager.pool().acquire().await.unwrap();

        let data = request(&[
            ("eml", "driver@example.com"),
            ("session", "tok-1"),
            ("k2f", "71.0"),
            ("k4", "42.5"),
            ("kc", "2210"),
        ]);
        OdbController::process_sensor_params(&mut conn, &data)
            .await
            .unwrap();

        assert_eq!(
            FuelController::levels_for_session(&mut conn, "tok-1").await.unwrap().len(),
            1
        );
        assert_eq!(
            EngineController::loads_for_session(&mut conn, "tok-1").await.unwrap().len(),
            1
        );
        assert_eq!(
            EngineController::rpms_for_session(&mut conn, "tok-1").await.unwrap().len(),
            1
        );
        assert!(GpsController::readings_for_session(&mut conn, "tok-1")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent_per_user_and_token() {
        let (manager, user) = setup().await;
        let mut conn = manager.pool().acquire().await.unwrap();

        let first = SessionController::get_or_create(&mut conn, user.id, "tok-9")
            .await
            .unwrap();
        let second = SessionController::get_or_create(&mut conn, user.id, "tok-9")
            .await
            .unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.date, second.date);
        drop(conn);

        assert_eq!(manager.stats().await.unwrap().total_sessions, 1);
    }

    #[tokio::test]
    async fn test_non_numeric_sensor_value_is_invalid_data() {
        let (manager, _user) = setup().await;
        let mut conn = manager.pool().acquire().await.unwrap();

        let data = request(&[
            ("eml", "driver@example.com"),
            ("session", "tok-1"),
            ("kc", "fast"),
        ]);
        let err = OdbController::process_sensor_params(&mut conn, &data)
            .await
            .unwrap_err();
        assert!(matches!(err, TelemetryError::InvalidData(_)));
    }

    #[tokio::test]
    async fn test_csv_upload_inserts_n_rows_per_sensor_and_one_session() {
        let (manager, user) = setup().await;

        let outcome = OdbController::process_csv(manager.pool(), &user, TRIP_LOG)
            .await
            .unwrap();
        let session_id = match outcome {
            CsvIngest::Ingested { session_id, rows } => {
                assert_eq!(rows, 3);
                session_id
            }
            other => panic!("expected fresh ingest, got {:?}", other),
        };

        let stats = manager.stats().await.unwrap();
        assert_eq!(stats.total_sessions, 1);
        assert_eq!(stats.gps_readings, 3);
        assert_eq!(stats.engine_load_readings, 3);
        assert_eq!(stats.engine_rpm_readings, 3);
        assert_eq!(stats.speed_readings, 3);
        assert_eq!(stats.fuel_level_readings, 3);

        let mut conn = manager.pool().acquire().await.unwrap();
        let session = SessionController::find(&mut conn, &session_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.user_id, user.id);

        // Readings come back ordered by time
        let speeds = EngineController::speeds_for_session(&mut conn, &session_id)
            .await
            .unwrap();
        assert_eq!(
            speeds.iter().map(|r| r.value).collect::<Vec<_>>(),
            vec![63.0, 64.0, 65.0]
        );
    }

    #[tokio::test]
    async fn test_duplicate_csv_upload_is_a_silent_no_op() {
        let (manager, user) = setup().await;

        let first = OdbController::process_csv(manager.pool(), &user, TRIP_LOG)
            .await
            .unwrap();
        let before = total_rows(&manager).await;

        let second = OdbController::process_csv(manager.pool(), &user, TRIP_LOG)
            .await
            .unwrap();

        match (first, second) {
            (
                CsvIngest::Ingested { session_id: a, .. },
                CsvIngest::AlreadyIngested { session_id: b },
            ) => assert_eq!(a, b),
            other => panic!("unexpected outcomes {:?}", other),
        }
        assert_eq!(total_rows(&manager).await, before);
    }

    #[test]
    fn test_live_params_from_request() {
        let data = request(&[
            ("eml", "driver@example.com"),
            ("session", "tok-1"),
            ("kff1006", "-23.5"),
            ("kff1005", "-46.6"),
            ("k2f", "70"),
        ]);
        let params = LiveParams::from_request(&data).unwrap();
        assert!(!params.metadata_only);
        assert_eq!(params.email.as_deref(), Some("driver@example.com"));
        assert_eq!(params.latitude, Some(-23.5));
        assert_eq!(params.longitude, Some(-46.6));
        assert_eq!(params.fuel_level, Some(70.0));
        assert_eq!(params.engine_load, None);
        assert_eq!(params.engine_rpm, None);

        let metadata = request(&[("userFullName0c", "Engine RPM"), ("kc", "not-a-number")]);
        let params = LiveParams::from_request(&metadata).unwrap();
        assert!(params.metadata_only);
    }
}
