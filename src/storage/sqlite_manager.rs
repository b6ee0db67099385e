use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use log::info;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;

use crate::config::SqliteConfig;
use crate::storage::{migrations::DatabaseMigrations, tables};
use crate::utils::error::TelemetryError;

#[derive(Clone)]
pub struct SqliteManager {
    pool: SqlitePool,
}

impl SqliteManager {
    pub async fn new(config: &SqliteConfig) -> Result<Self, TelemetryError> {
        // Create database directory if it doesn't exist
        if let Some(parent) = Path::new(&config.database_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    TelemetryError::Io(format!("failed to create database directory: {}", e))
                })?;
            }
        }

        info!("Initializing SQLite database: {}", config.database_path);

        let options = SqliteConnectOptions::new()
            .filename(&config.database_path)
            .create_if_missing(true)
            .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
            .foreign_keys(true)
            .journal_mode(if config.enable_wal {
                SqliteJournalMode::Wal
            } else {
                SqliteJournalMode::Delete
            })
            .synchronous(match config.sync_mode.as_str() {
                "OFF" => SqliteSynchronous::Off,
                "FULL" => SqliteSynchronous::Full,
                _ => SqliteSynchronous::Normal,
            });

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| TelemetryError::Database(format!("failed to connect to SQLite: {}", e)))?;

        sqlx::query(&format!("PRAGMA cache_size = -{}", config.cache_size_kb))
            .execute(&pool)
            .await?;

        let manager = Self { pool };
        manager.initialize_schema().await?;
        DatabaseMigrations::run_migrations(&manager.pool).await?;

        info!("SQLite database initialized");
        Ok(manager)
    }

    /// Single-connection in-memory database. The pool keeps its one
    /// connection alive so the database survives between calls.
    pub async fn in_memory() -> Result<Self, TelemetryError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| TelemetryError::Database(e.to_string()))?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let manager = Self { pool };
        manager.initialize_schema().await?;
        DatabaseMigrations::run_migrations(&manager.pool).await?;
        Ok(manager)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn initialize_schema(&self) -> Result<(), TelemetryError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL
            )
        "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS odb_sessions (
                id TEXT PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id),
                date TEXT NOT NULL
            )
        "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS gps_readings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL REFERENCES odb_sessions(id),
                latitude REAL NOT NULL,
                longitude REAL NOT NULL,
                date TEXT NOT NULL
            )
        "#,
        )
        .execute(&self.pool)
        .await?;

        // Single-valued sensor tables share one shape
        for table in [
            tables::ENGINE_LOAD,
            tables::ENGINE_RPM,
            tables::SPEED,
            tables::FUEL_LEVEL,
        ] {
            sqlx::query(&format!(
                r#"
                CREATE TABLE IF NOT EXISTS {} (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    session_id TEXT NOT NULL REFERENCES odb_sessions(id),
                    value REAL NOT NULL,
                    date TEXT NOT NULL
                )
            "#,
                table
            ))
            .execute(&self.pool)
            .await?;
        }

        self.create_indexes().await?;
        Ok(())
    }

    async fn create_indexes(&self) -> Result<(), TelemetryError> {
        for table in tables::ALL {
            sqlx::query(&format!(
                "CREATE INDEX IF NOT EXISTS idx_{}_session ON {}(session_id)",
                table, table
            ))
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    pub async fn stats(&self) -> Result<DatabaseStats, TelemetryError> {
        let count = |sql: String| async move {
            sqlx::query_scalar::<_, i64>(&sql)
                .fetch_one(&self.pool)
                .await
                .map_err(TelemetryError::from)
        };

        Ok(DatabaseStats {
            total_users: count("SELECT COUNT(*) FROM users".to_string()).await?,
            total_sessions: count("SELECT COUNT(*) FROM odb_sessions".to_string()).await?,
            gps_readings: count(format!("SELECT COUNT(*) FROM {}", tables::GPS)).await?,
            engine_load_readings: count(format!("SELECT COUNT(*) FROM {}", tables::ENGINE_LOAD))
                .await?,
            engine_rpm_readings: count(format!("SELECT COUNT(*) FROM {}", tables::ENGINE_RPM))
                .await?,
            speed_readings: count(format!("SELECT COUNT(*) FROM {}", tables::SPEED)).await?,
            fuel_level_readings: count(format!("SELECT COUNT(*) FROM {}", tables::FUEL_LEVEL))
                .await?,
        })
    }

    pub async fn close(&self) {
        info!("Closing SQLite database connections");
        self.pool.close().await;
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseStats {
    pub total_users: i64,
    pub total_sessions: i64,
    pub gps_readings: i64,
    pub engine_load_readings: i64,
    pub engine_rpm_readings: i64,
    pub speed_readings: i64,
    pub fuel_level_readings: i64,
}

impl DatabaseStats {
    pub fn total_readings(&self) -> i64 {
        self.gps_readings
            + self.engine_load_readings
            + self.engine_rpm_readings
            + self.speed_readings
            + self.fuel_level_readings
    }
}
