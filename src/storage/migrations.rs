use log::info;
use sqlx::SqlitePool;

use crate::storage::tables;
use crate::utils::error::TelemetryError;

pub struct DatabaseMigrations;

impl DatabaseMigrations {
    pub async fn run_migrations(pool: &SqlitePool) -> Result<(), TelemetryError> {
        // Create migration tracking table
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS migrations (
                id INTEGER PRIMARY KEY,
                version TEXT NOT NULL UNIQUE,
                applied_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
        "#,
        )
        .execute(pool)
        .await
        .map_err(|e| TelemetryError::Database(format!("failed to create migrations table: {}", e)))?;

        Self::apply_migration_v1(pool).await?;
        Self::apply_migration_v2(pool).await?;

        Ok(())
    }

    async fn is_applied(pool: &SqlitePool, version: &str) -> bool {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM migrations WHERE version = ?)")
            .bind(version)
            .fetch_one(pool)
            .await
            .unwrap_or(false)
    }

    async fn record(pool: &SqlitePool, version: &str) -> Result<(), TelemetryError> {
        sqlx::query("INSERT INTO migrations (version) VALUES (?)")
            .bind(version)
            .execute(pool)
            .await
            .map_err(|e| {
                TelemetryError::Database(format!("failed to record migration {}: {}", version, e))
            })?;
        Ok(())
    }

    async fn apply_migration_v1(pool: &SqlitePool) -> Result<(), TelemetryError> {
        if !Self::is_applied(pool, "v1").await {
            info!("Applying migration v1: index odb_sessions by user");

            sqlx::query("CREATE INDEX IF NOT EXISTS idx_sessions_user ON odb_sessions(user_id)")
                .execute(pool)
                .await?;

            Self::record(pool, "v1").await?;
        }

        Ok(())
    }

    async fn apply_migration_v2(pool: &SqlitePool) -> Result<(), TelemetryError> {
        if !Self::is_applied(pool, "v2").await {
            info!("Applying migration v2: composite (session_id, date) reading indexes");

            for table in tables::ALL {
                sqlx::query(&format!(
                    "CREATE INDEX IF NOT EXISTS idx_{}_session_date ON {}(session_id, date)",
                    table, table
                ))
                .execute(pool)
                .await?;
            }

            Self::record(pool, "v2").await?;
        }

        Ok(())
    }
}
