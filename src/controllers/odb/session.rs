use chrono::{DateTime, Utc};
use log::debug;
use sqlx::SqliteConnection;

use crate::constants::SESSION_ID_LEN;
use crate::models::OdbSession;
use crate::utils::error::TelemetryError;

/// Controller for drive sessions.
pub struct SessionController;

impl SessionController {
    /// Derives a session id from a timestamp: stringified float epoch
    /// seconds with the dot removed, truncated to 12 characters.
    pub fn derive_id(date: DateTime<Utc>) -> String {
        let secs = date.timestamp();
        let mut fraction = format!("{:06}", date.timestamp_subsec_micros());
        while fraction.len() > 1 && fraction.ends_with('0') {
            fraction.pop();
        }
        let mut id = format!("{}{}", secs, fraction);
        id.truncate(SESSION_ID_LEN);
        id
    }

    pub async fn find(
        conn: &mut SqliteConnection,
        id: &str,
    ) -> Result<Option<OdbSession>, TelemetryError> {
        let session =
            sqlx::query_as::<_, OdbSession>("SELECT id, user_id, date FROM odb_sessions WHERE id = ?")
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?;
        Ok(session)
    }

    pub async fn create(
        conn: &mut SqliteConnection,
        id: &str,
        user_id: i64,
        date: DateTime<Utc>,
    ) -> Result<OdbSession, TelemetryError> {
        sqlx::query("INSERT INTO odb_sessions (id, user_id, date) VALUES (?, ?, ?)")
            .bind(id)
            .bind(user_id)
            .bind(date)
            .execute(&mut *conn)
            .await?;

        Ok(OdbSession {
            id: id.to_string(),
            user_id,
            date,
        })
    }

    /// Returns the session for (user, token), creating it on first sight.
    pub async fn get_or_create(
        conn: &mut SqliteConnection,
        user_id: i64,
        token: &str,
    ) -> Result<OdbSession, TelemetryError> {
        let existing = sqlx::query_as::<_, OdbSession>(
            "SELECT id, user_id, date FROM odb_sessions WHERE id = ? AND user_id = ?",
        )
        .bind(token)
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;

        if let Some(session) = existing {
            debug!("Reusing session {}", session.id);
            return Ok(session);
        }

        Self::create(conn, token, user_id, Utc::now()).await
    }

    /// Sessions recorded for a user, newest first.
    pub async fn for_user(
        conn: &mut SqliteConnection,
        user_id: i64,
    ) -> Result<Vec<OdbSession>, TelemetryError> {
        let sessions = sqlx::query_as::<_, OdbSession>(
            "SELECT id, user_id, date FROM odb_sessions WHERE user_id = ? ORDER BY date DESC",
        )
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(sessions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_derive_id_integer_seconds() {
        // Python's str(1597775914.0) is "1597775914.0"; dot removed gives
        // the seconds followed by a bare zero.
        let date = Utc.timestamp_opt(1_597_775_914, 0).unwrap();
        assert_eq!(SessionController::derive_id(date), "15977759140");
    }

    #[test]
    fn test_derive_id_fractional_seconds_truncate_to_12() {
        let date = Utc.timestamp_opt(1_597_775_914, 250_000_000).unwrap();
        assert_eq!(SessionController::derive_id(date), "159777591425");

        let date = Utc.timestamp_opt(1_597_775_914, 123_456_000).unwrap();
        let id = SessionController::derive_id(date);
        assert_eq!(id, "159777591412");
        assert_eq!(id.len(), 12);
    }

    #[test]
    fn test_derive_id_is_deterministic() {
        let date = Utc.timestamp_opt(1_600_000_000, 500_000_000).unwrap();
        assert_eq!(
            SessionController::derive_id(date),
            SessionController::derive_id(date)
        );
    }
}
