use sqlx::SqliteConnection;

use crate::models::User;
use crate::utils::error::TelemetryError;

/// Accessors for user records. Registration proper lives outside this
/// subsystem; `create` exists for the maintenance CLI and tests.
pub struct UserController;

impl UserController {
    pub async fn find_by_email(
        conn: &mut SqliteConnection,
        email: &str,
    ) -> Result<Option<User>, TelemetryError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, first_name, last_name FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(user)
    }

    pub async fn create(
        conn: &mut SqliteConnection,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
        bcrypt_cost: u32,
    ) -> Result<User, TelemetryError> {
        let password_hash = bcrypt::hash(password, bcrypt_cost)
            .map_err(|e| TelemetryError::InvalidData(format!("failed to hash password: {}", e)))?;

        let result = sqlx::query(
            "INSERT INTO users (email, password_hash, first_name, last_name) VALUES (?, ?, ?, ?)",
        )
        .bind(email)
        .bind(&password_hash)
        .bind(first_name)
        .bind(last_name)
        .execute(&mut *conn)
        .await?;

        Ok(User {
            id: result.last_insert_rowid(),
            email: email.to_string(),
            password_hash,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
        })
    }
}
