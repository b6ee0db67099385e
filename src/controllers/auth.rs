use std::collections::HashMap;

use log::info;
use sqlx::SqliteConnection;

use crate::controllers::user::UserController;
use crate::controllers::validators;
use crate::models::User;
use crate::utils::error::TelemetryError;

/// Controller for authentication related data.
pub struct AuthController;

impl AuthController {
    /// Validates login credentials and returns the matching user.
    ///
    /// Unknown email and wrong password produce the same generic
    /// authentication error.
    pub async fn login(
        conn: &mut SqliteConnection,
        data: &HashMap<String, String>,
    ) -> Result<User, TelemetryError> {
        let payload = validators::validate_login(data)?;

        let user = UserController::find_by_email(conn, &payload.email)
            .await?
            .ok_or_else(TelemetryError::incorrect_credentials)?;

        let password_matches = bcrypt::verify(&payload.password, &user.password_hash)
            .map_err(|_| TelemetryError::incorrect_credentials())?;
        if !password_matches {
            return Err(TelemetryError::incorrect_credentials());
        }

        info!("Login succeeded for user {}", user.id);
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteManager;

    // Minimum cost keeps hashing fast in tests
    const TEST_COST: u32 = 4;

    async fn setup() -> SqliteManager {
        let manager = SqliteManager::in_memory().await.unwrap();
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
        .unwrap();
        manager
    }

    fn credentials(email: &str, password: &str) -> HashMap<String, String> {
        let mut data = HashMap::new();
        data.insert("email".to_string(), email.to_string());
        data.insert("password".to_string(), password.to_string());
        data
    }

    #[tokio::test]
    async fn test_login_with_correct_password_returns_user() {
        let manager = setup().await;
        let mut conn = manager.pool().acquire().await.unwrap();

        let user = AuthController::login(&mut conn, &credentials("driver@example.com", "hunter2"))
            .await
            .unwrap();
        assert_eq!(user.email, "driver@example.com");
        assert_eq!(user.full_name(), "Ada Lovelace");
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_email_are_indistinguishable() {
        let manager = setup().await;
        let mut conn = manager.pool().acquire().await.unwrap();

        let wrong_password =
            AuthController::login(&mut conn, &credentials("driver@example.com", "wrong"))
                .await
                .unwrap_err();
        let unknown_email =
            AuthController::login(&mut conn, &credentials("nobody@example.com", "hunter2"))
                .await
                .unwrap_err();

        assert!(matches!(wrong_password, TelemetryError::Authentication(_)));
        assert!(matches!(unknown_email, TelemetryError::Authentication(_)));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
        assert_eq!(wrong_password.to_string(), "Incorrect user and/or password");
    }

    #[tokio::test]
    async fn test_malformed_payload_is_validation_error() {
        let manager = setup().await;
        let mut conn = manager.pool().acquire().await.unwrap();

        let err = AuthController::login(&mut conn, &HashMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, TelemetryError::Validation(_)));
    }
}
