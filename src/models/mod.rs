use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use sqlx::FromRow;

/// Registered account the mobile application attaches readings to.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "email": self.email,
            "first_name": self.first_name,
            "last_name": self.last_name,
        })
    }
}

/// One logical drive. Aggregates many readings of each sensor type.
///
/// The id is either the client-supplied session token (live path) or derived
/// from the first CSV row's timestamp (bulk path).
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OdbSession {
    pub id: String,
    pub user_id: i64,
    pub date: DateTime<Utc>,
}

impl OdbSession {
    pub fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "user_id": self.user_id,
            "date": self.date.to_rfc3339(),
        })
    }
}

/// GPS position reading tied to a drive session.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct GpsReading {
    pub id: i64,
    pub session_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub date: DateTime<Utc>,
}

impl GpsReading {
    pub fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "session_id": self.session_id,
            "latitude": self.latitude,
            "longitude": self.longitude,
            "date": self.date.to_rfc3339(),
        })
    }
}

/// Single-valued sensor reading. The table it came from determines the
/// sensor type (engine load, engine RPM, speed, fuel level).
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SensorReading {
    pub id: i64,
    pub session_id: String,
    pub value: f64,
    pub date: DateTime<Utc>,
}

impl SensorReading {
    pub fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "session_id": self.session_id,
            "value": self.value,
            "date": self.date.to_rfc3339(),
        })
    }
}
