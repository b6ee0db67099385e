use std::collections::BTreeMap;
use thiserror::Error;

/// Field name -> message map produced by boundary validation.
pub type FieldErrors = BTreeMap<String, String>;

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("validation failed: {}", format_fields(.0))]
    Validation(FieldErrors),

    #[error("{0}")]
    Authentication(String),

    #[error("{0}")]
    Domain(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl TelemetryError {
    /// Generic credential failure. Unknown user and wrong password share this
    /// message so callers cannot enumerate accounts.
    pub fn incorrect_credentials() -> Self {
        TelemetryError::Authentication("Incorrect user and/or password".to_string())
    }
}

fn format_fields(fields: &FieldErrors) -> String {
    fields
        .iter()
        .map(|(field, message)| format!("{}: {}", field, message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<sqlx::Error> for TelemetryError {
    fn from(err: sqlx::Error) -> Self {
        TelemetryError::Database(err.to_string())
    }
}

impl From<csv::Error> for TelemetryError {
    fn from(err: csv::Error) -> Self {
        TelemetryError::Csv(err.to_string())
    }
}

impl From<std::io::Error> for TelemetryError {
    fn from(err: std::io::Error) -> Self {
        TelemetryError::Io(err.to_string())
    }
}
