pub mod error;

pub use error::{FieldErrors, TelemetryError};
