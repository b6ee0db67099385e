//! Ingestion backend for the TORQUE OBD-II mobile logger.
//!
//! Accepts vehicle telemetry (GPS, engine load/RPM, fuel level, speed) either
//! as live per-request key/value parameters or as bulk CSV trip-log uploads,
//! and persists normalized sensor readings keyed by user and drive session
//! in SQLite.

pub mod cli;
pub mod config;
pub mod constants;
pub mod controllers;
pub mod ingest;
pub mod models;
pub mod storage;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use controllers::odb::{CsvIngest, EngineController, FuelController, GpsController, LiveParams, SessionController};
pub use controllers::{AuthController, OdbController, UserController};
pub use ingest::TripLog;
pub use models::{GpsReading, OdbSession, SensorReading, User};
pub use storage::{DatabaseStats, SqliteManager};
pub use utils::error::TelemetryError;

pub const VERSION: &str = "0.1.0";
