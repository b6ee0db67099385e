pub mod migrations;
pub mod sqlite_manager;

pub use sqlite_manager::{DatabaseStats, SqliteManager};

/// Reading table names, one per sensor type.
pub mod tables {
    pub const GPS: &str = "gps_readings";
    pub const ENGINE_LOAD: &str = "engine_load_readings";
    pub const ENGINE_RPM: &str = "engine_rpm_readings";
    pub const SPEED: &str = "speed_readings";
    pub const FUEL_LEVEL: &str = "fuel_level_readings";

    pub const ALL: [&str; 5] = [GPS, ENGINE_LOAD, ENGINE_RPM, SPEED, FUEL_LEVEL];
}
