//! TORQUE wire constants.
//!
//! Key names used by the TORQUE Android application when uploading live
//! sensor values, plus the fixed column layout of its CSV trip logs.

/// Request key carrying the account email.
pub const EMAIL_KEY: &str = "eml";

/// Request key carrying the client-generated drive session token.
pub const SESSION_KEY: &str = "session";

/// Derived session ids are truncated to this many characters.
pub const SESSION_ID_LEN: usize = 12;

/// Keys under which TORQUE reports instantaneous sensor values.
pub mod labels {
    pub mod gps {
        pub const LATITUDE: &str = "kff1006";
        pub const LONGITUDE: &str = "kff1005";
    }

    pub mod engine {
        pub const LOAD: &str = "k4";
        pub const RPM: &str = "kc";
    }

    pub mod fuel {
        pub const LEVEL: &str = "k2f";
    }
}

/// Key prefixes that mark a request as sensor-metadata configuration
/// rather than readings.
pub mod prefixes {
    pub const FULL_NAME: &str = "userFullName";
}

/// Column names of a TORQUE CSV trip log, mapped to semantic fields.
pub mod csv_columns {
    pub const DEVICE_TIME: &str = "Device Time";
    pub const LATITUDE: &str = "Latitude";
    pub const LONGITUDE: &str = "Longitude";
    pub const ENGINE_LOAD: &str = "Engine Load(%)";
    pub const ENGINE_RPM: &str = "Engine RPM(rpm)";
    pub const SPEED: &str = "Speed (OBD)(km/h)";
    pub const FUEL_LEVEL: &str = "Fuel Level (From Engine ECU)(%)";
}

/// Format of the `Device Time` column, e.g. `23-Aug-2020 13:21:19.250`.
/// The fractional part is optional.
pub const DEVICE_TIME_FORMAT: &str = "%d-%b-%Y %H:%M:%S%.f";
