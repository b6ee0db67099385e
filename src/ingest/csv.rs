//! Parsing of CSV trip logs exported by the TORQUE application.
//!
//! Columns are selected by their fixed names; extra columns are ignored.
//! The whole file is parsed up front, there is no streaming.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use csv::{ReaderBuilder, StringRecord, Trim};
use log::debug;

use crate::constants::{csv_columns, DEVICE_TIME_FORMAT};
use crate::utils::error::TelemetryError;

/// One data row of a trip log, mapped to semantic fields.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvRow {
    pub device_time: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub engine_load: f64,
    pub engine_rpm: f64,
    pub speed: f64,
    pub fuel_level: f64,
}

/// A fully parsed trip log. Guaranteed non-empty.
#[derive(Debug, Clone)]
pub struct TripLog {
    rows: Vec<CsvRow>,
}

impl TripLog {
    pub fn parse(text: &str) -> Result<Self, TelemetryError> {
        let mut reader = ReaderBuilder::new()
            .trim(Trim::All)
            .from_reader(text.as_bytes());

        let headers = reader.headers()?.clone();
        let column = |name: &str| -> Result<usize, TelemetryError> {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| TelemetryError::Csv(format!("missing column '{}'", name)))
        };

        let device_time = column(csv_columns::DEVICE_TIME)?;
        let latitude = column(csv_columns::LATITUDE)?;
        let longitude = column(csv_columns::LONGITUDE)?;
        let engine_load = column(csv_columns::ENGINE_LOAD)?;
        let engine_rpm = column(csv_columns::ENGINE_RPM)?;
        let speed = column(csv_columns::SPEED)?;
        let fuel_level = column(csv_columns::FUEL_LEVEL)?;

        let mut rows = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record = record?;
            rows.push(CsvRow {
                device_time: parse_device_time(field(&record, device_time, line)?)?,
                latitude: parse_float(&record, latitude, line)?,
                longitude: parse_float(&record, longitude, line)?,
                engine_load: parse_float(&record, engine_load, line)?,
                engine_rpm: parse_float(&record, engine_rpm, line)?,
                speed: parse_float(&record, speed, line)?,
                fuel_level: parse_float(&record, fuel_level, line)?,
            });
        }

        if rows.is_empty() {
            return Err(TelemetryError::Csv("trip log contains no data rows".to_string()));
        }

        debug!("Parsed trip log with {} rows", rows.len());
        Ok(Self { rows })
    }

    /// Timestamp of the first row. Anchors the identity of the session
    /// derived from this upload.
    pub fn start_time(&self) -> DateTime<Utc> {
        self.rows[0].device_time
    }

    pub fn rows(&self) -> &[CsvRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn field<'r>(record: &'r StringRecord, index: usize, line: usize) -> Result<&'r str, TelemetryError> {
    record
        .get(index)
        .ok_or_else(|| TelemetryError::Csv(format!("row {}: missing field {}", line + 1, index)))
}

fn parse_float(record: &StringRecord, index: usize, line: usize) -> Result<f64, TelemetryError> {
    let raw = field(record, index, line)?;
    raw.parse::<f64>().map_err(|_| {
        TelemetryError::Csv(format!("row {}: value '{}' is not numeric", line + 1, raw))
    })
}

fn parse_device_time(raw: &str) -> Result<DateTime<Utc>, TelemetryError> {
    let naive = NaiveDateTime::parse_from_str(raw, DEVICE_TIME_FORMAT)
        .map_err(|e| TelemetryError::Csv(format!("invalid device time '{}': {}", raw, e)))?;
    Ok(Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    const SAMPLE: &str = "\
GPS Time,Device Time,Longitude,Latitude,GPS Speed (Meters/second),Engine Load(%),Engine RPM(rpm),Speed (OBD)(km/h),Fuel Level (From Engine ECU)(%)
Sun Aug 23 13:21:19 GMT 2020,23-Aug-2020 13:21:19.250,-46.639,-23.548,8.3,42.5,2210.0,63.0,71.0
Sun Aug 23 13:21:20 GMT 2020,23-Aug-2020 13:21:20.250,-46.640,-23.549,8.4,43.0,2250.0,64.0,70.9
";

    #[test]
    fn test_parses_rows_by_column_name() {
        let log = TripLog::parse(SAMPLE).unwrap();
        assert_eq!(log.len(), 2);

        let first = &log.rows()[0];
        assert_eq!(first.latitude, -23.548);
        assert_eq!(first.longitude, -46.639);
        assert_eq!(first.engine_load, 42.5);
        assert_eq!(first.engine_rpm, 2210.0);
        assert_eq!(first.speed, 63.0);
        assert_eq!(first.fuel_level, 71.0);
        assert_eq!(log.start_time(), first.device_time);
        assert_eq!(first.device_time.nanosecond(), 250_000_000);
    }

    #[test]
    fn test_device_time_without_fraction() {
        let parsed = parse_device_time("23-Aug-2020 13:21:19").unwrap();
        assert_eq!(parsed.nanosecond(), 0);
    }

    #[test]
    fn test_missing_column_is_csv_error() {
        let text = "Device Time,Latitude\n23-Aug-2020 13:21:19.250,-23.548\n";
        let err = TripLog::parse(text).unwrap_err();
        assert!(matches!(err, TelemetryError::Csv(_)));
        assert!(err.to_string().contains("Longitude"));
    }

    #[test]
    fn test_malformed_timestamp_is_csv_error() {
        let text = SAMPLE.replace("23-Aug-2020 13:21:19.250", "not-a-date");
        let err = TripLog::parse(&text).unwrap_err();
        assert!(matches!(err, TelemetryError::Csv(_)));
    }

    #[test]
    fn test_empty_log_is_csv_error() {
        let header_only: &str = SAMPLE.lines().next().unwrap();
        let err = TripLog::parse(header_only).unwrap_err();
        assert!(matches!(err, TelemetryError::Csv(_)));
    }
}
