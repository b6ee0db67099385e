pub mod csv;

pub use csv::{CsvRow, TripLog};
