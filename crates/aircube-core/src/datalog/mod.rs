//! Data Logging
//!
//! Records AirCube readings to CSV, tails a growing log and replays
//! recorded logs with their original timing.

mod format;
mod live;
mod playback;
mod recorder;
mod timeline;
mod window;

pub use format::{load_rows, read_log, CsvLog, CsvLogWriter, LoadError, Row, LOG_HEADER};
pub use live::read_live_window;
pub use playback::{
    CancelFlag, Clock, ManualClock, RenderSink, ReplayDriver, ReplaySummary, SystemClock,
    MIN_SPEED,
};
pub use recorder::{LineOutcome, RecorderError, SensorLogger};
pub use timeline::{average_positive_delta, resolve_time, TimeScale, Timeline};
pub use window::{SlidingWindow, WindowPoint, WindowSnapshot};

/// CSV column names understood by the live and replay tools
pub mod fields {
    /// Device timestamp (milliseconds since boot on the AirCube firmware)
    pub const TIMESTAMP: &str = "timestamp";
    /// Host capture time
    pub const PC_TIME: &str = "pc_time";
    /// Temperature in degrees Celsius
    pub const TEMPERATURE_C: &str = "temperature_c";
    /// Relative humidity in percent
    pub const HUMIDITY: &str = "humidity";
    /// Air quality index
    pub const AQI: &str = "aqi";
    /// Equivalent CO2 in ppm
    pub const ECO2: &str = "eco2";
    /// Equivalent total VOC in ppb
    pub const ETVOC: &str = "etvoc";
}

/// A single decoded log row
///
/// Numeric fields are `None` when the column is missing, empty or not a
/// number. Records are built once by [`Timeline::from_rows`] and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRecord {
    /// Time value before unit conversion
    pub raw_time: f64,
    /// Whether `raw_time` came from a clock rather than the row index
    pub is_real: bool,
    /// Temperature (C)
    pub temperature_c: Option<f64>,
    /// Humidity (%)
    pub humidity: Option<f64>,
    /// Air quality index
    pub aqi: Option<f64>,
    /// eCO2 (ppm)
    pub eco2: Option<f64>,
    /// eTVOC (ppb)
    pub etvoc: Option<f64>,
}

impl SampleRecord {
    /// Decode the sensor fields of a row
    pub fn from_row(row: &Row, raw_time: f64, is_real: bool) -> Self {
        Self {
            raw_time,
            is_real,
            temperature_c: row.parse_f64(fields::TEMPERATURE_C),
            humidity: row.parse_f64(fields::HUMIDITY),
            aqi: row.parse_f64(fields::AQI),
            eco2: row.parse_f64(fields::ECO2),
            etvoc: row.parse_f64(fields::ETVOC),
        }
    }

    /// Convert to a window point at the given relative time
    ///
    /// Returns `None` when temperature, humidity or AQI is missing; the gas
    /// readings fall back to NaN instead.
    pub fn to_point(&self, time: f64) -> Option<WindowPoint> {
        Some(WindowPoint {
            time,
            temperature_c: self.temperature_c?,
            humidity: self.humidity?,
            aqi: self.aqi?,
            eco2: self.eco2.unwrap_or(f64::NAN),
            etvoc: self.etvoc.unwrap_or(f64::NAN),
        })
    }
}
