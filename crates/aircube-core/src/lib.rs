//! # AirCube Core Library
//!
//! Core functionality for the AirCube air-quality sensor tools.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - Serial port discovery and the AirCube JSON line protocol
//! - CSV logging of sensor readings
//! - Live tailing of a growing CSV log
//! - Timestamp-aware replay of recorded logs
//! - Simulated sensor data for trying the tools without hardware
//!
//! ## Example
//!
//! ```rust,ignore
//! use aircube_core::config::ReplayConfig;
//! use aircube_core::datalog::{load_rows, CancelFlag, ReplayDriver, SystemClock, Timeline};
//!
//! let rows = load_rows("sensor_log.csv")?;
//! let timeline = Timeline::from_rows(rows);
//!
//! let cancel = CancelFlag::new();
//! let mut driver = ReplayDriver::new(&ReplayConfig::default(), SystemClock::new(cancel.clone()), cancel);
//! let summary = driver.run(&timeline, &mut |snapshot: &aircube_core::datalog::WindowSnapshot<'_>| {
//!     println!("{} samples in window", snapshot.len());
//! });
//! ```

pub mod config;
pub mod datalog;
pub mod demo;
pub mod protocol;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{AppConfig, LiveConfig, LoggerConfig, ReplayConfig};
    pub use crate::datalog::{
        load_rows, CancelFlag, Clock, RenderSink, ReplayDriver, ReplaySummary, Row,
        SampleRecord, SensorLogger, SlidingWindow, SystemClock, TimeScale, Timeline,
        WindowSnapshot,
    };
    pub use crate::protocol::{DeviceCommand, DeviceMessage, SensorReading};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
