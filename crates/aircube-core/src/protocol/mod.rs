//! Serial Protocol Communication
//!
//! The AirCube firmware prints one JSON object per line over its console
//! UART and accepts JSON commands on the same port.

pub mod commands;
mod error;
mod message;
pub mod serial;

pub use commands::DeviceCommand;
pub use error::ProtocolError;
pub use message::{extract_payload, DeviceConfig, DeviceMessage, Ens16xReading, Ens210Reading, SensorReading};
pub use serial::{configure_port, list_ports, open_port, send_command, PortInfo};

/// Default baud rate of the AirCube console UART
pub const DEFAULT_BAUD_RATE: u32 = 115200;

/// Default read timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;
