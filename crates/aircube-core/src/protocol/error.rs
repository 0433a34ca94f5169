//! Protocol errors

use thiserror::Error;

/// Errors that can occur while talking to an AirCube
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Serial port error: {0}")]
    SerialError(String),

    #[error("Port not found: {0}")]
    PortNotFound(String),

    #[error("No JSON object in line: {0:?}")]
    NoPayload(String),

    #[error("Invalid device message: {0}")]
    InvalidMessage(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
