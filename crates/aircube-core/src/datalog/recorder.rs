//! Data logger / recorder
//!
//! Turns the AirCube's JSON console output into CSV rows.

use std::io::{self, BufRead};
use std::path::Path;

use thiserror::Error;

use super::{fields, CancelFlag, CsvLogWriter, LOG_HEADER};
use crate::protocol::{DeviceMessage, ProtocolError, SensorReading};

/// Errors that stop the logger
#[derive(Error, Debug)]
pub enum RecorderError {
    #[error("Failed to open log file: {0}")]
    Open(#[source] io::Error),

    #[error("Failed to write log row: {0}")]
    Write(#[source] io::Error),

    #[error("Serial read failed: {0}")]
    Read(#[source] io::Error),
}

/// What happened to one input line
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    /// A sensor reading was written as this row
    Logged(Vec<String>),
    /// A command reply or config report; nothing written
    Reply(DeviceMessage),
    /// Line without a JSON object (boot banner, firmware log line)
    Ignored,
    /// JSON that could not be decoded
    Invalid(String),
}

/// Appends sensor readings to a CSV log
pub struct SensorLogger {
    writer: CsvLogWriter,
    include_pc_time: bool,
    rows_written: u64,
}

impl SensorLogger {
    /// Open (or create) the log at `path`
    ///
    /// With `include_pc_time`, new files get an extra `pc_time` column
    /// holding the host capture time in Unix seconds. An existing file keeps
    /// its own layout.
    pub fn open<P: AsRef<Path>>(path: P, include_pc_time: bool) -> Result<Self, RecorderError> {
        let mut header: Vec<&str> = LOG_HEADER.to_vec();
        if include_pc_time {
            header.push(fields::PC_TIME);
        }
        let writer = CsvLogWriter::open(path, &header).map_err(RecorderError::Open)?;
        let has_pc_time = writer.header().iter().any(|h| h == fields::PC_TIME);
        if include_pc_time && !has_pc_time {
            tracing::warn!(
                "Existing log has no {} column; host capture time will not be recorded",
                fields::PC_TIME
            );
        }

        Ok(Self {
            writer,
            include_pc_time: has_pc_time,
            rows_written: 0,
        })
    }

    /// Number of rows written since opening
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Write one reading
    pub fn log_reading(&mut self, reading: &SensorReading) -> Result<Vec<String>, RecorderError> {
        let mut row = reading.to_fields();
        if self.include_pc_time {
            let now = chrono::Utc::now();
            row.push(format!("{:.3}", now.timestamp_millis() as f64 / 1000.0));
        }
        self.writer.write_row(&row).map_err(RecorderError::Write)?;
        self.rows_written += 1;
        Ok(row)
    }

    /// Handle one line of serial output
    pub fn handle_line(&mut self, line: &str) -> Result<LineOutcome, RecorderError> {
        let outcome = match DeviceMessage::parse_line(line) {
            Ok(DeviceMessage::Reading(reading)) => {
                let row = self.log_reading(&reading)?;
                tracing::info!("Logged row: {:?}", row);
                LineOutcome::Logged(row)
            }
            Ok(reply) => {
                tracing::info!("Device reply: {:?}", reply);
                LineOutcome::Reply(reply)
            }
            Err(ProtocolError::NoPayload(_)) => LineOutcome::Ignored,
            Err(e) => {
                tracing::warn!("JSON parse error: {}", e);
                LineOutcome::Invalid(e.to_string())
            }
        };
        Ok(outcome)
    }

    /// Read lines until end of input or cancellation
    ///
    /// Read timeouts are not errors; they give the loop a chance to notice
    /// the cancel flag. Partial lines are kept until their newline arrives.
    /// Returns the number of rows written.
    pub fn run<R: BufRead>(&mut self, mut reader: R, cancel: &CancelFlag) -> Result<u64, RecorderError> {
        let mut buf = Vec::new();

        while !cancel.is_cancelled() {
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {
                    if buf.last() != Some(&b'\n') {
                        // EOF without a trailing newline
                        self.process(&buf)?;
                        break;
                    }
                    self.process(&buf)?;
                    buf.clear();
                }
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                    ) =>
                {
                    continue;
                }
                Err(e) => return Err(RecorderError::Read(e)),
            }
        }

        Ok(self.rows_written)
    }

    fn process(&mut self, raw: &[u8]) -> Result<(), RecorderError> {
        let line = String::from_utf8_lossy(raw);
        let line = line.trim();
        if !line.is_empty() {
            self.handle_line(line)?;
        }
        Ok(())
    }
}
