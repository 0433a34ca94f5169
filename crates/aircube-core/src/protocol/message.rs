//! Device messages
//!
//! Decodes the JSON lines printed by the AirCube firmware.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::ProtocolError;

/// ENS210 temperature/humidity sensor block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ens210Reading {
    /// Sensor status code
    pub status: Option<u8>,
    /// Temperature (C)
    pub temperature_c: Option<f64>,
    /// Temperature (F)
    pub temperature_f: Option<f64>,
    /// Relative humidity (%)
    pub humidity: Option<f64>,
}

/// ENS16x gas sensor block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ens16xReading {
    /// Sensor status text
    pub status: Option<String>,
    /// eTVOC (ppb)
    pub etvoc: Option<i64>,
    /// eCO2 (ppm)
    pub eco2: Option<i64>,
    /// Air quality index
    pub aqi: Option<i64>,
}

/// One periodic sensor report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Milliseconds since device boot
    pub timestamp: Option<u64>,
    /// Temperature/humidity block
    pub ens210: Ens210Reading,
    /// Gas sensor block
    pub ens16x: Ens16xReading,
}

impl SensorReading {
    /// Flatten into CSV fields in [`LOG_HEADER`](crate::datalog::LOG_HEADER) order
    ///
    /// Missing values become empty fields.
    pub fn to_fields(&self) -> Vec<String> {
        vec![
            opt(self.timestamp),
            opt(self.ens210.status),
            opt_float(self.ens210.temperature_c),
            opt_float(self.ens210.temperature_f),
            opt_float(self.ens210.humidity),
            self.ens16x.status.clone().unwrap_or_default(),
            opt(self.ens16x.etvoc),
            opt(self.ens16x.eco2),
            opt(self.ens16x.aqi),
        ]
    }
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Floats keep a decimal point so whole values read back as floats
fn opt_float(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() && v.fract() == 0.0 => format!("{:.1}", v),
        Some(v) => v.to_string(),
        None => String::new(),
    }
}

/// Device configuration report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Status LED intensity (0.0 - 1.0)
    pub intensity: f64,
    /// Sensor readout period in milliseconds
    pub readout_period: u32,
}

/// Any JSON line the firmware prints
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum DeviceMessage {
    /// Periodic sensor report
    Reading(SensorReading),

    /// Reply to `get_config`
    Config {
        /// Current settings
        config: DeviceConfig,
    },

    /// Command rejected by the device
    Error {
        /// Always "error"
        status: String,
        /// Reason given by the firmware
        msg: String,
    },

    /// Command accepted by the device
    Ack {
        /// Usually "ok"
        status: String,
        /// Command name
        cmd: String,
        /// Value applied after clamping
        value: f64,
    },
}

impl DeviceMessage {
    /// Decode the JSON object embedded in a serial line
    pub fn parse_line(line: &str) -> Result<Self, ProtocolError> {
        let payload =
            extract_payload(line).ok_or_else(|| ProtocolError::NoPayload(line.to_string()))?;
        Ok(serde_json::from_str(payload)?)
    }
}

/// Span from the first `{` to the last `}` of a line
///
/// Console output can interleave firmware log prefixes with the JSON, so
/// everything outside the braces is ignored.
pub fn extract_payload(line: &str) -> Option<&str> {
    static PAYLOAD_RE: OnceLock<Regex> = OnceLock::new();
    let re = PAYLOAD_RE.get_or_init(|| Regex::new(r"\{.*\}").expect("valid payload regex"));
    re.find(line).map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const READING: &str = r#"{"ens210":{"status":0,"temperature_c":22.50,"temperature_f":72.50,"humidity":41.25},"ens16x":{"status":"OK","etvoc":120,"eco2":650,"aqi":2},"timestamp":123456}"#;

    #[test]
    fn test_extract_payload() {
        assert_eq!(extract_payload("I (123) main: {\"a\":1} tail"), Some("{\"a\":1}"));
        assert_eq!(extract_payload("no json here"), None);
    }

    #[test]
    fn test_parse_reading() {
        let msg = DeviceMessage::parse_line(READING).unwrap();
        let DeviceMessage::Reading(reading) = msg else {
            panic!("expected a reading, got {:?}", msg);
        };

        assert_eq!(reading.timestamp, Some(123456));
        assert_eq!(
            reading.to_fields(),
            vec!["123456", "0", "22.5", "72.5", "41.25", "OK", "120", "650", "2"]
        );
    }

    #[test]
    fn test_whole_floats_keep_decimal_point() {
        let reading = SensorReading {
            ens210: Ens210Reading {
                temperature_c: Some(22.0),
                ..Default::default()
            },
            ..Default::default()
        };
        let fields = reading.to_fields();
        assert_eq!(fields[0], "");
        assert_eq!(fields[2], "22.0");
    }

    #[test]
    fn test_parse_replies() {
        assert_eq!(
            DeviceMessage::parse_line(r#"{"status":"ok","cmd":"set_intensity","value":0.50}"#)
                .unwrap(),
            DeviceMessage::Ack {
                status: "ok".into(),
                cmd: "set_intensity".into(),
                value: 0.5,
            }
        );
        assert_eq!(
            DeviceMessage::parse_line(r#"{"status":"error","msg":"unknown command"}"#).unwrap(),
            DeviceMessage::Error {
                status: "error".into(),
                msg: "unknown command".into(),
            }
        );
        assert_eq!(
            DeviceMessage::parse_line(r#"{"config":{"intensity":0.30,"readout_period":1000}}"#)
                .unwrap(),
            DeviceMessage::Config {
                config: DeviceConfig {
                    intensity: 0.3,
                    readout_period: 1000,
                },
            }
        );
    }

    #[test]
    fn test_unknown_object_is_error() {
        assert!(matches!(
            DeviceMessage::parse_line(r#"{"hello":"world"}"#),
            Err(ProtocolError::InvalidMessage(_))
        ));
        assert!(matches!(
            DeviceMessage::parse_line("garbage"),
            Err(ProtocolError::NoPayload(_))
        ));
    }
}
