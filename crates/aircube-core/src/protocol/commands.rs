//! Device commands
//!
//! Commands accepted by the AirCube firmware, one JSON object per line.

use serde_json::json;

/// Readout period bounds enforced by the firmware, in milliseconds
pub const READOUT_PERIOD_RANGE_MS: (u32, u32) = (100, 10_000);

/// Commands understood by the AirCube firmware
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeviceCommand {
    /// Ask the device to report its LED intensity and readout period
    GetConfig,

    /// Set the status LED intensity (0.0 - 1.0)
    SetIntensity(f64),

    /// Set the sensor readout period in milliseconds
    SetReadoutPeriod(u32),
}

impl DeviceCommand {
    /// Command name as sent in the `cmd` field
    pub fn name(&self) -> &'static str {
        match self {
            DeviceCommand::GetConfig => "get_config",
            DeviceCommand::SetIntensity(_) => "set_intensity",
            DeviceCommand::SetReadoutPeriod(_) => "set_readout_period",
        }
    }

    /// The command with its value clamped the way the firmware will clamp it
    pub fn clamped(self) -> Self {
        match self {
            DeviceCommand::GetConfig => self,
            DeviceCommand::SetIntensity(v) => DeviceCommand::SetIntensity(v.clamp(0.0, 1.0)),
            DeviceCommand::SetReadoutPeriod(ms) => DeviceCommand::SetReadoutPeriod(
                ms.clamp(READOUT_PERIOD_RANGE_MS.0, READOUT_PERIOD_RANGE_MS.1),
            ),
        }
    }

    /// Encode as a newline-terminated JSON line
    pub fn to_line(&self) -> String {
        let value = match self {
            DeviceCommand::GetConfig => json!({ "cmd": self.name() }),
            DeviceCommand::SetIntensity(v) => json!({ "cmd": self.name(), "value": v }),
            DeviceCommand::SetReadoutPeriod(ms) => json!({ "cmd": self.name(), "value": ms }),
        };
        format!("{}\n", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_lines() {
        assert_eq!(
            DeviceCommand::SetReadoutPeriod(2000).to_line(),
            "{\"cmd\":\"set_readout_period\",\"value\":2000}\n"
        );
        assert_eq!(
            DeviceCommand::SetIntensity(0.5).to_line(),
            "{\"cmd\":\"set_intensity\",\"value\":0.5}\n"
        );
    }

    #[test]
    fn test_clamping_matches_firmware() {
        assert_eq!(
            DeviceCommand::SetReadoutPeriod(20).clamped(),
            DeviceCommand::SetReadoutPeriod(100)
        );
        assert_eq!(
            DeviceCommand::SetReadoutPeriod(60_000).clamped(),
            DeviceCommand::SetReadoutPeriod(10_000)
        );
        assert_eq!(
            DeviceCommand::SetIntensity(1.7).clamped(),
            DeviceCommand::SetIntensity(1.0)
        );
    }
}
