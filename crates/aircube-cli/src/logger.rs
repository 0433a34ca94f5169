//! `aircube log`: serial JSON to CSV

use std::io::BufReader;
use std::time::Duration;

use aircube_core::config::LoggerConfig;
use aircube_core::datalog::{CancelFlag, SensorLogger};
use aircube_core::protocol::{configure_port, list_ports, open_port, send_command, DeviceCommand};
use anyhow::{anyhow, Context, Result};

/// Commands to send once the port is open
fn startup_commands(config: &LoggerConfig) -> Vec<DeviceCommand> {
    let mut commands = Vec::new();
    if let Some(ms) = config.readout_period_ms {
        commands.push(DeviceCommand::SetReadoutPeriod(ms));
    }
    if let Some(intensity) = config.led_intensity {
        commands.push(DeviceCommand::SetIntensity(intensity));
    }
    if !commands.is_empty() {
        commands.push(DeviceCommand::GetConfig);
    }
    commands
}

pub async fn run(config: LoggerConfig, cancel: CancelFlag) -> Result<()> {
    tokio::task::spawn_blocking(move || log_blocking(config, cancel))
        .await
        .context("logger task panicked")?
}

fn log_blocking(config: LoggerConfig, cancel: CancelFlag) -> Result<()> {
    let port_name = match config.port.clone() {
        Some(name) => name,
        None => list_ports()
            .into_iter()
            .next()
            .map(|p| p.name)
            .ok_or_else(|| anyhow!("no serial ports found; pass --port"))?,
    };

    let mut port = open_port(
        &port_name,
        Some(config.baud_rate),
        Some(Duration::from_millis(config.timeout_ms)),
    )
    .with_context(|| format!("failed to open {}", port_name))?;
    configure_port(port.as_mut())?;
    tracing::info!("Opened {} at {} baud", port_name, config.baud_rate);

    for command in startup_commands(&config) {
        let clamped = command.clamped();
        if clamped != command {
            tracing::warn!("{} will be clamped by the device to {:?}", command.name(), clamped);
        }
        send_command(&mut port, &command)?;
    }

    let mut logger = SensorLogger::open(&config.output, config.pc_time)
        .with_context(|| format!("failed to open {}", config.output.display()))?;

    tracing::info!(
        "Logging JSON to {}... Press CTRL+C to stop.",
        config.output.display()
    );
    let rows = logger.run(BufReader::new(port), &cancel)?;
    tracing::info!("Logging stopped. {} rows written.", rows);
    Ok(())
}
