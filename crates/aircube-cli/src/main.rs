use std::io;
use std::path::PathBuf;

use aircube_core::config::AppConfig;
use aircube_core::datalog::CancelFlag;
use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};
use tracing_subscriber::EnvFilter;

mod live;
mod logger;
mod render;
mod replay;

#[derive(Parser, Debug)]
#[command(author, version, about = "AirCube sensor logger, live plotter and replay", long_about = None)]
struct Cli {
    /// JSON config file (defaults to <config dir>/aircube/config.json when present)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log JSON readings from the serial port to a CSV file
    Log(LogArgs),
    /// Plot the tail of a CSV log while it grows
    Live(LiveArgs),
    /// Replay a CSV log with its original timing
    Replay(ReplayArgs),
    /// List available serial ports
    Ports,
    /// Write a CSV log of simulated readings
    Demo(DemoArgs),
}

#[derive(Args, Debug)]
struct LogArgs {
    /// Serial port (e.g. /dev/ttyUSB0 or COM33)
    #[arg(short, long)]
    port: Option<String>,

    /// Baud rate
    #[arg(short, long)]
    baud: Option<u32>,

    /// CSV file to append to
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,

    /// Add a host capture time column to new log files
    #[arg(long, action = ArgAction::SetTrue)]
    pc_time: bool,

    /// Ask the device for this readout period (ms) before logging
    #[arg(long)]
    readout_period_ms: Option<u32>,

    /// Ask the device for this LED intensity (0.0 - 1.0) before logging
    #[arg(long)]
    intensity: Option<f64>,
}

#[derive(Args, Debug)]
struct LiveArgs {
    /// CSV file to watch
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    input: Option<PathBuf>,

    /// Refresh interval in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Number of recent samples to show
    #[arg(long)]
    max_points: Option<usize>,

    /// Redraw this SVG file instead of printing to the terminal
    #[arg(long, value_hint = ValueHint::FilePath)]
    svg: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ReplayArgs {
    /// CSV file to replay
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    input: Option<PathBuf>,

    /// Playback speed (1.0 = real time, 2.0 = twice as fast)
    #[arg(short, long)]
    speed: Option<f64>,

    /// Number of recent samples kept on screen
    #[arg(long)]
    max_window: Option<usize>,

    /// Samples loaded without delay before timed playback starts
    #[arg(long)]
    preload: Option<usize>,

    /// Redraw this SVG file instead of printing to the terminal
    #[arg(long, value_hint = ValueHint::FilePath)]
    svg: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct DemoArgs {
    /// CSV file to write
    #[arg(short, long, default_value = "demo_log.csv", value_hint = ValueHint::FilePath)]
    output: PathBuf,

    /// Number of samples
    #[arg(short = 'n', long, default_value_t = 600)]
    samples: usize,

    /// Device readout period in milliseconds
    #[arg(long, default_value_t = 1000)]
    period_ms: u64,

    /// Seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let mut config = AppConfig::load(cli.config.as_deref()).context("failed to load config")?;

    match cli.command {
        Command::Log(args) => {
            let cfg = &mut config.logger;
            if args.port.is_some() {
                cfg.port = args.port;
            }
            cfg.baud_rate = args.baud.unwrap_or(cfg.baud_rate);
            cfg.output = args.output.unwrap_or_else(|| cfg.output.clone());
            cfg.pc_time |= args.pc_time;
            cfg.readout_period_ms = args.readout_period_ms.or(cfg.readout_period_ms);
            cfg.led_intensity = args.intensity.or(cfg.led_intensity);

            let cancel = watch_interrupt();
            logger::run(config.logger, cancel).await
        }
        Command::Live(args) => {
            let cfg = &mut config.live;
            cfg.input = args.input.unwrap_or_else(|| cfg.input.clone());
            cfg.interval_ms = args.interval_ms.unwrap_or(cfg.interval_ms);
            cfg.max_points = args.max_points.unwrap_or(cfg.max_points);
            cfg.validate()?;

            let cancel = watch_interrupt();
            live::run(config.live, args.svg, cancel).await
        }
        Command::Replay(args) => {
            let cfg = &mut config.replay;
            cfg.input = args.input.unwrap_or_else(|| cfg.input.clone());
            cfg.speed = args.speed.unwrap_or(cfg.speed);
            cfg.max_window_size = args.max_window.unwrap_or(cfg.max_window_size);
            cfg.preload_count = args.preload.unwrap_or(cfg.preload_count);
            cfg.validate()?;

            let cancel = watch_interrupt();
            replay::run(config.replay, args.svg, cancel).await
        }
        Command::Ports => {
            let ports = aircube_core::protocol::list_ports();
            if ports.is_empty() {
                println!("No serial ports found.");
            }
            for port in ports {
                match (&port.manufacturer, &port.product) {
                    (None, None) => println!("{}", port.name),
                    (m, p) => println!(
                        "{}  {} {}",
                        port.name,
                        m.as_deref().unwrap_or(""),
                        p.as_deref().unwrap_or("")
                    ),
                }
            }
            Ok(())
        }
        Command::Demo(args) => {
            aircube_core::demo::write_demo_log(&args.output, args.samples, args.period_ms, args.seed)
                .with_context(|| format!("failed to write {}", args.output.display()))?;
            println!("Wrote {} samples to {}", args.samples, args.output.display());
            Ok(())
        }
    }
}

/// Raise a cancel flag on Ctrl+C
fn watch_interrupt() -> CancelFlag {
    let cancel = CancelFlag::new();
    let flag = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::debug!("Interrupt received");
            flag.cancel();
        }
    });
    cancel
}
