//! `aircube replay`: timestamp-paced playback of a log

use std::path::PathBuf;

use aircube_core::config::ReplayConfig;
use aircube_core::datalog::{load_rows, CancelFlag, ReplayDriver, SystemClock, Timeline};
use anyhow::{Context, Result};

use crate::render::build_sink;

pub async fn run(config: ReplayConfig, svg: Option<PathBuf>, cancel: CancelFlag) -> Result<()> {
    tokio::task::spawn_blocking(move || replay_blocking(config, svg, cancel))
        .await
        .context("replay task panicked")?
}

fn replay_blocking(config: ReplayConfig, svg: Option<PathBuf>, cancel: CancelFlag) -> Result<()> {
    // Nothing to replay is fatal, before any sink is set up
    let rows = load_rows(&config.input)
        .with_context(|| format!("cannot replay {}", config.input.display()))?;
    let timeline = Timeline::from_rows(rows);

    let mut sink = build_sink(svg, "AirCube replay from CSV (timestamp based)", "Time (s, replay)");
    tracing::info!("Press Ctrl+C to stop.");

    let mut driver = ReplayDriver::new(&config, SystemClock::new(cancel.clone()), cancel);
    let summary = driver.run(&timeline, sink.as_mut());

    tracing::info!(
        "Replay finished: {} of {} samples shown, {} skipped{}",
        summary.emitted,
        summary.total_rows,
        summary.skipped,
        if summary.cancelled { " (interrupted)" } else { "" }
    );
    Ok(())
}
