//! `aircube live`: redraw the tail of a growing log

use std::path::PathBuf;
use std::time::Duration;

use aircube_core::config::LiveConfig;
use aircube_core::datalog::{read_live_window, CancelFlag};
use anyhow::Result;

use crate::render::build_sink;

pub async fn run(config: LiveConfig, svg: Option<PathBuf>, cancel: CancelFlag) -> Result<()> {
    let mut sink = build_sink(svg, "AirCube live data (from CSV)", "Time (seconds or samples)");
    let mut interval = tokio::time::interval(Duration::from_millis(config.interval_ms));

    tracing::info!(
        "Watching {} for updates. Press Ctrl+C to stop.",
        config.input.display()
    );

    loop {
        interval.tick().await;
        if cancel.is_cancelled() {
            break;
        }

        match read_live_window(&config.input, config.max_points) {
            Ok(Some(mut window)) => sink.render(&window.snapshot()),
            Ok(None) => tracing::debug!("No samples in {} yet", config.input.display()),
            Err(e) => tracing::warn!("Failed to read {}: {}", config.input.display(), e),
        }
    }

    tracing::info!("Live view stopped.");
    Ok(())
}
