//! Rendering sinks
//!
//! A terminal status line for quick looks and an SVG chart that is redrawn
//! on every hand-off, laid out as three stacked panels: temperature and
//! humidity, AQI, and the two gas readings.

use std::error::Error;
use std::path::PathBuf;

use aircube_core::datalog::{RenderSink, WindowSnapshot};
use plotters::prelude::*;

const SPARK_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const SPARK_WIDTH: usize = 32;

/// Build the sink selected on the command line
pub fn build_sink(svg: Option<PathBuf>, title: &str, x_label: &str) -> Box<dyn RenderSink + Send> {
    match svg {
        Some(path) => {
            tracing::info!("Rendering chart to {}", path.display());
            Box::new(SvgChartSink::new(path, title, x_label))
        }
        None => Box::new(TerminalSink),
    }
}

/// Prints the latest sample with sparklines of the window
#[derive(Debug, Default)]
pub struct TerminalSink;

impl RenderSink for TerminalSink {
    fn render(&mut self, snapshot: &WindowSnapshot<'_>) {
        println!("{}", status_line(snapshot));
    }
}

fn status_line(snapshot: &WindowSnapshot<'_>) -> String {
    let Some(i) = snapshot.len().checked_sub(1) else {
        return "(no samples)".to_string();
    };

    format!(
        "t={:>8.1}s  T={:>6.2}C  RH={:>5.1}%  AQI={:>3}  eCO2={:>6}ppm  eTVOC={:>6}ppb  n={:<4} T {}  eCO2 {}",
        snapshot.time[i],
        snapshot.temperature_c[i],
        snapshot.humidity[i],
        snapshot.aqi[i],
        fmt_optional(snapshot.eco2[i]),
        fmt_optional(snapshot.etvoc[i]),
        snapshot.len(),
        sparkline(snapshot.temperature_c, SPARK_WIDTH),
        sparkline(snapshot.eco2, SPARK_WIDTH),
    )
}

fn fmt_optional(v: f64) -> String {
    if v.is_nan() {
        "-".to_string()
    } else {
        format!("{:.0}", v)
    }
}

/// Unicode sparkline of the last `width` values; NaN shows as a space
fn sparkline(values: &[f64], width: usize) -> String {
    let tail = &values[values.len().saturating_sub(width)..];
    let Some((lo, hi)) = finite_range(tail.iter().copied()) else {
        return " ".repeat(tail.len());
    };
    let span = hi - lo;

    tail.iter()
        .map(|v| {
            if !v.is_finite() {
                ' '
            } else if span <= f64::EPSILON {
                SPARK_CHARS[SPARK_CHARS.len() / 2]
            } else {
                let level = ((v - lo) / span * (SPARK_CHARS.len() - 1) as f64).round() as usize;
                SPARK_CHARS[level.min(SPARK_CHARS.len() - 1)]
            }
        })
        .collect()
}

fn finite_range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Widen a degenerate or empty range so plotters can draw an axis
fn padded_range(range: Option<(f64, f64)>) -> std::ops::Range<f64> {
    match range {
        None => 0.0..1.0,
        Some((lo, hi)) if (hi - lo).abs() < f64::EPSILON => (lo - 1.0)..(hi + 1.0),
        Some((lo, hi)) => {
            let pad = (hi - lo) * 0.05;
            (lo - pad)..(hi + pad)
        }
    }
}

struct Series<'a> {
    label: &'static str,
    values: &'a [f64],
    color: RGBColor,
}

/// Redraws an SVG file on every hand-off
pub struct SvgChartSink {
    path: PathBuf,
    title: String,
    x_label: String,
}

impl SvgChartSink {
    /// Create a sink writing to `path`
    pub fn new(path: PathBuf, title: &str, x_label: &str) -> Self {
        Self {
            path,
            title: title.to_string(),
            x_label: x_label.to_string(),
        }
    }

    fn draw(&self, snapshot: &WindowSnapshot<'_>) -> Result<(), Box<dyn Error>> {
        let root = SVGBackend::new(&self.path, (1000, 800)).into_drawing_area();
        root.fill(&WHITE)?;
        let root = root.titled(&self.title, ("sans-serif", 22))?;
        let panels = root.split_evenly((3, 1));

        let x_range = padded_range(snapshot.time_range());

        let layout: [(&str, Option<&str>, Vec<Series<'_>>); 3] = [
            (
                "Temp / Hum",
                None,
                vec![
                    Series {
                        label: "Temperature (C)",
                        values: snapshot.temperature_c,
                        color: RGBColor(31, 119, 180),
                    },
                    Series {
                        label: "Humidity (%)",
                        values: snapshot.humidity,
                        color: RGBColor(255, 127, 14),
                    },
                ],
            ),
            (
                "AQI",
                None,
                vec![Series {
                    label: "AQI",
                    values: snapshot.aqi,
                    color: RGBColor(31, 119, 180),
                }],
            ),
            (
                "Gas levels",
                Some(self.x_label.as_str()),
                vec![
                    Series {
                        label: "eCO2 (ppm)",
                        values: snapshot.eco2,
                        color: RGBColor(31, 119, 180),
                    },
                    Series {
                        label: "eTVOC (ppb)",
                        values: snapshot.etvoc,
                        color: RGBColor(255, 127, 14),
                    },
                ],
            ),
        ];

        for (area, (y_label, x_label, series)) in panels.iter().zip(layout) {
            let y_range = padded_range(finite_range(
                series.iter().flat_map(|s| s.values.iter().copied()),
            ));

            let mut chart = ChartBuilder::on(area)
                .margin(10)
                .set_label_area_size(LabelAreaPosition::Left, 60)
                .set_label_area_size(LabelAreaPosition::Bottom, 35)
                .build_cartesian_2d(x_range.clone(), y_range)?;

            let mut mesh = chart.configure_mesh();
            mesh.y_desc(y_label);
            if let Some(x_label) = x_label {
                mesh.x_desc(x_label);
            }
            mesh.draw()?;

            for s in &series {
                let color = s.color;
                let points = snapshot
                    .time
                    .iter()
                    .copied()
                    .zip(s.values.iter().copied())
                    .filter(|(_, y)| y.is_finite());
                chart
                    .draw_series(LineSeries::new(points, color))?
                    .label(s.label)
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
            }

            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperLeft)
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()?;
        }

        root.present()?;
        Ok(())
    }
}

impl RenderSink for SvgChartSink {
    fn render(&mut self, snapshot: &WindowSnapshot<'_>) {
        if let Err(e) = self.draw(snapshot) {
            tracing::warn!("Failed to render {}: {}", self.path.display(), e);
        }
    }
}
