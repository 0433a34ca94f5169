//! Demo Mode - Simulated AirCube data generator for testing
//!
//! Generates plausible sensor readings so the live and replay tools can be
//! tried without the hardware. Simulates a room slowly warming and drying
//! with occasional bursts of VOCs (someone cooking, a window closing).

use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::datalog::{CsvLogWriter, LOG_HEADER};
use crate::protocol::{Ens16xReading, Ens210Reading, SensorReading};

/// Demo AirCube simulator
pub struct DemoSimulator {
    /// Device time of the next sample (ms since boot)
    timestamp_ms: u64,
    /// Sample period (ms)
    period_ms: u64,
    /// Current temperature (C)
    temperature_c: f64,
    /// Current humidity (%)
    humidity: f64,
    /// Gas level above baseline, decays over time
    voc_excess: f64,
    /// Current burst state
    burst: BurstState,
    rng: StdRng,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum BurstState {
    /// Baseline air
    Calm,
    /// VOC source active
    Rising { remaining: u32 },
}

impl DemoSimulator {
    /// Create a simulator with a random seed
    pub fn new(period_ms: u64) -> Self {
        Self::with_rng(period_ms, StdRng::from_entropy())
    }

    /// Create a deterministic simulator
    pub fn with_seed(period_ms: u64, seed: u64) -> Self {
        Self::with_rng(period_ms, StdRng::seed_from_u64(seed))
    }

    fn with_rng(period_ms: u64, mut rng: StdRng) -> Self {
        let boot_ms = rng.gen_range(1_000..5_000);
        Self {
            timestamp_ms: boot_ms,
            period_ms: period_ms.max(1),
            temperature_c: rng.gen_range(19.0..23.0),
            humidity: rng.gen_range(35.0..55.0),
            voc_excess: 0.0,
            burst: BurstState::Calm,
            rng,
        }
    }

    /// Produce the next reading
    pub fn next_reading(&mut self) -> SensorReading {
        // Slow random walk, kept in a plausible indoor range
        self.temperature_c = (self.temperature_c + self.rng.gen_range(-0.05..0.06)).clamp(15.0, 32.0);
        self.humidity = (self.humidity + self.rng.gen_range(-0.3..0.28)).clamp(20.0, 80.0);

        self.burst = match self.burst {
            BurstState::Calm if self.rng.gen_bool(0.02) => BurstState::Rising {
                remaining: self.rng.gen_range(5..20),
            },
            BurstState::Calm => BurstState::Calm,
            BurstState::Rising { remaining: 0 } => BurstState::Calm,
            BurstState::Rising { remaining } => BurstState::Rising {
                remaining: remaining - 1,
            },
        };

        match self.burst {
            BurstState::Rising { .. } => self.voc_excess += self.rng.gen_range(40.0..120.0),
            BurstState::Calm => self.voc_excess *= 0.9,
        }

        let etvoc = 50.0 + self.voc_excess + self.rng.gen_range(-5.0..5.0);
        let eco2 = 400.0 + self.voc_excess * 1.5 + self.rng.gen_range(-10.0..10.0);
        let aqi = match eco2 {
            x if x < 600.0 => 1,
            x if x < 800.0 => 2,
            x if x < 1000.0 => 3,
            x if x < 1500.0 => 4,
            _ => 5,
        };

        let temperature_c = round2(self.temperature_c);
        let reading = SensorReading {
            timestamp: Some(self.timestamp_ms),
            ens210: Ens210Reading {
                status: Some(0),
                temperature_c: Some(temperature_c),
                temperature_f: Some(round2(temperature_c * 9.0 / 5.0 + 32.0)),
                humidity: Some(round2(self.humidity)),
            },
            ens16x: Ens16xReading {
                status: Some("OK".to_string()),
                etvoc: Some(etvoc.max(0.0).round() as i64),
                eco2: Some(eco2.max(400.0).round() as i64),
                aqi: Some(aqi),
            },
        };

        self.timestamp_ms += self.period_ms;
        reading
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Write `samples` simulated readings to a log file, replacing its contents
pub fn write_demo_log<P: AsRef<Path>>(
    path: P,
    samples: usize,
    period_ms: u64,
    seed: Option<u64>,
) -> std::io::Result<()> {
    let mut sim = match seed {
        Some(seed) => DemoSimulator::with_seed(period_ms, seed),
        None => DemoSimulator::new(period_ms),
    };
    let mut writer = CsvLogWriter::create(path, &LOG_HEADER)?;
    for _ in 0..samples {
        writer.write_row(sim.next_reading().to_fields())?;
    }
    tracing::info!("Wrote {} simulated samples", samples);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datalog::{load_rows, TimeScale, Timeline};

    #[test]
    fn test_seeded_runs_match() {
        let mut a = DemoSimulator::with_seed(1000, 7);
        let mut b = DemoSimulator::with_seed(1000, 7);
        for _ in 0..50 {
            assert_eq!(a.next_reading(), b.next_reading());
        }
    }

    #[test]
    fn test_timestamps_advance_by_period() {
        let mut sim = DemoSimulator::with_seed(1000, 1);
        let first = sim.next_reading().timestamp.unwrap();
        let second = sim.next_reading().timestamp.unwrap();
        assert_eq!(second - first, 1000);
    }

    #[test]
    fn test_demo_log_replays_in_milliseconds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.csv");
        write_demo_log(&path, 20, 1000, Some(3)).unwrap();

        let rows = load_rows(&path).unwrap();
        assert_eq!(rows.len(), 20);

        let timeline = Timeline::from_rows(rows);
        assert_eq!(timeline.scale(), TimeScale::Milliseconds);
        assert!(timeline.records().iter().all(|r| r.is_real && r.temperature_c.is_some()));
    }

    #[test]
    fn test_rewriting_demo_log_replaces_previous_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.csv");
        write_demo_log(&path, 5, 1000, Some(1)).unwrap();
        write_demo_log(&path, 5, 1000, Some(2)).unwrap();

        let rows = load_rows(&path).unwrap();
        assert_eq!(rows.len(), 5);

        let stamps: Vec<f64> = rows.iter().filter_map(|r| r.parse_f64("timestamp")).collect();
        assert!(stamps.windows(2).all(|w| w[1] - w[0] == 1000.0));
    }
}
