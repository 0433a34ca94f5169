//! Sliding window of recent samples
//!
//! Bounded FIFO buffer feeding the rendering sinks.

use std::collections::VecDeque;

/// One accepted sample, time in seconds relative to the start of the log
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowPoint {
    /// Seconds since the first sample
    pub time: f64,
    /// Temperature (C)
    pub temperature_c: f64,
    /// Humidity (%)
    pub humidity: f64,
    /// Air quality index
    pub aqi: f64,
    /// eCO2 (ppm), NaN when missing
    pub eco2: f64,
    /// eTVOC (ppb), NaN when missing
    pub etvoc: f64,
}

/// Most-recent-N buffer of samples, stored column-wise
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    capacity: usize,
    time: VecDeque<f64>,
    temperature_c: VecDeque<f64>,
    humidity: VecDeque<f64>,
    aqi: VecDeque<f64>,
    eco2: VecDeque<f64>,
    etvoc: VecDeque<f64>,
}

impl SlidingWindow {
    /// Create a window holding at most `capacity` samples
    pub fn new(capacity: usize) -> Self {
        let column = || VecDeque::with_capacity(capacity);
        Self {
            capacity,
            time: column(),
            temperature_c: column(),
            humidity: column(),
            aqi: column(),
            eco2: column(),
            etvoc: column(),
        }
    }

    /// Get the number of samples
    pub fn len(&self) -> usize {
        self.time.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Append a sample, evicting the oldest ones beyond capacity
    pub fn push(&mut self, point: WindowPoint) {
        self.time.push_back(point.time);
        self.temperature_c.push_back(point.temperature_c);
        self.humidity.push_back(point.humidity);
        self.aqi.push_back(point.aqi);
        self.eco2.push_back(point.eco2);
        self.etvoc.push_back(point.etvoc);

        while self.time.len() > self.capacity {
            self.time.pop_front();
            self.temperature_c.pop_front();
            self.humidity.pop_front();
            self.aqi.pop_front();
            self.eco2.pop_front();
            self.etvoc.pop_front();
        }
    }

    /// Borrow the window as parallel slices
    pub fn snapshot(&mut self) -> WindowSnapshot<'_> {
        WindowSnapshot {
            time: self.time.make_contiguous(),
            temperature_c: self.temperature_c.make_contiguous(),
            humidity: self.humidity.make_contiguous(),
            aqi: self.aqi.make_contiguous(),
            eco2: self.eco2.make_contiguous(),
            etvoc: self.etvoc.make_contiguous(),
        }
    }
}

/// Read-only view of a window handed to a sink
///
/// All slices have the same length and are ordered oldest first.
#[derive(Debug, Clone, Copy)]
pub struct WindowSnapshot<'a> {
    /// Seconds since the first sample of the log
    pub time: &'a [f64],
    /// Temperature (C)
    pub temperature_c: &'a [f64],
    /// Humidity (%)
    pub humidity: &'a [f64],
    /// Air quality index
    pub aqi: &'a [f64],
    /// eCO2 (ppm)
    pub eco2: &'a [f64],
    /// eTVOC (ppb)
    pub etvoc: &'a [f64],
}

impl WindowSnapshot<'_> {
    /// Number of samples
    pub fn len(&self) -> usize {
        self.time.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Time span covered, first to last sample
    pub fn time_range(&self) -> Option<(f64, f64)> {
        Some((*self.time.first()?, *self.time.last()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(t: f64) -> WindowPoint {
        WindowPoint {
            time: t,
            temperature_c: 20.0 + t,
            humidity: 40.0,
            aqi: 1.0,
            eco2: 400.0,
            etvoc: f64::NAN,
        }
    }

    #[test]
    fn test_evicts_oldest_first() {
        let mut window = SlidingWindow::new(3);
        for t in 0..5 {
            window.push(point(t as f64));
        }

        assert_eq!(window.len(), 3);
        let snapshot = window.snapshot();
        assert_eq!(snapshot.time, &[2.0, 3.0, 4.0]);
        assert_eq!(snapshot.temperature_c, &[22.0, 23.0, 24.0]);
        assert_eq!(snapshot.time_range(), Some((2.0, 4.0)));
    }

    #[test]
    fn test_zero_capacity_holds_nothing() {
        let mut window = SlidingWindow::new(0);
        window.push(point(1.0));
        assert!(window.is_empty());
        assert!(window.snapshot().is_empty());
    }
}
