//! ---
//! elektra_section: "01-core-functionality"
//! elektra_subsection: "module"
//! elektra_type: "source"
//! elektra_scope: "code"
//! elektra_description: "Per-tick monitoring pipeline over rolling telemetry."
//! elektra_version: "v0.1.0"
//! elektra_owner: "tbd"
//! ---
use std::collections::VecDeque;

use elektra_sim::TelemetrySample;

/// Bounded sliding window of telemetry with the statistics the health
/// feature pipeline needs.
///
/// Oldest samples are evicted first. All statistics use the sample (n-1)
/// standard deviation and degrade to 0.0 rather than NaN when fewer than two
/// samples are available.
#[derive(Debug, Clone)]
pub struct RollingHistory {
    samples: VecDeque<TelemetrySample>,
    capacity: usize,
    rolling_std_window: usize,
}

impl RollingHistory {
    pub fn new(capacity: usize, rolling_std_window: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            rolling_std_window: rolling_std_window.max(2),
        }
    }

    pub fn push(&mut self, sample: TelemetrySample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn latest(&self) -> Option<&TelemetrySample> {
        self.samples.back()
    }

    pub fn mean_voltage(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().map(|s| s.voltage).sum::<f64>() / self.samples.len() as f64
    }

    pub fn voltage_std(&self) -> f64 {
        let voltages: Vec<f64> = self.samples.iter().map(|s| s.voltage).collect();
        sample_std(&voltages)
    }

    pub fn min_voltage(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples
            .iter()
            .map(|s| s.voltage)
            .fold(f64::INFINITY, f64::min)
    }

    pub fn max_voltage(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples
            .iter()
            .map(|s| s.voltage)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn max_temperature(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples
            .iter()
            .map(|s| s.temperature)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Mean of the sliding per-window voltage deviations: each full window of
    /// `rolling_std_window` consecutive samples contributes its own sample
    /// std, and the contributions are averaged. With fewer samples than one
    /// window this falls back to the plain window-wide std.
    pub fn rolling_voltage_std(&self) -> f64 {
        let voltages: Vec<f64> = self.samples.iter().map(|s| s.voltage).collect();
        if voltages.len() < self.rolling_std_window {
            return sample_std(&voltages);
        }
        let window_stds: Vec<f64> = voltages
            .windows(self.rolling_std_window)
            .map(sample_std)
            .collect();
        window_stds.iter().sum::<f64>() / window_stds.len() as f64
    }
}

fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values
        .iter()
        .map(|value| (value - mean).powi(2))
        .sum::<f64>()
        / (values.len() - 1) as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(voltage: f64, temperature: f64) -> TelemetrySample {
        TelemetrySample::new(0.0, voltage, -10.0, temperature)
    }

    #[test]
    fn eviction_keeps_the_window_bounded() {
        let mut history = RollingHistory::new(3, 2);
        for voltage in [350.0, 351.0, 352.0, 353.0, 354.0] {
            history.push(sample(voltage, 30.0));
        }
        assert_eq!(history.len(), 3);
        // 350 and 351 aged out.
        assert!((history.min_voltage() - 352.0).abs() < 1e-12);
        assert!((history.max_voltage() - 354.0).abs() < 1e-12);
        assert!((history.mean_voltage() - 353.0).abs() < 1e-12);
    }

    #[test]
    fn std_uses_the_sample_denominator() {
        let mut history = RollingHistory::new(10, 2);
        for voltage in [100.0, 200.0, 300.0] {
            history.push(sample(voltage, 30.0));
        }
        assert!((history.voltage_std() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn short_histories_report_zero_deviation() {
        let mut history = RollingHistory::new(10, 2);
        assert!((history.voltage_std() - 0.0).abs() < 1e-12);
        history.push(sample(380.0, 30.0));
        assert!((history.voltage_std() - 0.0).abs() < 1e-12);
    }

    #[test]
    fn rolling_std_falls_back_below_one_window() {
        let mut history = RollingHistory::new(30, 10);
        for voltage in [100.0, 200.0, 300.0] {
            history.push(sample(voltage, 30.0));
        }
        assert!((history.rolling_voltage_std() - history.voltage_std()).abs() < 1e-12);
    }

    #[test]
    fn rolling_std_averages_full_windows() {
        let mut history = RollingHistory::new(30, 10);
        for step in 0..12 {
            history.push(sample(f64::from(step), 30.0));
        }
        // Every 10-sample window over consecutive integers has the same
        // deviation, so the mean equals it exactly.
        let expected = (82.5f64 / 9.0).sqrt();
        assert!((history.rolling_voltage_std() - expected).abs() < 1e-9);
    }

    #[test]
    fn max_temperature_tracks_the_window() {
        let mut history = RollingHistory::new(3, 2);
        history.push(sample(350.0, 60.0));
        for _ in 0..3 {
            history.push(sample(350.0, 31.0));
        }
        // The 60 degree spike aged out of the window.
        assert!((history.max_temperature() - 31.0).abs() < 1e-12);
    }
}
