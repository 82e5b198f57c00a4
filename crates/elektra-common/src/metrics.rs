//! ---
//! elektra_section: "01-core-functionality"
//! elektra_subsection: "module"
//! elektra_type: "source"
//! elektra_scope: "code"
//! elektra_description: "Shared configuration primitives for the estimation runtime."
//! elektra_version: "v0.1.0"
//! elektra_owner: "tbd"
//! ---
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Serialize;

use crate::time::monotonic_now;

/// Distribution summary of recorded tick jitter, in microseconds.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct JitterSummary {
    pub mean_us: f64,
    pub std_dev_us: f64,
    pub max_us: f64,
    pub min_us: f64,
    pub samples: u64,
}

/// Absolute per-tick deviations from the target period, in microseconds.
#[derive(Debug, Default)]
pub struct JitterHistogram {
    samples: Mutex<Vec<f64>>,
}

impl JitterHistogram {
    pub fn record(&self, jitter: Duration) {
        self.samples.lock().push(jitter.as_secs_f64() * 1e6);
    }

    /// Summarise everything recorded so far. `None` until the first sample.
    pub fn summary(&self) -> Option<JitterSummary> {
        summarize(&self.samples.lock())
    }

    /// Dump the summary as pretty JSON. An empty histogram writes nothing
    /// and succeeds.
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        match self.summary() {
            Some(summary) => {
                let json = serde_json::to_vec_pretty(&summary).map_err(std::io::Error::other)?;
                fs::write(path, json)
            }
            None => Ok(()),
        }
    }
}

fn summarize(values: &[f64]) -> Option<JitterSummary> {
    let (first, rest) = values.split_first()?;
    let mut min = *first;
    let mut max = *first;
    let mut sum = *first;
    for &value in rest {
        min = min.min(value);
        max = max.max(value);
        sum += value;
    }
    let count = values.len() as f64;
    let mean = sum / count;
    let std_dev = if values.len() > 1 {
        let squared: f64 = values.iter().map(|value| (value - mean).powi(2)).sum();
        (squared / (count - 1.0)).sqrt()
    } else {
        0.0
    };
    Some(JitterSummary {
        mean_us: mean,
        std_dev_us: std_dev,
        max_us: max,
        min_us: min,
        samples: values.len() as u64,
    })
}

/// Measures how far apart consecutive monitor ticks land from the target
/// period.
#[derive(Debug)]
pub struct TickTimingReporter {
    target_interval: Duration,
    last_tick: Mutex<Option<Instant>>,
    histogram: JitterHistogram,
}

impl TickTimingReporter {
    pub fn new(target_interval: Duration) -> Self {
        Self {
            target_interval,
            last_tick: Mutex::new(None),
            histogram: JitterHistogram::default(),
        }
    }

    /// Mark one loop iteration. The first call only anchors the clock; each
    /// later call records the absolute deviation of the elapsed interval
    /// from the target.
    pub fn record_tick(&self) {
        let now = monotonic_now();
        let mut last_tick = self.last_tick.lock();
        if let Some(previous) = last_tick.replace(now) {
            let actual = now.duration_since(previous);
            self.histogram.record(actual.abs_diff(self.target_interval));
        }
    }

    pub fn histogram(&self) -> &JitterHistogram {
        &self.histogram
    }
}
