//! ---
//! elektra_section: "01-core-functionality"
//! elektra_subsection: "module"
//! elektra_type: "source"
//! elektra_scope: "code"
//! elektra_description: "Shared configuration primitives for the estimation runtime."
//! elektra_version: "v0.1.0"
//! elektra_owner: "tbd"
//! ---
use std::time::{Duration, Instant};

/// Capture an instant suitable for tick-loop comparisons.
pub fn monotonic_now() -> Instant {
    Instant::now()
}

/// Signed deviation of an observed interval from its target, in whole
/// microseconds. Positive means the interval ran long.
pub fn jitter_us(actual: Duration, expected: Duration) -> i64 {
    let delta_secs = actual.as_secs_f64() - expected.as_secs_f64();
    (delta_secs * 1e6).round() as i64
}
