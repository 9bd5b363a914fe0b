//! Windowed velocity estimation over recent pointer samples.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::sample::PointerSample;

/// Samples older than this relative to the newest are dropped; only the
/// most recent stretch of movement should shape a fling.
const HORIZON: Duration = Duration::from_millis(100);

/// Rolling window of timestamped positions for one pointer.
#[derive(Debug, Default)]
pub struct VelocityTracker {
    samples: VecDeque<(Instant, f64, f64)>,
}

impl VelocityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a sample and prune everything behind the horizon.
    pub fn push(&mut self, sample: &PointerSample) {
        self.samples
            .push_back((sample.timestamp, sample.x, sample.y));
        let newest = sample.timestamp;
        while let Some(&(oldest, _, _)) = self.samples.front() {
            if newest.duration_since(oldest) > HORIZON {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Estimate the velocity vector across the window, in units per
    /// `unit_time`, with each component clamped to `±max_velocity`.
    ///
    /// Returns `(0.0, 0.0)` with fewer than two samples or a zero time base.
    pub fn estimate(&self, unit_time: Duration, max_velocity: f64) -> (f64, f64) {
        let (Some(&(t0, x0, y0)), Some(&(t1, x1, y1))) =
            (self.samples.front(), self.samples.back())
        else {
            return (0.0, 0.0);
        };

        let dt = t1.duration_since(t0).as_secs_f64();
        if self.samples.len() < 2 || dt <= 0.0 {
            return (0.0, 0.0);
        }

        let scale = unit_time.as_secs_f64() / dt;
        let vx = ((x1 - x0) * scale).clamp(-max_velocity, max_velocity);
        let vy = ((y1 - y0) * scale).clamp(-max_velocity, max_velocity);
        (vx, vy)
    }
}
