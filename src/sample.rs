//! Pointer samples - the input representation consumed by the classifier,
//! decoupled from any input backend for testability.

use std::time::Instant;

use strum::{Display, EnumString, IntoStaticStr};

/// Phase of a pointer sample within a gesture.
///
/// `PointerDown`/`PointerUp` mark a secondary contact joining or leaving
/// during a multitouch gesture. For a `PointerUp` that drops the contact
/// count from two to one, the sample position is the position of the
/// *remaining* pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
pub enum Phase {
    #[strum(serialize = "down")]
    Down,
    #[strum(serialize = "move")]
    Move,
    #[strum(serialize = "up")]
    Up,
    #[strum(serialize = "cancel")]
    Cancel,
    #[strum(serialize = "pointer_down")]
    PointerDown,
    #[strum(serialize = "pointer_up")]
    PointerUp,
}

/// One observed point in the input stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    pub x: f64,
    pub y: f64,
    pub timestamp: Instant,
    pub pointer_count: u32,
    pub phase: Phase,
}

impl PointerSample {
    /// Single-contact sample.
    pub fn new(phase: Phase, x: f64, y: f64, timestamp: Instant) -> Self {
        Self {
            x,
            y,
            timestamp,
            pointer_count: 1,
            phase,
        }
    }

    /// Same sample with a different contact count.
    pub fn with_pointer_count(mut self, pointer_count: u32) -> Self {
        self.pointer_count = pointer_count;
        self
    }

    /// Squared distance to another sample.
    pub fn distance_sq_to(&self, other: &PointerSample) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}
