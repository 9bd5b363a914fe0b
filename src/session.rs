//! Mutable state of an in-progress (or just-ended) gesture.

use crate::sample::PointerSample;

/// The sole mutable record a classifier keeps between pointer samples.
///
/// Reset in place on every press rather than reallocated. Fields are public
/// for direct inspection in tests.
#[derive(Debug, Default)]
pub struct GestureSession {
    /// The sample that started the current press.
    pub down_sample: Option<PointerSample>,
    /// Most recently observed coordinates; anchor for per-move scroll deltas.
    pub last_x: f64,
    pub last_y: f64,
    /// True between `Down` and `Up`/`Cancel`.
    pub still_down: bool,
    /// True once the long-press timer has fired for this press.
    pub in_long_press: bool,
    /// True while cumulative displacement from the down stays within the tap
    /// slop. Never becomes true again for this press once cleared.
    pub always_in_tap_region: bool,
    /// Same, with the larger threshold that gates double-tap eligibility.
    pub always_in_bigger_tap_region: bool,
    /// True from a down recognized as the second tap of a double tap until
    /// the matching up.
    pub is_double_tapping: bool,
}

impl GestureSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-arm the session for a new press.
    ///
    /// Leaves `is_double_tapping` alone: the down handler decides that flag
    /// before calling this, and it is cleared at `Up`/`Cancel`.
    pub fn begin_press(&mut self, sample: &PointerSample) {
        self.down_sample = Some(*sample);
        self.last_x = sample.x;
        self.last_y = sample.y;
        self.still_down = true;
        self.in_long_press = false;
        self.always_in_tap_region = true;
        self.always_in_bigger_tap_region = true;
    }

    /// Full reset, for `Cancel` or a multitouch abort.
    pub fn clear(&mut self) {
        self.down_sample = None;
        self.still_down = false;
        self.in_long_press = false;
        self.always_in_tap_region = false;
        self.always_in_bigger_tap_region = false;
        self.is_double_tapping = false;
    }
}

/// The previous tap's down/up pair, read at the next down to test for a
/// double tap.
#[derive(Debug, Clone, Copy)]
pub struct PreviousTapRecord {
    pub down: PointerSample,
    pub up: PointerSample,
}
