//! Gesture classification engine for pointer sample streams.
//!
//! The [`GestureClassifier`] is a synchronous, single-threaded state machine:
//! pointer samples and timer firings go in (strictly serialized, in time
//! order), listener callbacks come out. It keeps no state beyond the current
//! gesture plus the previous tap pair needed for double-tap detection.

use std::time::{Duration, Instant};

use crate::config::ClassifierConfig;
use crate::sample::{Phase, PointerSample};
use crate::session::{GestureSession, PreviousTapRecord};
use crate::timer::{ManualTimerDriver, TimerDriver, TimerToken};
use crate::velocity::VelocityTracker;

/// Consumer of the classified gesture stream.
///
/// `bool` returns report whether the listener consumed the event; the
/// classifier ORs them into the return value of
/// [`GestureClassifier::handle_pointer_event`].
pub trait GestureListener {
    fn on_down(&mut self, sample: PointerSample) -> bool;
    fn on_show_press(&mut self, sample: PointerSample);
    fn on_single_tap_up(&mut self, sample: PointerSample) -> bool;
    /// `dx`/`dy` are the pointer's movement since the previous scroll
    /// callback, not since the down; deltas across a gesture sum to the net
    /// displacement.
    fn on_scroll(&mut self, from: PointerSample, to: PointerSample, dx: f64, dy: f64) -> bool;
    fn on_long_press(&mut self, sample: PointerSample);
    fn on_fling(&mut self, from: PointerSample, to: PointerSample, vx: f64, vy: f64) -> bool;
}

/// Optional second listener for tap-disambiguation callbacks.
///
/// While one is registered, every first tap schedules a confirmation
/// deadline: a second qualifying tap inside the window becomes a double tap,
/// otherwise `on_single_tap_confirmed` fires once the window closes.
pub trait DoubleTapListener {
    fn on_single_tap_confirmed(&mut self, sample: PointerSample) -> bool;
    fn on_double_tap(&mut self, first_down: PointerSample) -> bool;
    /// Fired for the down, moves, and up of the second tap.
    fn on_double_tap_event(&mut self, sample: PointerSample) -> bool;
}

/// Pointer-gesture state machine.
///
/// All inputs for one instance must be delivered on one logical thread;
/// handlers run to completion, listener callbacks included.
pub struct GestureClassifier<L: GestureListener, D: TimerDriver = ManualTimerDriver> {
    config: ClassifierConfig,
    listener: L,
    double_tap_listener: Option<Box<dyn DoubleTapListener>>,
    session: GestureSession,
    previous_tap: Option<PreviousTapRecord>,
    velocity: VelocityTracker,
    timers: D,
    long_press_enabled: bool,
    show_press_timer: Option<TimerToken>,
    long_press_timer: Option<TimerToken>,
    tap_confirm_timer: Option<TimerToken>,
}

/// Cancel the slot's stale token (if any) before scheduling the new one.
/// A stale firing against a re-armed slot would hit different session state.
fn arm_timer<D: TimerDriver>(timers: &mut D, slot: &mut Option<TimerToken>, deadline: Instant) {
    if let Some(stale) = slot.take() {
        timers.cancel(stale);
    }
    *slot = Some(timers.schedule(deadline));
}

fn disarm_timer<D: TimerDriver>(timers: &mut D, slot: &mut Option<TimerToken>) {
    if let Some(token) = slot.take() {
        timers.cancel(token);
    }
}

impl<L: GestureListener> GestureClassifier<L, ManualTimerDriver> {
    /// Classifier backed by the built-in deterministic timer driver.
    pub fn new(config: ClassifierConfig, listener: L) -> Self {
        Self::with_driver(config, listener, ManualTimerDriver::new())
    }

    /// Fire every timer due at or before `now`, in deadline order.
    pub fn advance_to(&mut self, now: Instant) {
        while let Some(token) = self.timers.pop_due(now) {
            self.handle_timer(token);
        }
    }

    /// Earliest pending timer deadline, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }
}

impl<L: GestureListener, D: TimerDriver> GestureClassifier<L, D> {
    /// Classifier scheduling through a caller-supplied [`TimerDriver`].
    ///
    /// The host must deliver due tokens back via [`Self::handle_timer`] on
    /// the same thread that feeds pointer samples.
    pub fn with_driver(config: ClassifierConfig, listener: L, driver: D) -> Self {
        Self {
            config,
            listener,
            double_tap_listener: None,
            session: GestureSession::new(),
            previous_tap: None,
            velocity: VelocityTracker::new(),
            timers: driver,
            long_press_enabled: true,
            show_press_timer: None,
            long_press_timer: None,
            tap_confirm_timer: None,
        }
    }

    /// Register or remove the double-tap listener.
    ///
    /// With `None`, no tap-confirmation deadline is ever scheduled and every
    /// tap is delivered solely through `on_single_tap_up`.
    pub fn set_double_tap_listener(&mut self, listener: Option<Box<dyn DoubleTapListener>>) {
        self.double_tap_listener = listener;
    }

    /// Enable or disable long-press detection for subsequent presses.
    pub fn set_long_press_enabled(&mut self, enabled: bool) {
        self.long_press_enabled = enabled;
    }

    pub fn is_long_press_enabled(&self) -> bool {
        self.long_press_enabled
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    pub fn listener_mut(&mut self) -> &mut L {
        &mut self.listener
    }

    /// Current gesture state, for inspection in tests and debugging.
    pub fn session(&self) -> &GestureSession {
        &self.session
    }

    /// Process one pointer sample.
    ///
    /// Returns true if any listener callback consumed the event. Unpaired
    /// `Move`/`Up` samples (no live down) are absorbed as a no-op.
    pub fn handle_pointer_event(&mut self, sample: &PointerSample) -> bool {
        match sample.phase {
            Phase::Down => self.on_down(sample),
            Phase::Move => self.on_move(sample),
            Phase::Up => self.on_up(sample),
            Phase::Cancel => {
                self.abort_gesture();
                false
            }
            Phase::PointerDown => {
                if self.config.ignore_multitouch {
                    // A second contact usually belongs to a different
                    // recognizer (pinch, rotate); yield instead of guessing.
                    self.abort_gesture();
                }
                false
            }
            Phase::PointerUp => {
                if self.config.ignore_multitouch && sample.pointer_count == 2 {
                    // Hand tracking off to the surviving finger; not a new
                    // press, so no re-classification and no on_down.
                    self.session.last_x = sample.x;
                    self.session.last_y = sample.y;
                }
                false
            }
        }
    }

    /// Process a timer firing.
    ///
    /// Tokens matching no armed slot (already canceled or consumed) are
    /// ignored, so stale deliveries can never act on re-armed state.
    pub fn handle_timer(&mut self, token: TimerToken) {
        if self.show_press_timer == Some(token) {
            self.show_press_timer = None;
            if let Some(down) = self.session.down_sample {
                self.listener.on_show_press(down);
            }
        } else if self.long_press_timer == Some(token) {
            self.long_press_timer = None;
            self.dispatch_long_press();
        } else if self.tap_confirm_timer == Some(token) {
            self.tap_confirm_timer = None;
            self.confirm_single_tap();
        }
    }

    fn on_down(&mut self, sample: &PointerSample) -> bool {
        let mut handled = false;

        if self.double_tap_listener.is_some() {
            let had_tap_pending = self.tap_confirm_timer.is_some();
            disarm_timer(&mut self.timers, &mut self.tap_confirm_timer);

            let second_tap = had_tap_pending
                && self
                    .previous_tap
                    .is_some_and(|prev| self.is_considered_double_tap(&prev, sample));

            if second_tap {
                self.session.is_double_tapping = true;
                if let (Some(prev), Some(dt)) =
                    (self.previous_tap, self.double_tap_listener.as_deref_mut())
                {
                    handled |= dt.on_double_tap(prev.down);
                    handled |= dt.on_double_tap_event(*sample);
                }
            } else {
                arm_timer(
                    &mut self.timers,
                    &mut self.tap_confirm_timer,
                    sample.timestamp + self.config.double_tap_timeout,
                );
            }
        }

        self.session.begin_press(sample);
        self.velocity.clear();
        self.velocity.push(sample);

        if self.long_press_enabled {
            // The long-press window opens only after the tap window closes.
            arm_timer(
                &mut self.timers,
                &mut self.long_press_timer,
                sample.timestamp + self.config.tap_timeout + self.config.long_press_timeout,
            );
        }
        arm_timer(
            &mut self.timers,
            &mut self.show_press_timer,
            sample.timestamp + self.config.tap_timeout,
        );

        handled |= self.listener.on_down(*sample);
        handled
    }

    fn on_move(&mut self, sample: &PointerSample) -> bool {
        if self.session.in_long_press {
            return false;
        }
        if self.config.ignore_multitouch && sample.pointer_count > 1 {
            return false;
        }
        let Some(down) = self.session.down_sample else {
            return false;
        };
        self.velocity.push(sample);

        if self.session.is_double_tapping {
            return match self.double_tap_listener.as_deref_mut() {
                Some(dt) => dt.on_double_tap_event(*sample),
                None => false,
            };
        }

        let dx = sample.x - self.session.last_x;
        let dy = sample.y - self.session.last_y;
        let mut handled = false;

        if self.session.always_in_tap_region {
            let displacement_sq = sample.distance_sq_to(&down);
            if displacement_sq > self.config.tap_slop_sq {
                handled = self.listener.on_scroll(down, *sample, dx, dy);
                self.session.last_x = sample.x;
                self.session.last_y = sample.y;
                self.session.always_in_tap_region = false;
                // A real scroll can no longer be a tap or a long press.
                disarm_timer(&mut self.timers, &mut self.tap_confirm_timer);
                disarm_timer(&mut self.timers, &mut self.show_press_timer);
                disarm_timer(&mut self.timers, &mut self.long_press_timer);
            }
            if displacement_sq > self.config.bigger_tap_slop_sq {
                self.session.always_in_bigger_tap_region = false;
            }
        } else if dx.abs() >= 1.0 || dy.abs() >= 1.0 {
            // Sub-unit moves accumulate into the next delta instead of
            // flooding the listener.
            handled = self.listener.on_scroll(down, *sample, dx, dy);
            self.session.last_x = sample.x;
            self.session.last_y = sample.y;
        }
        handled
    }

    fn on_up(&mut self, sample: &PointerSample) -> bool {
        let Some(down) = self.session.down_sample else {
            return false;
        };
        self.session.still_down = false;
        self.velocity.push(sample);

        let mut handled = false;
        if self.session.is_double_tapping {
            if let Some(dt) = self.double_tap_listener.as_deref_mut() {
                handled |= dt.on_double_tap_event(*sample);
            }
        } else if self.session.in_long_press {
            // The long press owns this release; no tap fires.
            disarm_timer(&mut self.timers, &mut self.tap_confirm_timer);
            self.session.in_long_press = false;
        } else if self.session.always_in_tap_region {
            handled = self.listener.on_single_tap_up(*sample);
        } else {
            let (vx, vy) = self
                .velocity
                .estimate(Duration::from_secs(1), self.config.max_fling_velocity);
            if vx.abs() > self.config.min_fling_velocity
                || vy.abs() > self.config.min_fling_velocity
            {
                handled = self.listener.on_fling(down, *sample, vx, vy);
            }
        }

        self.previous_tap = Some(PreviousTapRecord {
            down,
            up: *sample,
        });
        self.session.is_double_tapping = false;
        disarm_timer(&mut self.timers, &mut self.show_press_timer);
        disarm_timer(&mut self.timers, &mut self.long_press_timer);
        self.velocity.clear();
        handled
    }

    fn dispatch_long_press(&mut self) {
        disarm_timer(&mut self.timers, &mut self.tap_confirm_timer);
        let Some(down) = self.session.down_sample else {
            return;
        };
        self.session.in_long_press = true;
        self.listener.on_long_press(down);
    }

    fn confirm_single_tap(&mut self) {
        // A finger still on the surface is not a finished tap.
        if self.session.still_down {
            return;
        }
        let Some(down) = self.session.down_sample else {
            return;
        };
        if let Some(dt) = self.double_tap_listener.as_deref_mut() {
            dt.on_single_tap_confirmed(down);
        }
    }

    fn is_considered_double_tap(
        &self,
        prev: &PreviousTapRecord,
        new_down: &PointerSample,
    ) -> bool {
        if !self.session.always_in_bigger_tap_region {
            return false;
        }
        if new_down.timestamp.duration_since(prev.up.timestamp) > self.config.double_tap_timeout {
            return false;
        }
        prev.down.distance_sq_to(new_down) <= self.config.double_tap_slop_sq
    }

    fn abort_gesture(&mut self) {
        disarm_timer(&mut self.timers, &mut self.show_press_timer);
        disarm_timer(&mut self.timers, &mut self.long_press_timer);
        disarm_timer(&mut self.timers, &mut self.tap_confirm_timer);
        self.session.clear();
        self.velocity.clear();
    }
}
