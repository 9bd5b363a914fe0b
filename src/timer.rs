//! Timer scheduling seam between the classifier and its host event loop.
//!
//! The classifier schedules deadlines through a [`TimerDriver`] and receives
//! firings back through `GestureClassifier::handle_timer`. A canceled token
//! must never be delivered; the provided [`ManualTimerDriver`] guarantees
//! this by removing the entry on cancel.

use std::time::Instant;

/// Opaque handle for one scheduled deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(pub u64);

/// Capability the classifier needs from its host's scheduler.
///
/// Delivery is the host's job: pop or observe due deadlines and call
/// `handle_timer(token)` on the same logical thread that feeds pointer
/// samples.
pub trait TimerDriver {
    /// Schedule a firing at `deadline`, returning a token unique among
    /// in-flight timers.
    fn schedule(&mut self, deadline: Instant) -> TimerToken;

    /// Cancel a pending timer. Unknown or already-fired tokens are a no-op.
    fn cancel(&mut self, token: TimerToken);
}

/// Deterministic driver for single-threaded hosts and tests.
///
/// Pending deadlines sit in an unordered list (three timers at most in
/// practice); [`ManualTimerDriver::pop_due`] selects the earliest.
#[derive(Debug, Default)]
pub struct ManualTimerDriver {
    pending: Vec<(TimerToken, Instant)>,
    next_token: u64,
}

impl ManualTimerDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return the earliest timer with `deadline <= now`.
    ///
    /// Ties resolve in scheduling order, so callers draining in a loop see
    /// deliveries in a deterministic order.
    pub fn pop_due(&mut self, now: Instant) -> Option<TimerToken> {
        let idx = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, (_, deadline))| *deadline <= now)
            .min_by_key(|(_, (token, deadline))| (*deadline, token.0))
            .map(|(idx, _)| idx)?;
        Some(self.pending.swap_remove(idx).0)
    }

    /// Earliest pending deadline, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.iter().map(|(_, deadline)| *deadline).min()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

impl TimerDriver for ManualTimerDriver {
    fn schedule(&mut self, deadline: Instant) -> TimerToken {
        let token = TimerToken(self.next_token);
        self.next_token += 1;
        self.pending.push((token, deadline));
        token
    }

    fn cancel(&mut self, token: TimerToken) {
        self.pending.retain(|(t, _)| *t != token);
    }
}
