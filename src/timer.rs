//! Time sources and one-shot timers.
//!
//! Components never touch `setTimeout` directly. They arm timers through
//! [`Timers`], keep the returned [`TimerHandle`], and are handed that handle
//! back when the timer fires. A component ignores any handle it does not
//! currently own, so a cancelled or superseded timer can never act on fresh
//! state.
//!
//! [`VirtualTime`] is a deterministic implementation of both traits used by
//! the native build and the test suite.

use std::collections::BTreeMap;

/// Opaque identifier of an armed one-shot timer.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Handle issued after `self` by a host whose ids fit in `1..=max`.
    /// Wraps from `max` back to 1; zero is never issued.
    pub const fn successor(self, max: u64) -> Self {
        if self.0 >= max {
            Self(1)
        } else {
            Self(self.0 + 1)
        }
    }
}

/// Monotonic millisecond clock.
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// One-shot timer host. Hosts also tell the time so that a single injected
/// object drives both scheduling and elapsed-time decisions.
pub trait Timers: Clock {
    /// Arm a timer firing once after `delay_ms`.
    fn set_timeout(&mut self, delay_ms: u32) -> TimerHandle;

    /// Cancel a timer. Unknown or already fired handles are ignored.
    fn clear_timeout(&mut self, handle: TimerHandle);
}

/// Cancel `slot`'s timer if any, leaving it empty.
pub fn cancel(slot: &mut Option<TimerHandle>, timers: &mut dyn Timers) {
    if let Some(handle) = slot.take() {
        timers.clear_timeout(handle);
    }
}

/// Replace `slot`'s timer with a fresh one, cancelling the previous handle first.
pub fn rearm(slot: &mut Option<TimerHandle>, timers: &mut dyn Timers, delay_ms: u32) -> TimerHandle {
    cancel(slot, timers);
    let handle = timers.set_timeout(delay_ms);
    *slot = Some(handle);
    handle
}

/// Whole milliseconds from `now_ms` until `due_ms`, rounded up and saturated
/// into `u32`. Past or non-finite deadlines give 0.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn delay_until(due_ms: f64, now_ms: f64) -> u32 {
    let delay = (due_ms - now_ms).ceil();
    if !delay.is_finite() || delay <= 0.0 {
        0
    } else if delay >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        // In range: checked above.
        delay as u32
    }
}

/// Deterministic clock and timer queue.
///
/// Time only moves when the owner calls [`VirtualTime::fire_next`] or
/// [`VirtualTime::run_for`]. Timers due at the same instant fire in the order
/// they were armed.
#[derive(Debug, Default)]
pub struct VirtualTime {
    now_ms: u64,
    last: TimerHandle,
    // (due, id) -> handle; ordering by id keeps same-instant timers FIFO.
    pending: BTreeMap<(u64, u64), TimerHandle>,
}

impl VirtualTime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time in whole milliseconds.
    pub fn now(&self) -> u64 {
        self.now_ms
    }

    /// Number of armed timers that have neither fired nor been cancelled.
    pub fn live_timers(&self) -> usize {
        self.pending.len()
    }

    pub fn is_live(&self, handle: TimerHandle) -> bool {
        self.pending.values().any(|h| *h == handle)
    }

    /// Due time of the earliest armed timer.
    pub fn next_due(&self) -> Option<u64> {
        self.pending.keys().next().map(|(due, _)| *due)
    }

    /// Jump to the earliest armed timer and return its handle.
    pub fn fire_next(&mut self) -> Option<TimerHandle> {
        let ((due, _), handle) = self.pending.pop_first()?;
        self.now_ms = self.now_ms.max(due);
        Some(handle)
    }

    /// Advance by `ms`, firing every timer that comes due on the way.
    ///
    /// `on_fire` may arm new timers; those fire too if they fall inside the
    /// window. Returns the number of timers fired.
    pub fn run_for<F>(&mut self, ms: u64, mut on_fire: F) -> usize
    where
        F: FnMut(&mut Self, TimerHandle),
    {
        let deadline = self.now_ms.saturating_add(ms);
        let mut fired = 0;
        while self.next_due().is_some_and(|due| due <= deadline) {
            if let Some(handle) = self.fire_next() {
                fired += 1;
                on_fire(self, handle);
            }
        }
        self.now_ms = deadline;
        fired
    }
}

impl Clock for VirtualTime {
    #[allow(clippy::cast_precision_loss)]
    fn now_ms(&self) -> f64 {
        self.now_ms as f64
    }
}

impl Timers for VirtualTime {
    fn set_timeout(&mut self, delay_ms: u32) -> TimerHandle {
        self.last = self.last.successor(u64::MAX);
        let handle = self.last;
        let due = self.now_ms.saturating_add(u64::from(delay_ms));
        self.pending.insert((due, handle.raw()), handle);
        handle
    }

    fn clear_timeout(&mut self, handle: TimerHandle) {
        self.pending.retain(|_, h| *h != handle);
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;

    #[test]
    fn test_fire_order_and_clock() {
        let mut time = VirtualTime::new();
        let late = time.set_timeout(300);
        let early = time.set_timeout(100);
        let tie = time.set_timeout(100);

        assert_eq!(time.fire_next(), Some(early));
        assert_eq!(time.now(), 100);
        assert_eq!(time.fire_next(), Some(tie));
        assert_eq!(time.fire_next(), Some(late));
        assert_eq!(time.now_ms(), 300.0);
        assert_eq!(time.fire_next(), None);
    }

    #[test]
    fn test_clear_removes_timer() {
        let mut time = VirtualTime::new();
        let handle = time.set_timeout(50);
        assert!(time.is_live(handle));
        time.clear_timeout(handle);
        assert!(!time.is_live(handle));
        assert_eq!(time.live_timers(), 0);
        // Clearing twice is harmless.
        time.clear_timeout(handle);
    }

    #[test]
    fn test_run_for_fires_rearmed_timers_inside_window() {
        let mut time = VirtualTime::new();
        time.set_timeout(10);
        let mut seen = Vec::new();
        let fired = time.run_for(35, |t, h| {
            seen.push((t.now(), h));
            t.set_timeout(10);
        });
        assert_eq!(fired, 3);
        assert_eq!(seen.iter().map(|(at, _)| *at).collect::<Vec<_>>(), vec![10, 20, 30]);
        assert_eq!(time.now(), 35);
        assert_eq!(time.live_timers(), 1);
    }

    #[test]
    fn test_successor_skips_zero_on_wrap() {
        let max = u64::from(u32::MAX);
        assert_eq!(TimerHandle::from_raw(0).successor(max), TimerHandle::from_raw(1));
        assert_eq!(TimerHandle::from_raw(41).successor(max), TimerHandle::from_raw(42));
        assert_eq!(TimerHandle::from_raw(max - 1).successor(max), TimerHandle::from_raw(max));
        assert_eq!(TimerHandle::from_raw(max).successor(max), TimerHandle::from_raw(1));
        assert_eq!(TimerHandle::from_raw(u64::MAX).successor(u64::MAX), TimerHandle::from_raw(1));
    }

    #[test]
    fn test_first_virtual_handle_is_one() {
        let mut time = VirtualTime::new();
        assert_eq!(time.set_timeout(10), TimerHandle::from_raw(1));
        assert_eq!(time.set_timeout(10), TimerHandle::from_raw(2));
    }

    #[test]
    fn test_rearm_cancels_previous() {
        let mut time = VirtualTime::new();
        let mut slot = None;
        let first = rearm(&mut slot, &mut time, 100);
        let second = rearm(&mut slot, &mut time, 100);
        assert_ne!(first, second);
        assert!(!time.is_live(first));
        assert!(time.is_live(second));
        cancel(&mut slot, &mut time);
        assert_eq!(slot, None);
        assert_eq!(time.live_timers(), 0);
    }
}
