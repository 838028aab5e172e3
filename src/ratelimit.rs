//! Policy-driven rate limiting for high-frequency events (scroll, resize).
//!
//! The limiter owns at most one timer. Values arriving while a window is open
//! are coalesced: only the most recent one survives.

use serde::{Deserialize, Serialize};

use crate::timer::{self, TimerHandle, Timers};

/// When a rate-limited value is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    /// Release immediately, then drop everything until the window has passed.
    Leading,
    /// The first value opens a window; the latest value is released when it closes.
    #[default]
    Trailing,
    /// Every value restarts the window; release after a quiet period.
    Debounce,
}

/// Coalescing rate limiter over values of type `T`.
#[derive(Debug)]
pub struct RateLimiter<T> {
    policy: Policy,
    wait_ms: u32,
    pending: Option<T>,
    timer: Option<TimerHandle>,
    last_release_ms: Option<f64>,
}

impl<T> RateLimiter<T> {
    pub fn new(policy: Policy, wait_ms: u32) -> Self {
        Self {
            policy,
            wait_ms,
            pending: None,
            timer: None,
            last_release_ms: None,
        }
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    pub fn wait_ms(&self) -> u32 {
        self.wait_ms
    }

    /// Whether a value is waiting for its window to close.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn owns(&self, handle: TimerHandle) -> bool {
        self.timer == Some(handle)
    }

    /// Offer a value. Returns it back when it should be applied right now
    /// (leading edge); otherwise it is held until [`RateLimiter::fire`].
    pub fn call(&mut self, value: T, timers: &mut dyn Timers) -> Option<T> {
        match self.policy {
            Policy::Leading => {
                let now = timers.now_ms();
                let open = self
                    .last_release_ms
                    .map_or(true, |last| now - last >= f64::from(self.wait_ms));
                if open {
                    self.last_release_ms = Some(now);
                    Some(value)
                } else {
                    None
                }
            }
            Policy::Trailing => {
                self.pending = Some(value);
                if self.timer.is_none() {
                    self.timer = Some(timers.set_timeout(self.wait_ms));
                }
                None
            }
            Policy::Debounce => {
                self.pending = Some(value);
                timer::rearm(&mut self.timer, timers, self.wait_ms);
                None
            }
        }
    }

    /// Handle a timer expiry at `now_ms`. Returns the coalesced value if
    /// `handle` is this limiter's live timer, `None` for foreign or stale handles.
    pub fn fire(&mut self, handle: TimerHandle, now_ms: f64) -> Option<T> {
        if !self.owns(handle) {
            return None;
        }
        self.timer = None;
        self.last_release_ms = Some(now_ms);
        self.pending.take()
    }

    /// Drop any held value and cancel the window.
    pub fn cancel(&mut self, timers: &mut dyn Timers) {
        timer::cancel(&mut self.timer, timers);
        self.pending = None;
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
    use crate::timer::{Clock, VirtualTime};

    /// Advance `ms`, collecting `(time, value)` for every release.
    fn advance(limiter: &mut RateLimiter<u32>, time: &mut VirtualTime, ms: u64) -> Vec<(u64, u32)> {
        let mut released = Vec::new();
        time.run_for(ms, |t, h| {
            if let Some(v) = limiter.fire(h, t.now_ms()) {
                released.push((t.now(), v));
            }
        });
        released
    }

    #[test]
    fn test_trailing_releases_last_value_at_window_end() {
        let mut time = VirtualTime::new();
        let mut limiter = RateLimiter::new(Policy::Trailing, 100);

        assert_eq!(limiter.call(1, &mut time), None);
        assert!(advance(&mut limiter, &mut time, 30).is_empty());
        assert_eq!(limiter.call(2, &mut time), None);
        assert!(advance(&mut limiter, &mut time, 30).is_empty());
        assert_eq!(limiter.call(3, &mut time), None);
        assert_eq!(time.live_timers(), 1);

        assert_eq!(advance(&mut limiter, &mut time, 100), vec![(100, 3)]);
        assert!(!limiter.is_pending());
        assert_eq!(time.live_timers(), 0);
    }

    #[test]
    fn test_trailing_steady_stream_releases_once_per_window() {
        let mut time = VirtualTime::new();
        let mut limiter = RateLimiter::new(Policy::Trailing, 100);
        let mut released = Vec::new();

        // One event every 10ms for 350ms.
        for i in 0..35 {
            limiter.call(i, &mut time);
            released.extend(advance(&mut limiter, &mut time, 10));
        }
        assert_eq!(released, vec![(100, 9), (200, 19), (300, 29)]);
    }

    #[test]
    fn test_debounce_waits_for_quiet() {
        let mut time = VirtualTime::new();
        let mut limiter = RateLimiter::new(Policy::Debounce, 100);
        let mut released = Vec::new();

        for i in 0..5 {
            limiter.call(i, &mut time);
            released.extend(advance(&mut limiter, &mut time, 50));
        }
        assert!(released.is_empty());
        assert_eq!(time.live_timers(), 1);

        assert_eq!(advance(&mut limiter, &mut time, 100), vec![(300, 4)]);
    }

    #[test]
    fn test_leading_releases_immediately_then_drops() {
        let mut time = VirtualTime::new();
        let mut limiter = RateLimiter::new(Policy::Leading, 100);

        assert_eq!(limiter.call(1, &mut time), Some(1));
        assert_eq!(limiter.call(2, &mut time), None);
        advance(&mut limiter, &mut time, 99);
        assert_eq!(limiter.call(3, &mut time), None);
        advance(&mut limiter, &mut time, 1);
        assert_eq!(limiter.call(4, &mut time), Some(4));
        assert_eq!(time.live_timers(), 0);
    }

    #[test]
    fn test_cancel_drops_pending_and_ignores_stale_fire() {
        let mut time = VirtualTime::new();
        let mut limiter = RateLimiter::new(Policy::Trailing, 100);
        limiter.call(7, &mut time);
        assert!(limiter.is_pending());

        limiter.cancel(&mut time);
        assert!(!limiter.is_pending());
        assert_eq!(time.live_timers(), 0);
        assert_eq!(limiter.fire(TimerHandle::from_raw(1), 100.0), None);
    }

    #[test]
    fn test_foreign_handle_ignored() {
        let mut time = VirtualTime::new();
        let mut limiter = RateLimiter::new(Policy::Trailing, 100);
        limiter.call(7, &mut time);
        let foreign = time.set_timeout(5);
        assert_eq!(limiter.fire(foreign, 5.0), None);
        assert!(limiter.is_pending());
    }
}
