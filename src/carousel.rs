//! Auto-advancing demo step carousel.
//!
//! Spotlights one step of a fixed list at a time on a timer:
//!
//! ```text
//!   Idle ──visible──▶ Arming ──delay──▶ Running ──blank──▶ Pausing
//!    ▲                                   ▲   │                │
//!    └──────────── stop() ───────────────┴───┘◀── step 0 ─────┘
//! ```
//!
//! After the last step is highlighted the carousel stays `Running` for one
//! pause beat, clears every step, and then shows nothing (`Pausing`) until
//! step 0 comes round again.
//!
//! The carousel owns at most one live timer. Every transition that arms a
//! timer cancels the previous handle first, and expiries carrying any other
//! handle are ignored, so a restart can never run at double speed.

use crate::config::CarouselConfig;
use crate::sink::PresentationSink;
use crate::timer::{self, TimerHandle, Timers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarouselPhase {
    /// No timer, no index.
    Idle,
    /// Host region became visible; waiting out the auto-start delay.
    Arming,
    /// Stepping through the list.
    Running,
    /// Every step cleared; waiting to restart at step 0.
    Pausing,
}

#[derive(Debug)]
pub struct StepCarousel {
    steps: Vec<String>,
    interval_ms: u32,
    pause_ms: u32,
    autostart_delay_ms: u32,
    phase: CarouselPhase,
    /// Next step to highlight.
    index: Option<usize>,
    /// Step currently carrying the highlight.
    lit: Option<usize>,
    /// The pending tick clears the last step instead of advancing.
    blank_due: bool,
    timer: Option<TimerHandle>,
}

impl StepCarousel {
    pub fn new(steps: Vec<String>, config: &CarouselConfig) -> Self {
        Self {
            steps,
            interval_ms: config.interval_ms,
            pause_ms: config.pause_ms.min(config.interval_ms),
            autostart_delay_ms: config.autostart_delay_ms,
            phase: CarouselPhase::Idle,
            index: None,
            lit: None,
            blank_due: false,
            timer: None,
        }
    }

    pub fn steps(&self) -> &[String] {
        &self.steps
    }

    pub fn phase(&self) -> CarouselPhase {
        self.phase
    }

    /// Index of the next step to highlight, `None` while idle or arming.
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// True while cycling (including the blank beat).
    pub fn is_running(&self) -> bool {
        matches!(self.phase, CarouselPhase::Running | CarouselPhase::Pausing)
    }

    pub fn has_timer(&self) -> bool {
        self.timer.is_some()
    }

    pub fn owns(&self, handle: TimerHandle) -> bool {
        self.timer == Some(handle)
    }

    /// Identifier of the highlighted step, if any.
    pub fn active_step(&self) -> Option<&str> {
        self.lit
            .and_then(|i| self.steps.get(i))
            .map(String::as_str)
    }

    /// Begin a fresh cycle at step 0. Restarting cancels the running cycle
    /// first; an empty carousel stays idle.
    pub fn start(&mut self, timers: &mut dyn Timers) {
        if self.steps.is_empty() {
            log::debug!("carousel has no steps; not starting");
            return;
        }
        self.stop(timers);
        self.index = Some(0);
        self.phase = CarouselPhase::Running;
        timer::rearm(&mut self.timer, timers, self.interval_ms);
        log::debug!("carousel started with {} steps", self.steps.len());
    }

    /// Cancel the pending timer and go idle. Highlights are left as they are.
    pub fn stop(&mut self, timers: &mut dyn Timers) {
        timer::cancel(&mut self.timer, timers);
        self.phase = CarouselPhase::Idle;
        self.index = None;
        self.blank_due = false;
    }

    /// Visibility signal from the host region. Arms a delayed start when idle;
    /// ignored in every other phase.
    pub fn on_visibility(&mut self, visible: bool, timers: &mut dyn Timers) {
        if !visible || self.phase != CarouselPhase::Idle || self.steps.is_empty() {
            return;
        }
        self.phase = CarouselPhase::Arming;
        timer::rearm(&mut self.timer, timers, self.autostart_delay_ms);
    }

    /// Timer expiry. Returns `false` for handles the carousel does not own.
    pub fn tick(
        &mut self,
        handle: TimerHandle,
        timers: &mut dyn Timers,
        sink: &mut dyn PresentationSink,
    ) -> bool {
        if !self.owns(handle) {
            return false;
        }
        self.timer = None;
        match self.phase {
            CarouselPhase::Idle => {}
            CarouselPhase::Arming => self.start(timers),
            CarouselPhase::Running if self.blank_due => {
                self.blank(sink);
                self.blank_due = false;
                self.phase = CarouselPhase::Pausing;
                let remaining = self.interval_ms.saturating_sub(self.pause_ms);
                self.timer = Some(timers.set_timeout(remaining));
            }
            CarouselPhase::Running => self.advance(timers, sink),
            CarouselPhase::Pausing => {
                self.phase = CarouselPhase::Running;
                self.advance(timers, sink);
            }
        }
        true
    }

    fn advance(&mut self, timers: &mut dyn Timers, sink: &mut dyn PresentationSink) {
        let index = self.index.unwrap_or(0);
        let Some(step) = self.steps.get(index) else {
            self.stop(timers);
            return;
        };
        if let Some(previous) = self.lit.filter(|&p| p != index).and_then(|p| self.steps.get(p)) {
            sink.clear(previous);
        }
        sink.highlight(step);
        self.lit = Some(index);

        let next = index + 1;
        if next >= self.steps.len() {
            self.index = Some(0);
            self.blank_due = true;
            self.timer = Some(timers.set_timeout(self.pause_ms));
        } else {
            self.index = Some(next);
            self.timer = Some(timers.set_timeout(self.interval_ms));
        }
    }

    fn blank(&mut self, sink: &mut dyn PresentationSink) {
        for step in &self.steps {
            sink.clear(step);
        }
        self.lit = None;
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
    use crate::sink::MemorySink;
    use crate::timer::VirtualTime;

    fn carousel(steps: &[&str]) -> StepCarousel {
        StepCarousel::new(
            steps.iter().map(|s| (*s).to_string()).collect(),
            &CarouselConfig::default(),
        )
    }

    #[test]
    fn test_stop_from_idle_is_noop() {
        let mut time = VirtualTime::new();
        let mut c = carousel(&["a"]);
        c.stop(&mut time);
        c.stop(&mut time);
        assert_eq!(c.phase(), CarouselPhase::Idle);
        assert!(!c.has_timer());
    }

    #[test]
    fn test_stop_leaves_highlight() {
        let mut time = VirtualTime::new();
        let mut sink = MemorySink::new();
        let mut c = carousel(&["a", "b"]);
        c.start(&mut time);
        let h = time.fire_next().unwrap();
        c.tick(h, &mut time, &mut sink);
        c.stop(&mut time);
        assert_eq!(sink.highlighted(), vec!["a"]);
        assert_eq!(time.live_timers(), 0);
    }

    #[test]
    fn test_visibility_arms_once() {
        let mut time = VirtualTime::new();
        let mut c = carousel(&["a", "b"]);
        c.on_visibility(true, &mut time);
        c.on_visibility(true, &mut time);
        assert_eq!(c.phase(), CarouselPhase::Arming);
        assert_eq!(time.live_timers(), 1);
        assert_eq!(time.next_due(), Some(1000));
    }

    #[test]
    fn test_hidden_signal_ignored() {
        let mut time = VirtualTime::new();
        let mut c = carousel(&["a"]);
        c.on_visibility(false, &mut time);
        assert_eq!(c.phase(), CarouselPhase::Idle);
        assert_eq!(time.live_timers(), 0);
    }
}
