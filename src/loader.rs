//! Simulated loading screen.
//!
//! Progress climbs by a random step every tick until it reaches 100%, then the
//! screen is hidden after a short delay. Hiding is the cue for the hero reveal.

use crate::config::LoaderConfig;
use crate::sink::PresentationSink;
use crate::timer::{self, TimerHandle, Timers};

pub const SCREEN_ID: &str = "loading-screen";
pub const BAR_ID: &str = "loading-progress";

const COMPLETE: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderPhase {
    Idle,
    Loading,
    /// Bar is full; waiting to hide the screen.
    Finishing,
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoaderEvent {
    Progress(f64),
    Hidden,
}

#[derive(Debug)]
pub struct LoadingScreen {
    tick_ms: u32,
    max_increment: f64,
    hide_delay_ms: u32,
    progress: f64,
    phase: LoaderPhase,
    timer: Option<TimerHandle>,
}

impl LoadingScreen {
    pub fn new(config: &LoaderConfig) -> Self {
        Self {
            tick_ms: config.tick_ms,
            max_increment: config.max_increment,
            hide_delay_ms: config.hide_delay_ms,
            progress: 0.0,
            phase: LoaderPhase::Idle,
            timer: None,
        }
    }

    pub fn phase(&self) -> LoaderPhase {
        self.phase
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// True until the screen has been hidden.
    pub fn is_loading(&self) -> bool {
        self.phase != LoaderPhase::Hidden
    }

    pub fn owns(&self, handle: TimerHandle) -> bool {
        self.timer == Some(handle)
    }

    pub fn start(&mut self, timers: &mut dyn Timers) {
        if self.phase != LoaderPhase::Idle {
            return;
        }
        self.phase = LoaderPhase::Loading;
        timer::rearm(&mut self.timer, timers, self.tick_ms);
    }

    /// Skip straight to the hidden state (no loading screen on the page).
    pub fn finish(&mut self, timers: &mut dyn Timers) {
        timer::cancel(&mut self.timer, timers);
        self.progress = COMPLETE;
        self.phase = LoaderPhase::Hidden;
    }

    /// Timer expiry. `random` yields values in `[0, 1)`; anything else is
    /// treated as zero. Returns `None` for handles the loader does not own.
    pub fn tick(
        &mut self,
        handle: TimerHandle,
        timers: &mut dyn Timers,
        sink: &mut dyn PresentationSink,
        random: &mut dyn FnMut() -> f64,
    ) -> Option<LoaderEvent> {
        if !self.owns(handle) {
            return None;
        }
        self.timer = None;
        match self.phase {
            LoaderPhase::Loading => {
                let r = random();
                let r = if r.is_finite() { r.clamp(0.0, 1.0) } else { 0.0 };
                self.progress = (self.progress + r * self.max_increment).min(COMPLETE);
                sink.set_style(BAR_ID, "width", &format!("{}%", self.progress));
                if self.progress >= COMPLETE {
                    self.phase = LoaderPhase::Finishing;
                    self.timer = Some(timers.set_timeout(self.hide_delay_ms));
                } else {
                    self.timer = Some(timers.set_timeout(self.tick_ms));
                }
                Some(LoaderEvent::Progress(self.progress))
            }
            LoaderPhase::Finishing => {
                sink.set_flag(SCREEN_ID, "hidden", true);
                self.phase = LoaderPhase::Hidden;
                log::info!("loading screen hidden");
                Some(LoaderEvent::Hidden)
            }
            LoaderPhase::Idle | LoaderPhase::Hidden => None,
        }
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

    fn run(loader: &mut LoadingScreen, time: &mut VirtualTime, sink: &mut MemorySink, r: f64) -> Vec<(u64, LoaderEvent)> {
        let mut events = Vec::new();
        let mut random = || r;
        while let Some(h) = time.fire_next() {
            if let Some(e) = loader.tick(h, time, sink, &mut random) {
                events.push((time.now(), e));
            }
        }
        events
    }

    #[test]
    fn test_full_run_hides_once() {
        let mut time = VirtualTime::new();
        let mut sink = MemorySink::new();
        let mut loader = LoadingScreen::new(&LoaderConfig::default());
        loader.start(&mut time);
        loader.start(&mut time);
        assert_eq!(time.live_timers(), 1);

        // 0.5 * 15 = 7.5 per tick -> 14 ticks to reach 100.
        let events = run(&mut loader, &mut time, &mut sink, 0.5);
        assert_eq!(events.len(), 15);
        assert_eq!(events[13], (1400, LoaderEvent::Progress(100.0)));
        assert_eq!(events[14], (1900, LoaderEvent::Hidden));
        assert!(!loader.is_loading());
        assert_eq!(sink.style(BAR_ID, "width"), Some("100%"));
        assert!(sink.has_flag(SCREEN_ID, "hidden"));
        assert_eq!(time.live_timers(), 0);
    }

    #[test]
    fn test_bad_random_values_are_clamped() {
        let mut time = VirtualTime::new();
        let mut sink = MemorySink::new();
        let mut loader = LoadingScreen::new(&LoaderConfig::default());
        loader.start(&mut time);
        let h = time.fire_next().unwrap();
        loader.tick(h, &mut time, &mut sink, &mut || f64::NAN);
        assert_eq!(loader.progress(), 0.0);
        let h = time.fire_next().unwrap();
        loader.tick(h, &mut time, &mut sink, &mut || 40.0);
        assert_eq!(loader.progress(), 15.0);
    }
}
