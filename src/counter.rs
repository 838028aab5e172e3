//! Animated statistic counters.
//!
//! Each counter counts up from zero to its target once, the first time it
//! becomes visible.

use crate::config::CounterConfig;
use crate::sink::PresentationSink;
use crate::timer::{self, TimerHandle, Timers};

/// Flag set on a counter element once it has been animated.
pub const COUNTED_FLAG: &str = "counted";

/// Output of one animation frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CounterFrame {
    /// Intermediate value, floored.
    Value(String),
    /// Final frame showing the exact target.
    Done(String),
}

impl CounterFrame {
    pub fn text(&self) -> &str {
        match self {
            Self::Value(text) | Self::Done(text) => text,
        }
    }
}

/// Linear count-up from zero to `target`.
#[derive(Debug, Clone)]
pub struct CounterAnimation {
    target: f64,
    increment: f64,
    current: f64,
    done: bool,
}

impl CounterAnimation {
    pub fn new(target: f64, duration_ms: u32, frame_ms: u32) -> Self {
        let frames = f64::from(duration_ms) / f64::from(frame_ms.max(1));
        let increment = if frames >= 1.0 { target / frames } else { target };
        Self {
            target,
            increment,
            current: 0.0,
            done: false,
        }
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn step(&mut self) -> CounterFrame {
        if !self.done {
            self.current += self.increment;
            if self.current < self.target {
                return CounterFrame::Value(format!("{}", self.current.floor()));
            }
            self.done = true;
        }
        CounterFrame::Done(format!("{}", self.target))
    }
}

/// Parse a `data-count` attribute. Non-numeric or non-finite values disable the counter.
pub fn parse_target(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[derive(Debug)]
struct CounterEntry {
    id: String,
    target: f64,
    counted: bool,
    animation: Option<CounterAnimation>,
    timer: Option<TimerHandle>,
}

/// All counters on the page, each with its own frame timer while animating.
#[derive(Debug)]
pub struct Counters {
    entries: Vec<CounterEntry>,
    duration_ms: u32,
    frame_ms: u32,
}

impl Counters {
    pub fn new(config: &CounterConfig) -> Self {
        Self {
            entries: Vec::new(),
            duration_ms: config.duration_ms,
            frame_ms: config.frame_ms,
        }
    }

    pub fn register(&mut self, id: impl Into<String>, target: f64) {
        self.entries.push(CounterEntry {
            id: id.into(),
            target,
            counted: false,
            animation: None,
            timer: None,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_counted(&self, id: &str) -> bool {
        self.entries.iter().any(|e| e.id == id && e.counted)
    }

    pub fn is_animating(&self, id: &str) -> bool {
        self.entries.iter().any(|e| e.id == id && e.animation.is_some())
    }

    pub fn owns(&self, handle: TimerHandle) -> bool {
        self.entries.iter().any(|e| e.timer == Some(handle))
    }

    /// Visibility signal for one counter. Starts its animation the first time
    /// only; returns whether an animation started.
    pub fn on_visible(
        &mut self,
        id: &str,
        timers: &mut dyn Timers,
        sink: &mut dyn PresentationSink,
    ) -> bool {
        let (duration_ms, frame_ms) = (self.duration_ms, self.frame_ms);
        let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) else {
            return false;
        };
        if entry.counted {
            return false;
        }
        entry.counted = true;
        sink.set_flag(&entry.id, COUNTED_FLAG, true);
        entry.animation = Some(CounterAnimation::new(entry.target, duration_ms, frame_ms));
        Self::frame(entry, frame_ms, timers, sink);
        true
    }

    pub fn tick(
        &mut self,
        handle: TimerHandle,
        timers: &mut dyn Timers,
        sink: &mut dyn PresentationSink,
    ) -> bool {
        let frame_ms = self.frame_ms;
        let Some(entry) = self.entries.iter_mut().find(|e| e.timer == Some(handle)) else {
            return false;
        };
        entry.timer = None;
        Self::frame(entry, frame_ms, timers, sink);
        true
    }

    fn frame(
        entry: &mut CounterEntry,
        frame_ms: u32,
        timers: &mut dyn Timers,
        sink: &mut dyn PresentationSink,
    ) {
        let Some(animation) = entry.animation.as_mut() else {
            return;
        };
        let frame = animation.step();
        sink.set_text(&entry.id, frame.text());
        match frame {
            CounterFrame::Value(_) => {
                timer::rearm(&mut entry.timer, timers, frame_ms);
            }
            CounterFrame::Done(_) => {
                entry.animation = None;
                timer::cancel(&mut entry.timer, timers);
            }
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

    #[test]
    fn test_animation_floors_then_lands_on_target() {
        let mut anim = CounterAnimation::new(10.0, 40, 10);
        assert_eq!(anim.step(), CounterFrame::Value("2".to_string()));
        assert_eq!(anim.step(), CounterFrame::Value("5".to_string()));
        assert_eq!(anim.step(), CounterFrame::Value("7".to_string()));
        assert_eq!(anim.step(), CounterFrame::Done("10".to_string()));
        assert!(anim.is_done());
        assert_eq!(anim.step(), CounterFrame::Done("10".to_string()));
    }

    #[test]
    fn test_fractional_target_shown_exactly() {
        let mut anim = CounterAnimation::new(99.5, 16, 16);
        assert_eq!(anim.step(), CounterFrame::Done("99.5".to_string()));
    }

    #[test]
    fn test_zero_target_finishes_immediately() {
        let mut anim = CounterAnimation::new(0.0, 2000, 16);
        assert_eq!(anim.step(), CounterFrame::Done("0".to_string()));
    }

    #[test]
    fn test_parse_target() {
        assert_eq!(parse_target(" 500 "), Some(500.0));
        assert_eq!(parse_target("98.5"), Some(98.5));
        assert_eq!(parse_target("lots"), None);
        assert_eq!(parse_target("inf"), None);
    }
}
