//! Scroll-driven decorative effects: parallax, navbar state and the progress
//! indicator.

use crate::config::ScrollConfig;
use crate::ratelimit::RateLimiter;
use crate::scroll::{progress, ScrollSample};
use crate::sink::PresentationSink;
use crate::timer::{TimerHandle, Timers};

pub const NAVBAR_ID: &str = "navbar";
pub const HERO_ID: &str = "hero-content";
pub const PROGRESS_ID: &str = "scroll-progress";
pub const PROGRESS_VAR: &str = "--scroll-progress";

/// Hero content moves at half the scroll speed, upwards.
const HERO_RATE: f64 = -0.5;
const SHAPE_BASE_SPEED: f64 = 0.1;
const SHAPE_SPEED_STEP: f64 = 0.05;
const SHAPE_SPIN: f64 = 0.05;

/// Transform of one floating decorative shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeTransform {
    pub translate_y: f64,
    pub rotate_deg: f64,
}

impl ShapeTransform {
    pub fn to_css(self) -> String {
        format!(
            "translateY({}px) rotateZ({}deg)",
            self.translate_y, self.rotate_deg
        )
    }
}

/// All parallax offsets for one scroll position.
#[derive(Debug, Clone, PartialEq)]
pub struct ParallaxFrame {
    pub shapes: Vec<ShapeTransform>,
    /// `None` once the hero has scrolled out of view; the hero keeps its last transform.
    pub hero_translate_y: Option<f64>,
}

/// Compute parallax offsets for `shape_count` shapes at `offset`.
pub fn parallax(offset: f64, viewport_height: f64, shape_count: usize) -> ParallaxFrame {
    let offset = if offset.is_finite() { offset } else { 0.0 };
    let mut speed = SHAPE_BASE_SPEED;
    let mut shapes = Vec::with_capacity(shape_count);
    for _ in 0..shape_count {
        shapes.push(ShapeTransform {
            // `0.0 - x` rather than `-x` so the top of the page renders "0px", not "-0px".
            translate_y: 0.0 - offset * speed,
            rotate_deg: offset * SHAPE_SPIN,
        });
        speed += SHAPE_SPEED_STEP;
    }
    let hero_translate_y = (offset < viewport_height).then(|| 0.0 + offset * HERO_RATE);
    ParallaxFrame {
        shapes,
        hero_translate_y,
    }
}

pub fn navbar_scrolled(offset: f64, threshold: f64) -> bool {
    offset > threshold
}

/// Frame-rate limited driver for parallax and the progress indicator.
///
/// The navbar flag is not rate limited; it only emits on change.
#[derive(Debug)]
pub struct ScrollEffects {
    shape_ids: Vec<String>,
    navbar_threshold: f64,
    scrolled: bool,
    limiter: RateLimiter<ScrollSample>,
}

impl ScrollEffects {
    pub fn new(shape_ids: Vec<String>, config: &ScrollConfig) -> Self {
        Self {
            shape_ids,
            navbar_threshold: config.navbar_threshold_px,
            scrolled: false,
            limiter: RateLimiter::new(config.policy, config.effects_throttle_ms),
        }
    }

    pub fn is_scrolled(&self) -> bool {
        self.scrolled
    }

    pub fn owns(&self, handle: TimerHandle) -> bool {
        self.limiter.owns(handle)
    }

    pub fn on_scroll(
        &mut self,
        sample: ScrollSample,
        timers: &mut dyn Timers,
        sink: &mut dyn PresentationSink,
    ) {
        let scrolled = navbar_scrolled(sample.offset, self.navbar_threshold);
        if scrolled != self.scrolled {
            self.scrolled = scrolled;
            sink.set_flag(NAVBAR_ID, "scrolled", scrolled);
        }
        if let Some(sample) = self.limiter.call(sample, timers) {
            self.apply(sample, sink);
        }
    }

    pub fn tick(
        &mut self,
        handle: TimerHandle,
        timers: &mut dyn Timers,
        sink: &mut dyn PresentationSink,
    ) -> bool {
        if !self.owns(handle) {
            return false;
        }
        if let Some(sample) = self.limiter.fire(handle, timers.now_ms()) {
            self.apply(sample, sink);
        }
        true
    }

    pub fn apply(&self, sample: ScrollSample, sink: &mut dyn PresentationSink) {
        let frame = parallax(sample.offset, sample.viewport_height, self.shape_ids.len());
        for (id, shape) in self.shape_ids.iter().zip(frame.shapes) {
            sink.set_style(id, "transform", &shape.to_css());
        }
        if let Some(y) = frame.hero_translate_y {
            sink.set_style(HERO_ID, "transform", &format!("translateY({y}px)"));
        }
        let percent = progress(
            sample.offset,
            sample.document_height,
            sample.viewport_height,
        ) * 100.0;
        sink.set_style(PROGRESS_ID, PROGRESS_VAR, &format!("{percent}%"));
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

    #[test]
    fn test_parallax_speeds_increase_per_shape() {
        let frame = parallax(100.0, 800.0, 3);
        let ys: Vec<f64> = frame.shapes.iter().map(|s| s.translate_y).collect();
        assert!((ys[0] + 10.0).abs() < 1e-9);
        assert!((ys[1] + 15.0).abs() < 1e-9);
        assert!((ys[2] + 20.0).abs() < 1e-9);
        assert!(frame.shapes.iter().all(|s| (s.rotate_deg - 5.0).abs() < 1e-9));
        assert_eq!(frame.hero_translate_y, Some(-50.0));
    }

    #[test]
    fn test_hero_untouched_past_viewport() {
        let frame = parallax(900.0, 800.0, 0);
        assert!(frame.shapes.is_empty());
        assert_eq!(frame.hero_translate_y, None);
    }

    #[test]
    fn test_top_of_page_has_no_negative_zero() {
        let frame = parallax(0.0, 800.0, 1);
        assert_eq!(frame.shapes[0].to_css(), "translateY(0px) rotateZ(0deg)");
    }

    #[test]
    fn test_navbar_flag_only_on_change() {
        let mut time = VirtualTime::new();
        let mut sink = MemorySink::new();
        let mut effects = ScrollEffects::new(vec![], &ScrollConfig::default());

        effects.on_scroll(ScrollSample::new(50.0, 800.0, 3000.0), &mut time, &mut sink);
        assert!(!sink.has_flag(NAVBAR_ID, "scrolled"));
        effects.on_scroll(ScrollSample::new(150.0, 800.0, 3000.0), &mut time, &mut sink);
        effects.on_scroll(ScrollSample::new(250.0, 800.0, 3000.0), &mut time, &mut sink);
        assert!(sink.has_flag(NAVBAR_ID, "scrolled"));
        let flags = sink
            .commands()
            .iter()
            .filter(|c| matches!(c, crate::sink::Command::Flag { .. }))
            .count();
        assert_eq!(flags, 1);
    }

    #[test]
    fn test_effects_applied_at_window_end() {
        let mut time = VirtualTime::new();
        let mut sink = MemorySink::new();
        let mut effects = ScrollEffects::new(vec!["shape-0".to_string()], &ScrollConfig::default());

        effects.on_scroll(ScrollSample::new(100.0, 800.0, 1800.0), &mut time, &mut sink);
        effects.on_scroll(ScrollSample::new(500.0, 800.0, 1800.0), &mut time, &mut sink);
        assert_eq!(sink.style(PROGRESS_ID, PROGRESS_VAR), None);

        time.run_for(16, |t, h| {
            effects.tick(h, t, &mut sink);
        });
        assert_eq!(sink.style(PROGRESS_ID, PROGRESS_VAR), Some("50%"));
        assert_eq!(sink.style("shape-0", "transform"), Some("translateY(-50px) rotateZ(25deg)"));
        assert_eq!(sink.style(HERO_ID, "transform"), Some("translateY(-250px)"));
    }
}
