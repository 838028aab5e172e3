//! Scroll position tracking: active navigation section and scroll progress.
//!
//! The tracker maps a raw vertical offset to the section currently in view
//! and mirrors that choice onto the navigation entries through a
//! [`PresentationSink`]. Samples are rate limited; only the latest sample of
//! each window is applied.

use serde::{Deserialize, Serialize};

use crate::config::ScrollConfig;
use crate::ratelimit::RateLimiter;
use crate::sink::PresentationSink;
use crate::timer::{TimerHandle, Timers};

/// Default distance below the top edge at which a section counts as "in view".
pub const LOOKAHEAD_PX: f64 = 100.0;

/// A vertically bounded page region tracked for navigation highlighting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    /// Distance from the document top in pixels
    pub top: f64,
    /// Vertical extent in pixels
    pub height: f64,
}

impl Section {
    pub fn new(id: impl Into<String>, top: f64, height: f64) -> Self {
        Self {
            id: id.into(),
            top,
            height,
        }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Half-open membership test: `[top, top + height)`.
    pub fn contains(&self, y: f64) -> bool {
        y >= self.top && y < self.bottom()
    }
}

/// One raw scroll measurement.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScrollSample {
    pub offset: f64,
    pub viewport_height: f64,
    pub document_height: f64,
}

impl ScrollSample {
    pub fn new(offset: f64, viewport_height: f64, document_height: f64) -> Self {
        Self {
            offset,
            viewport_height,
            document_height,
        }
    }
}

/// Derived scroll state, updated once per applied sample.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScrollState {
    pub offset: f64,
    pub viewport_height: f64,
    /// Fraction of the scrollable height already scrolled, in `[0, 1]`.
    pub progress: f64,
    pub active: Option<String>,
}

/// Scroll progress as a fraction of the scrollable height.
///
/// Short pages (document no taller than the viewport) and non-finite inputs
/// yield 0; the result is always finite and within `[0, 1]`.
pub fn progress(offset: f64, document_height: f64, viewport_height: f64) -> f64 {
    let scrollable = document_height - viewport_height;
    if !offset.is_finite() || !scrollable.is_finite() || scrollable <= 0.0 {
        return 0.0;
    }
    (offset / scrollable).clamp(0.0, 1.0)
}

/// First section whose interval contains `y`.
pub fn section_at(sections: &[Section], y: f64) -> Option<&Section> {
    sections.iter().find(|section| section.contains(y))
}

/// Active-section tracker for the navigation bar.
#[derive(Debug)]
pub struct ScrollTracker {
    lookahead: f64,
    sections: Vec<Section>,
    limiter: RateLimiter<ScrollSample>,
    state: ScrollState,
}

impl ScrollTracker {
    pub fn new(config: &ScrollConfig) -> Self {
        Self {
            lookahead: config.lookahead_px,
            sections: Vec::new(),
            limiter: RateLimiter::new(config.policy, config.nav_throttle_ms),
            state: ScrollState::default(),
        }
    }

    pub fn with_sections(mut self, sections: Vec<Section>) -> Self {
        self.sections = sections;
        self
    }

    /// Replace the section layout (initial load and window resize).
    ///
    /// The active section is kept even if it no longer exists; the next
    /// applied sample corrects it.
    pub fn set_sections(&mut self, sections: Vec<Section>) {
        log::debug!("tracking {} sections", sections.len());
        self.sections = sections;
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn state(&self) -> &ScrollState {
        &self.state
    }

    pub fn active(&self) -> Option<&str> {
        self.state.active.as_deref()
    }

    pub fn owns(&self, handle: TimerHandle) -> bool {
        self.limiter.owns(handle)
    }

    /// Feed a raw scroll sample. With a leading-edge policy the sample may be
    /// applied immediately; otherwise it waits for the rate limit window.
    pub fn on_scroll(
        &mut self,
        sample: ScrollSample,
        timers: &mut dyn Timers,
        sink: &mut dyn PresentationSink,
    ) {
        if let Some(sample) = self.limiter.call(sample, timers) {
            self.apply(sample, sink);
        }
    }

    /// Timer expiry. Returns `false` for handles the tracker does not own.
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

    /// Apply a sample synchronously. Returns `true` when the active section changed.
    ///
    /// Offsets that fall outside every section leave the active section as is.
    pub fn apply(&mut self, sample: ScrollSample, sink: &mut dyn PresentationSink) -> bool {
        self.state.offset = sample.offset;
        self.state.viewport_height = sample.viewport_height;
        self.state.progress = progress(
            sample.offset,
            sample.document_height,
            sample.viewport_height,
        );

        let target_y = sample.offset + self.lookahead;
        let Some(section) = section_at(&self.sections, target_y) else {
            return false;
        };
        if self.state.active.as_deref() == Some(section.id.as_str()) {
            return false;
        }
        let id = section.id.clone();
        self.activate(id, sink);
        true
    }

    /// Highlight a known section directly, as on a navigation click.
    pub fn select(&mut self, id: &str, sink: &mut dyn PresentationSink) -> bool {
        if !self.sections.iter().any(|s| s.id == id) {
            log::debug!("ignoring selection of unknown section {id}");
            return false;
        }
        if self.active() != Some(id) {
            self.activate(id.to_string(), sink);
        }
        true
    }

    /// Drop any pending sample.
    pub fn cancel(&mut self, timers: &mut dyn Timers) {
        self.limiter.cancel(timers);
    }

    fn activate(&mut self, id: String, sink: &mut dyn PresentationSink) {
        for section in self.sections.iter().filter(|s| s.id != id) {
            sink.clear(&section.id);
        }
        sink.highlight(&id);
        log::trace!("active section -> {id}");
        self.state.active = Some(id);
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

    fn layout() -> Vec<Section> {
        vec![
            Section::new("home", 0.0, 800.0),
            Section::new("features", 800.0, 600.0),
            Section::new("tools", 1400.0, 1000.0),
        ]
    }

    #[test]
    fn test_section_contains_is_half_open() {
        let section = Section::new("a", 100.0, 50.0);
        assert!(section.contains(100.0));
        assert!(section.contains(149.9));
        assert!(!section.contains(150.0));
        assert!(!section.contains(99.9));
    }

    #[test]
    fn test_apply_uses_lookahead() {
        let mut tracker = ScrollTracker::new(&ScrollConfig::default()).with_sections(layout());
        let mut sink = MemorySink::new();

        // 700 + 100 lands exactly on the start of "features".
        assert!(tracker.apply(ScrollSample::new(700.0, 600.0, 2400.0), &mut sink));
        assert_eq!(tracker.active(), Some("features"));
        assert_eq!(sink.highlighted(), vec!["features"]);
    }

    #[test]
    fn test_same_section_emits_nothing() {
        let mut tracker = ScrollTracker::new(&ScrollConfig::default()).with_sections(layout());
        let mut sink = MemorySink::new();
        tracker.apply(ScrollSample::new(0.0, 600.0, 2400.0), &mut sink);
        sink.take_commands();

        assert!(!tracker.apply(ScrollSample::new(200.0, 600.0, 2400.0), &mut sink));
        assert!(sink.commands().is_empty());
    }

    #[test]
    fn test_select_unknown_section_is_ignored() {
        let mut tracker = ScrollTracker::new(&ScrollConfig::default()).with_sections(layout());
        let mut sink = MemorySink::new();
        assert!(!tracker.select("pricing", &mut sink));
        assert!(tracker.select("tools", &mut sink));
        assert_eq!(tracker.active(), Some("tools"));
        assert_eq!(sink.highlighted(), vec!["tools"]);
    }

    #[test]
    fn test_progress_guards_short_pages() {
        assert_eq!(progress(0.0, 0.0, 0.0), 0.0);
        assert_eq!(progress(50.0, 600.0, 600.0), 0.0);
        assert_eq!(progress(50.0, 500.0, 600.0), 0.0);
        assert_eq!(progress(f64::NAN, 1000.0, 600.0), 0.0);
        assert_eq!(progress(200.0, 1000.0, 600.0), 0.5);
        assert_eq!(progress(900.0, 1000.0, 600.0), 1.0);
    }
}
