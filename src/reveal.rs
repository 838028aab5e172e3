//! Staggered reveal choreography.
//!
//! A choreography is an ordered list of `(delay, effect)` steps. All
//! choreographies share one [`RevealScheduler`], which keeps a single timer
//! armed for the earliest outstanding step instead of a pyramid of nested
//! timeouts.

use crate::sink::PresentationSink;
use crate::timer::{self, TimerHandle, Timers};

/// Class added to every element revealed on first intersection.
pub const REVEALED_FLAG: &str = "aos-animate";

const FADE_IN_UP: &str = "fadeInUp 1s ease forwards";
const SLIDE_IN_RIGHT: &str = "slideInRight 1s ease forwards";
const GROW_BAR: &str = "growBar 1s ease-in-out forwards";
const PROGRESS_RING: &str = "progressAnimation 2s ease-in-out forwards";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevealEffect {
    Style { property: String, value: String },
    Flag { flag: String, on: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealStep {
    pub delay_ms: u32,
    pub target: String,
    pub effect: RevealEffect,
}

impl RevealStep {
    pub fn style(delay_ms: u32, target: impl Into<String>, property: &str, value: &str) -> Self {
        Self {
            delay_ms,
            target: target.into(),
            effect: RevealEffect::Style {
                property: property.to_string(),
                value: value.to_string(),
            },
        }
    }

    pub fn flag(delay_ms: u32, target: impl Into<String>, flag: &str, on: bool) -> Self {
        Self {
            delay_ms,
            target: target.into(),
            effect: RevealEffect::Flag {
                flag: flag.to_string(),
                on,
            },
        }
    }

    fn apply(&self, sink: &mut dyn PresentationSink) {
        match &self.effect {
            RevealEffect::Style { property, value } => sink.set_style(&self.target, property, value),
            RevealEffect::Flag { flag, on } => sink.set_flag(&self.target, flag, *on),
        }
    }
}

/// Identifier of the `index`-th `part` inside `parent`, e.g. `feature-card-0-item-2`.
pub fn child_id(parent: &str, part: &str, index: usize) -> String {
    format!("{parent}-{part}-{index}")
}

/// Hero block entrance after the loading screen hides.
pub fn hero_sequence() -> Vec<RevealStep> {
    vec![
        RevealStep::style(0, "hero-title", "animation", FADE_IN_UP),
        RevealStep::style(200, "hero-description", "animation", FADE_IN_UP),
        RevealStep::style(400, "hero-buttons", "animation", FADE_IN_UP),
        RevealStep::style(600, "hero-stats", "animation", FADE_IN_UP),
        RevealStep::style(800, "dashboard-preview", "animation", SLIDE_IN_RIGHT),
    ]
}

/// Generic element entering the viewport.
pub fn element_reveal(id: &str) -> Vec<RevealStep> {
    vec![RevealStep::flag(0, id, REVEALED_FLAG, true)]
}

/// Feature card: icon spin, then list items sliding in one by one.
pub fn feature_card(card: &str, list_items: usize) -> Vec<RevealStep> {
    let icon = format!("{card}-icon");
    let mut steps = element_reveal(card);
    steps.push(RevealStep::style(200, icon.as_str(), "transform", "rotateY(360deg) scale(1.1)"));
    steps.push(RevealStep::style(800, icon, "transform", "rotateY(0deg) scale(1)"));
    for i in 0..list_items {
        let delay = stagger(300, 100, i);
        let item = child_id(card, "item", i);
        steps.push(RevealStep::style(delay, item.as_str(), "opacity", "1"));
        steps.push(RevealStep::style(delay, item, "transform", "translateX(0)"));
    }
    steps
}

/// Dashboard card: chart bars grow in sequence, progress ring follows.
pub fn dashboard_card(card: &str, bars: usize, has_ring: bool) -> Vec<RevealStep> {
    let mut steps = element_reveal(card);
    for i in 0..bars {
        steps.push(RevealStep::style(
            stagger(0, 200, i),
            child_id(card, "bar", i),
            "animation",
            GROW_BAR,
        ));
    }
    if has_ring {
        steps.push(RevealStep::style(500, format!("{card}-ring"), "animation", PROGRESS_RING));
    }
    steps
}

fn stagger(base: u32, step: u32, index: usize) -> u32 {
    let index = u32::try_from(index).unwrap_or(u32::MAX);
    base.saturating_add(step.saturating_mul(index))
}

#[derive(Debug)]
struct Scheduled {
    due_ms: f64,
    seq: u64,
    step: RevealStep,
}

/// Runs reveal steps in due order with a single live timer.
#[derive(Debug, Default)]
pub struct RevealScheduler {
    queue: Vec<Scheduled>,
    seq: u64,
    timer: Option<TimerHandle>,
}

impl RevealScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Steps still waiting to run.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn owns(&self, handle: TimerHandle) -> bool {
        self.timer == Some(handle)
    }

    /// Queue a choreography relative to now. Zero-delay steps run immediately.
    pub fn schedule(
        &mut self,
        steps: Vec<RevealStep>,
        timers: &mut dyn Timers,
        sink: &mut dyn PresentationSink,
    ) {
        let now = timers.now_ms();
        for step in steps {
            if step.delay_ms == 0 {
                step.apply(sink);
                continue;
            }
            self.seq += 1;
            self.queue.push(Scheduled {
                due_ms: now + f64::from(step.delay_ms),
                seq: self.seq,
                step,
            });
        }
        self.queue
            .sort_by(|a, b| a.due_ms.total_cmp(&b.due_ms).then(a.seq.cmp(&b.seq)));
        self.rearm(timers);
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
        self.timer = None;
        let now = timers.now_ms();
        let due = self.queue.iter().take_while(|s| s.due_ms <= now).count();
        for scheduled in self.queue.drain(..due) {
            scheduled.step.apply(sink);
        }
        self.rearm(timers);
        true
    }

    /// Drop every outstanding step.
    pub fn cancel(&mut self, timers: &mut dyn Timers) {
        timer::cancel(&mut self.timer, timers);
        self.queue.clear();
    }

    fn rearm(&mut self, timers: &mut dyn Timers) {
        match self.queue.first() {
            Some(next) => {
                let delay = timer::delay_until(next.due_ms, timers.now_ms());
                timer::rearm(&mut self.timer, timers, delay);
            }
            None => timer::cancel(&mut self.timer, timers),
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
    fn test_feature_card_timeline() {
        let steps = feature_card("feature-card-0", 2);
        let delays: Vec<(u32, &str)> = steps.iter().map(|s| (s.delay_ms, s.target.as_str())).collect();
        assert_eq!(
            delays,
            vec![
                (0, "feature-card-0"),
                (200, "feature-card-0-icon"),
                (800, "feature-card-0-icon"),
                (300, "feature-card-0-item-0"),
                (300, "feature-card-0-item-0"),
                (400, "feature-card-0-item-1"),
                (400, "feature-card-0-item-1"),
            ]
        );
    }

    #[test]
    fn test_dashboard_card_timeline() {
        let steps = dashboard_card("dashboard-card-1", 3, true);
        let delays: Vec<u32> = steps.iter().map(|s| s.delay_ms).collect();
        assert_eq!(delays, vec![0, 0, 200, 400, 500]);
        assert_eq!(steps.last().unwrap().target, "dashboard-card-1-ring");
    }

    #[test]
    fn test_stagger_saturates() {
        assert_eq!(stagger(300, 100, 2), 500);
        assert_eq!(stagger(300, u32::MAX, 2), u32::MAX);
    }
}
