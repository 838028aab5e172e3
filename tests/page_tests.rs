//! Whole-page timeline tests
//!
//! Drives the loader, reveal scheduler, counters, contact form and toast
//! notifications from one virtual clock, routing every fired timer the same
//! way the browser adapter does.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

use pagefx::config::{CounterConfig, FormConfig, LoaderConfig, NotificationConfig};
use pagefx::counter::{Counters, COUNTED_FLAG};
use pagefx::form::{
    ContactForm, FormData, SimulatedSubmission, SubmissionTarget, SubmitOutcome, SUBMIT_ID,
};
use pagefx::loader::{LoaderEvent, LoaderPhase, LoadingScreen, BAR_ID, SCREEN_ID};
use pagefx::notify::{NotificationCenter, NotificationEvent, NotificationKind};
use pagefx::reveal::{dashboard_card, feature_card, hero_sequence, RevealScheduler};
use pagefx::sink::Command;
use pagefx::{MemorySink, PagefxError, Policy, SiteConfig, TimerHandle, VirtualTime};

// ============================================================================
// Harness
// ============================================================================

/// Page components sharing one sink, dispatched like the browser adapter.
struct Page {
    sink: MemorySink,
    loader: LoadingScreen,
    reveal: RevealScheduler,
    counters: Counters,
    form: ContactForm,
    submission: SimulatedSubmission,
    notifications: NotificationCenter,
    /// `(time, event)` for loader and toast milestones.
    events: Vec<(u64, String)>,
}

impl Page {
    fn new() -> Self {
        let config = SiteConfig::default();
        Self {
            sink: MemorySink::new(),
            loader: LoadingScreen::new(&config.loader),
            reveal: RevealScheduler::new(),
            counters: Counters::new(&config.counter),
            form: ContactForm::new(&config.form),
            submission: SimulatedSubmission::new(&config.form),
            notifications: NotificationCenter::new(&config.notification),
            events: Vec::new(),
        }
    }

    fn advance(&mut self, time: &mut VirtualTime, ms: u64) {
        time.run_for(ms, |t, h| self.dispatch(t, h));
    }

    fn dispatch(&mut self, t: &mut VirtualTime, h: TimerHandle) {
        if self.reveal.tick(h, t, &mut self.sink) || self.counters.tick(h, t, &mut self.sink) {
            return;
        }
        if self.loader.owns(h) {
            // Maximum step every tick: 15% per 100 ms.
            let event = self.loader.tick(h, t, &mut self.sink, &mut || 1.0);
            if event == Some(LoaderEvent::Hidden) {
                self.events.push((t.now(), "loader hidden".to_string()));
                self.reveal.schedule(hero_sequence(), t, &mut self.sink);
            }
            return;
        }
        if self.form.owns(h) {
            let (message, kind) = match self.form.tick(h, &mut self.submission, &mut self.sink) {
                Some(SubmitOutcome::Sent) => {
                    (self.form.success_message().to_string(), NotificationKind::Success)
                }
                Some(SubmitOutcome::Failed(reason)) => (reason, NotificationKind::Error),
                None => return,
            };
            self.notifications.show(message, kind, t, &mut self.sink);
            return;
        }
        if let Some(event) = self.notifications.tick(h, t, &mut self.sink) {
            self.events.push((t.now(), format!("{event:?}")));
        }
    }
}

fn animation(sink: &MemorySink, id: &str) -> Option<String> {
    sink.style(id, "animation").map(str::to_string)
}

// ============================================================================
// Loader and hero entrance
// ============================================================================

#[test]
fn test_loader_fills_then_hides_then_hero_enters() {
    let mut time = VirtualTime::new();
    let mut page = Page::new();
    page.loader.start(&mut time);

    page.advance(&mut time, 600);
    assert_eq!(page.loader.progress(), 90.0);
    assert_eq!(page.sink.style(BAR_ID, "width"), Some("90%"));

    page.advance(&mut time, 100);
    assert_eq!(page.loader.phase(), LoaderPhase::Finishing);
    assert_eq!(page.sink.style(BAR_ID, "width"), Some("100%"));
    assert!(!page.sink.has_flag(SCREEN_ID, "hidden"));

    // Hide delay: 500 ms after the bar fills.
    page.advance(&mut time, 499);
    assert!(page.loader.is_loading());
    assert_eq!(animation(&page.sink, "hero-title"), None);

    page.advance(&mut time, 1);
    assert!(page.sink.has_flag(SCREEN_ID, "hidden"));
    assert!(!page.loader.is_loading());
    assert_eq!(page.events, vec![(1200, "loader hidden".to_string())]);
    assert!(animation(&page.sink, "hero-title").is_some());
    assert_eq!(animation(&page.sink, "hero-description"), None);

    page.advance(&mut time, 200);
    assert!(animation(&page.sink, "hero-description").is_some());
    assert_eq!(animation(&page.sink, "dashboard-preview"), None);

    page.advance(&mut time, 600);
    assert!(animation(&page.sink, "hero-stats").is_some());
    assert_eq!(
        animation(&page.sink, "dashboard-preview").as_deref(),
        Some("slideInRight 1s ease forwards")
    );
    assert_eq!(time.live_timers(), 0);
}

#[test]
fn test_loader_keeps_single_timer() {
    let mut time = VirtualTime::new();
    let mut sink = MemorySink::new();
    let mut loader = LoadingScreen::new(&LoaderConfig::default());
    loader.start(&mut time);
    loader.start(&mut time);
    assert_eq!(time.live_timers(), 1);

    time.run_for(10_000, |t, h| {
        loader.tick(h, t, &mut sink, &mut || 0.5);
        assert!(t.live_timers() <= 1);
    });
    assert_eq!(loader.phase(), LoaderPhase::Hidden);
    assert_eq!(loader.progress(), 100.0);
}

#[test]
fn test_loader_finish_skips_screen() {
    let mut time = VirtualTime::new();
    let mut loader = LoadingScreen::new(&LoaderConfig::default());
    loader.start(&mut time);
    loader.finish(&mut time);

    assert!(!loader.is_loading());
    assert_eq!(time.live_timers(), 0);
}

// ============================================================================
// Reveal choreography
// ============================================================================

fn style_targets(sink: &MemorySink) -> Vec<(String, String)> {
    sink.commands()
        .iter()
        .filter_map(|c| match c {
            Command::Style { id, property, .. } => Some((id.clone(), property.clone())),
            _ => None,
        })
        .collect()
}

#[test]
fn test_overlapping_choreographies_interleave_by_due_time() {
    let mut time = VirtualTime::new();
    let mut sink = MemorySink::new();
    let mut reveal = RevealScheduler::new();

    reveal.schedule(feature_card("card", 2), &mut time, &mut sink);
    assert!(sink.has_flag("card", "aos-animate"));
    assert_eq!(time.live_timers(), 1);

    time.run_for(250, |t, h| {
        reveal.tick(h, t, &mut sink);
    });
    reveal.schedule(dashboard_card("dash", 2, true), &mut time, &mut sink);
    assert!(sink.has_flag("dash", "aos-animate"));

    time.run_for(1000, |t, h| {
        assert!(reveal.tick(h, t, &mut sink));
        assert!(t.live_timers() <= 1);
    });

    let pair = |id: &str, property: &str| (id.to_string(), property.to_string());
    assert_eq!(
        style_targets(&sink),
        vec![
            pair("card-icon", "transform"),      // 200
            pair("dash-bar-0", "animation"),     // 250, zero delay
            pair("card-item-0", "opacity"),      // 300
            pair("card-item-0", "transform"),    // 300
            pair("card-item-1", "opacity"),      // 400
            pair("card-item-1", "transform"),    // 400
            pair("dash-bar-1", "animation"),     // 450
            pair("dash-ring", "animation"),      // 750
            pair("card-icon", "transform"),      // 800
        ]
    );
    assert_eq!(reveal.pending(), 0);
    assert_eq!(time.live_timers(), 0);
}

#[test]
fn test_cancel_drops_outstanding_steps() {
    let mut time = VirtualTime::new();
    let mut sink = MemorySink::new();
    let mut reveal = RevealScheduler::new();
    reveal.schedule(hero_sequence(), &mut time, &mut sink);
    assert_eq!(reveal.pending(), 4);

    reveal.cancel(&mut time);
    assert_eq!(reveal.pending(), 0);
    assert_eq!(time.live_timers(), 0);
}

// ============================================================================
// Counters
// ============================================================================

#[test]
fn test_counter_counts_once_and_lands_on_target() {
    let mut time = VirtualTime::new();
    let mut page = Page::new();
    page.counters.register("users", 2500.0);
    page.counters.register("uptime", 99.9);

    assert!(page.counters.on_visible("users", &mut time, &mut page.sink));
    assert!(page.counters.on_visible("uptime", &mut time, &mut page.sink));
    assert!(page.sink.has_flag("users", COUNTED_FLAG));
    assert_eq!(page.sink.text("users"), Some("20"));

    page.advance(&mut time, 1000);
    let midway: f64 = page.sink.text("users").unwrap().parse().unwrap();
    assert!(midway > 0.0 && midway < 2500.0);
    assert_eq!(midway.fract(), 0.0);

    page.advance(&mut time, 2000);
    assert_eq!(page.sink.text("users"), Some("2500"));
    assert_eq!(page.sink.text("uptime"), Some("99.9"));
    assert!(!page.counters.is_animating("users"));
    assert_eq!(time.live_timers(), 0);

    // Scrolling back into view does not restart.
    assert!(!page.counters.on_visible("users", &mut time, &mut page.sink));
    assert!(!page.counters.on_visible("unknown", &mut time, &mut page.sink));
    assert_eq!(time.live_timers(), 0);
}

#[test]
fn test_counter_intermediate_values_are_whole_numbers() {
    let mut time = VirtualTime::new();
    let mut sink = MemorySink::new();
    let mut counters = Counters::new(&CounterConfig {
        duration_ms: 100,
        frame_ms: 16,
    });
    counters.register("projects", 7.5);
    counters.on_visible("projects", &mut time, &mut sink);
    time.run_for(1000, |t, h| {
        counters.tick(h, t, &mut sink);
    });

    let texts: Vec<&str> = sink
        .commands()
        .iter()
        .filter_map(|c| match c {
            Command::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
        .collect();
    let (last, rest) = texts.split_last().unwrap();
    assert_eq!(*last, "7.5");
    assert!(rest.iter().all(|t| !t.contains('.')));
}

// ============================================================================
// Contact form and notifications
// ============================================================================

fn message() -> FormData {
    FormData::new()
        .with("name", "Ada")
        .with("email", "ada@example.com")
        .with("message", "Hello")
}

#[test]
fn test_submit_success_flow() {
    let mut time = VirtualTime::new();
    let mut page = Page::new();
    page.form.add_group("form-group-0", "Ada", &mut page.sink);
    assert!(page.sink.has_flag("form-group-0", "filled"));

    assert!(page.form.submit(
        message(),
        "Send Message",
        &page.submission,
        &mut time,
        &mut page.sink
    ));
    assert!(page.sink.has_flag(SUBMIT_ID, "disabled"));
    assert_eq!(page.sink.text(SUBMIT_ID), Some("Sending..."));

    // A second click while sending is ignored.
    assert!(!page.form.submit(
        message(),
        "Sending...",
        &page.submission,
        &mut time,
        &mut page.sink
    ));

    page.advance(&mut time, 2000);
    assert_eq!(page.submission.delivered().len(), 1);
    assert!(page.submission.delivered()[0].contains("ada@example.com"));
    assert!(!page.form.is_sending());
    assert!(!page.sink.has_flag(SUBMIT_ID, "disabled"));
    assert_eq!(page.sink.text(SUBMIT_ID), Some("Send Message"));
    assert!(!page.sink.has_flag("form-group-0", "filled"));

    page.advance(&mut time, 6000);
    let id = "notification-1".to_string();
    assert_eq!(
        page.events,
        vec![
            (2100, format!("{:?}", NotificationEvent::Shown(id.clone()))),
            (7100, format!("{:?}", NotificationEvent::Dismissed(id.clone()))),
            (7400, format!("{:?}", NotificationEvent::Removed(id))),
        ]
    );
    assert_eq!(page.notifications.active(), 0);
}

struct Rejecting;

impl SubmissionTarget for Rejecting {
    fn delay_ms(&self) -> u32 {
        50
    }

    fn deliver(&mut self, _data: &FormData) -> pagefx::Result<()> {
        Err(PagefxError::Submission("mailbox full".to_string()))
    }
}

#[test]
fn test_failed_submission_keeps_fields_and_restores_button() {
    let mut time = VirtualTime::new();
    let mut sink = MemorySink::new();
    let mut form = ContactForm::new(&FormConfig::default());
    let mut target = Rejecting;
    form.add_group("form-group-0", "Ada", &mut sink);

    assert!(form.submit(message(), "Send", &target, &mut time, &mut sink));
    let handle = time.fire_next().unwrap();
    assert_eq!(time.now(), 50);
    assert_eq!(
        form.tick(handle, &mut target, &mut sink),
        Some(SubmitOutcome::Failed("Submission failed: mailbox full".to_string()))
    );

    assert!(sink.has_flag("form-group-0", "filled"));
    assert_eq!(sink.text(SUBMIT_ID), Some("Send"));
    assert!(!sink.has_flag(SUBMIT_ID, "disabled"));
    assert!(form.submit(message(), "Send", &target, &mut time, &mut sink));
}

#[test]
fn test_notification_lifecycle_timing() {
    let mut time = VirtualTime::new();
    let mut sink = MemorySink::new();
    let mut center = NotificationCenter::new(&NotificationConfig::default());
    let note = center.show("Saved", NotificationKind::Success, &mut time, &mut sink);
    assert_eq!(sink.style(&note.id, "transform"), Some("translateX(400px)"));

    let mut timeline = Vec::new();
    time.run_for(10_000, |t, h| {
        if let Some(event) = center.tick(h, t, &mut sink) {
            timeline.push((t.now(), event));
        }
    });
    assert_eq!(
        timeline,
        vec![
            (100, NotificationEvent::Shown(note.id.clone())),
            (5100, NotificationEvent::Dismissed(note.id.clone())),
            (5400, NotificationEvent::Removed(note.id.clone())),
        ]
    );
    assert_eq!(sink.style(&note.id, "transform"), Some("translateX(400px)"));
    assert_eq!(center.active(), 0);
}

#[test]
fn test_stacked_notifications_are_independent() {
    let mut time = VirtualTime::new();
    let mut sink = MemorySink::new();
    let mut center = NotificationCenter::new(&NotificationConfig::default());
    let first = center.show("one", NotificationKind::Info, &mut time, &mut sink);
    time.run_for(1000, |t, h| {
        center.tick(h, t, &mut sink);
    });
    let second = center.show("two", NotificationKind::Error, &mut time, &mut sink);
    assert_ne!(first.id, second.id);
    assert_eq!(center.active(), 2);

    // First leaves at 5400, second at 6400.
    time.run_for(4500, |t, h| {
        center.tick(h, t, &mut sink);
    });
    assert_eq!(center.active(), 1);
    assert_eq!(sink.style(&second.id, "transform"), Some("translateX(0)"));
    time.run_for(1000, |t, h| {
        center.tick(h, t, &mut sink);
    });
    assert_eq!(center.active(), 0);
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_partial_config_fills_defaults() {
    let config = SiteConfig::from_json(
        r#"{"carousel": {"interval_ms": 2500}, "scroll": {"policy": "debounce"}}"#,
    )
    .unwrap();
    assert_eq!(config.carousel.interval_ms, 2500);
    assert_eq!(config.carousel.pause_ms, 1000);
    assert_eq!(config.scroll.policy, Policy::Debounce);
    assert_eq!(config.scroll.nav_throttle_ms, 100);
    assert_eq!(config.loader, LoaderConfig::default());
}

#[test]
fn test_invalid_config_is_rejected() {
    assert!(matches!(
        SiteConfig::from_json(r#"{"carousel": {"interval_ms": 0}}"#),
        Err(PagefxError::InvalidConfig(_))
    ));
    assert!(matches!(
        SiteConfig::from_json(r#"{"carousel": {"interval_ms": 500, "pause_ms": 800}}"#),
        Err(PagefxError::InvalidConfig(_))
    ));
    assert!(matches!(
        SiteConfig::from_json(r#"{"scroll": {"policy": "sometimes"}}"#),
        Err(PagefxError::Config(_))
    ));
}
