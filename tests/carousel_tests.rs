//! Demo step carousel timeline tests
//!
//! Drives `StepCarousel` with virtual time and checks which step is
//! highlighted at every tick.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

use pagefx::config::CarouselConfig;
use pagefx::sink::Command;
use pagefx::{CarouselPhase, MemorySink, StepCarousel, TimerHandle, VirtualTime};

fn carousel(steps: &[&str]) -> StepCarousel {
    StepCarousel::new(
        steps.iter().map(|s| (*s).to_string()).collect(),
        &CarouselConfig::default(),
    )
}

/// Run for `ms`, recording `(time, highlighted steps)` after every tick.
fn run(
    c: &mut StepCarousel,
    time: &mut VirtualTime,
    sink: &mut MemorySink,
    ms: u64,
) -> Vec<(u64, Vec<String>)> {
    let mut frames = Vec::new();
    time.run_for(ms, |t, handle| {
        if c.tick(handle, t, sink) {
            let lit = sink.highlighted().into_iter().map(str::to_string).collect();
            frames.push((t.now(), lit));
        }
    });
    frames
}

/// Run for `ms`, recording `(time, phase, highlighted steps)` after every tick.
fn run_phases(
    c: &mut StepCarousel,
    time: &mut VirtualTime,
    sink: &mut MemorySink,
    ms: u64,
) -> Vec<(u64, CarouselPhase, Vec<String>)> {
    let mut frames = Vec::new();
    time.run_for(ms, |t, handle| {
        if c.tick(handle, t, sink) {
            let lit = sink.highlighted().into_iter().map(str::to_string).collect();
            frames.push((t.now(), c.phase(), lit));
        }
    });
    frames
}

fn lit(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| (*s).to_string()).collect()
}

#[test]
fn test_three_step_cycle() {
    let mut time = VirtualTime::new();
    let mut sink = MemorySink::new();
    let mut c = carousel(&["A", "B", "C"]);
    c.start(&mut time);

    let frames = run(&mut c, &mut time, &mut sink, 8000);
    assert_eq!(
        frames,
        vec![
            (2000, lit(&["A"])),
            (4000, lit(&["B"])),
            (6000, lit(&["C"])),
            (7000, lit(&[])),
            (8000, lit(&["A"])),
        ]
    );
}

#[test]
fn test_three_step_cycle_phases() {
    use CarouselPhase::{Pausing, Running};

    let mut time = VirtualTime::new();
    let mut sink = MemorySink::new();
    let mut c = carousel(&["A", "B", "C"]);
    c.start(&mut time);
    assert_eq!(c.phase(), Running);

    // The last step stays lit under Running; only the cleared beat is Pausing.
    let frames = run_phases(&mut c, &mut time, &mut sink, 8000);
    assert_eq!(
        frames,
        vec![
            (2000, Running, lit(&["A"])),
            (4000, Running, lit(&["B"])),
            (6000, Running, lit(&["C"])),
            (7000, Pausing, lit(&[])),
            (8000, Running, lit(&["A"])),
        ]
    );
    assert!(c.is_running());
}

#[test]
fn test_single_step_repeats_with_blank_beat() {
    use CarouselPhase::{Pausing, Running};

    let mut time = VirtualTime::new();
    let mut sink = MemorySink::new();
    let mut c = carousel(&["A"]);
    c.start(&mut time);

    let frames = run_phases(&mut c, &mut time, &mut sink, 5000);
    assert_eq!(
        frames,
        vec![
            (2000, Running, lit(&["A"])),
            (3000, Pausing, lit(&[])),
            (4000, Running, lit(&["A"])),
            (5000, Pausing, lit(&[])),
        ]
    );
    assert_eq!(time.live_timers(), 1);
    assert_eq!(time.next_due(), Some(6000));
}

#[test]
fn test_cycle_repeats_indefinitely() {
    let mut time = VirtualTime::new();
    let mut sink = MemorySink::new();
    let mut c = carousel(&["A", "B"]);
    c.start(&mut time);

    let frames = run(&mut c, &mut time, &mut sink, 20_000);
    let highlights: Vec<_> = frames
        .iter()
        .filter(|(_, lit)| !lit.is_empty())
        .map(|(at, lit)| (*at, lit[0].clone()))
        .collect();
    // Two steps: A at 2000, B at 4000, blank at 5000, then every 4000 ms.
    assert_eq!(
        highlights,
        vec![
            (2000, "A".to_string()),
            (4000, "B".to_string()),
            (6000, "A".to_string()),
            (8000, "B".to_string()),
            (10_000, "A".to_string()),
            (12_000, "B".to_string()),
            (14_000, "A".to_string()),
            (16_000, "B".to_string()),
            (18_000, "A".to_string()),
            (20_000, "B".to_string()),
        ]
    );
    assert!(c.is_running());
}

#[test]
fn test_at_most_one_step_highlighted() {
    let mut time = VirtualTime::new();
    let mut sink = MemorySink::new();
    let mut c = carousel(&["A", "B", "C", "D"]);
    c.start(&mut time);

    for (_, lit) in run(&mut c, &mut time, &mut sink, 30_000) {
        assert!(lit.len() <= 1, "more than one step lit: {lit:?}");
    }
}

#[test]
fn test_start_twice_keeps_one_timer() {
    let mut time = VirtualTime::new();
    let mut sink = MemorySink::new();
    let mut c = carousel(&["A", "B", "C"]);
    c.start(&mut time);
    time.run_for(500, |_, _| {});
    c.start(&mut time);

    assert_eq!(time.live_timers(), 1);
    assert_eq!(c.index(), Some(0));

    // The restart resets the cadence: first highlight 2000 ms after it.
    let frames = run(&mut c, &mut time, &mut sink, 2000);
    assert_eq!(frames, vec![(2500, lit(&["A"]))]);
}

#[test]
fn test_stop_then_start_never_fires_stale_tick() {
    let mut time = VirtualTime::new();
    let mut sink = MemorySink::new();
    let mut c = carousel(&["A", "B", "C"]);
    c.start(&mut time);
    run(&mut c, &mut time, &mut sink, 2500);
    assert_eq!(c.active_step(), Some("A"));

    // Handle 1 was the first tick; handle 2 is the pending tick for B.
    let stale = TimerHandle::from_raw(2);
    assert!(c.owns(stale));
    c.stop(&mut time);
    assert_eq!(time.live_timers(), 0);
    c.start(&mut time);
    assert!(!c.tick(stale, &mut time, &mut sink));
    assert_eq!(sink.highlighted(), vec!["A"]);

    let frames = run(&mut c, &mut time, &mut sink, 2000);
    assert_eq!(frames, vec![(4500, lit(&["A"]))]);
}

#[test]
fn test_stop_cancels_pause_beat() {
    let mut time = VirtualTime::new();
    let mut sink = MemorySink::new();
    let mut c = carousel(&["A"]);
    c.start(&mut time);
    run(&mut c, &mut time, &mut sink, 3000);
    assert_eq!(c.phase(), CarouselPhase::Pausing);
    assert!(sink.highlighted().is_empty());

    c.stop(&mut time);
    assert_eq!(c.phase(), CarouselPhase::Idle);
    assert_eq!(time.live_timers(), 0);
    assert!(run(&mut c, &mut time, &mut sink, 10_000).is_empty());
    assert!(sink.highlighted().is_empty());
}

#[test]
fn test_stop_while_last_step_lit_skips_blank() {
    let mut time = VirtualTime::new();
    let mut sink = MemorySink::new();
    let mut c = carousel(&["A", "B"]);
    c.start(&mut time);
    run(&mut c, &mut time, &mut sink, 4000);
    assert_eq!(c.phase(), CarouselPhase::Running);

    // The pending blank belongs to the stopped cycle; a restart highlights A.
    c.stop(&mut time);
    c.start(&mut time);
    let frames = run(&mut c, &mut time, &mut sink, 2000);
    assert_eq!(frames, vec![(6000, lit(&["A"]))]);
}

#[test]
fn test_empty_carousel_stays_idle() {
    let mut time = VirtualTime::new();
    let mut c = carousel(&[]);
    c.start(&mut time);
    c.on_visibility(true, &mut time);

    assert_eq!(c.phase(), CarouselPhase::Idle);
    assert_eq!(c.index(), None);
    assert_eq!(time.live_timers(), 0);
}

#[test]
fn test_visibility_autostarts_after_delay() {
    let mut time = VirtualTime::new();
    let mut sink = MemorySink::new();
    let mut c = carousel(&["A", "B"]);
    c.on_visibility(true, &mut time);

    let frames = run(&mut c, &mut time, &mut sink, 3000);
    // 1000 ms arming delay, then the first interval.
    assert_eq!(frames, vec![(1000, lit(&[])), (3000, lit(&["A"]))]);
    assert!(c.is_running());

    // Further visibility signals while running are ignored.
    c.on_visibility(true, &mut time);
    assert_eq!(c.phase(), CarouselPhase::Running);
    assert_eq!(time.live_timers(), 1);
}

#[test]
fn test_advance_clears_previous_before_highlighting() {
    let mut time = VirtualTime::new();
    let mut sink = MemorySink::new();
    let mut c = carousel(&["A", "B"]);
    c.start(&mut time);
    run(&mut c, &mut time, &mut sink, 4000);

    assert_eq!(
        sink.commands(),
        &[
            Command::Highlight("A".to_string()),
            Command::Clear("A".to_string()),
            Command::Highlight("B".to_string()),
        ]
    );
}
