//! Benchmarks for scroll handling hot paths.
//!
//! Run with: cargo bench
//!
//! Results are saved to `target/criterion/` with HTML reports.
#![allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pagefx::config::{CarouselConfig, ScrollConfig};
use pagefx::effects::ScrollEffects;
use pagefx::scroll::section_at;
use pagefx::{
    Clock, MemorySink, Policy, RateLimiter, ScrollSample, ScrollTracker, Section, StepCarousel,
    VirtualTime,
};

const SECTION_HEIGHT: f64 = 900.0;
const VIEWPORT: f64 = 800.0;

fn sections(count: usize) -> Vec<Section> {
    (0..count)
        .map(|i| Section::new(format!("section-{i}"), i as f64 * SECTION_HEIGHT, SECTION_HEIGHT))
        .collect()
}

fn document_height(count: usize) -> f64 {
    count as f64 * SECTION_HEIGHT
}

/// Section lookup at the bottom of the page (worst case for a linear scan)
fn bench_section_at(c: &mut Criterion) {
    let mut group = c.benchmark_group("section_at");

    for count in [6, 50, 500] {
        let layout = sections(count);
        let y = document_height(count) - 1.0;
        group.bench_with_input(BenchmarkId::from_parameter(count), &layout, |b, layout| {
            b.iter(|| section_at(black_box(layout), black_box(y)))
        });
    }

    group.finish();
}

/// Full sample application while scrolling top to bottom
fn bench_tracker_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("tracker_sweep");

    for count in [6, 50] {
        let height = document_height(count);
        let samples: Vec<ScrollSample> = (0..1000)
            .map(|i| ScrollSample::new(f64::from(i) * height / 1000.0, VIEWPORT, height))
            .collect();

        group.throughput(Throughput::Elements(samples.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &samples, |b, samples| {
            b.iter(|| {
                let mut sink = MemorySink::new();
                let mut tracker =
                    ScrollTracker::new(&ScrollConfig::default()).with_sections(sections(count));
                for sample in samples {
                    tracker.apply(black_box(*sample), &mut sink);
                }
                tracker.active().map(str::len)
            })
        });
    }

    group.finish();
}

/// Parallax and progress output for one frame
fn bench_effects_frame(c: &mut Criterion) {
    let shapes: Vec<String> = (0..4).map(|i| format!("shape-{i}")).collect();
    let effects = ScrollEffects::new(shapes, &ScrollConfig::default());
    let sample = ScrollSample::new(420.0, VIEWPORT, 5400.0);

    c.bench_function("effects_frame", |b| {
        b.iter(|| {
            let mut sink = MemorySink::new();
            effects.apply(black_box(sample), &mut sink);
            sink.commands().len()
        })
    });
}

/// A burst of scroll events through each rate limiting policy
fn bench_rate_limiter_burst(c: &mut Criterion) {
    let mut group = c.benchmark_group("rate_limiter_burst");
    group.throughput(Throughput::Elements(1000));

    for policy in [Policy::Leading, Policy::Trailing, Policy::Debounce] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{policy:?}")),
            &policy,
            |b, &policy| {
                b.iter(|| {
                    let mut time = VirtualTime::new();
                    let mut limiter = RateLimiter::new(policy, 100);
                    let mut released = 0_u32;
                    for i in 0..1000_u32 {
                        if limiter.call(black_box(i), &mut time).is_some() {
                            released += 1;
                        }
                        // One event per 4 ms frame.
                        time.run_for(4, |t, h| {
                            if limiter.fire(h, t.now_ms()).is_some() {
                                released += 1;
                            }
                        });
                    }
                    released
                })
            },
        );
    }

    group.finish();
}

/// Ten seconds of demo carousel ticks
fn bench_carousel_cycle(c: &mut Criterion) {
    let steps: Vec<String> = (0..4).map(|i| format!("process-step-{i}")).collect();

    c.bench_function("carousel_10s", |b| {
        b.iter(|| {
            let mut time = VirtualTime::new();
            let mut sink = MemorySink::new();
            let mut carousel = StepCarousel::new(steps.clone(), &CarouselConfig::default());
            carousel.start(&mut time);
            time.run_for(10_000, |t, h| {
                carousel.tick(h, t, &mut sink);
            })
        })
    });
}

criterion_group!(
    benches,
    bench_section_at,
    bench_tracker_sweep,
    bench_effects_frame,
    bench_rate_limiter_burst,
    bench_carousel_cycle,
);

criterion_main!(benches);
