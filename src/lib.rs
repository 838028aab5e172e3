//! pagefx - landing page interaction layer for the web
//!
//! Presentation-state machines for a marketing page, compiled to WebAssembly:
//! - Active navigation section and scroll progress tracking
//! - Auto-advancing demo step carousel
//! - Loading screen, staggered reveals, stat counters
//! - Parallax, hover tilt, contact form and toast notifications
//!
//! The core modules are plain Rust driven through injected timers and a
//! write-only presentation sink, so they run and test natively. The `site`
//! module (wasm32 only) binds them to the DOM.
//!
//! # Usage (JavaScript)
//!
//! ```javascript
//! import init, { Site } from 'pagefx';
//! await init();
//! const site = new Site({ carousel: { interval_ms: 2500 } });
//! site.startDemo();
//! ```

// Core
pub mod config;
pub mod error;
pub mod ratelimit;
pub mod sink;
pub mod timer;

// Page features
pub mod carousel;
pub mod counter;
pub mod effects;
pub mod form;
pub mod loader;
pub mod notify;
pub mod reveal;
pub mod scroll;
pub mod tilt;

// Browser adapter
#[cfg(target_arch = "wasm32")]
pub mod site;

use wasm_bindgen::prelude::*;

pub use carousel::{CarouselPhase, StepCarousel};
pub use config::SiteConfig;
pub use error::{PagefxError, Result};
pub use ratelimit::{Policy, RateLimiter};
pub use scroll::{ScrollSample, ScrollState, ScrollTracker, Section};
pub use sink::{MemorySink, PresentationSink};
pub use timer::{Clock, TimerHandle, Timers, VirtualTime};

#[cfg(target_arch = "wasm32")]
pub use site::Site;

/// Validate a JSON configuration and return it normalized with defaults filled in.
///
/// # Errors
/// Returns an error if the JSON is malformed or holds unusable values.
#[wasm_bindgen(js_name = "normalizeConfig")]
pub fn normalize_config(json: &str) -> std::result::Result<String, JsValue> {
    let config = SiteConfig::from_json(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
    serde_json::to_string(&config)
        .map_err(|e| JsValue::from_str(&format!("JSON serialization error: {e}")))
}

/// Get the library version
#[must_use]
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
