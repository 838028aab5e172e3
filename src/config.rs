//! Page timing and geometry configuration.
//!
//! Every field has a default matching the shipped landing page, so an empty
//! JSON object (`{}`) is a complete configuration.

use serde::{Deserialize, Serialize};

use crate::error::{PagefxError, Result};
use crate::ratelimit::Policy;
use crate::scroll::LOOKAHEAD_PX;

/// Top-level configuration for all page features.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub scroll: ScrollConfig,
    pub carousel: CarouselConfig,
    pub loader: LoaderConfig,
    pub counter: CounterConfig,
    pub form: FormConfig,
    pub notification: NotificationConfig,
}

/// Navigation tracking and scroll effects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    /// Distance below the top edge used to decide which section is in view.
    pub lookahead_px: f64,
    /// Rate limit window for active-section tracking.
    pub nav_throttle_ms: u32,
    /// Rate limit window for parallax and progress updates.
    pub effects_throttle_ms: u32,
    /// Offset past which the navbar is marked `scrolled`.
    pub navbar_threshold_px: f64,
    pub policy: Policy,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            lookahead_px: LOOKAHEAD_PX,
            nav_throttle_ms: 100,
            effects_throttle_ms: 16,
            navbar_threshold_px: 100.0,
            policy: Policy::Trailing,
        }
    }
}

/// Demo step carousel cadence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarouselConfig {
    pub interval_ms: u32,
    /// Blank beat shown after the last step of each cycle.
    pub pause_ms: u32,
    /// Delay between the host region becoming visible and the first start.
    pub autostart_delay_ms: u32,
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Self {
            interval_ms: 2000,
            pause_ms: 1000,
            autostart_delay_ms: 1000,
        }
    }
}

/// Loading screen simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    pub tick_ms: u32,
    /// Upper bound of the random progress step per tick (percent).
    pub max_increment: f64,
    pub hide_delay_ms: u32,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            tick_ms: 100,
            max_increment: 15.0,
            hide_delay_ms: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterConfig {
    pub duration_ms: u32,
    pub frame_ms: u32,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            duration_ms: 2000,
            frame_ms: 16,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    /// Delay of the simulated submission collaborator.
    pub submit_delay_ms: u32,
    pub sending_label: String,
    pub success_message: String,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            submit_delay_ms: 2000,
            sending_label: "Sending...".to_string(),
            success_message: "Message sent successfully! We'll get back to you soon.".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub enter_delay_ms: u32,
    pub lifetime_ms: u32,
    pub exit_ms: u32,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enter_delay_ms: 100,
            lifetime_ms: 5000,
            exit_ms: 300,
        }
    }
}

impl SiteConfig {
    /// Decode and validate a configuration from JSON.
    ///
    /// # Errors
    /// Returns an error if the JSON is malformed or a value is unusable.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would spin timers or divide by zero.
    ///
    /// # Errors
    /// Returns `InvalidConfig` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("carousel.interval_ms", self.carousel.interval_ms),
            ("loader.tick_ms", self.loader.tick_ms),
            ("counter.frame_ms", self.counter.frame_ms),
            ("counter.duration_ms", self.counter.duration_ms),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(PagefxError::InvalidConfig(format!("{name} must be > 0")));
            }
        }
        if self.carousel.pause_ms > self.carousel.interval_ms {
            return Err(PagefxError::InvalidConfig(
                "carousel.pause_ms must not exceed carousel.interval_ms".to_string(),
            ));
        }
        if !self.scroll.lookahead_px.is_finite() || !self.loader.max_increment.is_finite() {
            return Err(PagefxError::InvalidConfig(
                "scroll.lookahead_px and loader.max_increment must be finite".to_string(),
            ));
        }
        Ok(())
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
    fn test_empty_object_is_default() {
        let config = SiteConfig::from_json("{}").unwrap();
        assert_eq!(config, SiteConfig::default());
        assert_eq!(config.scroll.lookahead_px, LOOKAHEAD_PX);
        assert_eq!(config.carousel.interval_ms, 2000);
        assert_eq!(config.carousel.pause_ms, 1000);
    }

    #[test]
    fn test_lookahead_override_replaces_default() {
        let config = SiteConfig::from_json(r#"{"scroll": {"lookahead_px": 40.0}}"#).unwrap();
        assert_eq!(config.scroll.lookahead_px, 40.0);
        assert_eq!(ScrollConfig::default().lookahead_px, LOOKAHEAD_PX);
    }

    #[test]
    fn test_partial_override() {
        let config =
            SiteConfig::from_json(r#"{"carousel": {"interval_ms": 3000}, "scroll": {"policy": "debounce"}}"#)
                .unwrap();
        assert_eq!(config.carousel.interval_ms, 3000);
        assert_eq!(config.carousel.pause_ms, 1000);
        assert_eq!(config.scroll.policy, Policy::Debounce);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let err = SiteConfig::from_json(r#"{"carousel": {"interval_ms": 0}}"#).unwrap_err();
        assert!(matches!(err, PagefxError::InvalidConfig(_)));
        assert!(err.to_string().contains("carousel.interval_ms"));
    }

    #[test]
    fn test_pause_longer_than_interval_rejected() {
        let err =
            SiteConfig::from_json(r#"{"carousel": {"interval_ms": 500, "pause_ms": 800}}"#).unwrap_err();
        assert!(matches!(err, PagefxError::InvalidConfig(_)));
    }

    #[test]
    fn test_malformed_json() {
        let err = SiteConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, PagefxError::Config(_)));
    }
}
