//! Contact form: field focus/filled state and submission lifecycle.
//!
//! Delivery goes through a [`SubmissionTarget`]. The shipped target is
//! [`SimulatedSubmission`], which waits and reports success; a real backend
//! plugs in behind the same trait.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::FormConfig;
use crate::error::Result;
use crate::sink::PresentationSink;
use crate::timer::{self, TimerHandle, Timers};

pub const SUBMIT_ID: &str = "contact-submit";

/// Focus and fill state of one form group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldState {
    pub focused: bool,
    pub filled: bool,
}

impl FieldState {
    pub fn from_value(value: &str) -> Self {
        Self {
            focused: false,
            filled: !value.trim().is_empty(),
        }
    }

    fn render(self, id: &str, sink: &mut dyn PresentationSink) {
        sink.set_flag(id, "focused", self.focused);
        sink.set_flag(id, "filled", self.filled);
    }
}

/// Submitted field values keyed by input name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormData(BTreeMap<String, String>);

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// JSON payload for a delivery backend.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Where submitted forms go.
pub trait SubmissionTarget {
    /// How long delivery takes before the outcome is known.
    fn delay_ms(&self) -> u32;

    /// Deliver the form.
    ///
    /// # Errors
    /// Returns an error if the form was not accepted.
    fn deliver(&mut self, data: &FormData) -> Result<()>;
}

/// Local stand-in that accepts everything after a fixed delay.
#[derive(Debug, Default)]
pub struct SimulatedSubmission {
    delay_ms: u32,
    delivered: Vec<String>,
}

impl SimulatedSubmission {
    pub fn new(config: &FormConfig) -> Self {
        Self {
            delay_ms: config.submit_delay_ms,
            delivered: Vec::new(),
        }
    }

    /// JSON payloads received so far.
    pub fn delivered(&self) -> &[String] {
        &self.delivered
    }
}

impl SubmissionTarget for SimulatedSubmission {
    fn delay_ms(&self) -> u32 {
        self.delay_ms
    }

    fn deliver(&mut self, data: &FormData) -> Result<()> {
        let payload = data.to_json()?;
        log::info!("simulated submission of {} fields", data.len());
        self.delivered.push(payload);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Sent,
    Failed(String),
}

#[derive(Debug)]
pub struct ContactForm {
    groups: Vec<(String, FieldState)>,
    sending_label: String,
    success_message: String,
    pending: Option<FormData>,
    restore_label: String,
    timer: Option<TimerHandle>,
}

impl ContactForm {
    pub fn new(config: &FormConfig) -> Self {
        Self {
            groups: Vec::new(),
            sending_label: config.sending_label.clone(),
            success_message: config.success_message.clone(),
            pending: None,
            restore_label: String::new(),
            timer: None,
        }
    }

    /// Register a form group with the current value of its input.
    pub fn add_group(&mut self, id: impl Into<String>, value: &str, sink: &mut dyn PresentationSink) {
        let id = id.into();
        let state = FieldState::from_value(value);
        state.render(&id, sink);
        self.groups.push((id, state));
    }

    pub fn field(&self, id: &str) -> Option<FieldState> {
        self.groups.iter().find(|(g, _)| g == id).map(|(_, s)| *s)
    }

    pub fn is_sending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn success_message(&self) -> &str {
        &self.success_message
    }

    pub fn owns(&self, handle: TimerHandle) -> bool {
        self.timer == Some(handle)
    }

    pub fn focus(&mut self, id: &str, sink: &mut dyn PresentationSink) {
        if let Some((id, state)) = self.groups.iter_mut().find(|(g, _)| g == id) {
            state.focused = true;
            state.render(id, sink);
        }
    }

    pub fn blur(&mut self, id: &str, value: &str, sink: &mut dyn PresentationSink) {
        if let Some((id, state)) = self.groups.iter_mut().find(|(g, _)| g == id) {
            *state = FieldState::from_value(value);
            state.render(id, sink);
        }
    }

    /// Start a submission. The submit button is disabled and relabelled until
    /// the outcome arrives; `button_html` is the button's current markup and is
    /// put back verbatim afterwards. Returns `false` if a submission is already
    /// in flight.
    pub fn submit(
        &mut self,
        data: FormData,
        button_html: &str,
        target: &dyn SubmissionTarget,
        timers: &mut dyn Timers,
        sink: &mut dyn PresentationSink,
    ) -> bool {
        if self.is_sending() {
            log::debug!("submission already in flight");
            return false;
        }
        self.pending = Some(data);
        self.restore_label = button_html.to_string();
        sink.set_flag(SUBMIT_ID, "disabled", true);
        sink.set_text(SUBMIT_ID, &self.sending_label);
        timer::rearm(&mut self.timer, timers, target.delay_ms());
        true
    }

    /// Timer expiry: deliver the pending form. Returns `None` for handles the
    /// form does not own.
    pub fn tick(
        &mut self,
        handle: TimerHandle,
        target: &mut dyn SubmissionTarget,
        sink: &mut dyn PresentationSink,
    ) -> Option<SubmitOutcome> {
        if !self.owns(handle) {
            return None;
        }
        self.timer = None;
        let data = self.pending.take()?;
        let outcome = match target.deliver(&data) {
            Ok(()) => {
                for (id, state) in &mut self.groups {
                    *state = FieldState::default();
                    state.render(id, sink);
                }
                SubmitOutcome::Sent
            }
            Err(e) => {
                log::warn!("contact form delivery failed: {e}");
                SubmitOutcome::Failed(e.to_string())
            }
        };
        sink.set_markup(SUBMIT_ID, &self.restore_label);
        sink.set_flag(SUBMIT_ID, "disabled", false);
        Some(outcome)
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
    use crate::sink::{Command, MemorySink};
    use crate::timer::VirtualTime;

    #[test]
    fn test_field_focus_and_blur() {
        let mut sink = MemorySink::new();
        let mut form = ContactForm::new(&FormConfig::default());
        form.add_group("form-group-0", "", &mut sink);
        form.add_group("form-group-1", "prefilled", &mut sink);
        assert!(sink.has_flag("form-group-1", "filled"));

        form.focus("form-group-0", &mut sink);
        assert!(sink.has_flag("form-group-0", "focused"));

        form.blur("form-group-0", "  ", &mut sink);
        assert_eq!(form.field("form-group-0"), Some(FieldState::default()));
        assert!(!sink.has_flag("form-group-0", "focused"));

        form.blur("form-group-0", "ada@example.com", &mut sink);
        assert!(sink.has_flag("form-group-0", "filled"));
    }

    #[test]
    fn test_button_markup_restored_verbatim() {
        let mut time = VirtualTime::new();
        let mut sink = MemorySink::new();
        let mut target = SimulatedSubmission::new(&FormConfig::default());
        let mut form = ContactForm::new(&FormConfig::default());
        let label = r#"<i class="fas fa-paper-plane"></i> Send Message"#;

        assert!(form.submit(FormData::new(), label, &target, &mut time, &mut sink));
        assert_eq!(sink.text(SUBMIT_ID), Some("Sending..."));

        let handle = time.fire_next().unwrap();
        assert_eq!(form.tick(handle, &mut target, &mut sink), Some(SubmitOutcome::Sent));
        assert_eq!(sink.text(SUBMIT_ID), Some(label));
        assert!(sink.commands().contains(&Command::Markup {
            id: SUBMIT_ID.to_string(),
            html: label.to_string(),
        }));
        assert!(!sink.has_flag(SUBMIT_ID, "disabled"));
    }

    #[test]
    fn test_form_data_json() {
        let data = FormData::new().with("name", "Ada").with("email", "ada@example.com");
        assert_eq!(data.to_json().unwrap(), r#"{"email":"ada@example.com","name":"Ada"}"#);
        assert_eq!(data.get("name"), Some("Ada"));
    }
}
