//! Toast notifications: slide in, linger, slide out, then removal.

use crate::config::NotificationConfig;
use crate::sink::PresentationSink;
use crate::timer::{self, TimerHandle, Timers};

const HIDDEN_TRANSFORM: &str = "translateX(400px)";
const SHOWN_TRANSFORM: &str = "translateX(0)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Info,
    Error,
}

impl NotificationKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Error => "error",
        }
    }

    /// Background colour of the toast.
    pub fn color(self) -> &'static str {
        match self {
            Self::Success => "#10b981",
            Self::Info => "#3b82f6",
            Self::Error => "#ef4444",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: String,
    pub message: String,
    pub kind: NotificationKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationEvent {
    Shown(String),
    Dismissed(String),
    /// The element should now be removed from the page.
    Removed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Entering,
    Visible,
    Leaving,
}

#[derive(Debug)]
struct Toast {
    id: String,
    stage: Stage,
    timer: Option<TimerHandle>,
}

#[derive(Debug)]
pub struct NotificationCenter {
    config: NotificationConfig,
    next_id: u64,
    toasts: Vec<Toast>,
}

impl NotificationCenter {
    pub fn new(config: &NotificationConfig) -> Self {
        Self {
            config: config.clone(),
            next_id: 0,
            toasts: Vec::new(),
        }
    }

    /// Toasts that have not been removed yet.
    pub fn active(&self) -> usize {
        self.toasts.len()
    }

    pub fn owns(&self, handle: TimerHandle) -> bool {
        self.toasts.iter().any(|t| t.timer == Some(handle))
    }

    /// Queue a toast. The caller creates the element using the returned id;
    /// it starts off-screen and slides in after the enter delay.
    pub fn show(
        &mut self,
        message: impl Into<String>,
        kind: NotificationKind,
        timers: &mut dyn Timers,
        sink: &mut dyn PresentationSink,
    ) -> Notification {
        self.next_id += 1;
        let id = format!("notification-{}", self.next_id);
        sink.set_style(&id, "transform", HIDDEN_TRANSFORM);
        let mut toast = Toast {
            id: id.clone(),
            stage: Stage::Entering,
            timer: None,
        };
        timer::rearm(&mut toast.timer, timers, self.config.enter_delay_ms);
        self.toasts.push(toast);
        Notification {
            id,
            message: message.into(),
            kind,
        }
    }

    /// Start the exit transition early. Returns `false` for unknown or
    /// already leaving toasts.
    pub fn dismiss(
        &mut self,
        id: &str,
        timers: &mut dyn Timers,
        sink: &mut dyn PresentationSink,
    ) -> bool {
        let exit_ms = self.config.exit_ms;
        let Some(toast) = self.toasts.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        if toast.stage == Stage::Leaving {
            return false;
        }
        Self::leave(toast, exit_ms, timers, sink);
        true
    }

    pub fn tick(
        &mut self,
        handle: TimerHandle,
        timers: &mut dyn Timers,
        sink: &mut dyn PresentationSink,
    ) -> Option<NotificationEvent> {
        let pos = self.toasts.iter().position(|t| t.timer == Some(handle))?;
        let (lifetime_ms, exit_ms) = (self.config.lifetime_ms, self.config.exit_ms);
        let toast = self.toasts.get_mut(pos)?;
        toast.timer = None;
        match toast.stage {
            Stage::Entering => {
                toast.stage = Stage::Visible;
                sink.set_style(&toast.id, "transform", SHOWN_TRANSFORM);
                timer::rearm(&mut toast.timer, timers, lifetime_ms);
                Some(NotificationEvent::Shown(toast.id.clone()))
            }
            Stage::Visible => {
                Self::leave(toast, exit_ms, timers, sink);
                Some(NotificationEvent::Dismissed(toast.id.clone()))
            }
            Stage::Leaving => {
                let toast = self.toasts.remove(pos);
                Some(NotificationEvent::Removed(toast.id))
            }
        }
    }

    fn leave(toast: &mut Toast, exit_ms: u32, timers: &mut dyn Timers, sink: &mut dyn PresentationSink) {
        toast.stage = Stage::Leaving;
        sink.set_style(&toast.id, "transform", HIDDEN_TRANSFORM);
        timer::rearm(&mut toast.timer, timers, exit_ms);
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
    fn test_early_dismiss_skips_lifetime() {
        let mut time = VirtualTime::new();
        let mut sink = MemorySink::new();
        let mut center = NotificationCenter::new(&NotificationConfig::default());
        let note = center.show("hi", NotificationKind::Info, &mut time, &mut sink);

        let shown = time.fire_next().unwrap();
        assert_eq!(
            center.tick(shown, &mut time, &mut sink),
            Some(NotificationEvent::Shown(note.id.clone()))
        );
        assert!(center.dismiss(&note.id, &mut time, &mut sink));
        assert!(!center.dismiss(&note.id, &mut time, &mut sink));
        assert_eq!(time.live_timers(), 1);

        let removed = time.fire_next().unwrap();
        assert_eq!(time.now(), 400);
        assert_eq!(
            center.tick(removed, &mut time, &mut sink),
            Some(NotificationEvent::Removed(note.id))
        );
        assert_eq!(center.active(), 0);
    }

    #[test]
    fn test_ids_are_unique() {
        let mut time = VirtualTime::new();
        let mut sink = MemorySink::new();
        let mut center = NotificationCenter::new(&NotificationConfig::default());
        let a = center.show("a", NotificationKind::Success, &mut time, &mut sink);
        let b = center.show("b", NotificationKind::Error, &mut time, &mut sink);
        assert_ne!(a.id, b.id);
        assert_eq!(sink.style(&a.id, "transform"), Some("translateX(400px)"));
    }
}
