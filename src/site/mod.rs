//! Browser adapter - the `Site` object exported to JavaScript.
//!
//! This module owns all DOM access:
//! - `BrowserTimers` backs the core timer interface with `setTimeout`
//! - `DomSink` maps logical element identifiers onto page elements
//! - `events` wires listeners and intersection observers per feature
//!
//! Every page feature is wired independently; a missing element disables
//! that feature and is logged without affecting the others.

mod dom;
mod events;
mod timers;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use wasm_bindgen::prelude::*;
use web_sys::HtmlFormElement;

use crate::carousel::StepCarousel;
use crate::config::SiteConfig;
use crate::counter::Counters;
use crate::effects::ScrollEffects;
use crate::error::{PagefxError, Result};
use crate::form::{ContactForm, SimulatedSubmission, SubmitOutcome};
use crate::loader::{LoaderEvent, LoadingScreen};
use crate::notify::{NotificationCenter, NotificationEvent, NotificationKind};
use crate::reveal::{self, RevealScheduler, RevealStep};
use crate::scroll::{ScrollSample, ScrollTracker, Section};
use crate::timer::TimerHandle;

use dom::DomSink;
use events::{Listener, Observer};
use timers::BrowserTimers;

/// Page state shared between the exported object, listeners and timers.
pub(crate) struct SharedState {
    pub(crate) weak: Weak<RefCell<SharedState>>,
    pub(crate) config: SiteConfig,
    pub(crate) sink: DomSink,
    pub(crate) timers: BrowserTimers,
    pub(crate) tracker: ScrollTracker,
    pub(crate) effects: ScrollEffects,
    pub(crate) carousel: StepCarousel,
    pub(crate) loader: LoadingScreen,
    pub(crate) reveal: RevealScheduler,
    /// Pending choreography per revealable element, consumed on first intersection.
    pub(crate) reveal_plans: HashMap<String, Vec<RevealStep>>,
    pub(crate) counters: Counters,
    pub(crate) form: ContactForm,
    pub(crate) form_element: Option<HtmlFormElement>,
    pub(crate) submission: SimulatedSubmission,
    pub(crate) notifications: NotificationCenter,
    pub(crate) toast_listeners: HashMap<String, Listener>,
}

/// Route a fired timer to whichever component owns it.
pub(crate) fn dispatch(state: &Rc<RefCell<SharedState>>, handle: TimerHandle) {
    let mut guard = state.borrow_mut();
    let s = &mut *guard;
    s.timers.fired(handle);

    if s.tracker.tick(handle, &mut s.timers, &mut s.sink)
        || s.effects.tick(handle, &mut s.timers, &mut s.sink)
        || s.carousel.tick(handle, &mut s.timers, &mut s.sink)
        || s.reveal.tick(handle, &mut s.timers, &mut s.sink)
        || s.counters.tick(handle, &mut s.timers, &mut s.sink)
    {
        return;
    }

    if s.loader.owns(handle) {
        let mut random = js_sys::Math::random;
        if let Some(LoaderEvent::Hidden) = s.loader.tick(handle, &mut s.timers, &mut s.sink, &mut random) {
            s.reveal
                .schedule(reveal::hero_sequence(), &mut s.timers, &mut s.sink);
        }
        return;
    }

    if s.form.owns(handle) {
        match s.form.tick(handle, &mut s.submission, &mut s.sink) {
            Some(SubmitOutcome::Sent) => {
                if let Some(form) = &s.form_element {
                    form.reset();
                }
                let message = s.form.success_message().to_string();
                show_toast(s, &message, NotificationKind::Success);
            }
            Some(SubmitOutcome::Failed(reason)) => {
                show_toast(s, &format!("Message could not be sent: {reason}"), NotificationKind::Error);
            }
            None => {}
        }
        return;
    }

    if let Some(NotificationEvent::Removed(id)) = s.notifications.tick(handle, &mut s.timers, &mut s.sink) {
        s.sink.remove(&id);
        s.toast_listeners.remove(&id);
    }
}

/// Show a toast and wire its close button.
pub(crate) fn show_toast(s: &mut SharedState, message: &str, kind: NotificationKind) {
    let note = s.notifications.show(message, kind, &mut s.timers, &mut s.sink);
    let close = match s.sink.create_notification(&note) {
        Ok(close) => close,
        Err(e) => {
            log::warn!("could not create notification: {e}");
            return;
        }
    };
    let weak = Weak::clone(&s.weak);
    let id = note.id.clone();
    let listener = Listener::new(&close, "click", move |_| {
        if let Some(state) = weak.upgrade() {
            let mut guard = state.borrow_mut();
            let s = &mut *guard;
            s.notifications.dismiss(&id, &mut s.timers, &mut s.sink);
        }
    });
    match listener {
        Ok(listener) => {
            s.toast_listeners.insert(note.id, listener);
        }
        Err(e) => log::warn!("notification close button disabled: {e}"),
    }
}

/// Current scroll measurement of the window.
pub(crate) fn scroll_sample(sink: &DomSink) -> Result<ScrollSample> {
    let window = web_sys::window().ok_or_else(|| PagefxError::MissingElement("window".to_string()))?;
    let root = sink
        .document()
        .document_element()
        .ok_or_else(|| PagefxError::MissingElement("documentElement".to_string()))?;
    Ok(ScrollSample::new(
        window.scroll_y()?,
        f64::from(root.client_height()),
        f64::from(root.scroll_height()),
    ))
}

/// Re-measure `section[id]` elements and re-evaluate the active section.
pub(crate) fn refresh_layout(s: &mut SharedState) -> Result<()> {
    let mut sections: Vec<Section> = s
        .sink
        .query("section[id]")?
        .iter()
        .map(|e| Section::new(e.id(), f64::from(e.offset_top()), f64::from(e.offset_height())))
        .collect();
    sections.sort_by(|a, b| a.top.total_cmp(&b.top));
    // Section ids address nav links; a section with none has nothing to mark.
    for section in &sections {
        s.sink.bind_empty(&section.id);
    }
    s.tracker.set_sections(sections);
    let sample = scroll_sample(&s.sink)?;
    s.tracker.apply(sample, &mut s.sink);
    s.effects.apply(sample, &mut s.sink);
    Ok(())
}

/// Landing page controller exported to JavaScript.
#[wasm_bindgen]
pub struct Site {
    state: Rc<RefCell<SharedState>>,
    #[allow(dead_code)] // Dropping unregisters the listeners
    listeners: Vec<Listener>,
    #[allow(dead_code)]
    observers: Vec<Observer>,
}

#[wasm_bindgen]
impl Site {
    /// Wire every page feature.
    ///
    /// `config` is a plain object matching `SiteConfig`; `null` or
    /// `undefined` selects the defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> std::result::Result<Site, JsValue> {
        console_error_panic_hook::set_once();
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::warn_1(&JsValue::from_str(&format!("pagefx logger: {e}")));
        }

        let config: SiteConfig = if config.is_null() || config.is_undefined() {
            SiteConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| PagefxError::InvalidConfig(e.to_string()))?
        };
        config.validate()?;

        let window = web_sys::window().ok_or_else(|| PagefxError::MissingElement("window".to_string()))?;
        let document = window
            .document()
            .ok_or_else(|| PagefxError::MissingElement("document".to_string()))?;

        log::info!("initializing pagefx {}", crate::version());
        let state = Rc::new_cyclic(|weak: &Weak<RefCell<SharedState>>| {
            RefCell::new(SharedState {
                weak: Weak::clone(weak),
                tracker: ScrollTracker::new(&config.scroll),
                effects: ScrollEffects::new(Vec::new(), &config.scroll),
                carousel: StepCarousel::new(Vec::new(), &config.carousel),
                loader: LoadingScreen::new(&config.loader),
                reveal: RevealScheduler::new(),
                reveal_plans: HashMap::new(),
                counters: Counters::new(&config.counter),
                form: ContactForm::new(&config.form),
                form_element: None,
                submission: SimulatedSubmission::new(&config.form),
                notifications: NotificationCenter::new(&config.notification),
                toast_listeners: HashMap::new(),
                sink: DomSink::new(document),
                timers: BrowserTimers::new(window, Weak::clone(weak)),
                config,
            })
        });

        let mut wiring = events::Wiring {
            state: &state,
            listeners: Vec::new(),
            observers: Vec::new(),
        };
        for (name, init) in events::FEATURES {
            if let Err(e) = init(&mut wiring) {
                log::warn!("{name} disabled: {e}");
            }
        }
        let events::Wiring {
            listeners,
            observers,
            ..
        } = wiring;

        if let Err(e) = refresh_layout(&mut state.borrow_mut()) {
            log::warn!("initial layout failed: {e}");
        }
        log::info!("pagefx ready");

        Ok(Site {
            state,
            listeners,
            observers,
        })
    }

    /// Restart the demo carousel from its first step.
    #[wasm_bindgen(js_name = "startDemo")]
    pub fn start_demo(&self) {
        let mut guard = self.state.borrow_mut();
        let s = &mut *guard;
        s.carousel.start(&mut s.timers);
    }

    #[wasm_bindgen(js_name = "stopDemo")]
    pub fn stop_demo(&self) {
        let mut guard = self.state.borrow_mut();
        let s = &mut *guard;
        s.carousel.stop(&mut s.timers);
    }

    /// Re-measure sections after a layout change.
    ///
    /// # Errors
    /// Returns an error if the page cannot be measured.
    #[wasm_bindgen(js_name = "refreshLayout")]
    pub fn refresh_layout(&self) -> std::result::Result<(), JsValue> {
        Ok(refresh_layout(&mut self.state.borrow_mut())?)
    }

    #[wasm_bindgen(js_name = "activeSection")]
    pub fn active_section(&self) -> Option<String> {
        self.state.borrow().tracker.active().map(str::to_string)
    }

    #[wasm_bindgen(js_name = "scrollProgress")]
    pub fn scroll_progress(&self) -> f64 {
        self.state.borrow().tracker.state().progress
    }

    #[wasm_bindgen(js_name = "isLoading")]
    pub fn is_loading(&self) -> bool {
        self.state.borrow().loader.is_loading()
    }

    /// Show a toast. `kind` is `success`, `error` or anything else for info.
    pub fn notify(&self, message: &str, kind: &str) {
        let kind = match kind {
            "success" => NotificationKind::Success,
            "error" => NotificationKind::Error,
            _ => NotificationKind::Info,
        };
        show_toast(&mut self.state.borrow_mut(), message, kind);
    }

    /// Timers currently armed in the browser.
    #[wasm_bindgen(js_name = "pendingTimers")]
    pub fn pending_timers(&self) -> usize {
        self.state.borrow().timers.live()
    }
}

impl Drop for Site {
    fn drop(&mut self) {
        if let Ok(mut s) = self.state.try_borrow_mut() {
            s.timers.clear_all();
        }
    }
}
