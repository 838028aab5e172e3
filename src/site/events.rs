//! Listener and observer wiring, one init function per page feature.
//!
//! Handlers hold a `Weak` reference to the shared state, so a dropped `Site`
//! turns them into no-ops.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::{
    Element, ErrorEvent, Event, EventTarget, HtmlElement, HtmlInputElement, HtmlTextAreaElement,
    IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit, MouseEvent,
    ScrollBehavior, ScrollIntoViewOptions, ScrollLogicalPosition, ScrollToOptions,
};

use super::dom::collect;
use super::{refresh_layout, scroll_sample, SharedState};
use crate::carousel::StepCarousel;
use crate::counter::parse_target;
use crate::effects::{ScrollEffects, HERO_ID, PROGRESS_ID};
use crate::error::{PagefxError, Result};
use crate::form::{FormData, SUBMIT_ID};
use crate::loader::{BAR_ID, SCREEN_ID};
use crate::reveal::{self, child_id};
use crate::sink::PresentationSink;
use crate::tilt::{tilt_at, Tilt, TiltRect};

/// Page load slower than this is reported as a warning.
const SLOW_LOAD_MS: f64 = 3000.0;

const ACTIVE_CLASS: &str = "active";

/// Elements animated by the hero entrance, keyed by choreography target.
const HERO_TARGETS: [(&str, &str); 5] = [
    ("hero-title", ".hero-title"),
    ("hero-description", ".hero-description"),
    ("hero-buttons", ".hero-buttons"),
    ("hero-stats", ".hero-stats"),
    ("dashboard-preview", ".dashboard-preview"),
];

type Init = fn(&mut Wiring<'_>) -> Result<()>;

/// Features in initialization order.
pub(crate) const FEATURES: [(&str, Init); 10] = [
    ("loading screen", loader),
    ("navigation", navigation),
    ("scroll effects", scroll_effects),
    ("reveal animations", reveal_animations),
    ("demo carousel", demo),
    ("counters", counters),
    ("contact form", contact_form),
    ("tilt", tilt),
    ("shortcuts", shortcuts),
    ("diagnostics", diagnostics),
];

/// Collects the listeners and observers created during initialization.
pub(crate) struct Wiring<'a> {
    pub(crate) state: &'a Rc<RefCell<SharedState>>,
    pub(crate) listeners: Vec<Listener>,
    pub(crate) observers: Vec<Observer>,
}

impl Wiring<'_> {
    fn weak(&self) -> Weak<RefCell<SharedState>> {
        Rc::downgrade(self.state)
    }

    fn listen(
        &mut self,
        target: &EventTarget,
        kind: &'static str,
        handler: impl FnMut(Event) + 'static,
    ) -> Result<()> {
        self.listeners.push(Listener::new(target, kind, handler)?);
        Ok(())
    }
}

/// An event listener removed from its target on drop.
pub(crate) struct Listener {
    target: EventTarget,
    kind: &'static str,
    closure: Closure<dyn FnMut(Event)>,
}

impl Listener {
    pub(crate) fn new(
        target: &EventTarget,
        kind: &'static str,
        handler: impl FnMut(Event) + 'static,
    ) -> Result<Self> {
        let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
        target.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())?;
        Ok(Self {
            target: target.clone(),
            kind,
            closure,
        })
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        if let Err(e) = self
            .target
            .remove_event_listener_with_callback(self.kind, self.closure.as_ref().unchecked_ref())
        {
            log::debug!("could not remove {} listener: {e:?}", self.kind);
        }
    }
}

type ObserverCallback = Closure<dyn FnMut(js_sys::Array, IntersectionObserver)>;

/// An `IntersectionObserver` disconnected on drop.
pub(crate) struct Observer {
    observer: IntersectionObserver,
    _callback: ObserverCallback,
}

impl Observer {
    fn new(
        threshold: f64,
        root_margin: Option<&str>,
        mut on_entry: impl FnMut(&IntersectionObserverEntry, &IntersectionObserver) + 'static,
    ) -> Result<Self> {
        let callback = Closure::wrap(Box::new(
            move |entries: js_sys::Array, observer: IntersectionObserver| {
                for entry in entries.iter() {
                    if let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() {
                        on_entry(&entry, &observer);
                    }
                }
            },
        ) as Box<dyn FnMut(js_sys::Array, IntersectionObserver)>);
        let init = IntersectionObserverInit::new();
        init.set_threshold(&JsValue::from_f64(threshold));
        if let Some(margin) = root_margin {
            init.set_root_margin(margin);
        }
        let observer =
            IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init)?;
        Ok(Self {
            observer,
            _callback: callback,
        })
    }

    fn observe(&self, target: &Element) {
        self.observer.observe(target);
    }
}

impl Drop for Observer {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}

/// Run `f` against the shared state if the page is still alive.
fn with_state(weak: &Weak<RefCell<SharedState>>, f: impl FnOnce(&mut SharedState)) {
    if let Some(state) = weak.upgrade() {
        f(&mut state.borrow_mut());
    }
}

fn smooth_scroll_to(target: &Element) {
    let options = ScrollIntoViewOptions::new();
    options.set_behavior(ScrollBehavior::Smooth);
    options.set_block(ScrollLogicalPosition::Start);
    target.scroll_into_view_with_scroll_into_view_options(&options);
}

fn scroll_to_id(id: &str) {
    let target = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.get_element_by_id(id));
    match target {
        Some(target) => smooth_scroll_to(&target),
        None => log::debug!("scroll target #{id} not found"),
    }
}

fn window() -> Result<web_sys::Window> {
    web_sys::window().ok_or_else(|| PagefxError::MissingElement("window".to_string()))
}

// ============================================================================
// Features
// ============================================================================

fn loader(w: &mut Wiring<'_>) -> Result<()> {
    let mut guard = w.state.borrow_mut();
    let s = &mut *guard;
    for (id, selector) in HERO_TARGETS {
        s.sink.bind_selector(id, selector)?;
    }
    if s.sink.require(SCREEN_ID).is_err() {
        log::info!("no loading screen, revealing hero directly");
        s.loader.finish(&mut s.timers);
        s.reveal
            .schedule(reveal::hero_sequence(), &mut s.timers, &mut s.sink);
        return Ok(());
    }
    if s.sink.bind_selector(BAR_ID, "#loading-screen .progress")? == 0 {
        log::debug!("loading screen has no progress bar");
    }
    s.loader.start(&mut s.timers);
    Ok(())
}

fn navigation(w: &mut Wiring<'_>) -> Result<()> {
    let (links, toggle, menu) = {
        let s = w.state.borrow();
        (
            s.sink.query(".nav-link")?,
            s.sink.require("nav-toggle").ok(),
            s.sink.require("nav-menu").ok(),
        )
    };
    if links.is_empty() {
        return Err(PagefxError::MissingElement(".nav-link".to_string()));
    }

    // Section id -> links pointing at it
    let mut targets: Vec<(String, Vec<HtmlElement>)> = Vec::new();
    for link in &links {
        let Some(section) = link
            .get_attribute("href")
            .and_then(|href| href.strip_prefix('#').map(str::to_string))
            .filter(|id| !id.is_empty())
        else {
            continue;
        };
        match targets.iter_mut().find(|(id, _)| *id == section) {
            Some((_, group)) => group.push(link.clone()),
            None => targets.push((section.clone(), vec![link.clone()])),
        }

        let weak = w.weak();
        let (toggle, menu) = (toggle.clone(), menu.clone());
        w.listen(link, "click", move |event| {
            event.prevent_default();
            for open in toggle.iter().chain(menu.iter()) {
                if let Err(e) = open.class_list().remove_1(ACTIVE_CLASS) {
                    log::debug!("menu close failed: {e:?}");
                }
            }
            scroll_to_id(&section);
            with_state(&weak, |s| {
                s.tracker.select(&section, &mut s.sink);
            });
        })?;
    }
    {
        let mut s = w.state.borrow_mut();
        for (id, group) in targets {
            s.sink.bind(&id, group);
        }
    }

    if let (Some(toggle), Some(menu)) = (toggle, menu) {
        let target = toggle.clone();
        w.listen(&target, "click", move |_| {
            for element in [&toggle, &menu] {
                if let Err(e) = element.class_list().toggle(ACTIVE_CLASS) {
                    log::debug!("menu toggle failed: {e:?}");
                }
            }
        })?;
    }

    let window = window()?;
    let weak = w.weak();
    w.listen(&window, "scroll", move |_| {
        with_state(&weak, |s| match scroll_sample(&s.sink) {
            Ok(sample) => s.tracker.on_scroll(sample, &mut s.timers, &mut s.sink),
            Err(e) => log::debug!("scroll sample failed: {e}"),
        });
    })?;

    let weak = w.weak();
    w.listen(&window, "resize", move |_| {
        with_state(&weak, |s| {
            if let Err(e) = refresh_layout(s) {
                log::warn!("layout refresh failed: {e}");
            }
        });
    })?;
    Ok(())
}

fn scroll_effects(w: &mut Wiring<'_>) -> Result<()> {
    {
        let mut guard = w.state.borrow_mut();
        let s = &mut *guard;
        let shapes = s.sink.query(".shape")?;
        let mut shape_ids = Vec::with_capacity(shapes.len());
        for (i, shape) in shapes.into_iter().enumerate() {
            let id = format!("shape-{i}");
            s.sink.bind(&id, vec![shape]);
            shape_ids.push(id);
        }
        s.sink.bind_selector(HERO_ID, ".hero-content")?;
        s.sink.bind_selector(PROGRESS_ID, "[data-scroll-progress]")?;
        s.effects = ScrollEffects::new(shape_ids, &s.config.scroll);
    }

    let indicator = w.state.borrow().sink.query(".scroll-indicator")?.into_iter().next();
    if let Some(indicator) = indicator {
        w.listen(&indicator, "click", |_| scroll_to_id("features"))?;
    }

    let weak = w.weak();
    w.listen(&window()?, "scroll", move |_| {
        with_state(&weak, |s| match scroll_sample(&s.sink) {
            Ok(sample) => s.effects.on_scroll(sample, &mut s.timers, &mut s.sink),
            Err(e) => log::debug!("scroll sample failed: {e}"),
        });
    })
}

fn reveal_animations(w: &mut Wiring<'_>) -> Result<()> {
    let mut observed: Vec<(Element, String)> = Vec::new();
    {
        let mut guard = w.state.borrow_mut();
        let s = &mut *guard;
        for (i, element) in s.sink.query("[data-aos]")?.into_iter().enumerate() {
            let id = format!("reveal-{i}");
            let classes = element.class_list();
            let plan = if classes.contains("feature-card") {
                s.sink
                    .bind(&format!("{id}-icon"), collect(&element.query_selector_all(".feature-icon")?));
                let items = collect(&element.query_selector_all(".feature-list li")?);
                let count = items.len();
                for (j, item) in items.into_iter().enumerate() {
                    s.sink.bind(&child_id(&id, "item", j), vec![item]);
                }
                reveal::feature_card(&id, count)
            } else if classes.contains("dashboard-card") {
                let bars = collect(&element.query_selector_all(".chart-bar")?);
                let count = bars.len();
                for (j, bar) in bars.into_iter().enumerate() {
                    s.sink.bind(&child_id(&id, "bar", j), vec![bar]);
                }
                let ring = collect(&element.query_selector_all(".progress-circle")?);
                let has_ring = !ring.is_empty();
                s.sink.bind(&format!("{id}-ring"), ring);
                reveal::dashboard_card(&id, count, has_ring)
            } else {
                reveal::element_reveal(&id)
            };
            s.sink.bind(&id, vec![element.clone()]);
            s.reveal_plans.insert(id.clone(), plan);
            observed.push((element.into(), id));
        }
    }
    if observed.is_empty() {
        return Ok(());
    }

    let weak = w.weak();
    let targets = observed.clone();
    let observer = Observer::new(0.1, Some("0px 0px -50px 0px"), move |entry, observer| {
        if !entry.is_intersecting() {
            return;
        }
        let element = entry.target();
        let Some((_, id)) = targets.iter().find(|(e, _)| *e == element) else {
            return;
        };
        observer.unobserve(&element);
        with_state(&weak, |s| {
            if let Some(plan) = s.reveal_plans.remove(id) {
                s.reveal.schedule(plan, &mut s.timers, &mut s.sink);
            }
        });
    })?;
    for (element, _) in &observed {
        observer.observe(element);
    }
    w.observers.push(observer);
    Ok(())
}

fn demo(w: &mut Wiring<'_>) -> Result<()> {
    let host = {
        let mut guard = w.state.borrow_mut();
        let s = &mut *guard;
        let steps = s.sink.query(".process-step")?;
        let mut step_ids = Vec::with_capacity(steps.len());
        for (i, step) in steps.into_iter().enumerate() {
            let id = format!("process-step-{i}");
            s.sink.bind(&id, vec![step]);
            step_ids.push(id);
        }
        if step_ids.is_empty() {
            log::debug!("no demo steps on page");
        }
        s.carousel = StepCarousel::new(step_ids, &s.config.carousel);
        s.sink.query(".tools")?.into_iter().next()
    };

    let (play, pause) = {
        let s = w.state.borrow();
        (s.sink.require("play-demo").ok(), s.sink.require("pause-demo").ok())
    };
    if let Some(play) = play {
        let weak = w.weak();
        w.listen(&play, "click", move |_| {
            with_state(&weak, |s| s.carousel.start(&mut s.timers));
        })?;
    }
    if let Some(pause) = pause {
        let weak = w.weak();
        w.listen(&pause, "click", move |_| {
            with_state(&weak, |s| s.carousel.stop(&mut s.timers));
        })?;
    }

    let Some(host) = host else {
        return Err(PagefxError::MissingElement(".tools".to_string()));
    };
    let weak = w.weak();
    let observer = Observer::new(0.5, None, move |entry, _| {
        let visible = entry.is_intersecting();
        with_state(&weak, |s| s.carousel.on_visibility(visible, &mut s.timers));
    })?;
    observer.observe(&host);
    w.observers.push(observer);
    Ok(())
}

fn counters(w: &mut Wiring<'_>) -> Result<()> {
    let mut observed: Vec<(Element, String)> = Vec::new();
    {
        let mut guard = w.state.borrow_mut();
        let s = &mut *guard;
        for (i, element) in s.sink.query(".stat-number[data-count]")?.into_iter().enumerate() {
            let raw = element.get_attribute("data-count").unwrap_or_default();
            let Some(target) = parse_target(&raw) else {
                log::warn!("ignoring counter with data-count={raw:?}");
                continue;
            };
            let id = format!("counter-{i}");
            s.sink.bind(&id, vec![element.clone()]);
            s.counters.register(id.clone(), target);
            observed.push((element.into(), id));
        }
    }
    if observed.is_empty() {
        return Ok(());
    }

    let weak = w.weak();
    let targets = observed.clone();
    let observer = Observer::new(0.5, None, move |entry, _| {
        if !entry.is_intersecting() {
            return;
        }
        let element = entry.target();
        if let Some((_, id)) = targets.iter().find(|(e, _)| *e == element) {
            with_state(&weak, |s| {
                s.counters.on_visible(id, &mut s.timers, &mut s.sink);
            });
        }
    })?;
    for (element, _) in &observed {
        observer.observe(element);
    }
    w.observers.push(observer);
    Ok(())
}

/// Current value of an `input` or `textarea`.
fn field_value(element: &Element) -> Option<String> {
    if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
        return Some(input.value());
    }
    element.dyn_ref::<HtmlTextAreaElement>().map(HtmlTextAreaElement::value)
}

fn contact_form(w: &mut Wiring<'_>) -> Result<()> {
    let form = w
        .state
        .borrow()
        .sink
        .require("contact-form")?
        .dyn_into::<web_sys::HtmlFormElement>()
        .map_err(|_| PagefxError::Dom("#contact-form is not a form".to_string()))?;

    let mut fields: Vec<(String, Element)> = Vec::new();
    {
        let mut guard = w.state.borrow_mut();
        let s = &mut *guard;
        for (i, group) in collect(&form.query_selector_all(".form-group")?).into_iter().enumerate() {
            let Some(input) = group.query_selector("input, textarea")? else {
                continue;
            };
            let id = format!("form-group-{i}");
            s.sink.bind(&id, vec![group]);
            s.form.add_group(id.clone(), &field_value(&input).unwrap_or_default(), &mut s.sink);
            fields.push((id, input));
        }
        s.sink
            .bind(SUBMIT_ID, collect(&form.query_selector_all("button[type=\"submit\"]")?));
        s.form_element = Some(form.clone());
    }

    for (id, input) in fields {
        let weak = w.weak();
        let focus_id = id.clone();
        w.listen(&input, "focus", move |_| {
            with_state(&weak, |s| s.form.focus(&focus_id, &mut s.sink));
        })?;
        let weak = w.weak();
        let target = input.clone();
        w.listen(&input, "blur", move |_| {
            let value = field_value(&target).unwrap_or_default();
            with_state(&weak, |s| s.form.blur(&id, &value, &mut s.sink));
        })?;
    }

    let weak = w.weak();
    let target = form.clone();
    w.listen(&form, "submit", move |event| {
        event.prevent_default();
        let mut data = FormData::new();
        let named = target
            .query_selector_all("input[name], textarea[name]")
            .map(|list| collect(&list))
            .unwrap_or_default();
        for field in named {
            if let (Some(name), Some(value)) = (field.get_attribute("name"), field_value(&field)) {
                data.insert(name, value);
            }
        }
        with_state(&weak, |s| {
            let label = s
                .sink
                .elements(SUBMIT_ID)
                .first()
                .map(|button| button.inner_html())
                .unwrap_or_default();
            s.form
                .submit(data, &label, &s.submission, &mut s.timers, &mut s.sink);
        });
    })
}

fn tilt(w: &mut Wiring<'_>) -> Result<()> {
    let cards = w
        .state
        .borrow()
        .sink
        .query(".feature-card, .dashboard-preview, .tool-card")?;
    for (i, card) in cards.into_iter().enumerate() {
        let id = format!("tilt-{i}");
        w.state.borrow_mut().sink.bind(&id, vec![card.clone()]);

        let weak = w.weak();
        let (move_id, target) = (id.clone(), card.clone());
        w.listen(&card, "mousemove", move |event| {
            let Some(event) = event.dyn_ref::<MouseEvent>() else {
                return;
            };
            let bounds = target.get_bounding_client_rect();
            let rect = TiltRect {
                left: bounds.left(),
                top: bounds.top(),
                width: bounds.width(),
                height: bounds.height(),
            };
            let css = tilt_at(rect, f64::from(event.client_x()), f64::from(event.client_y())).to_css();
            with_state(&weak, |s| {
                s.sink.set_style(&move_id, "transform", &css);
            });
        })?;

        let weak = w.weak();
        w.listen(&card, "mouseleave", move |_| {
            with_state(&weak, |s| {
                s.sink.set_style(&id, "transform", &Tilt::REST.to_css());
            });
        })?;
    }
    Ok(())
}

fn shortcuts(w: &mut Wiring<'_>) -> Result<()> {
    let (get_started, demo_button, logo) = {
        let s = w.state.borrow();
        (
            s.sink.require("get-started-btn").ok(),
            s.sink.require("demo-btn").ok(),
            s.sink.query(".nav-logo")?.into_iter().next(),
        )
    };
    if let Some(button) = get_started {
        w.listen(&button, "click", |event| {
            event.prevent_default();
            scroll_to_id("workflow-section");
        })?;
    }
    if let Some(button) = demo_button {
        w.listen(&button, "click", |_| scroll_to_id("tools"))?;
    }
    if let Some(logo) = logo {
        w.listen(&logo, "click", |_| {
            let Some(window) = web_sys::window() else {
                return;
            };
            let options = ScrollToOptions::new();
            options.set_top(0.0);
            options.set_behavior(ScrollBehavior::Smooth);
            window.scroll_to_with_scroll_to_options(&options);
        })?;
    }
    Ok(())
}

fn diagnostics(w: &mut Wiring<'_>) -> Result<()> {
    let window = window()?;
    w.listen(&window, "error", |event| {
        match event.dyn_ref::<ErrorEvent>() {
            Some(error) => log::error!(
                "uncaught error: {} ({}:{})",
                error.message(),
                error.filename(),
                error.lineno()
            ),
            None => log::error!("uncaught error event: {}", event.type_()),
        }
    })?;

    let perf = window.performance();
    w.listen(&window, "load", move |_| {
        let Some(perf) = &perf else {
            return;
        };
        let load_ms = perf.now();
        log::info!("page load time: {load_ms:.0}ms");
        if load_ms > SLOW_LOAD_MS {
            log::warn!("page load took over {SLOW_LOAD_MS:.0}ms");
        }
    })
}
