//! `setTimeout`-backed timer host.
//!
//! One callback closure is shared by every timer; the browser passes the
//! handle back as the timeout argument and the callback routes it to
//! [`super::dispatch`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Weak;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::Window;

use super::SharedState;
use crate::timer::{Clock, TimerHandle, Timers};

pub(crate) struct BrowserTimers {
    window: Window,
    callback: Closure<dyn FnMut(JsValue)>,
    last: TimerHandle,
    // handle -> browser timeout id
    live: HashMap<TimerHandle, i32>,
}

impl BrowserTimers {
    pub(crate) fn new(window: Window, state: Weak<RefCell<SharedState>>) -> Self {
        let callback = Closure::wrap(Box::new(move |arg: JsValue| {
            let Some(handle) = arg.as_f64().and_then(handle_from_js) else {
                return;
            };
            if let Some(state) = state.upgrade() {
                super::dispatch(&state, handle);
            }
        }) as Box<dyn FnMut(JsValue)>);
        Self {
            window,
            callback,
            last: TimerHandle::from_raw(0),
            live: HashMap::new(),
        }
    }

    /// Forget a timer that has just fired.
    pub(crate) fn fired(&mut self, handle: TimerHandle) {
        self.live.remove(&handle);
    }

    /// Cancel every armed timer.
    pub(crate) fn clear_all(&mut self) {
        for (_, id) in self.live.drain() {
            self.window.clear_timeout_with_handle(id);
        }
    }

    pub(crate) fn live(&self) -> usize {
        self.live.len()
    }
}

impl Clock for BrowserTimers {
    fn now_ms(&self) -> f64 {
        self.window
            .performance()
            .map_or_else(js_sys::Date::now, |perf| perf.now())
    }
}

impl Timers for BrowserTimers {
    fn set_timeout(&mut self, delay_ms: u32) -> TimerHandle {
        // Ids travel through JS as numbers; keep them in u32 range.
        self.last = self.last.successor(u64::from(u32::MAX));
        let handle = self.last;
        let delay = i32::try_from(delay_ms).unwrap_or(i32::MAX);
        match self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_1(
                self.callback.as_ref().unchecked_ref(),
                delay,
                &handle_to_js(handle),
            ) {
            Ok(id) => {
                self.live.insert(handle, id);
            }
            Err(e) => log::warn!("setTimeout failed: {e:?}"),
        }
        handle
    }

    fn clear_timeout(&mut self, handle: TimerHandle) {
        if let Some(id) = self.live.remove(&handle) {
            self.window.clear_timeout_with_handle(id);
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn handle_to_js(handle: TimerHandle) -> JsValue {
    // At most u32::MAX, exact in f64.
    JsValue::from_f64(handle.raw() as f64)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn handle_from_js(raw: f64) -> Option<TimerHandle> {
    if raw.is_finite() && raw >= 1.0 && raw <= f64::from(u32::MAX) {
        // In range: checked above.
        Some(TimerHandle::from_raw(u64::from(raw as u32)))
    } else {
        None
    }
}
