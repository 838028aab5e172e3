//! DOM-backed presentation sink.
//!
//! Components address elements by logical identifier. Identifiers bound with
//! [`DomSink::bind`] map to one or more elements found by selector; anything
//! else falls back to `getElementById`.

use std::collections::HashMap;

use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlButtonElement, HtmlElement, NodeList};

use crate::error::{PagefxError, Result};
use crate::notify::Notification;
use crate::sink::PresentationSink;

const ACTIVE_CLASS: &str = "active";

pub(crate) struct DomSink {
    document: Document,
    bound: HashMap<String, Vec<HtmlElement>>,
}

impl DomSink {
    pub(crate) fn new(document: Document) -> Self {
        Self {
            document,
            bound: HashMap::new(),
        }
    }

    pub(crate) fn document(&self) -> &Document {
        &self.document
    }

    /// Bind `id` to `elements`, replacing any previous binding.
    pub(crate) fn bind(&mut self, id: &str, elements: Vec<HtmlElement>) {
        self.bound.insert(id.to_string(), elements);
    }

    /// Bind `id` to nothing unless it is already bound, so writes to it never
    /// reach an element that merely shares the id.
    pub(crate) fn bind_empty(&mut self, id: &str) {
        self.bound.entry(id.to_string()).or_default();
    }

    /// Bind `id` to every match of `selector`. Returns the number of matches.
    pub(crate) fn bind_selector(&mut self, id: &str, selector: &str) -> Result<usize> {
        let elements = self.query(selector)?;
        let count = elements.len();
        if count > 0 {
            self.bind(id, elements);
        }
        Ok(count)
    }

    /// Every element in the document matching `selector`.
    pub(crate) fn query(&self, selector: &str) -> Result<Vec<HtmlElement>> {
        Ok(collect(&self.document.query_selector_all(selector)?))
    }

    /// First element for `id`, or `MissingElement`.
    pub(crate) fn require(&self, id: &str) -> Result<HtmlElement> {
        self.elements(id)
            .into_iter()
            .next()
            .ok_or_else(|| PagefxError::MissingElement(id.to_string()))
    }

    pub(crate) fn elements(&self, id: &str) -> Vec<HtmlElement> {
        if let Some(elements) = self.bound.get(id) {
            return elements.clone();
        }
        self.document
            .get_element_by_id(id)
            .and_then(|e| e.dyn_into::<HtmlElement>().ok())
            .into_iter()
            .collect()
    }

    /// Append a toast element for `note` to the body.
    pub(crate) fn create_notification(&mut self, note: &Notification) -> Result<HtmlElement> {
        let body = self
            .document
            .body()
            .ok_or_else(|| PagefxError::MissingElement("body".to_string()))?;
        let toast = self.create("div")?;
        toast.set_id(&note.id);
        toast.set_class_name(&format!("notification notification-{}", note.kind.name()));
        toast.style().set_css_text(&format!(
            "position: fixed; top: 20px; right: 20px; background: {}; color: white; \
             padding: 1rem 1.5rem; border-radius: 8px; box-shadow: 0 10px 25px rgba(0, 0, 0, 0.15); \
             display: flex; align-items: center; gap: 0.75rem; z-index: 10000; \
             transform: translateX(400px); transition: transform 0.3s ease; max-width: 400px;",
            note.kind.color()
        ));

        let message = self.document.create_element("span")?;
        message.set_text_content(Some(&note.message));
        toast.append_child(&message)?;

        let close = self.create("button")?;
        close.set_class_name("notification-close");
        close.set_text_content(Some("\u{d7}"));
        toast.append_child(&close)?;

        body.append_child(&toast)?;
        self.bind(&note.id, vec![toast]);
        Ok(close)
    }

    fn create(&self, tag: &str) -> Result<HtmlElement> {
        self.document
            .create_element(tag)?
            .dyn_into::<HtmlElement>()
            .map_err(|_| PagefxError::Dom(format!("<{tag}> is not an HTML element")))
    }

    /// Detach the elements bound to `id` and drop the binding.
    pub(crate) fn remove(&mut self, id: &str) {
        for element in self.elements(id) {
            element.remove();
        }
        self.bound.remove(id);
    }

    fn each(&self, id: &str, mut f: impl FnMut(&HtmlElement) -> std::result::Result<(), wasm_bindgen::JsValue>) {
        for element in self.elements(id) {
            if let Err(e) = f(&element) {
                log::debug!("DOM update on {id} failed: {e:?}");
            }
        }
    }
}

impl PresentationSink for DomSink {
    fn highlight(&mut self, id: &str) {
        self.each(id, |e| e.class_list().add_1(ACTIVE_CLASS));
    }

    fn clear(&mut self, id: &str) {
        self.each(id, |e| e.class_list().remove_1(ACTIVE_CLASS));
    }

    fn set_style(&mut self, id: &str, property: &str, value: &str) {
        self.each(id, |e| e.style().set_property(property, value));
    }

    fn set_text(&mut self, id: &str, text: &str) {
        self.each(id, |e| {
            e.set_text_content(Some(text));
            Ok(())
        });
    }

    fn set_markup(&mut self, id: &str, html: &str) {
        self.each(id, |e| {
            e.set_inner_html(html);
            Ok(())
        });
    }

    fn set_flag(&mut self, id: &str, flag: &str, on: bool) {
        self.each(id, |e| {
            if flag == "disabled" {
                if let Some(button) = e.dyn_ref::<HtmlButtonElement>() {
                    button.set_disabled(on);
                    return Ok(());
                }
            }
            e.class_list().toggle_with_force(flag, on).map(|_| ())
        });
    }
}

/// HTML elements of a node list, in document order.
pub(crate) fn collect(list: &NodeList) -> Vec<HtmlElement> {
    (0..list.length())
        .filter_map(|i| list.item(i))
        .filter_map(|node| node.dyn_into::<HtmlElement>().ok())
        .collect()
}
