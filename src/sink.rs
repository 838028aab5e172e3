//! Write-only presentation interface.
//!
//! State machines describe what the page should show by issuing commands keyed
//! by element identifier. They never read rendered state back. The browser
//! adapter maps identifiers to DOM elements; [`MemorySink`] records the
//! resulting page state for tests and the native build.

use std::collections::{BTreeMap, BTreeSet};

/// Receiver of presentation commands.
pub trait PresentationSink {
    /// Mark `id` as the highlighted (`active`) entry.
    fn highlight(&mut self, id: &str);

    /// Remove the highlighted mark from `id`.
    fn clear(&mut self, id: &str);

    /// Set an inline style property (CSS custom properties included).
    fn set_style(&mut self, _id: &str, _property: &str, _value: &str) {}

    /// Replace the text content.
    fn set_text(&mut self, _id: &str, _text: &str) {}

    /// Replace the content with markup previously read from the same element.
    /// Sinks without a markup notion fall back to [`PresentationSink::set_text`].
    fn set_markup(&mut self, id: &str, html: &str) {
        self.set_text(id, html);
    }

    /// Toggle a state flag such as `hidden`, `scrolled` or `disabled`.
    fn set_flag(&mut self, _id: &str, _flag: &str, _on: bool) {}
}

/// A single recorded command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Highlight(String),
    Clear(String),
    Style {
        id: String,
        property: String,
        value: String,
    },
    Text {
        id: String,
        text: String,
    },
    Markup {
        id: String,
        html: String,
    },
    Flag {
        id: String,
        flag: String,
        on: bool,
    },
}

/// In-memory sink keeping both the command log and the resulting state.
#[derive(Debug, Default)]
pub struct MemorySink {
    log: Vec<Command>,
    highlighted: BTreeSet<String>,
    styles: BTreeMap<(String, String), String>,
    texts: BTreeMap<String, String>,
    flags: BTreeSet<(String, String)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[Command] {
        &self.log
    }

    /// Drop the command log, keeping the current state.
    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.log)
    }

    pub fn is_highlighted(&self, id: &str) -> bool {
        self.highlighted.contains(id)
    }

    /// Highlighted identifiers in sorted order.
    pub fn highlighted(&self) -> Vec<&str> {
        self.highlighted.iter().map(String::as_str).collect()
    }

    pub fn style(&self, id: &str, property: &str) -> Option<&str> {
        self.styles
            .get(&(id.to_string(), property.to_string()))
            .map(String::as_str)
    }

    /// Current content of `id`, whether written as text or markup.
    pub fn text(&self, id: &str) -> Option<&str> {
        self.texts.get(id).map(String::as_str)
    }

    pub fn has_flag(&self, id: &str, flag: &str) -> bool {
        self.flags.contains(&(id.to_string(), flag.to_string()))
    }
}

impl PresentationSink for MemorySink {
    fn highlight(&mut self, id: &str) {
        self.highlighted.insert(id.to_string());
        self.log.push(Command::Highlight(id.to_string()));
    }

    fn clear(&mut self, id: &str) {
        self.highlighted.remove(id);
        self.log.push(Command::Clear(id.to_string()));
    }

    fn set_style(&mut self, id: &str, property: &str, value: &str) {
        self.styles
            .insert((id.to_string(), property.to_string()), value.to_string());
        self.log.push(Command::Style {
            id: id.to_string(),
            property: property.to_string(),
            value: value.to_string(),
        });
    }

    fn set_text(&mut self, id: &str, text: &str) {
        self.texts.insert(id.to_string(), text.to_string());
        self.log.push(Command::Text {
            id: id.to_string(),
            text: text.to_string(),
        });
    }

    fn set_markup(&mut self, id: &str, html: &str) {
        self.texts.insert(id.to_string(), html.to_string());
        self.log.push(Command::Markup {
            id: id.to_string(),
            html: html.to_string(),
        });
    }

    fn set_flag(&mut self, id: &str, flag: &str, on: bool) {
        let key = (id.to_string(), flag.to_string());
        if on {
            self.flags.insert(key);
        } else {
            self.flags.remove(&key);
        }
        self.log.push(Command::Flag {
            id: id.to_string(),
            flag: flag.to_string(),
            on,
        });
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
    fn test_memory_sink_tracks_state() {
        let mut sink = MemorySink::new();
        sink.highlight("a");
        sink.highlight("b");
        sink.clear("a");
        sink.set_style("bar", "width", "40%");
        sink.set_flag("nav", "scrolled", true);

        assert_eq!(sink.highlighted(), vec!["b"]);
        assert_eq!(sink.style("bar", "width"), Some("40%"));
        assert!(sink.has_flag("nav", "scrolled"));
        assert_eq!(sink.commands().len(), 5);

        sink.set_flag("nav", "scrolled", false);
        assert!(!sink.has_flag("nav", "scrolled"));
        assert_eq!(sink.take_commands().len(), 6);
        assert!(sink.commands().is_empty());
        assert!(sink.is_highlighted("b"));
    }

    #[test]
    fn test_markup_replaces_text() {
        let mut sink = MemorySink::new();
        sink.set_text("button", "Sending...");
        sink.set_markup("button", "<i class=\"icon\"></i> Send");
        assert_eq!(sink.text("button"), Some("<i class=\"icon\"></i> Send"));
        assert_eq!(
            sink.commands().last(),
            Some(&Command::Markup {
                id: "button".to_string(),
                html: "<i class=\"icon\"></i> Send".to_string(),
            })
        );
    }

    #[test]
    fn test_markup_defaults_to_text() {
        struct TextOnly(Vec<String>);
        impl PresentationSink for TextOnly {
            fn highlight(&mut self, _id: &str) {}
            fn clear(&mut self, _id: &str) {}
            fn set_text(&mut self, _id: &str, text: &str) {
                self.0.push(text.to_string());
            }
        }

        let mut sink = TextOnly(Vec::new());
        sink.set_markup("button", "<b>Go</b>");
        assert_eq!(sink.0, vec!["<b>Go</b>"]);
    }
}
