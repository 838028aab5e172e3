//! Structured error types for pagefx.
//!
//! Every feature initializes independently; an error here disables one feature
//! and is logged, it never aborts the rest of the page.

/// All errors that can occur while wiring up or driving the page.
#[derive(Debug, thiserror::Error)]
pub enum PagefxError {
    /// An optional page element was not found.
    #[error("Missing element: {0}")]
    MissingElement(String),

    /// A DOM call failed.
    #[error("DOM error: {0}")]
    Dom(String),

    /// Configuration JSON could not be decoded.
    #[error("Config decode: {0}")]
    Config(#[from] serde_json::Error),

    /// Configuration decoded but holds unusable values.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// The submission collaborator rejected a form.
    #[error("Submission failed: {0}")]
    Submission(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PagefxError>;

#[cfg(target_arch = "wasm32")]
impl From<PagefxError> for wasm_bindgen::JsValue {
    fn from(e: PagefxError) -> Self {
        wasm_bindgen::JsValue::from_str(&e.to_string())
    }
}

#[cfg(target_arch = "wasm32")]
impl From<wasm_bindgen::JsValue> for PagefxError {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        Self::Dom(value.as_string().unwrap_or_else(|| format!("{value:?}")))
    }
}
