//! Page Surface
//!
//! The dashboard page is rendered by the backend; this client only patches
//! a handful of elements by id. [`UiSurface`] is that access path and
//! [`PageHost`] covers the page-level side effects (reload, download,
//! clipboard).
//! [`BrowserDocument`] implements both on top of `web_sys`.

use futures::future::LocalBoxFuture;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Blob, BlobPropertyBag, Document, Element, HtmlAnchorElement, Url};

use crate::client::ExportFile;

/// Page host errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HostError {
    #[error("No document available")]
    NoDocument,

    #[error("No browser window available")]
    NoWindow,

    #[error("Browser API failed: {0}")]
    Js(String),
}

impl From<JsValue> for HostError {
    fn from(value: JsValue) -> Self {
        HostError::Js(format!("{:?}", value))
    }
}

/// Element access by id
///
/// Every method is a no-op returning `false`/`None` when the element is not
/// on the page.
pub trait UiSurface {
    /// Trimmed text content of `id`
    fn text(&self, id: &str) -> Option<String>;

    fn set_text(&self, id: &str, text: &str) -> bool;

    fn set_html(&self, id: &str, html: &str) -> bool;

    fn set_title(&self, id: &str, title: &str) -> bool;

    fn add_class(&self, id: &str, class: &str) -> bool;

    fn remove_class(&self, id: &str, class: &str) -> bool;
}

/// Page-level side effects
pub trait PageHost {
    /// Reload the current page
    fn reload(&self);

    /// Offer `file` to the user as a download
    fn download(&self, file: &ExportFile) -> Result<(), HostError>;

    /// Put `text` on the system clipboard
    fn copy_to_clipboard(&self, text: &str) -> LocalBoxFuture<'static, Result<(), HostError>>;
}

/// [`UiSurface`] and [`PageHost`] for the current browser document
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserDocument;

impl BrowserDocument {
    fn document() -> Option<Document> {
        web_sys::window().and_then(|w| w.document())
    }

    fn element(id: &str) -> Option<Element> {
        Self::document().and_then(|d| d.get_element_by_id(id))
    }

    /// Origin of the current page (e.g. "http://localhost:8080")
    pub fn origin() -> Option<String> {
        web_sys::window().and_then(|w| w.location().origin().ok())
    }

    /// Host (with port) of the current page
    pub fn host() -> Option<String> {
        web_sys::window().and_then(|w| w.location().host().ok())
    }

    /// Whether the page is currently in the background
    pub fn is_hidden() -> bool {
        Self::document().map(|d| d.hidden()).unwrap_or(false)
    }
}

impl UiSurface for BrowserDocument {
    fn text(&self, id: &str) -> Option<String> {
        Self::element(id).map(|el| el.text_content().unwrap_or_default().trim().to_string())
    }

    fn set_text(&self, id: &str, text: &str) -> bool {
        Self::element(id)
            .map(|el| el.set_text_content(Some(text)))
            .is_some()
    }

    fn set_html(&self, id: &str, html: &str) -> bool {
        Self::element(id).map(|el| el.set_inner_html(html)).is_some()
    }

    fn set_title(&self, id: &str, title: &str) -> bool {
        Self::element(id)
            .map(|el| el.set_attribute("title", title).is_ok())
            .unwrap_or(false)
    }

    fn add_class(&self, id: &str, class: &str) -> bool {
        Self::element(id)
            .map(|el| el.class_list().add_1(class).is_ok())
            .unwrap_or(false)
    }

    fn remove_class(&self, id: &str, class: &str) -> bool {
        Self::element(id)
            .map(|el| el.class_list().remove_1(class).is_ok())
            .unwrap_or(false)
    }
}

impl PageHost for BrowserDocument {
    fn reload(&self) {
        if let Some(window) = web_sys::window() {
            if let Err(e) = window.location().reload() {
                tracing::error!("Page reload failed: {:?}", e);
            }
        }
    }

    fn download(&self, file: &ExportFile) -> Result<(), HostError> {
        let document = Self::document().ok_or(HostError::NoDocument)?;

        let parts = js_sys::Array::new();
        parts.push(&js_sys::Uint8Array::from(file.bytes.as_slice()));
        let options = BlobPropertyBag::new();
        options.set_type(&file.mime_type);
        let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options)?;

        let url = Url::create_object_url_with_blob(&blob)?;
        let anchor: HtmlAnchorElement = document
            .create_element("a")?
            .dyn_into()
            .map_err(|_| HostError::Js("created element is not an anchor".to_string()))?;
        anchor.set_href(&url);
        anchor.set_download(&file.filename);
        anchor.click();
        Url::revoke_object_url(&url)?;

        Ok(())
    }

    fn copy_to_clipboard(&self, text: &str) -> LocalBoxFuture<'static, Result<(), HostError>> {
        let pending = web_sys::window().map(|window| window.navigator().clipboard().write_text(text));
        Box::pin(async move {
            let promise = pending.ok_or(HostError::NoWindow)?;
            JsFuture::from(promise).await?;
            Ok(())
        })
    }
}
