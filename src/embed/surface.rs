//! The embedding surface: cover, game frame, loading text and error panel.

use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, HtmlIFrameElement};

use crate::config::GameSelectors;
use crate::error::EmbedError;

/// Everything the loader is allowed to do to the page.
pub trait EmbedSurface {
    fn hide_cover(&mut self);
    /// Point the frame at `url`; any in-flight load is abandoned.
    fn set_source(&mut self, url: &str);
    fn show_frame(&mut self);
    fn hide_frame(&mut self);
    fn show_loading(&mut self, message: &str);
    fn hide_loading(&mut self);
    fn show_error(&mut self, message: &str);
    fn hide_error(&mut self);
    /// Rendered (width, height) of the frame in CSS pixels.
    fn dimensions(&self) -> (u32, u32);
}

/// `EmbedSurface` over the real page anchors.
pub struct DomSurface {
    wrapper: HtmlElement,
    frame: HtmlIFrameElement,
    error: HtmlElement,
    cover: HtmlElement,
    start_button: HtmlElement,
}

enum QueryRoot<'a> {
    Document(&'a Document),
    Element(&'a Element),
}

fn query(
    root: &QueryRoot<'_>,
    name: &'static str,
    selector: &str,
) -> Result<Element, EmbedError> {
    let found = match root {
        QueryRoot::Document(doc) => doc.query_selector(selector)?,
        QueryRoot::Element(el) => el.query_selector(selector)?,
    };
    found.ok_or_else(|| EmbedError::MissingAnchor {
        name,
        selector: selector.to_string(),
    })
}

fn html(el: Element, name: &'static str) -> Result<HtmlElement, EmbedError> {
    el.dyn_into::<HtmlElement>()
        .map_err(|_| EmbedError::WrongElement { name, expected: "html" })
}

impl DomSurface {
    /// Resolve the five anchors. Frame and error panel live inside the
    /// wrapper; cover and start control are looked up page-wide.
    pub fn query(doc: &Document, selectors: &GameSelectors) -> Result<Self, EmbedError> {
        let wrapper = query(&QueryRoot::Document(doc), "wrapper", &selectors.wrapper)?;
        let inside = QueryRoot::Element(&wrapper);
        let frame = query(&inside, "iframe", &selectors.iframe)?
            .dyn_into::<HtmlIFrameElement>()
            .map_err(|_| EmbedError::WrongElement {
                name: "iframe",
                expected: "iframe",
            })?;
        let error = html(query(&inside, "error message", &selectors.error)?, "error message")?;
        let cover = html(query(&QueryRoot::Document(doc), "cover", &selectors.cover)?, "cover")?;
        let start_button = html(
            query(&QueryRoot::Document(doc), "start button", &selectors.start_button)?,
            "start button",
        )?;
        Ok(Self {
            wrapper: html(wrapper, "wrapper")?,
            frame,
            error,
            cover,
            start_button,
        })
    }

    pub fn frame(&self) -> &HtmlIFrameElement {
        &self.frame
    }

    pub fn start_button(&self) -> &HtmlElement {
        &self.start_button
    }

    /// Manual retry control inside the error panel, if the page renders one.
    pub fn retry_button(&self) -> Option<Element> {
        self.error.query_selector("button").ok().flatten()
    }

    /// `data-src` on the frame overrides the configured game url.
    pub fn data_src(&self) -> Option<String> {
        self.frame.dataset().get("src").filter(|s| !s.is_empty())
    }

    fn loading_text(&self) -> Option<Element> {
        self.wrapper.query_selector(".loading-message").ok().flatten()
    }

    fn error_text(&self) -> Option<Element> {
        self.error.query_selector("p").ok().flatten()
    }
}

// Style writes only fail on a read-only declaration.
fn set_style(el: &HtmlElement, prop: &str, value: &str) {
    el.style().set_property(prop, value).ok();
}

impl EmbedSurface for DomSurface {
    fn hide_cover(&mut self) {
        self.cover.dataset().set("visible", "false").ok();
    }

    fn set_source(&mut self, url: &str) {
        self.frame.set_src(url);
    }

    fn show_frame(&mut self) {
        set_style(&self.frame, "visibility", "visible");
    }

    fn hide_frame(&mut self) {
        set_style(&self.frame, "visibility", "hidden");
    }

    fn show_loading(&mut self, message: &str) {
        if let Some(el) = self.loading_text() {
            el.set_text_content(Some(message));
            if let Some(el) = el.dyn_ref::<HtmlElement>() {
                set_style(el, "display", "block");
            }
        }
    }

    fn hide_loading(&mut self) {
        if let Some(el) = self.loading_text().and_then(|el| el.dyn_into::<HtmlElement>().ok()) {
            set_style(&el, "display", "none");
        }
    }

    fn show_error(&mut self, message: &str) {
        if let Some(el) = self.error_text() {
            el.set_text_content(Some(message));
        }
        set_style(&self.error, "display", "block");
    }

    fn hide_error(&mut self) {
        set_style(&self.error, "display", "none");
    }

    fn dimensions(&self) -> (u32, u32) {
        (
            self.frame.client_width().max(0) as u32,
            self.frame.client_height().max(0) as u32,
        )
    }
}
