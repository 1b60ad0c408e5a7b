//! FiddleBops embed crate.
//!
//! Drives the game section of the FiddleBops site from WASM: the cover /
//! load / retry state machine around the game iframe (`embed`), the game
//! configuration and its validation (`config`), the English / Chinese strings
//! the section shows (`i18n`) and the robots.txt / sitemap text (`seo`).
//!
//! Pure logic is native-friendly; only `mount_game` and the `Dom*` /
//! `Browser*` types touch browser APIs.

use std::cell::RefCell;

use log::info;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Event, EventTarget, window};

pub mod config;
pub mod embed;
pub mod error;
pub mod i18n;
pub mod seo;

pub use config::{GameConfig, GameSelectors};
pub use embed::{EmbedStatus, FailureCause, GameEmbedLoader, LoaderMessages, LoaderSettings};
pub use error::{ConfigError, EmbedError};

use embed::{BrowserScheduler, DomSurface, EmbedSurface};

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    console_log::init_with_level(log::Level::Debug).ok();
}

// -----------------------------------------------------------------------------
// Page session
// -----------------------------------------------------------------------------

type PageLoader = GameEmbedLoader<DomSurface, BrowserScheduler>;

thread_local! {
    static LOADER: RefCell<Option<PageLoader>> = const { RefCell::new(None) };
}

// Every DOM and timer callback funnels through here. Callbacks are delivered
// from the event loop, never while the loader is already borrowed.
fn with_loader(f: impl FnOnce(&mut PageLoader)) {
    LOADER.with(|cell| {
        if let Some(loader) = cell.borrow_mut().as_mut() {
            f(loader);
        }
    });
}

fn listen(
    target: &EventTarget,
    event: &str,
    mut handler: impl FnMut(&mut PageLoader) + 'static,
) -> Result<(), EmbedError> {
    let closure = Closure::wrap(Box::new(move |_evt: Event| {
        with_loader(|loader| handler(loader));
    }) as Box<dyn FnMut(_)>);
    target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

fn mount(config_json: Option<String>, lang: Option<String>) -> Result<(), EmbedError> {
    if LOADER.with(|cell| cell.borrow().is_some()) {
        return Err(EmbedError::AlreadyMounted);
    }
    let config = match config_json {
        Some(json) => GameConfig::from_json(&json)?,
        None => GameConfig::default(),
    };
    let lang = lang.as_deref().and_then(i18n::Language::from_code);

    let win = window().ok_or(EmbedError::NoWindow)?;
    let doc = win.document().ok_or(EmbedError::NoDocument)?;
    let surface = DomSurface::query(&doc, &GameSelectors::default())?;

    let mut settings = config.loader_settings(lang);
    if let Some(src) = surface.data_src() {
        settings.target_url = src;
    }

    let start_button = surface.start_button().clone();
    let frame = surface.frame().clone();
    let retry_button = surface.retry_button();
    let (width, height) = surface.dimensions();

    let scheduler = BrowserScheduler::new(win, |id| with_loader(|loader| loader.on_timer(id)));
    info!(
        "mounting {} ({}x{}) -> {}",
        config.id, width, height, settings.target_url
    );
    // Listeners find an empty slot (and do nothing) unless wiring succeeds.
    listen(&start_button, "click", |loader| loader.start())?;
    listen(&frame, "load", |loader| loader.on_load_succeeded())?;
    listen(&frame, "error", |loader| loader.on_load_failed(FailureCause::Generic))?;
    if let Some(button) = retry_button {
        listen(&button, "click", |loader| loader.retry_manually())?;
    }

    LOADER.with(|cell| {
        *cell.borrow_mut() = Some(GameEmbedLoader::new(surface, scheduler, settings));
    });
    Ok(())
}

// -----------------------------------------------------------------------------
// JS entrypoints
// -----------------------------------------------------------------------------

/// Bind the game embed to the page anchors. `config_json` is a serialized
/// `GameConfig` (defaults when absent); `lang` (`"en"` / `"zh"`) switches the
/// loader texts to the translation table.
#[wasm_bindgen]
pub fn mount_game(config_json: Option<String>, lang: Option<String>) -> Result<(), JsValue> {
    mount(config_json, lang).map_err(JsValue::from)
}

/// Forward a failure the page detected itself. Unknown causes count as generic.
#[wasm_bindgen]
pub fn report_load_failure(cause: &str) {
    let cause = FailureCause::from_code(cause).unwrap_or(FailureCause::Generic);
    with_loader(|loader| loader.on_load_failed(cause));
}

#[wasm_bindgen]
pub fn game_status() -> String {
    LOADER.with(|cell| {
        cell.borrow()
            .as_ref()
            .map(|loader| loader.status().as_str())
            .unwrap_or("unmounted")
            .to_string()
    })
}

#[wasm_bindgen]
pub fn robots(site_url: &str) -> Result<String, JsValue> {
    seo::robots_txt(site_url).map_err(|e| JsValue::from(EmbedError::from(e)))
}

#[wasm_bindgen]
pub fn sitemap(site_url: &str) -> Result<String, JsValue> {
    let lastmod = String::from(js_sys::Date::new_0().to_iso_string());
    seo::sitemap_xml(site_url, seo::DEFAULT_PAGES, &lastmod)
        .map_err(|e| JsValue::from(EmbedError::from(e)))
}
