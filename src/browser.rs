//! Browser I/O around the timer engine: configuration fetch, localStorage,
//! clipboard and a console log sink.

use daily_timers::{parse_config, KeyValueStore, StoreError, TimerDefinition, WidgetError};
use js_sys::Reflect;
use log::{debug, warn, Level, LevelFilter, Log, Metadata, Record};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{console, HtmlDocument, HtmlTextAreaElement, Response, Storage};

use crate::config::MANUAL_COPY_MESSAGE;

fn describe(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

// ──────────────────────────────────────────────────────────────────────────────
// Configuration

/// Fetch and parse the timer configuration document.
pub async fn fetch_config(url: &str) -> Result<Vec<TimerDefinition>, WidgetError> {
    let window = gloo_utils::window();
    let response: Response = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(|e| WidgetError::ConfigRequest(describe(&e)))?
        .dyn_into()
        .map_err(|e| WidgetError::ConfigRequest(describe(&e)))?;

    if !response.ok() {
        return Err(WidgetError::ConfigStatus(response.status()));
    }

    let body = response
        .text()
        .map_err(|e| WidgetError::ConfigRequest(describe(&e)))?;
    let text = JsFuture::from(body)
        .await
        .map_err(|e| WidgetError::ConfigRequest(describe(&e)))?
        .as_string()
        .ok_or_else(|| WidgetError::ConfigParse("response body is not text".to_string()))?;

    parse_config(&text)
}

// ──────────────────────────────────────────────────────────────────────────────
// Persistence

/// `window.localStorage`, or nothing when the browser refuses access.
pub struct LocalStorage {
    storage: Option<Storage>,
}

impl LocalStorage {
    pub fn open() -> Self {
        let storage = gloo_utils::window().local_storage().ok().flatten();
        if storage.is_none() {
            warn!("localStorage is unavailable, timer state will not survive a reload");
        }
        Self { storage }
    }
}

impl KeyValueStore for LocalStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.storage.as_ref()?.get_item(key).ok().flatten()
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let storage = self.storage.as_ref().ok_or(StoreError::Unavailable)?;
        storage
            .set_item(key, value)
            .map_err(|e| StoreError::Write(describe(&e)))
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Clipboard

/// How a copy succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyMethod {
    AsyncClipboard,
    SelectionCommand,
}

/// Put `text` on the clipboard: the async Clipboard API first, then a hidden
/// textarea with `execCommand("copy")`. When both fail the user is alerted
/// with the text so it can be copied by hand.
pub async fn copy_text(text: &str) -> Result<CopyMethod, WidgetError> {
    match write_with_clipboard_api(text).await {
        Ok(()) => return Ok(CopyMethod::AsyncClipboard),
        Err(e) => debug!("Clipboard API unavailable: {}", describe(&e)),
    }

    match write_with_selection(text) {
        Ok(()) => return Ok(CopyMethod::SelectionCommand),
        Err(e) => debug!("Selection copy failed: {}", describe(&e)),
    }

    let message = format!("{}\n\n{}", MANUAL_COPY_MESSAGE, text);
    if gloo_utils::window().alert_with_message(&message).is_err() {
        warn!("Could not show the manual copy alert");
    }
    Err(WidgetError::ClipboardBlocked)
}

async fn write_with_clipboard_api(text: &str) -> Result<(), JsValue> {
    let window = gloo_utils::window();
    if !window.is_secure_context() {
        return Err(JsValue::from_str("not a secure context"));
    }
    let navigator = window.navigator();
    if !Reflect::has(&navigator, &"clipboard".into())? {
        return Err(JsValue::from_str("navigator.clipboard is missing"));
    }
    JsFuture::from(navigator.clipboard().write_text(text)).await?;
    Ok(())
}

fn write_with_selection(text: &str) -> Result<(), JsValue> {
    let document = gloo_utils::document();
    let body = document
        .body()
        .ok_or_else(|| JsValue::from_str("document has no body"))?;

    let area: HtmlTextAreaElement = document.create_element("textarea")?.dyn_into()?;
    area.set_value(text);
    area.set_attribute("readonly", "")?;
    let style = area.style();
    style.set_property("position", "fixed")?;
    style.set_property("top", "-1000px")?;
    style.set_property("opacity", "0")?;

    body.append_child(&area)?;
    area.select();
    let copied = document
        .dyn_ref::<HtmlDocument>()
        .ok_or_else(|| JsValue::from_str("document is not an HTML document"))
        .and_then(|html| html.exec_command("copy"));
    body.remove_child(&area)?;

    match copied? {
        true => Ok(()),
        false => Err(JsValue::from_str("copy command was rejected")),
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Logging

struct ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = JsValue::from_str(&format!("[{}] {}", record.target(), record.args()));
        match record.level() {
            Level::Error => console::error_1(&line),
            Level::Warn => console::warn_1(&line),
            Level::Info => console::info_1(&line),
            Level::Debug | Level::Trace => console::debug_1(&line),
        }
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger;

/// Route `log` records to the browser console.
pub fn init_logging(level: LevelFilter) {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}
