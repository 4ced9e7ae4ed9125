use std::fmt;
#[cfg(target_arch = "wasm32")]
use {log::warn, wasm_bindgen::prelude::*};

pub mod collate;
pub mod engine;
pub mod model;
pub mod store;

#[cfg(target_arch = "wasm32")]
pub use collate::LocaleCollator;
pub use collate::{BaseCollator, NameCollator};
pub use engine::{
    compute_view, BoardEntry, BoardView, RowView, Section, SelectionCount, TickReport, TimerBoard,
};
pub use model::{parse_config, validate_definitions, PersistedState, TimerDefinition, TimerId, TimerState};
pub use store::{KeyValueStore, MemoryStore, StateStore, StoreError};

#[derive(Debug, Clone, PartialEq)]
pub enum WidgetError {
    /// The configuration request could not be sent or completed.
    ConfigRequest(String),
    /// The configuration endpoint answered with a non-success status.
    ConfigStatus(u16),
    ConfigParse(String),
    InvalidTimer {
        id: TimerId,
        reason: String,
    },
    DuplicateTimer(TimerId),
    UnknownTimer(TimerId),
    /// Every clipboard strategy failed; the user has to copy by hand.
    ClipboardBlocked,
}

impl fmt::Display for WidgetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WidgetError::ConfigRequest(e) => write!(f, "Failed to request timer configuration: {}", e),
            WidgetError::ConfigStatus(status) => write!(
                f,
                "Timer configuration request failed with HTTP status {}",
                status
            ),
            WidgetError::ConfigParse(e) => write!(f, "Malformed timer configuration: {}", e),
            WidgetError::InvalidTimer { id, reason } => {
                write!(f, "Invalid timer '{}': {}", id, reason)
            }
            WidgetError::DuplicateTimer(id) => {
                write!(f, "Timer id '{}' appears more than once", id)
            }
            WidgetError::UnknownTimer(id) => write!(f, "No timer with id '{}'", id),
            WidgetError::ClipboardBlocked => write!(f, "Automatic copy to clipboard was blocked"),
        }
    }
}

impl std::error::Error for WidgetError {}

/// Format a millisecond span as `HHh MMm SSs`, floored to whole seconds.
/// Negative spans display as zero.
pub fn format_countdown(ms: i64) -> String {
    let total_seconds = ms.max(0) / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{:02}h {:02}m {:02}s", hours, minutes, seconds)
}

/// Current wall-clock time in milliseconds since the Unix epoch.
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> i64 {
    js_sys::Date::now() as i64
}

#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

/// Compute the ordered table entries for a host page that renders its own
/// markup, sorted exactly like the widget.
///
/// # Arguments
/// * `config_js` - Array of timer definitions, same shape as the JSON config
/// * `state_js` - Persisted state object (`{ id: {expiresAt, selected}, _filterSelected }`),
///   or `null`/`undefined` for a fresh start
/// * `locale` - Collation locale, e.g. `"fr"`
///
/// # Returns
/// Serialized list of `{kind: "header", section}` and `{kind: "row", ...}`
/// entries, or an error string
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn board_entries(config_js: JsValue, state_js: JsValue, locale: &str) -> JsValue {
    let definitions: Vec<TimerDefinition> = match serde_wasm_bindgen::from_value(config_js) {
        Ok(defs) => defs,
        Err(e) => {
            return serde_wasm_bindgen::to_value(&format!("Failed to deserialize timers: {}", e))
                .unwrap_or(JsValue::NULL);
        }
    };
    if let Err(e) = validate_definitions(&definitions) {
        return serde_wasm_bindgen::to_value(&e.to_string()).unwrap_or(JsValue::NULL);
    }

    let mut persisted: PersistedState = if state_js.is_null() || state_js.is_undefined() {
        PersistedState::default()
    } else {
        serde_wasm_bindgen::from_value(state_js).unwrap_or_else(|e| {
            warn!("Ignoring unreadable timer state: {}", e);
            PersistedState::default()
        })
    };
    persisted.backfill(&definitions);

    let view = compute_view(&definitions, &persisted, &LocaleCollator::new(locale));
    serde_wasm_bindgen::to_value(&view.entries()).unwrap_or(JsValue::NULL)
}
