//! Widget configuration: constants plus the per-instance settings read from the
//! host container's data attributes.

use log::{warn, LevelFilter};
use web_sys::Element;

// Timing
pub const TICK_INTERVAL_MS: u32 = 1_000;
pub const COPY_FEEDBACK_MS: u32 = 1_500;

// Host contract
pub const CONTAINER_SELECTOR: &str = "[data-timers-config]";
pub const CONFIG_URL_ATTR: &str = "data-timers-config";
pub const STORAGE_KEY_ATTR: &str = "data-storage-key";
pub const LOCALE_ATTR: &str = "data-locale";

// Defaults
pub const DEFAULT_STORAGE_KEY: &str = "daily-timers";
// Name ordering only; labels below stay English whatever the locale.
pub const DEFAULT_LOCALE: &str = "fr";
pub const LOG_LEVEL: LevelFilter = LevelFilter::Info;

// Labels
pub const ACTIVE_SECTION_LABEL: &str = "Active timers";
pub const INACTIVE_SECTION_LABEL: &str = "Inactive timers";
pub const ACTIVE_BADGE_LABEL: &str = "Active";
pub const INFO_ICON: &str = " 🛈";
pub const COPY_LABEL: &str = "Copy";
pub const COPIED_LABEL: &str = "Copied ✔";
pub const FILTER_LABEL: &str = "Show only selected";
pub const SELECTION_LABEL: &str = "Selected";
pub const LOADING_MESSAGE: &str = "Loading timers…";
pub const CONFIG_ERROR_MESSAGE: &str = "Could not load the timer configuration";
pub const MANUAL_COPY_MESSAGE: &str = "Automatic copy was blocked. Copy this text manually:";

// Table layout
pub const TABLE_COLUMNS: u32 = 4;

/// Settings of one widget instance.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetSettings {
    pub config_url: String,
    pub storage_key: String,
    pub locale: String,
}

impl WidgetSettings {
    /// Read the settings from a container element. Returns `None` when the
    /// configuration URL is missing or empty.
    pub fn from_container(container: &Element) -> Option<Self> {
        let config_url = container
            .get_attribute(CONFIG_URL_ATTR)
            .filter(|url| !url.trim().is_empty())?;

        let storage_key = container
            .get_attribute(STORAGE_KEY_ATTR)
            .filter(|key| !key.trim().is_empty())
            .unwrap_or_else(|| {
                warn!(
                    "Container for '{}' has no {}, using '{}'",
                    config_url, STORAGE_KEY_ATTR, DEFAULT_STORAGE_KEY
                );
                DEFAULT_STORAGE_KEY.to_string()
            });

        let locale = container
            .get_attribute(LOCALE_ATTR)
            .filter(|locale| !locale.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOCALE.to_string());

        Some(Self {
            config_url,
            storage_key,
            locale,
        })
    }
}
