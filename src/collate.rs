//! Name ordering used to sort timers.

use std::cmp::Ordering;

/// Locale-aware string comparison supplied by the host.
///
/// Implementations compare with base sensitivity: letter case and diacritics
/// must not affect the result.
pub trait NameCollator {
    fn compare(&self, a: &str, b: &str) -> Ordering;
}

impl<F> NameCollator for F
where
    F: Fn(&str, &str) -> Ordering,
{
    fn compare(&self, a: &str, b: &str) -> Ordering {
        self(a, b)
    }
}

/// Base-sensitivity comparison without a locale database: folds case and the
/// common Latin diacritics, then compares code points.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseCollator;

impl NameCollator for BaseCollator {
    fn compare(&self, a: &str, b: &str) -> Ordering {
        folded(a).cmp(folded(b))
    }
}

fn folded(s: &str) -> impl Iterator<Item = char> + '_ {
    s.chars().flat_map(char::to_lowercase).map(strip_diacritic)
}

fn strip_diacritic(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => 'a',
        'ç' | 'ć' | 'č' => 'c',
        'ď' => 'd',
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' | 'ě' => 'e',
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'į' => 'i',
        'ł' => 'l',
        'ñ' | 'ń' | 'ň' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => 'o',
        'ř' => 'r',
        'ś' | 'š' => 's',
        'ť' => 't',
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' => 'u',
        'ý' | 'ÿ' => 'y',
        'ź' | 'ż' | 'ž' => 'z',
        other => other,
    }
}

/// `String.prototype.localeCompare` with base sensitivity, for the browser.
#[cfg(target_arch = "wasm32")]
pub struct LocaleCollator {
    locales: js_sys::Array,
    options: js_sys::Object,
}

#[cfg(target_arch = "wasm32")]
impl LocaleCollator {
    pub fn new(locale: &str) -> Self {
        use wasm_bindgen::JsValue;

        let locales = js_sys::Array::of1(&JsValue::from_str(locale));
        let options = js_sys::Object::new();
        if js_sys::Reflect::set(&options, &"sensitivity".into(), &"base".into()).is_err() {
            log::warn!("Could not set collator sensitivity, falling back to locale defaults");
        }
        Self { locales, options }
    }
}

#[cfg(target_arch = "wasm32")]
impl NameCollator for LocaleCollator {
    fn compare(&self, a: &str, b: &str) -> Ordering {
        js_sys::JsString::from(a)
            .locale_compare(b, &self.locales, &self.options)
            .cmp(&0)
    }
}
