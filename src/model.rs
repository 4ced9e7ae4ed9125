//! Timer definitions loaded from the remote configuration and the per-timer
//! state persisted between page loads.

use crate::WidgetError;
use log::debug;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Identity of a timer; join key between the configuration and persisted state.
pub type TimerId = String;

const MS_PER_HOUR: f64 = 3_600_000.0;

/// Longest accepted nominal duration: one hundred years.
pub const MAX_DURATION_HOURS: f64 = 100.0 * 365.25 * 24.0;

/// Static description of a timer, as found in the configuration document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerDefinition {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: TimerId,
    pub name: String,
    #[serde(rename = "durationHours")]
    pub duration_hours: f64,
    #[serde(alias = "coordinates", default)]
    pub coords: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
}

impl TimerDefinition {
    /// Nominal run length in milliseconds.
    pub fn duration_ms(&self) -> i64 {
        duration_ms(self.duration_hours)
    }
}

/// Convert a duration in hours to whole milliseconds.
pub fn duration_ms(hours: f64) -> i64 {
    (hours * MS_PER_HOUR).round() as i64
}

// Ids show up as JSON strings or numbers; both become the same string key that
// the persisted object uses.
fn deserialize_id<'de, D>(deserializer: D) -> Result<TimerId, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Integer(i64),
        Float(f64),
        Text(String),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Integer(n) => n.to_string(),
        RawId::Float(n) => n.to_string(),
        RawId::Text(s) => s,
    })
}

/// Parse and validate the configuration document.
///
/// The document must be a JSON array of timer definitions accepted by
/// [`validate_definitions`].
pub fn parse_config(json: &str) -> Result<Vec<TimerDefinition>, WidgetError> {
    let definitions: Vec<TimerDefinition> =
        serde_json::from_str(json).map_err(|e| WidgetError::ConfigParse(e.to_string()))?;
    validate_definitions(&definitions)?;

    debug!("Parsed {} timer definitions", definitions.len());
    Ok(definitions)
}

/// Check that ids are unique and every duration is finite, positive and at
/// most [`MAX_DURATION_HOURS`].
pub fn validate_definitions(definitions: &[TimerDefinition]) -> Result<(), WidgetError> {
    let mut seen = HashSet::with_capacity(definitions.len());
    for def in definitions {
        if !def.duration_hours.is_finite() || def.duration_hours <= 0.0 {
            return Err(WidgetError::InvalidTimer {
                id: def.id.clone(),
                reason: format!("durationHours must be positive, got {}", def.duration_hours),
            });
        }
        if def.duration_hours > MAX_DURATION_HOURS {
            return Err(WidgetError::InvalidTimer {
                id: def.id.clone(),
                reason: format!(
                    "durationHours must not exceed {}, got {}",
                    MAX_DURATION_HOURS, def.duration_hours
                ),
            });
        }
        if !seen.insert(def.id.as_str()) {
            return Err(WidgetError::DuplicateTimer(def.id.clone()));
        }
    }
    Ok(())
}

/// Mutable per-timer state. `expires_at` present means the timer is running.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    /// Expiry instant in milliseconds since the Unix epoch.
    #[serde(
        rename = "expiresAt",
        alias = "endTime",
        default,
        deserialize_with = "deserialize_expiry"
    )]
    pub expires_at: Option<i64>,
    #[serde(default)]
    pub selected: bool,
}

impl TimerState {
    pub fn is_active(&self) -> bool {
        self.expires_at.is_some()
    }

    /// Milliseconds left before expiry, or `None` when inactive.
    pub fn remaining_ms(&self, now_ms: i64) -> Option<i64> {
        self.expires_at
            .map(|expires_at| expires_at.saturating_sub(now_ms))
    }
}

// Older state wrote `Date.now() + hours * 3600 * 1000`, which is fractional for
// most non-integer durations.
fn deserialize_expiry<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?
        .filter(|ms| ms.is_finite())
        .map(|ms| ms.round() as i64))
}

/// Everything written under one storage key: the state table plus the
/// "show only selected" flag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(rename = "_filterSelected", default)]
    pub filter_selected: bool,
    #[serde(flatten)]
    pub timers: BTreeMap<TimerId, TimerState>,
}

impl PersistedState {
    /// Insert default state for every definition lacking an entry.
    /// Returns how many entries were added.
    pub fn backfill(&mut self, definitions: &[TimerDefinition]) -> usize {
        let before = self.timers.len();
        for def in definitions {
            self.timers.entry(def.id.clone()).or_default();
        }
        self.timers.len() - before
    }

    pub fn timer(&self, id: &str) -> Option<&TimerState> {
        self.timers.get(id)
    }

    pub fn timer_mut(&mut self, id: &str) -> Option<&mut TimerState> {
        self.timers.get_mut(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numeric_and_string_ids() {
        let defs = parse_config(
            r#"[
                {"id": 1, "name": "B", "durationHours": 1, "coords": "X"},
                {"id": "north-gate", "name": "a", "durationHours": 2.5, "coordinates": "Y", "info": "respawn"}
            ]"#,
        )
        .unwrap();

        assert_eq!(defs[0].id, "1");
        assert_eq!(defs[0].info, None);
        assert_eq!(defs[1].id, "north-gate");
        assert_eq!(defs[1].coords, "Y");
        assert_eq!(defs[1].info.as_deref(), Some("respawn"));
        assert_eq!(defs[1].duration_ms(), 9_000_000);
    }

    #[test]
    fn rejects_documents_that_are_not_arrays() {
        let err = parse_config(r#"{"id": 1}"#).unwrap_err();
        assert!(matches!(err, WidgetError::ConfigParse(_)));

        let err = parse_config("not json").unwrap_err();
        assert!(matches!(err, WidgetError::ConfigParse(_)));
    }

    #[test]
    fn rejects_non_positive_durations() {
        let err = parse_config(r#"[{"id": 7, "name": "x", "durationHours": 0, "coords": ""}]"#)
            .unwrap_err();
        match err {
            WidgetError::InvalidTimer { id, .. } => assert_eq!(id, "7"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_durations_beyond_a_century() {
        let err = parse_config(r#"[{"id": 1, "name": "x", "durationHours": 1e16, "coords": ""}]"#)
            .unwrap_err();
        assert!(matches!(err, WidgetError::InvalidTimer { id, .. } if id == "1"));

        let defs = parse_config(r#"[{"id": 1, "name": "x", "durationHours": 876000, "coords": ""}]"#)
            .unwrap();
        assert_eq!(defs[0].duration_ms(), 876_000 * 3_600_000);
    }

    #[test]
    fn validates_definitions_built_outside_the_parser() {
        let def = |id: &str, hours: f64| TimerDefinition {
            id: id.to_string(),
            name: "x".to_string(),
            duration_hours: hours,
            coords: String::new(),
            info: None,
        };

        assert!(validate_definitions(&[def("a", 1.0), def("b", 2.0)]).is_ok());
        assert_eq!(
            validate_definitions(&[def("a", 1.0), def("a", 2.0)]),
            Err(WidgetError::DuplicateTimer("a".to_string()))
        );
        assert!(matches!(
            validate_definitions(&[def("big", MAX_DURATION_HOURS * 2.0)]),
            Err(WidgetError::InvalidTimer { id, .. }) if id == "big"
        ));
        assert!(matches!(
            validate_definitions(&[def("nan", f64::NAN)]),
            Err(WidgetError::InvalidTimer { id, .. }) if id == "nan"
        ));
    }

    #[test]
    fn remaining_time_saturates_instead_of_overflowing() {
        let state = TimerState {
            expires_at: Some(i64::MIN + 1),
            selected: false,
        };
        assert_eq!(state.remaining_ms(1_700_000_000_000), Some(i64::MIN));
    }

    #[test]
    fn fractional_legacy_expiry_keeps_the_rest_of_the_state() {
        let raw = r#"{"_filterSelected": true, "1": {"endTime": 1700000360000.0001, "selected": true}, "2": {"selected": true}}"#;
        let state: PersistedState = serde_json::from_str(raw).unwrap();

        assert!(state.filter_selected);
        assert_eq!(state.timer("1").unwrap().expires_at, Some(1_700_000_360_000));
        assert!(state.timer("1").unwrap().selected);
        assert!(state.timer("2").unwrap().selected);
        assert_eq!(state.timer("2").unwrap().expires_at, None);
    }

    #[test]
    fn rejects_duplicate_ids() {
        let err = parse_config(
            r#"[
                {"id": 1, "name": "a", "durationHours": 1, "coords": ""},
                {"id": "1", "name": "b", "durationHours": 1, "coords": ""}
            ]"#,
        )
        .unwrap_err();
        assert!(matches!(err, WidgetError::DuplicateTimer(id) if id == "1"));
    }

    #[test]
    fn persisted_state_keeps_filter_flag_beside_timer_entries() {
        let raw = r#"{"_filterSelected": true, "1": {"expiresAt": 5000, "selected": true}, "2": {"endTime": null, "selected": false}}"#;
        let state: PersistedState = serde_json::from_str(raw).unwrap();

        assert!(state.filter_selected);
        assert_eq!(state.timers.len(), 2);
        assert_eq!(state.timer("1").unwrap().expires_at, Some(5000));
        assert!(!state.timer("2").unwrap().is_active());

        let written = serde_json::to_value(&state).unwrap();
        assert_eq!(written["_filterSelected"], true);
        assert_eq!(written["1"]["expiresAt"], 5000);
        assert!(written["2"]["expiresAt"].is_null());
    }

    #[test]
    fn backfill_only_adds_missing_entries() {
        let defs = parse_config(
            r#"[
                {"id": 1, "name": "a", "durationHours": 1, "coords": ""},
                {"id": 2, "name": "b", "durationHours": 1, "coords": ""}
            ]"#,
        )
        .unwrap();
        let mut state = PersistedState::default();
        state.timers.insert(
            "1".into(),
            TimerState {
                expires_at: Some(42),
                selected: true,
            },
        );

        assert_eq!(state.backfill(&defs), 1);
        assert_eq!(state.timer("1").unwrap().expires_at, Some(42));
        assert_eq!(state.timer("2"), Some(&TimerState::default()));
    }
}
