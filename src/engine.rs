//! Render and tick engine for one widget instance.
//!
//! [`compute_view`] is a pure function from (definitions, persisted state,
//! collator) to the ordered list of entries to display. [`TimerBoard`] wraps it
//! with the command handlers that mutate state, persist it and expire timers
//! on every tick.

use crate::collate::NameCollator;
use crate::format_countdown;
use crate::model::{PersistedState, TimerDefinition, TimerId, TimerState};
use crate::store::{KeyValueStore, StateStore};
use crate::WidgetError;
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::BTreeMap;

/// The two partitions of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Active,
    Inactive,
}

/// Display data for a single timer row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowView {
    pub id: TimerId,
    pub name: String,
    pub info: Option<String>,
    pub coords: String,
    pub duration_ms: i64,
    pub active: bool,
    pub selected: bool,
}

impl RowView {
    fn new(def: &TimerDefinition, state: &TimerState) -> Self {
        Self {
            id: def.id.clone(),
            name: def.name.clone(),
            info: def.info.clone(),
            coords: def.coords.clone(),
            duration_ms: def.duration_ms(),
            active: state.is_active(),
            selected: state.selected,
        }
    }
}

/// One line of the rendered table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BoardEntry {
    Header { section: Section },
    Row(RowView),
}

/// Selected timers over all configured timers, regardless of the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SelectionCount {
    pub selected: usize,
    pub total: usize,
}

/// Sorted, filtered rows of both sections.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardView {
    pub active: Vec<RowView>,
    pub inactive: Vec<RowView>,
    pub selection: SelectionCount,
    pub filter_selected: bool,
}

impl BoardView {
    /// Rows in display order, each section preceded by its header. A header is
    /// only emitted when its section has rows to show.
    pub fn entries(&self) -> Vec<BoardEntry> {
        let mut entries = Vec::with_capacity(self.active.len() + self.inactive.len() + 2);
        for (section, rows) in [
            (Section::Active, &self.active),
            (Section::Inactive, &self.inactive),
        ] {
            if rows.is_empty() {
                continue;
            }
            entries.push(BoardEntry::Header { section });
            entries.extend(rows.iter().cloned().map(BoardEntry::Row));
        }
        entries
    }
}

/// Partition, sort and filter the timers.
///
/// Active timers sort by name. Inactive timers sort selected-first, then by
/// name. With the filter on, unselected inactive timers are left out.
pub fn compute_view<C>(
    definitions: &[TimerDefinition],
    persisted: &PersistedState,
    collator: &C,
) -> BoardView
where
    C: NameCollator + ?Sized,
{
    let fallback = TimerState::default();
    let mut active = Vec::new();
    let mut inactive = Vec::new();

    for def in definitions {
        let state = persisted.timer(&def.id).unwrap_or(&fallback);
        if state.is_active() {
            active.push(RowView::new(def, state));
        } else {
            inactive.push(RowView::new(def, state));
        }
    }

    active.sort_by(|a, b| collator.compare(&a.name, &b.name));
    inactive.sort_by(|a, b| {
        b.selected
            .cmp(&a.selected)
            .then_with(|| collator.compare(&a.name, &b.name))
    });

    let selected = inactive.iter().chain(&active).filter(|r| r.selected).count();
    let filter_selected = persisted.filter_selected;
    if filter_selected {
        inactive.retain(|row| row.selected);
    }

    BoardView {
        active,
        inactive,
        selection: SelectionCount {
            selected,
            total: definitions.len(),
        },
        filter_selected,
    }
}

/// Outcome of one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Countdown text for every configured timer.
    pub countdowns: BTreeMap<TimerId, String>,
    /// Timers that expired during this tick.
    pub expired: Vec<TimerId>,
}

impl TickReport {
    /// Expiry moved at least one row to the inactive section.
    pub fn needs_render(&self) -> bool {
        !self.expired.is_empty()
    }
}

/// One widget instance: the loaded configuration, its state store and the
/// collator used to order names.
#[derive(Debug)]
pub struct TimerBoard<S, C> {
    definitions: Vec<TimerDefinition>,
    store: StateStore<S>,
    collator: C,
}

impl<S, C> TimerBoard<S, C>
where
    S: KeyValueStore,
    C: NameCollator,
{
    pub fn new(
        definitions: Vec<TimerDefinition>,
        backend: S,
        storage_key: impl Into<String>,
        collator: C,
    ) -> Self {
        let store = StateStore::load(backend, storage_key, &definitions);
        Self {
            definitions,
            store,
            collator,
        }
    }

    pub fn definitions(&self) -> &[TimerDefinition] {
        &self.definitions
    }

    pub fn state(&self, id: &str) -> Option<&TimerState> {
        self.store.state().timer(id)
    }

    pub fn filter_selected(&self) -> bool {
        self.store.state().filter_selected
    }

    pub fn view(&self) -> BoardView {
        compute_view(&self.definitions, self.store.state(), &self.collator)
    }

    pub fn selection_count(&self) -> SelectionCount {
        let selected = self
            .definitions
            .iter()
            .filter(|def| self.state(&def.id).is_some_and(|s| s.selected))
            .count();
        SelectionCount {
            selected,
            total: self.definitions.len(),
        }
    }

    /// Start or stop a timer. Starting sets the expiry to `now_ms` plus the
    /// nominal duration; stopping clears it.
    pub fn set_active(&mut self, id: &str, active: bool, now_ms: i64) -> Result<(), WidgetError> {
        let duration = self.definition(id)?.duration_ms();
        let state = self.state_mut(id)?;
        state.expires_at = active.then_some(now_ms.saturating_add(duration));
        debug!("Timer '{}' active={} expires_at={:?}", id, active, state.expires_at);
        self.persist();
        Ok(())
    }

    /// Flip the active flag, returning the new value.
    pub fn toggle_active(&mut self, id: &str, now_ms: i64) -> Result<bool, WidgetError> {
        let active = !self.state_mut(id)?.is_active();
        self.set_active(id, active, now_ms)?;
        Ok(active)
    }

    pub fn set_selected(&mut self, id: &str, selected: bool) -> Result<(), WidgetError> {
        self.definition(id)?;
        self.state_mut(id)?.selected = selected;
        self.persist();
        Ok(())
    }

    /// Flip the selected flag, returning the new value.
    pub fn toggle_selected(&mut self, id: &str) -> Result<bool, WidgetError> {
        let selected = !self.state_mut(id)?.selected;
        self.set_selected(id, selected)?;
        Ok(selected)
    }

    pub fn set_filter(&mut self, filter_selected: bool) {
        self.store.state_mut().filter_selected = filter_selected;
        self.persist();
    }

    /// Countdown text for one timer: the remaining time when active, the full
    /// duration otherwise.
    pub fn countdown(&self, id: &str, now_ms: i64) -> Option<String> {
        let def = self.definitions.iter().find(|def| def.id == id)?;
        let state = self.state(id)?;
        Some(countdown_text(def, state, now_ms))
    }

    /// Recompute every countdown and expire timers whose time has elapsed.
    /// Expired timers are persisted before returning.
    pub fn tick(&mut self, now_ms: i64) -> TickReport {
        let mut report = TickReport::default();
        let state = self.store.state_mut();

        for def in &self.definitions {
            let timer = state.timers.entry(def.id.clone()).or_default();
            if timer.remaining_ms(now_ms).is_some_and(|remaining| remaining <= 0) {
                timer.expires_at = None;
                report.expired.push(def.id.clone());
            }
            report
                .countdowns
                .insert(def.id.clone(), countdown_text(def, timer, now_ms));
        }

        if report.needs_render() {
            info!("Timers expired: {}", report.expired.join(", "));
            self.persist();
        }
        report
    }

    fn definition(&self, id: &str) -> Result<&TimerDefinition, WidgetError> {
        self.definitions
            .iter()
            .find(|def| def.id == id)
            .ok_or_else(|| WidgetError::UnknownTimer(id.to_string()))
    }

    fn state_mut(&mut self, id: &str) -> Result<&mut TimerState, WidgetError> {
        self.store
            .state_mut()
            .timer_mut(id)
            .ok_or_else(|| WidgetError::UnknownTimer(id.to_string()))
    }

    // In-memory state stays authoritative when the write fails.
    fn persist(&mut self) {
        if let Err(e) = self.store.save() {
            warn!("Could not persist state under '{}': {}", self.store.key(), e);
        }
    }
}

fn countdown_text(def: &TimerDefinition, state: &TimerState, now_ms: i64) -> String {
    format_countdown(state.remaining_ms(now_ms).unwrap_or_else(|| def.duration_ms()))
}
