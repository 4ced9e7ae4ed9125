//! View components for the timer table.
//!
//! Rows only render what they are given; state changes go back to the widget
//! through callbacks carrying the timer id.

use crate::browser::copy_text;
use crate::config::*;
use daily_timers::{BoardEntry, RowView, Section, SelectionCount, TimerId};
use gloo_timers::callback::Timeout;
use log::{debug, warn};
use std::collections::BTreeMap;
use web_sys::HtmlInputElement;
use yew::prelude::*;

/// A checkbox change carrying the timer id and the new checked value.
pub type TimerToggle = Callback<(TimerId, bool)>;

fn section_label(section: Section) -> &'static str {
    match section {
        Section::Active => ACTIVE_SECTION_LABEL,
        Section::Inactive => INACTIVE_SECTION_LABEL,
    }
}

fn checkbox_callback(id: &TimerId, callback: &TimerToggle) -> Callback<Event> {
    let id = id.clone();
    let callback = callback.clone();
    Callback::from(move |e: Event| {
        let input: HtmlInputElement = e.target_unchecked_into();
        callback.emit((id.clone(), input.checked()));
    })
}

/// Render the table body entries. Every child is keyed so rows keep their own
/// component state (e.g. the copy feedback) when they move between sections.
pub fn render_entries(
    entries: &[BoardEntry],
    countdowns: &BTreeMap<TimerId, String>,
    on_select: &TimerToggle,
    on_activate: &TimerToggle,
) -> Html {
    entries
        .iter()
        .map(|entry| match entry {
            BoardEntry::Header { section } => html! {
                <tr key={format!("header-{:?}", section)}>
                    <td class="section-header" colspan={TABLE_COLUMNS.to_string()}>
                        { section_label(*section) }
                    </td>
                </tr>
            },
            BoardEntry::Row(row) => {
                let countdown = countdowns.get(&row.id).cloned().unwrap_or_default();
                html! {
                    <TimerRow
                        key={row.id.clone()}
                        row={row.clone()}
                        countdown={AttrValue::from(countdown)}
                        on_select={on_select.clone()}
                        on_activate={on_activate.clone()}
                    />
                }
            }
        })
        .collect::<Html>()
}

/// A single message spanning the whole table width.
pub fn render_message_row(class: &'static str, message: &'static str) -> Html {
    html! {
        <tr>
            <td class={class} colspan={TABLE_COLUMNS.to_string()}>{ message }</td>
        </tr>
    }
}

#[derive(Properties, PartialEq)]
pub struct TimerRowProps {
    pub row: RowView,
    pub countdown: AttrValue,
    pub on_select: TimerToggle,
    pub on_activate: TimerToggle,
}

/// Select box, name (with info tooltip and active badge), active toggle with
/// countdown, and copy button.
#[function_component(TimerRow)]
pub fn timer_row(props: &TimerRowProps) -> Html {
    let row = &props.row;

    html! {
        <tr data-id={row.id.clone()} class={classes!(row.active.then_some("active-row"))}>
            <td>
                <input type="checkbox"
                    checked={row.selected}
                    onchange={checkbox_callback(&row.id, &props.on_select)}
                />
            </td>
            <td>
                <div class="name-wrapper">
                    <span>{ row.name.clone() }</span>
                    if let Some(info) = &row.info {
                        <span class="info-icon">
                            { INFO_ICON }
                            <span class="info-tooltip">{ info.clone() }</span>
                        </span>
                    }
                    if row.active {
                        <span class="badge-active">{ ACTIVE_BADGE_LABEL }</span>
                    }
                </div>
            </td>
            <td class="control-cell">
                <div class="control-wrapper">
                    <input type="checkbox"
                        checked={row.active}
                        onchange={checkbox_callback(&row.id, &props.on_activate)}
                    />
                    <span class="counter">{ props.countdown.clone() }</span>
                </div>
            </td>
            <td>
                <CopyButton text={AttrValue::from(row.coords.clone())} />
            </td>
        </tr>
    }
}

#[derive(Properties, PartialEq)]
pub struct CopyButtonProps {
    pub text: AttrValue,
}

/// Copies `text` and shows a short acknowledgment on success.
#[function_component(CopyButton)]
pub fn copy_button(props: &CopyButtonProps) -> Html {
    let copied = use_state(|| false);
    let reset = use_mut_ref(|| None::<Timeout>);

    let onclick = {
        let text = props.text.clone();
        let copied = copied.clone();
        let reset = reset.clone();
        Callback::from(move |_: MouseEvent| {
            let text = text.clone();
            let copied = copied.clone();
            let reset = reset.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match copy_text(&text).await {
                    Ok(method) => {
                        debug!("Copied '{}' via {:?}", text, method);
                        copied.set(true);
                        let copied = copied.clone();
                        // Replacing the handle cancels a pending reset.
                        *reset.borrow_mut() =
                            Some(Timeout::new(COPY_FEEDBACK_MS, move || copied.set(false)));
                    }
                    Err(e) => warn!("{}", e),
                }
            });
        })
    };

    html! {
        <button type="button" class="copy-button" {onclick}>
            { if *copied { COPIED_LABEL } else { COPY_LABEL } }
        </button>
    }
}

#[derive(Properties, PartialEq)]
pub struct SelectionCounterProps {
    pub count: SelectionCount,
}

/// "Selected: n / total" badge. Replays its `updated` animation whenever the
/// text changes after the first render.
#[function_component(SelectionCounter)]
pub fn selection_counter(props: &SelectionCounterProps) -> Html {
    let text = format!(
        "{}: {} / {}",
        SELECTION_LABEL, props.count.selected, props.count.total
    );
    let last_text = use_mut_ref(|| text.clone());
    let changed = use_mut_ref(|| false);

    if *last_text.borrow() != text {
        *last_text.borrow_mut() = text.clone();
        *changed.borrow_mut() = true;
    }
    let updated = *changed.borrow();

    html! {
        <div class="selection-counter">
            // A new key remounts the badge so the CSS animation restarts.
            <span key={text.clone()} class={classes!("selection-badge", updated.then_some("updated"))}>
                { text }
            </span>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct FilterToggleProps {
    pub checked: bool,
    pub onchange: Callback<bool>,
}

#[function_component(FilterToggle)]
pub fn filter_toggle(props: &FilterToggleProps) -> Html {
    let onchange = props.onchange.reform(|e: Event| {
        let input: HtmlInputElement = e.target_unchecked_into();
        input.checked()
    });

    html! {
        <label class="filter-selected">
            <input type="checkbox" checked={props.checked} {onchange} />
            { FILTER_LABEL }
        </label>
    }
}
