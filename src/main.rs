//! Main module for the Daily Timers widget using Yew.
//! Mounts one independent widget per host container and wires the engine's
//! command handlers, the tick interval and the browser I/O.

#![cfg_attr(not(target_arch = "wasm32"), allow(dead_code, unused_imports))]

#[cfg(target_arch = "wasm32")]
use daily_timers::LocaleCollator;
use daily_timers::{now_ms, TimerBoard, TimerId, WidgetError};
use log::{error, info, warn};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use web_sys::Element;
use yew::prelude::*;

mod browser;
mod components;
mod config;
mod hooks;

use browser::{fetch_config, init_logging, LocalStorage};
use components::{render_entries, render_message_row, FilterToggle, SelectionCounter, TimerToggle};
use config::*;
use hooks::use_interval;

// ──────────────────────────────────────────────────────────────────────────────
// Type aliases for better readability
#[cfg(target_arch = "wasm32")]
type Board = TimerBoard<LocalStorage, LocaleCollator>;
#[cfg(target_arch = "wasm32")]
type BoardSlot = Rc<RefCell<Option<Board>>>;
type Countdowns = BTreeMap<TimerId, String>;

#[derive(Debug, Clone, Copy, PartialEq)]
enum LoadStatus {
    Loading,
    Ready,
    Failed,
}

#[cfg(target_arch = "wasm32")]
/// Run a command against the board, then refresh every countdown so the next
/// render shows the new state. The board borrow ends before the state update
/// schedules that render.
fn apply_command<F>(board: &BoardSlot, countdowns: &UseStateHandle<Countdowns>, command: F)
where
    F: FnOnce(&mut Board) -> Result<(), WidgetError>,
{
    let report = {
        let mut slot = board.borrow_mut();
        let Some(board) = slot.as_mut() else {
            return;
        };
        if let Err(e) = command(board) {
            warn!("{}", e);
        }
        board.tick(now_ms())
    };
    countdowns.set(report.countdowns);
}

// ──────────────────────────────────────────────────────────────────────────────

#[derive(Properties, PartialEq)]
pub struct TimersWidgetProps {
    pub settings: WidgetSettings,
}

#[cfg(target_arch = "wasm32")]
/// One widget instance: loads the configuration, restores persisted state,
/// ticks every second and renders the table.
#[function_component(TimersWidget)]
fn timers_widget(props: &TimersWidgetProps) -> Html {
    let board: BoardSlot = use_mut_ref(|| None);
    let status = use_state(|| LoadStatus::Loading);
    let countdowns = use_state(Countdowns::new);

    // Load configuration and state once per settings
    {
        let board = board.clone();
        let status = status.clone();
        let countdowns = countdowns.clone();
        use_effect_with(props.settings.clone(), move |settings| {
            let settings = settings.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match fetch_config(&settings.config_url).await {
                    Ok(definitions) => {
                        info!(
                            "Loaded {} timers from {}",
                            definitions.len(),
                            settings.config_url
                        );
                        let mut loaded = TimerBoard::new(
                            definitions,
                            LocalStorage::open(),
                            settings.storage_key.clone(),
                            LocaleCollator::new(&settings.locale),
                        );
                        // First tick before the first render so restored timers
                        // that ran out while the page was closed start inactive.
                        let report = loaded.tick(now_ms());
                        *board.borrow_mut() = Some(loaded);
                        countdowns.set(report.countdowns);
                        status.set(LoadStatus::Ready);
                    }
                    Err(e) => {
                        error!("{}: {}", settings.config_url, e);
                        status.set(LoadStatus::Failed);
                    }
                }
            });
            || ()
        });
    }

    let on_tick = {
        let board = board.clone();
        let countdowns = countdowns.clone();
        Callback::from(move |_: ()| apply_command(&board, &countdowns, |_| Ok(())))
    };
    use_interval(TICK_INTERVAL_MS, *status == LoadStatus::Ready, on_tick);

    let on_select: TimerToggle = {
        let board = board.clone();
        let countdowns = countdowns.clone();
        Callback::from(move |(id, selected): (TimerId, bool)| {
            apply_command(&board, &countdowns, |b| b.set_selected(&id, selected))
        })
    };
    let on_activate: TimerToggle = {
        let board = board.clone();
        let countdowns = countdowns.clone();
        Callback::from(move |(id, active): (TimerId, bool)| {
            apply_command(&board, &countdowns, |b| b.set_active(&id, active, now_ms()))
        })
    };
    let on_filter = {
        let board = board.clone();
        let countdowns = countdowns.clone();
        Callback::from(move |checked: bool| {
            apply_command(&board, &countdowns, |b| {
                b.set_filter(checked);
                Ok(())
            })
        })
    };

    let view = match *status {
        LoadStatus::Ready => board.borrow().as_ref().map(|b| b.view()),
        LoadStatus::Loading | LoadStatus::Failed => None,
    };

    html! {
        <div class="timers-widget">
            if let Some(ref view) = view {
                <div class="timers-toolbar">
                    <SelectionCounter count={view.selection} />
                    <FilterToggle checked={view.filter_selected} onchange={on_filter} />
                </div>
            }
            <table class="timers-table">
                <tbody>
                    { match (*status, &view) {
                        (LoadStatus::Failed, _) => render_message_row("load-error", CONFIG_ERROR_MESSAGE),
                        (_, Some(view)) => render_entries(&view.entries(), &countdowns, &on_select, &on_activate),
                        (_, None) => render_message_row("loading", LOADING_MESSAGE),
                    } }
                </tbody>
            </table>
        </div>
    }
}

#[cfg(target_arch = "wasm32")]
/// Entry point: mounts a widget on every host container found in the page.
fn main() {
    // Set the panic hook to log detailed errors to the console
    console_error_panic_hook::set_once();
    init_logging(LOG_LEVEL);

    let containers = match gloo_utils::document().query_selector_all(CONTAINER_SELECTOR) {
        Ok(containers) => containers,
        Err(e) => {
            error!("Invalid container selector {}: {:?}", CONTAINER_SELECTOR, e);
            return;
        }
    };

    let mut mounted = 0;
    for index in 0..containers.length() {
        let Some(container) = containers
            .item(index)
            .and_then(|node| node.dyn_into::<Element>().ok())
        else {
            continue;
        };
        let Some(settings) = WidgetSettings::from_container(&container) else {
            warn!("Skipping container with an empty {}", CONFIG_URL_ATTR);
            continue;
        };
        yew::Renderer::<TimersWidget>::with_root_and_props(container, TimersWidgetProps { settings })
            .render();
        mounted += 1;
    }
    info!("Mounted {} timer widget(s)", mounted);
}

/// The widget only runs in the browser; native builds have nothing to mount.
#[cfg(not(target_arch = "wasm32"))]
fn main() {}
