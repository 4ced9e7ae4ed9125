use gloo_timers::callback::Interval;
use yew::prelude::*;

/// Run `on_tick` every `period_ms` while `running` is true.
///
/// The interval lives inside the effect: it is dropped (and thereby cancelled)
/// when `running` or the period changes, and when the component unmounts.
#[hook]
pub fn use_interval(period_ms: u32, running: bool, on_tick: Callback<()>) {
    use_effect_with((period_ms, running), move |&(period_ms, running)| {
        let interval = running.then(|| Interval::new(period_ms, move || on_tick.emit(())));
        move || drop(interval)
    });
}
