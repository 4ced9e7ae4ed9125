use daily_timers::{
    BaseCollator, BoardEntry, MemoryStore, NameCollator, PersistedState, Section, TimerBoard,
    TimerDefinition, TimerState,
};
use proptest::prelude::*;
use std::cmp::Ordering;

const KEY: &str = "props";
const NOW: i64 = 1_700_000_000_000;

#[derive(Debug, Clone)]
struct Seed {
    name: String,
    hours: u8,
    selected: bool,
    /// Expiry relative to `NOW`; `None` for inactive timers.
    expires_in: Option<i64>,
    persisted: bool,
}

fn seed() -> impl Strategy<Value = Seed> {
    (
        "[a-zA-Zéèà]{1,6}",
        1u8..48,
        any::<bool>(),
        proptest::option::of(-5_000i64..5_000),
        any::<bool>(),
    )
        .prop_map(|(name, hours, selected, expires_in, persisted)| Seed {
            name,
            hours,
            selected,
            expires_in,
            persisted,
        })
}

fn build(seeds: &[Seed], filter: bool) -> (Vec<TimerDefinition>, MemoryStore) {
    let definitions = seeds
        .iter()
        .enumerate()
        .map(|(i, s)| TimerDefinition {
            id: i.to_string(),
            name: s.name.clone(),
            duration_hours: f64::from(s.hours),
            coords: format!("/pos {}", i),
            info: None,
        })
        .collect::<Vec<_>>();

    let mut persisted = PersistedState {
        filter_selected: filter,
        ..Default::default()
    };
    for (i, s) in seeds.iter().enumerate().filter(|(_, s)| s.persisted) {
        persisted.timers.insert(
            i.to_string(),
            TimerState {
                expires_at: s.expires_in.map(|offset| NOW + offset),
                selected: s.selected,
            },
        );
    }

    let raw = serde_json::to_string(&persisted).unwrap();
    (definitions, MemoryStore::with_entry(KEY, &raw))
}

fn not_after(a: &str, b: &str) -> bool {
    BaseCollator.compare(a, b) != Ordering::Greater
}

proptest! {
    #[test]
    fn every_definition_has_state_after_load(seeds in prop::collection::vec(seed(), 0..12)) {
        let (definitions, backend) = build(&seeds, false);
        let board = TimerBoard::new(definitions.clone(), backend, KEY, BaseCollator);

        for def in &definitions {
            prop_assert!(board.state(&def.id).is_some());
        }
    }

    #[test]
    fn rows_follow_sort_order(seeds in prop::collection::vec(seed(), 0..12), filter in any::<bool>()) {
        let (definitions, backend) = build(&seeds, filter);
        let view = TimerBoard::new(definitions, backend, KEY, BaseCollator).view();

        for pair in view.active.windows(2) {
            prop_assert!(not_after(&pair[0].name, &pair[1].name));
        }
        for pair in view.inactive.windows(2) {
            prop_assert!(pair[0].selected >= pair[1].selected);
            if pair[0].selected == pair[1].selected {
                prop_assert!(not_after(&pair[0].name, &pair[1].name));
            }
        }
    }

    #[test]
    fn filter_only_hides_unselected_inactive_rows(seeds in prop::collection::vec(seed(), 0..12)) {
        let (definitions, backend) = build(&seeds, false);
        let mut board = TimerBoard::new(definitions, backend, KEY, BaseCollator);
        let unfiltered = board.view();
        board.set_filter(true);
        let filtered = board.view();

        prop_assert_eq!(&filtered.active, &unfiltered.active);
        prop_assert!(filtered.inactive.iter().all(|row| row.selected));
        prop_assert_eq!(
            filtered.inactive.len(),
            unfiltered.inactive.iter().filter(|row| row.selected).count()
        );
        prop_assert_eq!(filtered.selection, unfiltered.selection);
    }

    #[test]
    fn render_is_idempotent(seeds in prop::collection::vec(seed(), 0..12), filter in any::<bool>()) {
        let (definitions, backend) = build(&seeds, filter);
        let board = TimerBoard::new(definitions, backend, KEY, BaseCollator);
        prop_assert_eq!(board.view().entries(), board.view().entries());
    }

    #[test]
    fn headers_only_precede_non_empty_sections(seeds in prop::collection::vec(seed(), 0..12), filter in any::<bool>()) {
        let (definitions, backend) = build(&seeds, filter);
        let view = TimerBoard::new(definitions, backend, KEY, BaseCollator).view();
        let entries = view.entries();

        let has_header = |section| entries.contains(&BoardEntry::Header { section });
        prop_assert_eq!(has_header(Section::Active), !view.active.is_empty());
        prop_assert_eq!(has_header(Section::Inactive), !view.inactive.is_empty());
        if let Some(first) = entries.first() {
            prop_assert!(
                matches!(first, BoardEntry::Header { .. }),
                "assertion failed: matches!(first, BoardEntry::Header {{ .. }})"
            );
        }
    }

    #[test]
    fn tick_expires_exactly_the_elapsed_timers(seeds in prop::collection::vec(seed(), 0..12)) {
        let (definitions, backend) = build(&seeds, false);
        let mut board = TimerBoard::new(definitions, backend.clone(), KEY, BaseCollator);

        let report = board.tick(NOW);

        let expected: Vec<String> = seeds
            .iter()
            .enumerate()
            .filter(|(_, s)| s.persisted && s.expires_in.is_some_and(|offset| offset <= 0))
            .map(|(i, _)| i.to_string())
            .collect();
        prop_assert_eq!(&report.expired, &expected);

        let view = board.view();
        for id in &expected {
            prop_assert!(view.active.iter().all(|row| &row.id != id));
            prop_assert!(view.inactive.iter().any(|row| &row.id == id));
        }
        for row in &view.active {
            prop_assert!(board.state(&row.id).unwrap().expires_at.unwrap() > NOW);
        }

        let written: PersistedState = serde_json::from_str(&backend.get(KEY).unwrap()).unwrap();
        for id in &expected {
            prop_assert_eq!(written.timers[id].expires_at, None);
        }
    }
}
