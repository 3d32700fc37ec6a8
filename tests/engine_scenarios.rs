use std::{
    cell::Cell,
    sync::Arc,
};

use slotplan::{
    core::registry::Registry,
    engine::{
        memo::SelectionMemo,
        search::{Cancelled, EngineConfig, SlotSelection, select_slots},
        traits::{GenerationCounter, NeverCancel},
    },
    raw::{RawClassRecord, RawSection, RawTimeslot},
    selection::{Locks, Selection},
    types::{SectionKind, SectionRef},
};

fn section(slots: &[(i64, i64)]) -> RawSection {
    RawSection(
        slots.iter().map(|(s, n)| RawTimeslot(*s, *n)).collect(),
        "room".to_string(),
    )
}

fn class(no: &str, lectures: Vec<RawSection>, recitations: Vec<RawSection>) -> RawClassRecord {
    let mut s = vec!["l".to_string()];
    if !recitations.is_empty() {
        s.push("r".to_string());
    }
    RawClassRecord {
        no: no.to_string(),
        s,
        l: lectures,
        r: recitations,
        u1: 3.0,
        u2: 1.0,
        u3: 8.0,
        ..RawClassRecord::default()
    }
}

fn registry(records: Vec<RawClassRecord>) -> Registry {
    let (registry, report) = Registry::load(records.into_iter().map(|r| (r.no.clone(), r)));
    assert!(report.is_clean(), "fixture rejected: {report:?}");
    registry
}

fn run(registry: &Registry, classes: &[&str], locks: &Locks) -> SlotSelection {
    let classes: Vec<String> = classes.iter().map(|c| c.to_string()).collect();
    select_slots(registry, &classes, locks, &EngineConfig::default(), &NeverCancel).expect("not cancelled")
}

fn lock(class: &str, kind: SectionKind, index: usize) -> Locks {
    let mut locks = Locks::new();
    locks.insert(SectionRef::new(class, kind), index);
    locks
}

#[test]
fn empty_selection_yields_single_empty_option() {
    let reg = registry(vec![class("A", vec![section(&[(0, 2)])], vec![])]);
    let result = run(&reg, &[], &Locks::new());
    assert!(result.all_sections.is_empty());
    assert_eq!(result.options, vec![Vec::<usize>::new()]);
    assert!(!result.truncated);
}

#[test]
fn overlapping_single_lectures_have_no_option() {
    let reg = registry(vec![
        class("A", vec![section(&[(6, 3)])], vec![]),
        class("B", vec![section(&[(8, 3)])], vec![]),
    ]);
    let result = run(&reg, &["A", "B"], &Locks::new());
    assert_eq!(
        result.all_sections,
        vec![
            SectionRef::new("A", SectionKind::Lecture),
            SectionRef::new("B", SectionKind::Lecture)
        ]
    );
    assert!(result.options.is_empty());
    assert!(result.is_infeasible());
}

#[test]
fn disjoint_single_lectures_have_one_option() {
    let reg = registry(vec![
        class("A", vec![section(&[(6, 3)])], vec![]),
        class("B", vec![section(&[(10, 2)])], vec![]),
    ]);
    let result = run(&reg, &["A", "B"], &Locks::new());
    assert_eq!(result.options, vec![vec![0, 0]]);
}

#[test]
fn candidates_are_enumerated_in_source_order() {
    let reg = registry(vec![class(
        "A",
        vec![section(&[(0, 2)]), section(&[(4, 2)])],
        vec![],
    )]);
    let result = run(&reg, &["A"], &Locks::new());
    assert_eq!(result.options, vec![vec![0], vec![1]]);
}

#[test]
fn locked_index_appears_in_every_option() {
    let reg = registry(vec![
        class(
            "A",
            vec![section(&[(0, 2)]), section(&[(4, 2)])],
            vec![section(&[(10, 1)]), section(&[(20, 1)])],
        ),
        class("B", vec![section(&[(30, 2)]), section(&[(40, 2)])], vec![]),
    ]);
    let locks = lock("A", SectionKind::Lecture, 1);
    let result = run(&reg, &["A", "B"], &locks);

    assert_eq!(result.all_sections.len(), 3);
    let pos = result
        .position(&SectionRef::new("A", SectionKind::Lecture))
        .expect("A lecture pair");
    assert_eq!(result.options.len(), 4);
    assert!(result.options.iter().all(|opt| opt[pos] == 1));
}

#[test]
fn lock_that_conflicts_with_everything_yields_no_option() {
    let reg = registry(vec![
        class("A", vec![section(&[(0, 2)]), section(&[(4, 2)])], vec![]),
        class("B", vec![section(&[(5, 1)])], vec![]),
    ]);
    let unlocked = run(&reg, &["A", "B"], &Locks::new());
    assert_eq!(unlocked.options, vec![vec![0, 0]]);

    let locked = run(&reg, &["A", "B"], &lock("A", SectionKind::Lecture, 1));
    assert!(locked.options.is_empty());
}

#[test]
fn out_of_range_and_unselected_locks_are_inert() {
    let reg = registry(vec![
        class("A", vec![section(&[(0, 2)]), section(&[(4, 2)])], vec![]),
        class("B", vec![section(&[(10, 2)])], vec![]),
    ]);
    let free = run(&reg, &["A"], &Locks::new());

    let out_of_range = run(&reg, &["A"], &lock("A", SectionKind::Lecture, 7));
    assert_eq!(out_of_range, free);

    let unselected = run(&reg, &["A"], &lock("B", SectionKind::Lecture, 0));
    assert_eq!(unselected, free);

    let wrong_kind = run(&reg, &["A"], &lock("A", SectionKind::Lab, 0));
    assert_eq!(wrong_kind, free);
}

#[test]
fn sections_within_one_class_may_overlap_each_other_but_not_across_pairs() {
    // Lecture and recitation of the same class are separate pairs and must not overlap.
    let reg = registry(vec![class(
        "A",
        vec![section(&[(0, 4), (2, 4)])],
        vec![section(&[(3, 1)]), section(&[(8, 1)])],
    )]);
    let result = run(&reg, &["A"], &Locks::new());
    assert_eq!(result.options, vec![vec![0, 1]]);
}

#[test]
fn tba_sections_fit_anywhere() {
    let reg = registry(vec![
        class("A", vec![section(&[(0, 30)])], vec![]),
        class("B", vec![section(&[])], vec![]),
    ]);
    let result = run(&reg, &["A", "B"], &Locks::new());
    assert_eq!(result.options, vec![vec![0, 0]]);
}

#[test]
fn unknown_and_repeated_classes_are_skipped() {
    let reg = registry(vec![class("A", vec![section(&[(0, 2)])], vec![])]);
    let result = run(&reg, &["A", "ghost", "A"], &Locks::new());
    assert_eq!(result.all_sections, vec![SectionRef::new("A", SectionKind::Lecture)]);
    assert_eq!(result.options, vec![vec![0]]);
}

#[test]
fn option_cap_truncates_and_reports_it() {
    let many: Vec<RawSection> = (0..10).map(|i| section(&[(i * 2, 1)])).collect();
    let reg = registry(vec![
        class("A", many.clone(), vec![]),
        class("B", many.iter().map(|s| section(&[(s.0[0].0 + 100, 1)])).collect(), vec![]),
    ]);
    let classes = vec!["A".to_string(), "B".to_string()];

    let capped = EngineConfig {
        max_options: 15,
        ..EngineConfig::default()
    };
    let result = select_slots(&reg, &classes, &Locks::new(), &capped, &NeverCancel).unwrap();
    assert_eq!(result.options.len(), 15);
    assert!(result.truncated);
    assert_eq!(result.options[10], vec![1, 0]);

    let exact = EngineConfig {
        max_options: 100,
        ..EngineConfig::default()
    };
    let result = select_slots(&reg, &classes, &Locks::new(), &exact, &NeverCancel).unwrap();
    assert_eq!(result.options.len(), 100);
    assert!(!result.truncated);
}

#[test]
fn zero_cap_still_admits_one_option() {
    let reg = registry(vec![class("A", vec![section(&[(0, 2)]), section(&[(4, 2)])], vec![])]);
    let zero = EngineConfig {
        max_options: 0,
        ..EngineConfig::default()
    };

    let empty = select_slots(&reg, &[], &Locks::new(), &zero, &NeverCancel).unwrap();
    assert_eq!(empty.options, vec![Vec::<usize>::new()]);
    assert!(!empty.truncated);

    let classes = vec!["A".to_string()];
    let result = select_slots(&reg, &classes, &Locks::new(), &zero, &NeverCancel).unwrap();
    assert_eq!(result.options, vec![vec![0]]);
    assert!(result.truncated);
}

#[test]
fn declared_kind_without_sections_blocks_every_option() {
    let mut labless = class("A", vec![section(&[(0, 2)])], vec![]);
    labless.s.push("b".to_string());
    let reg = registry(vec![labless, class("B", vec![section(&[(4, 2)])], vec![])]);

    let result = run(&reg, &["A", "B"], &Locks::new());
    assert_eq!(
        result.all_sections,
        vec![
            SectionRef::new("A", SectionKind::Lecture),
            SectionRef::new("A", SectionKind::Lab),
            SectionRef::new("B", SectionKind::Lecture)
        ]
    );
    assert!(result.options.is_empty());
    assert!(!result.truncated);
    assert!(result.is_infeasible());

    let alone = run(&reg, &["B"], &Locks::new());
    assert_eq!(alone.options, vec![vec![0]]);
}

#[test]
fn cancellation_abandons_the_search() {
    let many: Vec<RawSection> = (0..8).map(|i| section(&[(i, 1)])).collect();
    let reg = registry(vec![
        class("A", many.clone(), vec![]),
        class("B", many.clone(), vec![]),
        class("C", many, vec![]),
    ]);
    let classes = vec!["A".to_string(), "B".to_string(), "C".to_string()];
    let config = EngineConfig {
        max_options: usize::MAX,
        cancel_check_interval: 4,
    };

    let polls = Cell::new(0u32);
    let cancel_after_two = || {
        polls.set(polls.get() + 1);
        polls.get() > 2
    };
    let outcome = select_slots(&reg, &classes, &Locks::new(), &config, &cancel_after_two);
    assert_eq!(outcome, Err(Cancelled));
    assert_eq!(polls.get(), 3);

    let counter = GenerationCounter::new();
    counter.advance_to(3);
    let stale = counter.guard(2);
    assert_eq!(
        select_slots(&reg, &classes, &Locks::new(), &config, &stale),
        Err(Cancelled)
    );
    let current = counter.guard(3);
    assert!(select_slots(&reg, &classes, &Locks::new(), &config, &current).is_ok());
}

#[test]
fn resolved_sections_match_option_indices() {
    let reg = registry(vec![
        class("A", vec![section(&[(0, 2)]), section(&[(4, 2)])], vec![]),
        class("B", vec![section(&[(1, 1)])], vec![]),
    ]);
    let result = run(&reg, &["A", "B"], &Locks::new());
    assert_eq!(result.options, vec![vec![1, 0]]);

    let sections = result.sections(&reg, 0).expect("option 0");
    assert_eq!(sections[0].class().number(), "A");
    assert_eq!(sections[0].index(), 1);
    assert_eq!(sections[1].class().number(), "B");
    assert!(result.sections(&reg, 1).is_none());
}

#[test]
fn memo_serves_repeat_queries_and_ignores_other_epochs() {
    let records = vec![class("A", vec![section(&[(0, 2)]), section(&[(4, 2)])], vec![])];
    let reg = registry(records.clone());
    let mut selection = Selection::new();
    selection.select_class(&reg, "A").unwrap();
    let snapshot = selection.snapshot();

    let mut memo = SelectionMemo::new(2);
    assert!(memo.get(&reg, &snapshot).is_none());
    let result = Arc::new(run(&reg, &["A"], &Locks::new()));
    memo.insert(&reg, &snapshot, Arc::clone(&result));
    assert_eq!(memo.get(&reg, &snapshot).as_deref(), Some(&*result));
    assert_eq!(memo.stats(), (1, 1));

    let reloaded = registry(records);
    assert!(memo.get(&reloaded, &snapshot).is_none());

    selection.lock_section(SectionRef::new("A", SectionKind::Lecture), 0);
    memo.insert(&reg, &selection.snapshot(), Arc::clone(&result));
    selection.lock_section(SectionRef::new("A", SectionKind::Lecture), 1);
    memo.insert(&reg, &selection.snapshot(), Arc::clone(&result));
    assert_eq!(memo.len(), 2);
    assert!(memo.get(&reg, &snapshot).is_none());
}

#[test]
fn repeated_calls_are_identical() {
    let reg = registry(vec![
        class(
            "A",
            vec![section(&[(0, 2)]), section(&[(4, 2)])],
            vec![section(&[(2, 1)]), section(&[(6, 1)]), section(&[])],
        ),
        class("B", vec![section(&[(1, 2)]), section(&[(8, 2)])], vec![]),
    ]);
    let first = run(&reg, &["B", "A"], &Locks::new());
    let second = run(&reg, &["B", "A"], &Locks::new());
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
    assert_eq!(first.all_sections[0].class, "B");
}
