use std::sync::{Arc, Mutex};

use slotplan::{
    core::registry::Registry,
    engine::search::EngineConfig,
    planner::{Planner, PlannerState, Warning},
    raw::{RawClassRecord, RawSection, RawTimeslot},
    selection::SelectionError,
    types::{SectionKind, SectionRef},
};

fn section(start: i64, len: i64, room: &str) -> RawSection {
    RawSection(vec![RawTimeslot(start, len)], room.to_string())
}

fn catalog() -> Vec<RawClassRecord> {
    vec![
        RawClassRecord {
            no: "6.036".to_string(),
            n: "Introduction to Machine Learning".to_string(),
            s: vec!["l".to_string(), "r".to_string()],
            l: vec![section(6, 3, "10-250")],
            r: vec![section(10, 2, "36-112"), section(40, 2, "36-144")],
            u1: 4.0,
            u2: 0.0,
            u3: 8.0,
            h: 0.0,
            ..RawClassRecord::default()
        },
        RawClassRecord {
            no: "18.06".to_string(),
            n: "Linear Algebra".to_string(),
            s: vec!["l".to_string()],
            l: vec![section(0, 2, "26-100"), section(36, 2, "26-100")],
            u1: 4.0,
            u2: 0.0,
            u3: 8.0,
            h: 9.5,
            ..RawClassRecord::default()
        },
        RawClassRecord {
            no: "8.01".to_string(),
            n: "Physics I".to_string(),
            s: vec!["l".to_string()],
            l: vec![section(7, 2, "26-100")],
            u1: 5.0,
            u2: 0.0,
            u3: 7.0,
            h: 10.0,
            ..RawClassRecord::default()
        },
    ]
}

fn registry() -> Arc<Registry> {
    let (registry, report) = Registry::load(catalog().into_iter().map(|r| (r.no.clone(), r)));
    assert!(report.is_clean());
    Arc::new(registry)
}

fn recorder(planner: &mut Planner) -> (Arc<Mutex<Vec<PlannerState>>>, u64) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let id = planner.on_state_change(move |state| sink.lock().expect("lock").push(state.clone()));
    (seen, id)
}

#[test]
fn empty_planner_has_one_empty_option() {
    let planner = Planner::new(registry(), EngineConfig::default());
    let state = planner.state();
    assert_eq!(state.total_options, 1);
    assert!(state.chosen.is_empty());
    assert!(state.warnings.is_empty());
    assert_eq!(state.units, 0.0);
    assert_eq!(state.generation, 0);
}

#[test]
fn observers_see_every_effective_change() {
    let mut planner = Planner::new(registry(), EngineConfig::default());
    let (seen, _) = recorder(&mut planner);

    planner.select_class("18.06").expect("select");
    planner.select_class("18.06").expect("already selected");
    planner.select_class("6.036").expect("select");
    planner.deselect_class("9.99");

    let seen = seen.lock().expect("lock");
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].selected_classes, vec!["18.06"]);
    assert_eq!(seen[0].total_options, 2);
    assert_eq!(seen[1].selected_classes, vec!["18.06", "6.036"]);
    assert_eq!(seen[1].generation, 2);
    assert_eq!(seen[1].units, 24.0);
    assert_eq!(seen[1].hours, 21.5);
}

#[test]
fn unsubscribed_handlers_stop_receiving() {
    let mut planner = Planner::new(registry(), EngineConfig::default());
    let (first, first_id) = recorder(&mut planner);
    let (second, second_id) = recorder(&mut planner);
    assert_ne!(first_id, second_id);

    planner.select_class("18.06").expect("select");
    assert!(planner.unsubscribe(first_id));
    assert!(!planner.unsubscribe(first_id));
    planner.next_option();

    assert_eq!(first.lock().expect("lock").len(), 1);
    assert_eq!(second.lock().expect("lock").len(), 2);
}

#[test]
fn unknown_class_is_rejected_without_notifying() {
    let mut planner = Planner::new(registry(), EngineConfig::default());
    let (seen, _) = recorder(&mut planner);
    assert_eq!(
        planner.select_class("9.99"),
        Err(SelectionError::UnknownClass("9.99".to_string()))
    );
    assert!(planner.toggle_class("9.99").is_err());
    assert!(seen.lock().expect("lock").is_empty());
    assert_eq!(planner.selection().generation(), 0);
}

#[test]
fn cursor_wraps_both_ways() {
    let mut planner = Planner::new(registry(), EngineConfig::default());
    planner.select_class("18.06").expect("select");
    planner.select_class("6.036").expect("select");
    // 18.06 has two lectures, 6.036 two recitations, and 6.036's lecture misses both.
    assert_eq!(planner.state().total_options, 4);

    assert!(planner.prev_option());
    assert_eq!(planner.state().selected_option, 3);
    assert!(planner.next_option());
    assert_eq!(planner.state().selected_option, 0);
    assert!(planner.set_option(2));
    assert!(!planner.set_option(4));
    assert_eq!(planner.state().selected_option, 2);

    planner.deselect_class("6.036");
    assert_eq!(planner.state().selected_option, 0);
}

#[test]
fn chosen_sections_follow_the_cursor_and_mark_locks() {
    let mut planner = Planner::new(registry(), EngineConfig::default());
    planner.select_class("6.036").expect("select");
    let recitation = SectionRef::new("6.036", SectionKind::Recitation);
    planner.lock_section(recitation.clone(), 1);

    let state = planner.state();
    assert_eq!(state.total_options, 1);
    assert_eq!(state.chosen.len(), 2);
    assert_eq!(state.chosen[0].room, "10-250");
    assert!(!state.chosen[0].locked);
    assert_eq!(state.chosen[1].slot, recitation);
    assert_eq!(state.chosen[1].index, 1);
    assert_eq!(state.chosen[1].room, "36-144");
    assert!(state.chosen[1].locked);

    planner.unlock_section(&recitation);
    let state = planner.state();
    assert_eq!(state.total_options, 2);
    assert_eq!(state.chosen[1].index, 0);
    assert!(!state.chosen[1].locked);
}

#[test]
fn warnings_come_in_a_stable_order() {
    let mut planner = Planner::new(registry(), EngineConfig::default());
    planner.select_class("6.036").expect("select");
    assert_eq!(
        planner.state().warnings,
        vec![Warning::HoursEstimated("6.036".to_string())]
    );

    planner.select_class("8.01").expect("select");
    let state = planner.state();
    assert_eq!(
        state.warnings,
        vec![
            Warning::NoValidSchedule,
            Warning::HoursEstimated("6.036".to_string())
        ]
    );
    assert!(state.chosen.is_empty());
    assert_eq!(state.hours, 22.0);

    let mut capped = Planner::new(
        registry(),
        EngineConfig {
            max_options: 1,
            ..EngineConfig::default()
        },
    );
    capped.select_class("18.06").expect("select");
    let state = capped.state();
    assert_eq!(state.total_options, 1);
    assert_eq!(state.warnings, vec![Warning::OptionsTruncated]);
}

#[test]
fn toggle_and_clear_round_trip_to_empty() {
    let mut planner = Planner::new(registry(), EngineConfig::default());
    planner.toggle_class("18.06").expect("toggle on");
    assert!(planner.selection().is_selected("18.06"));
    planner.toggle_class("18.06").expect("toggle off");
    assert!(!planner.selection().is_selected("18.06"));

    planner.select_class("8.01").expect("select");
    planner.lock_section(SectionRef::new("8.01", SectionKind::Lecture), 0);
    planner.clear();
    assert!(planner.selection().classes().is_empty());
    assert!(planner.selection().locks().is_empty());
    assert_eq!(planner.state().total_options, 1);
}

#[test]
fn repeated_selections_hit_the_memo() {
    let mut planner = Planner::new(registry(), EngineConfig::default());
    planner.select_class("18.06").expect("select");
    planner.deselect_class("18.06");
    planner.select_class("18.06").expect("select");
    let (hits, _) = planner.memo().stats();
    assert_eq!(hits, 2);
}

#[test]
fn replacing_the_registry_recomputes_and_notifies() {
    let mut planner = Planner::new(registry(), EngineConfig::default());
    planner.select_class("18.06").expect("select");
    planner.select_class("6.036").expect("select");
    let (seen, _) = recorder(&mut planner);

    let reduced: Vec<RawClassRecord> = catalog().into_iter().filter(|r| r.no != "6.036").collect();
    let (smaller, _) = Registry::load(reduced.into_iter().map(|r| (r.no.clone(), r)));
    planner.replace_registry(Arc::new(smaller));

    let seen = seen.lock().expect("lock");
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].selected_classes, vec!["18.06", "6.036"]);
    assert_eq!(seen[0].total_options, 2);
    assert_eq!(seen[0].units, 12.0);
    assert!(planner.memo().len() <= 1);
}
