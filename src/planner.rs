//! Synchronous application context: catalog, selection, options, and state observers.

use std::sync::Arc;

use serde::Serialize;

use crate::{
    core::{registry::Registry, timeslot::Timeslot},
    engine::{
        memo::SelectionMemo,
        search::{EngineConfig, SlotSelection, select_slots},
        traits::NeverCancel,
    },
    selection::{AppliedOp, Selection, SelectionError},
    types::{ClassNumber, Generation, SectionIndex, SectionRef, SubscriptionId},
};

/// Default number of memoized search results.
pub const DEFAULT_MEMO_CAPACITY: usize = 64;

/// Condition worth surfacing next to the schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Warning {
    /// No conflict-free assignment exists for the selection and locks.
    NoValidSchedule,
    /// The option list was cut at the cap.
    OptionsTruncated,
    /// The class has no evaluation hours; its units stand in.
    HoursEstimated(ClassNumber),
}

/// Section picked for one pair by the current option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChosenSection {
    /// The pair.
    pub slot: SectionRef,
    /// Section index within the pair's kind.
    pub index: SectionIndex,
    /// Room label.
    pub room: String,
    /// Meeting blocks; empty for TBA.
    pub timeslots: Vec<Timeslot>,
    /// True when the choice comes from a lock.
    pub locked: bool,
}

/// Everything a UI needs to render the current schedule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannerState {
    /// Selection generation the state belongs to.
    pub generation: Generation,
    /// True while a newer search is still running; options reflect an older generation.
    pub pending: bool,
    /// Selected classes in selection order.
    pub selected_classes: Vec<ClassNumber>,
    /// Index of the displayed option.
    pub selected_option: usize,
    /// Number of options available.
    pub total_options: usize,
    /// True when the option list is incomplete.
    pub truncated: bool,
    /// Total units of selected classes.
    pub units: f64,
    /// Total workload hours of selected classes.
    pub hours: f64,
    /// Warnings in a stable order.
    pub warnings: Vec<Warning>,
    /// Sections of the displayed option, parallel to the result's pairs.
    pub chosen: Vec<ChosenSection>,
}

/// Wrapping index into an option list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptionCursor {
    selected: usize,
}

impl OptionCursor {
    /// Displayed option index.
    pub fn selected(&self) -> usize {
        self.selected
    }

    /// Back to the first option.
    pub fn reset(&mut self) {
        self.selected = 0;
    }

    /// Jumps to `index`; false when out of range.
    pub fn set(&mut self, index: usize, total: usize) -> bool {
        if index >= total {
            return false;
        }
        self.selected = index;
        true
    }

    /// Advances with wrap-around; false when there is nothing to cycle.
    pub fn next(&mut self, total: usize) -> bool {
        if total == 0 {
            return false;
        }
        self.selected = (self.selected + 1) % total;
        true
    }

    /// Steps back with wrap-around; false when there is nothing to cycle.
    pub fn prev(&mut self, total: usize) -> bool {
        if total == 0 {
            return false;
        }
        self.selected = (self.selected + total - 1) % total;
        true
    }
}

type StateHandler = Box<dyn FnMut(&PlannerState) + Send>;

/// Catalog plus live selection, recomputing options synchronously after every change.
pub struct Planner {
    registry: Arc<Registry>,
    selection: Selection,
    config: EngineConfig,
    memo: SelectionMemo,
    result: Arc<SlotSelection>,
    cursor: OptionCursor,
    observers: Vec<(SubscriptionId, StateHandler)>,
    next_subscription: SubscriptionId,
}

impl Planner {
    /// Planner over `registry` with an empty selection.
    pub fn new(registry: Arc<Registry>, config: EngineConfig) -> Self {
        Self::with_memo_capacity(registry, config, DEFAULT_MEMO_CAPACITY)
    }

    /// Like [`Planner::new`] with an explicit memo size.
    pub fn with_memo_capacity(registry: Arc<Registry>, config: EngineConfig, memo_capacity: usize) -> Self {
        let mut planner = Self {
            registry,
            selection: Selection::new(),
            config,
            memo: SelectionMemo::new(memo_capacity),
            result: Arc::new(SlotSelection::default()),
            cursor: OptionCursor::default(),
            observers: Vec::new(),
            next_subscription: 1,
        };
        planner.recompute();
        planner
    }

    /// The catalog.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// The selection.
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Latest search result.
    pub fn result(&self) -> &SlotSelection {
        &self.result
    }

    /// Memo of past searches.
    pub fn memo(&self) -> &SelectionMemo {
        &self.memo
    }

    /// Current state summary.
    pub fn state(&self) -> PlannerState {
        summarize(
            &self.registry,
            &self.selection,
            &self.result,
            self.cursor,
            false,
        )
    }

    /// Registers `handler`, called after every state change until unsubscribed.
    pub fn on_state_change<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&PlannerState) + Send + 'static,
    {
        let id = self.next_subscription;
        self.next_subscription += 1;
        self.observers.push((id, Box::new(handler)));
        id
    }

    /// Removes a handler; false when `id` is unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sub, _)| *sub != id);
        self.observers.len() != before
    }

    /// Adds a class to the selection.
    pub fn select_class(&mut self, number: &str) -> Result<(), SelectionError> {
        let applied = self.selection.select_class(&self.registry, number)?;
        self.after_change(applied);
        Ok(())
    }

    /// Removes a class from the selection.
    pub fn deselect_class(&mut self, number: &str) {
        let applied = self.selection.deselect_class(number);
        self.after_change(applied);
    }

    /// Selects or deselects a class.
    pub fn toggle_class(&mut self, number: &str) -> Result<(), SelectionError> {
        let applied = self.selection.toggle_class(&self.registry, number)?;
        self.after_change(applied);
        Ok(())
    }

    /// Pins a pair to a section index.
    pub fn lock_section(&mut self, slot: SectionRef, index: SectionIndex) {
        let applied = self.selection.lock_section(slot, index);
        self.after_change(applied);
    }

    /// Removes a pin.
    pub fn unlock_section(&mut self, slot: &SectionRef) {
        let applied = self.selection.unlock_section(slot);
        self.after_change(applied);
    }

    /// Clears selection and locks.
    pub fn clear(&mut self) {
        let applied = self.selection.clear();
        self.after_change(applied);
    }

    /// Displays option `index`; false when out of range.
    pub fn set_option(&mut self, index: usize) -> bool {
        let changed = self.cursor.set(index, self.result.options.len());
        if changed {
            self.notify();
        }
        changed
    }

    /// Displays the next option, wrapping.
    pub fn next_option(&mut self) -> bool {
        let changed = self.cursor.next(self.result.options.len());
        if changed {
            self.notify();
        }
        changed
    }

    /// Displays the previous option, wrapping.
    pub fn prev_option(&mut self) -> bool {
        let changed = self.cursor.prev(self.result.options.len());
        if changed {
            self.notify();
        }
        changed
    }

    /// Swaps in a reloaded catalog. The selection is kept; classes missing from the new
    /// catalog are ignored by the search until they return.
    pub fn replace_registry(&mut self, registry: Arc<Registry>) {
        self.registry = registry;
        self.memo.clear();
        self.recompute();
        self.notify();
    }

    fn after_change(&mut self, applied: Option<AppliedOp>) {
        let Some(applied) = applied else {
            return;
        };
        log::debug!("selection generation {}: {:?}", applied.generation, applied.op);
        self.recompute();
        self.notify();
    }

    fn recompute(&mut self) {
        let snapshot = self.selection.snapshot();
        if let Some(hit) = self.memo.get(&self.registry, &snapshot) {
            self.result = hit;
        } else {
            let locks = snapshot.lock_map();
            let computed = select_slots(
                &self.registry,
                &snapshot.classes,
                &locks,
                &self.config,
                &NeverCancel,
            );
            // NeverCancel cannot cancel.
            let Ok(computed) = computed else {
                return;
            };
            let computed = Arc::new(computed);
            self.memo.insert(&self.registry, &snapshot, Arc::clone(&computed));
            self.result = computed;
        }
        self.cursor.reset();
    }

    fn notify(&mut self) {
        if self.observers.is_empty() {
            return;
        }
        let state = self.state();
        for (_, handler) in self.observers.iter_mut() {
            handler(&state);
        }
    }
}

/// Builds a [`PlannerState`] from a selection and the result being displayed.
pub(crate) fn summarize(
    registry: &Registry,
    selection: &Selection,
    result: &SlotSelection,
    cursor: OptionCursor,
    pending: bool,
) -> PlannerState {
    let mut units = 0.0f64;
    let mut hours = 0.0f64;
    let mut estimated = Vec::new();
    for number in selection.classes() {
        let Some(class) = registry.class(number) else {
            continue;
        };
        units += class.units();
        let h = class.hours();
        hours += h.hours;
        if h.set_to_units {
            estimated.push(Warning::HoursEstimated(number.clone()));
        }
    }

    let mut warnings = Vec::new();
    if result.is_infeasible() {
        warnings.push(Warning::NoValidSchedule);
    }
    if result.truncated {
        warnings.push(Warning::OptionsTruncated);
    }
    warnings.extend(estimated);

    let chosen = result
        .sections(registry, cursor.selected())
        .map(|sections| {
            result
                .all_sections
                .iter()
                .zip(sections)
                .map(|(slot, sec)| ChosenSection {
                    slot: slot.clone(),
                    index: sec.index(),
                    room: sec.room().to_string(),
                    timeslots: sec.timeslots().to_vec(),
                    locked: selection.lock_for(slot) == Some(sec.index()),
                })
                .collect()
        })
        .unwrap_or_default();

    PlannerState {
        generation: selection.generation(),
        pending,
        selected_classes: selection.classes().to_vec(),
        selected_option: cursor.selected(),
        total_options: result.options.len(),
        truncated: result.truncated,
        units,
        hours,
        warnings,
        chosen,
    }
}
