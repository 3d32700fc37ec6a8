use serde::{Deserialize, Serialize};

use crate::{
    core::{
        class::Section,
        registry::Registry,
        timeslot::Meetings,
    },
    selection::Locks,
    types::{ClassNumber, SectionIndex, SectionRef},
};

use super::traits::Cancellation;

/// Default cap on enumerated options.
pub const DEFAULT_MAX_OPTIONS: usize = 250;
/// Default number of search nodes between cancellation polls.
pub const DEFAULT_CANCEL_CHECK_INTERVAL: u64 = 1024;

/// Search limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Options collected before the search stops and reports truncation. Values below 1 act as 1.
    pub max_options: usize,
    /// Search nodes visited between cancellation polls; 0 polls every node.
    pub cancel_check_interval: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_options: DEFAULT_MAX_OPTIONS,
            cancel_check_interval: DEFAULT_CANCEL_CHECK_INTERVAL,
        }
    }
}

/// The search was abandoned because its input was superseded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("slot search cancelled")]
pub struct Cancelled;

/// Feasible section assignments for a selection.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SlotSelection {
    /// Pairs needing a choice: selection order, then kind declaration order.
    pub all_sections: Vec<SectionRef>,
    /// Each option holds one section index per entry of `all_sections`.
    pub options: Vec<Vec<SectionIndex>>,
    /// True when more options existed than the cap allowed.
    pub truncated: bool,
}

impl SlotSelection {
    /// True when no conflict-free assignment exists.
    pub fn is_infeasible(&self) -> bool {
        self.options.is_empty()
    }

    /// Position of `slot` in `all_sections`.
    pub fn position(&self, slot: &SectionRef) -> Option<usize> {
        self.all_sections.iter().position(|s| s == slot)
    }

    /// Resolves option `option` to section views, parallel to `all_sections`.
    ///
    /// `None` when the option does not exist or the registry no longer matches.
    pub fn sections<'r>(&self, registry: &'r Registry, option: usize) -> Option<Vec<Section<'r>>> {
        let choice = self.options.get(option)?;
        self.all_sections
            .iter()
            .zip(choice)
            .map(|(slot, idx)| registry.class(&slot.class)?.section(slot.kind, *idx))
            .collect()
    }
}

struct Candidates<'r> {
    locked: bool,
    entries: Vec<(SectionIndex, &'r Meetings)>,
}

struct Search<'r, 'c, C: Cancellation + ?Sized> {
    candidates: Vec<Candidates<'r>>,
    config: &'c EngineConfig,
    max_options: usize,
    cancel: &'c C,
    committed: Vec<&'r Meetings>,
    chosen: Vec<SectionIndex>,
    options: Vec<Vec<SectionIndex>>,
    truncated: bool,
    nodes: u64,
}

impl<C: Cancellation + ?Sized> Search<'_, '_, C> {
    /// Returns `Ok(true)` once the search should stop early.
    fn descend(&mut self, depth: usize) -> Result<bool, Cancelled> {
        self.nodes += 1;
        let poll = self.config.cancel_check_interval == 0
            || self.nodes % self.config.cancel_check_interval == 0;
        if poll && self.cancel.is_cancelled() {
            return Err(Cancelled);
        }

        if depth == self.candidates.len() {
            if self.options.len() >= self.max_options {
                self.truncated = true;
                return Ok(true);
            }
            self.options.push(self.chosen.clone());
            return Ok(false);
        }

        for pos in 0..self.candidates[depth].entries.len() {
            let (idx, meetings) = self.candidates[depth].entries[pos];
            if self.committed.iter().any(|m| m.conflicts_with(meetings)) {
                continue;
            }

            self.committed.push(meetings);
            self.chosen.push(idx);
            let stop = self.descend(depth + 1);
            self.chosen.pop();
            self.committed.pop();
            if stop? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Enumerates conflict-free assignments of one section per `(class, kind)` pair.
///
/// Classes missing from `registry` and repeated class numbers are skipped. A lock whose
/// index is out of range for its pair is ignored. Options come out depth-first with
/// candidates in source order.
pub fn select_slots<C>(
    registry: &Registry,
    classes: &[ClassNumber],
    locks: &Locks,
    config: &EngineConfig,
    cancel: &C,
) -> Result<SlotSelection, Cancelled>
where
    C: Cancellation + ?Sized,
{
    let mut all_sections: Vec<SectionRef> = Vec::new();
    let mut candidates: Vec<Candidates<'_>> = Vec::new();

    for (pos, number) in classes.iter().enumerate() {
        if classes[..pos].contains(number) {
            continue;
        }
        let Some(class) = registry.class(number) else {
            log::debug!("select_slots: class {number} not in catalog, skipped");
            continue;
        };

        for (kind, sections) in class.sections() {
            let slot = SectionRef::new(number.clone(), kind);
            let pinned = locks.get(&slot).copied().filter(|idx| *idx < sections.len());
            let entries: Vec<(SectionIndex, &Meetings)> = sections
                .iter()
                .filter(|sec| pinned.is_none_or(|idx| idx == sec.index()))
                .map(|sec| (sec.index(), sec.meetings()))
                .collect();

            all_sections.push(slot);
            candidates.push(Candidates {
                locked: pinned.is_some(),
                entries,
            });
        }
    }

    let mut search = Search {
        committed: Vec::with_capacity(candidates.len()),
        chosen: Vec::with_capacity(candidates.len()),
        candidates,
        config,
        max_options: config.max_options.max(1),
        cancel,
        options: Vec::new(),
        truncated: false,
        nodes: 0,
    };
    search.descend(0)?;

    let Search {
        candidates,
        mut options,
        truncated,
        nodes,
        ..
    } = search;

    enforce_locks(&candidates, &mut options);

    log::debug!(
        "select_slots: {} pairs, {} options, truncated={truncated}, {nodes} nodes",
        all_sections.len(),
        options.len(),
    );

    Ok(SlotSelection {
        all_sections,
        options,
        truncated,
    })
}

/// Drops any option that strays from a pinned pair's index.
fn enforce_locks(candidates: &[Candidates<'_>], options: &mut Vec<Vec<SectionIndex>>) {
    let pinned: Vec<(usize, SectionIndex)> = candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| c.locked)
        .filter_map(|(pos, c)| c.entries.first().map(|(idx, _)| (pos, *idx)))
        .collect();
    if pinned.is_empty() {
        return;
    }

    let before = options.len();
    options.retain(|opt| pinned.iter().all(|(pos, idx)| opt[*pos] == *idx));
    if options.len() != before {
        log::error!(
            "select_slots: {} options violated locks and were dropped",
            before - options.len()
        );
    }
}
