use std::{collections::VecDeque, sync::Arc};

use hashbrown::HashMap;

use crate::{
    core::registry::Registry,
    selection::SelectionSnapshot,
    types::{ClassNumber, SectionIndex, SectionRef},
};

use super::search::SlotSelection;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MemoKey {
    epoch: u64,
    classes: Vec<ClassNumber>,
    locks: Vec<(SectionRef, SectionIndex)>,
}

/// Bounded cache of search results keyed on (catalog epoch, selection, locks).
///
/// Entries from another registry epoch never match, so a catalog reload cannot serve stale views.
#[derive(Debug)]
pub struct SelectionMemo {
    capacity: usize,
    entries: HashMap<MemoKey, Arc<SlotSelection>>,
    order: VecDeque<MemoKey>,
    hits: u64,
    misses: u64,
}

impl SelectionMemo {
    /// Memo holding at most `capacity` results; 0 disables caching.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::new(),
            order: VecDeque::new(),
            hits: 0,
            misses: 0,
        }
    }

    /// Cached result for `snapshot` against `registry`.
    pub fn get(&mut self, registry: &Registry, snapshot: &SelectionSnapshot) -> Option<Arc<SlotSelection>> {
        let key = key_for(registry, snapshot);
        match self.entries.get(&key) {
            Some(hit) => {
                self.hits += 1;
                Some(Arc::clone(hit))
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Stores a completed result, evicting the oldest entry when full.
    pub fn insert(&mut self, registry: &Registry, snapshot: &SelectionSnapshot, result: Arc<SlotSelection>) {
        if self.capacity == 0 {
            return;
        }

        let key = key_for(registry, snapshot);
        if self.entries.insert(key.clone(), result).is_none() {
            self.order.push_back(key);
        }

        while self.entries.len() > self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.entries.remove(&oldest);
        }
    }

    /// Drops everything.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    /// Number of cached results.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(hits, misses)` since construction.
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}

fn key_for(registry: &Registry, snapshot: &SelectionSnapshot) -> MemoKey {
    MemoKey {
        epoch: registry.epoch(),
        classes: snapshot.classes.clone(),
        locks: snapshot.locks.clone(),
    }
}
