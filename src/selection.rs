//! User selection state and the change records its mutations produce.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::{
    core::registry::Registry,
    types::{ClassNumber, Generation, SectionIndex, SectionRef},
};

/// Section choices pinned by the user.
pub type Locks = HashMap<SectionRef, SectionIndex>;

/// Rejected selection change.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    /// The class number is not in the catalog.
    #[error("unknown class {0}")]
    UnknownClass(ClassNumber),
}

/// One applied change to a [`Selection`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionOp {
    /// A class was appended to the selection.
    Select {
        /// Selected class.
        class: ClassNumber,
    },
    /// A class was removed; its locks stay but are inert.
    Deselect {
        /// Removed class.
        class: ClassNumber,
    },
    /// A section choice was pinned.
    Lock {
        /// Pinned pair.
        slot: SectionRef,
        /// Pinned section index.
        index: SectionIndex,
        /// Index previously pinned, if any.
        prev: Option<SectionIndex>,
    },
    /// A pin was removed.
    Unlock {
        /// Unpinned pair.
        slot: SectionRef,
        /// Index that was pinned.
        prev: SectionIndex,
    },
    /// Everything was cleared.
    Clear,
}

/// Selection change with the generation it produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedOp {
    /// Generation after the change.
    pub generation: Generation,
    /// The change.
    pub op: SelectionOp,
}

/// Immutable copy of a selection, used as search input and memo key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectionSnapshot {
    /// Generation the copy was taken at.
    pub generation: Generation,
    /// Selected classes in selection order.
    pub classes: Vec<ClassNumber>,
    /// Locks sorted by pair.
    pub locks: Vec<(SectionRef, SectionIndex)>,
}

impl SelectionSnapshot {
    /// Rebuilds the lock map.
    pub fn lock_map(&self) -> Locks {
        self.locks.iter().cloned().collect()
    }
}

/// Ordered selected classes plus locks. Every effective change bumps the generation.
#[derive(Debug, Default, Clone)]
pub struct Selection {
    classes: Vec<ClassNumber>,
    locks: Locks,
    generation: Generation,
}

impl Selection {
    /// Empty selection at generation 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `number`; `Ok(None)` when it was already selected.
    pub fn select_class(
        &mut self,
        registry: &Registry,
        number: &str,
    ) -> Result<Option<AppliedOp>, SelectionError> {
        if !registry.contains(number) {
            return Err(SelectionError::UnknownClass(number.to_string()));
        }
        if self.is_selected(number) {
            return Ok(None);
        }
        self.classes.push(number.to_string());
        Ok(Some(self.applied(SelectionOp::Select {
            class: number.to_string(),
        })))
    }

    /// Removes `number`; `None` when it was not selected.
    pub fn deselect_class(&mut self, number: &str) -> Option<AppliedOp> {
        let pos = self.classes.iter().position(|c| c == number)?;
        let class = self.classes.remove(pos);
        Some(self.applied(SelectionOp::Deselect { class }))
    }

    /// Selects `number` when absent, deselects it otherwise.
    pub fn toggle_class(
        &mut self,
        registry: &Registry,
        number: &str,
    ) -> Result<Option<AppliedOp>, SelectionError> {
        if self.is_selected(number) {
            Ok(self.deselect_class(number))
        } else {
            self.select_class(registry, number)
        }
    }

    /// Pins `slot` to `index`; `None` when already pinned there.
    ///
    /// Indices are not checked here; one outside the class's section list is ignored by the search.
    pub fn lock_section(&mut self, slot: SectionRef, index: SectionIndex) -> Option<AppliedOp> {
        let prev = self.locks.insert(slot.clone(), index);
        if prev == Some(index) {
            return None;
        }
        Some(self.applied(SelectionOp::Lock { slot, index, prev }))
    }

    /// Removes the pin on `slot`; `None` when there was none.
    pub fn unlock_section(&mut self, slot: &SectionRef) -> Option<AppliedOp> {
        let prev = self.locks.remove(slot)?;
        Some(self.applied(SelectionOp::Unlock {
            slot: slot.clone(),
            prev,
        }))
    }

    /// Drops every class and lock; `None` when already empty.
    pub fn clear(&mut self) -> Option<AppliedOp> {
        if self.classes.is_empty() && self.locks.is_empty() {
            return None;
        }
        self.classes.clear();
        self.locks.clear();
        Some(self.applied(SelectionOp::Clear))
    }

    /// Selected classes in selection order.
    pub fn classes(&self) -> &[ClassNumber] {
        &self.classes
    }

    /// All locks, including inert ones.
    pub fn locks(&self) -> &Locks {
        &self.locks
    }

    /// Pinned index for `slot`.
    pub fn lock_for(&self, slot: &SectionRef) -> Option<SectionIndex> {
        self.locks.get(slot).copied()
    }

    /// True when `number` is selected.
    pub fn is_selected(&self, number: &str) -> bool {
        self.classes.iter().any(|c| c == number)
    }

    /// Current generation.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Immutable copy for a search.
    pub fn snapshot(&self) -> SelectionSnapshot {
        let mut locks: Vec<(SectionRef, SectionIndex)> =
            self.locks.iter().map(|(k, v)| (k.clone(), *v)).collect();
        locks.sort();
        SelectionSnapshot {
            generation: self.generation,
            classes: self.classes.clone(),
            locks,
        }
    }

    fn applied(&mut self, op: SelectionOp) -> AppliedOp {
        self.generation += 1;
        AppliedOp {
            generation: self.generation,
            op,
        }
    }
}
