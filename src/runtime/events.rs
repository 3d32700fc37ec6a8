//! Runtime event stream payloads.

use crate::{selection::SelectionOp, types::Generation};

/// Events emitted from the single-writer planner loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannerEvent {
    /// The selection changed and a search for `generation` started.
    SelectionChanged {
        /// New generation.
        generation: Generation,
        /// The change.
        op: SelectionOp,
    },
    /// Options for `generation` are installed.
    OptionsReady {
        /// Generation the options belong to.
        generation: Generation,
        /// Number of options.
        total_options: usize,
        /// True when the list was cut at the cap.
        truncated: bool,
    },
    /// A search was abandoned or its result dropped because a newer input superseded it.
    SearchDiscarded {
        /// Generation of the discarded search.
        generation: Generation,
    },
    /// The displayed option moved.
    OptionChanged {
        /// New option index.
        selected_option: usize,
        /// Number of options.
        total_options: usize,
    },
}
