//! Catalog data model: timeslots, sections, classes and the registry.

/// Class and section views over raw records.
pub mod class;
/// Number formatting for display tables.
pub mod format;
/// Day and clock interpretation of grid indices.
pub mod grid;
/// Immutable catalog registry and eval table.
pub mod registry;
/// Timeslots and section meeting times.
pub mod timeslot;
