//! Weekly class-schedule planning: catalog model plus a conflict-free section search.
//!
//! # Examples
//!
//! Searching a tiny catalog directly:
//! ```
//! use slotplan::{
//!     core::registry::Registry,
//!     engine::{search::{select_slots, EngineConfig}, traits::NeverCancel},
//!     raw::{RawClassRecord, RawSection, RawTimeslot},
//!     selection::Locks,
//! };
//!
//! let lecture = |start| RawSection(vec![RawTimeslot(start, 3)], "10-250".to_string());
//! let record = |no: &str, start| RawClassRecord {
//!     no: no.to_string(),
//!     s: vec!["l".to_string()],
//!     l: vec![lecture(start)],
//!     u1: 3.0,
//!     u2: 0.0,
//!     u3: 9.0,
//!     ..RawClassRecord::default()
//! };
//!
//! let (registry, report) = Registry::load([
//!     ("6.036".to_string(), record("6.036", 6)),
//!     ("18.06".to_string(), record("18.06", 10)),
//! ]);
//! assert!(report.is_clean());
//!
//! let classes = vec!["6.036".to_string(), "18.06".to_string()];
//! let result = select_slots(&registry, &classes, &Locks::new(), &EngineConfig::default(), &NeverCancel)
//!     .expect("not cancelled");
//! assert_eq!(result.options, vec![vec![0, 0]]);
//! ```
//!
//! Runtime usage with cancellation of superseded searches:
//! ```no_run
//! use std::sync::Arc;
//!
//! use slotplan::{
//!     catalog::{json::JsonCatalog, load_registry},
//!     runtime::handle::{spawn_planner, RuntimeConfig},
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let (registry, _report) = load_registry(&mut JsonCatalog::open("full.json").expect("open"))
//!     .expect("load");
//! let handle = spawn_planner(Arc::new(registry), RuntimeConfig::default());
//! handle.select_class("6.036").await.expect("select");
//! let state = handle.settled().await.expect("settled");
//! println!("{} options", state.total_options);
//! handle.shutdown().await.expect("shutdown");
//! # }
//! ```
#![deny(missing_docs)]

/// Catalog sources.
pub mod catalog;
/// Catalog data model and registry.
pub mod core;
/// Slot-selection search, memo and cancellation.
pub mod engine;
/// Synchronous planner context with state observers.
pub mod planner;
/// Raw catalog records.
pub mod raw;
/// Single-writer async runtime and events.
pub mod runtime;
/// Selection state and change records.
pub mod selection;
/// Shared primitive types and enums.
pub mod types;
