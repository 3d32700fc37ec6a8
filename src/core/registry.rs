use std::sync::atomic::{AtomicU64, Ordering};

use hashbrown::HashMap;
use serde::Serialize;

use crate::{
    core::{
        class::{Class, RecordError},
        format::format_number,
    },
    raw::RawClassRecord,
    types::ClassNumber,
};

static NEXT_EPOCH: AtomicU64 = AtomicU64::new(1);

/// Display summary of one class for search tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvalRow {
    /// Class number.
    pub number: ClassNumber,
    /// Rating, one decimal.
    pub rating: String,
    /// Evaluation hours, one decimal.
    pub hours: String,
    /// Class name.
    pub name: String,
}

/// Outcome of a catalog load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    /// Number of classes accepted.
    pub loaded: usize,
    /// Rejected records, in source order.
    pub skipped: Vec<SkippedRecord>,
}

/// One rejected catalog entry.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRecord {
    /// Catalog key of the entry.
    pub key: String,
    /// Why it was rejected.
    pub error: RecordError,
}

impl LoadReport {
    /// Keys of rejected entries.
    pub fn skipped_keys(&self) -> Vec<&str> {
        self.skipped.iter().map(|s| s.key.as_str()).collect()
    }

    /// True when nothing was rejected.
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Immutable catalog: every valid class in source order plus the eval table.
#[derive(Debug)]
pub struct Registry {
    classes: Vec<Class>,
    pos: HashMap<ClassNumber, usize>,
    eval_rows: Vec<EvalRow>,
    last_updated: Option<String>,
    epoch: u64,
}

impl Registry {
    /// Builds a registry from decoded records, skipping and reporting invalid ones.
    ///
    /// Iteration order of `records` is kept for both the class list and the eval table.
    pub fn load<I>(records: I) -> (Self, LoadReport)
    where
        I: IntoIterator<Item = (String, RawClassRecord)>,
    {
        Self::load_results(records.into_iter().map(|(key, raw)| (key, Ok(raw))))
    }

    /// Like [`Registry::load`], accepting entries that already failed to decode.
    pub fn load_results<I>(entries: I) -> (Self, LoadReport)
    where
        I: IntoIterator<Item = (String, Result<RawClassRecord, RecordError>)>,
    {
        let mut registry = Self {
            classes: Vec::new(),
            pos: HashMap::new(),
            eval_rows: Vec::new(),
            last_updated: None,
            epoch: NEXT_EPOCH.fetch_add(1, Ordering::Relaxed),
        };
        let mut report = LoadReport::default();

        for (key, decoded) in entries {
            match decoded.and_then(|raw| validate_entry(&key, raw)) {
                Ok(class) => {
                    if registry.pos.contains_key(class.number()) {
                        log::warn!("skipping duplicate catalog entry {key}");
                        report.skipped.push(SkippedRecord {
                            error: RecordError::DuplicateClass {
                                number: class.number().to_string(),
                            },
                            key,
                        });
                        continue;
                    }
                    registry.insert(class);
                }
                Err(error) => {
                    log::warn!("skipping catalog entry: {error}");
                    report.skipped.push(SkippedRecord { key, error });
                }
            }
        }

        report.loaded = registry.classes.len();
        log::info!(
            "catalog loaded: {} classes, {} skipped",
            report.loaded,
            report.skipped.len()
        );
        (registry, report)
    }

    /// Attaches the feed's last-updated stamp.
    pub fn with_last_updated(mut self, stamp: impl Into<String>) -> Self {
        self.last_updated = Some(stamp.into());
        self
    }

    /// Feed's last-updated stamp, when known.
    pub fn last_updated(&self) -> Option<&str> {
        self.last_updated.as_deref()
    }

    /// Identity of this load; distinct for every constructed registry.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Looks up a class by number.
    pub fn class(&self, number: &str) -> Option<&Class> {
        self.pos.get(number).map(|idx| &self.classes[*idx])
    }

    /// True when `number` is in the catalog.
    pub fn contains(&self, number: &str) -> bool {
        self.pos.contains_key(number)
    }

    /// Every class in source order.
    pub fn classes(&self) -> &[Class] {
        &self.classes
    }

    /// Number of classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// True when the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// The full eval table in source order.
    pub fn eval_rows(&self) -> &[EvalRow] {
        &self.eval_rows
    }

    /// Rows whose class number satisfies `predicate`, in source order.
    pub fn filter_eval_rows<F>(&self, predicate: F) -> Vec<&EvalRow>
    where
        F: Fn(&str) -> bool,
    {
        self.eval_rows
            .iter()
            .filter(|row| predicate(&row.number))
            .collect()
    }

    fn insert(&mut self, class: Class) {
        let raw = class.raw();
        self.eval_rows.push(EvalRow {
            number: raw.no.clone(),
            rating: format_number(raw.ra, 1),
            hours: format_number(raw.h, 1),
            name: raw.n.clone(),
        });
        self.pos.insert(raw.no.clone(), self.classes.len());
        self.classes.push(class);
    }
}

fn validate_entry(key: &str, mut raw: RawClassRecord) -> Result<Class, RecordError> {
    if raw.no.is_empty() {
        raw.no = key.to_string();
    } else if raw.no != key {
        return Err(RecordError::Decode {
            key: key.to_string(),
            message: format!("record number {:?} does not match its key", raw.no),
        });
    }
    Class::from_raw(raw)
}
