//! Catalog sources feeding the registry.

/// JSON document source.
pub mod json;

use crate::{
    core::{
        class::RecordError,
        registry::{LoadReport, Registry},
    },
    raw::RawClassRecord,
};

/// Failure that prevents a catalog from loading at all.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Reading the catalog failed.
    #[error("catalog i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// The document is not a catalog.
    #[error("catalog decode error: {0}")]
    Json(#[from] serde_json::Error),
    /// Anything else reported by a source.
    #[error("catalog error: {0}")]
    Message(String),
}

/// Result alias for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Entries produced by a [`CatalogSource`], in source order.
#[derive(Debug, Default)]
pub struct CatalogSnapshot {
    /// Catalog key with its decoded record, or why it could not be decoded.
    pub entries: Vec<(String, Result<RawClassRecord, RecordError>)>,
    /// Feed's last-updated stamp.
    pub last_updated: Option<String>,
}

/// Producer of raw catalog entries.
pub trait CatalogSource {
    /// Reads every entry. Per-record decode failures belong in the snapshot, not the error.
    fn load_entries(&mut self) -> CatalogResult<CatalogSnapshot>;
}

/// Loads a source into a fresh [`Registry`].
pub fn load_registry(source: &mut dyn CatalogSource) -> CatalogResult<(Registry, LoadReport)> {
    let snapshot = source.load_entries()?;
    let (registry, report) = Registry::load_results(snapshot.entries);
    let registry = match snapshot.last_updated {
        Some(stamp) => registry.with_last_updated(stamp),
        None => registry,
    };
    Ok((registry, report))
}
