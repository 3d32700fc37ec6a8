//! JSON catalog documents: `{ "classes": { "<number>": { ... } }, "lastUpdated": "..." }`.

use std::{fmt, fs, path::Path};

use serde::{
    Deserialize, Deserializer,
    de::{MapAccess, Visitor},
};
use serde_json::Value;

use crate::{core::class::RecordError, raw::RawClassRecord};

use super::{CatalogResult, CatalogSnapshot, CatalogSource};

#[derive(Debug, Deserialize)]
struct CatalogDocument {
    classes: OrderedEntries,
    #[serde(rename = "lastUpdated", default)]
    last_updated: Option<String>,
}

/// Object entries in document order.
#[derive(Debug, Default)]
struct OrderedEntries(Vec<(String, Value)>);

impl<'de> Deserialize<'de> for OrderedEntries {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = OrderedEntries;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object of class records")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut out = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, Value>()? {
                    out.push((key, value));
                }
                Ok(OrderedEntries(out))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

/// Catalog held as JSON text.
pub struct JsonCatalog {
    text: String,
}

impl JsonCatalog {
    /// Reads a catalog document from `path`.
    pub fn open(path: impl AsRef<Path>) -> CatalogResult<Self> {
        let text = fs::read_to_string(path)?;
        Ok(Self { text })
    }

    /// Wraps an in-memory document.
    pub fn from_json_str(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl CatalogSource for JsonCatalog {
    fn load_entries(&mut self) -> CatalogResult<CatalogSnapshot> {
        let doc: CatalogDocument = serde_json::from_str(&self.text)?;
        let entries = doc
            .classes
            .0
            .into_iter()
            .map(|(key, value)| {
                let decoded = decode_record(&key, value);
                (key, decoded)
            })
            .collect();

        Ok(CatalogSnapshot {
            entries,
            last_updated: doc.last_updated,
        })
    }
}

fn decode_record(key: &str, value: Value) -> Result<RawClassRecord, RecordError> {
    serde_json::from_value(value).map_err(|e| RecordError::Decode {
        key: key.to_string(),
        message: e.to_string(),
    })
}
