//! File-backed template store reading a MongoDB export
//!
//! Accepts both `mongoexport` layouts: one document per line (the default) or
//! a single JSON array (`--jsonArray`). Identifiers may be written in extended
//! JSON (`{"$oid": "..."}`) or as a bare hex string.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::debug;

use super::{sort_records, TemplateId, TemplateRecord, TemplateStore, ID_FIELD};
use crate::error::{Error, Result};

/// Template store loaded from an exported collection file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    documents: HashMap<TemplateId, Map<String, Value>>,
}

impl JsonFileStore {
    /// Load every document from `path`
    pub fn open(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::StoreUnavailable {
            location: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let store = Self::from_str_at(path, &content)?;
        debug!(path = %path.display(), documents = store.len(), "loaded template store");
        Ok(store)
    }

    /// Parse store content that was read from `path`
    fn from_str_at(path: &Path, content: &str) -> Result<Self> {
        let unavailable = |reason: String| Error::StoreUnavailable {
            location: path.display().to_string(),
            reason,
        };

        let raw: Vec<Value> = if content.trim_start().starts_with('[') {
            serde_json::from_str(content).map_err(|e| unavailable(e.to_string()))?
        } else {
            content
                .lines()
                .enumerate()
                .filter(|(_, line)| !line.trim().is_empty())
                .map(|(n, line)| {
                    serde_json::from_str(line)
                        .map_err(|e| unavailable(format!("line {}: {}", n + 1, e)))
                })
                .collect::<Result<_>>()?
        };

        let mut documents = HashMap::with_capacity(raw.len());
        for (index, value) in raw.into_iter().enumerate() {
            let Value::Object(fields) = value else {
                return Err(unavailable(format!("document {} is not an object", index + 1)));
            };
            let id = document_id(&fields).ok_or_else(|| {
                unavailable(format!("document {} has no valid {}", index + 1, ID_FIELD))
            })?;
            documents.insert(id, fields);
        }

        Ok(JsonFileStore { documents })
    }

    /// Number of documents in the store
    fn len(&self) -> usize {
        self.documents.len()
    }
}

/// Extract the identifier of a stored document
fn document_id(fields: &Map<String, Value>) -> Option<TemplateId> {
    let raw = match fields.get(ID_FIELD)? {
        Value::String(s) => s.as_str(),
        Value::Object(oid) => oid.get("$oid")?.as_str()?,
        _ => return None,
    };
    raw.parse().ok()
}

impl TemplateStore for JsonFileStore {
    fn contains(&self, id: &TemplateId) -> Result<bool> {
        Ok(self.documents.contains_key(id))
    }

    fn find_templates(&self, ids: &[TemplateId]) -> Result<Vec<TemplateRecord>> {
        let mut seen = HashSet::new();
        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            if !seen.insert(id) {
                continue;
            }
            let fields = self
                .documents
                .get(id)
                .ok_or_else(|| Error::RecordNotFound(id.clone()))?;
            records.push(TemplateRecord::new(fields.clone()));
        }
        sort_records(&mut records);
        Ok(records)
    }
}
