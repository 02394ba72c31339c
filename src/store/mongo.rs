//! Template store backed by a live MongoDB collection
//!
//! The query is the one the pipeline has always run against the database:
//! `find({_id: {$in: [...]}})` with `_id` projected away and the results
//! sorted server-side by `complexity`, then `name`.

use std::collections::HashSet;

use mongodb::bson::{doc, oid::ObjectId, Bson, Document};
use mongodb::sync::{Client, Collection};
use serde_json::{Map, Value};
use tracing::debug;

use super::{TemplateId, TemplateRecord, TemplateStore};
use crate::error::{Error, Result};

/// Collection holding template documents unless configured otherwise
pub const DEFAULT_COLLECTION: &str = "templates";

/// Template store reading from MongoDB through the blocking driver
pub struct MongoStore {
    collection: Collection<Document>,
    location: String,
}

impl MongoStore {
    /// Create a client for `uri` and bind to `database.collection`
    ///
    /// The driver connects lazily, so an unreachable server surfaces on the
    /// first query as [`Error::StoreUnavailable`].
    pub fn connect(uri: &str, database: &str, collection: &str) -> Result<Self> {
        let location = format!("mongodb {}.{}", database, collection);
        let client = Client::with_uri_str(uri).map_err(|e| Error::StoreUnavailable {
            location: location.clone(),
            reason: e.to_string(),
        })?;

        debug!(database, collection, "opened template store");
        Ok(MongoStore {
            collection: client.database(database).collection(collection),
            location,
        })
    }

    fn unavailable(&self, error: mongodb::error::Error) -> Error {
        Error::StoreUnavailable {
            location: self.location.clone(),
            reason: error.to_string(),
        }
    }
}

impl TemplateStore for MongoStore {
    fn contains(&self, id: &TemplateId) -> Result<bool> {
        let found = self
            .collection
            .find_one(id_filter(id)?)
            .run()
            .map_err(|e| self.unavailable(e))?;
        Ok(found.is_some())
    }

    fn find_templates(&self, ids: &[TemplateId]) -> Result<Vec<TemplateRecord>> {
        let mut seen = HashSet::new();
        let unique: Vec<TemplateId> = ids.iter().filter(|id| seen.insert(*id)).cloned().collect();

        let cursor = self
            .collection
            .find(ids_filter(&unique)?)
            .projection(projection())
            .sort(sort_order())
            .run()
            .map_err(|e| self.unavailable(e))?;

        let mut records = Vec::with_capacity(unique.len());
        for document in cursor {
            let document = document.map_err(|e| self.unavailable(e))?;
            records.push(TemplateRecord::new(to_fields(document)));
        }

        // The projection drops `_id`, so find the absent one by asking again
        if records.len() < unique.len() {
            for id in &unique {
                if !self.contains(id)? {
                    return Err(Error::RecordNotFound(id.clone()));
                }
            }
        }

        debug!(requested = unique.len(), fetched = records.len(), "fetched templates");
        Ok(records)
    }
}

fn object_id(id: &TemplateId) -> Result<ObjectId> {
    ObjectId::parse_str(id.as_str()).map_err(|_| Error::InvalidIdentifierFormat(id.to_string()))
}

/// `{_id: ObjectId(...)}`
fn id_filter(id: &TemplateId) -> Result<Document> {
    Ok(doc! { "_id": object_id(id)? })
}

/// `{_id: {$in: [ObjectId(...), ...]}}`
fn ids_filter(ids: &[TemplateId]) -> Result<Document> {
    let oids = ids.iter().map(object_id).collect::<Result<Vec<_>>>()?;
    Ok(doc! { "_id": { "$in": oids } })
}

fn projection() -> Document {
    doc! { "_id": 0 }
}

fn sort_order() -> Document {
    doc! { "complexity": 1, "name": 1 }
}

/// Convert a fetched document to relaxed extended JSON fields
fn to_fields(document: Document) -> Map<String, Value> {
    match Bson::Document(document).into_relaxed_extjson() {
        Value::Object(fields) => fields,
        _ => Map::new(),
    }
}
