//! Template record store
//!
//! Records live in a document database. The pipeline only needs two things
//! from it: an existence check per identifier, and a sorted fetch of a set of
//! identifiers. Both are expressed by [`TemplateStore`] so the store handle is
//! passed in explicitly rather than initialized globally.

pub mod json;
pub mod mongo;

use std::cmp::Ordering;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

pub use json::JsonFileStore;
pub use mongo::MongoStore;

/// Name of the identifier field in stored documents
pub const ID_FIELD: &str = "_id";

/// A validated document identifier (MongoDB ObjectId, 24 hex digits)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TemplateId(String);

impl TemplateId {
    /// Lowercase hexadecimal form
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for TemplateId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.len() == 24 && s.chars().all(|c| c.is_ascii_hexdigit()) {
            Ok(TemplateId(s.to_ascii_lowercase()))
        } else {
            Err(Error::InvalidIdentifierFormat(s.to_string()))
        }
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One stored template, with its identifier field already removed
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TemplateRecord(Map<String, Value>);

impl TemplateRecord {
    /// Wrap a document, dropping its `_id` field
    pub fn new(mut fields: Map<String, Value>) -> Self {
        fields.remove(ID_FIELD);
        TemplateRecord(fields)
    }

    pub fn complexity(&self) -> Option<&Value> {
        self.0.get("complexity")
    }

    pub fn name(&self) -> Option<&Value> {
        self.0.get("name")
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// Read-only access to stored templates
pub trait TemplateStore {
    /// Whether a document with this identifier exists
    fn contains(&self, id: &TemplateId) -> Result<bool>;

    /// Fetch the documents for `ids`, each at most once, ordered by
    /// `complexity` then `name` ascending
    ///
    /// Fails with [`Error::RecordNotFound`] if any identifier is absent.
    fn find_templates(&self, ids: &[TemplateId]) -> Result<Vec<TemplateRecord>>;
}

/// Where template records are read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreSource {
    /// A `mongoexport` file
    File(PathBuf),
    /// A live MongoDB collection
    Mongo {
        uri: String,
        database: String,
        collection: String,
    },
}

impl fmt::Display for StoreSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreSource::File(path) => write!(f, "{}", path.display()),
            // The URI may carry credentials
            StoreSource::Mongo {
                database,
                collection,
                ..
            } => write!(f, "mongodb {}.{}", database, collection),
        }
    }
}

/// Open the store described by `source`
pub fn open_store(source: &StoreSource) -> Result<Box<dyn TemplateStore>> {
    match source {
        StoreSource::File(path) => Ok(Box::new(JsonFileStore::open(path)?)),
        StoreSource::Mongo {
            uri,
            database,
            collection,
        } => Ok(Box::new(MongoStore::connect(uri, database, collection)?)),
    }
}

/// Sort records ascending by `complexity`, then by `name`
pub fn sort_records(records: &mut [TemplateRecord]) {
    records.sort_by(|a, b| {
        compare_values(a.complexity(), b.complexity())
            .then_with(|| compare_values(a.name(), b.name()))
    });
}

/// Rank of a value's type in the document store's cross-type sort order
fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Number(_)) => 1,
        Some(Value::String(_)) => 2,
        Some(Value::Object(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Bool(_)) => 5,
    }
}

/// Compare two field values the way an ascending sort in the store orders them
///
/// An array-valued field sorts by its smallest element; an empty array sorts
/// before everything, missing fields included. Other values order as missing
/// and null first, then numbers (numerically), strings (bytewise), objects,
/// arrays and booleans.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (sort_key(a), sort_key(b)) {
        (Some(a), Some(b)) => compare_plain(a, b),
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
    }
}

/// The value an ascending sort sees for a field; `None` for an empty array
fn sort_key(value: Option<&Value>) -> Option<Option<&Value>> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .min_by(|x, y| compare_plain(Some(*x), Some(*y)))
            .map(Some),
        other => Some(other),
    }
}

/// Compare values of any type, arrays element by element
fn compare_plain(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            match (x.as_i64(), y.as_i64()) {
                (Some(x), Some(y)) => x.cmp(&y),
                _ => {
                    let x = x.as_f64().unwrap_or(f64::NAN);
                    let y = y.as_f64().unwrap_or(f64::NAN);
                    x.partial_cmp(&y).unwrap_or(Ordering::Equal)
                }
            }
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.as_bytes().cmp(y.as_bytes()),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Array(x)), Some(Value::Array(y))) => {
            for (l, r) in x.iter().zip(y.iter()) {
                let ord = compare_plain(Some(l), Some(r));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        (Some(Value::Object(x)), Some(Value::Object(y))) => {
            for ((lk, lv), (rk, rv)) in x.iter().zip(y.iter()) {
                let ord = lk
                    .as_bytes()
                    .cmp(rk.as_bytes())
                    .then_with(|| compare_plain(Some(lv), Some(rv)));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}
