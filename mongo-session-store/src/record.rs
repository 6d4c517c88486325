//! Stored document shape and the values returned from reads.

use bson::spec::BinarySubtype;
use bson::{Binary, Bson, Document, doc};
use std::fmt;

/// Field holding the caller's key.
pub const SESSION_ID: &str = "session_id";
/// Field holding the serialized value.
pub const PAYLOAD: &str = "payload";
/// Field holding the expiry as a unix timestamp in seconds, or null.
pub const EXPIRE_AT: &str = "expire_at";

/// A `database.collection` pair. The collection is the record type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    /// Database name
    pub database: String,
    /// Collection name (the record type)
    pub collection: String,
}

impl Namespace {
    /// Create a namespace.
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}

/// Build the document written by `set`.
pub(crate) fn record_document(session_id: &str, payload: Vec<u8>, expire_at: Option<i64>) -> Document {
    doc! {
        SESSION_ID: session_id,
        PAYLOAD: Bson::Binary(Binary {
            subtype: BinarySubtype::Generic,
            bytes: payload,
        }),
        EXPIRE_AT: expire_at,
    }
}

/// Read the expiry of a stored document.
///
/// Integer, double and datetime values are understood. Null, a missing field
/// or any other type means the record does not expire.
pub(crate) fn expire_at(document: &Document) -> Option<i64> {
    match document.get(EXPIRE_AT)? {
        Bson::Int64(ts) => Some(*ts),
        Bson::Int32(ts) => Some(i64::from(*ts)),
        Bson::Double(ts) => Some(ts.floor() as i64),
        Bson::DateTime(dt) => Some(dt.timestamp_millis().div_euclid(1000)),
        _ => None,
    }
}

/// Borrow the payload bytes of a stored document.
///
/// Returns `None` when the payload is missing, null or empty.
pub(crate) fn payload_bytes(document: &Document) -> Option<&[u8]> {
    let bytes = match document.get(PAYLOAD)? {
        Bson::Binary(binary) => binary.bytes.as_slice(),
        Bson::String(text) => text.as_bytes(),
        _ => return None,
    };

    (!bytes.is_empty()).then_some(bytes)
}

/// A stored document returned without decoding.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord(Document);

impl RawRecord {
    /// Wrap a stored document.
    pub fn new(document: Document) -> Self {
        Self(document)
    }

    /// The caller's key, if the document carries one.
    pub fn session_id(&self) -> Option<&str> {
        self.0.get_str(SESSION_ID).ok()
    }

    /// The expiry timestamp, if set.
    pub fn expire_at(&self) -> Option<i64> {
        expire_at(&self.0)
    }

    /// All stored fields.
    pub fn document(&self) -> &Document {
        &self.0
    }

    /// Consume into the stored fields.
    pub fn into_document(self) -> Document {
        self.0
    }
}

/// Result of a successful read.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry<T> {
    /// The decoded payload
    Value(T),
    /// A record without a usable payload, returned as stored
    Raw(RawRecord),
}

impl<T> Entry<T> {
    /// Borrow the decoded value, if any.
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Value(value) => Some(value),
            Self::Raw(_) => None,
        }
    }

    /// Take the decoded value, discarding raw records.
    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Value(value) => Some(value),
            Self::Raw(_) => None,
        }
    }

    /// Whether this entry is a raw record.
    pub fn is_raw(&self) -> bool {
        matches!(self, Self::Raw(_))
    }
}
